use crate::auth::{DemoDirectory, DEMO_PASSWORD};
use crate::cli::commands::{CommandDefinition, CommandRegistry};
use crate::cli::io;
use crate::cli::output::section as output_section;

pub fn print_overview(registry: &CommandRegistry) {
    output_section("Available commands");
    for definition in registry.iter() {
        io::print_info(format!("  {:<16} {}", definition.name, definition.description));
    }
    io::print_info("Use `help <command>` for details.");
    print_demo_accounts();
}

pub fn print_command(definition: &CommandDefinition) {
    output_section(format!("Help: {}", definition.name));
    io::print_info(format!("  Description: {}", definition.description));
    io::print_info(format!("  Usage: {}", definition.usage));
}

/// Login hint shown under the command list.
pub fn print_demo_accounts() {
    let emails: Vec<_> = DemoDirectory::new().emails().collect();
    io::print_hint(format!(
        "Demo accounts: {} (password: {DEMO_PASSWORD})",
        emails.join(", ")
    ));
}
