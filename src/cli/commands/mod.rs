use std::collections::HashMap;

pub mod account;
pub mod config;
pub mod portal;
pub mod system;
pub mod wizards;

use crate::cli::core::{CommandResult, ShellContext};

pub(crate) fn all_definitions() -> CommandRegistry {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(account::definitions());
    commands.extend(wizards::definitions());
    commands.extend(portal::definitions());
    commands.extend(config::definitions());
    CommandRegistry::new(commands)
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

/// Splits `--flag value` pairs from positional arguments.
pub(crate) fn split_flags<'a>(
    args: &[&'a str],
) -> Result<(Vec<&'a str>, Vec<(&'a str, &'a str)>), crate::cli::core::CommandError> {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(name) = arg.strip_prefix("--") {
            let value = iter.next().ok_or_else(|| {
                crate::cli::core::CommandError::InvalidArguments(format!(
                    "`--{name}` needs a value"
                ))
            })?;
            flags.push((name, *value));
        } else {
            positional.push(*arg);
        }
    }
    Ok((positional, flags))
}
