use dialoguer::Password;
use tracing::info;

use crate::auth::guard::Route;
use crate::auth::AuthError;
use crate::cli::commands::{portal, wizards, CommandDefinition};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::forms::{no_gate, run_wizard, FormResult};
use crate::cli::help;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::ui::test_mode::{self, TestInput};
use crate::flows::{LoginRequest, SignUpFlow};
use crate::wizard::Wizard;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "login",
            "Sign in with a portal account",
            "login <email> [password]",
            cmd_login,
        ),
        CommandDefinition::new("logout", "End the current session", "logout", cmd_logout),
        CommandDefinition::new("whoami", "Show the signed-in user", "whoami", cmd_whoami),
        CommandDefinition::new("signup", "Request a new account", "signup", cmd_signup),
        CommandDefinition::new(
            "open",
            "Navigate to a page (e.g. /dashboard)",
            "open <path>",
            cmd_open,
        ),
    ]
}

fn cmd_login(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(email) = args.first() else {
        return Err(CommandError::InvalidArguments(
            "usage: login <email> [password]".into(),
        ));
    };
    let password = match args.get(1) {
        Some(password) => password.to_string(),
        None => {
            context.require_prompt("login")?;
            match prompt_password(context)? {
                Some(password) => password,
                None => return Ok(()),
            }
        }
    };

    context.enter(Route::Login);
    let request = match LoginRequest::parse(email, &password) {
        Ok(request) => request,
        Err(errors) => {
            for (_, message) in errors.iter() {
                io::print_error(message);
            }
            return Ok(());
        }
    };

    match context.backend.authenticate(&request.email, &request.password) {
        Ok(user) => {
            let name = user.name.clone();
            let home = context.session.login(user);
            context.enter(home);
            io::print_success("Logged in successfully");
            io::print_info(format!("Welcome, {name}. You are on {home}."));
            Ok(())
        }
        Err(AuthError::InvalidCredentials) => {
            io::print_error("Invalid credentials");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn prompt_password(context: &ShellContext) -> Result<Option<String>, CommandError> {
    if let Some(input) = test_mode::next_input("Password") {
        return Ok(match input {
            TestInput::Value(value) => Some(value),
            _ => None,
        });
    }
    let password = Password::with_theme(&context.theme)
        .with_prompt("Password")
        .interact()?;
    Ok(Some(password))
}

fn cmd_logout(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.session.is_authenticated() {
        io::print_info("Not signed in.");
        return Ok(());
    }
    let target = context.session.logout();
    context.enter(target);
    io::print_success("Logged out");
    Ok(())
}

fn cmd_whoami(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.session.user() {
        Some(user) => {
            output_section("Session");
            io::print_info(format!("  Name : {}", user.name));
            io::print_info(format!("  Email: {}", user.email));
            io::print_info(format!("  Role : {}", user.role));
            io::print_info(format!("  Page : {}", context.route));
        }
        None => {
            io::print_info("Not signed in.");
            help::print_demo_accounts();
        }
    }
    Ok(())
}

fn cmd_signup(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.enter(Route::SignUp);
    context.require_prompt("signup")?;

    let mut wizard = Wizard::new(SignUpFlow::new());
    let mut interaction = context.interaction();
    let result = run_wizard(&mut wizard, &*context.backend, &mut interaction, no_gate)?;
    match result {
        FormResult::Completed(receipt) => {
            info!(reference = %receipt.reference, "sign-up finished");
            io::print_success(format!("{} (ref {})", receipt.message, receipt.reference));
            io::print_info("Sign in with one of the demo accounts to continue.");
            help::print_demo_accounts();
        }
        FormResult::Cancelled => io::print_info("Sign-up cancelled."),
    }
    context.enter(Route::Login);
    Ok(())
}

fn cmd_open(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(path) = args.first() else {
        return Err(CommandError::InvalidArguments("usage: open <path>".into()));
    };
    let route: Route = path.parse()?;
    if !context.enter(route) {
        return Ok(());
    }
    match route {
        Route::Root | Route::Login => {
            io::print_info("Sign in with `login <email> [password]`.");
            help::print_demo_accounts();
            Ok(())
        }
        Route::SignUp => cmd_signup(context, &[]),
        Route::Dashboard => portal::show_dashboard(context),
        Route::Licenses => portal::show_licenses(context, &[]),
        Route::Alerts => portal::show_alerts(context, &[]),
        Route::Renewal => wizards::run_renewal(context),
        Route::DealerRegistration => wizards::run_dealer_registration(context),
    }
}
