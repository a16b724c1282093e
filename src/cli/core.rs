//! Shell context, dispatch and error reporting.

use dialoguer::theme::ColorfulTheme;
use strsim::levenshtein;
use thiserror::Error;
use tracing::debug;

use crate::auth::guard::{GuardDecision, Route, RouteGuard};
use crate::auth::{AuthError, Session};
use crate::backend::{Backend, InstantPacer, Pacer, SimulatedBackend};
use crate::config::{Config, ConfigManager};
use crate::errors::{CliError, PortalError};

use super::commands::{self, CommandRegistry};
use super::forms::TerminalInteraction;
use super::io as cli_io;
use super::ui::{spinner::SpinnerPacer, test_mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Portal(#[from] PortalError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Prompt failed: {0}")]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Portal(inner) => CliError::Portal(inner),
            CommandError::Io(inner) => CliError::Portal(PortalError::Io(inner)),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub session: Session,
    pub guard: RouteGuard,
    pub backend: Box<dyn Backend>,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub config: Config,
    /// Page the user is on; changes only through [`ShellContext::enter`].
    pub route: Route,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        let config = config_manager.load()?;
        Ok(Self::with_parts(mode, config_manager, config))
    }

    pub(crate) fn with_parts(mode: CliMode, config_manager: ConfigManager, config: Config) -> Self {
        cli_io::apply_config(&config, mode == CliMode::Script);

        let pacer: Box<dyn Pacer> = if mode == CliMode::Script || test_mode::is_enabled() {
            Box::new(InstantPacer)
        } else {
            Box::new(SpinnerPacer::new(config.delay_scale))
        };
        debug!(?mode, "shell context ready");

        Self {
            mode,
            registry: commands::all_definitions(),
            session: Session::new(),
            guard: RouteGuard::new(),
            backend: Box::new(SimulatedBackend::new(pacer)),
            theme: ColorfulTheme::default(),
            config_manager,
            config,
            route: Route::Login,
            running: true,
        }
    }

    /// `(name, usage)` for every registered command.
    pub fn command_usages(&self) -> Vec<(&'static str, &'static str)> {
        self.registry
            .iter()
            .map(|definition| (definition.name, definition.usage))
            .collect()
    }

    pub fn prompt(&self) -> String {
        let who = self
            .session
            .user()
            .map(|user| user.email.as_str())
            .unwrap_or("guest");
        format!("portal [{who}] {}> ", self.route)
    }

    /// Moves to `route` if the guard allows it. A redirect still moves the
    /// user, to the page the guard picked, and returns `false`.
    pub(crate) fn enter(&mut self, route: Route) -> bool {
        match self.guard.check(&self.session, route) {
            GuardDecision::Allow => {
                self.route = route;
                true
            }
            GuardDecision::Redirect(target) => {
                self.route = target;
                cli_io::print_warning(format!(
                    "Access to {route} denied. Redirected to {target}."
                ));
                if target == Route::Login {
                    cli_io::print_hint("Sign in with `login <email> [password]`.");
                }
                false
            }
        }
    }

    /// Wizards need a terminal or a scripted input queue.
    pub(crate) fn can_prompt(&self) -> bool {
        self.mode == CliMode::Interactive || test_mode::is_enabled()
    }

    pub(crate) fn require_prompt(&self, command: &str) -> CommandResult {
        if self.can_prompt() {
            Ok(())
        } else {
            Err(CommandError::InvalidArguments(format!(
                "`{command}` needs an interactive terminal"
            )))
        }
    }

    pub(crate) fn interaction(&self) -> TerminalInteraction {
        TerminalInteraction::new()
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(definition) = self.registry.get(command) {
            let handler = definition.handler;
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, input), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(cli_io::confirm_action("Exit portal?")?)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                self.print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Portal(PortalError::NotFound(what)) => {
                self.print_error(&format!("Not found: {what}"));
                Ok(())
            }
            other => {
                self.print_error(&other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        cli_io::print_error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        cli_io::print_warning(message);
    }

    pub(crate) fn print_hint(&self, message: &str) {
        cli_io::print_hint(message);
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::auth::{Role, DEMO_PASSWORD};
    use crate::cli::shell::handle_line;

    fn script_context() -> (TempDir, ShellContext) {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let context = ShellContext::with_parts(CliMode::Script, manager, Config::default());
        (dir, context)
    }

    #[test]
    fn guests_are_sent_to_login() {
        let (_dir, mut context) = script_context();
        assert!(!context.enter(Route::Dashboard));
        assert_eq!(context.route, Route::Login);
    }

    #[test]
    fn login_opens_role_home_and_guards_other_pages() {
        let (_dir, mut context) = script_context();
        handle_line(&mut context, &format!("login dealer@guns.com {DEMO_PASSWORD}")).unwrap();
        assert_eq!(context.session.role(), Some(Role::GunDealer));
        assert_eq!(context.route, Route::DealerRegistration);

        assert!(!context.enter(Route::Alerts));
        assert_eq!(context.route, Route::DealerRegistration);
    }

    #[test]
    fn unknown_command_continues() {
        let (_dir, mut context) = script_context();
        let control = handle_line(&mut context, "dashbaord").unwrap();
        assert_eq!(control, LoopControl::Continue);
    }

    #[test]
    fn exit_stops_the_loop() {
        let (_dir, mut context) = script_context();
        assert_eq!(handle_line(&mut context, "exit").unwrap(), LoopControl::Exit);
        assert!(!context.running);
    }

    #[test]
    fn config_changes_are_saved() {
        let (dir, mut context) = script_context();
        handle_line(&mut context, "config set page_size 2").unwrap();
        let reloaded = ConfigManager::with_base_dir(dir.path().to_path_buf())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(reloaded.page_size, 2);
    }
}
