use std::{
    borrow::Cow,
    io::{self, BufRead},
};

use colored::Colorize;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::{split, ParseError};

use tracing::debug;

use crate::auth::guard::Route;
use crate::cli::commands::portal::{ALERT_DECISIONS, ALERT_TABS, LICENSE_FLAGS};
use crate::cli::core::{CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::help;
use crate::cli::output::info as output_info;
use crate::config::Config;
use crate::errors::CliError;
use crate::registry::LicenseStatus;

/// Set to any value to read commands from stdin without a prompt.
pub const SCRIPT_ENV: &str = "LICENSE_PORTAL_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<PortalHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(PortalHelper::new(context.command_usages())));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    output_info("Firearms licensing portal. Type `help` for commands.");
    help::print_demo_accounts();

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();
                if run_line(context, trimmed)? == LoopControl::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output_info("Goodbye.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        if !context.running || run_line(context, &line?)? == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

fn run_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    match handle_line(context, line) {
        Ok(control) => Ok(control),
        Err(err) => {
            context.report_error(err)?;
            Ok(LoopControl::Continue)
        }
    }
}

/// Parses one line and runs the command it names.
pub(crate) fn handle_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            context.print_warning(&err.to_string());
            return Ok(LoopControl::Continue);
        }
    };
    let Some(raw) = tokens.first() else {
        return Ok(LoopControl::Continue);
    };

    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
    debug!(command = %command, route = %context.route, "dispatch");

    let control = context.dispatch(&command, raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input)
}

/// Completes command names and their arguments; hints at usage once a
/// command has been typed.
struct PortalHelper {
    commands: Vec<(&'static str, &'static str)>,
}

impl PortalHelper {
    fn new(mut commands: Vec<(&'static str, &'static str)>) -> Self {
        commands.sort_by_key(|(name, _)| *name);
        commands.dedup_by_key(|(name, _)| *name);
        Self { commands }
    }

    fn names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|(name, _)| *name).collect()
    }

    /// Candidates for the word after `previous`.
    fn options_for(&self, previous: &[&str]) -> Vec<&'static str> {
        let Some((command, rest)) = previous.split_first() else {
            return self.names();
        };
        match (command.to_ascii_lowercase().as_str(), rest) {
            ("help", []) => self.names(),
            ("open", []) => Route::ALL.iter().map(|route| route.path()).collect(),
            ("alerts", []) => ALERT_TABS.to_vec(),
            ("alert", []) => ALERT_DECISIONS.to_vec(),
            ("config", []) => vec!["show", "set"],
            ("config", ["set"]) => Config::KEYS.to_vec(),
            ("licenses", [.., "--status"]) => {
                LicenseStatus::ALL.iter().map(|status| status.label()).collect()
            }
            ("licenses", [.., flag]) if flag.starts_with("--") => Vec::new(),
            ("licenses", _) => LICENSE_FLAGS.to_vec(),
            _ => Vec::new(),
        }
    }

    fn usage_hint(&self, line: &str) -> Option<String> {
        let command = line.strip_suffix(' ')?;
        if command.contains(char::is_whitespace) {
            return None;
        }
        let (name, usage) = self
            .commands
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(command))?;
        let tail = usage.strip_prefix(*name)?.trim_start();
        (!tail.is_empty()).then(|| tail.to_string())
    }
}

impl Helper for PortalHelper {}

impl Completer for PortalHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let previous: Vec<&str> = prefix[..start].split_whitespace().collect();
        let needle = prefix[start..].to_ascii_lowercase();

        let candidates = self
            .options_for(&previous)
            .into_iter()
            .filter(|option| option.to_ascii_lowercase().starts_with(&needle))
            .map(|option| Pair {
                display: option.to_string(),
                replacement: option.to_string(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for PortalHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        self.usage_hint(line)
    }
}

impl Highlighter for PortalHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Validator for PortalHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::all_definitions;

    fn helper() -> PortalHelper {
        PortalHelper::new(
            all_definitions()
                .iter()
                .map(|definition| (definition.name, definition.usage))
                .collect(),
        )
    }

    fn completions(line: &str) -> (usize, Vec<String>) {
        let history = DefaultHistory::new();
        let ctx = ReadlineContext::new(&history);
        let (start, pairs) = helper().complete(line, line.len(), &ctx).unwrap();
        (start, pairs.into_iter().map(|pair| pair.replacement).collect())
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line(r#"licenses --region "Greater Accra""#).unwrap();
        assert_eq!(tokens, vec!["licenses", "--region", "Greater Accra"]);
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        assert!(parse_command_line("login \"admin").is_err());
    }

    #[test]
    fn completes_command_names() {
        let (start, names) = completions("lo");
        assert_eq!(start, 0);
        assert_eq!(names, vec!["login", "logout"]);
    }

    #[test]
    fn completes_route_paths_after_open() {
        let (start, paths) = completions("open /d");
        assert_eq!(start, 5);
        assert_eq!(paths, vec!["/dashboard", "/dealer-registration"]);
    }

    #[test]
    fn completes_license_flags_and_statuses() {
        let (_, flags) = completions("licenses --region Ashanti --s");
        assert_eq!(flags, vec!["--status", "--search"]);

        let (_, statuses) = completions("licenses --status e");
        assert_eq!(statuses, vec!["Expired"]);

        let (_, values) = completions("licenses --search ");
        assert!(values.is_empty());
    }

    #[test]
    fn completes_config_keys() {
        let (_, keys) = completions("config set p");
        assert_eq!(keys, vec!["page_size", "plain_output"]);
    }

    #[test]
    fn hints_show_remaining_usage() {
        let helper = helper();
        assert_eq!(
            helper.usage_hint("login ").as_deref(),
            Some("<email> [password]")
        );
        assert_eq!(helper.usage_hint("login"), None);
        assert_eq!(helper.usage_hint("logout "), None);
        assert_eq!(helper.usage_hint("login admin "), None);
    }
}
