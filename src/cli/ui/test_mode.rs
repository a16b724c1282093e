//! Scripted answers for wizard prompts.
//!
//! When `LICENSE_PORTAL_TEST_INPUTS` is set, every prompt pops its answer from
//! the `|`-separated queue instead of reading the terminal. Tokens:
//! `<KEEP>`, `<BACK>`, `<HELP>`, `<CANCEL>`, `<BLANK>`; anything else is a
//! literal value.

use once_cell::sync::Lazy;
use std::{collections::VecDeque, env, sync::Mutex};
use tracing::warn;

pub const INPUTS_ENV: &str = "LICENSE_PORTAL_TEST_INPUTS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestInput {
    Value(String),
    Keep,
    Back,
    Help,
    Cancel,
}

struct InputQueue {
    enabled: bool,
    inputs: VecDeque<TestInput>,
}

impl InputQueue {
    fn from_env() -> Self {
        match env::var(INPUTS_ENV) {
            Ok(raw) => Self {
                enabled: true,
                inputs: parse_sequence(&raw),
            },
            Err(_) => Self {
                enabled: false,
                inputs: VecDeque::new(),
            },
        }
    }
}

static INPUTS: Lazy<Mutex<InputQueue>> = Lazy::new(|| Mutex::new(InputQueue::from_env()));

pub fn is_enabled() -> bool {
    INPUTS.lock().map(|guard| guard.enabled).unwrap_or(false)
}

/// Next scripted answer, or `None` when prompts should go to the terminal.
/// An exhausted queue answers `Cancel`.
pub fn next_input(label: &str) -> Option<TestInput> {
    let mut guard = INPUTS.lock().ok()?;
    if !guard.enabled {
        return None;
    }
    Some(guard.inputs.pop_front().unwrap_or_else(|| {
        warn!(prompt = label, "scripted inputs exhausted");
        TestInput::Cancel
    }))
}

fn parse_token(token: &str) -> TestInput {
    match token.to_ascii_uppercase().as_str() {
        "<KEEP>" => TestInput::Keep,
        "<BACK>" => TestInput::Back,
        "<HELP>" => TestInput::Help,
        "<CANCEL>" | "<ESC>" => TestInput::Cancel,
        "<BLANK>" | "<EMPTY>" => TestInput::Value(String::new()),
        _ => TestInput::Value(token.to_string()),
    }
}

fn parse_sequence(raw: &str) -> VecDeque<TestInput> {
    raw.split('|')
        .filter_map(|segment| {
            let trimmed = segment.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(parse_token(trimmed))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_map_to_controls() {
        let parsed = parse_sequence("RUG1234567 | <keep>|<BACK>||<blank>|Mobile Money");
        assert_eq!(
            parsed,
            VecDeque::from(vec![
                TestInput::Value("RUG1234567".into()),
                TestInput::Keep,
                TestInput::Back,
                TestInput::Value(String::new()),
                TestInput::Value("Mobile Money".into()),
            ])
        );
    }
}
