//! Terminal driver for [`Wizard`]s.
//!
//! [`run_wizard`] walks the active step's visible fields, feeds the answers
//! into the wizard and asks it to advance. Answers come from a
//! [`FormInteraction`]: the dialoguer-backed [`TerminalInteraction`] in the
//! shell, or a scripted queue in tests.

use std::path::Path;

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};

use crate::cli::core::CommandError;
use crate::cli::output;
use crate::cli::ui::test_mode::{self, TestInput};
use crate::wizard::{
    FieldDescriptor, FieldKind, FieldValue, FileHandle, StepOutcome, TerminalAction, Wizard,
    WizardFlow,
};

const BACK_LABEL: &str = "← Back";

/// What a prompt needs to know about the field it is asking for.
pub struct PromptContext<'a> {
    pub descriptor: &'a FieldDescriptor,
    pub current: Option<String>,
    pub error: Option<String>,
    pub first_field: bool,
}

/// Describes how prompts can be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    Value(String),
    /// Leave the current value untouched.
    Keep,
    /// Go back to the previous field (or step).
    Back,
    Help,
    /// Abandon the wizard.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResponse {
    Confirm,
    Back,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormResult<T> {
    Completed(T),
    Cancelled,
}

/// Extra check run after a step's fields are filled and before the wizard
/// is asked to advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Proceed,
    /// Re-prompt the current step.
    Stay,
    Cancel,
}

pub trait FormInteraction {
    fn prompt_field(&mut self, context: &PromptContext<'_>) -> PromptResponse;

    fn confirm(&mut self, title: &str, lines: &[String]) -> ConfirmationResponse;
}

enum StepInput {
    Done,
    Back,
    Cancel,
}

/// Drives `wizard` to completion or cancellation.
pub fn run_wizard<F, A, I, G>(
    wizard: &mut Wizard<F>,
    action: &A,
    interaction: &mut I,
    mut gate: G,
) -> Result<FormResult<F::Receipt>, CommandError>
where
    F: WizardFlow,
    A: TerminalAction<F> + ?Sized,
    I: FormInteraction,
    G: FnMut(&mut Wizard<F>, &mut I) -> Result<GateOutcome, CommandError>,
{
    let mut focus: Option<Vec<&'static str>> = None;
    loop {
        render_step_header(wizard);

        match fill_step(wizard, interaction, focus.take()) {
            StepInput::Done => {}
            StepInput::Back => {
                wizard.retreat();
                continue;
            }
            StepInput::Cancel => return Ok(FormResult::Cancelled),
        }

        match gate(wizard, interaction)? {
            GateOutcome::Proceed => {}
            GateOutcome::Stay => continue,
            GateOutcome::Cancel => return Ok(FormResult::Cancelled),
        }

        if wizard.is_last_step() {
            let lines = summary_lines(wizard);
            match interaction.confirm("Review your entries", &lines) {
                ConfirmationResponse::Confirm => {}
                ConfirmationResponse::Back => continue,
                ConfirmationResponse::Cancel => return Ok(FormResult::Cancelled),
            }
        }

        match wizard.advance(action)? {
            StepOutcome::Moved { .. } => {}
            StepOutcome::Blocked(errors) => {
                for (_, message) in errors.iter() {
                    output::error(message);
                }
                focus = Some(
                    wizard
                        .current_step()
                        .map(|step| {
                            step.fields
                                .iter()
                                .copied()
                                .filter(|key| errors.contains(key))
                                .collect()
                        })
                        .unwrap_or_default(),
                );
            }
            StepOutcome::Submitted(receipt) => return Ok(FormResult::Completed(receipt)),
            StepOutcome::Finished => return Ok(FormResult::Cancelled),
        }
    }
}

/// A gate that never objects.
pub fn no_gate<F: WizardFlow, I>(
    _wizard: &mut Wizard<F>,
    _interaction: &mut I,
) -> Result<GateOutcome, CommandError> {
    Ok(GateOutcome::Proceed)
}

fn fill_step<F, I>(
    wizard: &mut Wizard<F>,
    interaction: &mut I,
    focus: Option<Vec<&'static str>>,
) -> StepInput
where
    F: WizardFlow,
    I: FormInteraction,
{
    let keys = match focus {
        Some(keys) if !keys.is_empty() => keys,
        _ => wizard
            .current_step()
            .map(|step| step.fields.clone())
            .unwrap_or_default(),
    };

    let mut cursor = 0;
    loop {
        let visible: Vec<FieldDescriptor> = keys
            .iter()
            .filter_map(|key| wizard.flow().table().field(key))
            .filter(|descriptor| descriptor.is_visible(wizard.state()))
            .cloned()
            .collect();
        let Some(descriptor) = visible.get(cursor) else {
            return StepInput::Done;
        };

        if descriptor.read_only {
            output::info(format!(
                "{}: {}",
                descriptor.label,
                wizard.state().text(descriptor.key)
            ));
            cursor += 1;
            continue;
        }

        let context = PromptContext {
            descriptor,
            current: wizard.state().get(descriptor.key).and_then(|value| {
                if value.is_blank() {
                    None
                } else {
                    Some(display_value(descriptor, value))
                }
            }),
            error: wizard.state().error(descriptor.key).map(str::to_string),
            first_field: cursor == 0,
        };

        match interaction.prompt_field(&context) {
            PromptResponse::Value(raw) => match parse_value(descriptor, &raw) {
                Ok(Some(value)) => {
                    wizard.set(descriptor.key, value);
                    cursor += 1;
                }
                Ok(None) => {
                    wizard.clear(descriptor.key);
                    cursor += 1;
                }
                Err(message) => output::warning(message),
            },
            PromptResponse::Keep => cursor += 1,
            PromptResponse::Help => print_field_help(descriptor),
            PromptResponse::Back => {
                let previous = visible[..cursor]
                    .iter()
                    .rposition(|descriptor| !descriptor.read_only);
                match previous {
                    Some(index) => cursor = index,
                    None => return StepInput::Back,
                }
            }
            PromptResponse::Cancel => return StepInput::Cancel,
        }
    }
}

/// Converts typed text into a field value. `Ok(None)` clears the field.
pub fn parse_value(descriptor: &FieldDescriptor, raw: &str) -> Result<Option<FieldValue>, String> {
    let trimmed = raw.trim();
    match &descriptor.kind {
        FieldKind::Text | FieldKind::Date | FieldKind::Secret => {
            Ok(Some(FieldValue::text(raw.to_string())))
        }
        FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Ok(Some(FieldValue::Flag(true))),
            "no" | "n" | "false" | "0" => Ok(Some(FieldValue::Flag(false))),
            _ => Err(format!("{}: answer yes or no", descriptor.label)),
        },
        FieldKind::Choice(options) => {
            if trimmed.is_empty() {
                return Ok(Some(FieldValue::choice(String::new())));
            }
            let by_index = trimmed
                .parse::<usize>()
                .ok()
                .and_then(|index| index.checked_sub(1))
                .and_then(|index| options.get(index));
            let by_name = options
                .iter()
                .find(|option| option.eq_ignore_ascii_case(trimmed));
            by_index
                .or(by_name)
                .map(|option| Some(FieldValue::choice(*option)))
                .ok_or_else(|| {
                    format!(
                        "{}: choose one of {}",
                        descriptor.label,
                        options.join(", ")
                    )
                })
        }
        FieldKind::File => {
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(FieldValue::File(FileHandle::from_path(Path::new(trimmed)))))
            }
        }
    }
}

fn display_value(descriptor: &FieldDescriptor, value: &FieldValue) -> String {
    match descriptor.kind {
        FieldKind::Secret => "•".repeat(value.to_string().chars().count().min(8)),
        _ => value.to_string(),
    }
}

fn print_field_help(descriptor: &FieldDescriptor) {
    let mut lines = Vec::new();
    if let Some(help) = descriptor.help {
        lines.push(help.to_string());
    }
    if let Some(placeholder) = descriptor.placeholder {
        lines.push(format!("Example: {placeholder}"));
    }
    match &descriptor.kind {
        FieldKind::Choice(options) => lines.push(format!("Options: {}", options.join(", "))),
        FieldKind::Boolean => lines.push("Answer yes or no.".into()),
        FieldKind::File => lines.push("Enter the path of the document to attach.".into()),
        FieldKind::Date => lines.push("Use DD/MM/YYYY.".into()),
        FieldKind::Text | FieldKind::Secret => {}
    }
    lines.push("Type :back for the previous field or :cancel to leave.".into());
    for line in lines {
        output::hint(line);
    }
}

/// "● ● ○ ○" style progress marker.
pub fn progress_dots(index: usize, count: usize) -> String {
    (0..count)
        .map(|step| if step <= index { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_step_header<F: WizardFlow>(wizard: &Wizard<F>) {
    let Some(step) = wizard.current_step() else {
        return;
    };
    output::section(step.title);
    output::info(step.subtitle);
    if wizard.step_count() > 1 {
        output::info(format!(
            "Step {} of {}  {}",
            wizard.index() + 1,
            wizard.step_count(),
            progress_dots(wizard.index(), wizard.step_count())
        ));
    }
}

fn summary_lines<F: WizardFlow>(wizard: &Wizard<F>) -> Vec<String> {
    let table = wizard.flow().table();
    let mut lines = Vec::new();
    for (index, step) in table.steps().iter().enumerate() {
        lines.push(step.title.to_string());
        for descriptor in table.fields_for(index) {
            if !descriptor.is_visible(wizard.state()) {
                continue;
            }
            if let Some(value) = wizard.state().get(descriptor.key) {
                if !value.is_blank() {
                    lines.push(format!(
                        "  {}: {}",
                        descriptor.label,
                        display_value(descriptor, value)
                    ));
                }
            }
        }
    }
    lines
}

/// Dialoguer prompts, short-circuited by the scripted input queue when it
/// is enabled.
pub struct TerminalInteraction {
    theme: ColorfulTheme,
}

impl TerminalInteraction {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn from_script(input: TestInput) -> PromptResponse {
        match input {
            TestInput::Value(value) => PromptResponse::Value(value),
            TestInput::Keep => PromptResponse::Keep,
            TestInput::Back => PromptResponse::Back,
            TestInput::Help => PromptResponse::Help,
            TestInput::Cancel => PromptResponse::Cancel,
        }
    }

    fn print_context(&self, context: &PromptContext<'_>) {
        if let Some(error) = &context.error {
            output::error(error);
        }
        if let Some(placeholder) = context.descriptor.placeholder {
            output::hint(format!("e.g. {placeholder}"));
        }
    }

    fn prompt_text(&self, context: &PromptContext<'_>) -> PromptResponse {
        self.print_context(context);
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(context.descriptor.label)
            .allow_empty(true);
        if let Some(current) = &context.current {
            input = input.default(current.clone());
        }
        match input.interact_text() {
            Ok(value) => match value.trim() {
                ":back" => PromptResponse::Back,
                ":help" => PromptResponse::Help,
                ":cancel" => PromptResponse::Cancel,
                ":clear" => PromptResponse::Value(String::new()),
                _ => PromptResponse::Value(value),
            },
            Err(_) => PromptResponse::Cancel,
        }
    }

    fn prompt_secret(&self, context: &PromptContext<'_>) -> PromptResponse {
        self.print_context(context);
        match Password::with_theme(&self.theme)
            .with_prompt(context.descriptor.label)
            .allow_empty_password(true)
            .interact()
        {
            Ok(value) if value.is_empty() && context.current.is_some() => PromptResponse::Keep,
            Ok(value) => PromptResponse::Value(value),
            Err(_) => PromptResponse::Cancel,
        }
    }

    fn prompt_choice(&self, context: &PromptContext<'_>, options: &[&str]) -> PromptResponse {
        self.print_context(context);
        let mut items: Vec<&str> = options.to_vec();
        if !context.first_field {
            items.push(BACK_LABEL);
        }
        let default = context
            .current
            .as_deref()
            .and_then(|current| options.iter().position(|option| *option == current))
            .unwrap_or(0);
        match Select::with_theme(&self.theme)
            .with_prompt(context.descriptor.label)
            .items(&items)
            .default(default)
            .interact_opt()
        {
            Ok(Some(index)) if index < options.len() => {
                PromptResponse::Value(options[index].to_string())
            }
            Ok(Some(_)) => PromptResponse::Back,
            _ => PromptResponse::Cancel,
        }
    }

    fn prompt_boolean(&self, context: &PromptContext<'_>) -> PromptResponse {
        self.print_context(context);
        let current = context.current.as_deref() == Some("Yes");
        match Confirm::with_theme(&self.theme)
            .with_prompt(context.descriptor.label)
            .default(current)
            .interact_opt()
        {
            Ok(Some(true)) => PromptResponse::Value("yes".into()),
            Ok(Some(false)) => PromptResponse::Value("no".into()),
            _ => PromptResponse::Cancel,
        }
    }
}

impl Default for TerminalInteraction {
    fn default() -> Self {
        Self::new()
    }
}

impl FormInteraction for TerminalInteraction {
    fn prompt_field(&mut self, context: &PromptContext<'_>) -> PromptResponse {
        if let Some(input) = test_mode::next_input(context.descriptor.label) {
            if let Some(error) = &context.error {
                output::error(error);
            }
            return Self::from_script(input);
        }
        match &context.descriptor.kind {
            FieldKind::Choice(options) => self.prompt_choice(context, options),
            FieldKind::Boolean => self.prompt_boolean(context),
            FieldKind::Secret => self.prompt_secret(context),
            FieldKind::Text | FieldKind::Date | FieldKind::File => self.prompt_text(context),
        }
    }

    fn confirm(&mut self, title: &str, lines: &[String]) -> ConfirmationResponse {
        output::section(title);
        for line in lines {
            output::info(line);
        }
        if let Some(input) = test_mode::next_input(title) {
            return match input {
                TestInput::Value(value)
                    if matches!(
                        value.trim().to_ascii_lowercase().as_str(),
                        "yes" | "y" | "confirm" | "proceed"
                    ) =>
                {
                    ConfirmationResponse::Confirm
                }
                TestInput::Keep => ConfirmationResponse::Confirm,
                TestInput::Back => ConfirmationResponse::Back,
                _ => ConfirmationResponse::Cancel,
            };
        }
        match Select::with_theme(&self.theme)
            .items(&["Proceed", "Edit this step", "Cancel"])
            .default(0)
            .interact_opt()
        {
            Ok(Some(0)) => ConfirmationResponse::Confirm,
            Ok(Some(1)) => ConfirmationResponse::Back,
            _ => ConfirmationResponse::Cancel,
        }
    }
}
