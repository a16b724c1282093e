//! Navigation controller shared by every multi-step flow.
//!
//! A [`Wizard`] owns one flow's [`FormState`], tracks the active step and
//! decides whether a move is allowed. Forward moves validate the departing
//! step; backward moves never do. Advancing past the last step runs the
//! flow's terminal action exactly once.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::errors::{PortalError, Result};

use super::schema::{Schema, ValidationReport};
use super::step::{StepTable, WizardStep};
use super::value::{FieldValue, FileHandle, FormState, ValidationErrors};

/// Contract implemented by each concrete wizard (renewal, dealer
/// registration, sign-up).
pub trait WizardFlow {
    /// Typed request assembled from the form once every step has passed.
    type Submission;
    /// Acknowledgement returned by the terminal action.
    type Receipt: Clone;

    fn table(&self) -> &StepTable;

    fn schema(&self) -> &Schema;

    /// Values present before the user types anything.
    fn defaults(&self) -> BTreeMap<String, FieldValue> {
        BTreeMap::new()
    }

    /// Builds the submission from a validated form.
    fn build_submission(&self, state: &FormState) -> Result<Self::Submission>;
}

/// The operation run when the last step is confirmed.
pub trait TerminalAction<F: WizardFlow + ?Sized> {
    fn perform(&self, submission: &F::Submission) -> Result<F::Receipt>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState<R> {
    Idle,
    Submitting,
    Succeeded(R),
}

impl<R> SubmissionState<R> {
    pub fn is_idle(&self) -> bool {
        matches!(self, SubmissionState::Idle)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SubmissionState::Succeeded(_))
    }
}

/// Result of [`Wizard::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<R> {
    Moved { from: usize, to: usize },
    Blocked(ValidationErrors),
    Submitted(R),
    /// The wizard already finished; nothing changed.
    Finished,
}

/// Result of [`Wizard::jump_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JumpOutcome {
    Moved { from: usize, to: usize },
    Blocked(ValidationErrors),
    Rejected,
}

pub struct Wizard<F: WizardFlow> {
    flow: F,
    state: FormState,
    index: usize,
    submission: SubmissionState<F::Receipt>,
}

impl<F: WizardFlow> Wizard<F> {
    pub fn new(flow: F) -> Self {
        let state = FormState::with_defaults(flow.defaults());
        Self {
            flow,
            state,
            index: 0,
            submission: SubmissionState::Idle,
        }
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn step_count(&self) -> usize {
        self.flow.table().len()
    }

    pub fn is_last_step(&self) -> bool {
        self.index + 1 >= self.step_count()
    }

    pub fn current_step(&self) -> Option<&WizardStep> {
        self.flow.table().step(self.index)
    }

    pub fn submission(&self) -> &SubmissionState<F::Receipt> {
        &self.submission
    }

    pub fn set(&mut self, key: &str, value: FieldValue) {
        self.state.set(key, value);
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.state.set_text(key, value);
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.state.set_flag(key, value);
    }

    pub fn set_choice(&mut self, key: &str, value: impl Into<String>) {
        self.state.set_choice(key, value);
    }

    pub fn attach(&mut self, key: &str, file: FileHandle) {
        self.state.attach(key, file);
    }

    pub fn clear(&mut self, key: &str) {
        self.state.clear(key);
    }

    /// Validates the active step and stores the fresh error set.
    pub fn validate_current(&mut self) -> ValidationReport {
        let scope = self
            .current_step()
            .map(|step| step.fields.clone())
            .unwrap_or_default();
        let report = self.flow.schema().validate(&self.state, &scope);
        self.state.replace_errors(report.errors.clone());
        if !report.passed() {
            debug!(
                wizard = self.flow.table().name,
                step = self.index,
                errors = report.errors.len(),
                "step validation failed"
            );
        }
        report
    }

    /// Moves forward one step, or runs the terminal action on the last step.
    pub fn advance<A>(&mut self, action: &A) -> Result<StepOutcome<F::Receipt>>
    where
        A: TerminalAction<F> + ?Sized,
    {
        if !self.submission.is_idle() {
            return Ok(StepOutcome::Finished);
        }

        let report = self.validate_current();
        if !report.passed() {
            return Ok(StepOutcome::Blocked(report.errors));
        }

        if !self.is_last_step() {
            let from = self.index;
            self.index += 1;
            debug!(wizard = self.flow.table().name, from, to = self.index, "advanced");
            return Ok(StepOutcome::Moved {
                from,
                to: self.index,
            });
        }

        let submission = self.flow.build_submission(&self.state)?;
        self.submission = SubmissionState::Submitting;
        info!(wizard = self.flow.table().name, "submitting");
        match action.perform(&submission) {
            Ok(receipt) => {
                self.submission = SubmissionState::Succeeded(receipt.clone());
                info!(wizard = self.flow.table().name, "submission accepted");
                Ok(StepOutcome::Submitted(receipt))
            }
            Err(err) => {
                self.submission = SubmissionState::Idle;
                Err(err)
            }
        }
    }

    /// Steps back one page without validating. Returns whether it moved.
    pub fn retreat(&mut self) -> bool {
        if !self.submission.is_idle() || self.index == 0 {
            return false;
        }
        self.index -= 1;
        debug!(wizard = self.flow.table().name, to = self.index, "retreated");
        true
    }

    /// Jumps to `target`: any earlier step, or the next one when the current
    /// step validates. Everything else is rejected without touching state.
    pub fn jump_to(&mut self, target: usize) -> JumpOutcome {
        if !self.submission.is_idle() {
            return JumpOutcome::Rejected;
        }
        let from = self.index;
        if target < from {
            self.index = target;
            debug!(wizard = self.flow.table().name, from, to = target, "jumped back");
            return JumpOutcome::Moved { from, to: target };
        }
        if target != from + 1 || target >= self.step_count() {
            return JumpOutcome::Rejected;
        }
        let report = self.validate_current();
        if !report.passed() {
            return JumpOutcome::Blocked(report.errors);
        }
        self.index = target;
        debug!(wizard = self.flow.table().name, from, to = target, "jumped forward");
        JumpOutcome::Moved { from, to: target }
    }

    /// Builds the submission without running the terminal action.
    pub fn preview_submission(&self) -> Result<F::Submission> {
        let report = self.flow.schema().validate_all(&self.state);
        if let Some((key, message)) = report.errors.iter().next() {
            return Err(PortalError::IncompleteForm(format!("{key}: {message}")));
        }
        self.flow.build_submission(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::wizard::step::{FieldDescriptor, FieldKind};

    struct TwoStepFlow {
        table: StepTable,
        schema: Schema,
    }

    impl TwoStepFlow {
        fn new() -> Self {
            Self {
                table: StepTable::new(
                    "test",
                    vec![
                        WizardStep::new("First", "name", vec!["name"]),
                        WizardStep::new("Second", "city", vec!["city"]),
                    ],
                    vec![
                        FieldDescriptor::new("name", "Name", FieldKind::Text),
                        FieldDescriptor::new("city", "City", FieldKind::Text),
                    ],
                ),
                schema: Schema::new()
                    .required("name", "Name is required")
                    .required("city", "City is required"),
            }
        }
    }

    impl WizardFlow for TwoStepFlow {
        type Submission = (String, String);
        type Receipt = String;

        fn table(&self) -> &StepTable {
            &self.table
        }

        fn schema(&self) -> &Schema {
            &self.schema
        }

        fn build_submission(&self, state: &FormState) -> Result<Self::Submission> {
            Ok((state.text("name").into(), state.text("city").into()))
        }
    }

    struct CountingAction {
        calls: Cell<usize>,
    }

    impl TerminalAction<TwoStepFlow> for CountingAction {
        fn perform(&self, submission: &(String, String)) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(format!("{} from {}", submission.0, submission.1))
        }
    }

    struct FailingAction;

    impl TerminalAction<TwoStepFlow> for FailingAction {
        fn perform(&self, _submission: &(String, String)) -> Result<String> {
            Err(PortalError::InvalidInput("backend unavailable".into()))
        }
    }

    #[test]
    fn advance_blocks_on_invalid_step() {
        let mut wizard = Wizard::new(TwoStepFlow::new());
        let action = CountingAction { calls: Cell::new(0) };
        let outcome = wizard.advance(&action).unwrap();
        match outcome {
            StepOutcome::Blocked(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors.get("name"), Some("Name is required"));
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
        assert_eq!(wizard.index(), 0);
        assert_eq!(wizard.state().error("name"), Some("Name is required"));
    }

    #[test]
    fn last_step_runs_terminal_action_once() {
        let mut wizard = Wizard::new(TwoStepFlow::new());
        let action = CountingAction { calls: Cell::new(0) };
        wizard.set_text("name", "Ama");
        assert_eq!(
            wizard.advance(&action).unwrap(),
            StepOutcome::Moved { from: 0, to: 1 }
        );
        wizard.set_text("city", "Kumasi");
        assert_eq!(
            wizard.advance(&action).unwrap(),
            StepOutcome::Submitted("Ama from Kumasi".to_string())
        );
        assert!(wizard.submission().is_finished());

        assert_eq!(wizard.advance(&action).unwrap(), StepOutcome::Finished);
        assert!(!wizard.retreat());
        assert_eq!(wizard.jump_to(0), JumpOutcome::Rejected);
        assert_eq!(action.calls.get(), 1);
    }

    #[test]
    fn failed_action_returns_to_idle() {
        let mut wizard = Wizard::new(TwoStepFlow::new());
        wizard.set_text("name", "Ama");
        wizard.set_text("city", "Tema");
        wizard.jump_to(1);
        assert!(wizard.advance(&FailingAction).is_err());
        assert!(wizard.submission().is_idle());
        assert_eq!(wizard.index(), 1);
    }

    #[test]
    fn retreat_stops_at_first_step() {
        let mut wizard = Wizard::new(TwoStepFlow::new());
        assert!(!wizard.retreat());
        wizard.set_text("name", "Kofi");
        wizard.jump_to(1);
        wizard.clear("name");
        assert!(wizard.retreat());
        assert_eq!(wizard.index(), 0);
    }

    #[test]
    fn revalidation_replaces_previous_errors() {
        let mut wizard = Wizard::new(TwoStepFlow::new());
        wizard.validate_current();
        assert!(wizard.state().error("name").is_some());
        wizard.set_text("name", "Esi");
        assert!(wizard.validate_current().passed());
        assert!(wizard.state().errors().is_empty());
    }

    #[test]
    fn preview_reports_first_missing_field() {
        let mut wizard = Wizard::new(TwoStepFlow::new());
        wizard.set_text("name", "Yaw");
        let err = wizard.preview_submission().unwrap_err();
        assert!(err.to_string().contains("city"));
    }
}
