//! Generic multi-step wizard: step table, form state, schema validation and
//! navigation. Concrete flows live in [`crate::flows`].

pub mod engine;
pub mod schema;
pub mod step;
pub mod value;

pub use engine::{JumpOutcome, StepOutcome, SubmissionState, TerminalAction, Wizard, WizardFlow};
pub use schema::{Check, Condition, Schema, ValidationReport};
pub use step::{FieldDescriptor, FieldKind, StepTable, WizardStep};
pub use value::{FieldValue, FileHandle, FormState, ValidationErrors};
