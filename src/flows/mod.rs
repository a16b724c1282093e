//! Concrete wizards built on [`crate::wizard`].

pub mod account;
pub mod dealer;
pub mod renewal;

pub use account::{LoginRequest, SignUpFlow, SignUpRequest};
pub use dealer::{DealerFlow, DealerRegistration, Eligibility, Operation};
pub use renewal::{PaymentMethod, RenewalFlow, RenewalRequest, SerialCheck, SerialVerification};

use crate::errors::{PortalError, Result};
use crate::wizard::{FileHandle, FormState};

pub(crate) fn required_text(state: &FormState, key: &str) -> Result<String> {
    state
        .filled(key)
        .ok_or_else(|| PortalError::IncompleteForm(format!("{key} is missing")))
}

pub(crate) fn required_file(state: &FormState, key: &str) -> Result<FileHandle> {
    state
        .file(key)
        .cloned()
        .ok_or_else(|| PortalError::IncompleteForm(format!("{key} has no attachment")))
}
