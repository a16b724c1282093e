//! Login and sign-up forms.

use serde::Serialize;

use crate::backend::Receipt;
use crate::errors::Result;
use crate::wizard::{
    Check, FieldDescriptor, FieldKind, FormState, Schema, StepTable, ValidationErrors, WizardFlow,
    WizardStep,
};

use super::required_text;

const EMAIL_MESSAGE: &str = "Please enter a valid email address";
const PASSWORD_MESSAGE: &str = "Password must be at least 8 characters";

/// Credentials that passed the login form's field checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn schema() -> Schema {
        Schema::new()
            .rule("email", Check::Email, EMAIL_MESSAGE)
            .rule("password", Check::MinLength(8), PASSWORD_MESSAGE)
    }

    /// Runs the form checks; field errors come back as data.
    pub fn parse(
        email: &str,
        password: &str,
    ) -> std::result::Result<Self, ValidationErrors> {
        let mut state = FormState::new();
        state.set_text("email", email.trim());
        state.set_text("password", password);
        let report = Self::schema().validate_all(&state);
        if report.passed() {
            Ok(Self {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
        } else {
            Err(report.errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

pub struct SignUpFlow {
    table: StepTable,
    schema: Schema,
}

impl SignUpFlow {
    pub fn new() -> Self {
        let table = StepTable::new(
            "signup",
            vec![WizardStep::new(
                "Create an account",
                "Please enter your details to sign up",
                vec!["name", "email", "password", "confirmPassword"],
            )],
            vec![
                FieldDescriptor::new("name", "Full Name", FieldKind::Text),
                FieldDescriptor::new("email", "Email Address", FieldKind::Text)
                    .with_placeholder("Enter your email address"),
                FieldDescriptor::new("password", "Password", FieldKind::Secret),
                FieldDescriptor::new("confirmPassword", "Confirm Password", FieldKind::Secret),
            ],
        );
        let schema = Schema::new()
            .rule("name", Check::MinLength(2), "Name must be at least 2 characters")
            .rule("email", Check::Email, EMAIL_MESSAGE)
            .rule("password", Check::MinLength(8), PASSWORD_MESSAGE)
            .rule(
                "confirmPassword",
                Check::Matches("password"),
                "Passwords don't match",
            );
        Self { table, schema }
    }
}

impl Default for SignUpFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardFlow for SignUpFlow {
    type Submission = SignUpRequest;
    type Receipt = Receipt;

    fn table(&self) -> &StepTable {
        &self.table
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn build_submission(&self, state: &FormState) -> Result<SignUpRequest> {
        Ok(SignUpRequest {
            name: required_text(state, "name")?,
            email: required_text(state, "email")?,
            password: state.text("password").to_string(),
        })
    }
}
