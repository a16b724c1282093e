//! Declarative field constraints evaluated against a [`FormState`].
//!
//! A schema is a list of base rules plus conditional rules that only apply
//! while a sibling field holds a given value. Every validation run evaluates
//! the whole schema and then narrows the result to the keys in scope, so a
//! revisited step never shows stale errors that belong to another step.

use once_cell::sync::Lazy;
use regex::Regex;

use super::value::{FieldValue, FormState, ValidationErrors};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// The constraint applied to one field.
#[derive(Debug, Clone)]
pub enum Check {
    /// Text or choice must be non-blank; other kinds must be present.
    Required,
    /// Text must match the whole expression.
    Pattern(Regex),
    FileAttached,
    MustBeTrue,
    OneOf(Vec<&'static str>),
    MinLength(usize),
    Email,
    /// Text must equal the text of another field.
    Matches(&'static str),
}

impl Check {
    fn passes(&self, value: Option<&FieldValue>, state: &FormState) -> bool {
        let text = value.and_then(FieldValue::as_str).unwrap_or("");
        match self {
            Check::Required => value.is_some_and(|value| !value.is_empty()),
            Check::Pattern(regex) => regex.is_match(text),
            Check::FileAttached => value.and_then(FieldValue::as_file).is_some(),
            Check::MustBeTrue => value.and_then(FieldValue::as_flag).unwrap_or(false),
            Check::OneOf(options) => options.iter().any(|option| *option == text),
            Check::MinLength(min) => text.chars().count() >= *min,
            Check::Email => EMAIL_PATTERN.is_match(text),
            Check::Matches(other) => text == state.text(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub key: &'static str,
    pub check: Check,
    pub message: String,
}

impl FieldRule {
    pub fn new(key: &'static str, check: Check, message: impl Into<String>) -> Self {
        Self {
            key,
            check,
            message: message.into(),
        }
    }
}

/// Gate for a conditional rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals {
        key: &'static str,
        value: &'static str,
    },
}

impl Condition {
    pub fn holds(&self, state: &FormState) -> bool {
        match self {
            Condition::Equals { key, value } => state.text(key) == *value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConditionalRule {
    pub when: Condition,
    pub rule: FieldRule,
}

/// Outcome of validating one scope of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: ValidationErrors,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: Vec<FieldRule>,
    conditional: Vec<ConditionalRule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, key: &'static str, check: Check, message: impl Into<String>) -> Self {
        self.rules.push(FieldRule::new(key, check, message));
        self
    }

    pub fn required(self, key: &'static str, message: impl Into<String>) -> Self {
        self.rule(key, Check::Required, message)
    }

    pub fn must_be_true(self, key: &'static str, message: impl Into<String>) -> Self {
        self.rule(key, Check::MustBeTrue, message)
    }

    pub fn file(self, key: &'static str, message: impl Into<String>) -> Self {
        self.rule(key, Check::FileAttached, message)
    }

    /// Adds a rule that only applies while `when` holds.
    pub fn when(
        mut self,
        when: Condition,
        key: &'static str,
        check: Check,
        message: impl Into<String>,
    ) -> Self {
        self.conditional.push(ConditionalRule {
            when,
            rule: FieldRule::new(key, check, message),
        });
        self
    }

    /// Shorthand for a conditional required rule on `key` when `gate == value`.
    pub fn required_when(
        self,
        gate: &'static str,
        value: &'static str,
        key: &'static str,
        message: impl Into<String>,
    ) -> Self {
        self.when(
            Condition::Equals { key: gate, value },
            key,
            Check::Required,
            message,
        )
    }

    /// Every key this schema constrains, base rules first.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::new();
        let all = self
            .rules
            .iter()
            .chain(self.conditional.iter().map(|conditional| &conditional.rule));
        for rule in all {
            if !keys.contains(&rule.key) {
                keys.push(rule.key);
            }
        }
        keys
    }

    /// Runs every rule, keeping at most one message per key and only for keys
    /// listed in `scope`.
    pub fn validate(&self, state: &FormState, scope: &[&str]) -> ValidationReport {
        let mut errors = ValidationErrors::new();
        let active = self.rules.iter().chain(
            self.conditional
                .iter()
                .filter(|conditional| conditional.when.holds(state))
                .map(|conditional| &conditional.rule),
        );
        for rule in active {
            if !rule.check.passes(state.get(rule.key), state) {
                errors.add(rule.key, rule.message.clone());
            }
        }
        errors.retain_scope(scope);
        ValidationReport { errors }
    }

    /// Validates every constrained key.
    pub fn validate_all(&self, state: &FormState) -> ValidationReport {
        let keys = self.keys();
        self.validate(state, &keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::value::FileHandle;

    fn payment_schema() -> Schema {
        Schema::new()
            .required("paymentOption", "Payment Option is required")
            .required_when(
                "paymentOption",
                "Mobile Money",
                "mobileNumber",
                "Phone number is required",
            )
    }

    #[test]
    fn required_rejects_only_empty_text() {
        let schema = Schema::new().required("tin", "TIN is required");
        let mut state = FormState::new();
        let report = schema.validate(&state, &["tin"]);
        assert_eq!(report.errors.get("tin"), Some("TIN is required"));

        state.set_text("tin", "");
        let report = schema.validate(&state, &["tin"]);
        assert_eq!(report.errors.get("tin"), Some("TIN is required"));

        state.set_text("tin", "  ");
        assert!(schema.validate(&state, &["tin"]).passed());
    }

    #[test]
    fn errors_outside_scope_are_hidden() {
        let schema = Schema::new()
            .required("companyName", "Company Name is required")
            .file("permitDocument", "Permit Document is required");
        let report = schema.validate(&FormState::new(), &["companyName"]);
        assert_eq!(report.errors.len(), 1);
        assert!(!report.errors.contains("permitDocument"));
    }

    #[test]
    fn conditional_rule_follows_gate_value() {
        let schema = payment_schema();
        let mut state = FormState::new();
        state.set_choice("paymentOption", "Card");
        assert!(schema
            .validate(&state, &["paymentOption", "mobileNumber"])
            .passed());

        state.set_choice("paymentOption", "Mobile Money");
        let report = schema.validate(&state, &["paymentOption", "mobileNumber"]);
        assert_eq!(
            report.errors.get("mobileNumber"),
            Some("Phone number is required")
        );
    }

    #[test]
    fn file_and_flag_checks() {
        let schema = Schema::new()
            .file("permitDocument", "Permit Document is required")
            .must_be_true("is18Plus", "Must be at least 18 years old");
        let mut state = FormState::new();
        state.set_text("permitDocument", "permit.pdf");
        state.set_flag("is18Plus", false);
        let report = schema.validate_all(&state);
        assert_eq!(report.errors.len(), 2);

        state.attach("permitDocument", FileHandle::named("permit.pdf"));
        state.set_flag("is18Plus", true);
        assert!(schema.validate_all(&state).passed());
    }

    #[test]
    fn matches_compares_sibling_text() {
        let schema = Schema::new().rule(
            "confirmPassword",
            Check::Matches("password"),
            "Passwords don't match",
        );
        let mut state = FormState::new();
        state.set_text("password", "password123");
        state.set_text("confirmPassword", "password124");
        assert!(!schema.validate_all(&state).passed());
        state.set_text("confirmPassword", "password123");
        assert!(schema.validate_all(&state).passed());
    }

    #[test]
    fn email_and_min_length() {
        let schema = Schema::new()
            .rule("email", Check::Email, "Please enter a valid email address")
            .rule(
                "password",
                Check::MinLength(8),
                "Password must be at least 8 characters",
            );
        let mut state = FormState::new();
        state.set_text("email", "admin@police");
        state.set_text("password", "short");
        assert_eq!(schema.validate_all(&state).errors.len(), 2);

        state.set_text("email", "admin@police.gov.gh");
        state.set_text("password", "password123");
        assert!(schema.validate_all(&state).passed());
    }

    #[test]
    fn keys_are_unique_and_ordered() {
        let schema = payment_schema().required("mobileNumber", "duplicate");
        assert_eq!(schema.keys(), vec!["paymentOption", "mobileNumber"]);
    }
}
