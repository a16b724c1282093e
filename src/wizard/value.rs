use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Metadata for an attached document. The portal never reads file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl FileHandle {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            size: None,
        }
    }

    /// Builds a handle from a filesystem path, picking up the size when the
    /// file exists.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        let size = std::fs::metadata(path).ok().map(|meta| meta.len());
        Self {
            name,
            path: Some(path.to_path_buf()),
            size,
        }
    }
}

/// Typed value held for a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Choice(String),
    File(FileHandle),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn choice(value: impl Into<String>) -> Self {
        FieldValue::Choice(value.into())
    }

    /// Text or choice content, if this value carries any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) | FieldValue::Choice(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileHandle> {
        match self {
            FieldValue::File(handle) => Some(handle),
            _ => None,
        }
    }

    /// Empty text or an unset choice. Whitespace counts as content.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(value) | FieldValue::Choice(value) => value.is_empty(),
            FieldValue::Flag(_) | FieldValue::File(_) => false,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(value) | FieldValue::Choice(value) => value.trim().is_empty(),
            FieldValue::Flag(_) | FieldValue::File(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(value) | FieldValue::Choice(value) => write!(f, "{value}"),
            FieldValue::Flag(true) => write!(f, "Yes"),
            FieldValue::Flag(false) => write!(f, "No"),
            FieldValue::File(handle) => write!(f, "{}", handle.name),
        }
    }
}

/// Per-field validation messages, keyed by field key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `key` unless the key already has one.
    pub fn add(&mut self, key: &str, message: impl Into<String>) {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, message)| (key.as_str(), message.as_str()))
    }

    /// Keeps only the entries whose key appears in `scope`.
    pub fn retain_scope(&mut self, scope: &[&str]) {
        self.entries.retain(|key, _| scope.contains(&key.as_str()));
    }
}

/// Field values and the errors from the most recent validation run.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: BTreeMap<String, FieldValue>,
    errors: ValidationErrors,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: BTreeMap<String, FieldValue>) -> Self {
        Self {
            values: defaults,
            errors: ValidationErrors::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: FieldValue) {
        self.values.insert(key.to_string(), value);
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, FieldValue::Text(value.into()));
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.set(key, FieldValue::Flag(value));
    }

    pub fn set_choice(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, FieldValue::Choice(value.into()));
    }

    pub fn attach(&mut self, key: &str, file: FileHandle) {
        self.set(key, FieldValue::File(file));
    }

    pub fn clear(&mut self, key: &str) -> Option<FieldValue> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Text or choice content for `key`; empty when unset.
    pub fn text(&self, key: &str) -> &str {
        self.values
            .get(key)
            .and_then(FieldValue::as_str)
            .unwrap_or("")
    }

    /// Text for `key`, unless it is empty.
    pub fn filled(&self, key: &str) -> Option<String> {
        let value = self.text(key);
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.values
            .get(key)
            .and_then(FieldValue::as_flag)
            .unwrap_or(false)
    }

    pub fn file(&self, key: &str) -> Option<&FileHandle> {
        self.values.get(key).and_then(FieldValue::as_file)
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors.get(key)
    }

    /// Replaces the error set wholesale; errors are never patched in place.
    pub(crate) fn replace_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_per_key_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("tin", "TIN is required");
        errors.add("tin", "something else");
        assert_eq!(errors.get("tin"), Some("TIN is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn retain_scope_drops_out_of_scope_keys() {
        let mut errors = ValidationErrors::new();
        errors.add("companyName", "Company Name is required");
        errors.add("permitDocument", "Permit Document is required");
        errors.retain_scope(&["companyName", "tin"]);
        assert!(errors.contains("companyName"));
        assert!(!errors.contains("permitDocument"));
    }

    #[test]
    fn whitespace_is_blank_but_not_empty() {
        let mut state = FormState::new();
        state.set_text("name", "   ");
        assert!(state.get("name").is_some_and(FieldValue::is_blank));
        assert!(!state.get("name").is_some_and(FieldValue::is_empty));
        assert_eq!(state.filled("name").as_deref(), Some("   "));

        state.set_text("name", "");
        assert_eq!(state.filled("name"), None);
        assert!(!state.flag("is18Plus"));
    }

    #[test]
    fn file_value_displays_its_name() {
        let value = FieldValue::File(FileHandle::named("permit.pdf"));
        assert_eq!(value.to_string(), "permit.pdf");
        assert!(!value.is_blank());
    }
}
