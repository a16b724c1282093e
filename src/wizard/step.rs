use super::schema::Condition;
use super::value::FormState;

/// Input kinds understood by the wizard front-ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Secret,
    Boolean,
    Choice(Vec<&'static str>),
    File,
}

/// Declarative description of a single form field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub placeholder: Option<&'static str>,
    pub help: Option<&'static str>,
    /// Read-only fields display a default and are never prompted.
    pub read_only: bool,
    /// Field is only shown (and prompted) while the condition holds.
    pub visible_when: Option<Condition>,
}

impl FieldDescriptor {
    pub fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            placeholder: None,
            help: None,
            read_only: false,
            visible_when: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn shown_when(mut self, key: &'static str, value: &'static str) -> Self {
        self.visible_when = Some(Condition::Equals { key, value });
        self
    }

    pub fn is_visible(&self, state: &FormState) -> bool {
        self.visible_when
            .as_ref()
            .map_or(true, |condition| condition.holds(state))
    }
}

/// One page of a wizard and the field keys it owns.
#[derive(Debug, Clone)]
pub struct WizardStep {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub fields: Vec<&'static str>,
}

impl WizardStep {
    pub fn new(title: &'static str, subtitle: &'static str, fields: Vec<&'static str>) -> Self {
        Self {
            title,
            subtitle,
            fields,
        }
    }
}

/// Ordered step table plus the descriptors for every field the steps own.
#[derive(Debug, Clone)]
pub struct StepTable {
    pub name: &'static str,
    steps: Vec<WizardStep>,
    fields: Vec<FieldDescriptor>,
}

impl StepTable {
    pub fn new(name: &'static str, steps: Vec<WizardStep>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name,
            steps,
            fields,
        }
    }

    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&WizardStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Descriptors for a step, in the order the step lists them.
    pub fn fields_for(&self, index: usize) -> Vec<&FieldDescriptor> {
        self.step(index)
            .map(|step| {
                step.fields
                    .iter()
                    .filter_map(|key| self.field(key))
                    .collect()
            })
            .unwrap_or_default()
    }
}
