//! Gun dealer registration: company, documents, eligibility, operations.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::backend::Receipt;
use crate::errors::{PortalError, Result};
use crate::wizard::{
    Check, Condition, FieldDescriptor, FieldKind, FieldValue, FileHandle, FormState, Schema,
    StepTable, WizardFlow, WizardStep,
};

use super::{required_file, required_text};

pub const IMPORT: &str = "import";
pub const SELL: &str = "sell";
pub const DEFAULT_IMPORT_FEES: &str = "GHS 509.00";
pub const DEFAULT_WEAPON_FEE: &str = "GHS 2,100";

static GHANA_CARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GHA-[0-9]{9}-[0-9]$").expect("ghana card pattern compiles"));

/// Checks a director Ghana Card number such as `GHA-123456789-0`.
pub fn is_ghana_card(value: &str) -> bool {
    GHANA_CARD.is_match(value)
}

/// Attestations made on the police licensing step. A built registration
/// always carries all of them as `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub is_18_plus: bool,
    pub is_id_match: bool,
    pub no_criminal_record: bool,
    pub no_pending_cases: bool,
    pub no_dismissal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Import {
        total_fee: String,
        import_fees: String,
        weapon_fee: String,
        supporting_document: FileHandle,
    },
    Sell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DealerRegistration {
    pub company_name: String,
    pub tin: String,
    pub location: String,
    pub director_ghana_card: String,
    pub business_certificate: FileHandle,
    pub permit_document: FileHandle,
    pub eligibility: Eligibility,
    pub operation: Operation,
}

pub struct DealerFlow {
    table: StepTable,
    schema: Schema,
}

impl DealerFlow {
    pub fn new() -> Self {
        Self {
            table: step_table(),
            schema: schema(),
        }
    }
}

impl Default for DealerFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn step_table() -> StepTable {
    StepTable::new(
        "dealer-registration",
        vec![
            WizardStep::new(
                "Dealer Registration",
                "Company details",
                vec!["companyName", "tin", "location", "directorGhanaCard"],
            ),
            WizardStep::new(
                "Document Verification",
                "Upload relevant documents",
                vec!["businessCertificate", "permitDocument"],
            ),
            WizardStep::new(
                "Police Licensing Verification",
                "Confirm your eligibility",
                vec![
                    "is18Plus",
                    "isIdMatch",
                    "noCriminalRecord",
                    "noPendingCases",
                    "noDismissal",
                ],
            ),
            WizardStep::new(
                "Operations",
                "Select between import/ sale operations",
                vec![
                    "operationType",
                    "totalFee",
                    "importFees",
                    "supportingDocument",
                    "weaponFee",
                ],
            ),
        ],
        vec![
            FieldDescriptor::new("companyName", "Company Name", FieldKind::Text)
                .with_placeholder("Enter your company name"),
            FieldDescriptor::new("tin", "TIN", FieldKind::Text).with_placeholder("Enter your TIN"),
            FieldDescriptor::new("location", "Location", FieldKind::Text)
                .with_placeholder("Enter your company location"),
            FieldDescriptor::new(
                "directorGhanaCard",
                "Ghana Card Number of Director",
                FieldKind::Text,
            )
            .with_placeholder("GHA-123456789-0"),
            FieldDescriptor::new(
                "businessCertificate",
                "Business Registration Certificate",
                FieldKind::File,
            ),
            FieldDescriptor::new("permitDocument", "Permit Document", FieldKind::File),
            FieldDescriptor::new("is18Plus", "You're at least 18 years old", FieldKind::Boolean),
            FieldDescriptor::new(
                "isIdMatch",
                "Your ID and personal details match what you put on the application",
                FieldKind::Boolean,
            ),
            FieldDescriptor::new(
                "noCriminalRecord",
                "You have never been convicted of a criminal offence",
                FieldKind::Boolean,
            ),
            FieldDescriptor::new(
                "noPendingCases",
                "You have no pending court cases against you",
                FieldKind::Boolean,
            ),
            FieldDescriptor::new(
                "noDismissal",
                "You have never been dismissed from employment or school for misconduct",
                FieldKind::Boolean,
            ),
            FieldDescriptor::new(
                "operationType",
                "Operation",
                FieldKind::Choice(vec![IMPORT, SELL]),
            )
            .with_help("import: Register Imported Firearms, sell: Sell / Transfer Firearm"),
            FieldDescriptor::new("totalFee", "Total Fee", FieldKind::Text)
                .with_placeholder("Enter total fee")
                .shown_when("operationType", IMPORT),
            FieldDescriptor::new("importFees", "Import Fees", FieldKind::Text)
                .read_only()
                .shown_when("operationType", IMPORT),
            FieldDescriptor::new("supportingDocument", "Supporting Document", FieldKind::File)
                .shown_when("operationType", IMPORT),
            FieldDescriptor::new("weaponFee", "Weapon Fee", FieldKind::Text)
                .read_only()
                .shown_when("operationType", IMPORT),
        ],
    )
}

fn schema() -> Schema {
    Schema::new()
        .required("companyName", "Company Name is required")
        .required("tin", "TIN is required")
        .required("location", "Location is required")
        .rule(
            "directorGhanaCard",
            Check::Pattern((*GHANA_CARD).clone()),
            "Invalid Ghana Card format (e.g., GHA-123456789-0)",
        )
        .file("businessCertificate", "Business Certificate is required")
        .file("permitDocument", "Permit Document is required")
        .must_be_true("is18Plus", "Must be at least 18 years old")
        .must_be_true("isIdMatch", "ID details must match")
        .must_be_true("noCriminalRecord", "Must confirm no criminal record")
        .must_be_true("noPendingCases", "Must confirm no pending cases")
        .must_be_true("noDismissal", "Must confirm no dismissal history")
        .rule(
            "operationType",
            Check::OneOf(vec![IMPORT, SELL]),
            "Select an operation type",
        )
        .required_when("operationType", IMPORT, "totalFee", "Total Fee is required")
        .when(
            Condition::Equals {
                key: "operationType",
                value: IMPORT,
            },
            "supportingDocument",
            Check::FileAttached,
            "Supporting Document is required",
        )
}

impl WizardFlow for DealerFlow {
    type Submission = DealerRegistration;
    type Receipt = Receipt;

    fn table(&self) -> &StepTable {
        &self.table
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn defaults(&self) -> BTreeMap<String, FieldValue> {
        let mut defaults = BTreeMap::new();
        defaults.insert("operationType".to_string(), FieldValue::choice(IMPORT));
        defaults.insert("totalFee".to_string(), FieldValue::text(""));
        defaults.insert("importFees".to_string(), FieldValue::text(DEFAULT_IMPORT_FEES));
        defaults.insert("weaponFee".to_string(), FieldValue::text(DEFAULT_WEAPON_FEE));
        for key in [
            "is18Plus",
            "isIdMatch",
            "noCriminalRecord",
            "noPendingCases",
            "noDismissal",
        ] {
            defaults.insert(key.to_string(), FieldValue::Flag(false));
        }
        defaults
    }

    fn build_submission(&self, state: &FormState) -> Result<DealerRegistration> {
        let eligibility = Eligibility {
            is_18_plus: state.flag("is18Plus"),
            is_id_match: state.flag("isIdMatch"),
            no_criminal_record: state.flag("noCriminalRecord"),
            no_pending_cases: state.flag("noPendingCases"),
            no_dismissal: state.flag("noDismissal"),
        };
        let operation = match state.text("operationType") {
            IMPORT => Operation::Import {
                total_fee: required_text(state, "totalFee")?,
                import_fees: required_text(state, "importFees")?,
                weapon_fee: required_text(state, "weaponFee")?,
                supporting_document: required_file(state, "supportingDocument")?,
            },
            SELL => Operation::Sell,
            other => {
                return Err(PortalError::IncompleteForm(format!(
                    "unsupported operation `{other}`"
                )))
            }
        };
        Ok(DealerRegistration {
            company_name: required_text(state, "companyName")?,
            tin: required_text(state, "tin")?,
            location: required_text(state, "location")?,
            director_ghana_card: required_text(state, "directorGhanaCard")?,
            business_certificate: required_file(state, "businessCertificate")?,
            permit_document: required_file(state, "permitDocument")?,
            eligibility,
            operation,
        })
    }
}
