//! License renewal: weapon confirmation, identity, documents and payment.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::backend::{Backend, Receipt};
use crate::errors::{PortalError, Result};
use crate::registry::WeaponRecord;
use crate::wizard::{
    FieldDescriptor, FieldKind, FieldValue, FileHandle, FormState, Schema, StepTable,
    ValidationErrors, Wizard, WizardFlow, WizardStep,
};

use super::required_text;

pub const MOBILE_MONEY: &str = "Mobile Money";
pub const CARD: &str = "Card";
pub const DEFAULT_AMOUNT: &str = "GHS 2,300";

pub const REGIONS: [&str; 2] = ["Greater Accra", "Ashanti"];
pub const NETWORKS: [&str; 3] = ["MTN", "Vodafone", "AirtelTigo"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethod {
    MobileMoney {
        network: String,
        number: String,
    },
    Card {
        number: String,
        expiry: String,
        #[serde(skip_serializing)]
        cvv: String,
        holder: String,
    },
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::MobileMoney { .. } => MOBILE_MONEY,
            PaymentMethod::Card { .. } => CARD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenewalRequest {
    pub serial_number: String,
    pub ghana_card_number: String,
    pub name: String,
    pub expiry_date: String,
    pub police_report: Option<FileHandle>,
    pub medical_clearance: Option<FileHandle>,
    pub address: String,
    pub region: String,
    pub amount: String,
    pub payment: PaymentMethod,
}

pub struct RenewalFlow {
    table: StepTable,
    schema: Schema,
}

impl RenewalFlow {
    pub fn new() -> Self {
        Self {
            table: step_table(),
            schema: schema(),
        }
    }
}

impl Default for RenewalFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn step_table() -> StepTable {
    StepTable::new(
        "renewal",
        vec![
            WizardStep::new("Renew Licence", "Confirm weapon details", vec!["serialNumber"]),
            WizardStep::new(
                "Identity Verification",
                "Confirm personal details",
                vec!["ghanaCardNumber", "name", "expiryDate"],
            ),
            WizardStep::new(
                "Document Verification",
                "Upload relevant documents",
                vec!["policeReport", "medicalClearance", "address", "region"],
            ),
            WizardStep::new(
                "Payment",
                "Make payment to complete",
                vec![
                    "paymentOption",
                    "mobileNetwork",
                    "mobileNumber",
                    "cardNumber",
                    "cardExpiry",
                    "cardCvv",
                    "cardHolderName",
                    "amount",
                ],
            ),
        ],
        vec![
            FieldDescriptor::new("serialNumber", "Gun Serial Number", FieldKind::Text)
                .with_placeholder("Enter your Serial Number"),
            FieldDescriptor::new("ghanaCardNumber", "Ghana Card Number", FieldKind::Text)
                .with_placeholder("GHA-034739743943"),
            FieldDescriptor::new("name", "Name", FieldKind::Text).with_placeholder("Samuel Levi"),
            FieldDescriptor::new("expiryDate", "Expiry Date", FieldKind::Date)
                .with_placeholder("DD/MM/YYYY"),
            FieldDescriptor::new("policeReport", "Police Report", FieldKind::File)
                .with_help("Optional"),
            FieldDescriptor::new("medicalClearance", "Medical Clearance", FieldKind::File)
                .with_help("Optional"),
            FieldDescriptor::new("address", "Address", FieldKind::Text)
                .with_placeholder("East Legon, Accra"),
            FieldDescriptor::new(
                "region",
                "Region for verification",
                FieldKind::Choice(REGIONS.to_vec()),
            ),
            FieldDescriptor::new(
                "paymentOption",
                "Payment Option",
                FieldKind::Choice(vec![MOBILE_MONEY, CARD]),
            ),
            FieldDescriptor::new("mobileNetwork", "Network", FieldKind::Choice(NETWORKS.to_vec()))
                .shown_when("paymentOption", MOBILE_MONEY),
            FieldDescriptor::new("mobileNumber", "Phone Number", FieldKind::Text)
                .with_placeholder("024XXXXXXX")
                .shown_when("paymentOption", MOBILE_MONEY),
            FieldDescriptor::new("cardNumber", "Card Number", FieldKind::Text)
                .with_placeholder("0000 0000 0000 0000")
                .shown_when("paymentOption", CARD),
            FieldDescriptor::new("cardExpiry", "Expiry Date", FieldKind::Text)
                .with_placeholder("MM/YY")
                .shown_when("paymentOption", CARD),
            FieldDescriptor::new("cardCvv", "CVV", FieldKind::Secret)
                .with_placeholder("123")
                .shown_when("paymentOption", CARD),
            FieldDescriptor::new("cardHolderName", "Card Holder Name", FieldKind::Text)
                .with_placeholder("John Doe")
                .shown_when("paymentOption", CARD),
            FieldDescriptor::new("amount", "Amount", FieldKind::Text).read_only(),
        ],
    )
}

fn schema() -> Schema {
    Schema::new()
        .required("serialNumber", "Serial Number is required")
        .required("ghanaCardNumber", "Ghana Card Number is required")
        .required("name", "Name is required")
        .required("expiryDate", "Expiry Date is required")
        .required("address", "Address is required")
        .required("region", "Region is required")
        .required("paymentOption", "Payment Option is required")
        .required("amount", "Amount is required")
        .required_when("paymentOption", MOBILE_MONEY, "mobileNetwork", "Network is required")
        .required_when(
            "paymentOption",
            MOBILE_MONEY,
            "mobileNumber",
            "Phone number is required",
        )
        .required_when("paymentOption", CARD, "cardNumber", "Card number is required")
        .required_when("paymentOption", CARD, "cardExpiry", "Expiry date is required")
        .required_when("paymentOption", CARD, "cardCvv", "CVV is required")
        .required_when(
            "paymentOption",
            CARD,
            "cardHolderName",
            "Card holder name is required",
        )
}

impl WizardFlow for RenewalFlow {
    type Submission = RenewalRequest;
    type Receipt = Receipt;

    fn table(&self) -> &StepTable {
        &self.table
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn defaults(&self) -> BTreeMap<String, FieldValue> {
        BTreeMap::from([("amount".to_string(), FieldValue::text(DEFAULT_AMOUNT))])
    }

    fn build_submission(&self, state: &FormState) -> Result<RenewalRequest> {
        let payment = match state.text("paymentOption") {
            MOBILE_MONEY => PaymentMethod::MobileMoney {
                network: required_text(state, "mobileNetwork")?,
                number: required_text(state, "mobileNumber")?,
            },
            CARD => PaymentMethod::Card {
                number: required_text(state, "cardNumber")?,
                expiry: required_text(state, "cardExpiry")?,
                cvv: required_text(state, "cardCvv")?,
                holder: required_text(state, "cardHolderName")?,
            },
            other => {
                return Err(PortalError::IncompleteForm(format!(
                    "unsupported payment option `{other}`"
                )))
            }
        };
        Ok(RenewalRequest {
            serial_number: required_text(state, "serialNumber")?,
            ghana_card_number: required_text(state, "ghanaCardNumber")?,
            name: required_text(state, "name")?,
            expiry_date: required_text(state, "expiryDate")?,
            police_report: state.file("policeReport").cloned(),
            medical_clearance: state.file("medicalClearance").cloned(),
            address: required_text(state, "address")?,
            region: required_text(state, "region")?,
            amount: required_text(state, "amount")?,
            payment,
        })
    }
}

/// Result of pressing verify on the weapon step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialCheck {
    Invalid(ValidationErrors),
    Unknown(String),
    Found(WeaponRecord),
}

/// Two-phase confirmation for the first renewal step: the serial is looked
/// up and shown before the wizard may move on. The confirmation only counts
/// while the serial in the form still matches the one that was looked up.
#[derive(Debug, Clone, Default)]
pub struct SerialVerification {
    verified: Option<WeaponRecord>,
}

impl SerialVerification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verify<B>(&mut self, wizard: &mut Wizard<RenewalFlow>, backend: &B) -> Result<SerialCheck>
    where
        B: Backend + ?Sized,
    {
        self.verified = None;
        let report = wizard.validate_current();
        if !report.passed() {
            return Ok(SerialCheck::Invalid(report.errors));
        }
        let serial = wizard.state().text("serialNumber").trim().to_string();
        match backend.lookup_weapon(&serial)? {
            Some(record) => {
                info!(serial = %record.serial, "weapon verified");
                self.verified = Some(record.clone());
                Ok(SerialCheck::Found(record))
            }
            None => Ok(SerialCheck::Unknown(serial)),
        }
    }

    /// The verified weapon, provided the form still holds its serial.
    pub fn confirmed<'a>(&'a self, state: &FormState) -> Option<&'a WeaponRecord> {
        self.verified
            .as_ref()
            .filter(|record| record.serial.eq_ignore_ascii_case(state.text("serialNumber").trim()))
    }

    pub fn reset(&mut self) {
        self.verified = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InstantPacer, SimulatedBackend};
    use crate::wizard::{JumpOutcome, StepOutcome};

    fn fill_until_payment(wizard: &mut Wizard<RenewalFlow>) {
        wizard.set_text("serialNumber", "RUG1234567");
        wizard.set_text("ghanaCardNumber", "GHA-723456789-0");
        wizard.set_text("name", "Samuel Levi");
        wizard.set_text("expiryDate", "20/01/2026");
        wizard.set_text("address", "East Legon, Accra");
        wizard.set_choice("region", "Greater Accra");
        let backend = SimulatedBackend::new(InstantPacer);
        for _ in 0..3 {
            assert!(matches!(
                wizard.advance(&backend).unwrap(),
                StepOutcome::Moved { .. }
            ));
        }
        assert_eq!(wizard.index(), 3);
    }

    #[test]
    fn empty_serial_yields_single_error() {
        let mut wizard = Wizard::new(RenewalFlow::new());
        let backend = SimulatedBackend::new(InstantPacer);
        match wizard.advance(&backend).unwrap() {
            StepOutcome::Blocked(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors.get("serialNumber"), Some("Serial Number is required"));
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
        assert_eq!(wizard.index(), 0);
    }

    #[test]
    fn amount_defaults_to_renewal_fee() {
        let wizard = Wizard::new(RenewalFlow::new());
        assert_eq!(wizard.state().text("amount"), DEFAULT_AMOUNT);
    }

    #[test]
    fn payment_option_toggles_sub_fields() {
        let mut wizard = Wizard::new(RenewalFlow::new());
        fill_until_payment(&mut wizard);

        let report = wizard.validate_current();
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors.contains("paymentOption"));

        wizard.set_choice("paymentOption", MOBILE_MONEY);
        let report = wizard.validate_current();
        assert_eq!(report.errors.get("mobileNetwork"), Some("Network is required"));
        assert_eq!(report.errors.get("mobileNumber"), Some("Phone number is required"));
        assert!(!report.errors.contains("cardNumber"));

        wizard.set_choice("paymentOption", CARD);
        let report = wizard.validate_current();
        assert_eq!(report.errors.len(), 4);
        assert_eq!(report.errors.get("cardCvv"), Some("CVV is required"));
        assert!(!report.errors.contains("mobileNumber"));
    }

    #[test]
    fn mobile_money_payment_submits() {
        let mut wizard = Wizard::new(RenewalFlow::new());
        fill_until_payment(&mut wizard);
        wizard.set_choice("paymentOption", MOBILE_MONEY);
        wizard.set_choice("mobileNetwork", "MTN");
        wizard.set_text("mobileNumber", "0241234567");

        let request = wizard.preview_submission().unwrap();
        assert_eq!(
            request.payment,
            PaymentMethod::MobileMoney {
                network: "MTN".into(),
                number: "0241234567".into()
            }
        );
        assert!(request.police_report.is_none());

        let backend = SimulatedBackend::new(InstantPacer);
        match wizard.advance(&backend).unwrap() {
            StepOutcome::Submitted(receipt) => assert!(receipt.reference.starts_with("REN-")),
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn jumps_follow_dot_rules() {
        let mut wizard = Wizard::new(RenewalFlow::new());
        assert_eq!(wizard.jump_to(2), JumpOutcome::Rejected);
        assert!(matches!(wizard.jump_to(1), JumpOutcome::Blocked(_)));

        fill_until_payment(&mut wizard);
        wizard.clear("name");
        assert_eq!(wizard.jump_to(1), JumpOutcome::Moved { from: 3, to: 1 });
        assert_eq!(wizard.jump_to(3), JumpOutcome::Rejected);
    }

    #[test]
    fn skipping_ahead_is_rejected_even_when_step_is_valid() {
        let mut wizard = Wizard::new(RenewalFlow::new());
        wizard.set_text("serialNumber", "RUG1234567");
        assert!(wizard.validate_current().passed());

        assert_eq!(wizard.jump_to(2), JumpOutcome::Rejected);
        assert_eq!(wizard.jump_to(3), JumpOutcome::Rejected);
        assert_eq!(wizard.index(), 0);
        assert_eq!(wizard.jump_to(1), JumpOutcome::Moved { from: 0, to: 1 });
    }

    #[test]
    fn serial_verification_tracks_edits() {
        let mut wizard = Wizard::new(RenewalFlow::new());
        let backend = SimulatedBackend::new(InstantPacer);
        let mut verification = SerialVerification::new();

        assert!(matches!(
            verification.verify(&mut wizard, &backend).unwrap(),
            SerialCheck::Invalid(_)
        ));

        wizard.set_text("serialNumber", "NOPE0000");
        assert_eq!(
            verification.verify(&mut wizard, &backend).unwrap(),
            SerialCheck::Unknown("NOPE0000".into())
        );

        wizard.set_text("serialNumber", "rug1234567");
        match verification.verify(&mut wizard, &backend).unwrap() {
            SerialCheck::Found(record) => assert_eq!(record.model, "Ruger American"),
            other => panic!("Unexpected check: {:?}", other),
        }
        assert!(verification.confirmed(wizard.state()).is_some());

        wizard.set_text("serialNumber", "RUG1234568");
        assert!(verification.confirmed(wizard.state()).is_none());
    }
}
