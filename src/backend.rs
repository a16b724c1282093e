//! Boundary between the portal and whatever serves its data.
//!
//! Only [`SimulatedBackend`] exists: it answers from the demo directory and
//! the seeded registry after a fixed pause, and every submission succeeds.

use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{AuthError, Authenticator, DemoDirectory, User};
use crate::errors::Result;
use crate::flows::{
    DealerFlow, DealerRegistration, RenewalFlow, RenewalRequest, SignUpFlow, SignUpRequest,
};
use crate::registry::{
    AlertDecision, AlertRecord, AlertTab, DashboardSummary, LicenseQuery, LicenseRecord,
    LicenseRegistry, Page, WeaponRecord,
};
use crate::wizard::TerminalAction;

pub const LOGIN_DELAY: Duration = Duration::from_millis(500);
pub const SIGN_UP_DELAY: Duration = Duration::from_millis(1000);
pub const LOOKUP_DELAY: Duration = Duration::from_millis(1500);
pub const DEALER_SUBMIT_DELAY: Duration = Duration::from_millis(2000);
pub const RENEWAL_SUBMIT_DELAY: Duration = Duration::from_millis(3000);

/// Acknowledgement for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub reference: String,
    pub submitted_at: DateTime<Utc>,
    pub message: String,
}

impl Receipt {
    fn issue(prefix: &str, message: &str) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self {
            reference: format!("{prefix}-{}", id[..8].to_uppercase()),
            submitted_at: Utc::now(),
            message: message.to_string(),
        }
    }
}

/// Blocks for the length of a simulated round-trip.
pub trait Pacer {
    fn pause(&self, label: &str, duration: Duration);
}

/// Sleeps the calling thread, scaled by `scale` (0 disables the pause).
#[derive(Debug, Clone, Copy)]
pub struct ThreadPacer {
    scale: f64,
}

impl ThreadPacer {
    pub fn new(scale: f64) -> Self {
        Self {
            scale: scale.max(0.0),
        }
    }

    /// Saturates at `Duration::MAX` for scales too large to represent.
    pub fn scaled(&self, duration: Duration) -> Duration {
        Duration::try_from_secs_f64(duration.as_secs_f64() * self.scale).unwrap_or(Duration::MAX)
    }
}

impl Default for ThreadPacer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Pacer for ThreadPacer {
    fn pause(&self, label: &str, duration: Duration) {
        let scaled = self.scaled(duration);
        debug!(label, millis = scaled.as_millis() as u64, "simulated delay");
        if !scaled.is_zero() {
            thread::sleep(scaled);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstantPacer;

impl Pacer for InstantPacer {
    fn pause(&self, _label: &str, _duration: Duration) {}
}

impl<P: Pacer + ?Sized> Pacer for Box<P> {
    fn pause(&self, label: &str, duration: Duration) {
        (**self).pause(label, duration)
    }
}

/// Everything the portal asks of a data service.
pub trait Backend {
    fn authenticate(&self, email: &str, password: &str) -> std::result::Result<User, AuthError>;

    fn sign_up(&self, request: &SignUpRequest) -> Result<Receipt>;

    fn submit_dealer_registration(&self, registration: &DealerRegistration) -> Result<Receipt>;

    fn submit_renewal(&self, request: &RenewalRequest) -> Result<Receipt>;

    fn lookup_weapon(&self, serial: &str) -> Result<Option<WeaponRecord>>;

    fn list_licenses(&self, query: &LicenseQuery) -> Result<Page<LicenseRecord>>;

    fn license_details(&self, serial: &str) -> Result<LicenseRecord>;

    fn dashboard_summary(&self) -> Result<DashboardSummary>;

    fn alerts(&self, tab: AlertTab) -> Result<Vec<AlertRecord>>;

    fn resolve_alert(&mut self, id: u32, decision: AlertDecision) -> Result<AlertRecord>;
}

pub struct SimulatedBackend<P: Pacer> {
    pacer: P,
    directory: DemoDirectory,
    registry: LicenseRegistry,
}

impl<P: Pacer> SimulatedBackend<P> {
    pub fn new(pacer: P) -> Self {
        Self {
            pacer,
            directory: DemoDirectory::new(),
            registry: LicenseRegistry::seeded(),
        }
    }
}

impl<P: Pacer> Backend for SimulatedBackend<P> {
    fn authenticate(&self, email: &str, password: &str) -> std::result::Result<User, AuthError> {
        self.pacer.pause("Signing in", LOGIN_DELAY);
        let result = self.directory.authenticate(email, password);
        match &result {
            Ok(user) => info!(email = %user.email, role = %user.role, "login accepted"),
            Err(_) => info!(email = email.trim(), "login rejected"),
        }
        result
    }

    fn sign_up(&self, request: &SignUpRequest) -> Result<Receipt> {
        self.pacer.pause("Creating account", SIGN_UP_DELAY);
        info!(email = %request.email, "sign-up received");
        Ok(Receipt::issue("SUP", "Account request received"))
    }

    fn submit_dealer_registration(&self, registration: &DealerRegistration) -> Result<Receipt> {
        self.pacer.pause("Submitting application", DEALER_SUBMIT_DELAY);
        info!(company = %registration.company_name, "dealer registration received");
        Ok(Receipt::issue("DLR", "Application Submitted!"))
    }

    fn submit_renewal(&self, request: &RenewalRequest) -> Result<Receipt> {
        self.pacer.pause("Processing payment", RENEWAL_SUBMIT_DELAY);
        info!(
            serial = %request.serial_number,
            method = request.payment.label(),
            "renewal payment received"
        );
        Ok(Receipt::issue("REN", "Payment Successful!"))
    }

    fn lookup_weapon(&self, serial: &str) -> Result<Option<WeaponRecord>> {
        self.pacer.pause("Verifying serial number", LOOKUP_DELAY);
        Ok(self.registry.lookup_weapon(serial).cloned())
    }

    fn list_licenses(&self, query: &LicenseQuery) -> Result<Page<LicenseRecord>> {
        Ok(self.registry.list_licenses(query))
    }

    fn license_details(&self, serial: &str) -> Result<LicenseRecord> {
        self.registry.license_details(serial).cloned()
    }

    fn dashboard_summary(&self) -> Result<DashboardSummary> {
        Ok(self.registry.dashboard_summary())
    }

    fn alerts(&self, tab: AlertTab) -> Result<Vec<AlertRecord>> {
        Ok(self.registry.alerts(tab).into_iter().cloned().collect())
    }

    fn resolve_alert(&mut self, id: u32, decision: AlertDecision) -> Result<AlertRecord> {
        self.registry.resolve_alert(id, decision).cloned()
    }
}

impl<B: Backend + ?Sized> TerminalAction<RenewalFlow> for B {
    fn perform(&self, submission: &RenewalRequest) -> Result<Receipt> {
        self.submit_renewal(submission)
    }
}

impl<B: Backend + ?Sized> TerminalAction<DealerFlow> for B {
    fn perform(&self, submission: &DealerRegistration) -> Result<Receipt> {
        self.submit_dealer_registration(submission)
    }
}

impl<B: Backend + ?Sized> TerminalAction<SignUpFlow> for B {
    fn perform(&self, submission: &SignUpRequest) -> Result<Receipt> {
        self.sign_up(submission)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::auth::Role;

    #[derive(Default)]
    struct RecordingPacer {
        pauses: RefCell<Vec<(String, Duration)>>,
    }

    impl Pacer for RecordingPacer {
        fn pause(&self, label: &str, duration: Duration) {
            self.pauses.borrow_mut().push((label.to_string(), duration));
        }
    }

    #[test]
    fn login_waits_then_resolves_role() {
        let backend = SimulatedBackend::new(RecordingPacer::default());
        let user = backend
            .authenticate("user@renewal.com", "password123")
            .unwrap();
        assert_eq!(user.role, Role::RenewalUser);
        assert_eq!(
            backend.pacer.pauses.borrow().as_slice(),
            &[("Signing in".to_string(), LOGIN_DELAY)]
        );
    }

    #[test]
    fn weapon_lookup_pauses_for_verification() {
        let backend = SimulatedBackend::new(RecordingPacer::default());
        assert!(backend.lookup_weapon("RUG1234570").unwrap().is_some());
        assert!(backend.lookup_weapon("missing").unwrap().is_none());
        let pauses = backend.pacer.pauses.borrow();
        assert_eq!(pauses.len(), 2);
        assert!(pauses.iter().all(|(_, duration)| *duration == LOOKUP_DELAY));
    }

    #[test]
    fn receipts_carry_prefixed_references() {
        let backend = SimulatedBackend::new(InstantPacer);
        let receipt = backend
            .sign_up(&SignUpRequest {
                name: "Ama".into(),
                email: "ama@example.com".into(),
                password: "password123".into(),
            })
            .unwrap();
        assert!(receipt.reference.starts_with("SUP-"));
        assert_eq!(receipt.reference.len(), 12);
    }

    #[test]
    fn zero_scale_disables_pauses() {
        let pacer = ThreadPacer::new(0.0);
        assert!(pacer.scaled(RENEWAL_SUBMIT_DELAY).is_zero());
        assert_eq!(
            ThreadPacer::new(0.5).scaled(DEALER_SUBMIT_DELAY),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn huge_scale_saturates() {
        assert_eq!(
            ThreadPacer::new(1e300).scaled(RENEWAL_SUBMIT_DELAY),
            Duration::MAX
        );
        assert!(ThreadPacer::new(f64::NAN).scaled(LOGIN_DELAY).is_zero());
    }

    #[test]
    fn alerts_resolve_through_backend() {
        let mut backend = SimulatedBackend::new(InstantPacer);
        let resolved = backend.resolve_alert(4, AlertDecision::Reject).unwrap();
        assert_eq!(resolved.status, crate::registry::AlertStatus::Rejected);
        let pending = backend
            .alerts(AlertTab::All)
            .unwrap()
            .into_iter()
            .filter(|alert| alert.status == crate::registry::AlertStatus::Pending)
            .count();
        assert_eq!(pending, 1);
    }
}
