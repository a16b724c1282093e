//! Hard-coded license, weapon and alert records behind the admin views.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{PortalError, Result};

pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Parses a `DD/MM/YYYY` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| PortalError::InvalidInput(format!("`{value}` is not a DD/MM/YYYY date")))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formats a count with thousands separators, e.g. `53,000`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseStatus {
    Renewed,
    Expired,
    Pending,
}

impl LicenseStatus {
    pub const ALL: [LicenseStatus; 3] = [
        LicenseStatus::Renewed,
        LicenseStatus::Expired,
        LicenseStatus::Pending,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LicenseStatus::Renewed => "Renewed",
            LicenseStatus::Expired => "Expired",
            LicenseStatus::Pending => "Pending",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LicenseStatus {
    type Err = PortalError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "renewed" => Ok(LicenseStatus::Renewed),
            "expired" => Ok(LicenseStatus::Expired),
            "pending" => Ok(LicenseStatus::Pending),
            other => Err(PortalError::InvalidInput(format!(
                "unknown license status `{other}` (expected Renewed, Expired or Pending)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub serial: String,
    pub owner: String,
    pub card_id: String,
    pub expiry: NaiveDate,
    pub status: LicenseStatus,
    pub region: String,
    pub license_type: String,
    pub last_renewed: NaiveDate,
}

/// What the renewal wizard shows after a serial lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponRecord {
    pub serial: String,
    pub weapon_type: String,
    pub model: String,
    pub owner: String,
    pub previous_status: String,
    pub expiry: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertStatus::Pending => "Pending",
            AlertStatus::Accepted => "Accepted",
            AlertStatus::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Alert,
    Report,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: u32,
    pub user: String,
    pub action: String,
    pub subject: String,
    pub time: String,
    pub status: AlertStatus,
    pub kind: AlertKind,
}

impl AlertRecord {
    pub fn summary(&self) -> String {
        format!("{} {} {}", self.user, self.action, self.subject)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertTab {
    #[default]
    All,
    Alerts,
    Reporting,
}

impl AlertTab {
    fn includes(self, alert: &AlertRecord) -> bool {
        match self {
            AlertTab::All => true,
            AlertTab::Alerts => alert.kind == AlertKind::Alert,
            AlertTab::Reporting => alert.kind == AlertKind::Report,
        }
    }
}

impl FromStr for AlertTab {
    type Err = PortalError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(AlertTab::All),
            "alerts" | "alert" => Ok(AlertTab::Alerts),
            "reporting" | "reports" => Ok(AlertTab::Reporting),
            other => Err(PortalError::InvalidInput(format!(
                "unknown alerts tab `{other}` (expected all, alerts or reporting)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    Accept,
    Reject,
}

impl FromStr for AlertDecision {
    type Err = PortalError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(AlertDecision::Accept),
            "reject" => Ok(AlertDecision::Reject),
            other => Err(PortalError::InvalidInput(format!(
                "unknown decision `{other}` (expected accept or reject)"
            ))),
        }
    }
}

/// Criteria for the license table. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseFilter {
    pub status: Option<LicenseStatus>,
    pub region: Option<String>,
    /// Expiry on or before this date.
    pub expiring_by: Option<NaiveDate>,
    /// Case-insensitive match on serial, owner or card id.
    pub search: Option<String>,
}

impl LicenseFilter {
    pub fn matches(&self, record: &LicenseRecord) -> bool {
        if self.status.is_some_and(|status| status != record.status) {
            return false;
        }
        if let Some(region) = &self.region {
            if !region.eq_ignore_ascii_case(&record.region) {
                return false;
            }
        }
        if self.expiring_by.is_some_and(|date| record.expiry > date) {
            return false;
        }
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                [&record.serial, &record.owner, &record.card_id]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseQuery {
    pub filter: LicenseFilter,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for LicenseQuery {
    fn default() -> Self {
        Self {
            filter: LicenseFilter::default(),
            page: 1,
            page_size: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.total.div_ceil(self.page_size).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_licensed: u64,
    pub expired: u64,
    pub pending_renewals: u64,
    pub illegal_guns: u64,
}

impl DashboardSummary {
    /// Headline cards as `(title, value)` pairs.
    pub fn cards(&self) -> [(&'static str, String); 4] {
        [
            ("Total Licensed Guns", format_count(self.total_licensed)),
            ("Expired Licenses", format_count(self.expired)),
            ("Pending Renewals", format_count(self.pending_renewals)),
            ("Illegal Guns", format_count(self.illegal_guns)),
        ]
    }
}

pub struct LicenseRegistry {
    licenses: Vec<LicenseRecord>,
    weapons: Vec<WeaponRecord>,
    alerts: Vec<AlertRecord>,
    summary: DashboardSummary,
}

fn date(day: u32, month: u32, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

#[allow(clippy::too_many_arguments)]
fn license(
    serial: &str,
    owner: &str,
    card_id: &str,
    expiry: NaiveDate,
    status: LicenseStatus,
    region: &str,
    license_type: &str,
    last_renewed: NaiveDate,
) -> LicenseRecord {
    LicenseRecord {
        serial: serial.into(),
        owner: owner.into(),
        card_id: card_id.into(),
        expiry,
        status,
        region: region.into(),
        license_type: license_type.into(),
        last_renewed,
    }
}

fn weapon(
    serial: &str,
    weapon_type: &str,
    model: &str,
    owner: &str,
    previous_status: &str,
    expiry: NaiveDate,
) -> WeaponRecord {
    WeaponRecord {
        serial: serial.into(),
        weapon_type: weapon_type.into(),
        model: model.into(),
        owner: owner.into(),
        previous_status: previous_status.into(),
        expiry,
    }
}

impl LicenseRegistry {
    pub fn seeded() -> Self {
        use LicenseStatus::*;

        #[rustfmt::skip]
        let licenses = vec![
            license("RUG1234567", "Leslie Akwasi Frimpong", "GHA-723456789-0", date(24, 8, 2026), Renewed, "Greater Accra", "Personal", date(24, 8, 2025)),
            license("RUG1234568", "Kwame Mensah", "GHA-123456789-1", date(12, 5, 2025), Expired, "Ashanti", "Commercial", date(12, 5, 2024)),
            license("RUG1234569", "Sarah Ofori", "GHA-987654321-2", date(30, 11, 2025), Pending, "Western", "Personal", date(30, 11, 2024)),
            license("RUG1234570", "John Doe", "GHA-456123789-3", date(15, 1, 2027), Renewed, "Greater Accra", "Security", date(15, 1, 2026)),
            license("RUG1234571", "Jane Smith", "GHA-789456123-4", date(1, 9, 2026), Renewed, "Central", "Personal", date(1, 9, 2025)),
        ];

        #[rustfmt::skip]
        let weapons = vec![
            weapon("RUG1234567", "Rifle, bolt-action", "Ruger American", "Samuel Levi", "N/A", date(20, 1, 2026)),
            weapon("RUG1234568", "Pistol, semi-automatic", "Ruger SR9", "Kwame Mensah", "Expired", date(12, 5, 2025)),
            weapon("RUG1234569", "Shotgun, pump-action", "Ruger Red Label", "Sarah Ofori", "Pending", date(30, 11, 2025)),
            weapon("RUG1234570", "Pistol, semi-automatic", "Ruger LCP", "John Doe", "Renewed", date(15, 1, 2027)),
            weapon("RUG1234571", "Revolver", "Ruger GP100", "Jane Smith", "Renewed", date(1, 9, 2026)),
        ];

        let alerts = [
            (1, AlertStatus::Pending),
            (2, AlertStatus::Accepted),
            (3, AlertStatus::Rejected),
            (4, AlertStatus::Pending),
        ]
        .into_iter()
        .map(|(id, status)| AlertRecord {
            id,
            user: "James Arthur".into(),
            action: "uploaded".into(),
            subject: "RUG1234567".into(),
            time: "15h".into(),
            status,
            kind: AlertKind::Alert,
        })
        .collect();

        Self {
            licenses,
            weapons,
            alerts,
            summary: DashboardSummary {
                total_licensed: 53_000,
                expired: 2_300,
                pending_renewals: 2_300,
                illegal_guns: 2_300,
            },
        }
    }

    pub fn dashboard_summary(&self) -> DashboardSummary {
        self.summary
    }

    pub fn list_licenses(&self, query: &LicenseQuery) -> Page<LicenseRecord> {
        let matching: Vec<&LicenseRecord> = self
            .licenses
            .iter()
            .filter(|record| query.filter.matches(record))
            .collect();
        let page = query.page.max(1);
        let page_size = query.page_size.max(1);
        let items = matching
            .iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .map(|record| (*record).clone())
            .collect();
        Page {
            items,
            page,
            page_size,
            total: matching.len(),
        }
    }

    pub fn license_details(&self, serial: &str) -> Result<&LicenseRecord> {
        self.licenses
            .iter()
            .find(|record| record.serial.eq_ignore_ascii_case(serial.trim()))
            .ok_or_else(|| PortalError::NotFound(format!("license `{}`", serial.trim())))
    }

    pub fn lookup_weapon(&self, serial: &str) -> Option<&WeaponRecord> {
        self.weapons
            .iter()
            .find(|record| record.serial.eq_ignore_ascii_case(serial.trim()))
    }

    pub fn alerts(&self, tab: AlertTab) -> Vec<&AlertRecord> {
        self.alerts.iter().filter(|alert| tab.includes(alert)).collect()
    }

    /// Accepts or rejects a pending alert.
    pub fn resolve_alert(&mut self, id: u32, decision: AlertDecision) -> Result<&AlertRecord> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|alert| alert.id == id)
            .ok_or_else(|| PortalError::NotFound(format!("alert #{id}")))?;
        if alert.status != AlertStatus::Pending {
            return Err(PortalError::InvalidInput(format!(
                "alert #{id} is already {}",
                alert.status.to_string().to_lowercase()
            )));
        }
        alert.status = match decision {
            AlertDecision::Accept => AlertStatus::Accepted,
            AlertDecision::Reject => AlertStatus::Rejected,
        };
        info!(alert = id, status = %alert.status, "alert resolved");
        Ok(alert)
    }
}

impl Default for LicenseRegistry {
    fn default() -> Self {
        Self::seeded()
    }
}
