//! Admin pages: dashboard, license table and alerts.

use crate::auth::guard::Route;
use crate::cli::commands::{split_flags, CommandDefinition};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::ui::table::{Table, TableColumn};
use crate::registry::{
    format_date, parse_date, AlertDecision, AlertRecord, AlertStatus, AlertTab, LicenseFilter,
    LicenseQuery, LicenseRecord, Page,
};

/// Options understood by `licenses`.
pub(crate) const LICENSE_FLAGS: [&str; 5] = ["--status", "--region", "--before", "--search", "--page"];
pub(crate) const ALERT_TABS: [&str; 3] = ["all", "alerts", "reporting"];
pub(crate) const ALERT_DECISIONS: [&str; 2] = ["accept", "reject"];

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "dashboard",
            "Show headline figures and recent licenses",
            "dashboard",
            cmd_dashboard,
        ),
        CommandDefinition::new(
            "licenses",
            "List licenses with optional filters",
            "licenses [--status <Renewed|Expired|Pending>] [--region <name>] [--before <DD/MM/YYYY>] [--search <text>] [--page <n>]",
            cmd_licenses,
        ),
        CommandDefinition::new(
            "license",
            "Show details for one license",
            "license <serial>",
            cmd_license,
        ),
        CommandDefinition::new(
            "alerts",
            "List alerts and reports",
            "alerts [all|alerts|reporting]",
            cmd_alerts,
        ),
        CommandDefinition::new(
            "alert",
            "Accept or reject a pending alert",
            "alert <accept|reject> <id>",
            cmd_alert,
        ),
    ]
}

fn cmd_dashboard(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.enter(Route::Dashboard) {
        return Ok(());
    }
    show_dashboard(context)
}

pub(crate) fn show_dashboard(context: &mut ShellContext) -> CommandResult {
    let summary = context.backend.dashboard_summary()?;
    output_section("Dashboard");
    let mut cards = Table::new(vec![TableColumn::left("Card"), TableColumn::right("Value")]);
    for (title, value) in summary.cards() {
        cards.push_row(vec![title.to_string(), value]);
    }
    println!("{}", cards.render());

    let query = LicenseQuery {
        page_size: context.config.page_size,
        ..LicenseQuery::default()
    };
    let page = context.backend.list_licenses(&query)?;
    output_section("Recent licenses");
    print_license_page(&page);
    Ok(())
}

fn cmd_licenses(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !context.enter(Route::Licenses) {
        return Ok(());
    }
    show_licenses(context, args)
}

pub(crate) fn show_licenses(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let query = parse_license_query(args, context.config.page_size)?;
    let page = context.backend.list_licenses(&query)?;
    output_section("Licenses");
    print_license_page(&page);
    Ok(())
}

fn parse_license_query(args: &[&str], page_size: usize) -> Result<LicenseQuery, CommandError> {
    let (positional, flags) = split_flags(args)?;
    if let Some(extra) = positional.first() {
        return Err(CommandError::InvalidArguments(format!(
            "unexpected argument `{extra}`"
        )));
    }
    let mut filter = LicenseFilter::default();
    let mut page = 1;
    for (name, value) in flags {
        match name {
            "status" => filter.status = Some(value.parse()?),
            "region" => filter.region = Some(value.to_string()),
            "before" => filter.expiring_by = Some(parse_date(value)?),
            "search" => filter.search = Some(value.to_string()),
            "page" => {
                page = value
                    .parse::<usize>()
                    .ok()
                    .filter(|page| *page > 0)
                    .ok_or_else(|| {
                        CommandError::InvalidArguments(format!("invalid page `{value}`"))
                    })?;
            }
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `--{other}`"
                )))
            }
        }
    }
    Ok(LicenseQuery {
        filter,
        page,
        page_size,
    })
}

fn print_license_page(page: &Page<LicenseRecord>) {
    if page.items.is_empty() {
        io::print_info("No licenses match the current filters.");
        return;
    }
    let mut table = Table::new(vec![
        TableColumn::left("Serial Number"),
        TableColumn::left("Owner").max_width(24),
        TableColumn::left("Ghana Card"),
        TableColumn::left("Expiry"),
        TableColumn::left("Status"),
        TableColumn::left("Region"),
    ]);
    for record in &page.items {
        table.push_row(vec![
            record.serial.clone(),
            record.owner.clone(),
            record.card_id.clone(),
            format_date(record.expiry),
            record.status.to_string(),
            record.region.clone(),
        ]);
    }
    println!("{}", table.render());
    io::print_info(format!(
        "Page {} of {} ({} licenses)",
        page.page,
        page.total_pages(),
        page.total
    ));
}

fn cmd_license(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(serial) = args.first() else {
        return Err(CommandError::InvalidArguments("usage: license <serial>".into()));
    };
    if !context.enter(Route::Licenses) {
        return Ok(());
    }
    let record = context.backend.license_details(serial)?;
    output_section(format!("License {}", record.serial));
    let rows = [
        ("Serial Number", record.serial.clone()),
        ("Owner", record.owner.clone()),
        ("Ghana Card", record.card_id.clone()),
        ("Expiry Date", format_date(record.expiry)),
        ("Status", record.status.to_string()),
        ("Region", record.region.clone()),
        ("License Type", record.license_type.clone()),
        ("Last Renewed", format_date(record.last_renewed)),
    ];
    for (label, value) in rows {
        io::print_info(format!("  {label:<14} {value}"));
    }
    Ok(())
}

fn cmd_alerts(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !context.enter(Route::Alerts) {
        return Ok(());
    }
    show_alerts(context, args)
}

pub(crate) fn show_alerts(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let tab: AlertTab = match args.first() {
        Some(tab) => tab.parse()?,
        None => AlertTab::All,
    };
    let alerts = context.backend.alerts(tab)?;
    output_section("Alerts");
    if alerts.is_empty() {
        io::print_info("Nothing to review.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::right("#"),
        TableColumn::left("Alert"),
        TableColumn::left("Time"),
        TableColumn::left("Status"),
    ]);
    for alert in &alerts {
        table.push_row(vec![
            alert.id.to_string(),
            alert.summary(),
            alert.time.clone(),
            alert.status.to_string(),
        ]);
    }
    println!("{}", table.render());
    if alerts.iter().any(|alert| alert.status == AlertStatus::Pending) {
        io::print_hint("Use `alert accept <id>` or `alert reject <id>` on pending alerts.");
    }
    Ok(())
}

fn cmd_alert(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [decision, id] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: alert <accept|reject> <id>".into(),
        ));
    };
    let decision: AlertDecision = decision.parse()?;
    let id: u32 = id
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid alert id `{id}`")))?;
    if !context.enter(Route::Alerts) {
        return Ok(());
    }
    let alert = context.backend.resolve_alert(id, decision)?;
    io::print_success(describe_resolution(&alert));
    Ok(())
}

fn describe_resolution(alert: &AlertRecord) -> String {
    format!(
        "Alert #{} ({}) {}",
        alert.id,
        alert.summary(),
        alert.status.to_string().to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::LicenseStatus;

    #[test]
    fn license_flags_build_a_query() {
        let query = parse_license_query(
            &["--status", "expired", "--region", "Ashanti", "--page", "2"],
            5,
        )
        .unwrap();
        assert_eq!(query.filter.status, Some(LicenseStatus::Expired));
        assert_eq!(query.filter.region.as_deref(), Some("Ashanti"));
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 5);
    }

    #[test]
    fn license_flags_reject_bad_values() {
        assert!(parse_license_query(&["--page", "0"], 10).is_err());
        assert!(parse_license_query(&["--before", "2026-01-01"], 10).is_err());
        assert!(parse_license_query(&["--colour", "red"], 10).is_err());
        assert!(parse_license_query(&["stray"], 10).is_err());
    }
}
