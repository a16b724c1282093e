mod common;

use common::PortalHarness;
use predicates::prelude::*;
use predicates::str::contains;
use regex::Regex;

const ADMIN_LOGIN: &str = "login admin@police.gov.gh password123\n";

#[test]
fn admin_login_lands_on_dashboard() {
    let harness = PortalHarness::new();
    harness
        .command()
        .write_stdin(format!("{ADMIN_LOGIN}dashboard\nexit\n"))
        .assert()
        .success()
        .stdout(contains("[ok] Logged in successfully"))
        .stdout(contains("You are on /dashboard."))
        .stdout(contains("Total Licensed Guns"))
        .stdout(contains("53,000"))
        .stdout(contains("Leslie Akwasi Frimpong"));
}

#[test]
fn bad_credentials_are_rejected() {
    let harness = PortalHarness::new();
    let output = harness.run_script(
        "login admin@police.gov.gh password124\n\
         login not-an-email password123\n\
         login admin@police.gov.gh short\n\
         whoami\n",
    );
    assert!(output.stdout.contains("[x] Invalid credentials"), "{}", output.stdout);
    assert!(
        output.stdout.contains("Please enter a valid email address"),
        "{}",
        output.stdout
    );
    assert!(
        output.stdout.contains("Password must be at least 8 characters"),
        "{}",
        output.stdout
    );
    assert!(output.stdout.contains("Not signed in."), "{}", output.stdout);
}

#[test]
fn guests_are_redirected_to_login() {
    let harness = PortalHarness::new();
    harness
        .command()
        .write_stdin("dashboard\nopen /\n")
        .assert()
        .success()
        .stdout(contains("Access to /dashboard denied. Redirected to /login."))
        .stdout(contains("Access to / denied. Redirected to /login."))
        .stdout(contains("Total Licensed Guns").not());
}

#[test]
fn dealers_cannot_open_admin_pages() {
    let harness = PortalHarness::new();
    let output = harness.run_script("login dealer@guns.com password123\nalerts\nwhoami\n");
    assert!(
        output
            .stdout
            .contains("Access to /alerts denied. Redirected to /dealer-registration."),
        "{}",
        output.stdout
    );
    assert!(output.stdout.contains("Role : GUN_DEALER"), "{}", output.stdout);
    assert!(!output.stdout.contains("James Arthur"), "{}", output.stdout);
}

#[test]
fn logout_returns_to_login() {
    let harness = PortalHarness::new();
    let output = harness.run_script(&format!("{ADMIN_LOGIN}logout\ndashboard\n"));
    assert!(output.stdout.contains("[ok] Logged out"), "{}", output.stdout);
    assert!(
        output.stdout.contains("Redirected to /login."),
        "{}",
        output.stdout
    );
}

#[test]
fn license_filters_narrow_the_table() {
    let harness = PortalHarness::new();
    let output = harness.run_script(&format!(
        "{ADMIN_LOGIN}licenses --status Expired\nlicenses --region \"Greater Accra\" --search doe\n"
    ));
    assert!(output.stdout.contains("Kwame Mensah"), "{}", output.stdout);
    assert!(output.stdout.contains("John Doe"), "{}", output.stdout);
    assert!(!output.stdout.contains("Sarah Ofori"), "{}", output.stdout);
    assert!(
        output.stdout.contains("Page 1 of 1 (1 licenses)"),
        "{}",
        output.stdout
    );
}

#[test]
fn license_details_and_missing_serial() {
    let harness = PortalHarness::new();
    let output = harness.run_script(&format!(
        "{ADMIN_LOGIN}license RUG1234569\nlicense NOPE\n"
    ));
    assert!(output.stdout.contains("License Type   Personal"), "{}", output.stdout);
    assert!(output.stdout.contains("Last Renewed   30/11/2024"), "{}", output.stdout);
    assert!(
        output.stdout.contains("Not found: license `NOPE`"),
        "{}",
        output.stdout
    );
}

#[test]
fn page_size_setting_paginates_licenses() {
    let harness = PortalHarness::new();
    harness.run_script("config set page_size 2\n");
    assert!(harness.home().join("config.json").exists());

    let output = harness.run_script(&format!("{ADMIN_LOGIN}licenses --page 3\n"));
    assert!(
        output.stdout.contains("Page 3 of 3 (5 licenses)"),
        "{}",
        output.stdout
    );
    assert!(output.stdout.contains("Jane Smith"), "{}", output.stdout);
}

#[test]
fn huge_page_number_shows_empty_table() {
    let harness = PortalHarness::new();
    let output = harness.run_script(&format!(
        "{ADMIN_LOGIN}licenses --page 18446744073709551615\nwhoami\n"
    ));
    assert!(
        output.stdout.contains("No licenses match the current filters."),
        "{}",
        output.stdout
    );
    assert!(output.stdout.contains("Role : ADMIN"), "{}", output.stdout);
}

#[test]
fn out_of_range_config_file_is_reported() {
    let harness = PortalHarness::new();
    std::fs::write(
        harness.home().join("config.json"),
        r#"{ "delay_scale": 1e300 }"#,
    )
    .unwrap();
    harness
        .command()
        .write_stdin(ADMIN_LOGIN)
        .assert()
        .failure()
        .stderr(contains("not a valid value for delay_scale"));
}

#[test]
fn alerts_can_be_resolved_once() {
    let harness = PortalHarness::new();
    let output = harness.run_script(&format!(
        "{ADMIN_LOGIN}alerts\nalert accept 1\nalert reject 1\nalert accept 9\nalerts reporting\n"
    ));
    assert!(output.stdout.contains("James Arthur uploaded RUG1234567"), "{}", output.stdout);
    assert!(
        output
            .stdout
            .contains("[ok] Alert #1 (James Arthur uploaded RUG1234567) accepted"),
        "{}",
        output.stdout
    );
    assert!(output.stdout.contains("alert #1 is already accepted"), "{}", output.stdout);
    assert!(output.stdout.contains("Not found: alert #9"), "{}", output.stdout);
    assert!(output.stdout.contains("Nothing to review."), "{}", output.stdout);
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let harness = PortalHarness::new();
    harness
        .command()
        .write_stdin("dashbord\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `dashbord`"))
        .stdout(contains("Suggestion: `dashboard`?"));
}

#[test]
fn wizards_need_a_terminal_or_scripted_inputs() {
    let harness = PortalHarness::new();
    let output = harness.run_script("login user@renewal.com password123\nrenew\n");
    assert!(
        output.stdout.contains("`renew` needs an interactive terminal"),
        "{}",
        output.stdout
    );
}

#[test]
fn renewal_with_mobile_money_succeeds() {
    let harness = PortalHarness::new();
    let output = harness.run_with_inputs(
        "login user@renewal.com password123\nrenew\n",
        &[
            "RUG1234567",
            "yes",
            "GHA-723456789-0",
            "Samuel Levi",
            "20/01/2026",
            "<BLANK>",
            "<BLANK>",
            "East Legon, Accra",
            "Greater Accra",
            "Mobile Money",
            "MTN",
            "0241234567",
            "yes",
        ],
    );
    assert!(output.stdout.contains("Ruger American"), "{}", output.stdout);
    assert!(output.stdout.contains("Amount: GHS 2,300"), "{}", output.stdout);
    assert!(output.stdout.contains("[ok] Payment Successful!"), "{}", output.stdout);
    let reference = Regex::new(r"Reference: REN-[0-9A-F]{8}\b").unwrap();
    assert!(reference.is_match(&output.stdout), "{}", output.stdout);
}

#[test]
fn unknown_serial_keeps_renewal_on_first_step() {
    let harness = PortalHarness::new();
    let output = harness.run_with_inputs(
        "login user@renewal.com password123\nrenew\n",
        &["<BLANK>", "XYZ0000000", "<CANCEL>"],
    );
    assert!(output.stdout.contains("Serial Number is required"), "{}", output.stdout);
    assert!(
        output
            .stdout
            .contains("No licensed weapon found for serial XYZ0000000"),
        "{}",
        output.stdout
    );
    assert!(output.stdout.contains("Renewal cancelled."), "{}", output.stdout);
    assert!(!output.stdout.contains("Identity Verification"), "{}", output.stdout);
}

#[test]
fn dealer_registration_reprompts_invalid_card() {
    let harness = PortalHarness::new();
    let output = harness.run_with_inputs(
        "login dealer@guns.com password123\nregister-dealer\n",
        &[
            "Accra Arms Ltd",
            "C0001234567",
            "Spintex Road",
            "GHA-12",
            "GHA-123456789-0",
            "certificate.pdf",
            "permit.pdf",
            "yes",
            "yes",
            "yes",
            "yes",
            "yes",
            "sell",
            "yes",
        ],
    );
    assert!(
        output
            .stdout
            .contains("Invalid Ghana Card format (e.g., GHA-123456789-0)"),
        "{}",
        output.stdout
    );
    assert!(!output.stdout.contains("Import Fees"), "{}", output.stdout);
    assert!(output.stdout.contains("[ok] Application Submitted!"), "{}", output.stdout);
    assert!(output.stdout.contains("Reference: DLR-"), "{}", output.stdout);
}

#[test]
fn sign_up_returns_to_login() {
    let harness = PortalHarness::new();
    let output = harness.run_with_inputs(
        "signup\nwhoami\n",
        &[
            "Ama Serwaa",
            "ama@example.com",
            "password123",
            "password123",
            "yes",
        ],
    );
    assert!(output.stdout.contains("Account request received (ref SUP-"), "{}", output.stdout);
    assert!(output.stdout.contains("Not signed in."), "{}", output.stdout);
}

#[test]
fn version_reports_package_version() {
    let harness = PortalHarness::new();
    harness
        .command()
        .write_stdin("version\n")
        .assert()
        .success()
        .stdout(contains(format!("License Portal {}", env!("CARGO_PKG_VERSION"))));
}
