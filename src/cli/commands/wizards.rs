use tracing::info;

use crate::auth::guard::Route;
use crate::backend::Backend;
use crate::cli::commands::CommandDefinition;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::forms::{
    no_gate, run_wizard, ConfirmationResponse, FormInteraction, FormResult, GateOutcome,
    TerminalInteraction,
};
use crate::cli::io;
use crate::flows::{DealerFlow, RenewalFlow, SerialCheck, SerialVerification};
use crate::registry::{format_date, WeaponRecord};
use crate::wizard::Wizard;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "renew",
            "Renew a firearm licence",
            "renew",
            cmd_renew,
        ),
        CommandDefinition::new(
            "register-dealer",
            "Register as a firearms dealer",
            "register-dealer",
            cmd_register_dealer,
        ),
    ]
}

fn cmd_renew(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.enter(Route::Renewal) {
        return Ok(());
    }
    run_renewal(context)
}

pub(crate) fn run_renewal(context: &mut ShellContext) -> CommandResult {
    context.require_prompt("renew")?;

    let backend: &dyn Backend = &*context.backend;
    let mut wizard = Wizard::new(RenewalFlow::new());
    let mut interaction = context.interaction();
    let mut verification = SerialVerification::new();

    let result = run_wizard(
        &mut wizard,
        backend,
        &mut interaction,
        |wizard: &mut Wizard<RenewalFlow>, interaction: &mut TerminalInteraction| {
            if wizard.index() != 0 || verification.confirmed(wizard.state()).is_some() {
                return Ok(GateOutcome::Proceed);
            }
            verify_serial(wizard, interaction, &mut verification, backend)
        },
    )?;

    match result {
        FormResult::Completed(receipt) => {
            info!(reference = %receipt.reference, "renewal finished");
            io::print_success(&receipt.message);
            io::print_info(format!("Reference: {}", receipt.reference));
        }
        FormResult::Cancelled => io::print_info("Renewal cancelled."),
    }
    Ok(())
}

fn verify_serial<I: FormInteraction>(
    wizard: &mut Wizard<RenewalFlow>,
    interaction: &mut I,
    verification: &mut SerialVerification,
    backend: &dyn Backend,
) -> Result<GateOutcome, CommandError> {
    match verification.verify(wizard, backend)? {
        SerialCheck::Invalid(_) => Ok(GateOutcome::Stay),
        SerialCheck::Unknown(serial) => {
            io::print_error(format!("No licensed weapon found for serial {serial}"));
            Ok(GateOutcome::Stay)
        }
        SerialCheck::Found(record) => {
            match interaction.confirm("Weapon details", &weapon_lines(&record)) {
                ConfirmationResponse::Confirm => Ok(GateOutcome::Proceed),
                ConfirmationResponse::Back => {
                    verification.reset();
                    Ok(GateOutcome::Stay)
                }
                ConfirmationResponse::Cancel => Ok(GateOutcome::Cancel),
            }
        }
    }
}

fn weapon_lines(record: &WeaponRecord) -> Vec<String> {
    [
        ("Serial Number", record.serial.clone()),
        ("Weapon Type", record.weapon_type.clone()),
        ("Model", record.model.clone()),
        ("Owner", record.owner.clone()),
        ("Previous License Status", record.previous_status.clone()),
        ("Expiry Date", format_date(record.expiry)),
    ]
    .into_iter()
    .map(|(label, value)| format!("  {label:<24} {value}"))
    .collect()
}

fn cmd_register_dealer(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.enter(Route::DealerRegistration) {
        return Ok(());
    }
    run_dealer_registration(context)
}

pub(crate) fn run_dealer_registration(context: &mut ShellContext) -> CommandResult {
    context.require_prompt("register-dealer")?;

    let mut wizard = Wizard::new(DealerFlow::new());
    let mut interaction = context.interaction();
    let result = run_wizard(&mut wizard, &*context.backend, &mut interaction, no_gate)?;

    match result {
        FormResult::Completed(receipt) => {
            info!(reference = %receipt.reference, "dealer registration finished");
            io::print_success(&receipt.message);
            io::print_info(format!("Reference: {}", receipt.reference));
        }
        FormResult::Cancelled => io::print_info("Dealer registration cancelled."),
    }
    Ok(())
}
