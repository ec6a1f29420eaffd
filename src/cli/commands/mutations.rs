//! Commands that change the open ledger. Each one persists on success.

use uuid::Uuid;

use consign_domain::{InstallmentAdvance, InstallmentFrequency, Ledger, PaymentMethod};
use consign_engine::{InstallmentService, PlanTerms, SettlementService};

use crate::cli::args::{instant_or, resolve_client, resolve_item, resolve_vendor, ParsedArgs};
use crate::cli::commands::emit;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "pay",
            "Record a client payment for an item",
            "pay <item> --client <name> --amount <value> [--method cash|card|transfer|check|other] [--date YYYY-MM-DD]",
            cmd_pay,
        ),
        CommandEntry::new(
            "payout",
            "Record a payout to the item's vendor",
            "payout <item> --amount <value> [--vendor <name>] [--date YYYY-MM-DD]",
            cmd_payout,
        ),
        CommandEntry::new(
            "plan",
            "Create an installment plan for an unsold item",
            "plan <item> --client <name> --total <value> --installment <value> --frequency weekly|biweekly|monthly|quarterly --first-due YYYY-MM-DD",
            cmd_plan,
        ),
        CommandEntry::new(
            "remind",
            "Mark the reminder for an installment plan as sent",
            "remind <plan-id>",
            cmd_remind,
        ),
        CommandEntry::new(
            "return",
            "Return an unsold item to its vendor",
            "return <item>",
            cmd_return,
        ),
    ]
}

fn cmd_pay(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let item_id = resolve_item(ledger, parsed.require_positional(0, "item")?)?;
    let client_id = resolve_client(ledger, parsed.require("client")?)?;
    let amount = parsed.amount("amount")?;
    let method = parsed
        .parse_value::<PaymentMethod>("method")?
        .unwrap_or(PaymentMethod::Cash);
    let paid_at = instant_or(&parsed, context.clock.now())?;

    let receipt = SettlementService::record_client_payment(
        context.ledger_mut()?,
        item_id,
        client_id,
        amount,
        method,
        paid_at,
    )?;
    context.persist()?;
    let fmt = context.formatter();

    emit(context, &parsed, &receipt, || {
        output::success(format!(
            "Payment of {} recorded; item is {} with {} paid.",
            fmt.money(amount),
            receipt.item_status,
            fmt.money(receipt.total_paid)
        ));
        match receipt.installment {
            Some(InstallmentAdvance::Completed) => output::info("Installment plan completed."),
            Some(InstallmentAdvance::Advanced { next_due }) => {
                output::info(format!("Next installment due {next_due}."))
            }
            None => {}
        }
    })
}

fn cmd_payout(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let item_id = resolve_item(ledger, parsed.require_positional(0, "item")?)?;
    let vendor_id = match parsed.value("vendor") {
        Some(token) => resolve_vendor(ledger, token)?,
        None => consigning_vendor(ledger, item_id)?,
    };
    let amount = parsed.amount("amount")?;
    let paid_at = instant_or(&parsed, context.clock.now())?;

    let settlement = SettlementService::record_vendor_payout(
        context.ledger_mut()?,
        item_id,
        vendor_id,
        amount,
        paid_at,
    )?;
    context.persist()?;
    let fmt = context.formatter();

    emit(context, &parsed, &settlement, || {
        output::success(format!(
            "Payout of {} recorded for {}.",
            fmt.money(amount),
            settlement.title
        ));
        if settlement.is_fully_paid {
            output::info("Vendor is fully settled for this item.");
        } else {
            output::info(format!(
                "Remaining balance: {}",
                fmt.money(settlement.remaining_balance)
            ));
        }
    })
}

fn consigning_vendor(ledger: &Ledger, item_id: Uuid) -> Result<Uuid, CommandError> {
    ledger
        .item(item_id)
        .map(|item| item.vendor_id)
        .ok_or_else(|| CommandError::InvalidArguments(format!("unknown item {item_id}")))
}

fn cmd_plan(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let terms = PlanTerms {
        item_id: resolve_item(ledger, parsed.require_positional(0, "item")?)?,
        client_id: resolve_client(ledger, parsed.require("client")?)?,
        total_amount: parsed.amount("total")?,
        installment_amount: parsed.amount("installment")?,
        frequency: parsed
            .parse_value::<InstallmentFrequency>("frequency")?
            .unwrap_or(InstallmentFrequency::Monthly),
        first_due_date: parsed
            .date("first-due")?
            .ok_or_else(|| CommandError::InvalidArguments("missing `--first-due` option".into()))?,
    };
    let created_at = context.clock.now();

    let plan_id = InstallmentService::create_plan(context.ledger_mut()?, terms, created_at)?;
    context.persist()?;

    emit(context, &parsed, &plan_id, || {
        output::success(format!("Installment plan {plan_id} created."));
    })
}

fn cmd_remind(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let plan_id = resolve_plan(context.ledger()?, parsed.require_positional(0, "plan-id")?)?;

    InstallmentService::mark_reminder_sent(context.ledger_mut()?, plan_id)?;
    context.persist()?;
    output::success(format!("Reminder for plan {plan_id} marked as sent."));
    Ok(())
}

/// Full plan id or a unique prefix of it, as printed by `installments`.
fn resolve_plan(ledger: &Ledger, token: &str) -> Result<Uuid, CommandError> {
    let token = token.to_ascii_lowercase();
    let matches: Vec<Uuid> = ledger
        .installment_plans
        .iter()
        .map(|plan| plan.id)
        .filter(|id| id.to_string().starts_with(&token))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CommandError::InvalidArguments(format!("no installment plan `{token}`"))),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{token}` matches {} plans; give more of the id",
            matches.len()
        ))),
    }
}

fn cmd_return(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let item_id = resolve_item(context.ledger()?, parsed.require_positional(0, "item")?)?;

    SettlementService::mark_returned(context.ledger_mut()?, item_id)?;
    context.persist()?;
    output::success("Item returned to its vendor.");
    Ok(())
}
