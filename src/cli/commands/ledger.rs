use consign_engine::LedgerStorage;

use crate::cli::args::ParsedArgs;
use crate::cli::commands::emit;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "open",
            "Open a stored ledger by name or a ledger file by path",
            "open <name|path>",
            cmd_open,
        ),
        CommandEntry::new(
            "ledgers",
            "List stored ledgers",
            "ledgers [--json]",
            cmd_ledgers,
        ),
        CommandEntry::new(
            "backup",
            "Snapshot the open ledger",
            "backup [note]",
            cmd_backup,
        ),
        CommandEntry::new(
            "backups",
            "List backups of the open ledger, newest first",
            "backups [--json]",
            cmd_backups,
        ),
        CommandEntry::new(
            "restore",
            "Replace the open ledger with one of its backups",
            "restore <backup-file>",
            cmd_restore,
        ),
    ]
}

fn cmd_open(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let target = parsed.require_positional(0, "name|path")?;
    let ledger = context.open_ledger(target)?;
    output::success(format!(
        "Opened `{}`: {} item(s), {} payment(s).",
        ledger.name,
        ledger.items.len(),
        ledger.client_payments.len()
    ));
    Ok(())
}

fn cmd_ledgers(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let entries = context.storage.list_ledger_metadata()?;
    let fmt = context.formatter();

    emit(context, &parsed, &entries, || {
        if entries.is_empty() {
            output::info(format!(
                "No ledgers in {}.",
                context.storage.paths().ledger_root.display()
            ));
            return;
        }
        let mut table = Table::new(vec![
            TableColumn::left("Name"),
            TableColumn::right("Items"),
            TableColumn::right("Unsold"),
            TableColumn::right("Received"),
            TableColumn::right("Paid out"),
            TableColumn::left("Updated"),
        ]);
        for entry in &entries {
            table.push([
                entry.slug.clone(),
                entry.item_count.to_string(),
                entry.unsold_count.to_string(),
                fmt.amount(entry.total_received),
                fmt.amount(entry.total_paid_out),
                entry.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            ]);
        }
        output::info(table.render());
    })
}

/// Backups only exist for ledgers opened by name.
fn stored_name(context: &ShellContext) -> Result<String, CommandError> {
    context.ledger_name.clone().ok_or_else(|| {
        CommandError::Message("backups need a ledger opened by name, not by path".into())
    })
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    context.ensure_ledger()?;
    let name = stored_name(context)?;
    let info = context
        .storage
        .backup_ledger(&name, context.ledger()?, note.as_deref())?;
    output::success(format!("Backup written: {}", info.id));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let name = stored_name(context)?;
    let backups = context.storage.list_backup_metadata(&name)?;

    emit(context, &parsed, &backups, || {
        if backups.is_empty() {
            output::info(format!("No backups for `{name}`."));
            return;
        }
        let mut table = Table::new(vec![
            TableColumn::left("Backup"),
            TableColumn::left("Created"),
            TableColumn::right("Bytes"),
        ]);
        for backup in &backups {
            table.push([
                backup.name.clone(),
                backup
                    .created_at
                    .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".into()),
                backup.size_bytes.to_string(),
            ]);
        }
        output::info(table.render());
    })
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let backup_id = parsed.require_positional(0, "backup-file")?;
    context.ensure_ledger()?;
    let name = stored_name(context)?;
    let backup = context
        .storage
        .list_backups(&name)?
        .into_iter()
        .find(|entry| entry.id == backup_id)
        .ok_or_else(|| CommandError::InvalidArguments(format!("no backup `{backup_id}`")))?;
    let restored = context.storage.restore_backup(&backup)?;
    output::success(format!(
        "Restored `{}` from {} ({} item(s)).",
        restored.name,
        backup.id,
        restored.items.len()
    ));
    context.ledger = Some(restored);
    Ok(())
}
