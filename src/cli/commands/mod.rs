pub mod config;
pub mod ledger;
pub mod mutations;
pub mod reports;
pub mod system;

use serde::Serialize;

use crate::cli::args::ParsedArgs;
use crate::cli::context::{CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::{CommandEntry, CommandRegistry};

const ROOT_COMMAND_ORDER: &[&str] = &[
    "open",
    "ledgers",
    "kpi",
    "trend",
    "breakdown",
    "items",
    "inventory",
    "health",
    "settlement",
    "payouts",
    "installments",
    "pay",
    "payout",
    "plan",
    "remind",
    "return",
    "backup",
    "backups",
    "restore",
    "config",
    "script",
    "help",
    "version",
    "exit",
];

pub(crate) fn all_entries() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(ledger::definitions());
    commands.extend(reports::definitions());
    commands.extend(mutations::definitions());
    commands.extend(config::definitions());
    commands.extend(system::definitions());
    commands
}

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let mut entries = all_entries();
    entries.sort_by_key(|entry| {
        ROOT_COMMAND_ORDER
            .iter()
            .position(|name| entry.name.eq_ignore_ascii_case(name))
            .unwrap_or(ROOT_COMMAND_ORDER.len())
    });
    for entry in entries {
        registry.register(entry);
    }
}

/// Prints `value` as JSON when requested, otherwise runs `render`.
pub(crate) fn emit<T: Serialize + ?Sized>(
    context: &ShellContext,
    parsed: &ParsedArgs,
    value: &T,
    render: impl FnOnce(),
) -> CommandResult {
    if context.json || parsed.flag("json") {
        output::json(value)
    } else {
        render();
        Ok(())
    }
}
