use crate::cli::output;
use crate::cli::registry::{CommandEntry, CommandRegistry};
use crate::cli::table::{Table, TableColumn};

/// Report filters accepted by every analytics command.
const FILTER_OPTIONS: &str =
    "--from YYYY-MM-DD  --to YYYY-MM-DD  --vendor <name>  --brand <name>  --category <name>  --json";

pub fn print_overview(registry: &CommandRegistry) {
    output::section("Available commands");
    let mut table = Table::new(vec![TableColumn::left("Command"), TableColumn::left("Description")]);
    for entry in registry.list() {
        table.push([entry.name, entry.description]);
    }
    output::info(table.render());
    output::info("");
    output::info(format!("Report filters: {FILTER_OPTIONS}"));
    output::info("Use `help <command>` for details.");
}

pub fn print_command(entry: &CommandEntry) {
    output::section(format!("Help: {}", entry.name));
    output::info(format!("  Description: {}", entry.description));
    output::info(format!("  Usage: {}", entry.usage));
}
