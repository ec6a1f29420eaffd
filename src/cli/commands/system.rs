use std::fs;

use consign_domain::CURRENT_SCHEMA_VERSION;

use crate::cli::args::ParsedArgs;
use crate::cli::commands::emit;
use crate::cli::context::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::cli::{help, output, shell};
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "script",
            "Run commands from a file, one per line",
            "script <file>",
            cmd_script,
        ),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new("version", "Show build metadata", "version [--json]", cmd_version),
        CommandEntry::new("exit", "Stop reading commands", "exit", cmd_exit),
    ]
}

fn cmd_script(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let path = parsed.require_positional(0, "file")?;
    let source = fs::read_to_string(path)?;
    let previous = context.mode;
    context.mode = CliMode::Script;
    let failures = shell::run_lines(context, source.lines());
    context.mode = previous;
    if failures > 0 {
        return Err(CommandError::Message(format!(
            "{failures} command(s) in `{path}` failed"
        )));
    }
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.command(&name.to_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        }
        return Ok(());
    }
    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_version(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let meta = build_info::current();

    emit(context, &parsed, &meta, || {
        output::section(format!("Consign Core {}", meta.version));
        let mut table = Table::new(vec![TableColumn::left("Field"), TableColumn::left("Value")]);
        let rows = [
            ("CLI version", build_info::CLI_VERSION.to_string()),
            ("Schema ver", format!("v{CURRENT_SCHEMA_VERSION}")),
            ("Build hash", format!("{} ({})", meta.git_hash, meta.git_status)),
            ("Built at", meta.timestamp.to_string()),
            ("Target", meta.target.to_string()),
            ("Profile", meta.profile.to_string()),
            ("Rustc", meta.rustc.to_string()),
        ];
        for (label, value) in rows {
            table.push([label.to_string(), value]);
        }
        output::info(table.render());
    })
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
