//! Entry points: a one-shot command from the process arguments, or a script
//! of commands read from stdin.

use std::{
    env,
    io::{self, BufRead},
};

use tracing::debug;

use crate::cli::context::{CliMode, LoopControl, ShellContext};
use crate::errors::CliError;

/// Forces script mode even when arguments are present.
pub const SCRIPT_ENV: &str = "CONSIGN_CORE_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut context = ShellContext::new(CliMode::OneShot)?;
    let command = apply_global_options(&mut context, &args)?;

    if command.is_empty() || env::var_os(SCRIPT_ENV).is_some() {
        context.mode = CliMode::Script;
        return run_script(&mut context);
    }
    run_one_shot(&mut context, command)
}

/// Consumes leading `--ledger <name|path>` and `--json`; returns the rest.
fn apply_global_options<'a>(
    context: &mut ShellContext,
    args: &'a [String],
) -> Result<&'a [String], CliError> {
    let mut rest = args;
    loop {
        match rest {
            [flag, tail @ ..] if flag == "--json" => {
                context.json = true;
                rest = tail;
            }
            [flag, target, tail @ ..] if flag == "--ledger" => {
                context
                    .open_ledger(target)
                    .map_err(|err| CliError::Command(err.to_string()))?;
                rest = tail;
            }
            [flag] if flag == "--ledger" => {
                return Err(CliError::Input("`--ledger` needs a name or path".into()));
            }
            _ => return Ok(rest),
        }
    }
}

fn run_one_shot(context: &mut ShellContext, tokens: &[String]) -> Result<(), CliError> {
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(());
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    match context.dispatch(&raw.to_lowercase(), raw, &args) {
        Ok(_) => Ok(()),
        Err(err) => {
            context.report_error(&err);
            Err(CliError::Command(format!("`{raw}` did not complete")))
        }
    }
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    let lines = stdin.lock().lines().collect::<Result<Vec<_>, _>>()?;
    let failures = run_lines(context, lines);
    debug!(failures, "script finished");
    Ok(())
}

/// Runs each line as a command; blank lines and `#` comments are skipped.
/// Returns the number of lines that failed.
pub(crate) fn run_lines<I, S>(context: &mut ShellContext, lines: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut failures = 0;
    for line in lines {
        if !context.running {
            break;
        }
        let line = line.as_ref().trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens = match parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                crate::cli::output::warning(format!("Could not parse `{line}`: {err}"));
                failures += 1;
                continue;
            }
        };
        let Some((raw, rest)) = tokens.split_first() else {
            continue;
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        match context.dispatch(&raw.to_lowercase(), raw, &args) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => context.running = false,
            Err(err) => {
                context.report_error(&err);
                failures += 1;
            }
        }
    }
    failures
}

pub(crate) fn parse_command_line(line: &str) -> Result<Vec<String>, shell_words::ParseError> {
    shell_words::split(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenises_quoted_arguments() {
        let tokens = parse_command_line(r#"pay "Classic Flap" --client 'Carla M' --amount 10"#)
            .unwrap();
        assert_eq!(
            tokens,
            ["pay", "Classic Flap", "--client", "Carla M", "--amount", "10"]
        );
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        assert!(parse_command_line("pay \"Birkin --amount 5").is_err());
    }
}
