use std::{fmt::Display, str::FromStr};

use consign_config::{Config, PayoutReadiness, WeekStart};

use crate::cli::args::ParsedArgs;
use crate::cli::commands::emit;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const USAGE: &str = "config [show|set <key> <value>|backup [note]|backups|restore <name>]";

const KEYS: &[&str] = &[
    "locale",
    "currency",
    "currency_precision",
    "ui_color_enabled",
    "week_start",
    "dense_series",
    "slow_mover_days",
    "fast_mover_days",
    "upcoming_window_days",
    "cash_flow_window_days",
    "payout_readiness",
];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and manage global preferences",
        USAGE,
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return show(context, &ParsedArgs::default());
    };
    match action.to_lowercase().as_str() {
        "show" => show(context, &ParsedArgs::parse(rest)?),
        "set" => {
            let [key, value @ ..] = rest else {
                return Err(usage_error());
            };
            if value.is_empty() {
                return Err(usage_error());
            }
            let value = value.join(" ");
            apply_setting(&mut context.config, key, value.trim())?;
            context.config_manager.save(&context.config)?;
            output::set_color_enabled(context.config.ui_color_enabled);
            output::success(format!("Set `{key}` to `{}`.", value.trim()));
            Ok(())
        }
        "backup" => {
            let note = (!rest.is_empty()).then(|| rest.join(" "));
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            output::success(format!("Configuration backup written: {name}"));
            Ok(())
        }
        "backups" => {
            let parsed = ParsedArgs::parse(rest)?;
            let names = context.config_manager.list_backups()?;
            emit(context, &parsed, &names, || {
                if names.is_empty() {
                    output::info("No configuration backups.");
                    return;
                }
                for name in &names {
                    output::info(name);
                }
            })
        }
        "restore" => {
            let name = rest.first().ok_or_else(usage_error)?;
            let restored = context.config_manager.restore(name)?;
            context.config_manager.save(&restored)?;
            output::set_color_enabled(restored.ui_color_enabled);
            context.config = restored;
            output::success(format!("Configuration restored from {name}."));
            Ok(())
        }
        _ => Err(usage_error()),
    }
}

fn usage_error() -> CommandError {
    CommandError::InvalidArguments(format!("usage: {USAGE}"))
}

fn show(context: &ShellContext, parsed: &ParsedArgs) -> CommandResult {
    let config = &context.config;
    emit(context, parsed, config, || {
        output::section("Configuration");
        let analytics = &config.analytics;
        let mut table = Table::new(vec![TableColumn::left("Key"), TableColumn::left("Value")]);
        let rows = [
            ("locale", config.locale.clone()),
            ("currency", config.currency.clone()),
            ("currency_precision", config.currency_precision.to_string()),
            ("ui_color_enabled", config.ui_color_enabled.to_string()),
            (
                "last_opened_ledger",
                config.last_opened_ledger.clone().unwrap_or_else(|| "-".into()),
            ),
            ("week_start", analytics.week_start.to_string()),
            ("dense_series", analytics.dense_series.to_string()),
            ("slow_mover_days", analytics.slow_mover_days.to_string()),
            ("fast_mover_days", analytics.fast_mover_days.to_string()),
            ("upcoming_window_days", analytics.upcoming_window_days.to_string()),
            ("cash_flow_window_days", analytics.cash_flow_window_days.to_string()),
            ("payout_readiness", analytics.payout_readiness.to_string()),
        ];
        for (key, value) in rows {
            table.push([key.to_string(), value]);
        }
        output::info(table.render());
        output::info(format!(
            "Stored at {}",
            context.config_manager.config_path().display()
        ));
    })
}

/// Updates one setting by key; the config is left untouched on error.
pub(crate) fn apply_setting(config: &mut Config, key: &str, value: &str) -> CommandResult {
    let analytics = &mut config.analytics;
    match key.to_ascii_lowercase().replace('-', "_").as_str() {
        "locale" => config.locale = value.to_string(),
        "currency" => config.currency = value.to_ascii_uppercase(),
        "currency_precision" => config.currency_precision = parse(key, value)?,
        "ui_color_enabled" | "color" => config.ui_color_enabled = parse_switch(key, value)?,
        "week_start" => analytics.week_start = parse::<WeekStart>(key, value)?,
        "dense_series" => analytics.dense_series = parse_switch(key, value)?,
        "slow_mover_days" => analytics.slow_mover_days = parse(key, value)?,
        "fast_mover_days" => analytics.fast_mover_days = parse(key, value)?,
        "upcoming_window_days" => analytics.upcoming_window_days = parse(key, value)?,
        "cash_flow_window_days" => analytics.cash_flow_window_days = parse(key, value)?,
        "payout_readiness" => analytics.payout_readiness = parse::<PayoutReadiness>(key, value)?,
        _ => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown setting `{key}`; expected one of: {}",
                KEYS.join(", ")
            )))
        }
    }
    Ok(())
}

fn parse<T>(key: &str, value: &str) -> Result<T, CommandError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|err| CommandError::InvalidArguments(format!("invalid `{key}`: {err}")))
}

fn parse_switch(key: &str, value: &str) -> Result<bool, CommandError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(CommandError::InvalidArguments(format!(
            "invalid `{key}`: expected on or off, got `{other}`"
        ))),
    }
}
