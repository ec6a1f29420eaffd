//! `--key value` option parsing and ledger name resolution for commands.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use consign_domain::{DateRange, Ledger};
use consign_engine::ReportFilter;

use crate::cli::context::CommandError;

/// Options that never take a value.
const FLAGS: &[&str] = &["json", "dense", "sparse"];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    positionals: Vec<String>,
    options: HashMap<String, Vec<String>>,
    flags: Vec<String>,
}

impl ParsedArgs {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let Some(option) = arg.strip_prefix("--") else {
                parsed.positionals.push((*arg).to_string());
                continue;
            };
            if let Some((key, value)) = option.split_once('=') {
                parsed.push_option(key, value);
            } else if FLAGS.contains(&option) {
                parsed.flags.push(option.to_string());
            } else {
                let value = iter.next().ok_or_else(|| {
                    CommandError::InvalidArguments(format!("option `--{option}` needs a value"))
                })?;
                parsed.push_option(option, value);
            }
        }
        Ok(parsed)
    }

    fn push_option(&mut self, key: &str, value: &str) {
        self.options
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positionals.get(index).map(String::as_str)
    }

    pub fn require_positional(&self, index: usize, name: &str) -> Result<&str, CommandError> {
        self.positional(index)
            .ok_or_else(|| CommandError::InvalidArguments(format!("missing <{name}> argument")))
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.iter().any(|flag| flag == name)
    }

    /// Last value given for `--name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    pub fn values(&self, name: &str) -> &[String] {
        self.options.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn require(&self, name: &str) -> Result<&str, CommandError> {
        self.value(name)
            .ok_or_else(|| CommandError::InvalidArguments(format!("missing `--{name}` option")))
    }

    pub fn parse_value<T>(&self, name: &str) -> Result<Option<T>, CommandError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.value(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|err| {
                    CommandError::InvalidArguments(format!("invalid `--{name}`: {err}"))
                })
            })
            .transpose()
    }

    pub fn parse_all<T>(&self, name: &str) -> Result<Vec<T>, CommandError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.values(name)
            .iter()
            .map(|raw| {
                raw.parse::<T>().map_err(|err| {
                    CommandError::InvalidArguments(format!("invalid `--{name}`: {err}"))
                })
            })
            .collect()
    }

    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, CommandError> {
        self.value(name).map(parse_date).transpose()
    }

    pub fn amount(&self, name: &str) -> Result<Decimal, CommandError> {
        let raw = self.require(name)?;
        Decimal::from_str(raw.trim()).map_err(|err| {
            CommandError::InvalidArguments(format!("invalid amount `{raw}` for `--{name}`: {err}"))
        })
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{raw}`, expected YYYY-MM-DD"))
    })
}

/// `--date` as the start of that UTC day, else `now`.
pub fn instant_or(parsed: &ParsedArgs, now: DateTime<Utc>) -> Result<DateTime<Utc>, CommandError> {
    Ok(parsed
        .date("date")?
        .map(|date| DateRange::single_day(date).start_instant())
        .unwrap_or(now))
}

/// Builds the report filter from `--from`, `--to`, `--vendor`, `--brand` and `--category`.
pub fn report_filter(ledger: &Ledger, parsed: &ParsedArgs) -> Result<ReportFilter, CommandError> {
    let mut filter = ReportFilter::new();
    match (parsed.date("from")?, parsed.date("to")?) {
        (Some(from), Some(to)) => {
            let range = DateRange::new(from, to)
                .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
            filter = filter.range(range);
        }
        (Some(from), None) => filter.start = Some(DateRange::single_day(from).start_instant()),
        (None, Some(to)) => filter.end = Some(DateRange::single_day(to).end_instant()),
        (None, None) => {}
    }
    for token in parsed.values("vendor") {
        filter = filter.vendor(resolve_vendor(ledger, token)?);
    }
    for token in parsed.values("brand") {
        filter = filter.brand(resolve_brand(ledger, token)?);
    }
    for token in parsed.values("category") {
        filter = filter.category(resolve_category(ledger, token)?);
    }
    Ok(filter)
}

fn resolve<'a>(
    kind: &str,
    token: &str,
    candidates: impl Iterator<Item = (Uuid, &'a str)>,
) -> Result<Uuid, CommandError> {
    let parsed_id = Uuid::parse_str(token).ok();
    let matches: Vec<Uuid> = candidates
        .filter(|(id, name)| Some(*id) == parsed_id || name.eq_ignore_ascii_case(token))
        .map(|(id, _)| id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CommandError::InvalidArguments(format!("no {kind} named `{token}`"))),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{token}` matches {} {kind}s; use the id instead",
            matches.len()
        ))),
    }
}

pub fn resolve_item(ledger: &Ledger, token: &str) -> Result<Uuid, CommandError> {
    resolve("item", token, ledger.items.iter().map(|i| (i.id, i.title.as_str())))
}

pub fn resolve_vendor(ledger: &Ledger, token: &str) -> Result<Uuid, CommandError> {
    resolve("vendor", token, ledger.vendors.iter().map(|v| (v.id, v.name.as_str())))
}

pub fn resolve_client(ledger: &Ledger, token: &str) -> Result<Uuid, CommandError> {
    resolve("client", token, ledger.clients.iter().map(|c| (c.id, c.name.as_str())))
}

pub fn resolve_brand(ledger: &Ledger, token: &str) -> Result<Uuid, CommandError> {
    resolve("brand", token, ledger.brands.iter().map(|b| (b.id, b.name.as_str())))
}

pub fn resolve_category(ledger: &Ledger, token: &str) -> Result<Uuid, CommandError> {
    resolve(
        "category",
        token,
        ledger.categories.iter().map(|c| (c.id, c.name.as_str())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use consign_domain::{Brand, Category, Item, Vendor};

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new("Boutique");
        let vendor = ledger.add_vendor(Vendor::new("Ana"));
        let brand = ledger.add_brand(Brand::new("Hermes"));
        let category = ledger.add_category(Category::new("Bags"));
        ledger.add_category(Category::new("bags"));
        ledger.add_item(Item::new("Birkin", vendor, brand, category, Utc::now()));
        ledger
    }

    #[test]
    fn splits_positionals_options_and_flags() {
        let parsed = ParsedArgs::parse(&[
            "Birkin",
            "--amount",
            "250.50",
            "--json",
            "--brand=Hermes",
            "--brand",
            "Chanel",
        ])
        .unwrap();
        assert_eq!(parsed.positional(0), Some("Birkin"));
        assert!(parsed.flag("json"));
        assert_eq!(parsed.values("brand"), ["Hermes", "Chanel"]);
        assert_eq!(parsed.amount("amount").unwrap().to_string(), "250.50");
    }

    #[test]
    fn option_without_value_is_rejected() {
        let err = ParsedArgs::parse(&["--client"]).unwrap_err();
        assert!(err.to_string().contains("--client"));
    }

    #[test]
    fn names_resolve_case_insensitively() {
        let ledger = sample_ledger();
        let brand = resolve_brand(&ledger, "hermes").unwrap();
        assert_eq!(resolve_brand(&ledger, &brand.to_string()).unwrap(), brand);
        assert!(resolve_item(&ledger, "Kelly").is_err());
        let ambiguous = resolve_category(&ledger, "BAGS").unwrap_err();
        assert!(ambiguous.to_string().contains("matches 2"));
    }

    #[test]
    fn builds_ranged_filter() {
        let ledger = sample_ledger();
        let parsed =
            ParsedArgs::parse(&["--from", "2024-03-01", "--to", "2024-03-31", "--vendor", "Ana"])
                .unwrap();
        let filter = report_filter(&ledger, &parsed).unwrap();
        assert_eq!(filter.vendor_ids.len(), 1);
        assert_eq!(
            filter.start,
            Some(DateRange::single_day(parse_date("2024-03-01").unwrap()).start_instant())
        );

        let reversed = ParsedArgs::parse(&["--from", "2024-04-01", "--to", "2024-03-01"]).unwrap();
        assert!(report_filter(&ledger, &reversed).is_err());
    }
}
