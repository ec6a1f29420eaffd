//! Time-series bucketer.
//!
//! Series are sparse by default: only buckets with at least one row are
//! emitted. `fill_gaps` switches to a dense series where every bucket between
//! the range bounds appears, zero-valued when idle.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use consign_config::WeekStart;
use consign_domain::{month_start, shift_month, Ledger};

use crate::{
    filter::{FilterPredicate, ReportFilter},
    sales::SaleIndex,
    CoreError, CoreResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    Revenue,
    Profit,
    ItemsSold,
    Payments,
    Expenses,
}

impl FromStr for TrendMetric {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "revenue" => Ok(TrendMetric::Revenue),
            "profit" => Ok(TrendMetric::Profit),
            "items_sold" | "itemssold" => Ok(TrendMetric::ItemsSold),
            "payments" => Ok(TrendMetric::Payments),
            "expenses" => Ok(TrendMetric::Expenses),
            other => Err(CoreError::Validation(format!("unknown trend metric `{other}`"))),
        }
    }
}

impl fmt::Display for TrendMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendMetric::Revenue => "revenue",
            TrendMetric::Profit => "profit",
            TrendMetric::ItemsSold => "items_sold",
            TrendMetric::Payments => "payments",
            TrendMetric::Expenses => "expenses",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Canonical start of the bucket containing `date`.
    pub fn bucket_start(self, date: NaiveDate, week_start: WeekStart) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => {
                let offset = match week_start {
                    WeekStart::Sunday => date.weekday().num_days_from_sunday(),
                    WeekStart::Monday => date.weekday().num_days_from_monday(),
                };
                date.checked_sub_signed(Duration::days(i64::from(offset)))
                    .unwrap_or(NaiveDate::MIN)
            }
            Granularity::Month => month_start(date),
        }
    }

    /// `None` once the calendar runs out.
    fn next_bucket(self, start: NaiveDate) -> Option<NaiveDate> {
        let next = match self {
            Granularity::Day => start.succ_opt()?,
            Granularity::Week => start.checked_add_signed(Duration::days(7))?,
            Granularity::Month => shift_month(start, 1),
        };
        (next > start).then_some(next)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        };
        f.write_str(label)
    }
}

impl FromStr for Granularity {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            other => Err(CoreError::Validation(format!("unknown granularity `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRequest {
    pub metric: TrendMetric,
    pub granularity: Granularity,
    #[serde(default)]
    pub fill_gaps: bool,
    #[serde(default)]
    pub week_start: WeekStart,
}

impl TrendRequest {
    pub fn new(metric: TrendMetric, granularity: Granularity) -> Self {
        Self {
            metric,
            granularity,
            fill_gaps: false,
            week_start: WeekStart::default(),
        }
    }

    pub fn dense(mut self, fill_gaps: bool) -> Self {
        self.fill_gaps = fill_gaps;
        self
    }

    pub fn week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = week_start;
        self
    }
}

/// One bucket; `period` is the bucket start as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub value: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    value: Decimal,
    count: usize,
}

pub struct TrendService;

impl TrendService {
    /// Ordered series for the request; a pure function of ledger state.
    pub fn series(
        ledger: &Ledger,
        filter: &ReportFilter,
        request: &TrendRequest,
    ) -> CoreResult<Vec<TrendPoint>> {
        let predicate = filter.build()?;
        Ok(Self::series_for(ledger, &predicate, request))
    }

    pub fn series_for(
        ledger: &Ledger,
        predicate: &FilterPredicate,
        request: &TrendRequest,
    ) -> Vec<TrendPoint> {
        let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
        let key = |date: NaiveDate| request.granularity.bucket_start(date, request.week_start);

        match request.metric {
            TrendMetric::Revenue | TrendMetric::Payments | TrendMetric::Profit => {
                for row in predicate.qualifying_payments(ledger) {
                    let bucket = buckets.entry(key(row.payment.paid_at.date_naive())).or_default();
                    bucket.count += 1;
                    bucket.value += match request.metric {
                        TrendMetric::Payments => Decimal::ONE,
                        _ => row.payment.amount,
                    };
                }
                if request.metric == TrendMetric::Profit {
                    let sales = SaleIndex::build(ledger);
                    for sold in sales.sold_in(ledger, predicate) {
                        let bucket = buckets.entry(key(sold.sale.sold_at.date_naive())).or_default();
                        bucket.value -= sold.item.conservative_cost();
                    }
                }
            }
            TrendMetric::ItemsSold => {
                let sales = SaleIndex::build(ledger);
                for sold in sales.sold_in(ledger, predicate) {
                    let bucket = buckets.entry(key(sold.sale.sold_at.date_naive())).or_default();
                    bucket.count += 1;
                    bucket.value += Decimal::ONE;
                }
            }
            TrendMetric::Expenses => {
                for expense in ledger
                    .expenses
                    .iter()
                    .filter(|expense| predicate.includes_expense(ledger, expense))
                {
                    let bucket = buckets.entry(key(expense.incurred_at.date_naive())).or_default();
                    bucket.count += 1;
                    bucket.value += expense.amount;
                }
            }
        }

        if request.fill_gaps {
            let bounds = predicate
                .range()
                .map(|range| (key(range.start), key(range.end)))
                .or_else(|| {
                    let first = buckets.keys().next().copied()?;
                    let last = buckets.keys().next_back().copied()?;
                    Some((first, last))
                });
            if let Some((first, last)) = bounds {
                let mut cursor = Some(first);
                while let Some(start) = cursor.filter(|start| *start <= last) {
                    buckets.entry(start).or_default();
                    cursor = request.granularity.next_bucket(start);
                }
            }
        }

        debug!(
            metric = %request.metric,
            buckets = buckets.len(),
            dense = request.fill_gaps,
            "computed trend series"
        );

        buckets
            .into_iter()
            .map(|(start, bucket)| TrendPoint {
                period: start.format("%Y-%m-%d").to_string(),
                value: bucket.value,
                count: bucket.count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_buckets_respect_week_start() {
        // 2024-03-13 is a Wednesday.
        let wednesday = date(2024, 3, 13);
        assert_eq!(
            Granularity::Week.bucket_start(wednesday, WeekStart::Sunday),
            date(2024, 3, 10)
        );
        assert_eq!(
            Granularity::Week.bucket_start(wednesday, WeekStart::Monday),
            date(2024, 3, 11)
        );
        let sunday = date(2024, 3, 10);
        assert_eq!(Granularity::Week.bucket_start(sunday, WeekStart::Sunday), sunday);
        assert_eq!(
            Granularity::Week.bucket_start(sunday, WeekStart::Monday),
            date(2024, 3, 4)
        );
    }

    #[test]
    fn month_buckets_start_on_the_first() {
        assert_eq!(
            Granularity::Month.bucket_start(date(2024, 2, 29), WeekStart::Sunday),
            date(2024, 2, 1)
        );
        assert_eq!(
            Granularity::Month.next_bucket(date(2024, 12, 1)),
            Some(date(2025, 1, 1))
        );
    }

    #[test]
    fn buckets_stop_at_the_end_of_the_calendar() {
        assert_eq!(Granularity::Day.next_bucket(NaiveDate::MAX), None);
        assert_eq!(Granularity::Week.next_bucket(NaiveDate::MAX), None);
        let last_month = Granularity::Month.bucket_start(NaiveDate::MAX, WeekStart::Sunday);
        assert_eq!(Granularity::Month.next_bucket(last_month), None);
        assert_eq!(
            Granularity::Week.bucket_start(NaiveDate::MIN, WeekStart::Monday),
            NaiveDate::MIN
        );
    }

    #[test]
    fn parses_metric_and_granularity_names() {
        assert_eq!("items-sold".parse::<TrendMetric>().unwrap(), TrendMetric::ItemsSold);
        assert_eq!("Weekly".parse::<Granularity>().unwrap(), Granularity::Week);
        assert!("hourly".parse::<Granularity>().is_err());
    }
}
