//! Grouped breakdown engine.
//!
//! One generic grouping pass keyed by a [`DimensionDescriptor`] serves all
//! four dimensions.

use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use consign_domain::Ledger;

use crate::{
    dimension::{Dimension, DimensionDescriptor},
    filter::{FilterPredicate, ReportFilter},
    math::{percent_change, rate, ratio, round2},
    sales::SaleIndex,
    CoreError, CoreResult,
};

/// Display name used when a row's dimension record no longer exists.
pub const UNKNOWN_DIMENSION: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownMetric {
    Revenue,
    Cost,
    Profit,
    ItemCount,
    PaymentCount,
    AvgOrderValue,
    ProfitMargin,
    Change,
}

impl BreakdownMetric {
    pub const ALL: [BreakdownMetric; 8] = [
        BreakdownMetric::Revenue,
        BreakdownMetric::Cost,
        BreakdownMetric::Profit,
        BreakdownMetric::ItemCount,
        BreakdownMetric::PaymentCount,
        BreakdownMetric::AvgOrderValue,
        BreakdownMetric::ProfitMargin,
        BreakdownMetric::Change,
    ];
}

impl FromStr for BreakdownMetric {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let metric = match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "revenue" => BreakdownMetric::Revenue,
            "cost" => BreakdownMetric::Cost,
            "profit" => BreakdownMetric::Profit,
            "item_count" | "items" => BreakdownMetric::ItemCount,
            "payment_count" | "payments" => BreakdownMetric::PaymentCount,
            "avg_order_value" | "aov" => BreakdownMetric::AvgOrderValue,
            "profit_margin" | "margin" => BreakdownMetric::ProfitMargin,
            "change" => BreakdownMetric::Change,
            other => {
                return Err(CoreError::Validation(format!(
                    "unknown breakdown metric `{other}`"
                )))
            }
        };
        Ok(metric)
    }
}

/// Dimension plus the metrics to fill. An empty metric list means all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownRequest {
    pub dimension: Dimension,
    #[serde(default)]
    pub metrics: Vec<BreakdownMetric>,
}

impl BreakdownRequest {
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            metrics: Vec::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = BreakdownMetric>) -> Self {
        self.metrics = metrics.into_iter().collect();
        self
    }

    fn wants(&self, metric: BreakdownMetric) -> bool {
        self.metrics.is_empty() || self.metrics.contains(&metric)
    }
}

/// Aggregates for one dimension value. Metrics not requested stay zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub id: Uuid,
    pub name: String,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub item_count: usize,
    pub payment_count: usize,
    pub avg_order_value: Decimal,
    pub profit_margin: Decimal,
    pub change: Decimal,
}

#[derive(Default)]
struct GroupTotals {
    revenue: Decimal,
    cost: Decimal,
    items: HashSet<Uuid>,
    payments: HashSet<Uuid>,
}

pub struct BreakdownService;

impl BreakdownService {
    /// Rows for every dimension value with at least one qualifying payment,
    /// ordered by revenue descending (name ascending on ties).
    pub fn breakdown(
        ledger: &Ledger,
        filter: &ReportFilter,
        request: &BreakdownRequest,
    ) -> CoreResult<Vec<BreakdownRow>> {
        let predicate = filter.build()?;
        Ok(Self::rows(ledger, &predicate, request))
    }

    pub fn rows(
        ledger: &Ledger,
        predicate: &FilterPredicate,
        request: &BreakdownRequest,
    ) -> Vec<BreakdownRow> {
        let descriptor = request.dimension.descriptor();
        let sales = SaleIndex::build(ledger);
        let groups = group_by(ledger, predicate, &descriptor, &sales);

        let prior: HashMap<Uuid, Decimal> = match predicate.range() {
            Some(range) if request.wants(BreakdownMetric::Change) => {
                let previous = predicate.with_range(range.previous_period());
                group_by(ledger, &previous, &descriptor, &sales)
                    .into_iter()
                    .map(|(id, totals)| (id, totals.revenue))
                    .collect()
            }
            _ => HashMap::new(),
        };

        let mut ranked: Vec<(Decimal, BreakdownRow)> = groups
            .into_iter()
            .map(|(id, totals)| {
                let name = (descriptor.name)(ledger, id)
                    .unwrap_or_else(|| UNKNOWN_DIMENSION.to_string());
                let revenue = totals.revenue;
                (revenue, build_row(request, id, name, totals, prior.get(&id).copied()))
            })
            .collect();
        ranked.sort_by(|(rev_a, a), (rev_b, b)| {
            rev_b
                .cmp(rev_a)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        let rows: Vec<BreakdownRow> = ranked.into_iter().map(|(_, row)| row).collect();
        debug!(
            dimension = %request.dimension,
            rows = rows.len(),
            "computed grouped breakdown"
        );
        rows
    }

    /// Name of the highest-revenue dimension value, if any payment qualifies.
    pub fn revenue_leader(
        ledger: &Ledger,
        predicate: &FilterPredicate,
        dimension: Dimension,
    ) -> Option<String> {
        let request = BreakdownRequest::new(dimension).with_metrics([BreakdownMetric::Revenue]);
        Self::rows(ledger, predicate, &request)
            .into_iter()
            .next()
            .map(|row| row.name)
    }
}

fn group_by(
    ledger: &Ledger,
    predicate: &FilterPredicate,
    descriptor: &DimensionDescriptor,
    sales: &SaleIndex,
) -> HashMap<Uuid, GroupTotals> {
    let mut groups: HashMap<Uuid, GroupTotals> = HashMap::new();
    for row in predicate.qualifying_payments(ledger) {
        let key = (descriptor.key)(row.payment, row.item);
        let totals = groups.entry(key).or_default();
        totals.revenue += row.payment.amount;
        totals.items.insert(row.item.id);
        totals.payments.insert(row.payment.id);
        if sales.is_sale_payment(row.item, row.payment.id) {
            totals.cost += row.item.conservative_cost();
        }
    }
    groups
}

fn build_row(
    request: &BreakdownRequest,
    id: Uuid,
    name: String,
    totals: GroupTotals,
    prior_revenue: Option<Decimal>,
) -> BreakdownRow {
    let pick = |metric: BreakdownMetric, value: Decimal| {
        if request.wants(metric) {
            value
        } else {
            Decimal::ZERO
        }
    };
    let profit = totals.revenue - totals.cost;
    let payment_count = totals.payments.len();
    BreakdownRow {
        id,
        name,
        revenue: pick(BreakdownMetric::Revenue, totals.revenue),
        cost: pick(BreakdownMetric::Cost, totals.cost),
        profit: pick(BreakdownMetric::Profit, profit),
        item_count: if request.wants(BreakdownMetric::ItemCount) {
            totals.items.len()
        } else {
            0
        },
        payment_count: if request.wants(BreakdownMetric::PaymentCount) {
            payment_count
        } else {
            0
        },
        avg_order_value: pick(
            BreakdownMetric::AvgOrderValue,
            round2(ratio(totals.revenue, Decimal::from(payment_count))),
        ),
        profit_margin: pick(
            BreakdownMetric::ProfitMargin,
            rate(profit, totals.revenue),
        ),
        change: pick(
            BreakdownMetric::Change,
            percent_change(totals.revenue, prior_revenue.unwrap_or(Decimal::ZERO)),
        ),
    }
}
