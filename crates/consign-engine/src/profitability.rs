//! Per-item profitability ranking.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use consign_domain::{Item, Ledger};

use crate::{
    filter::{FilterPredicate, ReportFilter},
    math::rate,
    CoreResult,
};

pub const DEFAULT_PAGE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemProfit {
    pub item_id: Uuid,
    pub title: String,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub margin: Decimal,
    pub days_to_sell: i64,
    pub first_payment_at: DateTime<Utc>,
}

pub struct ProfitabilityService;

impl ProfitabilityService {
    /// Sold items with a qualifying payment, most profitable first.
    pub fn rank(ledger: &Ledger, filter: &ReportFilter, page: Page) -> CoreResult<Vec<ItemProfit>> {
        let predicate = filter.build()?;
        let rows = Self::all_rows(ledger, &predicate);
        debug!(total = rows.len(), limit = page.limit, offset = page.offset, "ranked items");
        Ok(rows.into_iter().skip(page.offset).take(page.limit).collect())
    }

    /// Unpaginated number of rows [`ProfitabilityService::rank`] pages over.
    pub fn count(ledger: &Ledger, filter: &ReportFilter) -> CoreResult<usize> {
        let predicate = filter.build()?;
        Ok(Self::sold_with_payments(ledger, &predicate).len())
    }

    pub fn all_rows(ledger: &Ledger, predicate: &FilterPredicate) -> Vec<ItemProfit> {
        let mut rows: Vec<ItemProfit> = Self::sold_with_payments(ledger, predicate)
            .into_values()
            .map(|(item, revenue, first_payment_at)| {
                let cost = item.conservative_cost();
                let profit = revenue - cost;
                ItemProfit {
                    item_id: item.id,
                    title: item.title.clone(),
                    revenue,
                    cost,
                    profit,
                    margin: rate(profit, revenue),
                    days_to_sell: (first_payment_at.date_naive() - item.created_at.date_naive())
                        .num_days(),
                    first_payment_at,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.profit
                .cmp(&a.profit)
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        rows
    }

    // item id -> (item, revenue in range, first qualifying payment)
    fn sold_with_payments<'a>(
        ledger: &'a Ledger,
        predicate: &FilterPredicate,
    ) -> HashMap<Uuid, (&'a Item, Decimal, DateTime<Utc>)> {
        let mut per_item: HashMap<Uuid, (&Item, Decimal, DateTime<Utc>)> = HashMap::new();
        for row in predicate
            .qualifying_payments(ledger)
            .into_iter()
            .filter(|row| row.item.is_sold())
        {
            per_item
                .entry(row.item.id)
                .and_modify(|(_, revenue, first)| {
                    *revenue += row.payment.amount;
                    *first = (*first).min(row.payment.paid_at);
                })
                .or_insert((row.item, row.payment.amount, row.payment.paid_at));
        }
        per_item
    }
}
