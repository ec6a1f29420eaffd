//! Report filter builder.
//!
//! Every report funnels its caller-supplied filter set through
//! [`ReportFilter::build`], and every date test goes through
//! [`FilterPredicate::contains`], so full-day bound normalisation happens in
//! exactly one place.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use consign_config::PayoutReadiness;
use consign_domain::{ClientPayment, DateRange, Expense, Item, Ledger};

use crate::CoreResult;

/// Caller-facing filter set. Empty lists and absent dates match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub vendor_ids: Vec<Uuid>,
    #[serde(default)]
    pub brand_ids: Vec<Uuid>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Rule deciding which sold items still await a vendor payout.
    #[serde(default)]
    pub payout_readiness: PayoutReadiness,
}

impl ReportFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vendor(mut self, id: Uuid) -> Self {
        self.vendor_ids.push(id);
        self
    }

    pub fn brand(mut self, id: Uuid) -> Self {
        self.brand_ids.push(id);
        self
    }

    pub fn category(mut self, id: Uuid) -> Self {
        self.category_ids.push(id);
        self
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn range(self, range: DateRange) -> Self {
        self.between(range.start_instant(), range.end_instant())
    }

    pub fn payout_readiness(mut self, rule: PayoutReadiness) -> Self {
        self.payout_readiness = rule;
        self
    }

    /// Normalises the filter into a reusable predicate.
    pub fn build(&self) -> CoreResult<FilterPredicate> {
        let start = self.start.map(|instant| instant.date_naive());
        let end = self.end.map(|instant| instant.date_naive());
        if let (Some(start), Some(end)) = (start, end) {
            DateRange::new(start, end)?;
        }
        Ok(FilterPredicate {
            vendors: self.vendor_ids.iter().copied().collect(),
            brands: self.brand_ids.iter().copied().collect(),
            categories: self.category_ids.iter().copied().collect(),
            start,
            end,
            payout_readiness: self.payout_readiness,
        })
    }
}

/// Normalised filter applied identically by every report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPredicate {
    vendors: HashSet<Uuid>,
    brands: HashSet<Uuid>,
    categories: HashSet<Uuid>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    payout_readiness: PayoutReadiness,
}

/// A client payment joined to the item it pays for.
#[derive(Debug, Clone, Copy)]
pub struct QualifyingPayment<'a> {
    pub payment: &'a ClientPayment,
    pub item: &'a Item,
}

impl FilterPredicate {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn payout_readiness(&self) -> PayoutReadiness {
        self.payout_readiness
    }

    pub fn has_dimension_filters(&self) -> bool {
        !(self.vendors.is_empty() && self.brands.is_empty() && self.categories.is_empty())
    }

    pub fn matches_item(&self, item: &Item) -> bool {
        (self.vendors.is_empty() || self.vendors.contains(&item.vendor_id))
            && (self.brands.is_empty() || self.brands.contains(&item.brand_id))
            && (self.categories.is_empty() || self.categories.contains(&item.category_id))
    }

    /// Whole-day inclusive test: anything on the start day from 00:00:00.000
    /// through the end day at 23:59:59.999 is inside.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let day = instant.date_naive();
        self.start.map_or(true, |start| day >= start) && self.end.map_or(true, |end| day <= end)
    }

    /// The bounded range, when both ends were supplied.
    pub fn range(&self) -> Option<DateRange> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        }
    }

    /// Same dimension filters over a different date range.
    pub fn with_range(&self, range: DateRange) -> Self {
        Self {
            start: Some(range.start),
            end: Some(range.end),
            ..self.clone()
        }
    }

    /// Same dimension filters with no date bounds.
    pub fn without_dates(&self) -> Self {
        Self {
            start: None,
            end: None,
            ..self.clone()
        }
    }

    /// Items passing the dimension filters, regardless of dates.
    pub fn matching_items<'p, 'a: 'p>(
        &'p self,
        ledger: &'a Ledger,
    ) -> impl Iterator<Item = &'a Item> + 'p {
        ledger.items.iter().filter(move |item| self.matches_item(item))
    }

    /// Expenses in range. With dimension filters active only expenses linked
    /// to a matching item count.
    pub fn includes_expense(&self, ledger: &Ledger, expense: &Expense) -> bool {
        if !self.contains(expense.incurred_at) {
            return false;
        }
        if !self.has_dimension_filters() {
            return true;
        }
        expense
            .item_id
            .and_then(|id| ledger.item(id))
            .is_some_and(|item| self.matches_item(item))
    }

    /// Payments in range whose item exists and passes the dimension filters.
    pub fn qualifying_payments<'a>(&self, ledger: &'a Ledger) -> Vec<QualifyingPayment<'a>> {
        let items: HashMap<Uuid, &Item> = ledger.items.iter().map(|item| (item.id, item)).collect();
        let mut dangling = 0usize;
        let rows: Vec<_> = ledger
            .client_payments
            .iter()
            .filter(|payment| self.contains(payment.paid_at))
            .filter_map(|payment| match items.get(&payment.item_id) {
                Some(item) => Some(QualifyingPayment { payment, item }),
                None => {
                    dangling += 1;
                    None
                }
            })
            .filter(|row| self.matches_item(row.item))
            .collect();
        if dangling > 0 {
            warn!(dangling, "skipping client payments that reference missing items");
        }
        rows
    }
}
