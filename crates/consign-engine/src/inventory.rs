//! Inventory health snapshot.
//!
//! Not date-ranged: only the dimension filters apply, and ages are measured
//! against the clock's current day.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use consign_config::AnalyticsSettings;
use consign_domain::{Item, ItemStatus, Ledger};

use crate::{
    breakdown::UNKNOWN_DIMENSION,
    filter::{FilterPredicate, ReportFilter},
    math::{mean, round2},
    sales::SaleIndex,
    time::Clock,
    CoreResult,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub in_store: usize,
    pub reserved: usize,
    pub sold: usize,
    pub returned: usize,
}

impl StatusCounts {
    fn record(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::InStore => self.in_store += 1,
            ItemStatus::Reserved => self.reserved += 1,
            ItemStatus::Sold => self.sold += 1,
            ItemStatus::Returned => self.returned += 1,
        }
    }

    pub fn unsold(&self) -> usize {
        self.in_store + self.reserved
    }
}

/// Unsold items by days held. Each in-store or reserved item lands in
/// exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingHistogram {
    pub under_30: usize,
    pub days_30_to_90: usize,
    pub days_91_to_180: usize,
    pub over_180: usize,
}

impl AgingHistogram {
    fn record(&mut self, age_days: i64) {
        match age_days {
            i64::MIN..=29 => self.under_30 += 1,
            30..=90 => self.days_30_to_90 += 1,
            91..=180 => self.days_91_to_180 += 1,
            _ => self.over_180 += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.under_30 + self.days_30_to_90 + self.days_91_to_180 + self.over_180
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInventory {
    pub category_id: Uuid,
    pub name: String,
    pub item_count: usize,
    pub value: Decimal,
    pub average_age_days: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryHealth {
    pub total_items: usize,
    pub status_counts: StatusCounts,
    pub total_value: Decimal,
    pub average_age_days: Decimal,
    pub slow_moving_items: usize,
    pub fast_moving_items: usize,
    pub categories: Vec<CategoryInventory>,
    pub aging: AgingHistogram,
}

pub struct InventoryService;

impl InventoryService {
    pub fn snapshot(
        ledger: &Ledger,
        filter: &ReportFilter,
        clock: &dyn Clock,
        settings: &AnalyticsSettings,
    ) -> CoreResult<InventoryHealth> {
        let predicate = filter.build()?.without_dates();
        Ok(Self::analyze(ledger, &predicate, clock, settings))
    }

    pub fn analyze(
        ledger: &Ledger,
        predicate: &FilterPredicate,
        clock: &dyn Clock,
        settings: &AnalyticsSettings,
    ) -> InventoryHealth {
        let today = clock.today();
        let sales = SaleIndex::build(ledger);
        let items: Vec<&Item> = predicate.matching_items(ledger).collect();

        let mut status_counts = StatusCounts::default();
        let mut aging = AgingHistogram::default();
        let mut slow_moving_items = 0;
        let mut fast_moving_items = 0;
        let mut per_category: BTreeMap<Uuid, Vec<&Item>> = BTreeMap::new();

        for item in &items {
            status_counts.record(item.status);
            per_category.entry(item.category_id).or_default().push(*item);
            let age = item.age_days(today);
            if item.is_unsold() {
                aging.record(age);
                if age > i64::from(settings.slow_mover_days) {
                    slow_moving_items += 1;
                }
            }
            if item.is_sold() {
                let sold_fast = sales.sale_of(item.id).is_some_and(|sale| {
                    (sale.sold_at.date_naive() - item.created_at.date_naive()).num_days()
                        <= i64::from(settings.fast_mover_days)
                });
                if sold_fast {
                    fast_moving_items += 1;
                }
            }
        }

        let mut categories: Vec<CategoryInventory> = per_category
            .into_iter()
            .map(|(category_id, members)| CategoryInventory {
                category_id,
                name: ledger
                    .category(category_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| UNKNOWN_DIMENSION.to_string()),
                item_count: members.len(),
                value: members.iter().map(|item| item.conservative_cost()).sum(),
                average_age_days: round2(mean(
                    members.iter().map(|item| Decimal::from(item.age_days(today))),
                )),
            })
            .collect();
        categories.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));

        debug!(items = items.len(), slow = slow_moving_items, "computed inventory health");

        InventoryHealth {
            total_items: items.len(),
            status_counts,
            total_value: items.iter().map(|item| item.conservative_cost()).sum(),
            average_age_days: round2(mean(
                items.iter().map(|item| Decimal::from(item.age_days(today))),
            )),
            slow_moving_items,
            fast_moving_items,
            categories,
            aging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aging_bucket_edges() {
        let mut histogram = AgingHistogram::default();
        for age in [0, 29, 30, 90, 91, 180, 181] {
            histogram.record(age);
        }
        assert_eq!(histogram.under_30, 2);
        assert_eq!(histogram.days_30_to_90, 2);
        assert_eq!(histogram.days_91_to_180, 2);
        assert_eq!(histogram.over_180, 1);
        assert_eq!(histogram.total(), 7);
    }
}
