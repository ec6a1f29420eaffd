//! Consigned inventory items and their lifecycle.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// A single consigned good, priced by a cost range and a sale-price range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub vendor_id: Uuid,
    pub brand_id: Uuid,
    pub category_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sales_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sales_price: Option<Decimal>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Item {
    pub fn new(
        title: impl Into<String>,
        vendor_id: Uuid,
        brand_id: Uuid,
        category_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            vendor_id,
            brand_id,
            category_id,
            min_cost: None,
            max_cost: None,
            min_sales_price: None,
            max_sales_price: None,
            status: ItemStatus::InStore,
            created_at,
            notes: None,
        }
    }

    pub fn with_cost_range(mut self, min: Decimal, max: Decimal) -> Self {
        self.min_cost = Some(min);
        self.max_cost = Some(max);
        self
    }

    pub fn with_price_range(mut self, min: Decimal, max: Decimal) -> Self {
        self.min_sales_price = Some(min);
        self.max_sales_price = Some(max);
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Low end of the cost range, falling back to the high end, then zero.
    pub fn conservative_cost(&self) -> Decimal {
        self.min_cost.or(self.max_cost).unwrap_or(Decimal::ZERO)
    }

    /// Price at which cumulative client payments mark the item as sold.
    pub fn settlement_price(&self) -> Option<Decimal> {
        self.min_sales_price.or(self.max_sales_price)
    }

    /// Still on the shop floor or held for a buyer.
    pub fn is_unsold(&self) -> bool {
        matches!(self.status, ItemStatus::InStore | ItemStatus::Reserved)
    }

    pub fn is_sold(&self) -> bool {
        self.status == ItemStatus::Sold
    }

    /// Whole days held as of `today`, never negative.
    pub fn age_days(&self, today: NaiveDate) -> i64 {
        (today - self.created_at.date_naive()).num_days().max(0)
    }
}

impl Identifiable for Item {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Item {
    fn name(&self) -> &str {
        &self.title
    }
}

impl Displayable for Item {
    fn display_label(&self) -> String {
        format!("{} [{}]", self.title, self.status)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
/// Lifecycle state of a consigned item.
pub enum ItemStatus {
    InStore,
    Reserved,
    Sold,
    Returned,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::InStore,
        ItemStatus::Reserved,
        ItemStatus::Sold,
        ItemStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::InStore => "in-store",
            ItemStatus::Reserved => "reserved",
            ItemStatus::Sold => "sold",
            ItemStatus::Returned => "returned",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown item status `{value}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample() -> Item {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        Item::new("Kelly 28", Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), created)
    }

    #[test]
    fn conservative_cost_falls_back_through_range() {
        let mut item = sample();
        assert_eq!(item.conservative_cost(), Decimal::ZERO);
        item.max_cost = Some(dec!(600));
        assert_eq!(item.conservative_cost(), dec!(600));
        item.min_cost = Some(dec!(450));
        assert_eq!(item.conservative_cost(), dec!(450));
    }

    #[test]
    fn status_serializes_as_kebab_case() {
        let json = serde_json::to_string(&ItemStatus::InStore).unwrap();
        assert_eq!(json, "\"in-store\"");
        assert_eq!("Reserved".parse::<ItemStatus>().unwrap(), ItemStatus::Reserved);
        assert!("gone".parse::<ItemStatus>().is_err());
    }

    #[test]
    fn age_counts_whole_days() {
        let item = sample();
        let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(item.age_days(today), 30);
        let before = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        assert_eq!(item.age_days(before), 0);
    }
}
