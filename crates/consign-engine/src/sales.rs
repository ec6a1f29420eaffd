//! Sale attribution.
//!
//! An item's sale happens at its earliest client payment. Cost of goods,
//! items-sold counts and days-to-sell all key off that single instant so an
//! installment sale is costed exactly once.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use consign_domain::{Item, Ledger};

use crate::filter::FilterPredicate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleEvent {
    pub payment_id: Uuid,
    pub sold_at: DateTime<Utc>,
}

/// First client payment per item.
#[derive(Debug, Clone, Default)]
pub struct SaleIndex {
    first_payments: HashMap<Uuid, SaleEvent>,
}

/// A sold item paired with its sale event.
#[derive(Debug, Clone, Copy)]
pub struct SoldItem<'a> {
    pub item: &'a Item,
    pub sale: SaleEvent,
}

impl SoldItem<'_> {
    /// Whole days between acquisition and sale.
    pub fn days_to_sell(&self) -> i64 {
        (self.sale.sold_at.date_naive() - self.item.created_at.date_naive()).num_days()
    }
}

impl SaleIndex {
    pub fn build(ledger: &Ledger) -> Self {
        let mut first_payments: HashMap<Uuid, SaleEvent> = HashMap::new();
        for payment in &ledger.client_payments {
            let candidate = SaleEvent {
                payment_id: payment.id,
                sold_at: payment.paid_at,
            };
            first_payments
                .entry(payment.item_id)
                .and_modify(|current| {
                    if (candidate.sold_at, candidate.payment_id) < (current.sold_at, current.payment_id) {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }
        Self { first_payments }
    }

    pub fn sale_of(&self, item_id: Uuid) -> Option<SaleEvent> {
        self.first_payments.get(&item_id).copied()
    }

    /// True when `payment_id` is the payment that sold `item`.
    pub fn is_sale_payment(&self, item: &Item, payment_id: Uuid) -> bool {
        item.is_sold()
            && self
                .sale_of(item.id)
                .is_some_and(|sale| sale.payment_id == payment_id)
    }

    /// Sold items passing the dimension filters whose sale falls in range.
    pub fn sold_in<'a>(&self, ledger: &'a Ledger, predicate: &FilterPredicate) -> Vec<SoldItem<'a>> {
        predicate
            .matching_items(ledger)
            .filter(|item| item.is_sold())
            .filter_map(|item| {
                self.sale_of(item.id)
                    .filter(|sale| predicate.contains(sale.sold_at))
                    .map(|sale| SoldItem { item, sale })
            })
            .collect()
    }
}
