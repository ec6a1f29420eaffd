//! Vendor settlement calculator and the atomic payment/payout recorders.
//!
//! The amount owed to a vendor slides with the realised sale price:
//!
//! ```text
//! price_difference          = max_sales_price - actual_sale_price
//! price_difference_percent  = price_difference / max_sales_price * 100
//! adjustment_factor         = 1 - price_difference_percent * 0.01
//! vendor_target             = adjustment_factor * max_cost
//! remaining_balance         = max(0, vendor_target - paid_to_vendor)
//! payment_progress          = paid_to_vendor / vendor_target * 100   (0 when target <= 0)
//! is_fully_paid             = payment_progress >= 100
//! ```
//!
//! A sale above the maximum listed price pushes the factor above one and
//! raises the target; only the remaining balance is clamped.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use consign_config::PayoutReadiness;
use consign_domain::{
    ClientPayment, InstallmentAdvance, Item, ItemStatus, Ledger, PaymentMethod, VendorPayout,
};

use crate::{
    filter::{FilterPredicate, ReportFilter},
    math::{ratio, round2},
    mutation::transact,
    CoreError, CoreResult,
};

/// Share of max cost withheld per percentage point of discount.
pub const SETTLEMENT_DISCOUNT_COEFFICIENT: Decimal = dec!(0.01);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub item_id: Uuid,
    pub vendor_id: Uuid,
    pub title: String,
    pub max_sales_price: Decimal,
    pub actual_sale_price: Decimal,
    pub max_cost: Decimal,
    pub price_difference: Decimal,
    pub price_difference_percent: Decimal,
    pub adjustment_factor: Decimal,
    pub vendor_target: Decimal,
    pub total_paid_to_vendor: Decimal,
    pub remaining_balance: Decimal,
    pub payment_progress: Decimal,
    pub is_fully_paid: bool,
}

impl Settlement {
    /// Applies the sliding-scale formula to raw figures.
    pub fn compute(
        max_sales_price: Decimal,
        actual_sale_price: Decimal,
        max_cost: Decimal,
        total_paid_to_vendor: Decimal,
    ) -> SettlementFigures {
        let price_difference = max_sales_price - actual_sale_price;
        let price_difference_percent = ratio(price_difference, max_sales_price) * Decimal::ONE_HUNDRED;
        let adjustment_factor = Decimal::ONE - price_difference_percent * SETTLEMENT_DISCOUNT_COEFFICIENT;
        let vendor_target = round2(adjustment_factor * max_cost);
        let remaining_balance = (vendor_target - total_paid_to_vendor).max(Decimal::ZERO);
        let payment_progress = if vendor_target > Decimal::ZERO {
            round2(ratio(total_paid_to_vendor, vendor_target) * Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        };
        SettlementFigures {
            price_difference: round2(price_difference),
            price_difference_percent: round2(price_difference_percent),
            adjustment_factor: adjustment_factor.round_dp(4),
            vendor_target,
            remaining_balance,
            payment_progress,
            is_fully_paid: payment_progress >= Decimal::ONE_HUNDRED,
        }
    }

    /// Sold, something owed, and not yet fully paid out.
    pub fn awaits_payout(&self, rule: PayoutReadiness) -> bool {
        match rule {
            PayoutReadiness::FullSettlement => {
                self.vendor_target > Decimal::ZERO && !self.is_fully_paid
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementFigures {
    pub price_difference: Decimal,
    pub price_difference_percent: Decimal,
    pub adjustment_factor: Decimal,
    pub vendor_target: Decimal,
    pub remaining_balance: Decimal,
    pub payment_progress: Decimal,
    pub is_fully_paid: bool,
}

/// Result of recording a client payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: Uuid,
    pub item_status: ItemStatus,
    pub total_paid: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment: Option<InstallmentAdvance>,
}

pub struct SettlementService;

impl SettlementService {
    /// Settlement for a sold item.
    pub fn settlement_for_item(ledger: &Ledger, item_id: Uuid) -> CoreResult<Settlement> {
        let item = ledger.item(item_id).ok_or(CoreError::ItemNotFound(item_id))?;
        if !item.is_sold() {
            return Err(CoreError::InvalidOperation(format!(
                "item `{}` is {} and has no settlement yet",
                item.title, item.status
            )));
        }
        Ok(Self::settle(ledger, item))
    }

    /// Sold items awaiting payout under the filter's readiness rule, largest
    /// remaining balance first.
    pub fn pending_settlements(ledger: &Ledger, filter: &ReportFilter) -> CoreResult<Vec<Settlement>> {
        let predicate = filter.build()?.without_dates();
        Ok(Self::pending_settlements_for(ledger, &predicate))
    }

    pub fn pending_settlements_for(ledger: &Ledger, predicate: &FilterPredicate) -> Vec<Settlement> {
        let rule = predicate.payout_readiness();
        let mut pending: Vec<Settlement> = predicate
            .matching_items(ledger)
            .filter(|item| item.is_sold())
            .map(|item| Self::settle(ledger, item))
            .filter(|settlement| settlement.awaits_payout(rule))
            .collect();
        pending.sort_by(|a, b| {
            b.remaining_balance
                .cmp(&a.remaining_balance)
                .then_with(|| a.title.cmp(&b.title))
        });
        pending
    }

    /// Appends a client payment, promotes the item's status and advances the
    /// client's active installment plan for the item, all or nothing.
    pub fn record_client_payment(
        ledger: &mut Ledger,
        item_id: Uuid,
        client_id: Uuid,
        amount: Decimal,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> CoreResult<PaymentReceipt> {
        ensure_positive(amount)?;
        let receipt = transact(ledger, |ledger| {
            ledger.client(client_id).ok_or(CoreError::ClientNotFound(client_id))?;
            let item = ledger.item(item_id).ok_or(CoreError::ItemNotFound(item_id))?;
            if item.status == ItemStatus::Returned {
                return Err(CoreError::InvalidOperation(format!(
                    "item `{}` was returned to its vendor",
                    item.title
                )));
            }
            let payment = ClientPayment::new(item_id, client_id, amount, method, paid_at);
            let payment_id = ledger.add_client_payment(payment);
            let total_paid = ledger.total_paid_by_clients(item_id);

            let item = ledger.item_mut(item_id).ok_or(CoreError::ItemNotFound(item_id))?;
            promote_status(item, total_paid);
            let item_status = item.status;

            let installment = ledger
                .installment_plans
                .iter_mut()
                .find(|plan| plan.item_id == item_id && plan.client_id == client_id && plan.is_active())
                .map(|plan| plan.apply_payment(amount));

            Ok(PaymentReceipt {
                payment_id,
                item_status,
                total_paid,
                installment,
            })
        })?;
        info!(
            %item_id,
            %client_id,
            %amount,
            status = %receipt.item_status,
            "recorded client payment"
        );
        Ok(receipt)
    }

    /// Appends a payout to the item's vendor and returns the updated settlement.
    pub fn record_vendor_payout(
        ledger: &mut Ledger,
        item_id: Uuid,
        vendor_id: Uuid,
        amount: Decimal,
        paid_at: DateTime<Utc>,
    ) -> CoreResult<Settlement> {
        ensure_positive(amount)?;
        let settlement = transact(ledger, |ledger| {
            ledger.vendor(vendor_id).ok_or(CoreError::VendorNotFound(vendor_id))?;
            let item = ledger.item(item_id).ok_or(CoreError::ItemNotFound(item_id))?;
            if item.vendor_id != vendor_id {
                return Err(CoreError::InvalidOperation(format!(
                    "item `{}` was not consigned by vendor {vendor_id}",
                    item.title
                )));
            }
            if !item.is_sold() {
                return Err(CoreError::InvalidOperation(format!(
                    "item `{}` is {} and cannot be settled",
                    item.title, item.status
                )));
            }
            ledger.add_vendor_payout(VendorPayout::new(item_id, vendor_id, amount, paid_at));
            Self::settlement_for_item(ledger, item_id)
        })?;
        info!(
            %item_id,
            %vendor_id,
            %amount,
            remaining = %settlement.remaining_balance,
            "recorded vendor payout"
        );
        Ok(settlement)
    }

    /// Hands an unsold item back to its vendor.
    pub fn mark_returned(ledger: &mut Ledger, item_id: Uuid) -> CoreResult<()> {
        let item = ledger.item_mut(item_id).ok_or(CoreError::ItemNotFound(item_id))?;
        if item.is_sold() {
            return Err(CoreError::InvalidOperation(format!(
                "item `{}` is sold and cannot be returned",
                item.title
            )));
        }
        item.status = ItemStatus::Returned;
        ledger.touch();
        info!(%item_id, "item returned to vendor");
        Ok(())
    }

    fn settle(ledger: &Ledger, item: &Item) -> Settlement {
        let max_sales_price = item.max_sales_price.or(item.min_sales_price).unwrap_or(Decimal::ZERO);
        let max_cost = item.max_cost.or(item.min_cost).unwrap_or(Decimal::ZERO);
        let actual_sale_price = ledger.total_paid_by_clients(item.id);
        let total_paid_to_vendor = ledger.total_paid_to_vendor(item.id);
        let figures = Settlement::compute(max_sales_price, actual_sale_price, max_cost, total_paid_to_vendor);
        Settlement {
            item_id: item.id,
            vendor_id: item.vendor_id,
            title: item.title.clone(),
            max_sales_price,
            actual_sale_price,
            max_cost,
            price_difference: figures.price_difference,
            price_difference_percent: figures.price_difference_percent,
            adjustment_factor: figures.adjustment_factor,
            vendor_target: figures.vendor_target,
            total_paid_to_vendor,
            remaining_balance: figures.remaining_balance,
            payment_progress: figures.payment_progress,
            is_fully_paid: figures.is_fully_paid,
        }
    }
}

// in-store -> reserved on the first payment, -> sold once the sale price is covered.
fn promote_status(item: &mut Item, total_paid: Decimal) {
    if item.status == ItemStatus::InStore {
        item.status = ItemStatus::Reserved;
    }
    if item.status == ItemStatus::Reserved
        && item.settlement_price().is_some_and(|price| total_paid >= price)
    {
        item.status = ItemStatus::Sold;
    }
}

fn ensure_positive(amount: Decimal) -> CoreResult<()> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}
