//! Installment scheduler.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use consign_domain::{InstallmentAdvance, InstallmentFrequency, InstallmentPlan, Ledger};

use crate::{filter::FilterPredicate, mutation::transact, CoreError, CoreResult};

/// Active obligations split by whether they are already due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentCounts {
    pub active: usize,
    pub pending: usize,
    pub overdue: usize,
}

/// Terms for a new plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTerms {
    pub item_id: Uuid,
    pub client_id: Uuid,
    pub total_amount: Decimal,
    pub installment_amount: Decimal,
    pub frequency: InstallmentFrequency,
    pub first_due_date: NaiveDate,
}

pub struct InstallmentService;

impl InstallmentService {
    pub fn create_plan(
        ledger: &mut Ledger,
        terms: PlanTerms,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Uuid> {
        if terms.total_amount <= Decimal::ZERO || terms.installment_amount <= Decimal::ZERO {
            return Err(CoreError::Validation(
                "installment amounts must be positive".into(),
            ));
        }
        if terms.installment_amount > terms.total_amount {
            return Err(CoreError::Validation(
                "installment amount exceeds the plan total".into(),
            ));
        }
        ledger
            .client(terms.client_id)
            .ok_or(CoreError::ClientNotFound(terms.client_id))?;
        let item = ledger
            .item(terms.item_id)
            .ok_or(CoreError::ItemNotFound(terms.item_id))?;
        if !item.is_unsold() {
            return Err(CoreError::InvalidOperation(format!(
                "item `{}` is {} and cannot be put on a plan",
                item.title, item.status
            )));
        }
        if ledger
            .installment_plans
            .iter()
            .any(|plan| plan.item_id == terms.item_id && plan.is_active())
        {
            return Err(CoreError::InvalidOperation(format!(
                "item `{}` already has an active installment plan",
                item.title
            )));
        }
        let plan = InstallmentPlan::new(
            terms.item_id,
            terms.client_id,
            terms.total_amount,
            terms.installment_amount,
            terms.frequency,
            terms.first_due_date,
            created_at,
        );
        let id = ledger.add_installment_plan(plan);
        info!(plan_id = %id, item_id = %terms.item_id, "created installment plan");
        Ok(id)
    }

    /// Applies a payment to the plan without recording a client payment.
    pub fn apply_payment(
        ledger: &mut Ledger,
        plan_id: Uuid,
        amount: Decimal,
    ) -> CoreResult<InstallmentAdvance> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::Validation("payment amount must be positive".into()));
        }
        let advance = transact(ledger, |ledger| {
            let plan = ledger
                .installment_plan_mut(plan_id)
                .ok_or(CoreError::InstallmentPlanNotFound(plan_id))?;
            if !plan.is_active() {
                return Err(CoreError::InvalidOperation(format!(
                    "installment plan {plan_id} is already completed"
                )));
            }
            Ok(plan.apply_payment(amount))
        })?;
        info!(%plan_id, outcome = ?advance, "applied installment payment");
        Ok(advance)
    }

    /// Active plans due after `today` and within `window_days`, soonest first.
    pub fn upcoming(ledger: &Ledger, today: NaiveDate, window_days: u32) -> Vec<&InstallmentPlan> {
        let mut plans: Vec<_> = ledger
            .installment_plans
            .iter()
            .filter(|plan| plan.is_upcoming(today, window_days))
            .collect();
        plans.sort_by_key(|plan| (plan.next_due_date, plan.id));
        plans
    }

    /// Active plans due on or before `today`, oldest first.
    pub fn overdue(ledger: &Ledger, today: NaiveDate) -> Vec<&InstallmentPlan> {
        let mut plans: Vec<_> = ledger
            .installment_plans
            .iter()
            .filter(|plan| plan.is_overdue(today))
            .collect();
        plans.sort_by_key(|plan| (plan.next_due_date, plan.id));
        plans
    }

    /// Counts active plans whose item passes the dimension filters.
    pub fn counts(ledger: &Ledger, predicate: &FilterPredicate, today: NaiveDate) -> InstallmentCounts {
        let mut counts = InstallmentCounts::default();
        for plan in ledger.installment_plans.iter().filter(|plan| plan.is_active()) {
            let in_scope = !predicate.has_dimension_filters()
                || ledger
                    .item(plan.item_id)
                    .is_some_and(|item| predicate.matches_item(item));
            if !in_scope {
                continue;
            }
            counts.active += 1;
            if plan.is_overdue(today) {
                counts.overdue += 1;
            } else {
                counts.pending += 1;
            }
        }
        counts
    }

    pub fn mark_reminder_sent(ledger: &mut Ledger, plan_id: Uuid) -> CoreResult<()> {
        let plan = ledger
            .installment_plan_mut(plan_id)
            .ok_or(CoreError::InstallmentPlanNotFound(plan_id))?;
        if !plan.is_active() {
            return Err(CoreError::InvalidOperation(format!(
                "installment plan {plan_id} is already completed"
            )));
        }
        plan.reminder_sent = true;
        ledger.touch();
        Ok(())
    }

    /// Upcoming plans that have not had a reminder yet.
    pub fn reminders_due(ledger: &Ledger, today: NaiveDate, window_days: u32) -> Vec<&InstallmentPlan> {
        Self::upcoming(ledger, today, window_days)
            .into_iter()
            .filter(|plan| !plan.reminder_sent)
            .collect()
    }
}
