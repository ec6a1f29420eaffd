//! Recurring payment obligations tied to a single item sale.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// Schedule a client follows to pay an item off over time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallmentPlan {
    pub id: Uuid,
    pub item_id: Uuid,
    pub client_id: Uuid,
    pub total_amount: Decimal,
    pub installment_amount: Decimal,
    pub frequency: InstallmentFrequency,
    pub next_due_date: NaiveDate,
    pub remaining_amount: Decimal,
    pub status: InstallmentStatus,
    #[serde(default)]
    pub reminder_sent: bool,
    #[serde(default)]
    pub payments_applied: u32,
    pub created_at: DateTime<Utc>,
}

/// Outcome of applying one payment to a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentAdvance {
    Completed,
    Advanced { next_due: NaiveDate },
}

impl InstallmentPlan {
    pub fn new(
        item_id: Uuid,
        client_id: Uuid,
        total_amount: Decimal,
        installment_amount: Decimal,
        frequency: InstallmentFrequency,
        first_due_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            client_id,
            total_amount,
            installment_amount,
            frequency,
            next_due_date: first_due_date,
            remaining_amount: total_amount,
            status: InstallmentStatus::Active,
            reminder_sent: false,
            payments_applied: 0,
            created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == InstallmentStatus::Active
    }

    /// Active and due on or before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && self.next_due_date <= today
    }

    /// Active and due after `today` but no later than `today + window_days`.
    /// A window running past the last representable date has no upper bound.
    pub fn is_upcoming(&self, today: NaiveDate, window_days: u32) -> bool {
        let within_window = today
            .checked_add_signed(Duration::days(i64::from(window_days)))
            .map_or(true, |horizon| self.next_due_date <= horizon);
        self.is_active() && self.next_due_date > today && within_window
    }

    /// Applies one installment payment. The plan completes when the scheduled
    /// installment covers what was outstanding (`remaining - installment <= 0`)
    /// or the payment clears the balance; otherwise `amount` is subtracted and
    /// the due date moves forward one period.
    /// Every applied payment clears the reminder flag.
    pub fn apply_payment(&mut self, amount: Decimal) -> InstallmentAdvance {
        self.reminder_sent = false;
        self.payments_applied += 1;
        let remaining = self.remaining_amount - amount;
        let final_installment = self.remaining_amount - self.installment_amount <= Decimal::ZERO;
        if final_installment || remaining <= Decimal::ZERO {
            self.remaining_amount = Decimal::ZERO;
            self.status = InstallmentStatus::Completed;
            return InstallmentAdvance::Completed;
        }
        self.remaining_amount = remaining;
        self.next_due_date = self.frequency.next_date(self.next_due_date);
        InstallmentAdvance::Advanced {
            next_due: self.next_due_date,
        }
    }
}

impl Identifiable for InstallmentPlan {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for InstallmentPlan {
    fn display_label(&self) -> String {
        format!(
            "plan:{} {} every {} due {}",
            self.id, self.installment_amount, self.frequency, self.next_due_date
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentFrequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
}

impl InstallmentFrequency {
    /// Due date one period after `date`; months clamp to the month end.
    pub fn next_date(&self, date: NaiveDate) -> NaiveDate {
        match self {
            InstallmentFrequency::Weekly => date + Duration::days(7),
            InstallmentFrequency::Biweekly => date + Duration::days(14),
            InstallmentFrequency::Monthly => shift_month(date, 1),
            InstallmentFrequency::Quarterly => shift_month(date, 3),
        }
    }
}

impl fmt::Display for InstallmentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallmentFrequency::Weekly => "week",
            InstallmentFrequency::Biweekly => "two weeks",
            InstallmentFrequency::Monthly => "month",
            InstallmentFrequency::Quarterly => "quarter",
        };
        f.write_str(label)
    }
}

impl FromStr for InstallmentFrequency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(InstallmentFrequency::Weekly),
            "biweekly" => Ok(InstallmentFrequency::Biweekly),
            "monthly" => Ok(InstallmentFrequency::Monthly),
            "quarterly" => Ok(InstallmentFrequency::Quarterly),
            other => Err(format!("unknown installment frequency `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Active,
    Completed,
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallmentStatus::Active => f.write_str("active"),
            InstallmentStatus::Completed => f.write_str("completed"),
        }
    }
}
