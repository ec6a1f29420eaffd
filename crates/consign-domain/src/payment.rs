//! Append-only money movements: client payments, vendor payouts and expenses.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// Money received from a buyer towards one item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientPayment {
    pub id: Uuid,
    pub item_id: Uuid,
    pub client_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ClientPayment {
    pub fn new(
        item_id: Uuid,
        client_id: Uuid,
        amount: Decimal,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            client_id,
            amount,
            method,
            paid_at,
            notes: None,
        }
    }
}

impl Identifiable for ClientPayment {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for ClientPayment {
    fn display_label(&self) -> String {
        format!("payment:{} {} via {}", self.id, self.amount, self.method)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Check,
    Other,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank-transfer",
            PaymentMethod::Check => "check",
            PaymentMethod::Other => "other",
        };
        f.write_str(label)
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "bank-transfer" | "transfer" | "wire" => Ok(PaymentMethod::BankTransfer),
            "check" | "cheque" => Ok(PaymentMethod::Check),
            "other" => Ok(PaymentMethod::Other),
            other => Err(format!("unknown payment method `{other}`")),
        }
    }
}

/// Money paid out to the consignor of an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorPayout {
    pub id: Uuid,
    pub item_id: Uuid,
    pub vendor_id: Uuid,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl VendorPayout {
    pub fn new(item_id: Uuid, vendor_id: Uuid, amount: Decimal, paid_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            vendor_id,
            amount,
            paid_at,
            notes: None,
        }
    }
}

impl Identifiable for VendorPayout {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Business cost, optionally attributed to a single item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub amount: Decimal,
    pub incurred_at: DateTime<Utc>,
    pub kind: ExpenseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Expense {
    pub fn new(amount: Decimal, kind: ExpenseKind, incurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            incurred_at,
            kind,
            item_id: None,
            description: None,
        }
    }

    pub fn for_item(mut self, item_id: Uuid) -> Self {
        self.item_id = Some(item_id);
        self
    }
}

impl Identifiable for Expense {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ExpenseKind {
    Authentication,
    Cleaning,
    Repair,
    Shipping,
    Marketing,
    Rent,
    Other,
}

impl fmt::Display for ExpenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExpenseKind::Authentication => "Authentication",
            ExpenseKind::Cleaning => "Cleaning",
            ExpenseKind::Repair => "Repair",
            ExpenseKind::Shipping => "Shipping",
            ExpenseKind::Marketing => "Marketing",
            ExpenseKind::Rent => "Rent",
            ExpenseKind::Other => "Other",
        };
        f.write_str(label)
    }
}
