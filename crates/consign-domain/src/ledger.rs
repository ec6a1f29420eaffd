use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dimension::{Brand, Category, Client, Vendor},
    installment::InstallmentPlan,
    item::Item,
    payment::{ClientPayment, Expense, VendorPayout},
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Persisted record of a consignment shop: dimensions, inventory and every
/// money movement. Facts are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub brands: Vec<Brand>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub client_payments: Vec<ClientPayment>,
    #[serde(default)]
    pub vendor_payouts: Vec<VendorPayout>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub installment_plans: Vec<InstallmentPlan>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Ledger {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            brands: Vec::new(),
            categories: Vec::new(),
            vendors: Vec::new(),
            clients: Vec::new(),
            items: Vec::new(),
            client_payments: Vec::new(),
            vendor_payouts: Vec::new(),
            expenses: Vec::new(),
            installment_plans: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_brand(&mut self, brand: Brand) -> Uuid {
        let id = brand.id;
        self.brands.push(brand);
        self.touch();
        id
    }

    pub fn add_category(&mut self, category: Category) -> Uuid {
        let id = category.id;
        self.categories.push(category);
        self.touch();
        id
    }

    pub fn add_vendor(&mut self, vendor: Vendor) -> Uuid {
        let id = vendor.id;
        self.vendors.push(vendor);
        self.touch();
        id
    }

    pub fn add_client(&mut self, client: Client) -> Uuid {
        let id = client.id;
        self.clients.push(client);
        self.touch();
        id
    }

    pub fn add_item(&mut self, item: Item) -> Uuid {
        let id = item.id;
        self.items.push(item);
        self.touch();
        id
    }

    pub fn add_client_payment(&mut self, payment: ClientPayment) -> Uuid {
        let id = payment.id;
        self.client_payments.push(payment);
        self.touch();
        id
    }

    pub fn add_vendor_payout(&mut self, payout: VendorPayout) -> Uuid {
        let id = payout.id;
        self.vendor_payouts.push(payout);
        self.touch();
        id
    }

    pub fn add_expense(&mut self, expense: Expense) -> Uuid {
        let id = expense.id;
        self.expenses.push(expense);
        self.touch();
        id
    }

    pub fn add_installment_plan(&mut self, plan: InstallmentPlan) -> Uuid {
        let id = plan.id;
        self.installment_plans.push(plan);
        self.touch();
        id
    }

    pub fn item(&self, id: Uuid) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn item_mut(&mut self, id: Uuid) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn vendor(&self, id: Uuid) -> Option<&Vendor> {
        self.vendors.iter().find(|vendor| vendor.id == id)
    }

    pub fn client(&self, id: Uuid) -> Option<&Client> {
        self.clients.iter().find(|client| client.id == id)
    }

    pub fn brand(&self, id: Uuid) -> Option<&Brand> {
        self.brands.iter().find(|brand| brand.id == id)
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn installment_plan(&self, id: Uuid) -> Option<&InstallmentPlan> {
        self.installment_plans.iter().find(|plan| plan.id == id)
    }

    pub fn installment_plan_mut(&mut self, id: Uuid) -> Option<&mut InstallmentPlan> {
        self.installment_plans.iter_mut().find(|plan| plan.id == id)
    }

    pub fn payments_for_item(&self, item_id: Uuid) -> impl Iterator<Item = &ClientPayment> {
        self.client_payments
            .iter()
            .filter(move |payment| payment.item_id == item_id)
    }

    pub fn payouts_for_item(&self, item_id: Uuid) -> impl Iterator<Item = &VendorPayout> {
        self.vendor_payouts
            .iter()
            .filter(move |payout| payout.item_id == item_id)
    }

    /// Sum of every client payment ever made for the item.
    pub fn total_paid_by_clients(&self, item_id: Uuid) -> Decimal {
        self.payments_for_item(item_id).map(|p| p.amount).sum()
    }

    /// Sum of every payout made to the vendor for the item.
    pub fn total_paid_to_vendor(&self, item_id: Uuid) -> Decimal {
        self.payouts_for_item(item_id).map(|p| p.amount).sum()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
