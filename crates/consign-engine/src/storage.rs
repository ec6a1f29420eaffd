use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use consign_domain::Ledger;

use crate::CoreResult;

/// Describes a persisted backup artifact for a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerBackupInfo {
    pub ledger: String,
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Persistence backend for named ledgers and their backups.
pub trait LedgerStorage: Send + Sync {
    fn save_ledger(&self, name: &str, ledger: &Ledger) -> CoreResult<()>;
    fn load_ledger(&self, name: &str) -> CoreResult<Ledger>;
    fn list_ledgers(&self) -> CoreResult<Vec<String>>;
    fn save_ledger_to_path(&self, ledger: &Ledger, path: &Path) -> CoreResult<()>;
    fn load_ledger_from_path(&self, path: &Path) -> CoreResult<Ledger>;
    fn backup_ledger(
        &self,
        name: &str,
        ledger: &Ledger,
        note: Option<&str>,
    ) -> CoreResult<LedgerBackupInfo>;
    fn list_backups(&self, name: &str) -> CoreResult<Vec<LedgerBackupInfo>>;
    fn restore_backup(&self, backup: &LedgerBackupInfo) -> CoreResult<Ledger>;
}

/// Lists dangling references in a ledger snapshot. Reports skip these rows
/// (or file them under "Unknown"), so loaders surface them to the user.
pub fn ledger_warnings(ledger: &Ledger) -> Vec<String> {
    let items: HashSet<_> = ledger.items.iter().map(|i| i.id).collect();
    let vendors: HashSet<_> = ledger.vendors.iter().map(|v| v.id).collect();
    let clients: HashSet<_> = ledger.clients.iter().map(|c| c.id).collect();
    let brands: HashSet<_> = ledger.brands.iter().map(|b| b.id).collect();
    let categories: HashSet<_> = ledger.categories.iter().map(|c| c.id).collect();
    let mut warnings = Vec::new();

    for item in &ledger.items {
        if !vendors.contains(&item.vendor_id) {
            warnings.push(format!("item {} references unknown vendor {}", item.id, item.vendor_id));
        }
        if !brands.contains(&item.brand_id) {
            warnings.push(format!("item {} references unknown brand {}", item.id, item.brand_id));
        }
        if !categories.contains(&item.category_id) {
            warnings.push(format!(
                "item {} references unknown category {}",
                item.id, item.category_id
            ));
        }
        if let (Some(min), Some(max)) = (item.min_cost, item.max_cost) {
            if min > max {
                warnings.push(format!("item {} has min cost above max cost", item.id));
            }
        }
        if let (Some(min), Some(max)) = (item.min_sales_price, item.max_sales_price) {
            if min > max {
                warnings.push(format!("item {} has min sale price above max sale price", item.id));
            }
        }
    }
    for payment in &ledger.client_payments {
        if !items.contains(&payment.item_id) {
            warnings.push(format!(
                "client payment {} references missing item {}",
                payment.id, payment.item_id
            ));
        }
        if !clients.contains(&payment.client_id) {
            warnings.push(format!(
                "client payment {} references unknown client {}",
                payment.id, payment.client_id
            ));
        }
    }
    for payout in &ledger.vendor_payouts {
        if !items.contains(&payout.item_id) {
            warnings.push(format!(
                "vendor payout {} references missing item {}",
                payout.id, payout.item_id
            ));
        }
        if !vendors.contains(&payout.vendor_id) {
            warnings.push(format!(
                "vendor payout {} references unknown vendor {}",
                payout.id, payout.vendor_id
            ));
        }
    }
    for expense in &ledger.expenses {
        if let Some(item_id) = expense.item_id {
            if !items.contains(&item_id) {
                warnings.push(format!(
                    "expense {} references missing item {}",
                    expense.id, item_id
                ));
            }
        }
    }
    for plan in &ledger.installment_plans {
        if !items.contains(&plan.item_id) {
            warnings.push(format!(
                "installment plan {} references missing item {}",
                plan.id, plan.item_id
            ));
        }
        if !clients.contains(&plan.client_id) {
            warnings.push(format!(
                "installment plan {} references unknown client {}",
                plan.id, plan.client_id
            ));
        }
    }
    warnings
}
