#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_decimal_macros::dec;
use tempfile::TempDir;
use uuid::Uuid;

use consign_core::domain::{
    Brand, Category, Client, ClientPayment, Expense, ExpenseKind, Item, ItemStatus, Ledger,
    PaymentMethod, Vendor, VendorPayout,
};
use consign_core::engine::{FixedClock, LedgerStorage};
use consign_core::storage::{JsonLedgerStorage, StoragePaths};

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub const LEDGER_NAME: &str = "boutique";

/// Fresh directory that outlives the calling test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// JSON storage rooted the same way the CLI roots `CONSIGN_CORE_HOME`.
pub fn storage_in(home: &std::path::Path) -> JsonLedgerStorage {
    JsonLedgerStorage::with_retention(
        StoragePaths {
            ledger_root: home.join("ledgers"),
            backup_root: home.join("backups"),
        },
        3,
    )
    .expect("create json storage backend")
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 14, 30, 0).unwrap()
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn end_of_march() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 3, 31, 18, 0, 0).unwrap())
}

pub struct Shop {
    pub ledger: Ledger,
    pub ana: Uuid,
    pub bruno: Uuid,
    pub carla: Uuid,
    pub duarte: Uuid,
    pub birkin: Uuid,
    pub flap: Uuid,
    pub wallet: Uuid,
}

/// Two March sales and one unsold wallet:
/// Birkin 30 (Ana, Hermes) paid 5000 + 4000 by Carla,
/// Classic Flap (Bruno, Chanel) paid 5200 by Duarte with 2000 already paid out,
/// Kelly Wallet (Bruno, Hermes) in store.
pub fn shop() -> Shop {
    let mut ledger = Ledger::new("Boutique");
    let ana = ledger.add_vendor(Vendor::new("Ana"));
    let bruno = ledger.add_vendor(Vendor::new("Bruno"));
    let hermes = ledger.add_brand(Brand::new("Hermes"));
    let chanel = ledger.add_brand(Brand::new("Chanel"));
    let bags = ledger.add_category(Category::new("Bags"));
    let carla = ledger.add_client(Client::new("Carla"));
    let duarte = ledger.add_client(Client::new("Duarte"));

    let birkin = ledger.add_item(
        Item::new("Birkin 30", ana, hermes, bags, at(2024, 1, 5))
            .with_cost_range(dec!(5000), dec!(6000))
            .with_price_range(dec!(9000), dec!(10000))
            .with_status(ItemStatus::Sold),
    );
    let flap = ledger.add_item(
        Item::new("Classic Flap", bruno, chanel, bags, at(2023, 12, 1))
            .with_cost_range(dec!(3000), dec!(3500))
            .with_price_range(dec!(5000), dec!(5500))
            .with_status(ItemStatus::Sold),
    );
    let mut wallet = Item::new("Kelly Wallet", bruno, hermes, bags, at(2023, 8, 1))
        .with_price_range(dec!(1400), dec!(1600));
    wallet.min_cost = Some(dec!(900));
    let wallet = ledger.add_item(wallet);

    ledger.add_client_payment(ClientPayment::new(
        birkin,
        carla,
        dec!(5000),
        PaymentMethod::BankTransfer,
        at(2024, 3, 2),
    ));
    ledger.add_client_payment(ClientPayment::new(
        birkin,
        carla,
        dec!(4000),
        PaymentMethod::Card,
        at(2024, 3, 20),
    ));
    ledger.add_client_payment(ClientPayment::new(
        flap,
        duarte,
        dec!(5200),
        PaymentMethod::Cash,
        at(2024, 3, 10),
    ));
    ledger.add_vendor_payout(VendorPayout::new(flap, bruno, dec!(2000), at(2024, 3, 25)));
    ledger.add_expense(Expense::new(dec!(150), ExpenseKind::Shipping, at(2024, 3, 5)));

    Shop {
        ledger,
        ana,
        bruno,
        carla,
        duarte,
        birkin,
        flap,
        wallet,
    }
}

/// Saves the shop ledger under [`LEDGER_NAME`] in a fresh home directory.
pub fn seeded_home() -> (PathBuf, Shop) {
    let home = temp_home();
    let shop = shop();
    storage_in(&home)
        .save_ledger(LEDGER_NAME, &shop.ledger)
        .expect("seed ledger");
    (home, shop)
}
