//! Shared boutique ledger for engine tests.
//!
//! March 2024 is the reporting month; the clock sits at 2024-03-31.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use consign_domain::{
    Brand, Category, Client, ClientPayment, DateRange, Expense, ExpenseKind, InstallmentFrequency,
    InstallmentPlan, Item, ItemStatus, Ledger, PaymentMethod, Vendor, VendorPayout,
};

use crate::time::FixedClock;

pub struct Boutique {
    pub ledger: Ledger,
    pub ana: Uuid,
    pub bruno: Uuid,
    pub hermes: Uuid,
    pub chanel: Uuid,
    pub bags: Uuid,
    pub jewelry: Uuid,
    pub carla: Uuid,
    pub duarte: Uuid,
    pub eva: Uuid,
    pub birkin: Uuid,
    pub flap: Uuid,
    pub necklace: Uuid,
    pub wallet: Uuid,
    pub evelyne: Uuid,
    pub scarf: Uuid,
    pub necklace_plan: Uuid,
    pub wallet_plan: Uuid,
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 14, 30, 0).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn march() -> DateRange {
    DateRange::new(day(2024, 3, 1), day(2024, 3, 31)).unwrap()
}

pub fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 3, 31, 18, 0, 0).unwrap())
}

pub fn boutique() -> Boutique {
    let mut ledger = Ledger::new("Boutique");
    let ana = ledger.add_vendor(Vendor::new("Ana"));
    let bruno = ledger.add_vendor(Vendor::new("Bruno"));
    let hermes = ledger.add_brand(Brand::new("Hermes"));
    let chanel = ledger.add_brand(Brand::new("Chanel"));
    let bags = ledger.add_category(Category::new("Bags"));
    let jewelry = ledger.add_category(Category::new("Jewelry"));
    let carla = ledger.add_client(Client::new("Carla"));
    let duarte = ledger.add_client(Client::new("Duarte"));
    let eva = ledger.add_client(Client::new("Eva"));

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
    let necklace = ledger.add_item(
        Item::new("Pearl Necklace", ana, chanel, jewelry, at(2024, 3, 1))
            .with_cost_range(dec!(800), dec!(1000))
            .with_price_range(dec!(1500), dec!(1800))
            .with_status(ItemStatus::Reserved),
    );
    let mut wallet = Item::new("Kelly Wallet", bruno, hermes, bags, at(2023, 8, 1))
        .with_price_range(dec!(1400), dec!(1600));
    wallet.min_cost = Some(dec!(900));
    let wallet = ledger.add_item(wallet);
    let mut evelyne = Item::new("Evelyne", ana, hermes, bags, at(2024, 2, 1))
        .with_price_range(dec!(1800), dec!(2000))
        .with_status(ItemStatus::Sold);
    evelyne.max_cost = Some(dec!(1200));
    let evelyne = ledger.add_item(evelyne);
    let mut scarf = Item::new("Silk Scarf", bruno, hermes, jewelry, at(2024, 1, 10))
        .with_status(ItemStatus::Returned);
    scarf.min_cost = Some(dec!(200));
    let scarf = ledger.add_item(scarf);

    for (item, client, amount, paid_at) in [
        (birkin, carla, dec!(5000), at(2024, 3, 2)),
        (birkin, carla, dec!(4000), at(2024, 3, 20)),
        (flap, duarte, dec!(5200), at(2024, 3, 10)),
        (necklace, carla, dec!(500), at(2024, 3, 15)),
        (evelyne, eva, dec!(1900), at(2024, 2, 20)),
    ] {
        ledger.add_client_payment(ClientPayment::new(
            item,
            client,
            amount,
            PaymentMethod::Card,
            paid_at,
        ));
    }

    ledger.add_vendor_payout(VendorPayout::new(flap, bruno, dec!(2000), at(2024, 3, 25)));

    ledger.add_expense(Expense::new(dec!(150), ExpenseKind::Shipping, at(2024, 3, 5)));
    ledger.add_expense(Expense::new(dec!(80), ExpenseKind::Cleaning, at(2024, 3, 12)).for_item(birkin));
    ledger.add_expense(Expense::new(dec!(1000), ExpenseKind::Rent, at(2024, 2, 15)));

    let mut necklace_plan = InstallmentPlan::new(
        necklace,
        carla,
        dec!(1500),
        dec!(300),
        InstallmentFrequency::Monthly,
        day(2024, 3, 25),
        at(2024, 3, 15),
    );
    necklace_plan.remaining_amount = dec!(1000);
    let necklace_plan = ledger.add_installment_plan(necklace_plan);
    let wallet_plan = ledger.add_installment_plan(InstallmentPlan::new(
        wallet,
        duarte,
        dec!(1400),
        dec!(350),
        InstallmentFrequency::Weekly,
        day(2024, 4, 5),
        at(2024, 3, 29),
    ));

    Boutique {
        ledger,
        ana,
        bruno,
        hermes,
        chanel,
        bags,
        jewelry,
        carla,
        duarte,
        eva,
        birkin,
        flap,
        necklace,
        wallet,
        evelyne,
        scarf,
        necklace_plan,
        wallet_plan,
    }
}
