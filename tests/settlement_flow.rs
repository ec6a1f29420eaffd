mod common;

use rust_decimal_macros::dec;

use common::{at, day, seeded_home, storage_in, LEDGER_NAME};
use consign_core::domain::{InstallmentAdvance, InstallmentFrequency, ItemStatus, PaymentMethod};
use consign_core::engine::{
    CoreError, InstallmentService, LedgerStorage, PlanTerms, ReportFilter, SettlementService,
};

#[test]
fn payout_settles_item_and_survives_reload() {
    let (home, shop) = seeded_home();
    let storage = storage_in(&home);
    let mut ledger = storage.load_ledger(LEDGER_NAME).unwrap();

    let settlement = SettlementService::record_vendor_payout(
        &mut ledger,
        shop.birkin,
        shop.ana,
        dec!(5400),
        at(2024, 3, 28),
    )
    .unwrap();
    assert!(settlement.is_fully_paid);
    assert_eq!(settlement.remaining_balance, dec!(0));
    storage.save_ledger(LEDGER_NAME, &ledger).unwrap();

    let reloaded = storage.load_ledger(LEDGER_NAME).unwrap();
    let pending = SettlementService::pending_settlements(&reloaded, &ReportFilter::new()).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].item_id, shop.flap);
    assert_eq!(storage.list_backups(LEDGER_NAME).unwrap().len(), 1);
}

#[test]
fn refused_payout_leaves_stored_ledger_untouched() {
    let (home, shop) = seeded_home();
    let storage = storage_in(&home);
    let mut ledger = storage.load_ledger(LEDGER_NAME).unwrap();
    let before = serde_json::to_value(&ledger).unwrap();

    let err = SettlementService::record_vendor_payout(
        &mut ledger,
        shop.birkin,
        shop.bruno,
        dec!(100),
        at(2024, 3, 28),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
    assert_eq!(serde_json::to_value(&ledger).unwrap(), before);

    let err = SettlementService::record_vendor_payout(
        &mut ledger,
        shop.wallet,
        shop.bruno,
        dec!(100),
        at(2024, 3, 28),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
    assert_eq!(serde_json::to_value(&ledger).unwrap(), before);
}

#[test]
fn installment_sale_promotes_wallet_to_sold() {
    let (home, shop) = seeded_home();
    let storage = storage_in(&home);
    let mut ledger = storage.load_ledger(LEDGER_NAME).unwrap();

    let plan_id = InstallmentService::create_plan(
        &mut ledger,
        PlanTerms {
            item_id: shop.wallet,
            client_id: shop.duarte,
            total_amount: dec!(1400),
            installment_amount: dec!(700),
            frequency: InstallmentFrequency::Monthly,
            first_due_date: day(2024, 4, 1),
        },
        at(2024, 3, 30),
    )
    .unwrap();

    let first = SettlementService::record_client_payment(
        &mut ledger,
        shop.wallet,
        shop.duarte,
        dec!(700),
        PaymentMethod::Card,
        at(2024, 4, 1),
    )
    .unwrap();
    assert_eq!(first.item_status, ItemStatus::Reserved);
    assert_eq!(
        first.installment,
        Some(InstallmentAdvance::Advanced {
            next_due: day(2024, 5, 1)
        })
    );
    storage.save_ledger(LEDGER_NAME, &ledger).unwrap();

    let mut ledger = storage.load_ledger(LEDGER_NAME).unwrap();
    let second = SettlementService::record_client_payment(
        &mut ledger,
        shop.wallet,
        shop.duarte,
        dec!(700),
        PaymentMethod::Card,
        at(2024, 5, 1),
    )
    .unwrap();
    assert_eq!(second.item_status, ItemStatus::Sold);
    assert_eq!(second.installment, Some(InstallmentAdvance::Completed));
    assert!(!ledger.installment_plan(plan_id).unwrap().is_active());

    let settlement = SettlementService::settlement_for_item(&ledger, shop.wallet).unwrap();
    assert_eq!(settlement.actual_sale_price, dec!(1400));
    assert!(!settlement.is_fully_paid);
}
