//! Cross-service checks against the shared boutique ledger.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use consign_config::AnalyticsSettings;
use consign_domain::{DateRange, InstallmentAdvance, ItemStatus, PaymentMethod};

use crate::{
    test_support::{at, boutique, clock, day, march},
    BreakdownRequest, BreakdownService, CoreError, Dimension, DimensionService, Granularity,
    HealthService, InstallmentService, InventoryService, KpiService, Page, ProfitabilityService,
    ReportFilter, SettlementService, TrendMetric, TrendRequest, TrendService, MSG_OVERDUE,
    NO_PERFORMER,
};

#[test]
fn march_summary_matches_hand_totals() {
    let shop = boutique();
    let filter = ReportFilter::new().range(march());
    let kpi = KpiService::summary(&shop.ledger, &filter, &clock()).unwrap();

    assert_eq!(kpi.revenue, dec!(14700));
    assert_eq!(kpi.cogs, dec!(8000));
    assert_eq!(kpi.gross_profit, dec!(6700));
    assert_eq!(kpi.gross_margin, dec!(0.4558));
    assert_eq!(kpi.total_expenses, dec!(230));
    assert_eq!(kpi.net_profit, dec!(6470));
    assert_eq!(kpi.net_margin, dec!(0.4401));
    assert_eq!(kpi.items_sold, 2);
    assert_eq!(kpi.payment_count, 4);
    assert_eq!(kpi.unique_clients, 2);
    assert_eq!(kpi.average_order_value, dec!(3675));
    assert_eq!(kpi.average_days_to_sell, dec!(78.5));
    assert_eq!(kpi.inventory_turnover, dec!(4.3243));
    assert_eq!(kpi.pending_payments, 1);
    assert_eq!(kpi.overdue_payments, 1);
    assert_eq!(kpi.pending_vendor_payouts, 3);
    assert_eq!(kpi.top_performing_brand, "Hermes");
    assert_eq!(kpi.top_performing_vendor, "Ana");
}

#[test]
fn march_compares_against_previous_thirty_one_days() {
    let shop = boutique();
    let filter = ReportFilter::new().range(march());
    let comparison = KpiService::summary(&shop.ledger, &filter, &clock())
        .unwrap()
        .comparison
        .expect("ranged summary carries a comparison");

    assert_eq!(
        comparison.previous_range,
        DateRange::new(day(2024, 1, 30), day(2024, 2, 29)).unwrap()
    );
    assert_eq!(comparison.previous_revenue, dec!(1900));
    assert_eq!(comparison.previous_gross_profit, dec!(700));
    assert_eq!(comparison.revenue_change, dec!(673.68));
    assert_eq!(comparison.profit_change, dec!(857.14));
}

#[test]
fn unranged_summary_has_no_comparison() {
    let shop = boutique();
    let kpi = KpiService::summary(&shop.ledger, &ReportFilter::new(), &clock()).unwrap();
    assert!(kpi.comparison.is_none());
    assert_eq!(kpi.revenue, dec!(16600));
    assert_eq!(kpi.items_sold, 3);
}

#[test]
fn empty_range_reports_zeroes() {
    let shop = boutique();
    let quiet = DateRange::new(day(2025, 1, 1), day(2025, 1, 31)).unwrap();
    let kpi = KpiService::summary(&shop.ledger, &ReportFilter::new().range(quiet), &clock()).unwrap();

    assert_eq!(kpi.revenue, Decimal::ZERO);
    assert_eq!(kpi.gross_margin, Decimal::ZERO);
    assert_eq!(kpi.net_margin, Decimal::ZERO);
    assert_eq!(kpi.average_order_value, Decimal::ZERO);
    assert_eq!(kpi.average_days_to_sell, Decimal::ZERO);
    assert_eq!(kpi.inventory_turnover, Decimal::ZERO);
    assert_eq!(kpi.top_performing_brand, NO_PERFORMER);
    assert_eq!(kpi.top_performing_vendor, NO_PERFORMER);
}

#[test]
fn breakdown_revenue_sums_to_summary_revenue() {
    let shop = boutique();
    let filter = ReportFilter::new().range(march());
    let kpi = KpiService::summary(&shop.ledger, &filter, &clock()).unwrap();

    for dimension in Dimension::ALL {
        let rows =
            BreakdownService::breakdown(&shop.ledger, &filter, &BreakdownRequest::new(dimension))
                .unwrap();
        let total: Decimal = rows.iter().map(|row| row.revenue).sum();
        assert_eq!(total, kpi.revenue, "{dimension} rows");
        let cost: Decimal = rows.iter().map(|row| row.cost).sum();
        assert_eq!(cost, kpi.cogs, "{dimension} cost");
    }
}

#[test]
fn brand_breakdown_ranks_by_revenue() {
    let shop = boutique();
    let filter = ReportFilter::new().range(march());
    let rows = BreakdownService::breakdown(
        &shop.ledger,
        &filter,
        &BreakdownRequest::new(Dimension::Brand),
    )
    .unwrap();

    assert_eq!(rows.len(), 2);
    let hermes = &rows[0];
    assert_eq!(hermes.id, shop.hermes);
    assert_eq!(hermes.revenue, dec!(9000));
    assert_eq!(hermes.cost, dec!(5000));
    assert_eq!(hermes.profit, dec!(4000));
    assert_eq!(hermes.item_count, 1);
    assert_eq!(hermes.payment_count, 2);
    assert_eq!(hermes.avg_order_value, dec!(4500));
    assert_eq!(hermes.change, dec!(373.68));

    let chanel = &rows[1];
    assert_eq!(chanel.id, shop.chanel);
    assert_eq!(chanel.revenue, dec!(5700));
    assert_eq!(chanel.cost, dec!(3000));
    assert_eq!(chanel.item_count, 2);
    assert_eq!(chanel.change, Decimal::ZERO);
}

#[test]
fn unknown_dimension_rows_keep_their_revenue() {
    let mut shop = boutique();
    shop.ledger.clients.retain(|client| client.id != shop.duarte);
    let rows = BreakdownService::breakdown(
        &shop.ledger,
        &ReportFilter::new().range(march()),
        &BreakdownRequest::new(Dimension::Client),
    )
    .unwrap();

    assert_eq!(rows[0].name, "Carla");
    assert_eq!(rows[1].name, crate::UNKNOWN_DIMENSION);
    assert_eq!(rows[1].revenue, dec!(5200));
}

#[test]
fn dimension_filter_narrows_every_figure() {
    let shop = boutique();
    let filter = ReportFilter::new().range(march()).brand(shop.chanel);
    let kpi = KpiService::summary(&shop.ledger, &filter, &clock()).unwrap();

    assert_eq!(kpi.revenue, dec!(5700));
    assert_eq!(kpi.cogs, dec!(3000));
    assert_eq!(kpi.items_sold, 1);
    assert_eq!(kpi.pending_payments, 0);
    assert_eq!(kpi.overdue_payments, 1);
    assert_eq!(kpi.pending_vendor_payouts, 1);
    assert_eq!(kpi.top_performing_brand, "Chanel");
}

#[test]
fn profitability_ranks_sold_items_in_range() {
    let shop = boutique();
    let filter = ReportFilter::new().range(march());
    let rows = ProfitabilityService::rank(&shop.ledger, &filter, Page::default()).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].item_id, shop.birkin);
    assert_eq!(rows[0].revenue, dec!(9000));
    assert_eq!(rows[0].profit, dec!(4000));
    assert_eq!(rows[0].margin, dec!(0.4444));
    assert_eq!(rows[0].days_to_sell, 57);
    assert_eq!(rows[1].item_id, shop.flap);
    assert_eq!(rows[1].profit, dec!(2200));
    assert_eq!(rows[1].days_to_sell, 100);

    assert_eq!(ProfitabilityService::count(&shop.ledger, &filter).unwrap(), 2);
    let second = ProfitabilityService::rank(&shop.ledger, &filter, Page::new(1, 1)).unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].item_id, shop.flap);
}

#[test]
fn weekly_revenue_is_sparse_unless_dense() {
    let shop = boutique();
    let filter = ReportFilter::new().range(march());
    let request = TrendRequest::new(TrendMetric::Revenue, Granularity::Week);

    let sparse = TrendService::series(&shop.ledger, &filter, &request).unwrap();
    let periods: Vec<_> = sparse.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(periods, ["2024-02-25", "2024-03-10", "2024-03-17"]);
    assert_eq!(sparse[1].value, dec!(5700));
    assert_eq!(sparse[1].count, 2);

    let dense = TrendService::series(&shop.ledger, &filter, &request.dense(true)).unwrap();
    assert_eq!(dense.len(), 6);
    assert_eq!(dense.first().map(|p| p.period.as_str()), Some("2024-02-25"));
    assert_eq!(dense.last().map(|p| p.period.as_str()), Some("2024-03-31"));
    let total: Decimal = dense.iter().map(|p| p.value).sum();
    assert_eq!(total, dec!(14700));

    let again = TrendService::series(&shop.ledger, &filter, &request.dense(true)).unwrap();
    assert_eq!(dense, again);
}

#[test]
fn monthly_profit_and_items_sold() {
    let shop = boutique();
    let filter = ReportFilter::new().range(march());

    let profit = TrendService::series(
        &shop.ledger,
        &filter,
        &TrendRequest::new(TrendMetric::Profit, Granularity::Month),
    )
    .unwrap();
    assert_eq!(profit.len(), 1);
    assert_eq!(profit[0].period, "2024-03-01");
    assert_eq!(profit[0].value, dec!(6700));

    let sold = TrendService::series(
        &shop.ledger,
        &filter,
        &TrendRequest::new(TrendMetric::ItemsSold, Granularity::Month),
    )
    .unwrap();
    assert_eq!(sold[0].count, 2);
}

#[test]
fn payment_series_counts_each_payment_once() {
    let shop = boutique();
    let filter = ReportFilter::new().range(march());
    let weekly = TrendService::series(
        &shop.ledger,
        &filter,
        &TrendRequest::new(TrendMetric::Payments, Granularity::Week),
    )
    .unwrap();

    let points: Vec<_> = weekly
        .iter()
        .map(|p| (p.period.as_str(), p.value, p.count))
        .collect();
    assert_eq!(
        points,
        [
            ("2024-02-25", dec!(1), 1),
            ("2024-03-10", dec!(2), 2),
            ("2024-03-17", dec!(1), 1),
        ]
    );
}

#[test]
fn expense_series_follows_dimension_filters() {
    let shop = boutique();
    let request = TrendRequest::new(TrendMetric::Expenses, Granularity::Month);

    let all = TrendService::series(&shop.ledger, &ReportFilter::new().range(march()), &request)
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].period, "2024-03-01");
    assert_eq!(all[0].value, dec!(230));
    assert_eq!(all[0].count, 2);

    let hermes = ReportFilter::new().range(march()).brand(shop.hermes);
    let linked = TrendService::series(&shop.ledger, &hermes, &request).unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].value, dec!(80));
    assert_eq!(linked[0].count, 1);

    let chanel = ReportFilter::new().range(march()).brand(shop.chanel);
    assert!(TrendService::series(&shop.ledger, &chanel, &request)
        .unwrap()
        .is_empty());

    let unranged = TrendService::series(&shop.ledger, &ReportFilter::new(), &request).unwrap();
    let periods: Vec<_> = unranged.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(periods, ["2024-02-01", "2024-03-01"]);
    assert_eq!(unranged[0].value, dec!(1000));
}

#[test]
fn inventory_snapshot_partitions_unsold_items() {
    let shop = boutique();
    let health = InventoryService::snapshot(
        &shop.ledger,
        &ReportFilter::new(),
        &clock(),
        &AnalyticsSettings::default(),
    )
    .unwrap();

    assert_eq!(health.total_items, 6);
    assert_eq!(health.status_counts.in_store, 1);
    assert_eq!(health.status_counts.reserved, 1);
    assert_eq!(health.status_counts.sold, 3);
    assert_eq!(health.status_counts.returned, 1);
    assert_eq!(health.aging.total(), health.status_counts.unsold());
    assert_eq!(health.aging.days_30_to_90, 1);
    assert_eq!(health.aging.over_180, 1);
    assert_eq!(health.total_value, dec!(11100));
    assert_eq!(health.average_age_days, dec!(103.33));
    assert_eq!(health.slow_moving_items, 1);
    assert_eq!(health.fast_moving_items, 1);

    assert_eq!(health.categories.len(), 2);
    assert_eq!(health.categories[0].category_id, shop.bags);
    assert_eq!(health.categories[0].value, dec!(10100));
    assert_eq!(health.categories[1].category_id, shop.jewelry);
    assert_eq!(health.categories[1].item_count, 2);
}

#[test]
fn health_score_reflects_overdue_installments() {
    let shop = boutique();
    let report = HealthService::assess(
        &shop.ledger,
        &ReportFilter::new(),
        &clock(),
        &AnalyticsSettings::default(),
    )
    .unwrap();

    assert_eq!(report.inputs.overdue_rate, dec!(0.5));
    assert_eq!(report.inputs.net_cash_flow, dec!(12470));
    assert_eq!(report.factors.payment_timeliness, dec!(12.5));
    assert_eq!(report.factors.cash_flow, dec!(25));
    assert_eq!(report.factors.inventory_turnover, dec!(12));
    assert_eq!(report.factors.profit_margin, dec!(17.83));
    assert_eq!(report.factors.client_retention, dec!(6.67));
    assert_eq!(report.score, dec!(74));
    assert_eq!(report.grade, crate::Grade::B);
    assert_eq!(report.recommendations, vec![MSG_OVERDUE.to_string()]);
}

#[test]
fn cash_flow_without_outflow_scores_full_marks() {
    let shop = boutique();
    let predicate = ReportFilter::new()
        .category(shop.jewelry)
        .build()
        .unwrap()
        .without_dates();
    let inputs = HealthService::gather(
        &shop.ledger,
        &predicate,
        &clock(),
        &AnalyticsSettings::default(),
    );

    assert_eq!(inputs.cash_flow_ratio, dec!(2));
    assert_eq!(inputs.net_cash_flow, dec!(500));
    assert_eq!(HealthService::evaluate(inputs).factors.cash_flow, dec!(25));
}

#[test]
fn unbounded_cash_flow_window_covers_the_whole_ledger() {
    let shop = boutique();
    let settings = AnalyticsSettings {
        cash_flow_window_days: u32::MAX,
        upcoming_window_days: u32::MAX,
        ..AnalyticsSettings::default()
    };
    let report =
        HealthService::assess(&shop.ledger, &ReportFilter::new(), &clock(), &settings).unwrap();

    assert_eq!(report.inputs.net_cash_flow, dec!(13370));
    assert_eq!(report.factors.cash_flow, dec!(25));
}

#[test]
fn pending_settlements_order_by_remaining_balance() {
    let shop = boutique();
    let pending = SettlementService::pending_settlements(&shop.ledger, &ReportFilter::new()).unwrap();
    let ids: Vec<_> = pending.iter().map(|s| s.item_id).collect();
    assert_eq!(ids, [shop.birkin, shop.flap, shop.evelyne]);
    assert_eq!(pending[0].vendor_target, dec!(5400));
    assert_eq!(pending[1].vendor_target, dec!(3309.09));
    assert_eq!(pending[1].remaining_balance, dec!(1309.09));
    assert_eq!(pending[2].vendor_target, dec!(1140));
}

#[test]
fn vendor_payout_settles_item() {
    let mut shop = boutique();
    let settlement = SettlementService::record_vendor_payout(
        &mut shop.ledger,
        shop.birkin,
        shop.ana,
        dec!(5400),
        at(2024, 4, 2),
    )
    .unwrap();
    assert!(settlement.is_fully_paid);
    assert_eq!(settlement.remaining_balance, Decimal::ZERO);

    let pending = SettlementService::pending_settlements(&shop.ledger, &ReportFilter::new()).unwrap();
    assert_eq!(pending.len(), 2);
}

#[test]
fn payout_to_wrong_vendor_changes_nothing() {
    let mut shop = boutique();
    let before = shop.ledger.vendor_payouts.len();
    let stamp = shop.ledger.updated_at;
    let err = SettlementService::record_vendor_payout(
        &mut shop.ledger,
        shop.birkin,
        shop.bruno,
        dec!(100),
        at(2024, 4, 2),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
    assert_eq!(shop.ledger.vendor_payouts.len(), before);
    assert_eq!(shop.ledger.updated_at, stamp);

    let err = SettlementService::record_vendor_payout(
        &mut shop.ledger,
        shop.wallet,
        shop.bruno,
        dec!(100),
        at(2024, 4, 2),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
}

#[test]
fn client_payments_walk_item_to_sold_and_close_plan() {
    let mut shop = boutique();
    let first = SettlementService::record_client_payment(
        &mut shop.ledger,
        shop.wallet,
        shop.duarte,
        dec!(300),
        PaymentMethod::Cash,
        at(2024, 4, 1),
    )
    .unwrap();
    assert_eq!(first.item_status, ItemStatus::Reserved);
    assert_eq!(first.total_paid, dec!(300));
    assert_eq!(
        first.installment,
        Some(InstallmentAdvance::Advanced {
            next_due: day(2024, 4, 12)
        })
    );

    let second = SettlementService::record_client_payment(
        &mut shop.ledger,
        shop.wallet,
        shop.duarte,
        dec!(1100),
        PaymentMethod::BankTransfer,
        at(2024, 4, 10),
    )
    .unwrap();
    assert_eq!(second.item_status, ItemStatus::Sold);
    assert_eq!(second.installment, Some(InstallmentAdvance::Completed));

    let plan = shop.ledger.installment_plan(shop.wallet_plan).unwrap();
    assert!(!plan.is_active());
    assert_eq!(plan.remaining_amount, Decimal::ZERO);
}

#[test]
fn refused_client_payment_leaves_ledger_unchanged() {
    let mut shop = boutique();
    let before = shop.ledger.client_payments.len();
    let stamp = shop.ledger.updated_at;

    let err = SettlementService::record_client_payment(
        &mut shop.ledger,
        shop.scarf,
        shop.eva,
        dec!(50),
        PaymentMethod::Card,
        at(2024, 4, 1),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));

    let err = SettlementService::record_client_payment(
        &mut shop.ledger,
        shop.wallet,
        shop.duarte,
        dec!(-5),
        PaymentMethod::Card,
        at(2024, 4, 1),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    assert_eq!(shop.ledger.client_payments.len(), before);
    assert_eq!(shop.ledger.updated_at, stamp);
    assert_eq!(
        shop.ledger.item(shop.wallet).map(|item| item.status),
        Some(ItemStatus::InStore)
    );
}

#[test]
fn installment_queues_follow_the_clock() {
    let shop = boutique();
    let today = day(2024, 3, 31);

    let overdue = InstallmentService::overdue(&shop.ledger, today);
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, shop.necklace_plan);

    let upcoming = InstallmentService::upcoming(&shop.ledger, today, 7);
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, shop.wallet_plan);
    assert!(InstallmentService::upcoming(&shop.ledger, today, 3).is_empty());
}

#[test]
fn reminders_clear_after_a_payment() {
    let mut shop = boutique();
    let today = day(2024, 3, 31);
    InstallmentService::mark_reminder_sent(&mut shop.ledger, shop.wallet_plan).unwrap();
    assert!(InstallmentService::reminders_due(&shop.ledger, today, 7).is_empty());

    InstallmentService::apply_payment(&mut shop.ledger, shop.wallet_plan, dec!(350)).unwrap();
    let plan = shop.ledger.installment_plan(shop.wallet_plan).unwrap();
    assert!(!plan.reminder_sent);
    assert_eq!(plan.next_due_date, day(2024, 4, 12));
}

#[test]
fn second_plan_for_item_is_refused() {
    let mut shop = boutique();
    let terms = crate::PlanTerms {
        item_id: shop.necklace,
        client_id: shop.eva,
        total_amount: dec!(1000),
        installment_amount: dec!(250),
        frequency: consign_domain::InstallmentFrequency::Biweekly,
        first_due_date: day(2024, 4, 15),
    };
    let err = InstallmentService::create_plan(&mut shop.ledger, terms, at(2024, 4, 1)).unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
}

#[test]
fn referenced_brand_cannot_be_removed() {
    let mut shop = boutique();
    let err = DimensionService::remove(&mut shop.ledger, Dimension::Brand, shop.hermes).unwrap_err();
    match err {
        CoreError::Conflict { references, .. } => assert_eq!(references, 4),
        other => panic!("unexpected error: {other}"),
    }
    assert!(shop.ledger.brand(shop.hermes).is_some());
}
