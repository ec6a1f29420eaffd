//! Single-period KPI summary with a prior-period comparison.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use consign_domain::{DateRange, Ledger};

use crate::{
    breakdown::BreakdownService,
    dimension::Dimension,
    filter::{FilterPredicate, ReportFilter},
    installment::InstallmentService,
    math::{mean, percent_change, rate, ratio, round2},
    sales::SaleIndex,
    settlement::SettlementService,
    time::Clock,
    CoreResult,
};

/// Sentinel for top performers when nothing qualifies.
pub const NO_PERFORMER: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub gross_profit: Decimal,
    pub gross_margin: Decimal,
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
    pub net_margin: Decimal,
    pub items_sold: usize,
    pub payment_count: usize,
    pub unique_clients: usize,
    pub average_order_value: Decimal,
    pub average_days_to_sell: Decimal,
    pub inventory_turnover: Decimal,
    pub pending_payments: usize,
    pub overdue_payments: usize,
    pub pending_vendor_payouts: usize,
    pub top_performing_brand: String,
    pub top_performing_vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<KpiComparison>,
}

/// Same figures over the equal-length period right before the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiComparison {
    pub previous_range: DateRange,
    pub previous_revenue: Decimal,
    pub previous_gross_profit: Decimal,
    pub revenue_change: Decimal,
    pub profit_change: Decimal,
}

/// Money figures for one period.
#[derive(Debug, Clone, Default, PartialEq)]
struct PeriodTotals {
    revenue: Decimal,
    cogs: Decimal,
    expenses: Decimal,
    items_sold: usize,
    payment_count: usize,
    unique_clients: usize,
    days_to_sell: Vec<Decimal>,
}

impl PeriodTotals {
    fn gross_profit(&self) -> Decimal {
        self.revenue - self.cogs
    }

    fn collect(ledger: &Ledger, predicate: &FilterPredicate, sales: &SaleIndex) -> Self {
        let payments = predicate.qualifying_payments(ledger);
        let revenue = payments.iter().map(|row| row.payment.amount).sum();
        let unique_clients = payments
            .iter()
            .map(|row| row.payment.client_id)
            .collect::<HashSet<_>>()
            .len();

        let sold = sales.sold_in(ledger, predicate);
        let cogs = sold.iter().map(|s| s.item.conservative_cost()).sum();
        let days_to_sell = sold
            .iter()
            .map(|s| Decimal::from(s.days_to_sell()))
            .collect();

        let expenses = ledger
            .expenses
            .iter()
            .filter(|expense| predicate.includes_expense(ledger, expense))
            .map(|expense| expense.amount)
            .sum();

        Self {
            revenue,
            cogs,
            expenses,
            items_sold: sold.len(),
            payment_count: payments.len(),
            unique_clients,
            days_to_sell,
        }
    }
}

pub struct KpiService;

impl KpiService {
    pub fn summary(ledger: &Ledger, filter: &ReportFilter, clock: &dyn Clock) -> CoreResult<KpiSummary> {
        let predicate = filter.build()?;
        Ok(Self::summarize(ledger, &predicate, clock))
    }

    pub fn summarize(ledger: &Ledger, predicate: &FilterPredicate, clock: &dyn Clock) -> KpiSummary {
        let sales = SaleIndex::build(ledger);
        let current = PeriodTotals::collect(ledger, predicate, &sales);

        let gross_profit = current.gross_profit();
        let net_profit = gross_profit - current.expenses;
        let average_inventory_value =
            mean(predicate.matching_items(ledger).map(|item| item.conservative_cost()));

        let today = clock.today();
        let counts = InstallmentService::counts(ledger, predicate, today);
        let pending_vendor_payouts =
            SettlementService::pending_settlements_for(ledger, &predicate.without_dates()).len();

        let comparison = predicate.range().map(|range| {
            let previous_range = range.previous_period();
            let previous = PeriodTotals::collect(ledger, &predicate.with_range(previous_range), &sales);
            KpiComparison {
                previous_range,
                previous_revenue: previous.revenue,
                previous_gross_profit: previous.gross_profit(),
                revenue_change: percent_change(current.revenue, previous.revenue),
                profit_change: percent_change(gross_profit, previous.gross_profit()),
            }
        });

        let leader = |dimension| {
            BreakdownService::revenue_leader(ledger, predicate, dimension)
                .unwrap_or_else(|| NO_PERFORMER.to_string())
        };

        debug!(
            range = ?predicate.range(),
            payments = current.payment_count,
            items_sold = current.items_sold,
            "computed KPI summary"
        );

        KpiSummary {
            range: predicate.range(),
            revenue: current.revenue,
            cogs: current.cogs,
            gross_profit,
            gross_margin: rate(gross_profit, current.revenue),
            total_expenses: current.expenses,
            net_profit,
            net_margin: rate(net_profit, current.revenue),
            items_sold: current.items_sold,
            payment_count: current.payment_count,
            unique_clients: current.unique_clients,
            average_order_value: round2(ratio(
                current.revenue,
                Decimal::from(current.payment_count),
            )),
            average_days_to_sell: round2(mean(current.days_to_sell.iter().copied())),
            inventory_turnover: rate(current.cogs, average_inventory_value),
            pending_payments: counts.pending,
            overdue_payments: counts.overdue,
            pending_vendor_payouts,
            top_performing_brand: leader(Dimension::Brand),
            top_performing_vendor: leader(Dimension::Vendor),
            comparison,
        }
    }
}
