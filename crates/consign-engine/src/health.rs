//! Composite financial health score.
//!
//! | Factor             | Cap | Score                                  |
//! |--------------------|-----|----------------------------------------|
//! | Payment timeliness | 25  | `25 * (1 - overdue_rate)`, floor 0     |
//! | Cash flow          | 25  | `clamp(ratio * 12.5, 0, 25)`           |
//! | Inventory turnover | 20  | `min(20, turnover_rate * 20)`          |
//! | Profit margin      | 20  | `clamp(margin_rate * 40, 0, 20)`       |
//! | Client retention   | 10  | `min(10, retention_rate * 20)`         |

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use consign_config::AnalyticsSettings;
use consign_domain::{DateRange, Ledger};

use crate::{
    filter::{FilterPredicate, ReportFilter},
    installment::InstallmentService,
    math::{rate, round2},
    time::Clock,
    CoreResult,
};

/// Cash-flow ratio assumed when nothing flowed out.
pub const CASH_FLOW_RATIO_WITHOUT_OUTFLOW: Decimal = dec!(2);

/// Raw ratios the score is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthInputs {
    pub overdue_rate: Decimal,
    pub cash_flow_ratio: Decimal,
    pub net_cash_flow: Decimal,
    pub turnover_rate: Decimal,
    pub margin_rate: Decimal,
    pub retention_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScores {
    pub payment_timeliness: Decimal,
    pub cash_flow: Decimal,
    pub inventory_turnover: Decimal,
    pub profit_margin: Decimal,
    pub client_retention: Decimal,
}

impl FactorScores {
    pub fn total(&self) -> Decimal {
        self.payment_timeliness
            + self.cash_flow
            + self.inventory_turnover
            + self.profit_margin
            + self.client_retention
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: Decimal) -> Self {
        if score >= dec!(90) {
            Grade::APlus
        } else if score >= dec!(80) {
            Grade::A
        } else if score >= dec!(70) {
            Grade::B
        } else if score >= dec!(60) {
            Grade::C
        } else if score >= dec!(50) {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub score: Decimal,
    pub grade: Grade,
    pub factors: FactorScores,
    pub inputs: HealthInputs,
    pub recommendations: Vec<String>,
}

pub const MSG_OVERDUE: &str =
    "More than 20% of active installments are overdue; follow up with clients and tighten reminder schedules.";
pub const MSG_CASH_FLOW: &str =
    "Cash outflow exceeded inflow over the last period; delay discretionary expenses and stagger vendor payouts.";
pub const MSG_TURNOVER: &str =
    "Less than 30% of inventory has sold; consider markdowns on aged pieces or returning slow movers to vendors.";
pub const MSG_MARGIN: &str =
    "Profit margin is below 20%; review acquisition costs and minimum sale prices.";
pub const MSG_RETENTION: &str =
    "Fewer than 30% of clients have bought more than one item; invest in repeat-client outreach.";
pub const MSG_HEALTHY: &str =
    "Financial health is excellent; keep the current practices in place.";
pub const MSG_IMMEDIATE_ATTENTION: &str =
    "Overall financial health needs immediate attention; review cash position, collections and pricing now.";

pub struct HealthService;

impl HealthService {
    /// Scores precomputed inputs.
    pub fn evaluate(inputs: HealthInputs) -> HealthReport {
        let factors = FactorScores {
            payment_timeliness: round2(
                (dec!(25) * (Decimal::ONE - inputs.overdue_rate)).max(Decimal::ZERO),
            ),
            cash_flow: round2(
                (inputs.cash_flow_ratio * dec!(12.5))
                    .max(Decimal::ZERO)
                    .min(dec!(25)),
            ),
            inventory_turnover: round2((inputs.turnover_rate * dec!(20)).min(dec!(20))),
            profit_margin: round2(
                (inputs.margin_rate * dec!(40))
                    .max(Decimal::ZERO)
                    .min(dec!(20)),
            ),
            client_retention: round2((inputs.retention_rate * dec!(20)).min(dec!(10))),
        };
        let score = factors.total();
        let grade = Grade::from_score(score);

        let mut recommendations = Vec::new();
        if inputs.overdue_rate > dec!(0.2) {
            recommendations.push(MSG_OVERDUE.to_string());
        }
        if inputs.net_cash_flow < Decimal::ZERO {
            recommendations.push(MSG_CASH_FLOW.to_string());
        }
        if inputs.turnover_rate < dec!(0.3) {
            recommendations.push(MSG_TURNOVER.to_string());
        }
        if inputs.margin_rate < dec!(0.2) {
            recommendations.push(MSG_MARGIN.to_string());
        }
        if inputs.retention_rate < dec!(0.3) {
            recommendations.push(MSG_RETENTION.to_string());
        }
        if score >= dec!(90) && recommendations.is_empty() {
            recommendations.push(MSG_HEALTHY.to_string());
        }
        if grade == Grade::F {
            recommendations.push(MSG_IMMEDIATE_ATTENTION.to_string());
        }

        HealthReport {
            score,
            grade,
            factors,
            inputs,
            recommendations,
        }
    }

    /// Gathers inputs from the ledger, then scores them.
    pub fn assess(
        ledger: &Ledger,
        filter: &ReportFilter,
        clock: &dyn Clock,
        settings: &AnalyticsSettings,
    ) -> CoreResult<HealthReport> {
        let predicate = filter.build()?.without_dates();
        let inputs = Self::gather(ledger, &predicate, clock, settings);
        debug!(?inputs, "gathered health inputs");
        Ok(Self::evaluate(inputs))
    }

    pub fn gather(
        ledger: &Ledger,
        predicate: &FilterPredicate,
        clock: &dyn Clock,
        settings: &AnalyticsSettings,
    ) -> HealthInputs {
        let today = clock.today();

        let counts = InstallmentService::counts(ledger, predicate, today);
        let overdue_rate = rate(
            Decimal::from(counts.overdue),
            Decimal::from(counts.active),
        );

        let window = DateRange::trailing_days(today, settings.cash_flow_window_days);
        let in_window = predicate.with_range(window);
        let inflow: Decimal = in_window
            .qualifying_payments(ledger)
            .iter()
            .map(|row| row.payment.amount)
            .sum();
        let payouts: Decimal = ledger
            .vendor_payouts
            .iter()
            .filter(|payout| in_window.contains(payout.paid_at))
            .filter(|payout| {
                !predicate.has_dimension_filters()
                    || ledger
                        .item(payout.item_id)
                        .is_some_and(|item| predicate.matches_item(item))
            })
            .map(|payout| payout.amount)
            .sum();
        let expenses: Decimal = ledger
            .expenses
            .iter()
            .filter(|expense| in_window.includes_expense(ledger, expense))
            .map(|expense| expense.amount)
            .sum();
        let outflow = payouts + expenses;
        let cash_flow_ratio = if outflow.is_zero() {
            CASH_FLOW_RATIO_WITHOUT_OUTFLOW
        } else {
            rate(inflow, outflow)
        };

        let items: Vec<_> = predicate.matching_items(ledger).collect();
        let sold = items.iter().filter(|item| item.is_sold()).count();
        let unsold = items.iter().filter(|item| item.is_unsold()).count();
        let turnover_rate = rate(Decimal::from(sold), Decimal::from(sold + unsold));

        let all_payments = predicate.qualifying_payments(ledger);
        let revenue: Decimal = all_payments.iter().map(|row| row.payment.amount).sum();
        let sold_cost: Decimal = items
            .iter()
            .filter(|item| item.is_sold())
            .map(|item| item.conservative_cost())
            .sum();
        let margin_rate = rate(revenue - sold_cost, revenue);

        let mut items_per_client: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for row in &all_payments {
            items_per_client
                .entry(row.payment.client_id)
                .or_default()
                .insert(row.item.id);
        }
        let repeat_clients = items_per_client.values().filter(|items| items.len() > 1).count();
        let retention_rate = rate(
            Decimal::from(repeat_clients),
            Decimal::from(items_per_client.len()),
        );

        HealthInputs {
            overdue_rate,
            cash_flow_ratio,
            net_cash_flow: inflow - outflow,
            turnover_rate,
            margin_rate,
            retention_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(
        overdue: Decimal,
        cash: Decimal,
        turnover: Decimal,
        margin: Decimal,
        retention: Decimal,
    ) -> HealthInputs {
        HealthInputs {
            overdue_rate: overdue,
            cash_flow_ratio: cash,
            net_cash_flow: Decimal::ONE,
            turnover_rate: turnover,
            margin_rate: margin,
            retention_rate: retention,
        }
    }

    #[test]
    fn reference_inputs_score_eighty_two() {
        let report = HealthService::evaluate(inputs(
            Decimal::ZERO,
            dec!(2),
            dec!(0.5),
            dec!(0.3),
            dec!(0.5),
        ));
        assert_eq!(report.factors.payment_timeliness, dec!(25));
        assert_eq!(report.factors.cash_flow, dec!(25));
        assert_eq!(report.factors.inventory_turnover, dec!(10));
        assert_eq!(report.factors.profit_margin, dec!(12));
        assert_eq!(report.factors.client_retention, dec!(10));
        assert_eq!(report.score, dec!(82));
        assert_eq!(report.grade, Grade::A);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn excellent_score_gets_acknowledgement() {
        let report = HealthService::evaluate(inputs(
            Decimal::ZERO,
            dec!(3),
            dec!(0.9),
            dec!(0.5),
            dec!(0.6),
        ));
        assert_eq!(report.grade, Grade::APlus);
        assert_eq!(report.recommendations, vec![MSG_HEALTHY.to_string()]);
    }

    #[test]
    fn failing_grade_always_asks_for_attention() {
        let mut raw = inputs(dec!(1), Decimal::ZERO, Decimal::ZERO, dec!(-0.5), Decimal::ZERO);
        raw.net_cash_flow = dec!(-100);
        let report = HealthService::evaluate(raw);
        assert_eq!(report.score, Decimal::ZERO);
        assert_eq!(report.grade, Grade::F);
        assert_eq!(report.recommendations.len(), 6);
        assert_eq!(
            report.recommendations.last().map(String::as_str),
            Some(MSG_IMMEDIATE_ATTENTION)
        );
    }

    #[test]
    fn grade_bands() {
        assert_eq!(Grade::from_score(dec!(90)), Grade::APlus);
        assert_eq!(Grade::from_score(dec!(89.99)), Grade::A);
        assert_eq!(Grade::from_score(dec!(70)), Grade::B);
        assert_eq!(Grade::from_score(dec!(60)), Grade::C);
        assert_eq!(Grade::from_score(dec!(50)), Grade::D);
        assert_eq!(Grade::from_score(dec!(49.99)), Grade::F);
    }
}
