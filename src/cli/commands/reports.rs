//! Read-only analytics commands.

use rust_decimal::Decimal;
use serde::Serialize;

use consign_config::WeekStart;
use consign_domain::{InstallmentPlan, Ledger};
use consign_engine::{
    BreakdownMetric, BreakdownRequest, BreakdownService, Dimension, FilterPredicate, Granularity,
    HealthService, InstallmentCounts, InstallmentService, InventoryService, ItemProfit, KpiService,
    Page, ProfitabilityService, SettlementService, TrendMetric, TrendRequest, TrendService,
    UNKNOWN_DIMENSION, DEFAULT_PAGE_LIMIT,
};

use crate::cli::args::{resolve_item, ParsedArgs};
use crate::cli::commands::emit;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::format::{change, ratio_percent, Formatter};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "kpi",
            "Revenue, profit and sales KPIs with period comparison",
            "kpi [filters]",
            cmd_kpi,
        ),
        CommandEntry::new(
            "trend",
            "Time series of a metric by day, week or month",
            "trend [--metric revenue|profit|items_sold|payments|expenses] [--granularity day|week|month] [--dense|--sparse] [--week-start sunday|monday] [filters]",
            cmd_trend,
        ),
        CommandEntry::new(
            "breakdown",
            "Revenue and profit grouped by brand, vendor, client or category",
            "breakdown --by brand|vendor|client|category [--metric <name>]... [filters]",
            cmd_breakdown,
        ),
        CommandEntry::new(
            "items",
            "Sold items ranked by profit",
            "items [--limit N] [--offset N] [filters]",
            cmd_items,
        ),
        CommandEntry::new(
            "inventory",
            "Status counts, aging and value of unsold stock",
            "inventory [--vendor|--brand|--category <name>] [--json]",
            cmd_inventory,
        ),
        CommandEntry::new(
            "health",
            "Financial health score with recommendations",
            "health [--vendor|--brand|--category <name>] [--json]",
            cmd_health,
        ),
        CommandEntry::new(
            "settlement",
            "Vendor settlement for one item",
            "settlement <item> [--json]",
            cmd_settlement,
        ),
        CommandEntry::new(
            "payouts",
            "Sold items still owed to their vendors",
            "payouts [filters]",
            cmd_payouts,
        ),
        CommandEntry::new(
            "installments",
            "Installment plan counts and due lists",
            "installments [overdue|upcoming|reminders] [--days N] [--json]",
            cmd_installments,
        ),
    ]
}

fn cmd_kpi(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let filter = context.report_filter(&parsed)?;
    let summary = KpiService::summary(ledger, &filter, context.clock.as_ref())?;
    let fmt = context.formatter();

    emit(context, &parsed, &summary, || {
        let title = summary
            .range
            .map(|range| format!("KPI summary ({range})"))
            .unwrap_or_else(|| "KPI summary (all time)".to_string());
        output::section(title);
        let mut table = Table::new(vec![TableColumn::left("Metric"), TableColumn::right("Value")]);
        let rows = [
            ("Revenue", fmt.money(summary.revenue)),
            ("Cost of goods sold", fmt.money(summary.cogs)),
            ("Gross profit", fmt.money(summary.gross_profit)),
            ("Gross margin", ratio_percent(summary.gross_margin)),
            ("Expenses", fmt.money(summary.total_expenses)),
            ("Net profit", fmt.money(summary.net_profit)),
            ("Net margin", ratio_percent(summary.net_margin)),
            ("Items sold", summary.items_sold.to_string()),
            ("Payments", summary.payment_count.to_string()),
            ("Unique clients", summary.unique_clients.to_string()),
            ("Average order value", fmt.money(summary.average_order_value)),
            ("Average days to sell", summary.average_days_to_sell.to_string()),
            ("Inventory turnover", summary.inventory_turnover.to_string()),
            ("Pending installments", summary.pending_payments.to_string()),
            ("Overdue installments", summary.overdue_payments.to_string()),
            ("Pending vendor payouts", summary.pending_vendor_payouts.to_string()),
            ("Top brand", summary.top_performing_brand.clone()),
            ("Top vendor", summary.top_performing_vendor.clone()),
        ];
        for (label, value) in rows {
            table.push([label.to_string(), value]);
        }
        output::info(table.render());

        if let Some(comparison) = &summary.comparison {
            output::section(format!("Compared with {}", comparison.previous_range));
            let mut table = Table::new(vec![
                TableColumn::left("Metric"),
                TableColumn::right("Previous"),
                TableColumn::right("Change"),
            ]);
            table.push([
                "Revenue".to_string(),
                fmt.money(comparison.previous_revenue),
                change(comparison.revenue_change),
            ]);
            table.push([
                "Gross profit".to_string(),
                fmt.money(comparison.previous_gross_profit),
                change(comparison.profit_change),
            ]);
            output::info(table.render());
        }
    })
}

fn cmd_trend(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let filter = context.report_filter(&parsed)?;
    let metric = parsed
        .parse_value::<TrendMetric>("metric")?
        .unwrap_or(TrendMetric::Revenue);
    let granularity = parsed
        .parse_value::<Granularity>("granularity")?
        .unwrap_or(Granularity::Month);
    let week_start = parsed
        .parse_value::<WeekStart>("week-start")?
        .unwrap_or(context.analytics().week_start);
    let dense = if parsed.flag("dense") {
        true
    } else if parsed.flag("sparse") {
        false
    } else {
        context.analytics().dense_series
    };
    let request = TrendRequest::new(metric, granularity)
        .dense(dense)
        .week_start(week_start);
    let points = TrendService::series(ledger, &filter, &request)?;
    let fmt = context.formatter();

    emit(context, &parsed, &points, || {
        output::section(format!("{metric} by {granularity}"));
        if points.is_empty() {
            output::info("No data in range.");
            return;
        }
        let mut table = Table::new(vec![
            TableColumn::left("Period"),
            TableColumn::right("Value"),
            TableColumn::right("Count"),
        ]);
        for point in &points {
            let value = match metric {
                TrendMetric::ItemsSold | TrendMetric::Payments => point.value.to_string(),
                _ => fmt.amount(point.value),
            };
            table.push([point.period.clone(), value, point.count.to_string()]);
        }
        output::info(table.render());
    })
}

fn cmd_breakdown(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let filter = context.report_filter(&parsed)?;
    let dimension = parsed
        .parse_value::<Dimension>("by")?
        .ok_or_else(|| CommandError::InvalidArguments("missing `--by` option".into()))?;
    let metrics = parsed.parse_all::<BreakdownMetric>("metric")?;
    let request = BreakdownRequest::new(dimension).with_metrics(metrics);
    let rows = BreakdownService::breakdown(ledger, &filter, &request)?;
    let fmt = context.formatter();

    emit(context, &parsed, &rows, || {
        output::section(format!("Breakdown by {dimension}"));
        if rows.is_empty() {
            output::info("No sales in range.");
            return;
        }
        let mut table = Table::new(vec![
            TableColumn::left("Name").max_width(28),
            TableColumn::right("Revenue"),
            TableColumn::right("Cost"),
            TableColumn::right("Profit"),
            TableColumn::right("Items"),
            TableColumn::right("Payments"),
            TableColumn::right("AOV"),
            TableColumn::right("Margin"),
            TableColumn::right("Change"),
        ]);
        for row in &rows {
            table.push([
                row.name.clone(),
                fmt.amount(row.revenue),
                fmt.amount(row.cost),
                fmt.amount(row.profit),
                row.item_count.to_string(),
                row.payment_count.to_string(),
                fmt.amount(row.avg_order_value),
                ratio_percent(row.profit_margin),
                change(row.change),
            ]);
        }
        output::info(table.render());
        if rows.iter().any(|row| row.name == UNKNOWN_DIMENSION) {
            output::warning("Some payments reference records missing from the ledger.");
        }
    })
}

#[derive(Serialize)]
struct ItemsPage<'a> {
    total: usize,
    limit: usize,
    offset: usize,
    items: &'a [ItemProfit],
}

fn cmd_items(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let filter = context.report_filter(&parsed)?;
    let page = Page::new(
        parsed.parse_value("limit")?.unwrap_or(DEFAULT_PAGE_LIMIT),
        parsed.parse_value("offset")?.unwrap_or(0),
    );
    let rows = ProfitabilityService::rank(ledger, &filter, page)?;
    let total = ProfitabilityService::count(ledger, &filter)?;
    let fmt = context.formatter();
    let view = ItemsPage {
        total,
        limit: page.limit,
        offset: page.offset,
        items: &rows,
    };

    emit(context, &parsed, &view, || {
        output::section("Item profitability");
        if rows.is_empty() {
            output::info("No sold items in range.");
            return;
        }
        let mut table = Table::new(vec![
            TableColumn::left("Item").max_width(32),
            TableColumn::right("Revenue"),
            TableColumn::right("Cost"),
            TableColumn::right("Profit"),
            TableColumn::right("Margin"),
            TableColumn::right("Days"),
        ]);
        for row in &rows {
            table.push([
                row.title.clone(),
                fmt.amount(row.revenue),
                fmt.amount(row.cost),
                fmt.amount(row.profit),
                ratio_percent(row.margin),
                row.days_to_sell.to_string(),
            ]);
        }
        output::info(table.render());
        output::info(format!(
            "Showing {} of {} item(s) from offset {}.",
            rows.len(),
            total,
            page.offset
        ));
    })
}

fn cmd_inventory(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let filter = context.report_filter(&parsed)?;
    let report =
        InventoryService::snapshot(ledger, &filter, context.clock.as_ref(), context.analytics())?;
    let fmt = context.formatter();

    emit(context, &parsed, &report, || {
        output::section("Inventory");
        let counts = &report.status_counts;
        output::info(format!(
            "{} item(s): {} in store, {} reserved, {} sold, {} returned",
            report.total_items, counts.in_store, counts.reserved, counts.sold, counts.returned
        ));
        output::info(format!(
            "Unsold value {} | average age {} day(s) | {} slow, {} fast",
            fmt.money(report.total_value),
            report.average_age_days,
            report.slow_moving_items,
            report.fast_moving_items
        ));

        let aging = &report.aging;
        let mut table = Table::new(vec![TableColumn::left("Age"), TableColumn::right("Items")]);
        table.push(["under 30 days".to_string(), aging.under_30.to_string()]);
        table.push(["30-90 days".to_string(), aging.days_30_to_90.to_string()]);
        table.push(["91-180 days".to_string(), aging.days_91_to_180.to_string()]);
        table.push(["over 180 days".to_string(), aging.over_180.to_string()]);
        output::info(table.render());

        if !report.categories.is_empty() {
            output::section("Unsold stock by category");
            let mut table = Table::new(vec![
                TableColumn::left("Category"),
                TableColumn::right("Items"),
                TableColumn::right("Value"),
                TableColumn::right("Avg age"),
            ]);
            for category in &report.categories {
                table.push([
                    category.name.clone(),
                    category.item_count.to_string(),
                    fmt.amount(category.value),
                    category.average_age_days.to_string(),
                ]);
            }
            output::info(table.render());
        }
    })
}

fn cmd_health(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let filter = context.report_filter(&parsed)?;
    let report =
        HealthService::assess(ledger, &filter, context.clock.as_ref(), context.analytics())?;

    emit(context, &parsed, &report, || {
        output::section(format!("Financial health: {} ({})", report.score, report.grade));
        let factors = &report.factors;
        let mut table = Table::new(vec![TableColumn::left("Factor"), TableColumn::right("Points")]);
        for (label, points) in [
            ("Payment timeliness", factors.payment_timeliness),
            ("Cash flow", factors.cash_flow),
            ("Inventory turnover", factors.inventory_turnover),
            ("Profit margin", factors.profit_margin),
            ("Client retention", factors.client_retention),
        ] {
            table.push([label.to_string(), points.to_string()]);
        }
        output::info(table.render());
        for recommendation in &report.recommendations {
            output::info(format!("- {recommendation}"));
        }
    })
}

fn cmd_settlement(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let item_id = resolve_item(ledger, parsed.require_positional(0, "item")?)?;
    let settlement = SettlementService::settlement_for_item(ledger, item_id)?;
    let fmt = context.formatter();

    emit(context, &parsed, &settlement, || {
        output::section(format!("Settlement: {}", settlement.title));
        let mut table = Table::new(vec![TableColumn::left("Field"), TableColumn::right("Value")]);
        let rows = [
            ("Max sales price", fmt.money(settlement.max_sales_price)),
            ("Actual sale price", fmt.money(settlement.actual_sale_price)),
            ("Max cost", fmt.money(settlement.max_cost)),
            ("Price difference", fmt.money(settlement.price_difference)),
            ("Difference %", format!("{:.2}%", settlement.price_difference_percent)),
            ("Adjustment factor", settlement.adjustment_factor.to_string()),
            ("Vendor target", fmt.money(settlement.vendor_target)),
            ("Paid to vendor", fmt.money(settlement.total_paid_to_vendor)),
            ("Remaining", fmt.money(settlement.remaining_balance)),
            ("Progress", format!("{:.2}%", settlement.payment_progress)),
            ("Fully paid", if settlement.is_fully_paid { "yes" } else { "no" }.to_string()),
        ];
        for (label, value) in rows {
            table.push([label.to_string(), value]);
        }
        output::info(table.render());
    })
}

fn cmd_payouts(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let filter = context.report_filter(&parsed)?;
    let pending = SettlementService::pending_settlements(ledger, &filter)?;
    let fmt = context.formatter();

    emit(context, &parsed, &pending, || {
        output::section("Pending vendor payouts");
        if pending.is_empty() {
            output::info("Every sold item is settled.");
            return;
        }
        let mut table = Table::new(vec![
            TableColumn::left("Item").max_width(32),
            TableColumn::left("Vendor"),
            TableColumn::right("Target"),
            TableColumn::right("Paid"),
            TableColumn::right("Remaining"),
            TableColumn::right("Progress"),
        ]);
        for settlement in &pending {
            table.push([
                settlement.title.clone(),
                vendor_name(ledger, settlement.vendor_id),
                fmt.amount(settlement.vendor_target),
                fmt.amount(settlement.total_paid_to_vendor),
                fmt.amount(settlement.remaining_balance),
                format!("{:.2}%", settlement.payment_progress),
            ]);
        }
        output::info(table.render());
        let owed: Decimal = pending.iter().map(|s| s.remaining_balance).sum();
        output::info(format!("Total owed: {}", fmt.money(owed)));
    })
}

fn vendor_name(ledger: &Ledger, id: uuid::Uuid) -> String {
    ledger
        .vendor(id)
        .map(|vendor| vendor.name.clone())
        .unwrap_or_else(|| UNKNOWN_DIMENSION.to_string())
}

#[derive(Serialize)]
struct InstallmentView<'a> {
    counts: InstallmentCounts,
    plans: Vec<&'a InstallmentPlan>,
}

fn cmd_installments(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    context.ensure_ledger()?;
    let ledger = context.ledger()?;
    let today = context.today();
    let window = parsed
        .parse_value::<u32>("days")?
        .unwrap_or(context.analytics().upcoming_window_days);
    let counts = InstallmentService::counts(ledger, &FilterPredicate::all(), today);
    let (title, plans) = match parsed.positional(0) {
        None | Some("overdue") => ("Overdue installments", InstallmentService::overdue(ledger, today)),
        Some("upcoming") => (
            "Upcoming installments",
            InstallmentService::upcoming(ledger, today, window),
        ),
        Some("reminders") => (
            "Reminders to send",
            InstallmentService::reminders_due(ledger, today, window),
        ),
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown installment view `{other}`"
            )))
        }
    };
    let fmt = context.formatter();
    let view = InstallmentView { counts, plans };

    emit(context, &parsed, &view, || {
        output::info(format!(
            "{} active plan(s): {} pending, {} overdue",
            counts.active, counts.pending, counts.overdue
        ));
        output::section(title);
        if view.plans.is_empty() {
            output::info("Nothing due.");
            return;
        }
        print_plans(ledger, &fmt, &view.plans);
    })
}

fn print_plans(ledger: &Ledger, fmt: &Formatter, plans: &[&InstallmentPlan]) {
    let mut table = Table::new(vec![
        TableColumn::left("Plan"),
        TableColumn::left("Item").max_width(28),
        TableColumn::left("Client"),
        TableColumn::left("Due"),
        TableColumn::right("Installment"),
        TableColumn::right("Remaining"),
        TableColumn::left("Reminded"),
    ]);
    for plan in plans {
        let item = ledger
            .item(plan.item_id)
            .map(|item| item.title.clone())
            .unwrap_or_else(|| UNKNOWN_DIMENSION.to_string());
        let client = ledger
            .client(plan.client_id)
            .map(|client| client.name.clone())
            .unwrap_or_else(|| UNKNOWN_DIMENSION.to_string());
        let mut short_id = plan.id.to_string();
        short_id.truncate(8);
        table.push([
            short_id,
            item,
            client,
            plan.next_due_date.to_string(),
            fmt.amount(plan.installment_amount),
            fmt.amount(plan.remaining_amount),
            if plan.reminder_sent { "yes" } else { "no" }.to_string(),
        ]);
    }
    output::info(table.render());
}
