//! Report command handlers.

use crate::args::{ReportMonthArgs, TrendArgs};
use crate::commands::{money, Out};
use crate::report::{self, BudgetStatus, Summary};
use crate::store::Storage;
use crate::Result;
use chrono::Local;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything `report month` shows for one month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthReport {
    pub summary: Summary,
    /// Signed totals keyed by category id.
    pub category_totals: BTreeMap<i32, Decimal>,
    pub budgets: Vec<BudgetStatus>,
}

/// Reports on one month, the current month when none is given.
pub fn report_month(store: &dyn Storage, args: &ReportMonthArgs) -> Result<Out<MonthReport>> {
    let month = args
        .month()
        .map(str::to_string)
        .unwrap_or_else(|| Local::now().format("%Y-%m").to_string());
    let summary = report::summary(store, &month);
    let category_totals = report::category_totals(store, &month);
    let budgets = report::budget_status(store, &month);

    let names: BTreeMap<i32, String> = store
        .categories()
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let mut message = format!(
        "{month}: income {}, expense {}, balance {}",
        money(summary.income),
        money(summary.expense),
        money(summary.balance)
    );
    for (id, total) in &category_totals {
        let name = names.get(id).map_or("", String::as_str);
        message.push_str(&format!("\n  {name} ({id}) {:>12}", money(*total)));
    }
    for status in &budgets {
        message.push_str(&format!(
            "\n  budget {}: spent {} of {}, {} remaining",
            status.category_name,
            money(status.spent),
            money(status.allocated),
            money(status.remaining)
        ));
    }
    Ok(Out::new(
        message,
        MonthReport {
            summary,
            category_totals,
            budgets,
        },
    ))
}

/// Totals per month for either income or expense transactions.
pub fn report_trend(
    store: &dyn Storage,
    args: &TrendArgs,
) -> Result<Out<BTreeMap<String, Decimal>>> {
    let totals = report::monthly_totals(store, args.income());
    let kind = if args.income() { "Income" } else { "Expense" };
    let mut message = format!("{kind} by month");
    for (month, total) in &totals {
        message.push_str(&format!("\n  {month} {:>12}", money(*total)));
    }
    Ok(Out::new(message, totals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use crate::model::{Budget, Category, Transaction};
    use crate::test::TestEnv;

    #[test]
    fn test_report_month() {
        let env = TestEnv::new();
        let mut store = env.store();
        store.add_category(&Category::new("Food", "", "#fff")).unwrap();
        store
            .add_transaction(&Transaction::new("2024-03-05", dec!(50.0), "", 1, false))
            .unwrap();
        store
            .add_transaction(&Transaction::new("2024-03-06", dec!(1200.0), "", 2, true))
            .unwrap();
        store.add_budget(&Budget::new(1, "2024-03", dec!(200.0))).unwrap();

        let out = report_month(store.as_ref(), &ReportMonthArgs::new(Some("2024-03".into())))
            .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.summary.balance, dec!(1150.0));
        assert_eq!(report.category_totals[&1], dec!(-50.0));
        assert_eq!(report.category_totals.len(), 1);
        assert_eq!(report.budgets[0].remaining, dec!(150.0));
        assert!(out.message().contains("income 1,200.00"));
    }

    #[test]
    fn test_report_trend() {
        let env = TestEnv::new();
        let mut store = env.store();
        for date in ["2024-01-05", "2024-01-20", "2024-02-01"] {
            store
                .add_transaction(&Transaction::new(date, dec!(10.0), "", 1, false))
                .unwrap();
        }
        let out = report_trend(store.as_ref(), &TrendArgs::new(false)).unwrap();
        let totals = out.structure().unwrap();
        assert_eq!(totals["2024-01"], dec!(20.0));
        assert_eq!(totals["2024-02"], dec!(10.0));
        assert!(report_trend(store.as_ref(), &TrendArgs::new(true))
            .unwrap()
            .structure()
            .unwrap()
            .is_empty());
    }
}
