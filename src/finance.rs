// 💰 Financial Summary Aggregator
// Reduces club transactions to income / expenses / net profit
// within an optional inclusive date window.

use crate::db::{Transaction, TransactionKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// DATE WINDOW
// ============================================================================

/// Inclusive calendar-date window. An unset bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    /// Window with no bounds: keeps every transaction.
    pub fn unbounded() -> Self {
        DateWindow {
            start: None,
            end: None,
        }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateWindow {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn since(start: NaiveDate) -> Self {
        DateWindow {
            start: Some(start),
            end: None,
        }
    }

    pub fn until(end: NaiveDate) -> Self {
        DateWindow {
            start: None,
            end: Some(end),
        }
    }

    /// start <= date <= end, each bound checked only when set.
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Derived totals for the admin finance dashboard.
/// An empty filtered set yields the all-zero summary, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub transaction_count: usize,
}

impl FinanceSummary {
    pub fn zero() -> Self {
        FinanceSummary {
            total_income: 0.0,
            total_expenses: 0.0,
            net_profit: 0.0,
            transaction_count: 0,
        }
    }
}

/// Transactions whose calendar date falls inside the window,
/// in input order. Filtering twice with the same window is a no-op.
pub fn filter_window<'a>(
    transactions: &'a [Transaction],
    window: &DateWindow,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|tx| window.contains(tx.date_only()))
        .collect()
}

/// Pure reduce of (transactions, window) to the dashboard summary.
/// Input is never mutated; the caller re-runs this on every data change.
pub fn summarize(transactions: &[Transaction], window: &DateWindow) -> FinanceSummary {
    let mut summary = FinanceSummary::zero();

    for tx in transactions {
        if !window.contains(tx.date_only()) {
            continue;
        }

        match tx.kind {
            TransactionKind::Income => summary.total_income += tx.amount,
            TransactionKind::Expense => summary.total_expenses += tx.amount,
        }
        summary.transaction_count += 1;
    }

    summary.net_profit = summary.total_income - summary.total_expenses;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::parse_timestamp;

    fn tx(date: &str, amount: f64, kind: TransactionKind) -> Transaction {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            date: parse_timestamp(date).unwrap(),
            amount,
            kind,
            category: "Membership".to_string(),
            description: String::new(),
            payment_method: "CASH".to_string(),
        }
    }

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_summary_worked_example() {
        // The admin dashboard example: 100 in, 40 out, 60 net
        let transactions = vec![
            tx("2024-01-01", 100.0, TransactionKind::Income),
            tx("2024-01-02", 40.0, TransactionKind::Expense),
        ];
        let window = DateWindow::between(day("2024-01-01"), day("2024-01-02"));

        let summary = summarize(&transactions, &window);
        assert_eq!(summary.total_income, 100.0);
        assert_eq!(summary.total_expenses, 40.0);
        assert_eq!(summary.net_profit, 60.0);
        assert_eq!(summary.transaction_count, 2);
    }

    #[test]
    fn test_net_profit_identity() {
        let transactions = vec![
            tx("2024-01-01", 120.0, TransactionKind::Income),
            tx("2024-01-05", 80.5, TransactionKind::Expense),
            tx("2024-01-09", 30.25, TransactionKind::Income),
            tx("2024-02-01", 10.0, TransactionKind::Expense),
        ];

        for window in [
            DateWindow::unbounded(),
            DateWindow::between(day("2024-01-01"), day("2024-01-31")),
            DateWindow::since(day("2024-01-06")),
            DateWindow::until(day("2024-01-05")),
        ] {
            let summary = summarize(&transactions, &window);
            assert_eq!(
                summary.net_profit,
                summary.total_income - summary.total_expenses
            );
        }
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let transactions = vec![
            tx("2024-01-01T23:59:00Z", 10.0, TransactionKind::Income),
            tx("2024-01-31T00:00:00Z", 20.0, TransactionKind::Income),
            tx("2024-02-01T00:00:00Z", 40.0, TransactionKind::Income),
        ];
        let window = DateWindow::between(day("2024-01-01"), day("2024-01-31"));

        let summary = summarize(&transactions, &window);
        // Both boundary days count; time-of-day is irrelevant
        assert_eq!(summary.total_income, 30.0);
        assert_eq!(summary.transaction_count, 2);
    }

    #[test]
    fn test_empty_window_is_zero_not_error() {
        let transactions = vec![tx("2024-06-01", 500.0, TransactionKind::Income)];
        let window = DateWindow::between(day("2023-01-01"), day("2023-12-31"));

        assert_eq!(summarize(&transactions, &window), FinanceSummary::zero());
        assert_eq!(summarize(&[], &DateWindow::unbounded()), FinanceSummary::zero());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let transactions = vec![
            tx("2024-01-01", 100.0, TransactionKind::Income),
            tx("2024-03-01", 40.0, TransactionKind::Expense),
            tx("2024-05-01", 25.0, TransactionKind::Income),
        ];
        let window = DateWindow::between(day("2024-01-01"), day("2024-03-31"));

        let once: Vec<Transaction> = filter_window(&transactions, &window)
            .into_iter()
            .cloned()
            .collect();
        let twice: Vec<Transaction> = filter_window(&once, &window)
            .into_iter()
            .cloned()
            .collect();

        assert_eq!(once.len(), twice.len());
        let summary_once = summarize(&once, &window);
        let summary_twice = summarize(&twice, &window);
        assert_eq!(summary_once, summary_twice);
    }

    #[test]
    fn test_inputs_not_mutated() {
        let transactions = vec![
            tx("2024-01-01", 100.0, TransactionKind::Income),
            tx("2024-01-02", 40.0, TransactionKind::Expense),
        ];
        let before: Vec<f64> = transactions.iter().map(|t| t.amount).collect();

        let _ = summarize(&transactions, &DateWindow::unbounded());

        let after: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
        assert_eq!(before, after);
    }
}
