use std::thread;

use serde::Serialize;

use crate::error::{LedgerError, Result};
use crate::models::Ledger;

use super::report::Report;
use super::{summarize_transactions, BucketBy, DateRange, GroupBy, SummaryOptions};

/// Income against expenses over the same monthly buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceReport {
    pub income: Report,
    pub expenses: Report,
    /// Income minus expenses, per bucket.
    pub savings: Vec<f64>,
    pub savings_total: f64,
    /// Savings as a whole percentage of income, per bucket (0 with no income).
    pub savings_percentages: Vec<i64>,
    pub savings_total_percentage: i64,
}

/// `round(100 * part / whole)`, or 0 when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> i64 {
    if whole == 0.0 {
        0
    } else {
        (100.0 * part / whole).round() as i64
    }
}

/// Summarize income and expenses (both monthly, unmerged) and derive the
/// savings between them. The two summaries are built concurrently.
pub fn summarize_balance(ledger: &Ledger, range: DateRange, group_by: GroupBy) -> Result<BalanceReport> {
    let options = |is_expense| SummaryOptions {
        is_expense,
        group_by,
        bucket_by: BucketBy::Month,
        merge_under_threshold: false,
    };
    let income_options = options(false);
    let expense_options = options(true);

    let (income, expenses) = thread::scope(|s| {
        let expenses = s.spawn(|| summarize_transactions(ledger, range, &expense_options));
        let income = summarize_transactions(ledger, range, &income_options);
        let expenses = expenses
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        (income, expenses)
    });

    compose(income?, expenses?)
}

/// Combine an income and an expense report built over the same buckets.
pub fn compose(income: Report, expenses: Report) -> Result<BalanceReport> {
    if income.buckets != expenses.buckets {
        return Err(LedgerError::BucketMismatch);
    }

    let savings: Vec<f64> = income
        .bucket_totals
        .iter()
        .zip(&expenses.bucket_totals)
        .map(|(i, e)| i - e)
        .collect();

    let savings_percentages = savings
        .iter()
        .zip(&income.bucket_totals)
        .map(|(saving, income)| percentage(*saving, *income))
        .collect();

    let savings_total = income.sum_total - expenses.sum_total;
    let savings_total_percentage = percentage(savings_total, income.sum_total);

    tracing::debug!(savings_total, savings_total_percentage, "composed balance");

    Ok(BalanceReport {
        income,
        expenses,
        savings,
        savings_total,
        savings_percentages,
        savings_total_percentage,
    })
}
