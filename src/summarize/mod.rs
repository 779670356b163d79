//! Time-bucketed, grouped summaries of ledger transactions.
//!
//! A summary is produced in four stages: the bucket calendar and group
//! catalog are built from the date range and taxonomy, transactions are
//! mapped onto (group, bucket, amount) items, the items are folded into a
//! dense [`Report`], and finally a fixed pipeline of postprocessors shapes
//! the report for display.

pub mod aggregate;
pub mod balance;
pub mod calendar;
pub mod catalog;
pub mod postprocess;
pub mod report;
pub mod source;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::models::Ledger;

pub use balance::{summarize_balance, BalanceReport};
pub use report::{GroupId, Report, ReportRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Category,
    Subcategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BucketBy {
    /// One bucket per calendar month.
    Month,
    /// A single bucket spanning the whole range; groups are ranked by size.
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOptions {
    pub is_expense: bool,
    pub group_by: GroupBy,
    pub bucket_by: BucketBy,
    pub merge_under_threshold: bool,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse a range from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| LedgerError::InvalidDate(s.to_string()))
}

/// Build a report of the ledger's transactions in `range`.
pub fn summarize_transactions(
    ledger: &Ledger,
    range: DateRange,
    options: &SummaryOptions,
) -> Result<Report> {
    let source = source::TransactionsSource::load(ledger, range, options)?;
    let report = aggregate::summarize(&source)?;
    Ok(postprocess::run(report, &postprocess::pipeline_for(options)))
}
