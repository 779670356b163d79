use std::collections::HashMap;

use crate::error::{LedgerError, Result};
use crate::models::{Ledger, Transaction};

use super::calendar::Buckets;
use super::catalog::GroupCatalog;
use super::report::GroupId;
use super::{DateRange, SummaryOptions};

/// One transaction, resolved to the row and bucket it adds to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceItem {
    pub group_id: GroupId,
    pub bucket_idx: usize,
    pub value: f64,
}

/// Everything the aggregator needs to build a report.
pub trait SummarySource {
    fn buckets(&self) -> &[String];
    fn groups(&self) -> &[(GroupId, String)];
    fn items(&self) -> &[SourceItem];
}

/// The subcategory a transaction is reported under.
///
/// An overridden transaction uses its own subcategory even when that is
/// `None` (explicitly uncategorized); otherwise it inherits the payee's.
pub fn effective_subcategory(txn: &Transaction, payee_subcategory: Option<i64>) -> Option<i64> {
    if txn.override_subcategory {
        txn.subcategory_id
    } else {
        payee_subcategory
    }
}

/// Map one transaction onto the report. `Ok(None)` means the transaction is
/// uncategorized or its category is not part of this report.
pub fn map_transaction(
    txn: &Transaction,
    payee_subcategory: Option<i64>,
    catalog: &GroupCatalog,
    buckets: &Buckets,
    range: DateRange,
) -> Result<Option<SourceItem>> {
    let Some(group_id) = effective_subcategory(txn, payee_subcategory)
        .and_then(|s| catalog.group_for_subcategory(s))
    else {
        return Ok(None);
    };

    let bucket_idx = buckets
        .bucket_idx(txn.date)
        .ok_or_else(|| LedgerError::DateOutOfRange {
            date: txn.date.format("%Y-%m-%d").to_string(),
            range: range.to_string(),
        })?;

    Ok(Some(SourceItem {
        group_id,
        bucket_idx,
        value: txn.amount,
    }))
}

/// Summary source over a ledger's transactions.
#[derive(Debug, Clone)]
pub struct TransactionsSource {
    buckets: Buckets,
    catalog: GroupCatalog,
    items: Vec<SourceItem>,
}

impl TransactionsSource {
    /// Build the calendar and catalog, then map every transaction dated
    /// within `range`. Transactions outside the range are skipped here,
    /// before mapping.
    pub fn load(ledger: &Ledger, range: DateRange, options: &SummaryOptions) -> Result<Self> {
        let buckets = Buckets::for_range(range, options.bucket_by);
        let catalog = GroupCatalog::build(
            &ledger.categories,
            &ledger.subcategories,
            options.is_expense,
            options.group_by,
        );

        let payee_subcategories: HashMap<i64, Option<i64>> = ledger
            .payees
            .iter()
            .map(|p| (p.id, p.subcategory_id))
            .collect();

        let mut items = Vec::new();
        let mut skipped = 0usize;
        for txn in ledger.transactions.iter().filter(|t| range.contains(t.date)) {
            let payee_subcategory = payee_subcategories.get(&txn.payee_id).copied().flatten();
            match map_transaction(txn, payee_subcategory, &catalog, &buckets, range)? {
                Some(item) => items.push(item),
                None => skipped += 1,
            }
        }

        tracing::debug!(
            %range,
            buckets = buckets.len(),
            mapped = items.len(),
            skipped,
            "mapped transactions"
        );

        Ok(Self {
            buckets,
            catalog,
            items,
        })
    }
}

impl SummarySource for TransactionsSource {
    fn buckets(&self) -> &[String] {
        self.buckets.labels()
    }

    fn groups(&self) -> &[(GroupId, String)] {
        self.catalog.groups()
    }

    fn items(&self) -> &[SourceItem] {
        &self.items
    }
}
