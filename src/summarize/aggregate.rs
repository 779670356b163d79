use std::collections::HashMap;

use crate::error::{LedgerError, Result};

use super::report::{bucket_slot, GroupId, Report};
use super::source::SummarySource;

/// Fold a source's items into a dense report with one zero-initialized row
/// per catalog group. Items are added in source order.
///
/// An item for a group the catalog did not produce is an error; nothing is
/// dropped or invented.
pub fn summarize<S: SummarySource + ?Sized>(source: &S) -> Result<Report> {
    let mut report = Report::new(source.buckets().to_vec());
    for (group_id, name) in source.groups() {
        report.add_group(*group_id, name.clone());
    }

    let row_index: HashMap<GroupId, usize> = report
        .groups
        .iter()
        .enumerate()
        .map(|(idx, g)| (g.group_id, idx))
        .collect();

    for item in source.items() {
        let idx = *row_index
            .get(&item.group_id)
            .ok_or(LedgerError::UnknownGroup(item.group_id))?;
        *bucket_slot(&mut report.groups[idx], item.bucket_idx)? += item.value;
    }

    Ok(report)
}
