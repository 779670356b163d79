use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{LedgerError, Result};

/// Identity of a report row: a real category/subcategory id, or the
/// synthetic "Other" row created by merging small groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupId {
    Real(i64),
    Other,
}

pub const OTHER_NAME: &str = "Other";

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Real(id) => write!(f, "{id}"),
            GroupId::Other => f.write_str(OTHER_NAME),
        }
    }
}

// Clients see "Other" under the reserved id 0.
impl Serialize for GroupId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            GroupId::Real(id) => serializer.serialize_i64(*id),
            GroupId::Other => serializer.serialize_i64(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub group_id: GroupId,
    pub name: String,
    /// One value per bucket.
    pub data: Vec<f64>,
    /// Filled in by the totals step.
    pub total: Option<f64>,
}

impl ReportRow {
    pub fn new(group_id: GroupId, name: impl Into<String>, bucket_count: usize) -> Self {
        Self {
            group_id,
            name: name.into(),
            data: vec![0.0; bucket_count],
            total: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|d| *d == 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub buckets: Vec<String>,
    /// Rows in catalog order, with "Other" (if any) last.
    pub groups: Vec<ReportRow>,
    pub bucket_totals: Vec<f64>,
    pub sum_total: f64,
}

impl Report {
    pub fn new(buckets: Vec<String>) -> Self {
        let bucket_totals = vec![0.0; buckets.len()];
        Self {
            buckets,
            groups: Vec::new(),
            bucket_totals,
            sum_total: 0.0,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn add_group(&mut self, group_id: GroupId, name: impl Into<String>) {
        let row = ReportRow::new(group_id, name, self.bucket_count());
        self.groups.push(row);
    }

    pub fn group(&self, group_id: GroupId) -> Option<&ReportRow> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    pub fn group_mut(&mut self, group_id: GroupId) -> Result<&mut ReportRow> {
        self.groups
            .iter_mut()
            .find(|g| g.group_id == group_id)
            .ok_or(LedgerError::UnknownGroup(group_id))
    }

    pub fn set(&mut self, group_id: GroupId, bucket_idx: usize, value: f64) -> Result<()> {
        let slot = bucket_slot(self.group_mut(group_id)?, bucket_idx)?;
        *slot = value;
        Ok(())
    }

    pub fn add(&mut self, group_id: GroupId, bucket_idx: usize, value: f64) -> Result<()> {
        let slot = bucket_slot(self.group_mut(group_id)?, bucket_idx)?;
        *slot += value;
        Ok(())
    }

    /// `(group_id, value)` for every row at one bucket, in row order.
    pub fn data_for_bucket(&self, bucket_idx: usize) -> Vec<(GroupId, f64)> {
        self.groups
            .iter()
            .map(|g| (g.group_id, g.data[bucket_idx]))
            .collect()
    }
}

pub(crate) fn bucket_slot(row: &mut ReportRow, bucket_idx: usize) -> Result<&mut f64> {
    let len = row.data.len();
    row.data.get_mut(bucket_idx).ok_or_else(|| {
        LedgerError::Other(format!("bucket index {bucket_idx} out of range (report has {len} buckets)"))
    })
}
