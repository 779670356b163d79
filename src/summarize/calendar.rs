use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use super::{BucketBy, DateRange};

/// "YYYY-MM" labels for every calendar month from `start`'s month through
/// `end`'s month, inclusive. Empty when `start` is after `end`.
pub fn get_months(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    if start > end {
        return Vec::new();
    }

    let (start_year, end_year) = (start.year(), end.year());

    if start_year == end_year {
        return months_of_year(start_year, start.month(), end.month());
    }

    let mut months = months_of_year(start_year, start.month(), 12);
    for year in start_year + 1..end_year {
        months.extend(months_of_year(year, 1, 12));
    }
    months.extend(months_of_year(end_year, 1, end.month()));
    months
}

fn months_of_year(year: i32, first: u32, last: u32) -> Vec<String> {
    (first..=last).map(|m| format!("{year:04}-{m:02}")).collect()
}

/// The ordered buckets of one report and the lookup from a date to its bucket.
#[derive(Debug, Clone)]
pub struct Buckets {
    labels: Vec<String>,
    kind: BucketKind,
}

#[derive(Debug, Clone)]
enum BucketKind {
    Months(HashMap<String, usize>),
    Range(DateRange),
}

impl Buckets {
    pub fn for_range(range: DateRange, bucket_by: BucketBy) -> Self {
        match bucket_by {
            BucketBy::Month => Self::months(range),
            BucketBy::Range => Self::whole_range(range),
        }
    }

    pub fn months(range: DateRange) -> Self {
        let labels = get_months(range.start, range.end);
        let index = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx))
            .collect();
        Self {
            labels,
            kind: BucketKind::Months(index),
        }
    }

    /// A single bucket covering the whole range (none if the range is empty).
    pub fn whole_range(range: DateRange) -> Self {
        let labels = if range.is_empty() {
            Vec::new()
        } else {
            vec![range.to_string()]
        };
        Self {
            labels,
            kind: BucketKind::Range(range),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn bucket_idx(&self, date: NaiveDate) -> Option<usize> {
        match &self.kind {
            BucketKind::Months(index) => index.get(&date.format("%Y-%m").to_string()).copied(),
            BucketKind::Range(range) => (!self.labels.is_empty() && range.contains(date)).then_some(0),
        }
    }
}
