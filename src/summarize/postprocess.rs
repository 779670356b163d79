//! Steps that shape an aggregated report for display.
//!
//! Each step assumes the invariants left by the steps before it (e.g. the
//! merge step sees display-signed values, totals are computed only once the
//! row set is final), so the order returned by [`pipeline_for`] matters.

use super::report::{GroupId, Report, ReportRow, OTHER_NAME};
use super::{BucketBy, SummaryOptions};

pub trait Postprocessor {
    fn name(&self) -> &'static str;
    fn execute(&self, report: &mut Report);
}

/// Round a value to 2 decimal places, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct FixPrecision;

impl Postprocessor for FixPrecision {
    fn name(&self) -> &'static str {
        "fix_precision"
    }

    fn execute(&self, report: &mut Report) {
        for g in &mut report.groups {
            for d in &mut g.data {
                *d = round_cents(*d);
            }
        }
    }
}

/// Expenses are stored as negative debits; show them as positive amounts.
/// Zero stays `0.0`, never `-0.0`.
pub struct ReverseSign;

impl Postprocessor for ReverseSign {
    fn name(&self) -> &'static str {
        "reverse_sign"
    }

    fn execute(&self, report: &mut Report) {
        for g in &mut report.groups {
            for d in &mut g.data {
                *d = -*d + 0.0;
            }
        }
    }
}

/// In every bucket, fold the smallest groups whose running sum stays within
/// 10% of the bucket total into a synthetic "Other" row. A single group is
/// never merged on its own.
pub struct MergeUnderThreshold;

impl MergeUnderThreshold {
    fn merge_bucket(report: &mut Report, bucket_idx: usize, other: &mut ReportRow) {
        let mut bucket_data = report.data_for_bucket(bucket_idx);
        let bucket_sum: f64 = bucket_data.iter().map(|(_, v)| v).sum();
        let threshold = (bucket_sum / 10.0).floor();

        // Stable: equal values keep catalog order.
        bucket_data.sort_by(|a, b| a.1.total_cmp(&b.1));

        let Some(threshold_idx) = find_threshold_idx(&bucket_data, threshold) else {
            return;
        };
        if threshold_idx < 1 {
            return;
        }

        let merged = &bucket_data[..=threshold_idx];
        tracing::debug!(
            bucket = %report.buckets[bucket_idx],
            threshold,
            merged = merged.len(),
            "merging groups under threshold"
        );
        for (group_id, value) in merged {
            other.data[bucket_idx] += value;
            if let Some(g) = report.groups.iter_mut().find(|g| g.group_id == *group_id) {
                g.data[bucket_idx] = 0.0;
            }
        }
    }
}

/// Index of the last entry of the ascending `bucket_data` whose inclusive
/// running sum does not exceed `threshold`, or `None` if even the first does.
fn find_threshold_idx(bucket_data: &[(GroupId, f64)], threshold: f64) -> Option<usize> {
    let mut partial_sum = 0.0;
    let mut idx = None;
    for (i, (_, value)) in bucket_data.iter().enumerate() {
        partial_sum += value;
        if partial_sum > threshold {
            break;
        }
        idx = Some(i);
    }
    idx
}

impl Postprocessor for MergeUnderThreshold {
    fn name(&self) -> &'static str {
        "merge_under_threshold"
    }

    fn execute(&self, report: &mut Report) {
        let mut other = ReportRow::new(GroupId::Other, OTHER_NAME, report.bucket_count());
        for bucket_idx in 0..report.bucket_count() {
            Self::merge_bucket(report, bucket_idx, &mut other);
        }
        if !other.is_empty() {
            report.groups.push(other);
        }
    }
}

/// Drop rows that are zero in every bucket.
pub struct EraseEmptyGroups;

impl Postprocessor for EraseEmptyGroups {
    fn name(&self) -> &'static str {
        "erase_empty_groups"
    }

    fn execute(&self, report: &mut Report) {
        report.groups.retain(|g| !g.is_empty());
    }
}

/// Sum from `+0.0`, so that an empty sum is never `-0.0`.
fn sum(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, v| acc + v)
}

pub struct CalcTotals;

impl Postprocessor for CalcTotals {
    fn name(&self) -> &'static str {
        "calc_totals"
    }

    fn execute(&self, report: &mut Report) {
        for g in &mut report.groups {
            g.total = Some(sum(g.data.iter().copied()));
        }

        report.bucket_totals = (0..report.bucket_count())
            .map(|idx| sum(report.groups.iter().map(|g| g.data[idx])))
            .collect();

        report.sum_total = sum(report.bucket_totals.iter().copied());
    }
}

/// Rank groups by their value in the first bucket, largest first.
pub struct OrderGroupsBySizeInFirstBucket;

impl Postprocessor for OrderGroupsBySizeInFirstBucket {
    fn name(&self) -> &'static str {
        "order_groups_by_size_in_first_bucket"
    }

    fn execute(&self, report: &mut Report) {
        if report.bucket_count() == 0 {
            return;
        }
        report.groups.sort_by(|a, b| b.data[0].total_cmp(&a.data[0]));
    }
}

/// The ordered steps for a transactions report with the given options.
pub fn pipeline_for(options: &SummaryOptions) -> Vec<Box<dyn Postprocessor>> {
    let mut steps: Vec<Box<dyn Postprocessor>> = vec![Box::new(FixPrecision)];

    if options.is_expense {
        steps.push(Box::new(ReverseSign));
    }

    if options.merge_under_threshold {
        steps.push(Box::new(MergeUnderThreshold));
    }

    steps.push(Box::new(EraseEmptyGroups));
    steps.push(Box::new(CalcTotals));

    if options.bucket_by == BucketBy::Range {
        steps.push(Box::new(OrderGroupsBySizeInFirstBucket));
    }

    steps
}

/// Run `steps` in order, handing the report from one to the next.
pub fn run(mut report: Report, steps: &[Box<dyn Postprocessor>]) -> Report {
    for step in steps {
        tracing::debug!(step = step.name(), groups = report.groups.len(), "postprocess");
        step.execute(&mut report);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::GroupBy;

    fn report_with(rows: &[(i64, &[f64])]) -> Report {
        let buckets = (1..=rows[0].1.len()).map(|m| format!("2022-{m:02}")).collect();
        let mut report = Report::new(buckets);
        for (id, data) in rows {
            report.add_group(GroupId::Real(*id), format!("g{id}"));
            report.groups.last_mut().unwrap().data = data.to_vec();
        }
        report
    }

    fn bucket_sum(report: &Report, idx: usize) -> f64 {
        report.groups.iter().map(|g| g.data[idx]).sum()
    }

    #[test]
    fn test_fix_precision_rounds_to_cents() {
        let mut r = report_with(&[(1, &[10.004, -3.336, 2.5])]);
        FixPrecision.execute(&mut r);
        assert_eq!(r.groups[0].data, vec![10.0, -3.34, 2.5]);
    }

    #[test]
    fn test_reverse_sign_twice_is_identity() {
        let original = report_with(&[(1, &[-12.5, 0.0, 7.25]), (2, &[3.0, -1.0, 0.0])]);
        let mut r = original.clone();
        ReverseSign.execute(&mut r);
        assert_eq!(r.groups[0].data, vec![12.5, 0.0, -7.25]);
        ReverseSign.execute(&mut r);
        assert_eq!(r, original);
    }

    #[test]
    fn test_reverse_sign_keeps_zero_positive() {
        let mut r = report_with(&[(1, &[0.0, -3.0])]);
        ReverseSign.execute(&mut r);
        assert!(r.groups[0].data[0].is_sign_positive());
        ReverseSign.execute(&mut r);
        assert!(r.groups[0].data[0].is_sign_positive());
        assert_eq!(r.groups[0].data, vec![0.0, -3.0]);
    }

    #[test]
    fn test_calc_totals_of_empty_report_are_positive_zero() {
        let mut r = Report::new(vec!["2022-01".into()]);
        CalcTotals.execute(&mut r);
        assert!(r.bucket_totals[0].is_sign_positive());
        assert!(r.sum_total.is_sign_positive());
    }

    #[test]
    fn test_merge_includes_negative_values() {
        let mut r = report_with(&[(1, &[-5.0]), (2, &[2.0]), (3, &[100.0])]);
        MergeUnderThreshold.execute(&mut r);
        assert_eq!(r.groups.len(), 4);
        assert_eq!(r.groups[0].data, vec![0.0]);
        assert_eq!(r.groups[1].data, vec![0.0]);
        assert_eq!(r.groups[2].data, vec![100.0]);
        let other = r.groups.last().unwrap();
        assert_eq!(other.group_id, GroupId::Other);
        assert_eq!(other.name, "Other");
        assert_eq!(other.data, vec![-3.0]);
    }

    #[test]
    fn test_merge_never_merges_a_single_group() {
        let mut r = report_with(&[(1, &[5.0]), (2, &[60.0]), (3, &[100.0])]);
        let before = r.clone();
        MergeUnderThreshold.execute(&mut r);
        assert_eq!(r, before);
    }

    #[test]
    fn test_merge_preserves_bucket_sums() {
        let mut r = report_with(&[
            (1, &[1.0, 50.0, 0.0]),
            (2, &[2.0, 3.0, 0.0]),
            (3, &[3.0, 4.0, 0.0]),
            (4, &[200.0, 60.0, 0.0]),
        ]);
        let before: Vec<f64> = (0..3).map(|i| bucket_sum(&r, i)).collect();
        MergeUnderThreshold.execute(&mut r);
        let after: Vec<f64> = (0..3).map(|i| bucket_sum(&r, i)).collect();
        assert_eq!(before, after);

        let other = r.group(GroupId::Other).unwrap();
        assert_eq!(other.data, vec![6.0, 7.0, 0.0]);
        assert_eq!(r.group(GroupId::Real(1)).unwrap().data, vec![0.0, 50.0, 0.0]);
    }

    #[test]
    fn test_merge_without_candidates_adds_no_other_row() {
        let mut r = report_with(&[(1, &[0.0, 0.0])]);
        MergeUnderThreshold.execute(&mut r);
        assert!(r.group(GroupId::Other).is_none());
    }

    #[test]
    fn test_merge_ties_keep_catalog_order() {
        let mut r = report_with(&[(1, &[4.0]), (2, &[4.0]), (3, &[4.0]), (4, &[200.0])]);
        // bucket_sum = 212, threshold = 21: all three 4s fit (12), then 212 overflows.
        MergeUnderThreshold.execute(&mut r);
        assert_eq!(r.group(GroupId::Other).unwrap().data, vec![12.0]);
    }

    #[test]
    fn test_find_threshold_idx() {
        let data = [(GroupId::Real(1), 1.0), (GroupId::Real(2), 2.0), (GroupId::Real(3), 50.0)];
        assert_eq!(find_threshold_idx(&data, 3.0), Some(1));
        assert_eq!(find_threshold_idx(&data, 0.0), None);
        assert_eq!(find_threshold_idx(&data, 100.0), Some(2));
    }

    #[test]
    fn test_erase_empty_groups_is_idempotent() {
        let mut r = report_with(&[(1, &[0.0, 0.0]), (2, &[0.0, 1.0]), (3, &[-0.0, 0.0])]);
        EraseEmptyGroups.execute(&mut r);
        let once = r.clone();
        EraseEmptyGroups.execute(&mut r);
        assert_eq!(r, once);
        assert_eq!(r.groups.len(), 1);
        assert_eq!(r.groups[0].group_id, GroupId::Real(2));
    }

    #[test]
    fn test_calc_totals() {
        let mut r = report_with(&[(1, &[1.5, 2.0]), (2, &[10.0, -4.0])]);
        CalcTotals.execute(&mut r);
        assert_eq!(r.groups[0].total, Some(3.5));
        assert_eq!(r.groups[1].total, Some(6.0));
        assert_eq!(r.bucket_totals, vec![11.5, -2.0]);
        assert_eq!(r.sum_total, 9.5);
    }

    #[test]
    fn test_calc_totals_is_not_cumulative() {
        let mut r = report_with(&[(1, &[1.0])]);
        CalcTotals.execute(&mut r);
        CalcTotals.execute(&mut r);
        assert_eq!(r.bucket_totals, vec![1.0]);
        assert_eq!(r.sum_total, 1.0);
    }

    #[test]
    fn test_order_by_first_bucket() {
        let mut r = report_with(&[(1, &[5.0]), (2, &[50.0]), (3, &[5.0]), (4, &[20.0])]);
        OrderGroupsBySizeInFirstBucket.execute(&mut r);
        let ids: Vec<GroupId> = r.groups.iter().map(|g| g.group_id).collect();
        assert_eq!(
            ids,
            vec![GroupId::Real(2), GroupId::Real(4), GroupId::Real(1), GroupId::Real(3)]
        );
    }

    #[test]
    fn test_pipeline_order() {
        let names = |o: &SummaryOptions| -> Vec<&'static str> {
            pipeline_for(o).iter().map(|s| s.name()).collect()
        };
        let mut o = SummaryOptions {
            is_expense: false,
            group_by: GroupBy::Category,
            bucket_by: BucketBy::Month,
            merge_under_threshold: false,
        };
        assert_eq!(names(&o), vec!["fix_precision", "erase_empty_groups", "calc_totals"]);

        o.is_expense = true;
        o.merge_under_threshold = true;
        o.bucket_by = BucketBy::Range;
        assert_eq!(
            names(&o),
            vec![
                "fix_precision",
                "reverse_sign",
                "merge_under_threshold",
                "erase_empty_groups",
                "calc_totals",
                "order_groups_by_size_in_first_bucket",
            ]
        );
    }
}
