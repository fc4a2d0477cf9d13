use std::collections::{BTreeMap, HashMap};

use crate::dates::Period;
use crate::models::{GroupBucket, OperationRecord, SegmentTotal, StackedSummary};

pub const DEFAULT_SEGMENT_FALLBACK: &str = "SEM CLIENTE";
pub const DEFAULT_TYPE_FALLBACK: &str = "SEM TIPO";

/// Trims, uppercases and collapses inner whitespace runs to a single space.
pub fn normalize_label(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Groups records into stacked buckets.
///
/// Records whose group label normalizes to empty are left out entirely, while
/// an empty segment label is counted under `fallback`. Groups and segments are
/// ordered by total descending, then label ascending.
pub fn aggregate<'a, T, G, S, L, M>(
    records: &'a [T],
    group: G,
    segment: S,
    fallback: &str,
) -> StackedSummary
where
    G: Fn(&'a T) -> L,
    S: Fn(&'a T) -> M,
    L: AsRef<str>,
    M: AsRef<str>,
{
    let fallback = normalize_label(fallback);
    let mut groups: HashMap<String, GroupBucket> = HashMap::new();
    let mut segments: HashMap<String, usize> = HashMap::new();

    for record in records {
        let group_label = normalize_label(group(record).as_ref());
        if group_label.is_empty() {
            continue;
        }

        let mut segment_label = normalize_label(segment(record).as_ref());
        if segment_label.is_empty() {
            segment_label = fallback.clone();
        }

        let bucket = groups
            .entry(group_label.clone())
            .or_insert_with(|| GroupBucket {
                label: group_label,
                total: 0,
                by_segment: BTreeMap::new(),
            });
        bucket.total += 1;
        *bucket.by_segment.entry(segment_label.clone()).or_insert(0) += 1;
        *segments.entry(segment_label).or_insert(0) += 1;
    }

    let mut groups: Vec<GroupBucket> = groups.into_values().collect();
    groups.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(&b.label)));

    let mut segments: Vec<SegmentTotal> = segments
        .into_iter()
        .map(|(label, total)| SegmentTotal { label, total })
        .collect();
    segments.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(&b.label)));

    StackedSummary { groups, segments }
}

/// Buckets records by calendar period instead of by a label, for evolution
/// charts. Undated records are skipped and periods come out oldest first.
pub fn aggregate_by_period<'a, S, M>(
    records: &'a [OperationRecord],
    period: Period,
    segment: S,
    fallback: &str,
) -> StackedSummary
where
    S: Fn(&'a OperationRecord) -> M,
    M: AsRef<str>,
{
    let mut summary = aggregate(
        records,
        |record| {
            record
                .occurred_on
                .map(|date| period.key(date))
                .unwrap_or_default()
        },
        segment,
        fallback,
    );
    summary.groups.sort_by(|a, b| a.label.cmp(&b.label));
    summary
}
