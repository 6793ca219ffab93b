//! Interval coverage engine
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Reduces the alignment blocks returned for one gene into coverage
//! statistics over that gene's annotated span. Every function here is
//! pure: records go in, intervals or counts come out.
//!
//! Two rules decide how blocks combine:
//!
//! * coverage merges blocks that overlap *or touch* (`start <= end`)
//! * fragmentation opens a new fragment only on a real gap (`start > end`)
//!
//! Both rules agree on the same sorted input, so the number of merged runs
//! always equals the fragment count.

use crate::query::AlignmentRecord;

/// Which coordinate pair of an [`AlignmentRecord`] to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Target,
    Query,
}

/// Half-open `[start, end)` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl AlignmentRecord {
    /// Interval of this record on the requested side.
    pub fn interval(&self, side: Side) -> Interval {
        match side {
            Side::Target => Interval::new(self.target_start, self.target_end),
            Side::Query => Interval::new(self.query_start, self.query_end),
        }
    }
}

/// Clips every record to `[gene_start, gene_end)` on the given side.
///
/// Intervals left with no positive length are dropped. The result is
/// sorted by start (ties by end).
///
/// # Arguments
///
/// * `records` - Alignment blocks returned for one gene
/// * `gene_start` - Start of the annotated span
/// * `gene_end` - End of the annotated span (exclusive)
/// * `side` - Coordinate pair to clip
///
/// # Returns
///
/// * `Vec<Interval>` - Sorted clipped intervals, possibly overlapping
///
/// # Example
///
/// ```rust, ignore
/// let clipped = clip(&records, gene.start, gene.end, Side::Target);
/// let fragments = fragment_count(&clipped);
/// ```
pub fn clip(
    records: &[AlignmentRecord],
    gene_start: u64,
    gene_end: u64,
    side: Side,
) -> Vec<Interval> {
    let mut intervals = records
        .iter()
        .filter_map(|record| {
            let iv = record.interval(side);
            let clipped = Interval::new(iv.start.max(gene_start), iv.end.min(gene_end));
            (!clipped.is_empty()).then_some(clipped)
        })
        .collect::<Vec<Interval>>();

    intervals.sort_unstable();
    intervals
}

/// Merges sorted intervals that overlap or touch into disjoint runs.
pub fn merge(sorted: &[Interval]) -> Vec<Interval> {
    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());

    for iv in sorted {
        match merged.last_mut() {
            Some(run) if iv.start <= run.end => run.end = run.end.max(iv.end),
            _ => merged.push(*iv),
        }
    }

    merged
}

/// Clips `records` to the gene span and merges the result.
pub fn clip_and_merge(
    records: &[AlignmentRecord],
    gene_start: u64,
    gene_end: u64,
    side: Side,
) -> Vec<Interval> {
    merge(&clip(records, gene_start, gene_end, side))
}

/// Number of bases covered by a set of disjoint intervals.
pub fn covered_bases(merged: &[Interval]) -> u64 {
    merged.iter().map(Interval::len).sum()
}

/// Covered fraction of a span, `0.0` for a zero-length span.
pub fn coverage_fraction(covered: u64, span: u64) -> f64 {
    if span == 0 {
        return 0.0;
    }

    covered as f64 / span as f64
}

/// Counts disjoint fragments among sorted clipped intervals.
///
/// A new fragment starts whenever an interval begins strictly after the
/// furthest end seen so far. Touching or overlapping intervals stay in the
/// same fragment.
///
/// # Returns
///
/// * `0` for an empty set, otherwise `1 + number of gaps`
pub fn fragment_count(sorted: &[Interval]) -> usize {
    let Some(first) = sorted.first() else {
        return 0;
    };

    let mut count = 1;
    let mut last_end = first.end;

    for iv in &sorted[1..] {
        if iv.start > last_end {
            count += 1;
        }
        last_end = last_end.max(iv.end);
    }

    count
}

/// Coverage statistics of one gene span on one side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpanCoverage {
    pub covered_bases: u64,
    pub fragments: usize,
    pub fraction: f64,
}

impl SpanCoverage {
    /// Clips, merges and counts `records` over `[start, end)` on `side`.
    pub fn compute(records: &[AlignmentRecord], start: u64, end: u64, side: Side) -> Self {
        let clipped = clip(records, start, end, side);
        let covered = covered_bases(&merge(&clipped));

        Self {
            covered_bases: covered,
            fragments: fragment_count(&clipped),
            fraction: coverage_fraction(covered, end.saturating_sub(start)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(ts: u64, te: u64) -> AlignmentRecord {
        AlignmentRecord {
            query_sequence: "q1".into(),
            query_start: ts,
            query_end: te,
            target_start: ts,
            target_end: te,
        }
    }

    fn iv(start: u64, end: u64) -> Interval {
        Interval::new(start, end)
    }

    #[test]
    fn test_clip_drops_outside_and_sorts() {
        let records = vec![rec(1800, 2500), rec(0, 900), rec(500, 1200), rec(2000, 2100)];
        let clipped = clip(&records, 1000, 2000, Side::Target);

        assert_eq!(clipped, vec![iv(1000, 1200), iv(1800, 2000)]);
    }

    #[test]
    fn test_clip_discards_zero_length() {
        // INFO: touches the span boundary without entering it
        let records = vec![rec(900, 1000), rec(2000, 2400)];
        assert!(clip(&records, 1000, 2000, Side::Target).is_empty());
    }

    #[test]
    fn test_clip_reads_requested_side() {
        let record = AlignmentRecord {
            query_sequence: "q1".into(),
            query_start: 10,
            query_end: 20,
            target_start: 1000,
            target_end: 1100,
        };

        assert_eq!(clip(&[record.clone()], 0, 5000, Side::Target), vec![iv(1000, 1100)]);
        assert_eq!(clip(&[record], 0, 5000, Side::Query), vec![iv(10, 20)]);
    }

    #[test]
    fn test_merge_overlapping_and_touching() {
        let merged = merge(&[iv(0, 10), iv(5, 15), iv(15, 20), iv(25, 30), iv(26, 28)]);
        assert_eq!(merged, vec![iv(0, 20), iv(25, 30)]);
    }

    #[test]
    fn test_merge_contained_interval_keeps_max_end() {
        let merged = merge(&[iv(0, 100), iv(10, 20), iv(30, 40)]);
        assert_eq!(merged, vec![iv(0, 100)]);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge(&[]).is_empty());
        assert_eq!(covered_bases(&[]), 0);
        assert_eq!(fragment_count(&[]), 0);
    }

    #[test]
    fn test_covered_bases_bounded_by_span() {
        let records = vec![
            rec(0, 5000),
            rec(900, 1400),
            rec(1300, 1700),
            rec(1999, 3000),
            rec(1100, 1101),
        ];
        let merged = clip_and_merge(&records, 1000, 2000, Side::Target);

        assert!(covered_bases(&merged) <= 1000);
        assert_eq!(covered_bases(&merged), 1000);
        for pair in merged.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
    }

    #[test]
    fn test_merged_runs_are_sorted_and_disjoint() {
        let records = vec![
            rec(1700, 1750),
            rec(1000, 1100),
            rec(1090, 1200),
            rec(1400, 1500),
            rec(1500, 1510),
        ];
        let merged = clip_and_merge(&records, 1000, 2000, Side::Target);

        assert_eq!(merged, vec![iv(1000, 1200), iv(1400, 1510), iv(1700, 1750)]);
        assert_eq!(covered_bases(&merged), 200 + 110 + 50);
    }

    #[test]
    fn test_touching_records_are_one_fragment() {
        let records = vec![rec(1000, 1500), rec(1500, 2000)];
        let clipped = clip(&records, 1000, 2000, Side::Target);

        assert_eq!(fragment_count(&clipped), 1);
        assert_eq!(covered_bases(&merge(&clipped)), 1000);
    }

    #[test]
    fn test_gap_opens_new_fragment() {
        let records = vec![rec(1000, 1400), rec(1600, 2000)];
        let clipped = clip(&records, 1000, 2000, Side::Target);

        assert_eq!(fragment_count(&clipped), 2);
        assert_eq!(covered_bases(&merge(&clipped)), 800);
    }

    #[test]
    fn test_fragment_uses_running_max_end() {
        // INFO: [1200,1300) sits inside [1000,1500), so [1450,1600) still overlaps
        let clipped = vec![iv(1000, 1500), iv(1200, 1300), iv(1450, 1600)];
        assert_eq!(fragment_count(&clipped), 1);
    }

    #[test]
    fn test_fragments_grow_only_with_gaps() {
        let mut clipped = vec![iv(100, 200)];
        assert_eq!(fragment_count(&clipped), 1);

        // INFO: touching and overlapping additions
        for extra in [iv(200, 250), iv(150, 260), iv(100, 110)] {
            let before = fragment_count(&clipped);
            clipped.push(extra);
            clipped.sort_unstable();
            assert_eq!(fragment_count(&clipped), before);
        }

        // INFO: disjoint additions
        for extra in [iv(300, 310), iv(500, 600), iv(10, 20)] {
            let before = fragment_count(&clipped);
            clipped.push(extra);
            clipped.sort_unstable();
            assert_eq!(fragment_count(&clipped), before + 1);
        }
    }

    #[test]
    fn test_fragment_count_matches_merged_runs() {
        let records = vec![
            rec(10, 20),
            rec(20, 30),
            rec(35, 40),
            rec(38, 60),
            rec(70, 71),
            rec(90, 200),
        ];
        let clipped = clip(&records, 0, 100, Side::Target);

        assert_eq!(fragment_count(&clipped), merge(&clipped).len());
        assert_eq!(fragment_count(&clipped), 4);
    }

    #[test]
    fn test_coverage_fraction_degenerate_span() {
        assert_eq!(coverage_fraction(0, 0), 0.0);
        assert_eq!(coverage_fraction(500, 1000), 0.5);
    }

    #[test]
    fn test_span_coverage_half_covered() {
        let cov = SpanCoverage::compute(&[rec(1000, 1500)], 1000, 2000, Side::Target);

        assert_eq!(cov.covered_bases, 500);
        assert_eq!(cov.fragments, 1);
        assert_eq!(cov.fraction, 0.5);
    }

    #[test]
    fn test_span_coverage_zero_length_span() {
        let cov = SpanCoverage::compute(&[rec(0, 5000)], 1000, 1000, Side::Target);
        assert_eq!(cov, SpanCoverage::default());
    }
}
