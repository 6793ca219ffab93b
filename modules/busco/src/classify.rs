//! Gene classifier
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Turns the alignment blocks found for one target BUSCO gene into a
//! [`GeneResult`]: blocks are split into those landing on the query
//! genome's own copy of the gene ("BUSCO-side") and those landing
//! anywhere else ("other-side"), coverage is computed on both genomes,
//! and the gene is given one of fourteen labels.

use smol_str::SmolStr;

use std::fmt;

use crate::annotation::GeneAnnotation;
use crate::consts::*;
use crate::coverage::{Side, SpanCoverage};
use crate::query::AlignmentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverageTier {
    Good,
    Medium,
    Bad,
}

impl CoverageTier {
    /// Both sides have to reach a tier's threshold on their own.
    pub fn from_coverage(target_cov: f64, query_cov: f64) -> Self {
        if target_cov >= GOOD_THRESHOLD && query_cov >= GOOD_THRESHOLD {
            CoverageTier::Good
        } else if target_cov >= MEDIUM_THRESHOLD && query_cov >= MEDIUM_THRESHOLD {
            CoverageTier::Medium
        } else {
            CoverageTier::Bad
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            CoverageTier::Good => "good",
            CoverageTier::Medium => "medium",
            CoverageTier::Bad => "bad",
        }
    }
}

/// Final label of a gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Aligned {
        tier: CoverageTier,
        fragmented: bool,
        others: bool,
    },
    MissingOthers,
    NoAlignments,
}

impl Classification {
    /// All fourteen labels in report order.
    pub fn all() -> [Classification; 14] {
        let mut labels = [Classification::NoAlignments; 14];
        let mut idx = 0;

        for tier in [CoverageTier::Good, CoverageTier::Medium, CoverageTier::Bad] {
            for (fragmented, others) in
                [(false, false), (true, false), (false, true), (true, true)]
            {
                labels[idx] = Classification::Aligned {
                    tier,
                    fragmented,
                    others,
                };
                idx += 1;
            }
        }

        labels[12] = Classification::MissingOthers;
        labels[13] = Classification::NoAlignments;
        labels
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Aligned {
                tier,
                fragmented,
                others,
            } => {
                write!(f, "{}", tier.as_str())?;
                if *fragmented {
                    write!(f, "{FRAGMENTED_SUFFIX}")?;
                }
                if *others {
                    write!(f, "{OTHERS_SUFFIX}")?;
                }
                Ok(())
            }
            Classification::MissingOthers => write!(f, "{MISSING_OTHERS}"),
            Classification::NoAlignments => write!(f, "{NO_ALIGNMENTS}"),
        }
    }
}

/// Decides the label of a gene from its coverage summary.
///
/// # Arguments
///
/// * `target_cov` - Covered fraction of the target span
/// * `query_cov` - Covered fraction of the query span (BUSCO-side blocks only)
/// * `n_alignments` - Number of blocks returned for the gene
/// * `fragmented` - Whether either side needs more than one block
/// * `has_others` - Whether any block landed outside the query gene
///
/// # Returns
///
/// * `Classification` - Always the same label for the same inputs
///
/// # Example
///
/// ```rust, ignore
/// let label = classify(0.5, 0.5, 1, false, false);
/// assert_eq!(label.to_string(), "medium");
/// ```
pub fn classify(
    target_cov: f64,
    query_cov: f64,
    n_alignments: usize,
    fragmented: bool,
    has_others: bool,
) -> Classification {
    if n_alignments == 0 {
        return Classification::NoAlignments;
    }

    if target_cov == 0.0 || query_cov == 0.0 {
        return match has_others {
            true => Classification::MissingOthers,
            false => Classification::NoAlignments,
        };
    }

    Classification::Aligned {
        tier: CoverageTier::from_coverage(target_cov, query_cov),
        fragmented,
        others: has_others,
    }
}

/// Per-gene outcome, one row of the gene table.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneResult {
    pub gene_id: SmolStr,
    pub target_name: SmolStr,
    pub target_start: u64,
    pub target_end: u64,
    pub target_length: u64,
    pub present_in_query: bool,
    pub query_length: u64,
    pub n_total_alignments: usize,
    pub n_busco_alignments: usize,
    pub n_non_busco_alignments: usize,
    pub target_covered_bases: u64,
    pub query_covered_bases: u64,
    pub n_covering_alignments_target: usize,
    pub n_covering_alignments_query: usize,
    pub has_other_alignments: bool,
    pub classification: Classification,
}

impl GeneResult {
    pub fn target_coverage(&self) -> f64 {
        crate::coverage::coverage_fraction(self.target_covered_bases, self.target_length)
    }

    pub fn query_coverage(&self) -> f64 {
        crate::coverage::coverage_fraction(self.query_covered_bases, self.query_length)
    }

    pub fn is_fragmented(&self) -> bool {
        self.n_covering_alignments_target > 1 || self.n_covering_alignments_query > 1
    }
}

/// Analyses one gene from the blocks returned by its region query.
///
/// Target coverage uses every block; query coverage only the blocks that
/// land on the query genome's copy of the same gene. When the gene is not
/// annotated in the query genome all blocks count as other-side and the
/// query coverage stays at zero.
///
/// # Arguments
///
/// * `target` - The gene in the target annotation
/// * `query` - The same gene id in the query annotation, if any
/// * `records` - Blocks returned for the target span
///
/// # Returns
///
/// * `GeneResult` - Counts, coverage and the final label
///
/// # Example
///
/// ```rust, ignore
/// let records = source.query(&gene.sequence, gene.start, gene.end)?;
/// let result = analyze_gene(gene, query_store.get(&gene.gene_id), &records);
/// ```
pub fn analyze_gene(
    target: &GeneAnnotation,
    query: Option<&GeneAnnotation>,
    records: &[AlignmentRecord],
) -> GeneResult {
    let target_cov = SpanCoverage::compute(records, target.start, target.end, Side::Target);

    let (busco, others): (Vec<AlignmentRecord>, Vec<AlignmentRecord>) = match query {
        Some(q) => records
            .iter()
            .cloned()
            .partition(|r| q.overlaps(&r.query_sequence, r.query_start, r.query_end)),
        None => (Vec::new(), records.to_vec()),
    };

    let query_cov = query
        .map(|q| SpanCoverage::compute(&busco, q.start, q.end, Side::Query))
        .unwrap_or_default();

    let fragmented = target_cov.fragments > 1 || query_cov.fragments > 1;
    let has_others = !others.is_empty();

    GeneResult {
        gene_id: target.gene_id.clone(),
        target_name: target.sequence.clone(),
        target_start: target.start,
        target_end: target.end,
        target_length: target.len(),
        present_in_query: query.is_some(),
        query_length: query.map_or(0, GeneAnnotation::len),
        n_total_alignments: records.len(),
        n_busco_alignments: busco.len(),
        n_non_busco_alignments: others.len(),
        target_covered_bases: target_cov.covered_bases,
        query_covered_bases: query_cov.covered_bases,
        n_covering_alignments_target: target_cov.fragments,
        n_covering_alignments_query: query_cov.fragments,
        has_other_alignments: has_others,
        classification: classify(
            target_cov.fraction,
            query_cov.fraction,
            records.len(),
            fragmented,
            has_others,
        ),
    }
}
