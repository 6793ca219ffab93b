//! Shared constants for the BUSCO alignment evaluator
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Thresholds used by the classifier, the PAF column layout returned by
//! the alignment query tool and the fixed headers of every output table.

pub const DEFAULT_THREADS: usize = 4;
pub const DEFAULT_IMPG: &str = "impg";

pub const GOOD_THRESHOLD: f64 = 0.9;
pub const MEDIUM_THRESHOLD: f64 = 0.4;

// INFO: impg -o paf -> 12 mandatory PAF columns + optional tags
pub const PAF_MIN_FIELDS: usize = 12;
pub const PAF_QUERY_NAME: usize = 0;
pub const PAF_QUERY_START: usize = 2;
pub const PAF_QUERY_END: usize = 3;
pub const PAF_TARGET_START: usize = 7;
pub const PAF_TARGET_END: usize = 8;

// INFO: annotation BED -> chrom start end name [score] [strand]
pub const BED_MIN_FIELDS: usize = 4;
pub const BED_STRAND: usize = 5;
pub const BED_COMMENT: char = '#';
pub const BED_HEADER_KEYWORDS: [&str; 2] = ["track", "browser"];

pub const YES: &str = "Yes";
pub const NO: &str = "No";

pub const GENE_TABLE_HEADER: [&str; 15] = [
    "gene_id",
    "target_name",
    "target_start",
    "target_end",
    "target_length",
    "gene_present_in_query",
    "query_n_total_alignments",
    "query_n_busco_alignments",
    "query_n_non_busco_alignments",
    "target_busco_completeness",
    "query_busco_completeness",
    "n_covering_alignments_target",
    "n_covering_alignments_query",
    "has_other_alignments",
    "classification",
];

pub const SUMMARY_TOTAL: &str = "total";

pub const COVERAGE_TABLE_HEADER: [&str; 6] = [
    "total_target_busco_length",
    "total_query_busco_length",
    "target_covered_bases",
    "query_covered_bases",
    "target_coverage_fraction",
    "query_coverage_fraction",
];

pub const MISSING_OTHERS: &str = "Missing-others";
pub const NO_ALIGNMENTS: &str = "No-alignments";
pub const FRAGMENTED_SUFFIX: &str = "-fragmented";
pub const OTHERS_SUFFIX: &str = "-others";
