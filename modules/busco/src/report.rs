//! Per-gene, summary and coverage tables
//! Alejandro Gonzales-Irribarren, 2025
//!
//! All three outputs are plain TSV with a single header line. The
//! summary and coverage tables are reductions over the ordered gene
//! results and are built once at the end of the run.

use hashbrown::HashMap;

use std::io::{self, Write};

use crate::classify::{Classification, GeneResult};
use crate::consts::*;
use crate::coverage::coverage_fraction;

fn yes_no(flag: bool) -> &'static str {
    match flag {
        true => YES,
        false => NO,
    }
}

/// Writes one row per gene, in the order given.
///
/// # Arguments
///
/// * `results` - Gene results in output order
/// * `writer` - Destination, e.g. a `BufWriter<File>` or locked stdout
///
/// # Returns
///
/// * `io::Result<()>`
///
/// # Example
///
/// ```rust, ignore
/// let mut writer = BufWriter::new(File::create("genes.tsv")?);
/// write_gene_table(&results, &mut writer)?;
/// ```
pub fn write_gene_table<W: Write>(results: &[GeneResult], writer: &mut W) -> io::Result<()> {
    writeln!(writer, "{}", GENE_TABLE_HEADER.join("\t"))?;

    for r in results {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.4}\t{:.4}\t{}\t{}\t{}\t{}",
            r.gene_id,
            r.target_name,
            r.target_start,
            r.target_end,
            r.target_length,
            yes_no(r.present_in_query),
            r.n_total_alignments,
            r.n_busco_alignments,
            r.n_non_busco_alignments,
            r.target_coverage(),
            r.query_coverage(),
            r.n_covering_alignments_target,
            r.n_covering_alignments_query,
            yes_no(r.has_other_alignments),
            r.classification,
        )?;
    }

    writer.flush()
}

/// Label counts over the genes present in the query annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTable {
    counts: HashMap<Classification, usize>,
    pub total: usize,
}

impl SummaryTable {
    pub fn from_results(results: &[GeneResult]) -> Self {
        let mut counts = HashMap::new();
        let mut total = 0;

        for r in results.iter().filter(|r| r.present_in_query) {
            *counts.entry(r.classification).or_insert(0) += 1;
            total += 1;
        }

        Self { counts, total }
    }

    pub fn count(&self, label: Classification) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let labels = Classification::all();

        let mut header = labels.iter().map(|c| c.to_string()).collect::<Vec<String>>();
        header.push(SUMMARY_TOTAL.to_string());

        let mut row = labels
            .iter()
            .map(|c| self.count(*c).to_string())
            .collect::<Vec<String>>();
        row.push(self.total.to_string());

        writeln!(writer, "{}", header.join("\t"))?;
        writeln!(writer, "{}", row.join("\t"))?;
        writer.flush()
    }
}

/// Genome-wide covered bases over all annotated BUSCO spans.
///
/// Target totals include every analysed gene; query totals only the genes
/// annotated in the query genome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageTable {
    pub total_target_length: u64,
    pub total_query_length: u64,
    pub target_covered_bases: u64,
    pub query_covered_bases: u64,
}

impl CoverageTable {
    pub fn from_results(results: &[GeneResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            acc.total_target_length += r.target_length;
            acc.target_covered_bases += r.target_covered_bases;

            if r.present_in_query {
                acc.total_query_length += r.query_length;
                acc.query_covered_bases += r.query_covered_bases;
            }

            acc
        })
    }

    pub fn target_fraction(&self) -> f64 {
        coverage_fraction(self.target_covered_bases, self.total_target_length)
    }

    pub fn query_fraction(&self) -> f64 {
        coverage_fraction(self.query_covered_bases, self.total_query_length)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", COVERAGE_TABLE_HEADER.join("\t"))?;
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.6}\t{:.6}",
            self.total_target_length,
            self.total_query_length,
            self.target_covered_bases,
            self.query_covered_bases,
            self.target_fraction(),
            self.query_fraction(),
        )?;
        writer.flush()
    }
}
