//! BUSCO alignment evaluation pipeline
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Loads both BUSCO annotations, queries the alignment once per target
//! gene on a bounded worker pool and writes the per-gene, summary and
//! coverage tables.
//!
//! Genes are independent: every task borrows the two annotation stores
//! and the alignment source read-only, issues its own region query and
//! returns one `GeneResult`. A failing query is logged and scored as a
//! gene with no alignments; it never stops the rest of the batch.
//! Results come back in the order genes were dispatched.

use anyhow::{bail, Context, Result};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use smol_str::SmolStr;

use crate::annotation::{AnnotationStore, GeneAnnotation};
use crate::classify::{analyze_gene, GeneResult};
use crate::cli::Args;
use crate::query::{AlignmentRecord, AlignmentSource, ImpgSource};
use crate::report::{write_gene_table, CoverageTable, SummaryTable};
use crate::utils::{create_writer, file_size};

/// Run the full evaluation from parsed CLI arguments.
///
/// # Arguments
///
/// * `args` - Parsed command line
///
/// # Returns
///
/// * `Result<()>` - Only setup problems (unreadable or malformed annotation,
///   unknown `--gene`, unwritable output) end up here
///
/// # Example
///
/// ```rust, ignore
/// let args = Args::parse();
/// run_busco(args)?;
/// ```
pub fn run_busco(args: Args) -> Result<()> {
    info!("Loading BUSCO annotations...");
    info!(
        "Target annotation: {:?} ({})",
        args.target_bed,
        file_size(&args.target_bed)
    );
    info!(
        "Query annotation: {:?} ({})",
        args.query_bed,
        file_size(&args.query_bed)
    );

    let target = AnnotationStore::load(&args.target_bed).with_context(|| {
        format!(
            "ERROR: failed to load target BUSCO annotation {:?}",
            args.target_bed
        )
    })?;
    let query = AnnotationStore::load(&args.query_bed).with_context(|| {
        format!(
            "ERROR: failed to load query BUSCO annotation {:?}",
            args.query_bed
        )
    })?;

    info!("Found {} BUSCO genes in target", target.len());
    info!("Found {} BUSCO genes in query", query.len());

    let genes = select_genes(&target, &query, args.gene.as_deref())?;
    let source = ImpgSource::new(&args.impg, &args.paf);

    // INFO: outputs are opened up front so a bad path fails before any query runs
    let mut writer = create_writer(args.output.as_deref())?;
    let mut summary_writer = args
        .summary_output
        .as_deref()
        .map(|path| create_writer(Some(path)))
        .transpose()?;
    let mut coverage_writer = args
        .coverage_output
        .as_deref()
        .map(|path| create_writer(Some(path)))
        .transpose()?;

    info!(
        "Processing {} genes using {} threads...",
        genes.len(),
        args.threads
    );
    let results = analyze_genes(&genes, &target, &query, &source, args.threads)?;

    write_gene_table(&results, &mut writer).context("ERROR: failed to write per-gene results")?;
    if let Some(output) = &args.output {
        info!("Per-gene results written to {output:?}");
    }

    if let (Some(path), Some(summary_writer)) = (&args.summary_output, summary_writer.as_mut()) {
        let summary = SummaryTable::from_results(&results);
        summary
            .write(summary_writer)
            .with_context(|| format!("ERROR: failed to write summary table {path:?}"))?;

        info!(
            "Summary statistics written to {path:?}, (include only {} genes present in query out of {} total)",
            summary.total,
            results.len()
        );
    }

    if let (Some(path), Some(coverage_writer)) = (&args.coverage_output, coverage_writer.as_mut())
    {
        CoverageTable::from_results(&results)
            .write(coverage_writer)
            .with_context(|| format!("ERROR: failed to write coverage table {path:?}"))?;

        info!("Coverage statistics written to {path:?}");
    }

    Ok(())
}

/// Picks the genes to analyse: the requested one, or every target gene
/// in lexicographic order.
pub fn select_genes(
    target: &AnnotationStore,
    query: &AnnotationStore,
    gene: Option<&str>,
) -> Result<Vec<SmolStr>> {
    let Some(gene) = gene else {
        return Ok(target.sorted_ids());
    };

    if !target.contains(gene) {
        bail!("ERROR: gene {gene:?} is not annotated in the target genome");
    }

    if !query.contains(gene) {
        warn!("Gene {gene:?} is not annotated in the query genome, all alignments count as others");
    }

    Ok(vec![SmolStr::new(gene)])
}

/// Analyses `genes` on a dedicated pool of `threads` workers.
///
/// The output has one `GeneResult` per input id, in input order, no matter
/// which task finishes first.
///
/// # Arguments
///
/// * `genes` - Gene ids to analyse, all present in `target`
/// * `target` - Target genome annotation
/// * `query` - Query genome annotation
/// * `source` - Alignment source answering region queries
/// * `threads` - Pool size
///
/// # Returns
///
/// * `Result<Vec<GeneResult>>` - Fails only if the pool cannot be built or a
///   gene id is missing from `target`
pub fn analyze_genes<S: AlignmentSource>(
    genes: &[SmolStr],
    target: &AnnotationStore,
    query: &AnnotationStore,
    source: &S,
    threads: usize,
) -> Result<Vec<GeneResult>> {
    let annotations = genes
        .iter()
        .map(|id| {
            target.get(id).with_context(|| {
                format!("ERROR: gene {id:?} is not annotated in the target genome")
            })
        })
        .collect::<Result<Vec<&GeneAnnotation>>>()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("ERROR: failed to build worker pool")?;

    let results = pool.install(|| {
        annotations
            .par_iter()
            .map(|gene| {
                let records = query_or_empty(source, gene);
                analyze_gene(gene, query.get(&gene.gene_id), &records)
            })
            .collect::<Vec<GeneResult>>()
    });

    Ok(results)
}

/// Queries one gene span, degrading any failure to zero alignments.
fn query_or_empty<S: AlignmentSource>(source: &S, gene: &GeneAnnotation) -> Vec<AlignmentRecord> {
    match source.query(&gene.sequence, gene.start, gene.end) {
        Ok(records) => {
            debug!(
                "{} -> {} alignments over {}:{}-{}",
                gene.gene_id,
                records.len(),
                gene.sequence,
                gene.start,
                gene.end
            );
            records
        }
        Err(e) => {
            error!("alignment query failed for {} -> {e}", gene.gene_id);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::error::QueryError;
    use hashbrown::HashMap;
    use std::path::PathBuf;

    /// Answers queries from a fixed table keyed by target sequence.
    struct TableSource {
        hits: HashMap<String, Vec<AlignmentRecord>>,
        failing: Vec<String>,
    }

    impl AlignmentSource for TableSource {
        fn query(
            &self,
            sequence: &str,
            start: u64,
            end: u64,
        ) -> Result<Vec<AlignmentRecord>, QueryError> {
            if self.failing.iter().any(|s| s == sequence) {
                return Err(QueryError::Failed {
                    command: format!("impg query -r {sequence}:{start}-{end}"),
                    code: Some(1),
                    stderr: "boom".to_string(),
                });
            }

            Ok(self
                .hits
                .get(sequence)
                .map(|records| {
                    records
                        .iter()
                        .filter(|r| r.target_start < end && r.target_end > start)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    fn rec(qseq: &str, qs: u64, qe: u64, ts: u64, te: u64) -> AlignmentRecord {
        AlignmentRecord {
            query_sequence: qseq.into(),
            query_start: qs,
            query_end: qe,
            target_start: ts,
            target_end: te,
        }
    }

    fn stores() -> (AnnotationStore, AnnotationStore) {
        let target = AnnotationStore::parse(
            b"chrA\t1000\t2000\tg3\t0\t+\n\
              chrB\t1000\t2000\tg1\t0\t+\n\
              chrC\t1000\t2000\tg2\t0\t-\n\
              chrD\t1000\t2000\tg4\t0\t+\n",
        )
        .unwrap();
        let query = AnnotationStore::parse(
            b"chr1\t1000\t2000\tg3\n\
              chr2\t1000\t2000\tg1\n\
              chr3\t1000\t2000\tg2\n",
        )
        .unwrap();

        (target, query)
    }

    fn source() -> TableSource {
        let mut hits = HashMap::new();
        hits.insert("chrA".to_string(), vec![rec("chr1", 1000, 2000, 1000, 2000)]);
        hits.insert("chrB".to_string(), vec![rec("chr2", 1000, 1500, 1000, 1500)]);
        hits.insert(
            "chrD".to_string(),
            vec![rec("chr9", 0, 500, 1000, 1500), rec("chr9", 700, 1200, 1500, 2000)],
        );

        TableSource {
            hits,
            failing: vec!["chrC".to_string()],
        }
    }

    #[test]
    fn test_select_genes_defaults_to_sorted_target() {
        let (target, query) = stores();
        assert_eq!(
            select_genes(&target, &query, None).unwrap(),
            vec!["g1", "g2", "g3", "g4"]
        );
    }

    #[test]
    fn test_select_single_gene() {
        let (target, query) = stores();
        assert_eq!(select_genes(&target, &query, Some("g4")).unwrap(), vec!["g4"]);
        assert!(select_genes(&target, &query, Some("g9")).is_err());
    }

    #[test]
    fn test_analyze_genes_keeps_order_and_survives_failures() {
        let (target, query) = stores();
        let genes = select_genes(&target, &query, None).unwrap();

        let results = analyze_genes(&genes, &target, &query, &source(), 4).unwrap();

        let ids = results.iter().map(|r| r.gene_id.as_str()).collect::<Vec<&str>>();
        assert_eq!(ids, vec!["g1", "g2", "g3", "g4"]);

        let labels = results
            .iter()
            .map(|r| r.classification.to_string())
            .collect::<Vec<String>>();
        assert_eq!(labels, vec!["medium", "No-alignments", "good", "Missing-others"]);

        // INFO: failed query is scored as zero alignments
        assert_eq!(results[1].n_total_alignments, 0);
        assert!(results[1].present_in_query);

        assert!(!results[3].present_in_query);
        assert_eq!(results[3].n_non_busco_alignments, 2);
        assert_eq!(results[3].target_covered_bases, 1000);
    }

    #[test]
    fn test_analyze_genes_order_independent_of_pool_size() {
        let mut bed = String::new();
        let mut hits = HashMap::new();
        for i in 0..200 {
            let seq = format!("chr{i}");
            bed.push_str(&format!("{seq}\t0\t1000\tgene{i:03}\n"));
            hits.insert(seq, vec![rec("q", 0, 10, 0, (i as u64 % 10 + 1) * 100)]);
        }

        let target = AnnotationStore::parse(bed.as_bytes()).unwrap();
        let query = AnnotationStore::default();
        let source = TableSource {
            hits,
            failing: Vec::new(),
        };
        let genes = target.sorted_ids();

        let single = analyze_genes(&genes, &target, &query, &source, 1).unwrap();
        let many = analyze_genes(&genes, &target, &query, &source, 8).unwrap();

        assert_eq!(single, many);
        assert_eq!(single.len(), 200);
        assert!(single
            .iter()
            .zip(genes.iter())
            .all(|(r, id)| &r.gene_id == id));
    }

    #[test]
    fn test_analyze_genes_rejects_unknown_gene() {
        let (target, query) = stores();
        let genes = vec![SmolStr::new("nope")];
        assert!(analyze_genes(&genes, &target, &query, &source(), 2).is_err());
    }

    #[test]
    fn test_run_busco_with_failing_tool_still_writes_tables() {
        let dir = tempfile::tempdir().unwrap();
        let target_bed = dir.path().join("target.bed");
        let query_bed = dir.path().join("query.bed");
        std::fs::write(&target_bed, "chrA\t0\t100\tg2\nchrA\t200\t300\tg1\n").unwrap();
        std::fs::write(&query_bed, "chr1\t0\t100\tg1\n").unwrap();

        let output = dir.path().join("genes.tsv");
        let summary = dir.path().join("summary.tsv");
        let coverage = dir.path().join("coverage.tsv");

        let args = Args {
            target_bed,
            query_bed,
            paf: dir.path().join("aln.paf"),
            output: Some(output.clone()),
            summary_output: Some(summary.clone()),
            coverage_output: Some(coverage.clone()),
            gene: None,
            threads: 2,
            // INFO: every query exits non-zero
            impg: PathBuf::from("false"),
            level: log::Level::Info,
        };

        run_busco(args).unwrap();

        let genes = std::fs::read_to_string(output).unwrap();
        let rows = genes.lines().skip(1).collect::<Vec<&str>>();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("g1\tchrA\t200\t300\t100\tYes\t0\t0\t0\t0.0000\t0.0000"));
        assert!(rows[0].ends_with("No-alignments"));
        assert!(rows[1].starts_with("g2\tchrA\t0\t100\t100\tNo\t0"));

        let summary = std::fs::read_to_string(summary).unwrap();
        assert!(summary.lines().nth(1).unwrap().ends_with("\t1\t1"));

        let coverage = std::fs::read_to_string(coverage).unwrap();
        assert_eq!(
            coverage.lines().nth(1).unwrap(),
            "200\t100\t0\t0\t0.000000\t0.000000"
        );
    }

    #[test]
    fn test_run_busco_malformed_annotation_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let target_bed = dir.path().join("target.bed");
        let query_bed = dir.path().join("query.bed");
        std::fs::write(&target_bed, "chrA\t0\n").unwrap();
        std::fs::write(&query_bed, "chr1\t0\t100\tg1\n").unwrap();

        let args = Args {
            target_bed,
            query_bed,
            paf: dir.path().join("aln.paf"),
            output: Some(dir.path().join("genes.tsv")),
            summary_output: None,
            coverage_output: None,
            gene: None,
            threads: 1,
            impg: PathBuf::from("false"),
            level: log::Level::Info,
        };

        let err = run_busco(args).unwrap_err();
        assert!(format!("{err:#}").contains("malformed annotation at line 1"));
    }

    #[test]
    fn test_run_busco_unwritable_output_fails_before_queries() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let target_bed = dir.path().join("target.bed");
        let query_bed = dir.path().join("query.bed");
        std::fs::write(&target_bed, "chrA\t0\t100\tg1\n").unwrap();
        std::fs::write(&query_bed, "chr1\t0\t100\tg1\n").unwrap();

        // INFO: leaves a marker behind if it is ever invoked
        let marker = dir.path().join("queried");
        let impg = dir.path().join("impg");
        std::fs::write(&impg, format!("#!/bin/sh\ntouch {:?}\n", marker)).unwrap();
        std::fs::set_permissions(&impg, std::fs::Permissions::from_mode(0o755)).unwrap();

        for (output, summary_output) in [
            (Some(dir.path().join("missing/genes.tsv")), None),
            (
                Some(dir.path().join("genes.tsv")),
                Some(dir.path().join("missing/summary.tsv")),
            ),
        ] {
            let args = Args {
                target_bed: target_bed.clone(),
                query_bed: query_bed.clone(),
                paf: dir.path().join("aln.paf"),
                output,
                summary_output,
                coverage_output: None,
                gene: None,
                threads: 1,
                impg: impg.clone(),
                level: log::Level::Info,
            };

            let err = run_busco(args).unwrap_err();
            assert!(format!("{err:#}").contains("cannot create file"));
            assert!(!marker.exists());
        }
    }

    #[test]
    fn test_classification_of_failed_gene_in_summary() {
        let (target, query) = stores();
        let genes = vec![SmolStr::new("g2")];
        let results = analyze_genes(&genes, &target, &query, &source(), 1).unwrap();

        let summary = SummaryTable::from_results(&results);
        assert_eq!(summary.count(Classification::NoAlignments), 1);
        assert_eq!(summary.total, 1);
    }
}
