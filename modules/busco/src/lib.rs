//! Evaluate how well a whole-genome alignment reproduces BUSCO genes
//! Alejandro Gonzales-Irribarren, 2025
//!
//! For every BUSCO gene annotated in a target genome the alignment is
//! queried over the gene's span and the returned blocks are reduced to
//! coverage on both genomes. Each gene is then labelled by how much of it
//! is covered (`good`, `medium`, `bad`), whether coverage is split into
//! several blocks (`-fragmented`) and whether blocks also land outside the
//! query genome's copy of the gene (`-others`). Genes with no usable
//! blocks are `Missing-others` or `No-alignments`.
//!
//! The per-gene work runs in parallel on a bounded pool and is reduced to
//! summary and genome-wide coverage tables at the end of the run.

pub mod annotation;
pub mod busco;
pub mod classify;
pub mod cli;
pub mod consts;
pub mod coverage;
pub mod error;
pub mod query;
pub mod report;
pub mod utils;

pub use annotation::{AnnotationStore, GeneAnnotation, Strand};
pub use busco::{analyze_genes, run_busco};
pub use classify::{analyze_gene, classify, Classification, CoverageTier, GeneResult};
pub use coverage::{Interval, Side};
pub use error::{AnnotationError, QueryError};
pub use query::{AlignmentRecord, AlignmentSource, ImpgSource};
