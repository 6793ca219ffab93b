//! Error types shared across the crate
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Annotation errors are fatal and abort the run before any gene is
//! analysed. Query errors are recovered per gene by the orchestrator.

use std::path::PathBuf;

/// Errors raised while loading a BUSCO annotation file.
#[derive(thiserror::Error, Debug)]
pub enum AnnotationError {
    /// The annotation file could not be opened or mapped.
    #[error("could not read annotation file {path:?} -> {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A line does not follow the `chrom start end name [score] [strand]` layout.
    #[error("malformed annotation at line {line}: {reason} -> {content:?}")]
    Format {
        line: usize,
        reason: String,
        content: String,
    },
}

/// Errors raised by an alignment source while answering a region query.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    #[error("could not execute {command:?} -> {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command:?} exited with code {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}
