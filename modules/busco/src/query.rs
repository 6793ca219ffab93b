//! Alignment query adapter
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Asks an alignment source for every block overlapping a target region
//! and turns the PAF lines it prints into [`AlignmentRecord`]s. The
//! production source shells out to `impg query`; tests plug in their own
//! [`AlignmentSource`] so the engine never needs an external process.

use log::debug;
use smol_str::SmolStr;

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::consts::*;
use crate::error::QueryError;

/// One alignment block between a query-genome interval and a
/// target-genome interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub query_sequence: SmolStr,
    pub query_start: u64,
    pub query_end: u64,
    pub target_start: u64,
    pub target_end: u64,
}

impl AlignmentRecord {
    /// Builds a record from the tab-separated fields of one PAF line.
    ///
    /// Returns `None` when the line has fewer than 12 fields or any of the
    /// used coordinates is not an integer.
    ///
    /// # Example
    ///
    /// qname  qlen  qstart  qend  strand  tname  tlen  tstart  tend  matches  block  mapq
    /// chr1   5000  100     600   +       chrA   9000  1000    1500  500      500    255
    ///
    /// ```rust, ignore
    /// let parts = line.split('\t').collect::<Vec<&str>>();
    /// let record = AlignmentRecord::from_parts(&parts);
    /// ```
    pub fn from_parts(parts: &[&str]) -> Option<Self> {
        if parts.len() < PAF_MIN_FIELDS {
            return None;
        }

        Some(Self {
            query_sequence: SmolStr::new(parts[PAF_QUERY_NAME]),
            query_start: parts[PAF_QUERY_START].parse().ok()?,
            query_end: parts[PAF_QUERY_END].parse().ok()?,
            target_start: parts[PAF_TARGET_START].parse().ok()?,
            target_end: parts[PAF_TARGET_END].parse().ok()?,
        })
    }
}

/// Parses the stdout of a region query.
///
/// Blank lines and tool log lines (starting with `[`) are skipped. Lines
/// that do not make a valid record are dropped silently.
pub fn parse_paf_output(output: &str) -> Vec<AlignmentRecord> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('['))
        .filter_map(|line| {
            let parts = line.trim_end_matches('\r').split('\t').collect::<Vec<&str>>();
            AlignmentRecord::from_parts(&parts)
        })
        .collect()
}

/// Anything that can answer "which blocks overlap `[start, end)` on
/// `sequence`?".
///
/// Implementations are shared by reference across worker threads.
pub trait AlignmentSource: Sync {
    fn query(
        &self,
        sequence: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<AlignmentRecord>, QueryError>;
}

/// Alignment source backed by `impg query` over an indexed PAF file.
///
/// Each call blocks until the child exits. There is no timeout: a hung
/// `impg` process holds its worker for as long as it runs.
#[derive(Debug, Clone)]
pub struct ImpgSource {
    binary: PathBuf,
    paf: PathBuf,
}

impl ImpgSource {
    pub fn new<B: AsRef<Path>, P: AsRef<Path>>(binary: B, paf: P) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            paf: paf.as_ref().to_path_buf(),
        }
    }

    fn args(&self, sequence: &str, start: u64, end: u64) -> Vec<String> {
        vec![
            "query".to_string(),
            "-p".to_string(),
            self.paf.display().to_string(),
            "-r".to_string(),
            format!("{sequence}:{start}-{end}"),
            "-v".to_string(),
            "1".to_string(),
            "-d".to_string(),
            "0".to_string(),
            "-o".to_string(),
            "paf".to_string(),
        ]
    }

    /// Shell-like rendering of the command, used in diagnostics.
    pub fn command_line(&self, sequence: &str, start: u64, end: u64) -> String {
        let mut cmd = vec![self.binary.display().to_string()];
        cmd.extend(self.args(sequence, start, end));
        cmd.join(" ")
    }
}

impl AlignmentSource for ImpgSource {
    fn query(
        &self,
        sequence: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<AlignmentRecord>, QueryError> {
        let command = self.command_line(sequence, start, end);
        debug!("Executing -> {command}");

        let output = Command::new(&self.binary)
            .args(self.args(sequence, start, end))
            .output()
            .map_err(|source| QueryError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(QueryError::Failed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_paf_output(&String::from_utf8_lossy(&output.stdout)))
    }
}
