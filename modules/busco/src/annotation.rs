//! BUSCO annotation store
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Reads the BED-like annotation emitted for a genome (one line per
//! BUSCO gene: `chrom start end gene_id [score] [strand]`) and keeps a
//! read-only map from gene id to its genomic span. Both the target and
//! the query genome are loaded through this module and then shared
//! between all worker threads by reference.

use hashbrown::HashMap;
use memchr::memchr;
use memmap2::Mmap;
use smol_str::SmolStr;

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::{from_utf8, FromStr};

use crate::consts::*;
use crate::error::AnnotationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
    Unknown,
}

impl FromStr for Strand {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "+" => Strand::Forward,
            "-" => Strand::Reverse,
            _ => Strand::Unknown,
        })
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

/// A single BUSCO gene location in one genome.
///
/// Coordinates are 0-based and half-open, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneAnnotation {
    pub gene_id: SmolStr,
    pub sequence: SmolStr,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

impl GeneAnnotation {
    /// Parses one annotation line.
    ///
    /// # Arguments
    ///
    /// * `line` - A tab-separated line with at least 4 fields
    /// * `lineno` - 1-based line number, only used for error reporting
    ///
    /// # Returns
    ///
    /// * `Result<GeneAnnotation, AnnotationError>` - The parsed gene or a
    ///   `Format` error if the line has fewer than 4 fields, non-integer
    ///   coordinates or an end before its start.
    ///
    /// # Example
    ///
    /// ```rust, ignore
    /// let gene = GeneAnnotation::parse("chr1\t100\t200\t1000at7742\t0\t-", 1)?;
    /// assert_eq!(gene.len(), 100);
    /// ```
    pub fn parse(line: &str, lineno: usize) -> Result<Self, AnnotationError> {
        let fields = line.split('\t').collect::<Vec<&str>>();
        let format_error = |reason: String| AnnotationError::Format {
            line: lineno,
            reason,
            content: line.to_string(),
        };

        if fields.len() < BED_MIN_FIELDS {
            return Err(format_error(format!(
                "expected at least {BED_MIN_FIELDS} fields, found {}",
                fields.len()
            )));
        }

        let start = fields[1]
            .trim()
            .parse::<u64>()
            .map_err(|e| format_error(format!("invalid start {:?} -> {e}", fields[1])))?;
        let end = fields[2]
            .trim()
            .parse::<u64>()
            .map_err(|e| format_error(format!("invalid end {:?} -> {e}", fields[2])))?;

        if end < start {
            return Err(format_error(format!("end {end} is before start {start}")));
        }

        let strand = fields
            .get(BED_STRAND)
            .map(|s| s.trim().parse::<Strand>().unwrap_or(Strand::Unknown))
            .unwrap_or(Strand::Forward);

        Ok(Self {
            gene_id: SmolStr::new(fields[3].trim()),
            sequence: SmolStr::new(fields[0].trim()),
            start,
            end,
            strand,
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open overlap test against an interval on `sequence`.
    pub fn overlaps(&self, sequence: &str, start: u64, end: u64) -> bool {
        self.sequence == sequence && !(end <= self.start || start >= self.end)
    }
}

/// Comment lines, or `track`/`browser` lines whose first token is exactly
/// that keyword. `tracked_scaffold_1` is a sequence name, not a header.
fn is_header(line: &str) -> bool {
    if line.starts_with(BED_COMMENT) {
        return true;
    }

    line.split_whitespace()
        .next()
        .is_some_and(|token| BED_HEADER_KEYWORDS.contains(&token))
}

/// Read-only map of gene id -> annotation for one genome.
#[derive(Debug, Default, Clone)]
pub struct AnnotationStore {
    genes: HashMap<SmolStr, GeneAnnotation>,
}

impl AnnotationStore {
    /// Loads an annotation file from disk.
    ///
    /// The file is memory mapped and scanned line by line. Blank lines and
    /// header lines (`#` comments, `track` or `browser` keyword lines) are
    /// skipped. When a gene id shows up more than once the last line wins.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the annotation file
    ///
    /// # Returns
    ///
    /// * `Result<AnnotationStore, AnnotationError>`
    ///
    /// # Example
    ///
    /// ```rust, ignore
    /// let target = AnnotationStore::load(&args.target_bed)?;
    /// info!("Found {} BUSCO genes in target", target.len());
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AnnotationError> {
        let path = path.as_ref();
        let io_error = |source| AnnotationError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_error)?;

        // INFO: mapping a zero-length file is not portable
        if file.metadata().map_err(io_error)?.len() == 0 {
            return Ok(Self::default());
        }

        let mmap = unsafe { Mmap::map(&file).map_err(io_error)? };
        Self::parse(mmap.as_ref())
    }

    /// Parses an in-memory annotation buffer.
    pub fn parse(data: &[u8]) -> Result<Self, AnnotationError> {
        let mut genes = HashMap::new();
        let mut pos = 0;
        let mut lineno = 0;

        while pos < data.len() {
            let end = memchr(b'\n', &data[pos..]).map_or(data.len(), |e| pos + e);
            let raw = &data[pos..end];
            pos = end + 1;
            lineno += 1;

            let line = from_utf8(raw).map_err(|e| AnnotationError::Format {
                line: lineno,
                reason: format!("line is not valid UTF-8 -> {e}"),
                content: String::from_utf8_lossy(raw).into_owned(),
            })?;
            let line = line.trim_end_matches('\r');

            if line.trim().is_empty() || is_header(line) {
                continue;
            }

            let gene = GeneAnnotation::parse(line, lineno)?;
            genes.insert(gene.gene_id.clone(), gene);
        }

        Ok(Self { genes })
    }

    pub fn get(&self, gene_id: &str) -> Option<&GeneAnnotation> {
        self.genes.get(gene_id)
    }

    pub fn contains(&self, gene_id: &str) -> bool {
        self.genes.contains_key(gene_id)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Gene ids in lexicographic order, the default analysis order.
    pub fn sorted_ids(&self) -> Vec<SmolStr> {
        let mut ids = self.genes.keys().cloned().collect::<Vec<SmolStr>>();
        ids.sort_unstable();
        ids
    }
}
