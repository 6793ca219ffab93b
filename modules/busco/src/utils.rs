//! File helpers shared by the pipeline
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Output writers and human-readable sizes for progress messages.

use anyhow::{Context, Result};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Opens a buffered writer on `path`, or on stdout when no path is given.
///
/// An existing file is truncated.
///
/// # Example
///
/// ```rust, ignore
/// let mut writer = create_writer(args.output.as_deref())?;
/// write_gene_table(&results, &mut writer)?;
/// ```
pub fn create_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("ERROR: cannot create file {path:?}"))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(std::io::stdout().lock()))),
    }
}

/// Human-readable file size for progress messages.
pub fn file_size<P: AsRef<Path>>(path: P) -> String {
    let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    match bytes {
        b if b >= 1 << 30 => format!("{:.2} GiB", b as f64 / (1u64 << 30) as f64),
        b if b >= 1 << 20 => format!("{:.2} MiB", b as f64 / (1u64 << 20) as f64),
        b if b >= 1 << 10 => format!("{:.2} KiB", b as f64 / (1u64 << 10) as f64),
        b => format!("{b} B"),
    }
}
