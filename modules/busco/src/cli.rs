use clap::Parser;
use std::path::PathBuf;

use crate::consts::{DEFAULT_IMPG, DEFAULT_THREADS};

#[derive(Debug, Parser)]
#[command(
    name = "busco-cov",
    about = "Evaluate how well a whole-genome alignment reproduces BUSCO gene locations",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Args {
    #[arg(
        short = 't',
        long = "target-bed",
        required = true,
        help = "Path to BUSCO .bed file for the target genome"
    )]
    pub target_bed: PathBuf,

    #[arg(
        short = 'q',
        long = "query-bed",
        required = true,
        help = "Path to BUSCO .bed file for the query genome"
    )]
    pub query_bed: PathBuf,

    #[arg(
        short = 'p',
        long = "paf",
        required = true,
        help = "Path to the .paf alignment queried through impg"
    )]
    pub paf: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        required = false,
        help = "Path to per-gene results [default: stdout]"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 's',
        long = "summary-output",
        required = false,
        help = "Path to summary table with classification counts"
    )]
    pub summary_output: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "coverage-output",
        required = false,
        help = "Path to genome-wide coverage table"
    )]
    pub coverage_output: Option<PathBuf>,

    #[arg(
        short = 'g',
        long = "gene",
        required = false,
        help = "Analyze only this BUSCO gene"
    )]
    pub gene: Option<String>,

    #[arg(
        short = 'T',
        long = "threads",
        help = "Number of threads",
        value_name = "THREADS",
        default_value_t = DEFAULT_THREADS
    )]
    pub threads: usize,

    #[arg(
        long = "impg",
        help = "Path to the impg binary",
        value_name = "IMPG",
        default_value = DEFAULT_IMPG
    )]
    pub impg: PathBuf,

    #[arg(
        short = 'L',
        long = "level",
        help = "Logging level",
        value_name = "LEVEL",
        default_value_t = log::Level::Info,
    )]
    pub level: log::Level,
}

impl Args {
    /// Validates arguments that clap cannot check on its own.
    pub fn check(&self) -> Result<(), String> {
        if self.threads == 0 {
            return Err("ERROR: --threads must be greater than 0".to_string());
        }

        for (flag, path) in [
            ("--target-bed", &self.target_bed),
            ("--query-bed", &self.query_bed),
            ("--paf", &self.paf),
        ] {
            if !path.exists() {
                return Err(format!("ERROR: {flag} file {path:?} does not exist"));
            }
        }

        Ok(())
    }
}
