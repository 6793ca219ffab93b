use clap::Parser;
use log::{error, info};
use simple_logger::init_with_level;

use busco_cov::{cli::Args, run_busco};

fn main() {
    let start = std::time::Instant::now();

    let args = Args::parse();

    init_with_level(args.level).unwrap_or_else(|e| {
        eprintln!("ERROR: could not initialize logger -> {e}");
        std::process::exit(1);
    });

    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    run_busco(args).unwrap_or_else(|e| {
        error!("{:#}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
