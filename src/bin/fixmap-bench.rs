//! Times `FixedKeyMap` create/populate/drop cycles and prints the elapsed
//! seconds.
//!
//! Usage: `fixmap-bench [ITERATIONS] [--stack|--heap] [--wall|--cpu]`
//!
//! Diagnostics go to stderr; set `FIXMAP_LOG=debug` for more detail.

use std::process::ExitCode;

use fixmap::bench::{self, BenchConfig, BenchError};
use fixmap::logger;
use log::{debug, info, LevelFilter};

const USAGE: &str = "usage: fixmap-bench [ITERATIONS] [--stack|--heap] [--wall|--cpu]";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match &e {
                BenchError::Usage(msg) => eprintln!("{}\n{}", msg, USAGE),
                other => {
                    debug!("{:?}", other);
                    eprintln!("fixmap-bench: {}", other);
                }
            }
            ExitCode::from(e.exit_status())
        }
    }
}

fn run() -> Result<(), BenchError> {
    logger::init(logger::level_from_env(LevelFilter::Info))?;

    let config = BenchConfig::from_args(std::env::args().skip(1))?;
    info!(
        "{} iterations, {:?} placement, {:?} timer",
        config.iterations, config.placement, config.timer
    );

    let report = bench::run(&config)?;
    info!("checksum {}", report.checksum);
    println!("{}", report);
    Ok(())
}
