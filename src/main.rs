//! attn-compare CLI
//!
//! Compares decode-phase attention benchmark results across GPUs.
//!
//! ```text
//! attn-compare                                   # results/*.csv -> results/compare.png
//! attn-compare --pct-output results/compare-pct.png
//! attn-compare --variant GQA --align intersection --table
//! ```

use std::process::ExitCode;

use attn_compare::cli::{entrypoint, init_logging, Cli};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match entrypoint(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}
