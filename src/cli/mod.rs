//! CLI command implementations
//!
//! Argument definitions and the load → build → render pipeline, kept out of
//! main.rs for testability.

// CLI glue code - relaxed lint requirements
#![allow(clippy::missing_errors_doc)]

use std::path::PathBuf;

use clap::Parser;

use crate::compare::{Alignment, CompareConfig, Comparison, DEFAULT_OUTPUT, DEFAULT_VARIANT};
use crate::error::Result;
use crate::gpu::GpuCatalog;
use crate::render;
use crate::results::{load_tables, DEFAULT_PATTERN};

/// attn-compare - cross-GPU decode attention comparison charts
///
/// Reads one benchmark CSV per GPU and renders latency, bandwidth, and
/// percent-of-peak charts. Every flag is optional.
#[derive(Debug, Parser)]
#[command(name = "attn-compare")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Glob selecting result CSVs
    #[arg(short, long, default_value = DEFAULT_PATTERN)]
    pub input: String,

    /// Attention variant to compare (MHA, MQA, GQA)
    #[arg(long, default_value = DEFAULT_VARIANT)]
    pub variant: String,

    /// Sequence-length alignment: per-gpu or intersection
    #[arg(long, default_value = "per-gpu")]
    pub align: Alignment,

    /// Comparison chart output path
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Also write a standalone percent-of-peak chart
    #[arg(long, value_name = "PATH")]
    pub pct_output: Option<PathBuf>,

    /// JSON GPU catalog replacing the built-in one
    #[arg(long, value_name = "JSON")]
    pub profiles: Option<PathBuf>,

    /// Print a Markdown summary table
    #[arg(long)]
    pub table: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Comparison config described by the flags
    #[must_use]
    pub fn config(&self) -> CompareConfig {
        let mut config = CompareConfig::new()
            .with_pattern(self.input.clone())
            .with_variant(self.variant.clone())
            .with_alignment(self.align)
            .with_output(self.output.clone())
            .with_table(self.table);
        if let Some(pct) = &self.pct_output {
            config = config.with_percent_output(pct.clone());
        }
        config
    }

    /// GPU catalog: `--profiles` file or the built-in table
    pub fn catalog(&self) -> Result<GpuCatalog> {
        match &self.profiles {
            Some(path) => GpuCatalog::from_json_file(path),
            None => Ok(GpuCatalog::builtin()),
        }
    }
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` takes precedence; otherwise `warn`, or `debug` when verbose.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// What a comparison run produced
#[derive(Debug, Clone, PartialEq)]
pub struct CompareReport {
    /// GPU names loaded, sorted
    pub gpus: Vec<String>,
    /// Chart files written
    pub written: Vec<PathBuf>,
    /// Markdown summary, when requested
    pub table: Option<String>,
}

/// Load, build, and render one comparison
///
/// Prints progress lines to stdout.
pub fn run_compare(config: &CompareConfig, catalog: &GpuCatalog) -> Result<CompareReport> {
    let tables = load_tables(&config.pattern)?;
    let gpus: Vec<String> = tables.iter().map(|t| t.gpu_name.clone()).collect();
    println!("loaded {} GPU(s): {}", gpus.len(), gpus.join(", "));

    let comparison = Comparison::from_config(&tables, catalog, config)?;
    tracing::debug!(
        variant = %comparison.variant,
        alignment = %comparison.alignment,
        series = comparison.series.len(),
        "comparison built"
    );

    let mut written = Vec::new();

    render::render_comparison(&comparison, &config.output)?;
    println!("saved {}", config.output.display());
    written.push(config.output.clone());

    if let Some(pct_path) = &config.percent_output {
        render::render_percent_of_peak(&comparison, pct_path)?;
        println!("saved {}", pct_path.display());
        written.push(pct_path.clone());
    }

    let table = config.print_table.then(|| comparison.to_markdown_table());
    if let Some(md) = &table {
        println!();
        print!("{md}");
    }

    Ok(CompareReport {
        gpus,
        written,
        table,
    })
}

/// Main CLI entrypoint
pub fn entrypoint(cli: &Cli) -> Result<CompareReport> {
    let catalog = cli.catalog()?;
    run_compare(&cli.config(), &catalog)
}
