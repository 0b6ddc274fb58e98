//! # attn-compare
//!
//! Cross-GPU comparison of decode-phase attention benchmarks.
//!
//! Each benchmark machine writes a CSV of per-token latency and achieved memory
//! bandwidth over a range of KV-cache sequence lengths. This crate loads those
//! tables, identifies the GPU behind each one, and renders comparison charts
//! against each GPU's theoretical peak bandwidth.
//!
//! ## Pipeline
//!
//! ```text
//! results/*.csv ─▶ load_tables ─▶ Comparison::build ─▶ render_comparison ─▶ compare.png
//!                                  │ filter variant
//!                                  │ align sequence lengths
//!                                  │ order by GpuCatalog rank
//! ```
//!
//! ## Example
//!
//! ```rust
//! use attn_compare::compare::{percent_of_peak, Alignment, Comparison};
//! use attn_compare::gpu::GpuCatalog;
//! use attn_compare::results::{BenchmarkRow, ResultTable};
//!
//! let catalog = GpuCatalog::builtin();
//! let row = BenchmarkRow {
//!     gpu: Some("NVIDIA A100-SXM4-80GB".to_string()),
//!     label: "MHA".to_string(),
//!     seq_len: 4096,
//!     ms_tok: 0.02,
//!     bw_gbs: 1500.0,
//!     kv_mb: Some(1.05),
//!     peak_mb: None,
//! };
//! let table = ResultTable::from_rows("a100.csv", vec![row]).unwrap();
//! let cmp = Comparison::build(&[table], &catalog, "MHA", Alignment::PerGpu).unwrap();
//!
//! assert_eq!(cmp.series[0].label(), "A100 SXM4");
//! assert!((percent_of_peak(1500.0, 2039.0) - 73.57).abs() < 0.01);
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Clippy allows (MUST come after deny/warn to override them)
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // u64 sequence lengths -> f64 plot coordinates
#![allow(clippy::must_use_candidate)] // Not all methods need #[must_use]
#![allow(clippy::doc_markdown)] // Allow technical terms without backticks
#![allow(clippy::uninlined_format_args)] // Prefer explicit format args
#![allow(clippy::missing_panics_doc)] // Allow missing Panics doc sections
#![allow(clippy::float_cmp)] // Allow float comparisons in tests

/// CLI argument definitions and the comparison pipeline
pub mod cli;
/// Filtering, alignment, and ordering of result tables
pub mod compare;
pub mod error;
/// GPU identification and peak bandwidth catalog
///
/// Ordered substring matching: the first profile whose pattern occurs in the
/// lowercased device name wins.
pub mod gpu;
/// Latency, bandwidth, and percent-of-peak charts
pub mod render;
pub mod results;

// Re-exports for convenience
pub use error::{AttnCompareError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
