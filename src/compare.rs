//! Cross-GPU comparison: filter, align, order
//!
//! Turns loaded [`ResultTable`]s into one [`GpuSeries`] per GPU, restricted to a
//! single attention variant and ordered by catalog rank so known GPUs appear in
//! declaration order and unknown ones last.
//!
//! ## Alignment
//!
//! - [`Alignment::PerGpu`]: every GPU keeps its own sequence lengths. GPUs with
//!   more memory are often benchmarked at longer sequences.
//! - [`Alignment::Intersection`]: only sequence lengths present for every GPU.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write as FmtWrite};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AttnCompareError, Result};
use crate::gpu::{GpuCatalog, GpuIdentity};
use crate::results::{ResultTable, DEFAULT_PATTERN};

/// Default attention variant to compare
pub const DEFAULT_VARIANT: &str = "MHA";

/// Default comparison chart path
pub const DEFAULT_OUTPUT: &str = "results/compare.png";

/// Measured bandwidth as a percentage of theoretical peak
#[must_use]
pub fn percent_of_peak(bw_gbs: f64, peak_bw_gbs: f64) -> f64 {
    bw_gbs / peak_bw_gbs * 100.0
}

// ============================================================================
// Configuration
// ============================================================================

/// How sequence lengths are aligned across GPUs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Each GPU over its own sequence lengths
    #[default]
    PerGpu,
    /// Only sequence lengths shared by every GPU
    Intersection,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerGpu => write!(f, "per-gpu"),
            Self::Intersection => write!(f, "intersection"),
        }
    }
}

impl FromStr for Alignment {
    type Err = AttnCompareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "per-gpu" | "pergpu" | "per_gpu" => Ok(Self::PerGpu),
            "intersection" | "intersect" | "strict" => Ok(Self::Intersection),
            other => Err(AttnCompareError::InvalidConfiguration(format!(
                "unknown alignment '{other}' (expected per-gpu or intersection)"
            ))),
        }
    }
}

/// Comparison run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CompareConfig {
    /// Glob selecting result CSVs
    pub pattern: String,
    /// Attention variant label to keep
    pub variant: String,
    /// Sequence-length alignment
    pub alignment: Alignment,
    /// Three-panel comparison chart path
    pub output: PathBuf,
    /// Standalone percent-of-peak chart path
    pub percent_output: Option<PathBuf>,
    /// Print the Markdown summary table
    pub print_table: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            variant: DEFAULT_VARIANT.to_string(),
            alignment: Alignment::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            percent_output: None,
            print_table: false,
        }
    }
}

impl CompareConfig {
    /// Create a config with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input glob
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set the attention variant
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    /// Set the alignment mode
    #[must_use]
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the comparison chart path
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Also write the standalone percent-of-peak chart
    #[must_use]
    pub fn with_percent_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.percent_output = Some(output.into());
        self
    }

    /// Print the summary table
    #[must_use]
    pub fn with_table(mut self, print_table: bool) -> Self {
        self.print_table = print_table;
        self
    }
}

// ============================================================================
// Series
// ============================================================================

/// One plotted point
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    /// Sequence length
    pub seq_len: u64,
    /// Milliseconds per token
    pub ms_tok: f64,
    /// Measured bandwidth (GB/s)
    pub bw_gbs: f64,
    /// KV-cache size (MB)
    pub kv_mb: Option<f64>,
}

/// One GPU's measurements for the compared variant
#[derive(Debug, Clone, PartialEq)]
pub struct GpuSeries {
    /// Raw device name
    pub gpu_name: String,
    /// Catalog lookup result
    pub identity: GpuIdentity,
    /// Points sorted by sequence length, one per length
    pub points: Vec<SeriesPoint>,
}

impl GpuSeries {
    /// Build a series from a table's rows for `variant`
    ///
    /// A repeated sequence length keeps the last row.
    pub fn from_table(table: &ResultTable, catalog: &GpuCatalog, variant: &str) -> Self {
        let mut by_len: BTreeMap<u64, SeriesPoint> = BTreeMap::new();
        for row in table.variant_rows(variant) {
            by_len.insert(
                row.seq_len,
                SeriesPoint {
                    seq_len: row.seq_len,
                    ms_tok: row.ms_tok,
                    bw_gbs: row.bw_gbs,
                    kv_mb: row.kv_mb,
                },
            );
        }

        Self {
            gpu_name: table.gpu_name.clone(),
            identity: catalog.identify(&table.gpu_name),
            points: by_len.into_values().collect(),
        }
    }

    /// Legend label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.identity.display_name
    }

    /// Theoretical peak bandwidth, if known
    #[must_use]
    pub fn peak_bw_gbs(&self) -> Option<f64> {
        self.identity.peak_bw_gbs
    }

    /// Sequence lengths present
    #[must_use]
    pub fn seq_lens(&self) -> BTreeSet<u64> {
        self.points.iter().map(|p| p.seq_len).collect()
    }

    /// `(S, ms/tok)` pairs
    #[must_use]
    pub fn latency(&self) -> Vec<(u64, f64)> {
        self.points.iter().map(|p| (p.seq_len, p.ms_tok)).collect()
    }

    /// `(S, GB/s)` pairs
    #[must_use]
    pub fn bandwidth(&self) -> Vec<(u64, f64)> {
        self.points.iter().map(|p| (p.seq_len, p.bw_gbs)).collect()
    }

    /// `(S, % of peak)` pairs; `None` for unknown GPUs
    #[must_use]
    pub fn percent_of_peak(&self) -> Option<Vec<(u64, f64)>> {
        let peak = self.peak_bw_gbs()?;
        Some(
            self.points
                .iter()
                .map(|p| (p.seq_len, percent_of_peak(p.bw_gbs, peak)))
                .collect(),
        )
    }

    fn retain_seq_lens(&mut self, keep: &BTreeSet<u64>) {
        self.points.retain(|p| keep.contains(&p.seq_len));
    }
}

/// Sequence lengths present in every series
///
/// Empty when there are no series.
#[must_use]
pub fn shared_seq_lens(series: &[GpuSeries]) -> BTreeSet<u64> {
    let mut iter = series.iter();
    let Some(first) = iter.next() else {
        return BTreeSet::new();
    };
    iter.fold(first.seq_lens(), |acc, s| {
        acc.intersection(&s.seq_lens()).copied().collect()
    })
}

/// Sort by catalog rank, then raw name
pub fn order_series(series: &mut [GpuSeries]) {
    series.sort_by(|a, b| {
        a.identity
            .sort_rank
            .cmp(&b.identity.sort_rank)
            .then_with(|| a.gpu_name.cmp(&b.gpu_name))
    });
}

// ============================================================================
// Comparison
// ============================================================================

/// Ordered, aligned series ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Compared attention variant
    pub variant: String,
    /// Alignment applied
    pub alignment: Alignment,
    /// Series in legend order
    pub series: Vec<GpuSeries>,
}

impl Comparison {
    /// Filter, align, and order tables for one variant
    ///
    /// # Errors
    ///
    /// Returns `EmptyIntersection` in intersection mode when no sequence length
    /// is shared by every table.
    pub fn build(
        tables: &[ResultTable],
        catalog: &GpuCatalog,
        variant: &str,
        alignment: Alignment,
    ) -> Result<Self> {
        let mut series: Vec<GpuSeries> = tables
            .iter()
            .map(|t| GpuSeries::from_table(t, catalog, variant))
            .collect();

        for s in &series {
            if s.points.is_empty() {
                tracing::warn!(gpu = %s.gpu_name, variant, "no rows for variant");
            }
            if !s.identity.is_known() {
                tracing::info!(gpu = %s.gpu_name, "unknown GPU, no peak bandwidth reference");
            }
        }

        if alignment == Alignment::Intersection {
            let shared = shared_seq_lens(&series);
            if shared.is_empty() {
                return Err(AttnCompareError::EmptyIntersection {
                    variant: variant.to_string(),
                });
            }
            tracing::debug!(?shared, "aligned to shared sequence lengths");
            for s in &mut series {
                s.retain_seq_lens(&shared);
            }
        }

        order_series(&mut series);

        Ok(Self {
            variant: variant.to_string(),
            alignment,
            series,
        })
    }

    /// Build from a config's variant and alignment
    ///
    /// # Errors
    ///
    /// See [`Comparison::build`].
    pub fn from_config(
        tables: &[ResultTable],
        catalog: &GpuCatalog,
        config: &CompareConfig,
    ) -> Result<Self> {
        Self::build(tables, catalog, &config.variant, config.alignment)
    }

    /// Chart title
    #[must_use]
    pub fn title(&self) -> String {
        format!("cross-GPU decode attention ({})", self.variant)
    }

    /// Whether any series has points
    #[must_use]
    pub fn has_points(&self) -> bool {
        self.series.iter().any(|s| !s.points.is_empty())
    }

    /// Smallest and largest sequence length across all series
    #[must_use]
    pub fn seq_len_bounds(&self) -> Option<(u64, u64)> {
        let lens = self.series.iter().flat_map(|s| s.points.iter().map(|p| p.seq_len));
        let (mut lo, mut hi) = (u64::MAX, 0u64);
        let mut any = false;
        for len in lens {
            lo = lo.min(len);
            hi = hi.max(len);
            any = true;
        }
        any.then_some((lo, hi))
    }

    /// Markdown table, one line per (GPU, S)
    pub fn to_markdown_table(&self) -> String {
        let mut table = String::new();

        table.push_str("| GPU | S | ms/tok | GB/s | % of peak | KV MB |\n");
        table.push_str("|-----|---|--------|------|-----------|-------|\n");

        for s in &self.series {
            for p in &s.points {
                let pct = s
                    .peak_bw_gbs()
                    .map_or_else(|| "-".to_string(), |peak| {
                        format!("{:.1}%", percent_of_peak(p.bw_gbs, peak))
                    });
                let kv = p.kv_mb.map_or_else(|| "-".to_string(), |kv| format!("{kv:.2}"));
                let _ = writeln!(
                    table,
                    "| {} | {} | {:.4} | {:.1} | {} | {} |",
                    s.label(),
                    p.seq_len,
                    p.ms_tok,
                    p.bw_gbs,
                    pct,
                    kv,
                );
            }
        }

        table
    }
}
