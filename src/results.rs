//! Benchmark result tables
//!
//! Each benchmark run writes one CSV per machine with a header row. Recognized
//! columns are `gpu`, `label`, `S`, `ms_tok`, `bw_gbs`, `kv_mb` and `peak_mb`;
//! anything else is ignored.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AttnCompareError, Result};

/// Default input glob
pub const DEFAULT_PATTERN: &str = "results/*.csv";

/// One decode-attention measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRow {
    /// Device name reported by the benchmark
    #[serde(default)]
    pub gpu: Option<String>,
    /// Attention variant tag (MHA, MQA, GQA)
    pub label: String,
    /// Sequence length (cached tokens)
    #[serde(rename = "S")]
    pub seq_len: u64,
    /// Milliseconds per decoded token
    pub ms_tok: f64,
    /// Measured bandwidth (GB/s)
    pub bw_gbs: f64,
    /// KV-cache size (MB)
    #[serde(default)]
    pub kv_mb: Option<f64>,
    /// Peak allocated device memory (MB)
    #[serde(default, alias = "peak_alloc_mb")]
    pub peak_mb: Option<f64>,
}

/// All rows from one result file
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    /// Device name from the first row, else the file name
    pub gpu_name: String,
    /// File the rows were read from
    pub source: PathBuf,
    /// Rows in file order
    pub rows: Vec<BenchmarkRow>,
}

impl ResultTable {
    /// Build a table, recovering the device name from the first row
    ///
    /// Returns `None` when there are no rows.
    pub fn from_rows(source: impl Into<PathBuf>, rows: Vec<BenchmarkRow>) -> Option<Self> {
        let source = source.into();
        let first = rows.first()?;

        let gpu_name = first
            .gpu
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(|| file_name(&source), str::to_string);

        Some(Self {
            gpu_name,
            source,
            rows,
        })
    }

    /// Parse CSV rows from a reader
    ///
    /// # Errors
    ///
    /// Returns `FormatError` naming `source` and the 1-based data row on any
    /// malformed record.
    pub fn read_rows<R: Read>(reader: R, source: &Path) -> Result<Vec<BenchmarkRow>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (row_idx, record) in csv_reader.deserialize::<BenchmarkRow>().enumerate() {
            let row = record.map_err(|e| AttnCompareError::FormatError {
                reason: format!("{} row {}: {e}", source.display(), row_idx + 1),
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    /// Load a table from a CSV file; `Ok(None)` when it has no data rows
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be opened, `FormatError` on bad rows.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| AttnCompareError::IoError {
            message: format!("Failed to open {}: {e}", path.display()),
        })?;
        let rows = Self::read_rows(file, path)?;
        Ok(Self::from_rows(path, rows))
    }

    /// Rows for one attention variant (exact label match)
    pub fn variant_rows<'a>(&'a self, variant: &'a str) -> impl Iterator<Item = &'a BenchmarkRow> {
        self.rows.iter().filter(move |r| r.label == variant)
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Load every CSV matching `pattern`, one table per GPU
///
/// Files are visited in sorted path order. Files without data rows are skipped.
/// When two files report the same GPU, the later one replaces the earlier one.
/// The result is sorted by GPU name.
///
/// # Errors
///
/// Returns `NoInputFiles` if nothing matches, `InvalidConfiguration` for a bad
/// glob, and propagates read/parse errors.
pub fn load_tables(pattern: &str) -> Result<Vec<ResultTable>> {
    let paths = glob::glob(pattern).map_err(|e| {
        AttnCompareError::InvalidConfiguration(format!("Invalid glob pattern '{pattern}': {e}"))
    })?;

    let mut files: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("skipping unreadable path: {e}");
                None
            },
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(AttnCompareError::NoInputFiles {
            pattern: pattern.to_string(),
        });
    }

    let mut by_gpu: BTreeMap<String, ResultTable> = BTreeMap::new();
    for path in &files {
        let Some(table) = ResultTable::from_path(path)? else {
            tracing::debug!(path = %path.display(), "skipping empty result file");
            continue;
        };
        tracing::debug!(
            path = %path.display(),
            gpu = %table.gpu_name,
            rows = table.len(),
            "loaded result table"
        );
        if let Some(previous) = by_gpu.insert(table.gpu_name.clone(), table) {
            tracing::warn!(
                gpu = %previous.gpu_name,
                replaced = %previous.source.display(),
                "duplicate GPU name, keeping the later file"
            );
        }
    }

    Ok(by_gpu.into_values().collect())
}
