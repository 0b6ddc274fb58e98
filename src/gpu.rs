//! GPU identification by ordered substring matching
//!
//! Maps a vendor-reported device name (e.g. `"NVIDIA H100 80GB HBM3"`) onto a
//! canonical display name, a theoretical peak memory bandwidth, and a sort rank.
//!
//! Profiles are checked in declaration order and the first pattern contained in
//! the lowercased name wins, so more specific patterns must precede more general
//! ones. [`GpuCatalog::new`] rejects catalogs where a later pattern can never match.
//!
//! ```
//! use attn_compare::gpu::GpuCatalog;
//!
//! let catalog = GpuCatalog::builtin();
//! let id = catalog.identify("NVIDIA A100-SXM4-80GB");
//! assert_eq!(id.display_name, "A100 SXM4");
//! assert_eq!(id.peak_bw_gbs, Some(2039.0));
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AttnCompareError, Result};

/// Known GPU: lowercase match pattern, display name, and peak bandwidth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuProfile {
    /// Lowercase substring matched against the device name
    pub pattern: String,
    /// Canonical name used in chart legends
    pub display_name: String,
    /// Theoretical peak memory bandwidth (GB/s)
    pub peak_bw_gbs: f64,
}

impl GpuProfile {
    /// Create a new profile
    pub fn new(pattern: &str, display_name: &str, peak_bw_gbs: f64) -> Self {
        Self {
            pattern: pattern.to_string(),
            display_name: display_name.to_string(),
            peak_bw_gbs,
        }
    }
}

/// Built-in profiles, most specific first. Bandwidths are vendor datasheet values.
const BUILTIN_PROFILES: &[(&str, &str, f64)] = &[
    ("h100 80gb hbm3", "H100 SXM", 3350.0),
    ("h100 pcie", "H100 PCIe", 2039.0),
    ("a100-sxm", "A100 SXM4", 2039.0),
    ("rtx 2060", "RTX 2060", 336.0),
];

/// Result of identifying a device name
#[derive(Debug, Clone, PartialEq)]
pub struct GpuIdentity {
    /// Display name (raw input when unknown)
    pub display_name: String,
    /// Peak bandwidth (GB/s), `None` when unknown
    pub peak_bw_gbs: Option<f64>,
    /// Position of the matched profile; `catalog.len()` when unknown
    pub sort_rank: usize,
}

impl GpuIdentity {
    /// Whether the name matched a catalog profile
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.peak_bw_gbs.is_some()
    }
}

/// Immutable ordered list of GPU profiles
#[derive(Debug, Clone, PartialEq)]
pub struct GpuCatalog {
    profiles: Vec<GpuProfile>,
}

impl Default for GpuCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GpuCatalog {
    /// Create a catalog from profiles in priority order
    ///
    /// Patterns are trimmed and lowercased.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if a pattern is empty, a peak bandwidth is
    /// not a positive finite number, or a profile is shadowed by an earlier one
    /// whose pattern it contains.
    pub fn new(profiles: Vec<GpuProfile>) -> Result<Self> {
        let mut normalized: Vec<GpuProfile> = Vec::with_capacity(profiles.len());

        for mut profile in profiles {
            profile.pattern = profile.pattern.trim().to_lowercase();

            if profile.pattern.is_empty() {
                return Err(AttnCompareError::InvalidConfiguration(format!(
                    "GPU profile '{}' has an empty pattern",
                    profile.display_name
                )));
            }
            if !profile.peak_bw_gbs.is_finite() || profile.peak_bw_gbs <= 0.0 {
                return Err(AttnCompareError::InvalidConfiguration(format!(
                    "GPU profile '{}' has invalid peak bandwidth {}",
                    profile.display_name, profile.peak_bw_gbs
                )));
            }
            if let Some(earlier) = normalized
                .iter()
                .find(|p| profile.pattern.contains(p.pattern.as_str()))
            {
                return Err(AttnCompareError::InvalidConfiguration(format!(
                    "GPU profile '{}' is unreachable: pattern '{}' is shadowed by earlier pattern '{}'",
                    profile.display_name, profile.pattern, earlier.pattern
                )));
            }

            normalized.push(profile);
        }

        Ok(Self {
            profiles: normalized,
        })
    }

    /// The built-in catalog
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            profiles: BUILTIN_PROFILES
                .iter()
                .map(|&(pattern, name, bw)| GpuProfile::new(pattern, name, bw))
                .collect(),
        }
    }

    /// Parse a catalog from a JSON array of profiles
    ///
    /// # Errors
    ///
    /// Returns `FormatError` on malformed JSON, or any error from [`GpuCatalog::new`].
    pub fn from_json(json: &str) -> Result<Self> {
        let profiles: Vec<GpuProfile> =
            serde_json::from_str(json).map_err(|e| AttnCompareError::FormatError {
                reason: format!("Failed to parse GPU catalog: {e}"),
            })?;
        Self::new(profiles)
    }

    /// Load a catalog from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read, otherwise as [`GpuCatalog::from_json`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| AttnCompareError::IoError {
            message: format!("Failed to read GPU catalog {}: {e}", path.display()),
        })?;
        Self::from_json(&json)
    }

    /// Number of profiles (also the rank given to unknown GPUs)
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the catalog has no profiles
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles in priority order
    #[must_use]
    pub fn profiles(&self) -> &[GpuProfile] {
        &self.profiles
    }

    /// Identify a device name; first matching profile wins
    #[must_use]
    pub fn identify(&self, name: &str) -> GpuIdentity {
        let lower = name.to_lowercase();

        self.profiles
            .iter()
            .enumerate()
            .find(|(_, p)| lower.contains(p.pattern.as_str()))
            .map_or_else(
                || GpuIdentity {
                    display_name: name.to_string(),
                    peak_bw_gbs: None,
                    sort_rank: self.profiles.len(),
                },
                |(rank, p)| GpuIdentity {
                    display_name: p.display_name.clone(),
                    peak_bw_gbs: Some(p.peak_bw_gbs),
                    sort_rank: rank,
                },
            )
    }

    /// Identify `name`, or `fallback` when the name is absent
    #[must_use]
    pub fn identify_or(&self, name: Option<&str>, fallback: &str) -> GpuIdentity {
        self.identify(name.unwrap_or(fallback))
    }
}
