//! Error types for attn-compare
//!
//! All fallible operations in the crate return [`Result`], an alias over
//! [`AttnCompareError`]. The binary maps any error onto exit status 1.

use thiserror::Error;

/// Result type alias for attn-compare operations
pub type Result<T> = std::result::Result<T, AttnCompareError>;

/// Error type for all attn-compare operations
#[derive(Debug, Error)]
pub enum AttnCompareError {
    /// No file matched the input glob
    #[error("no CSV files found matching '{pattern}'")]
    NoInputFiles {
        /// Glob pattern that was searched
        pattern: String,
    },

    /// Intersection alignment left no sequence length shared by every GPU
    #[error("no sequence lengths shared by all GPUs for variant '{variant}'")]
    EmptyIntersection {
        /// Attention variant being compared
        variant: String,
    },

    /// Invalid configuration (bad glob, bad GPU catalog)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// I/O error
    #[error("I/O error: {message}")]
    IoError {
        /// Error message
        message: String,
    },

    /// Malformed CSV or catalog file
    #[error("Format error: {reason}")]
    FormatError {
        /// Reason for the failure
        reason: String,
    },

    /// Chart drawing failed
    #[error("Render error: {reason}")]
    RenderError {
        /// Reason for the failure
        reason: String,
    },
}
