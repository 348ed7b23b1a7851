//! Typed errors for artifact loading and trial aggregation.
//!
//! All inputs are static, already-computed files, so there are no retries
//! anywhere: a missing artifact means an upstream pipeline gap, not a
//! transient fault, and the analysis aborts rather than fall back to a
//! partial result.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors produced while loading result artifacts or aggregating trials.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The artifact file for a key does not exist.
    #[error("artifact not found: {}", path.display())]
    ArtifactNotFound {
        /// Full path that was probed.
        path: PathBuf,
    },

    /// The artifact exists but its payload is not what the key promises.
    #[error("artifact {}: {reason}", path.display())]
    ArtifactFormat {
        /// Full path of the offending file.
        path: PathBuf,
        /// What was wrong with the payload.
        reason: String,
    },

    /// A statistics input carried no trials.
    #[error("empty input: {what}")]
    EmptyInput {
        /// Which input was empty.
        what: String,
    },

    /// A label outside the fixed sweep vocabularies.
    #[error("unknown {kind} label '{value}'")]
    UnknownLabel {
        /// Label family ("psf", "estimator", "dataset", ...).
        kind: &'static str,
        /// The offending value.
        value: String,
    },

    /// A photon count outside the canonical sweep set.
    #[error("photon count {value} is not part of the sweep set")]
    UnknownPhotonCount {
        /// The offending photon count.
        value: u32,
    },

    /// Outlier clipping needs a ratio threshold above 1.
    #[error("clip ratio threshold must exceed 1.0, got {value}")]
    InvalidThreshold {
        /// The rejected threshold.
        value: f64,
    },

    /// Confidence levels are two-sided fractions strictly inside (0, 1).
    #[error("confidence level must lie in (0, 1), got {value}")]
    InvalidConfidence {
        /// The rejected level.
        value: f64,
    },

    /// Underlying I/O failure other than a missing artifact.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
