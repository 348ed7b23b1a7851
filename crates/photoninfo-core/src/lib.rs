//! # photoninfo-core
//!
//! **How many bits does your optic keep, and do they help the task?**
//!
//! `photoninfo-core` is the analysis library behind photon-limited imaging
//! sweeps: it loads precomputed mutual-information estimates and classifier
//! accuracies from their conventional on-disk layout, aggregates repeated
//! trials into robust point estimates with confidence bands, and hands the
//! ordered series to reports and figures.
//!
//! ## Quick Start
//!
//! ```no_run
//! use photoninfo_core::{ArtifactKind, Estimator, ResultStore, Strategy, Sweep};
//!
//! # fn main() -> photoninfo_core::Result<()> {
//! // The standard sweep: 4 PSFs x 9 photon counts x 10 trials
//! let store = ResultStore::open("results");
//! let sweep = Sweep::standard("bsccm")?;
//! let kind = ArtifactKind::MutualInformation {
//!     estimator: Estimator::Gaussian,
//! };
//! let grid = store.load_grid(&sweep, &kind)?;
//!
//! // Clip diverged trials, then mean + 90% percentile band per condition
//! let bands = grid.aggregate(&Strategy::default())?;
//! for &psf in bands.psfs() {
//!     println!("{psf}: {:?}", bands.band_row(psf)?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Keys → Store (one `.npy` per condition) → TrialGrid → Aggregate → Report
//!
//! Two result families share the pipeline. **MI estimates** arrive per
//! estimator (`gaussian`, `pixelcnn`) in bits/pixel; **classifier
//! accuracies** arrive per (bias, model) in `[0, 1]`. Both are small
//! arrays of per-seed trials, and both get the same treatment: outliers
//! clipped toward the condition minimum (MI estimators occasionally
//! diverge upward), then a mean or minimum point estimate with a
//! percentile or Student-t band.
//!
//! Every load is keyed by a typed [`ArtifactKey`]; the naming scheme
//! lives in exactly one place so the analysis can never drift from the
//! upstream pipeline's layout.

pub mod aggregate;
pub mod error;
pub mod key;
pub mod labels;
pub mod npy;
pub mod report;
pub mod store;

pub use aggregate::{
    ConfidenceBand, IntervalMethod, PointEstimate, Strategy, aggregate, confidence_interval,
    mean_aggregate, minimum_aggregate, outlier_clip, parametric_interval, percentile,
};
pub use error::{AnalysisError, Result};
pub use key::{ArtifactKey, ArtifactKind};
pub use labels::{
    DEFAULT_DATASET, DEFAULT_TRIALS, Estimator, PHOTON_COUNTS, Psf, Sweep, check_identifier,
    check_photon_count,
};
pub use npy::{NpyArray, NpyError};
pub use report::{AccuracySection, EstimatorSeries, PsfSeries, REPORT_VERSION, SweepReport};
pub use store::{AggregateGrid, ResultStore, TrialGrid};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
