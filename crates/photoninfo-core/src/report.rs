//! Serializable summary of an aggregated sweep.
//!
//! A [`SweepReport`] flattens [`AggregateGrid`]s into parallel arrays per
//! PSF so downstream notebooks can consume the JSON without knowing this
//! crate's types. Labels are plain strings, axes are repeated per series,
//! and NaN-degraded conditions serialize as `null`.

use std::path::Path;

use serde::Serialize;

use crate::aggregate::Strategy;
use crate::error::Result;
use crate::labels::{Estimator, Psf, Sweep};
use crate::store::AggregateGrid;

/// Bumped when the JSON layout changes shape.
pub const REPORT_VERSION: u32 = 1;

/// Aggregated band for one PSF across the photon-count axis.
#[derive(Debug, Clone, Serialize)]
pub struct PsfSeries {
    /// PSF label.
    pub psf: String,
    /// Photon counts, ascending.
    pub photon_counts: Vec<u32>,
    /// Central estimate per photon count.
    pub center: Vec<f64>,
    /// Lower bound per photon count.
    pub lower: Vec<f64>,
    /// Upper bound per photon count.
    pub upper: Vec<f64>,
}

impl PsfSeries {
    /// Flattens one PSF row of an aggregate grid.
    pub fn from_grid(psf: Psf, grid: &AggregateGrid) -> Result<PsfSeries> {
        let bands = grid.band_row(psf)?;
        Ok(PsfSeries {
            psf: psf.to_string(),
            photon_counts: grid.photon_counts().to_vec(),
            center: bands.iter().map(|b| b.center).collect(),
            lower: bands.iter().map(|b| b.lower).collect(),
            upper: bands.iter().map(|b| b.upper).collect(),
        })
    }
}

/// MI bands for every PSF, for one estimator.
#[derive(Debug, Clone, Serialize)]
pub struct EstimatorSeries {
    /// Estimator label.
    pub estimator: String,
    /// One series per PSF, in sweep order.
    pub series: Vec<PsfSeries>,
}

/// Classifier accuracy bands for every PSF.
#[derive(Debug, Clone, Serialize)]
pub struct AccuracySection {
    /// Sensor bias the classifiers were trained against.
    pub bias: u32,
    /// Classifier architecture label.
    pub model: String,
    /// One series per PSF, in sweep order.
    pub series: Vec<PsfSeries>,
}

/// Complete aggregated sweep, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// Layout version, see [`REPORT_VERSION`].
    pub version: u32,
    /// Dataset the sweep was run on.
    pub dataset: String,
    /// Trials per condition.
    pub trials: usize,
    /// Human description of the aggregation recipe.
    pub strategy: String,
    /// Two-sided coverage of the bands.
    pub confidence_level: f64,
    /// MI sections, one per estimator analyzed.
    pub mi: Vec<EstimatorSeries>,
    /// Accuracy section, when classifier results were analyzed.
    pub accuracy: Option<AccuracySection>,
    /// Tool name and version that wrote the report.
    pub generated_by: String,
}

impl SweepReport {
    /// Empty report carrying the sweep and strategy metadata.
    pub fn new(sweep: &Sweep, strategy: &Strategy) -> SweepReport {
        SweepReport {
            version: REPORT_VERSION,
            dataset: sweep.dataset.clone(),
            trials: sweep.trials,
            strategy: strategy.describe(),
            confidence_level: strategy.confidence_level,
            mi: Vec::new(),
            accuracy: None,
            generated_by: format!("photoninfo {}", crate::VERSION),
        }
    }

    /// Appends the MI section for one estimator.
    pub fn push_mi(&mut self, estimator: Estimator, grid: &AggregateGrid) -> Result<()> {
        self.mi.push(EstimatorSeries {
            estimator: estimator.to_string(),
            series: all_series(grid)?,
        });
        Ok(())
    }

    /// Sets the classifier accuracy section.
    pub fn set_accuracy(&mut self, bias: u32, model: &str, grid: &AggregateGrid) -> Result<()> {
        self.accuracy = Some(AccuracySection {
            bias,
            model: model.to_string(),
            series: all_series(grid)?,
        });
        Ok(())
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::from)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn all_series(grid: &AggregateGrid) -> Result<Vec<PsfSeries>> {
    grid.psfs()
        .iter()
        .map(|&psf| PsfSeries::from_grid(psf, grid))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_band_serializes_as_null() {
        let series = PsfSeries {
            psf: "one".to_string(),
            photon_counts: vec![20],
            center: vec![f64::NAN],
            lower: vec![f64::NAN],
            upper: vec![f64::NAN],
        };
        let json = serde_json::to_string(&series).unwrap();
        assert!(json.contains("null"), "{json}");
        assert!(!json.contains("NaN"), "{json}");
    }

    #[test]
    fn test_report_metadata_fields() {
        let sweep = Sweep::standard("bsccm").unwrap();
        let report = SweepReport::new(&sweep, &Strategy::default());
        assert_eq!(report.version, REPORT_VERSION);
        assert_eq!(report.dataset, "bsccm");
        assert_eq!(report.trials, 10);
        assert!(report.strategy.contains("mean"));
        assert!(report.generated_by.starts_with("photoninfo "));
        assert!(report.mi.is_empty());
        assert!(report.accuracy.is_none());
    }
}
