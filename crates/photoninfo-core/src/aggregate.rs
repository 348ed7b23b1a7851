//! Robust aggregation of repeated-trial measurements.
//!
//! Every analysis reduces to the same problem: a handful of noisy trial
//! scalars per experimental condition that must become one point estimate
//! and an uncertainty band. MI estimators occasionally diverge to
//! implausibly large values, so the estimates here are deliberately
//! conservative.
//!
//! Two point estimates and two interval methods are available:
//!
//! - **Mean** with optional outlier clipping toward the per-condition
//!   minimum before averaging.
//! - **Minimum** over trials, which needs no clipping at all.
//! - **Percentile** bounds straight from the empirical trial distribution.
//! - **Parametric** bounds from a Student-t interval on the mean.
//!
//! All functions are pure: conditions in, sequences out, no hidden state.
//! NaN trials degrade their condition to a NaN aggregate (with a logged
//! warning) instead of failing the whole sweep.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Central estimate computed for each condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointEstimate {
    /// Arithmetic mean across trials.
    Mean,
    /// Minimum across trials. More conservative, and immune to
    /// diverging runs without any clipping.
    Minimum,
}

/// How the uncertainty band around the point estimate is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalMethod {
    /// Empirical percentiles of the trial values.
    Percentile,
    /// Student-t interval on the mean.
    Parametric,
    /// No band; bounds collapse to the point estimate.
    None,
}

/// Full aggregation recipe applied uniformly across a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strategy {
    /// Central estimate per condition.
    pub point: PointEstimate,
    /// Band construction. Ignored when `point` is [`PointEstimate::Minimum`],
    /// which always collapses the band.
    pub interval: IntervalMethod,
    /// Two-sided coverage in (0, 1), e.g. `0.9` for a 5th–95th band.
    pub confidence_level: f64,
    /// When set, trials above `ratio * min` are clipped to the condition
    /// minimum before aggregation.
    pub clip_ratio: Option<f64>,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy {
            point: PointEstimate::Mean,
            interval: IntervalMethod::Percentile,
            confidence_level: 0.9,
            clip_ratio: Some(2.0),
        }
    }
}

impl Strategy {
    /// One-line human description, used in reports and console output.
    pub fn describe(&self) -> String {
        let point = match self.point {
            PointEstimate::Mean => "mean",
            PointEstimate::Minimum => "minimum",
        };
        let interval = match (self.point, self.interval) {
            (PointEstimate::Minimum, _) | (_, IntervalMethod::None) => "no interval".to_string(),
            (_, IntervalMethod::Percentile) => {
                format!("{:.0}% percentile interval", self.confidence_level * 100.0)
            }
            (_, IntervalMethod::Parametric) => {
                format!("{:.0}% t-interval", self.confidence_level * 100.0)
            }
        };
        match self.clip_ratio {
            Some(ratio) => format!("{point}, {interval}, outliers clipped above {ratio}x min"),
            None => format!("{point}, {interval}, no clipping"),
        }
    }
}

/// Point estimate with its uncertainty bounds for one condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBand {
    /// Lower bound of the band.
    pub lower: f64,
    /// Central estimate.
    pub center: f64,
    /// Upper bound of the band.
    pub upper: f64,
}

impl ConfidenceBand {
    /// Band with both bounds collapsed onto the point estimate.
    pub fn degenerate(value: f64) -> ConfidenceBand {
        ConfidenceBand {
            lower: value,
            center: value,
            upper: value,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation functions
// ---------------------------------------------------------------------------

/// Clips diverged trials toward the condition minimum.
///
/// If `max(values) / min(values)` exceeds `ratio_threshold`, every value
/// above `ratio_threshold * min(values)` is replaced with the minimum.
/// Clipping is skipped entirely when `min(values) <= 0`, where the ratio
/// test is meaningless.
pub fn outlier_clip(values: &[f64], ratio_threshold: f64) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput {
            what: "trial values for outlier clipping".to_string(),
        });
    }
    if !(ratio_threshold > 1.0) {
        return Err(AnalysisError::InvalidThreshold {
            value: ratio_threshold,
        });
    }
    if values.iter().all(|v| v.is_nan()) {
        log::warn!("all trial values are NaN; outlier clip skipped");
        return Ok(values.to_vec());
    }
    // f64::min / f64::max skip NaN operands, so these are the finite extremes
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min <= 0.0 || max / min <= ratio_threshold {
        return Ok(values.to_vec());
    }
    let cutoff = ratio_threshold * min;
    Ok(values
        .iter()
        .map(|&v| if v > cutoff { min } else { v })
        .collect())
}

/// Mean-centered percentile band for each condition.
///
/// Each condition contributes its first `num_trials` values. The center is
/// the arithmetic mean; the bounds are the
/// `100 - 100*(1+confidence_level)/2` and `100*(1+confidence_level)/2`
/// percentiles of the trial values, so `confidence_level = 0.9` yields a
/// 5th–95th band. A single-trial condition collapses onto its value.
pub fn confidence_interval(
    values_per_condition: &[Vec<f64>],
    num_trials: usize,
    confidence_level: f64,
) -> Result<Vec<ConfidenceBand>> {
    check_confidence(confidence_level)?;
    let lo_pct = 100.0 - 100.0 * (1.0 + confidence_level) / 2.0;
    let hi_pct = 100.0 * (1.0 + confidence_level) / 2.0;
    each_condition(values_per_condition, num_trials, |trials| {
        Ok(ConfidenceBand {
            lower: percentile(trials, lo_pct)?,
            center: mean(trials),
            upper: percentile(trials, hi_pct)?,
        })
    })
}

/// Student-t band on the mean for each condition.
///
/// Assumes roughly normal trial noise; with the handful of seeds typical
/// here the t-quantile keeps the band honest at small `n`. Single-trial
/// conditions collapse onto their value.
pub fn parametric_interval(
    values_per_condition: &[Vec<f64>],
    num_trials: usize,
    confidence_level: f64,
) -> Result<Vec<ConfidenceBand>> {
    check_confidence(confidence_level)?;
    each_condition(values_per_condition, num_trials, |trials| {
        let center = mean(trials);
        if trials.len() < 2 {
            return Ok(ConfidenceBand::degenerate(center));
        }
        let std_err = sample_std(trials, center) / (trials.len() as f64).sqrt();
        // dof >= 1 past the single-trial return above
        let dist = StudentsT::new(0.0, 1.0, (trials.len() - 1) as f64).unwrap();
        let half = dist.inverse_cdf(0.5 + confidence_level / 2.0) * std_err;
        Ok(ConfidenceBand {
            lower: center - half,
            center,
            upper: center + half,
        })
    })
}

/// Minimum across trials for each condition.
pub fn minimum_aggregate(values_per_condition: &[Vec<f64>]) -> Result<Vec<f64>> {
    let bands = each_condition(values_per_condition, usize::MAX, |trials| {
        Ok(ConfidenceBand::degenerate(
            trials.iter().copied().fold(f64::INFINITY, f64::min),
        ))
    })?;
    Ok(bands.into_iter().map(|b| b.center).collect())
}

/// Mean across trials for each condition.
pub fn mean_aggregate(values_per_condition: &[Vec<f64>]) -> Result<Vec<f64>> {
    let bands = each_condition(values_per_condition, usize::MAX, |trials| {
        Ok(ConfidenceBand::degenerate(mean(trials)))
    })?;
    Ok(bands.into_iter().map(|b| b.center).collect())
}

/// Applies a full [`Strategy`] to a sweep of conditions.
///
/// Clipping (when configured) runs first on each condition's first
/// `num_trials` values, then the point estimate and band are computed
/// from the cleaned trials.
pub fn aggregate(
    values_per_condition: &[Vec<f64>],
    num_trials: usize,
    strategy: &Strategy,
) -> Result<Vec<ConfidenceBand>> {
    if values_per_condition.is_empty() {
        return Err(AnalysisError::EmptyInput {
            what: "conditions".to_string(),
        });
    }
    let cleaned: Vec<Vec<f64>> = match strategy.clip_ratio {
        Some(ratio) => values_per_condition
            .iter()
            .map(|v| outlier_clip(truncated(v, num_trials), ratio))
            .collect::<Result<_>>()?,
        None => values_per_condition
            .iter()
            .map(|v| truncated(v, num_trials).to_vec())
            .collect(),
    };
    match strategy.point {
        PointEstimate::Minimum => Ok(minimum_aggregate(&cleaned)?
            .into_iter()
            .map(ConfidenceBand::degenerate)
            .collect()),
        PointEstimate::Mean => match strategy.interval {
            IntervalMethod::Percentile => {
                confidence_interval(&cleaned, num_trials, strategy.confidence_level)
            }
            IntervalMethod::Parametric => {
                parametric_interval(&cleaned, num_trials, strategy.confidence_level)
            }
            IntervalMethod::None => Ok(mean_aggregate(&cleaned)?
                .into_iter()
                .map(ConfidenceBand::degenerate)
                .collect()),
        },
    }
}

/// Linearly-interpolated percentile of `values`, NumPy-compatible.
///
/// `pct` is clamped to `[0, 100]`. Any NaN in the input yields NaN.
pub fn percentile(values: &[f64], pct: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput {
            what: "percentile input".to_string(),
        });
    }
    if values.iter().any(|v| v.is_nan()) {
        return Ok(f64::NAN);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = pct.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_confidence(confidence_level: f64) -> Result<()> {
    if confidence_level > 0.0 && confidence_level < 1.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfidence {
            value: confidence_level,
        })
    }
}

fn truncated(values: &[f64], num_trials: usize) -> &[f64] {
    &values[..values.len().min(num_trials)]
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    let ssq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (ssq / (values.len() - 1) as f64).sqrt()
}

/// Runs `f` over each condition's first `num_trials` values, warning once
/// per NaN-degraded condition.
fn each_condition<F>(
    values_per_condition: &[Vec<f64>],
    num_trials: usize,
    mut f: F,
) -> Result<Vec<ConfidenceBand>>
where
    F: FnMut(&[f64]) -> Result<ConfidenceBand>,
{
    if values_per_condition.is_empty() {
        return Err(AnalysisError::EmptyInput {
            what: "conditions".to_string(),
        });
    }
    let mut bands = Vec::with_capacity(values_per_condition.len());
    for (idx, values) in values_per_condition.iter().enumerate() {
        let trials = truncated(values, num_trials);
        if trials.is_empty() {
            return Err(AnalysisError::EmptyInput {
                what: format!("trial values for condition {idx}"),
            });
        }
        if trials.iter().any(|v| v.is_nan()) {
            log::warn!("condition {idx} contains NaN trials; aggregate degraded to NaN");
            bands.push(ConfidenceBand::degenerate(f64::NAN));
            continue;
        }
        bands.push(f(trials)?);
    }
    Ok(bands)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
