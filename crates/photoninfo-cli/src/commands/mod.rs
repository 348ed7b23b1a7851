pub mod analyze;
pub mod figures;
pub mod scan;

use photoninfo_core::{
    AnalysisError, Estimator, IntervalMethod, PHOTON_COUNTS, PointEstimate, Psf, Result, Strategy,
    Sweep, check_photon_count,
};

/// Parse a `--psfs` filter: comma-separated labels, or "all" for every
/// encoder. No filter means the standard four-PSF comparison set.
pub fn parse_psfs(filter: Option<&str>) -> Result<Vec<Psf>> {
    match filter {
        None => Ok(Psf::DEFAULT_SET.to_vec()),
        Some("all") => Ok(Psf::ALL.to_vec()),
        Some(list) => list.split(',').map(|s| Psf::parse(s.trim())).collect(),
    }
}

/// Parse a `--photons` filter: comma-separated counts, or "all"/no filter
/// for the full sweep axis. Counts outside the sweep set are rejected.
pub fn parse_photon_counts(filter: Option<&str>) -> Result<Vec<u32>> {
    match filter {
        None | Some("all") => Ok(PHOTON_COUNTS.to_vec()),
        Some(list) => list
            .split(',')
            .map(|s| {
                let s = s.trim();
                let value: u32 = s.parse().map_err(|_| AnalysisError::UnknownLabel {
                    kind: "photon count",
                    value: s.to_string(),
                })?;
                check_photon_count(value)?;
                Ok(value)
            })
            .collect(),
    }
}

/// Parse an `--estimators` filter the same way; no filter means both.
pub fn parse_estimators(filter: Option<&str>) -> Result<Vec<Estimator>> {
    match filter {
        None | Some("all") => Ok(Estimator::ALL.to_vec()),
        Some(list) => list.split(',').map(|s| Estimator::parse(s.trim())).collect(),
    }
}

/// Build the validated sweep every command iterates over.
pub fn build_sweep(
    dataset: &str,
    psf_filter: Option<&str>,
    photon_filter: Option<&str>,
    trials: usize,
) -> Result<Sweep> {
    Sweep::new(
        dataset,
        parse_psfs(psf_filter)?,
        parse_photon_counts(photon_filter)?,
        trials,
    )
}

/// Assemble an aggregation strategy from CLI flags. Unknown names fall
/// back to the defaults with a warning rather than aborting.
pub fn build_strategy(
    point: &str,
    interval: &str,
    confidence: f64,
    clip_ratio: f64,
    no_clip: bool,
) -> Strategy {
    let point = match point {
        "mean" => PointEstimate::Mean,
        "min" | "minimum" => PointEstimate::Minimum,
        other => {
            eprintln!("Unknown point estimate '{other}', using mean");
            PointEstimate::Mean
        }
    };
    let interval = match interval {
        "percentile" => IntervalMethod::Percentile,
        "parametric" | "t" => IntervalMethod::Parametric,
        "none" => IntervalMethod::None,
        other => {
            eprintln!("Unknown interval method '{other}', using percentile");
            IntervalMethod::Percentile
        }
    };
    Strategy {
        point,
        interval,
        confidence_level: confidence,
        clip_ratio: if no_clip { None } else { Some(clip_ratio) },
    }
}
