//! Fixed label vocabularies for the imaging sweep.
//!
//! PSF names, photon counts, and estimator kinds form small closed sets
//! shared by every artifact on disk. A lookup outside these sets is an
//! error, never a silent default — the artifact naming scheme depends on
//! the exact spellings below.

use crate::error::{AnalysisError, Result};

/// Canonical photon-count sweep (mean photons per pixel), in display order.
pub const PHOTON_COUNTS: [u32; 9] = [20, 40, 60, 80, 100, 150, 200, 250, 300];

/// Trials each artifact is expected to carry in the standard sweep.
pub const DEFAULT_TRIALS: usize = 10;

/// Dataset identifier used by the upstream pipeline unless overridden.
pub const DEFAULT_DATASET: &str = "bsccm";

/// Imaging point-spread function (encoder design) under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Psf {
    /// Single-lens system.
    One,
    /// Four-lens array.
    Four,
    /// Random diffuser.
    Diffuser,
    /// Unconstrained learned encoder.
    Uc,
    /// Two-lens array.
    Two,
}

impl Psf {
    /// Every valid PSF label, in canonical display order.
    pub const ALL: [Psf; 5] = [Psf::One, Psf::Four, Psf::Diffuser, Psf::Uc, Psf::Two];

    /// The four encoders the standard sweep covers.
    pub const DEFAULT_SET: [Psf; 4] = [Psf::One, Psf::Four, Psf::Diffuser, Psf::Uc];

    /// Parse a PSF label as it appears in artifact file names.
    pub fn parse(s: &str) -> Result<Psf> {
        match s {
            "one" => Ok(Psf::One),
            "four" => Ok(Psf::Four),
            "diffuser" => Ok(Psf::Diffuser),
            "uc" => Ok(Psf::Uc),
            "two" => Ok(Psf::Two),
            _ => Err(AnalysisError::UnknownLabel {
                kind: "psf",
                value: s.to_string(),
            }),
        }
    }

    /// Human-readable name for figure legends.
    pub fn legend_label(&self) -> &'static str {
        match self {
            Psf::One => "one lens",
            Psf::Four => "four lenses",
            Psf::Diffuser => "diffuser",
            Psf::Uc => "unconstrained",
            Psf::Two => "two lenses",
        }
    }
}

impl std::fmt::Display for Psf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Psf::One => write!(f, "one"),
            Psf::Four => write!(f, "four"),
            Psf::Diffuser => write!(f, "diffuser"),
            Psf::Uc => write!(f, "uc"),
            Psf::Two => write!(f, "two"),
        }
    }
}

/// Upstream mutual-information estimator that produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Estimator {
    /// Stationary Gaussian process fit — fast, a lower bound in practice.
    Gaussian,
    /// Autoregressive PixelCNN fit — slower, tighter.
    PixelCnn,
}

impl Estimator {
    /// Both estimator labels, in display order.
    pub const ALL: [Estimator; 2] = [Estimator::Gaussian, Estimator::PixelCnn];

    /// Parse an estimator label as it appears in artifact file names.
    pub fn parse(s: &str) -> Result<Estimator> {
        match s {
            "gaussian" => Ok(Estimator::Gaussian),
            "pixelcnn" => Ok(Estimator::PixelCnn),
            _ => Err(AnalysisError::UnknownLabel {
                kind: "estimator",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Estimator::Gaussian => write!(f, "gaussian"),
            Estimator::PixelCnn => write!(f, "pixelcnn"),
        }
    }
}

/// Validate a photon count against the canonical sweep set.
pub fn check_photon_count(value: u32) -> Result<()> {
    if PHOTON_COUNTS.contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::UnknownPhotonCount { value })
    }
}

/// Validate an identifier that becomes part of an artifact path.
///
/// Restricted to lowercase alphanumerics and underscores so a stray
/// separator can never silently change the directory layout.
pub fn check_identifier(kind: &'static str, value: &str) -> Result<()> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(AnalysisError::UnknownLabel {
            kind,
            value: value.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// One analysis session's coverage: dataset, encoders, photon counts, trials.
///
/// Construction validates every label against the canonical sets and
/// normalizes both axes to canonical order, so a `Sweep` always indexes a
/// well-formed grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sweep {
    /// Dataset identifier (first path component of MI artifacts).
    pub dataset: String,
    /// Encoders covered, in canonical order.
    pub psfs: Vec<Psf>,
    /// Photon counts covered, ascending.
    pub photon_counts: Vec<u32>,
    /// Trials expected per artifact.
    pub trials: usize,
}

impl Sweep {
    /// Build a validated sweep.
    ///
    /// Rejects empty axes, duplicate labels, zero trials, and photon counts
    /// outside [`PHOTON_COUNTS`].
    pub fn new(
        dataset: &str,
        psfs: Vec<Psf>,
        photon_counts: Vec<u32>,
        trials: usize,
    ) -> Result<Sweep> {
        check_identifier("dataset", dataset)?;
        if psfs.is_empty() {
            return Err(AnalysisError::EmptyInput {
                what: "sweep psf set".to_string(),
            });
        }
        if photon_counts.is_empty() {
            return Err(AnalysisError::EmptyInput {
                what: "sweep photon counts".to_string(),
            });
        }
        if trials == 0 {
            return Err(AnalysisError::EmptyInput {
                what: "sweep trial count".to_string(),
            });
        }
        for &pc in &photon_counts {
            check_photon_count(pc)?;
        }

        let mut psfs = psfs;
        psfs.sort_by_key(|p| Psf::ALL.iter().position(|q| q == p));
        for pair in psfs.windows(2) {
            if pair[0] == pair[1] {
                return Err(AnalysisError::UnknownLabel {
                    kind: "psf",
                    value: format!("{} (duplicate)", pair[0]),
                });
            }
        }

        let mut photon_counts = photon_counts;
        photon_counts.sort_unstable();
        for pair in photon_counts.windows(2) {
            if pair[0] == pair[1] {
                return Err(AnalysisError::UnknownPhotonCount { value: pair[0] });
            }
        }

        Ok(Sweep {
            dataset: dataset.to_string(),
            psfs,
            photon_counts,
            trials,
        })
    }

    /// The standard sweep: four encoders, all nine photon counts, ten trials.
    pub fn standard(dataset: &str) -> Result<Sweep> {
        Sweep::new(
            dataset,
            Psf::DEFAULT_SET.to_vec(),
            PHOTON_COUNTS.to_vec(),
            DEFAULT_TRIALS,
        )
    }

    /// Cells in the (psf × photon count) grid.
    pub fn cell_count(&self) -> usize {
        self.psfs.len() * self.photon_counts.len()
    }
}

impl Default for Sweep {
    fn default() -> Self {
        Sweep {
            dataset: DEFAULT_DATASET.to_string(),
            psfs: Psf::DEFAULT_SET.to_vec(),
            photon_counts: PHOTON_COUNTS.to_vec(),
            trials: DEFAULT_TRIALS,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Label parsing tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_psf_parse_roundtrip() {
        for psf in Psf::ALL {
            assert_eq!(Psf::parse(&psf.to_string()).unwrap(), psf);
        }
    }

    #[test]
    fn test_psf_parse_unknown() {
        let err = Psf::parse("three").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UnknownLabel { kind: "psf", .. }
        ));
    }

    #[test]
    fn test_estimator_parse_roundtrip() {
        for est in Estimator::ALL {
            assert_eq!(Estimator::parse(&est.to_string()).unwrap(), est);
        }
    }

    #[test]
    fn test_estimator_parse_unknown() {
        assert!(Estimator::parse("oracle").is_err());
    }

    #[test]
    fn test_check_photon_count() {
        assert!(check_photon_count(100).is_ok());
        let err = check_photon_count(50).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UnknownPhotonCount { value: 50 }
        ));
    }

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("dataset", "bsccm").is_ok());
        assert!(check_identifier("dataset", "mnist_2").is_ok());
        assert!(check_identifier("dataset", "").is_err());
        assert!(check_identifier("dataset", "My/Data").is_err());
        assert!(check_identifier("model", "CNN").is_err());
    }

    // -----------------------------------------------------------------------
    // Sweep tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_sweep_standard_shape() {
        let sweep = Sweep::standard("bsccm").unwrap();
        assert_eq!(sweep.psfs.len(), 4);
        assert_eq!(sweep.photon_counts.len(), 9);
        assert_eq!(sweep.trials, 10);
        assert_eq!(sweep.cell_count(), 36);
    }

    #[test]
    fn test_sweep_normalizes_order() {
        let sweep = Sweep::new(
            "bsccm",
            vec![Psf::Uc, Psf::One],
            vec![300, 20, 100],
            5,
        )
        .unwrap();
        assert_eq!(sweep.psfs, vec![Psf::One, Psf::Uc]);
        assert_eq!(sweep.photon_counts, vec![20, 100, 300]);
    }

    #[test]
    fn test_sweep_rejects_bad_photon_count() {
        let err = Sweep::new("bsccm", vec![Psf::One], vec![55], 5).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownPhotonCount { value: 55 }));
    }

    #[test]
    fn test_sweep_rejects_duplicates() {
        assert!(Sweep::new("bsccm", vec![Psf::One, Psf::One], vec![20], 5).is_err());
        assert!(Sweep::new("bsccm", vec![Psf::One], vec![20, 20], 5).is_err());
    }

    #[test]
    fn test_sweep_rejects_empty_axes() {
        assert!(Sweep::new("bsccm", vec![], vec![20], 5).is_err());
        assert!(Sweep::new("bsccm", vec![Psf::One], vec![], 5).is_err());
        assert!(Sweep::new("bsccm", vec![Psf::One], vec![20], 0).is_err());
    }

    #[test]
    fn test_sweep_rejects_bad_dataset() {
        assert!(Sweep::new("../etc", vec![Psf::One], vec![20], 5).is_err());
    }
}
