//! Typed artifact keys and the on-disk naming scheme.
//!
//! Every result artifact lives under a conventional path produced by the
//! upstream pipeline. One formatting function owns that scheme end to end,
//! so a key can never drift from the path it names.
//!
//! # Layout
//!
//! Relative to the results root:
//!
//! - MI estimates:
//!   `<dataset>_mi_estimates/<estimator>_mi_estimate_<photons>_photon_count_<psf>_psf.npy`
//! - Classifier accuracies:
//!   `classifier_results/<dataset>_test_accuracy_<photons>_mean_photon_count_<psf>_psf_<bias>_bias_<model>_model.npy`
//!
//! Each file holds a flat array of per-trial scalars.

use std::path::PathBuf;

use crate::error::Result;
use crate::labels::{Estimator, Psf, check_identifier, check_photon_count};

/// Which result family an artifact belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Mutual-information estimate in bits/pixel, from one estimator.
    MutualInformation {
        /// Estimator that produced the values.
        estimator: Estimator,
    },
    /// Classifier test accuracy in [0, 1].
    TestAccuracy {
        /// Sensor bias offset added before classification.
        bias: u32,
        /// Classifier architecture identifier (e.g. `"cnn"`).
        model: String,
    },
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::MutualInformation { estimator } => {
                write!(f, "mi ({estimator})")
            }
            ArtifactKind::TestAccuracy { bias, model } => {
                write!(f, "accuracy (bias {bias}, model {model})")
            }
        }
    }
}

/// Fully-qualified key for one on-disk result artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    /// Dataset identifier.
    pub dataset: String,
    /// Result family plus its family-specific labels.
    pub kind: ArtifactKind,
    /// Mean photon count of the condition.
    pub photon_count: u32,
    /// Encoder the condition was imaged through.
    pub psf: Psf,
}

impl ArtifactKey {
    /// Key for an MI estimate artifact. Fails if any label falls outside
    /// the sweep vocabularies.
    pub fn mi(
        dataset: &str,
        estimator: Estimator,
        photon_count: u32,
        psf: Psf,
    ) -> Result<ArtifactKey> {
        ArtifactKey::with_kind(
            dataset,
            ArtifactKind::MutualInformation { estimator },
            photon_count,
            psf,
        )
    }

    /// Key for a classifier accuracy artifact.
    pub fn accuracy(
        dataset: &str,
        photon_count: u32,
        psf: Psf,
        bias: u32,
        model: &str,
    ) -> Result<ArtifactKey> {
        ArtifactKey::with_kind(
            dataset,
            ArtifactKind::TestAccuracy {
                bias,
                model: model.to_string(),
            },
            photon_count,
            psf,
        )
    }

    /// Generic validated constructor shared by the family helpers.
    pub fn with_kind(
        dataset: &str,
        kind: ArtifactKind,
        photon_count: u32,
        psf: Psf,
    ) -> Result<ArtifactKey> {
        check_identifier("dataset", dataset)?;
        check_photon_count(photon_count)?;
        if let ArtifactKind::TestAccuracy { model, .. } = &kind {
            check_identifier("model", model)?;
        }
        Ok(ArtifactKey {
            dataset: dataset.to_string(),
            kind,
            photon_count,
            psf,
        })
    }

    /// The artifact's path relative to a results root.
    ///
    /// This is the only place the naming scheme is spelled out; it must
    /// match the upstream pipeline byte for byte.
    pub fn relative_path(&self) -> PathBuf {
        match &self.kind {
            ArtifactKind::MutualInformation { estimator } => {
                PathBuf::from(format!("{}_mi_estimates", self.dataset)).join(format!(
                    "{}_mi_estimate_{}_photon_count_{}_psf.npy",
                    estimator, self.photon_count, self.psf
                ))
            }
            ArtifactKind::TestAccuracy { bias, model } => {
                PathBuf::from("classifier_results").join(format!(
                    "{}_test_accuracy_{}_mean_photon_count_{}_psf_{}_bias_{}_model.npy",
                    self.dataset, self.photon_count, self.psf, bias, model
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
