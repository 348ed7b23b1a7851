//! Artifact lookup over a results directory.
//!
//! [`ResultStore`] maps [`ArtifactKey`]s to files under a single root and
//! loads them into memory. Artifacts are read once per call and held by
//! the caller; there is no cache and no retry, since every file is a
//! static output of the upstream pipeline.
//!
//! [`load_grid`](ResultStore::load_grid) assembles a full sweep into a
//! [`TrialGrid`] indexed `[psf][photon_count][trial]`, aborting on the
//! first missing or malformed artifact so a gap in the pipeline output
//! never produces a partially-filled analysis.

use std::path::{Path, PathBuf};

use crate::aggregate::{self, ConfidenceBand, Strategy};
use crate::error::{AnalysisError, Result};
use crate::key::{ArtifactKey, ArtifactKind};
use crate::labels::{Psf, Sweep};
use crate::npy::{self, NpyError};

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Read-only view of a results directory.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    /// Store rooted at `root`. The directory is probed lazily, per load.
    pub fn open(root: impl Into<PathBuf>) -> ResultStore {
        ResultStore { root: root.into() }
    }

    /// The results root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path an artifact key resolves to.
    pub fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// True when the artifact file for `key` exists.
    pub fn exists(&self, key: &ArtifactKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Loads the 1-D trial array behind `key`.
    pub fn load(&self, key: &ArtifactKey) -> Result<Vec<f64>> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(AnalysisError::ArtifactNotFound { path });
        }
        let arr = npy::read_file(&path).map_err(|e| match e {
            NpyError::Io(io) => AnalysisError::Io(io),
            other => AnalysisError::ArtifactFormat {
                path: path.clone(),
                reason: other.to_string(),
            },
        })?;
        if arr.ndim() != 1 {
            return Err(AnalysisError::ArtifactFormat {
                path,
                reason: format!("expected a 1-D trial array, got shape {:?}", arr.shape),
            });
        }
        log::debug!("loaded {} trials from {}", arr.len(), path.display());
        Ok(arr.data)
    }

    /// Loads `key` and checks the payload holds exactly `num_trials` values.
    pub fn load_expecting(&self, key: &ArtifactKey, num_trials: usize) -> Result<Vec<f64>> {
        let values = self.load(key)?;
        if values.len() != num_trials {
            return Err(AnalysisError::ArtifactFormat {
                path: self.path_for(key),
                reason: format!("expected {num_trials} trials, found {}", values.len()),
            });
        }
        Ok(values)
    }

    /// Loads one artifact per sweep cell into a [`TrialGrid`].
    ///
    /// Cells follow the sweep's axis order exactly. The first missing or
    /// malformed artifact aborts the whole load.
    pub fn load_grid(&self, sweep: &Sweep, kind: &ArtifactKind) -> Result<TrialGrid> {
        let mut cells = Vec::with_capacity(sweep.psfs.len());
        for &psf in &sweep.psfs {
            let mut row = Vec::with_capacity(sweep.photon_counts.len());
            for &photon_count in &sweep.photon_counts {
                let key =
                    ArtifactKey::with_kind(&sweep.dataset, kind.clone(), photon_count, psf)?;
                row.push(self.load_expecting(&key, sweep.trials)?);
            }
            cells.push(row);
        }
        Ok(TrialGrid {
            psfs: sweep.psfs.clone(),
            photon_counts: sweep.photon_counts.clone(),
            trials: sweep.trials,
            cells,
        })
    }
}

// ---------------------------------------------------------------------------
// Grids
// ---------------------------------------------------------------------------

/// Per-trial values for every sweep cell, indexed `[psf][photon][trial]`.
///
/// Axis vectors and cells stay parallel by construction; lookups go
/// through the label-based accessors.
#[derive(Debug, Clone)]
pub struct TrialGrid {
    psfs: Vec<Psf>,
    photon_counts: Vec<u32>,
    trials: usize,
    cells: Vec<Vec<Vec<f64>>>,
}

impl TrialGrid {
    /// PSFs on the first axis, in sweep order.
    pub fn psfs(&self) -> &[Psf] {
        &self.psfs
    }

    /// Photon counts on the second axis, ascending.
    pub fn photon_counts(&self) -> &[u32] {
        &self.photon_counts
    }

    /// Trials per cell.
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Trial values for one `(psf, photon_count)` cell.
    pub fn cell(&self, psf: Psf, photon_count: u32) -> Result<&[f64]> {
        let p = self.psf_index(psf)?;
        let c = self
            .photon_counts
            .iter()
            .position(|&pc| pc == photon_count)
            .ok_or(AnalysisError::UnknownPhotonCount {
                value: photon_count,
            })?;
        Ok(&self.cells[p][c])
    }

    /// All conditions for one PSF, ordered by photon count.
    pub fn row(&self, psf: Psf) -> Result<&[Vec<f64>]> {
        Ok(&self.cells[self.psf_index(psf)?])
    }

    /// Aggregates every PSF row with `strategy` into per-condition bands.
    pub fn aggregate(&self, strategy: &Strategy) -> Result<AggregateGrid> {
        let mut bands = Vec::with_capacity(self.psfs.len());
        for row in &self.cells {
            bands.push(aggregate::aggregate(row, self.trials, strategy)?);
        }
        Ok(AggregateGrid {
            psfs: self.psfs.clone(),
            photon_counts: self.photon_counts.clone(),
            bands,
        })
    }

    fn psf_index(&self, psf: Psf) -> Result<usize> {
        self.psfs
            .iter()
            .position(|&p| p == psf)
            .ok_or(AnalysisError::UnknownLabel {
                kind: "psf",
                value: psf.to_string(),
            })
    }
}

/// Aggregated bands for every sweep cell, indexed `[psf][photon]`.
#[derive(Debug, Clone)]
pub struct AggregateGrid {
    psfs: Vec<Psf>,
    photon_counts: Vec<u32>,
    bands: Vec<Vec<ConfidenceBand>>,
}

impl AggregateGrid {
    /// PSFs on the first axis, in sweep order.
    pub fn psfs(&self) -> &[Psf] {
        &self.psfs
    }

    /// Photon counts on the second axis, ascending.
    pub fn photon_counts(&self) -> &[u32] {
        &self.photon_counts
    }

    /// Bands for one PSF, ordered by photon count.
    pub fn band_row(&self, psf: Psf) -> Result<&[ConfidenceBand]> {
        let p = self
            .psfs
            .iter()
            .position(|&q| q == psf)
            .ok_or(AnalysisError::UnknownLabel {
                kind: "psf",
                value: psf.to_string(),
            })?;
        Ok(&self.bands[p])
    }

    /// Band for one `(psf, photon_count)` cell.
    pub fn band(&self, psf: Psf, photon_count: u32) -> Result<ConfidenceBand> {
        let row = self.band_row(psf)?;
        let c = self
            .photon_counts
            .iter()
            .position(|&pc| pc == photon_count)
            .ok_or(AnalysisError::UnknownPhotonCount {
                value: photon_count,
            })?;
        Ok(row[c])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::Estimator;

    fn write_artifact(root: &Path, key: &ArtifactKey, values: &[f64]) {
        let path = root.join(key.relative_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        npy::write_file(&path, values).unwrap();
    }

    fn mi_key(photon_count: u32, psf: Psf) -> ArtifactKey {
        ArtifactKey::mi("bsccm", Estimator::Gaussian, photon_count, psf).unwrap()
    }

    // -----------------------------------------------------------------------
    // Single-artifact tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_write_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path());
        let key = mi_key(100, Psf::Diffuser);
        let values = [2.01, 1.98, 2.15];
        write_artifact(dir.path(), &key, &values);
        assert!(store.exists(&key));
        assert_eq!(store.load(&key).unwrap(), values.to_vec());
    }

    #[test]
    fn test_missing_artifact_reports_probed_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path());
        let key = mi_key(20, Psf::One);
        match store.load(&key) {
            Err(AnalysisError::ArtifactNotFound { path }) => {
                assert_eq!(path, store.path_for(&key));
            }
            other => panic!("expected ArtifactNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_payload_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path());
        let key = mi_key(40, Psf::Four);
        let path = store.path_for(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"definitely not npy").unwrap();
        assert!(matches!(
            store.load(&key),
            Err(AnalysisError::ArtifactFormat { .. })
        ));
    }

    #[test]
    fn test_matrix_payload_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path());
        let key = mi_key(60, Psf::Uc);
        let path = store.path_for(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let dict = "{'descr': '<f8', 'fortran_order': False, 'shape': (2, 2), }\n";
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"\x93NUMPY\x01\x00");
        bytes.extend_from_slice(&(dict.len() as u16).to_le_bytes());
        bytes.extend_from_slice(dict.as_bytes());
        for v in [1.0f64, 2.0, 3.0, 4.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        std::fs::write(&path, bytes).unwrap();
        match store.load(&key) {
            Err(AnalysisError::ArtifactFormat { reason, .. }) => {
                assert!(reason.contains("1-D"), "{reason}");
            }
            other => panic!("expected ArtifactFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_overflowing_header_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path());
        let key = mi_key(100, Psf::Two);
        let path = store.path_for(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let dict =
            "{'descr': '<f8', 'fortran_order': False, 'shape': (18446744073709551615,), }\n";
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"\x93NUMPY\x01\x00");
        bytes.extend_from_slice(&(dict.len() as u16).to_le_bytes());
        bytes.extend_from_slice(dict.as_bytes());
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();
        assert!(matches!(
            store.load(&key),
            Err(AnalysisError::ArtifactFormat { .. })
        ));
    }

    #[test]
    fn test_load_expecting_enforces_trial_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path());
        let key = mi_key(80, Psf::One);
        write_artifact(dir.path(), &key, &[1.0, 2.0, 3.0]);
        assert!(store.load_expecting(&key, 3).is_ok());
        match store.load_expecting(&key, 10) {
            Err(AnalysisError::ArtifactFormat { reason, .. }) => {
                assert!(reason.contains("expected 10"), "{reason}");
                assert!(reason.contains("found 3"), "{reason}");
            }
            other => panic!("expected ArtifactFormat, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Grid tests
    // -----------------------------------------------------------------------

    fn small_sweep() -> Sweep {
        Sweep::new("bsccm", vec![Psf::One, Psf::Diffuser], vec![20, 100], 3).unwrap()
    }

    fn populate(root: &Path, sweep: &Sweep) {
        for (p, &psf) in sweep.psfs.iter().enumerate() {
            for (c, &pc) in sweep.photon_counts.iter().enumerate() {
                let base = (p * 10 + c) as f64;
                write_artifact(
                    root,
                    &mi_key(pc, psf),
                    &[base, base + 0.1, base + 0.2],
                );
            }
        }
    }

    #[test]
    fn test_load_grid_follows_sweep_order() {
        let dir = tempfile::tempdir().unwrap();
        let sweep = small_sweep();
        populate(dir.path(), &sweep);
        let store = ResultStore::open(dir.path());
        let kind = ArtifactKind::MutualInformation {
            estimator: Estimator::Gaussian,
        };
        let grid = store.load_grid(&sweep, &kind).unwrap();
        assert_eq!(grid.psfs(), &[Psf::One, Psf::Diffuser]);
        assert_eq!(grid.photon_counts(), &[20, 100]);
        assert_eq!(grid.cell(Psf::One, 20).unwrap()[0], 0.0);
        assert_eq!(grid.cell(Psf::One, 100).unwrap()[0], 1.0);
        assert_eq!(grid.cell(Psf::Diffuser, 20).unwrap()[0], 10.0);
        assert_eq!(grid.row(Psf::Diffuser).unwrap().len(), 2);
    }

    #[test]
    fn test_load_grid_aborts_on_first_gap() {
        let dir = tempfile::tempdir().unwrap();
        let sweep = small_sweep();
        populate(dir.path(), &sweep);
        let store = ResultStore::open(dir.path());
        let missing = mi_key(100, Psf::Diffuser);
        std::fs::remove_file(store.path_for(&missing)).unwrap();
        let kind = ArtifactKind::MutualInformation {
            estimator: Estimator::Gaussian,
        };
        match store.load_grid(&sweep, &kind) {
            Err(AnalysisError::ArtifactNotFound { path }) => {
                assert_eq!(path, store.path_for(&missing));
            }
            other => panic!("expected ArtifactNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_grid_rejects_labels_outside_axes() {
        let dir = tempfile::tempdir().unwrap();
        let sweep = small_sweep();
        populate(dir.path(), &sweep);
        let store = ResultStore::open(dir.path());
        let kind = ArtifactKind::MutualInformation {
            estimator: Estimator::Gaussian,
        };
        let grid = store.load_grid(&sweep, &kind).unwrap();
        assert!(matches!(
            grid.cell(Psf::Two, 20),
            Err(AnalysisError::UnknownLabel { .. })
        ));
        assert!(matches!(
            grid.cell(Psf::One, 60),
            Err(AnalysisError::UnknownPhotonCount { .. })
        ));
    }

    #[test]
    fn test_grid_aggregate_keeps_axes() {
        let dir = tempfile::tempdir().unwrap();
        let sweep = small_sweep();
        populate(dir.path(), &sweep);
        let store = ResultStore::open(dir.path());
        let kind = ArtifactKind::MutualInformation {
            estimator: Estimator::Gaussian,
        };
        let grid = store.load_grid(&sweep, &kind).unwrap();
        let agg = grid.aggregate(&Strategy::default()).unwrap();
        assert_eq!(agg.psfs(), grid.psfs());
        assert_eq!(agg.photon_counts(), grid.photon_counts());
        let band = agg.band(Psf::Diffuser, 100).unwrap();
        assert!((band.center - 11.1).abs() < 1e-9);
        assert!(band.lower <= band.center && band.center <= band.upper);
    }
}
