//! `photoninfo figures` — render the comparison figures for a sweep.
//!
//! Every figure is written twice: a PNG for looking at, and a CSV with the
//! same numbers for replotting elsewhere.

use std::error::Error;
use std::fs;
use std::path::Path;

use photoninfo_core::{AggregateGrid, ArtifactKind, Psf, ResultStore};

use crate::figures::charts;

pub struct FiguresCommandConfig<'a> {
    pub root: &'a str,
    pub dataset: &'a str,
    pub psf_filter: Option<&'a str>,
    pub photon_filter: Option<&'a str>,
    pub trials: usize,
    pub estimator_filter: Option<&'a str>,
    pub include_accuracy: bool,
    pub bias: u32,
    pub model: &'a str,
    pub point: &'a str,
    pub interval: &'a str,
    pub confidence: f64,
    pub clip_ratio: f64,
    pub no_clip: bool,
    pub out_dir: &'a str,
    pub figure: &'a str,
    pub focus_photons: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FigureSet {
    All,
    Mi,
    Accuracy,
    Tradeoff,
    Bars,
    Spread,
}

impl FigureSet {
    fn parse(s: &str) -> Self {
        match s {
            "all" => Self::All,
            "mi" => Self::Mi,
            "accuracy" => Self::Accuracy,
            "tradeoff" => Self::Tradeoff,
            "bars" => Self::Bars,
            "spread" => Self::Spread,
            other => {
                eprintln!("Unknown figure set '{other}', rendering all");
                Self::All
            }
        }
    }

    fn wants(self, which: FigureSet) -> bool {
        self == FigureSet::All || self == which
    }
}

pub fn run(cfg: FiguresCommandConfig<'_>) {
    if let Err(e) = execute(cfg) {
        eprintln!("Figure rendering failed: {e}");
        std::process::exit(1);
    }
}

fn execute(cfg: FiguresCommandConfig<'_>) -> Result<(), Box<dyn Error>> {
    let sweep = super::build_sweep(cfg.dataset, cfg.psf_filter, cfg.photon_filter, cfg.trials)?;
    let estimators = super::parse_estimators(cfg.estimator_filter)?;
    let strategy = super::build_strategy(
        cfg.point,
        cfg.interval,
        cfg.confidence,
        cfg.clip_ratio,
        cfg.no_clip,
    );
    let set = FigureSet::parse(cfg.figure);

    if matches!(set, FigureSet::Tradeoff | FigureSet::Accuracy) && !cfg.include_accuracy {
        return Err(format!(
            "the {} figure needs classifier accuracy; drop --no-accuracy",
            cfg.figure
        )
        .into());
    }
    if (set.wants(FigureSet::Bars) || set.wants(FigureSet::Spread))
        && !sweep.photon_counts.contains(&cfg.focus_photons)
    {
        return Err(format!(
            "--focus-photons {} is not on the sweep photon axis",
            cfg.focus_photons
        )
        .into());
    }

    fs::create_dir_all(cfg.out_dir)?;
    let out_dir = Path::new(cfg.out_dir);
    let store = ResultStore::open(cfg.root);

    println!("Rendering figures into {}", out_dir.display());
    println!("  aggregation: {}", strategy.describe());

    let need_accuracy =
        cfg.include_accuracy && (set.wants(FigureSet::Accuracy) || set.wants(FigureSet::Tradeoff));
    let accuracy: Option<AggregateGrid> = if need_accuracy {
        let kind = ArtifactKind::TestAccuracy {
            bias: cfg.bias,
            model: cfg.model.to_string(),
        };
        Some(store.load_grid(&sweep, &kind)?.aggregate(&strategy)?)
    } else {
        None
    };

    let mut saved = 0usize;

    if let Some(acc) = &accuracy {
        if set.wants(FigureSet::Accuracy) {
            let stem = format!("accuracy_vs_photons_{}_bias_{}", cfg.model, cfg.bias);
            let png = out_dir.join(format!("{stem}.png"));
            charts::render_metric_vs_photons(
                &png,
                &format!("Test accuracy vs photon count ({}, bias {})", cfg.model, cfg.bias),
                "test accuracy",
                acc,
            )?;
            write_band_csv(&out_dir.join(format!("{stem}.csv")), acc)?;
            println!("  {}", png.display());
            saved += 2;
        }
    }

    // MI-backed figures. A pure accuracy render skips this loop entirely,
    // so it never demands MI artifacts on disk.
    let per_estimator = set.wants(FigureSet::Mi)
        || set.wants(FigureSet::Tradeoff)
        || set.wants(FigureSet::Bars)
        || set.wants(FigureSet::Spread);
    let estimators = if per_estimator { estimators } else { Vec::new() };

    for &estimator in &estimators {
        let kind = ArtifactKind::MutualInformation { estimator };
        let grid = store.load_grid(&sweep, &kind)?;
        let agg = grid.aggregate(&strategy)?;

        if set.wants(FigureSet::Mi) {
            let stem = format!("mi_vs_photons_{estimator}");
            let png = out_dir.join(format!("{stem}.png"));
            charts::render_metric_vs_photons(
                &png,
                &format!("Mutual information vs photon count ({estimator})"),
                "mutual information (bits/pixel)",
                &agg,
            )?;
            write_band_csv(&out_dir.join(format!("{stem}.csv")), &agg)?;
            println!("  {}", png.display());
            saved += 2;
        }

        if let Some(acc) = &accuracy {
            if set.wants(FigureSet::Tradeoff) {
                let stem = format!("mi_accuracy_tradeoff_{estimator}");
                let png = out_dir.join(format!("{stem}.png"));
                charts::render_tradeoff_scatter(
                    &png,
                    &format!(
                        "MI vs test accuracy ({estimator}; marker color = photon count, dark to light)"
                    ),
                    &agg,
                    acc,
                )?;
                write_tradeoff_csv(&out_dir.join(format!("{stem}.csv")), &agg, acc)?;
                println!("  {}", png.display());
                saved += 2;
            }
        }

        if set.wants(FigureSet::Bars) {
            let bars: Vec<(Psf, f64)> = sweep
                .psfs
                .iter()
                .map(|&p| agg.band(p, cfg.focus_photons).map(|b| (p, b.center)))
                .collect::<photoninfo_core::Result<_>>()?;
            let stem = format!("psf_bars_{estimator}_{}", cfg.focus_photons);
            let png = out_dir.join(format!("{stem}.png"));
            charts::render_psf_bars(
                &png,
                &format!("MI by PSF at {} photons ({estimator})", cfg.focus_photons),
                "mutual information (bits/pixel)",
                &bars,
            )?;
            write_bars_csv(&out_dir.join(format!("{stem}.csv")), &bars)?;
            println!("  {}", png.display());
            saved += 2;
        }

        if set.wants(FigureSet::Spread) {
            let rows: Vec<(Psf, Vec<f64>)> = sweep
                .psfs
                .iter()
                .map(|&p| grid.cell(p, cfg.focus_photons).map(|c| (p, c.to_vec())))
                .collect::<photoninfo_core::Result<_>>()?;
            let stem = format!("trial_spread_{estimator}_{}", cfg.focus_photons);
            let png = out_dir.join(format!("{stem}.png"));
            charts::render_trial_spread(
                &png,
                &format!("Trial spread at {} photons ({estimator})", cfg.focus_photons),
                "mutual information (bits/pixel)",
                &rows,
            )?;
            write_spread_csv(&out_dir.join(format!("{stem}.csv")), &rows)?;
            println!("  {}", png.display());
            saved += 2;
        }
    }

    println!("\n{saved} file(s) written to {}", out_dir.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV companions
// ---------------------------------------------------------------------------

fn write_band_csv(path: &Path, grid: &AggregateGrid) -> Result<(), Box<dyn Error>> {
    let mut out = String::from("psf,photon_count,center,lower,upper\n");
    for &psf in grid.psfs() {
        for (&pc, band) in grid.photon_counts().iter().zip(grid.band_row(psf)?) {
            out.push_str(&format!(
                "{psf},{pc},{},{},{}\n",
                band.center, band.lower, band.upper
            ));
        }
    }
    fs::write(path, out)?;
    Ok(())
}

fn write_tradeoff_csv(
    path: &Path,
    mi: &AggregateGrid,
    accuracy: &AggregateGrid,
) -> Result<(), Box<dyn Error>> {
    let mut out = String::from(
        "psf,photon_count,mi_center,mi_lower,mi_upper,accuracy_center,accuracy_lower,accuracy_upper\n",
    );
    for &psf in mi.psfs() {
        let mi_row = mi.band_row(psf)?;
        let acc_row = accuracy.band_row(psf)?;
        for ((&pc, m), a) in mi.photon_counts().iter().zip(mi_row).zip(acc_row) {
            out.push_str(&format!(
                "{psf},{pc},{},{},{},{},{},{}\n",
                m.center, m.lower, m.upper, a.center, a.lower, a.upper
            ));
        }
    }
    fs::write(path, out)?;
    Ok(())
}

fn write_bars_csv(path: &Path, bars: &[(Psf, f64)]) -> Result<(), Box<dyn Error>> {
    let mut out = String::from("psf,value\n");
    for &(psf, value) in bars {
        out.push_str(&format!("{psf},{value}\n"));
    }
    fs::write(path, out)?;
    Ok(())
}

fn write_spread_csv(path: &Path, rows: &[(Psf, Vec<f64>)]) -> Result<(), Box<dyn Error>> {
    let mut out = String::from("psf,trial_index,value\n");
    for (psf, values) in rows {
        for (i, v) in values.iter().enumerate() {
            out.push_str(&format!("{psf},{i},{v}\n"));
        }
    }
    fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoninfo_core::{ArtifactKey, Estimator, Strategy, Sweep, npy};

    // -----------------------------------------------------------------------
    // FigureSet tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_figure_set_parse_known_names() {
        assert_eq!(FigureSet::parse("all"), FigureSet::All);
        assert_eq!(FigureSet::parse("mi"), FigureSet::Mi);
        assert_eq!(FigureSet::parse("tradeoff"), FigureSet::Tradeoff);
        assert_eq!(FigureSet::parse("spread"), FigureSet::Spread);
    }

    #[test]
    fn test_figure_set_parse_unknown_falls_back_to_all() {
        assert_eq!(FigureSet::parse("everything"), FigureSet::All);
    }

    #[test]
    fn test_figure_set_all_wants_each() {
        for which in [
            FigureSet::Mi,
            FigureSet::Accuracy,
            FigureSet::Tradeoff,
            FigureSet::Bars,
            FigureSet::Spread,
        ] {
            assert!(FigureSet::All.wants(which));
        }
        assert!(FigureSet::Mi.wants(FigureSet::Mi));
        assert!(!FigureSet::Mi.wants(FigureSet::Bars));
    }

    // -----------------------------------------------------------------------
    // CSV helpers
    // -----------------------------------------------------------------------

    /// Seed a tiny 2x2 grid on disk and aggregate it with the defaults.
    fn seeded_grid(root: &Path) -> AggregateGrid {
        let sweep = Sweep::new("bsccm", vec![Psf::One, Psf::Diffuser], vec![20, 100], 3).unwrap();
        for &psf in &sweep.psfs {
            for &pc in &sweep.photon_counts {
                let key = ArtifactKey::mi("bsccm", Estimator::Gaussian, pc, psf).unwrap();
                let path = root.join(key.relative_path());
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                let base = pc as f64 / 100.0;
                npy::write_file(&path, &[base, base + 0.1, base + 0.2]).unwrap();
            }
        }
        let store = ResultStore::open(root);
        let kind = ArtifactKind::MutualInformation {
            estimator: Estimator::Gaussian,
        };
        store
            .load_grid(&sweep, &kind)
            .unwrap()
            .aggregate(&Strategy::default())
            .unwrap()
    }

    #[test]
    fn test_band_csv_has_header_and_one_row_per_condition() {
        let dir = tempfile::tempdir().unwrap();
        let grid = seeded_grid(dir.path());
        let csv_path = dir.path().join("bands.csv");
        write_band_csv(&csv_path, &grid).unwrap();

        let text = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "psf,photon_count,center,lower,upper");
        assert_eq!(lines.len(), 1 + 4);
        assert!(lines[1].starts_with("one,20,"));
        assert!(lines[3].starts_with("diffuser,20,"));
    }

    #[test]
    fn test_tradeoff_csv_pairs_both_grids() {
        let dir = tempfile::tempdir().unwrap();
        let grid = seeded_grid(dir.path());
        let csv_path = dir.path().join("tradeoff.csv");
        write_tradeoff_csv(&csv_path, &grid, &grid).unwrap();

        let text = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("psf,photon_count,mi_center"));
        assert_eq!(lines.len(), 1 + 4);
        // Same grid on both sides, so the MI and accuracy columns agree.
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[2], fields[5]);
    }

    #[test]
    fn test_bars_and_spread_csv_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let bars = vec![(Psf::One, 1.25), (Psf::Four, f64::NAN)];
        let bars_path = dir.path().join("bars.csv");
        write_bars_csv(&bars_path, &bars).unwrap();
        let text = std::fs::read_to_string(&bars_path).unwrap();
        assert_eq!(text, "psf,value\none,1.25\nfour,NaN\n");

        let rows = vec![(Psf::One, vec![0.5, 0.75])];
        let spread_path = dir.path().join("spread.csv");
        write_spread_csv(&spread_path, &rows).unwrap();
        let text = std::fs::read_to_string(&spread_path).unwrap();
        assert_eq!(text, "psf,trial_index,value\none,0,0.5\none,1,0.75\n");
    }
}
