//! `photoninfo analyze` — aggregate a sweep and summarize MI against accuracy.

use std::path::Path;

use photoninfo_core::{AggregateGrid, ArtifactKind, ResultStore, SweepReport};

pub struct AnalyzeCommandConfig<'a> {
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
    pub output_path: Option<&'a str>,
}

pub fn run(cfg: AnalyzeCommandConfig<'_>) {
    if let Err(e) = execute(cfg) {
        eprintln!("Analysis failed: {e}");
        std::process::exit(1);
    }
}

fn execute(cfg: AnalyzeCommandConfig<'_>) -> photoninfo_core::Result<()> {
    let sweep = super::build_sweep(cfg.dataset, cfg.psf_filter, cfg.photon_filter, cfg.trials)?;
    let estimators = super::parse_estimators(cfg.estimator_filter)?;
    let strategy = super::build_strategy(
        cfg.point,
        cfg.interval,
        cfg.confidence,
        cfg.clip_ratio,
        cfg.no_clip,
    );
    let store = ResultStore::open(cfg.root);

    println!(
        "Analyzing '{}' results under {}",
        sweep.dataset,
        store.root().display()
    );
    println!(
        "  {} PSFs x {} photon counts, {} trial(s) per condition",
        sweep.psfs.len(),
        sweep.photon_counts.len(),
        sweep.trials
    );
    println!("  aggregation: {}", strategy.describe());

    let mut report = SweepReport::new(&sweep, &strategy);

    for &estimator in &estimators {
        let kind = ArtifactKind::MutualInformation { estimator };
        let grid = store.load_grid(&sweep, &kind)?;
        let agg = grid.aggregate(&strategy)?;
        print_table(&format!("MI ({estimator}), bits per pixel"), &agg)?;
        report.push_mi(estimator, &agg)?;
    }

    if cfg.include_accuracy {
        let kind = ArtifactKind::TestAccuracy {
            bias: cfg.bias,
            model: cfg.model.to_string(),
        };
        let grid = store.load_grid(&sweep, &kind)?;
        let agg = grid.aggregate(&strategy)?;
        print_table(
            &format!("test accuracy ({}, bias {})", cfg.model, cfg.bias),
            &agg,
        )?;
        report.set_accuracy(cfg.bias, cfg.model, &agg)?;
    }

    if let Some(path) = cfg.output_path {
        match report.write_json(Path::new(path)) {
            Ok(()) => println!("\nReport written to {path}"),
            Err(e) => eprintln!("\nFailed to write {path}: {e}"),
        }
    }

    Ok(())
}

/// Print one grid of point estimates, PSF rows by photon-count columns.
/// Interval bounds stay out of the table; they land in the JSON report.
fn print_table(title: &str, grid: &AggregateGrid) -> photoninfo_core::Result<()> {
    println!("\n{:=<68}", "");
    println!("{title}");
    println!("{:=<68}", "");

    print!("{:<10}", "psf");
    for &pc in grid.photon_counts() {
        print!(" {pc:>7}");
    }
    println!();

    for &psf in grid.psfs() {
        print!("{:<10}", psf.to_string());
        for band in grid.band_row(psf)? {
            print!(" {:>7.3}", band.center);
        }
        println!();
    }
    Ok(())
}
