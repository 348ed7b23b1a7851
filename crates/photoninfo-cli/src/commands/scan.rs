//! `photoninfo scan` — survey which sweep artifacts exist under a results root.
//!
//! Scanning is deliberately lenient: missing or unreadable files are
//! reported in the coverage table, never fatal, so a partially-populated
//! results tree can be inspected while the upstream pipeline is still
//! running.

use photoninfo_core::{
    ArtifactKey, ArtifactKind, Estimator, ResultStore, Sweep, check_identifier,
};

pub struct ScanCommandConfig<'a> {
    pub root: &'a str,
    pub dataset: &'a str,
    pub psf_filter: Option<&'a str>,
    pub photon_filter: Option<&'a str>,
    pub trials: usize,
    pub bias: u32,
    pub model: &'a str,
}

enum CellState {
    Present(usize),
    Missing,
    Malformed,
}

#[derive(Default)]
struct Tally {
    total: usize,
    complete: usize,
    off_count: usize,
    missing: usize,
    malformed: usize,
}

pub fn run(cfg: ScanCommandConfig<'_>) {
    let sweep =
        match super::build_sweep(cfg.dataset, cfg.psf_filter, cfg.photon_filter, cfg.trials) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Invalid sweep: {e}");
                std::process::exit(1);
            }
        };
    if let Err(e) = check_identifier("model", cfg.model) {
        eprintln!("Invalid model label: {e}");
        std::process::exit(1);
    }

    let store = ResultStore::open(cfg.root);
    if !store.root().is_dir() {
        eprintln!(
            "Warning: {} is not a directory; every artifact will read as missing",
            store.root().display()
        );
    }

    println!("Artifact coverage under {}", store.root().display());
    println!(
        "  dataset '{}', {} PSFs x {} photon counts, {} trial(s) expected per condition",
        sweep.dataset,
        sweep.psfs.len(),
        sweep.photon_counts.len(),
        sweep.trials
    );

    let mut families: Vec<(String, ArtifactKind)> = Estimator::ALL
        .iter()
        .map(|&est| {
            (
                format!("MI estimates ({est})"),
                ArtifactKind::MutualInformation { estimator: est },
            )
        })
        .collect();
    families.push((
        format!("test accuracy ({}, bias {})", cfg.model, cfg.bias),
        ArtifactKind::TestAccuracy {
            bias: cfg.bias,
            model: cfg.model.to_string(),
        },
    ));

    let mut tally = Tally::default();
    for (title, kind) in &families {
        scan_family(&store, &sweep, kind, title, &mut tally);
    }

    println!(
        "\n{}/{} conditions complete at {} trial(s)",
        tally.complete, tally.total, sweep.trials
    );
    if tally.off_count > 0 {
        println!(
            "  {} present with a different trial count",
            tally.off_count
        );
    }
    if tally.malformed > 0 {
        println!("  {} unreadable (shown as !!)", tally.malformed);
    }
    if tally.missing > 0 {
        println!("  {} missing (shown as --)", tally.missing);
    }
}

/// Print one family's coverage table: PSF rows, photon-count columns,
/// cells holding the trial count found on disk.
fn scan_family(
    store: &ResultStore,
    sweep: &Sweep,
    kind: &ArtifactKind,
    title: &str,
    tally: &mut Tally,
) {
    println!("\n{:=<68}", "");
    println!("{title}");
    println!("{:=<68}", "");

    print!("{:<10}", "psf");
    for &pc in &sweep.photon_counts {
        print!(" {pc:>5}");
    }
    println!();

    for &psf in &sweep.psfs {
        print!("{:<10}", psf.to_string());
        for &pc in &sweep.photon_counts {
            // Labels were validated with the sweep, so key construction
            // only fails if the model label slipped through. Treat that
            // as unreadable rather than aborting a survey.
            let state = match ArtifactKey::with_kind(&sweep.dataset, kind.clone(), pc, psf) {
                Ok(key) => probe(store, &key),
                Err(_) => CellState::Malformed,
            };
            tally.total += 1;
            let cell = match state {
                CellState::Present(n) if n == sweep.trials => {
                    tally.complete += 1;
                    n.to_string()
                }
                CellState::Present(n) => {
                    tally.off_count += 1;
                    n.to_string()
                }
                CellState::Missing => {
                    tally.missing += 1;
                    "--".to_string()
                }
                CellState::Malformed => {
                    tally.malformed += 1;
                    "!!".to_string()
                }
            };
            print!(" {cell:>5}");
        }
        println!();
    }
}

fn probe(store: &ResultStore, key: &ArtifactKey) -> CellState {
    if !store.exists(key) {
        return CellState::Missing;
    }
    match store.load(key) {
        Ok(values) => CellState::Present(values.len()),
        Err(_) => CellState::Malformed,
    }
}
