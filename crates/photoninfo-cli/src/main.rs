//! CLI for photoninfo — how many bits does your optic keep, and do they help the task?

mod commands;
mod figures;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "photoninfo")]
#[command(about = "photoninfo — compare optical encoders by mutual information and task accuracy")]
#[command(version = photoninfo_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Survey which sweep artifacts exist under a results root
    Scan {
        /// Results root directory holding the artifact tree
        #[arg(long, default_value = "results")]
        root: String,

        /// Dataset identifier
        #[arg(long, default_value = "bsccm")]
        dataset: String,

        /// Comma-separated PSF labels, or "all" (default: one,four,diffuser,uc)
        #[arg(long)]
        psfs: Option<String>,

        /// Comma-separated photon counts, or "all"
        #[arg(long)]
        photons: Option<String>,

        /// Expected trials per condition
        #[arg(long, default_value = "10")]
        trials: usize,

        /// Sensor bias label on accuracy artifacts
        #[arg(long, default_value = "10")]
        bias: u32,

        /// Classifier model label on accuracy artifacts
        #[arg(long, default_value = "cnn")]
        model: String,
    },

    /// Aggregate MI and accuracy across trials and write a JSON report.
    /// Tables show point estimates; interval bounds land in the JSON.
    Analyze {
        /// Results root directory holding the artifact tree
        #[arg(long, default_value = "results")]
        root: String,

        /// Dataset identifier
        #[arg(long, default_value = "bsccm")]
        dataset: String,

        /// Comma-separated PSF labels, or "all" (default: one,four,diffuser,uc)
        #[arg(long)]
        psfs: Option<String>,

        /// Comma-separated photon counts, or "all"
        #[arg(long)]
        photons: Option<String>,

        /// Trials per condition; artifacts with any other count are rejected
        #[arg(long, default_value = "10")]
        trials: usize,

        /// Comma-separated estimator labels, or "all" (default: both)
        #[arg(long)]
        estimators: Option<String>,

        /// Skip classifier accuracy artifacts
        #[arg(long)]
        no_accuracy: bool,

        /// Sensor bias label on accuracy artifacts
        #[arg(long, default_value = "10")]
        bias: u32,

        /// Classifier model label on accuracy artifacts
        #[arg(long, default_value = "cnn")]
        model: String,

        /// Point estimate across trials
        #[arg(long, default_value = "mean", value_parser = ["mean", "min"])]
        aggregate: String,

        /// Uncertainty band around the point estimate
        #[arg(long, default_value = "percentile", value_parser = ["percentile", "parametric", "none"])]
        interval: String,

        /// Confidence level for the band, strictly between 0 and 1
        #[arg(long, default_value = "0.9")]
        confidence: f64,

        /// Clip trials above this multiple of the per-condition minimum
        #[arg(long, default_value = "2.0")]
        clip_ratio: f64,

        /// Disable outlier clipping
        #[arg(long)]
        no_clip: bool,

        /// Write the full report (bounds included) as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Render comparison figures as PNGs with CSV companions
    Figures {
        /// Results root directory holding the artifact tree
        #[arg(long, default_value = "results")]
        root: String,

        /// Dataset identifier
        #[arg(long, default_value = "bsccm")]
        dataset: String,

        /// Comma-separated PSF labels, or "all" (default: one,four,diffuser,uc)
        #[arg(long)]
        psfs: Option<String>,

        /// Comma-separated photon counts, or "all"
        #[arg(long)]
        photons: Option<String>,

        /// Trials per condition; artifacts with any other count are rejected
        #[arg(long, default_value = "10")]
        trials: usize,

        /// Comma-separated estimator labels, or "all" (default: both)
        #[arg(long)]
        estimators: Option<String>,

        /// Skip classifier accuracy artifacts and the figures that need them
        #[arg(long)]
        no_accuracy: bool,

        /// Sensor bias label on accuracy artifacts
        #[arg(long, default_value = "10")]
        bias: u32,

        /// Classifier model label on accuracy artifacts
        #[arg(long, default_value = "cnn")]
        model: String,

        /// Point estimate across trials
        #[arg(long, default_value = "mean", value_parser = ["mean", "min"])]
        aggregate: String,

        /// Uncertainty band around the point estimate
        #[arg(long, default_value = "percentile", value_parser = ["percentile", "parametric", "none"])]
        interval: String,

        /// Confidence level for the band, strictly between 0 and 1
        #[arg(long, default_value = "0.9")]
        confidence: f64,

        /// Clip trials above this multiple of the per-condition minimum
        #[arg(long, default_value = "2.0")]
        clip_ratio: f64,

        /// Disable outlier clipping
        #[arg(long)]
        no_clip: bool,

        /// Directory figures are written into
        #[arg(long, default_value = "target/figures")]
        out_dir: String,

        /// Which figure family to render
        #[arg(long, default_value = "all", value_parser = ["all", "mi", "accuracy", "tradeoff", "bars", "spread"])]
        figure: String,

        /// Photon count highlighted by the bars and spread figures
        #[arg(long, default_value = "100")]
        focus_photons: u32,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            root,
            dataset,
            psfs,
            photons,
            trials,
            bias,
            model,
        } => commands::scan::run(commands::scan::ScanCommandConfig {
            root: &root,
            dataset: &dataset,
            psf_filter: psfs.as_deref(),
            photon_filter: photons.as_deref(),
            trials,
            bias,
            model: &model,
        }),
        Commands::Analyze {
            root,
            dataset,
            psfs,
            photons,
            trials,
            estimators,
            no_accuracy,
            bias,
            model,
            aggregate,
            interval,
            confidence,
            clip_ratio,
            no_clip,
            output,
        } => commands::analyze::run(commands::analyze::AnalyzeCommandConfig {
            root: &root,
            dataset: &dataset,
            psf_filter: psfs.as_deref(),
            photon_filter: photons.as_deref(),
            trials,
            estimator_filter: estimators.as_deref(),
            include_accuracy: !no_accuracy,
            bias,
            model: &model,
            point: &aggregate,
            interval: &interval,
            confidence,
            clip_ratio,
            no_clip,
            output_path: output.as_deref(),
        }),
        Commands::Figures {
            root,
            dataset,
            psfs,
            photons,
            trials,
            estimators,
            no_accuracy,
            bias,
            model,
            aggregate,
            interval,
            confidence,
            clip_ratio,
            no_clip,
            out_dir,
            figure,
            focus_photons,
        } => commands::figures::run(commands::figures::FiguresCommandConfig {
            root: &root,
            dataset: &dataset,
            psf_filter: psfs.as_deref(),
            photon_filter: photons.as_deref(),
            trials,
            estimator_filter: estimators.as_deref(),
            include_accuracy: !no_accuracy,
            bias,
            model: &model,
            point: &aggregate,
            interval: &interval,
            confidence,
            clip_ratio,
            no_clip,
            out_dir: &out_dir,
            figure: &figure,
            focus_photons,
        }),
    }
}
