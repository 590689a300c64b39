//! hydroshed CLI - watershed delineation from a DEM and pour points

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use hydroshed_pipeline::{mask_path, run, PipelineConfig};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "hydroshed")]
#[command(author, version, about = "Watershed delineation from a DEM and pour points", long_about = None)]
struct Cli {
    /// Output directory for all artifacts (created if missing)
    #[arg(short, long)]
    workspace: PathBuf,

    /// Input DEM (GeoTIFF)
    #[arg(short, long)]
    dem: PathBuf,

    /// Pour point features (GeoJSON points)
    #[arg(short, long)]
    pour_points: PathBuf,

    /// Clip mask polygon (GeoJSON); empty or omitted means no clipping
    #[arg(short, long)]
    mask: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = PipelineConfig {
        workspace: cli.workspace,
        dem: cli.dem,
        pour_points: cli.pour_points,
        mask: mask_path(cli.mask.as_deref()),
    };

    let start = Instant::now();
    let pb = spinner("Delineating watershed...");
    let report = run(&config).context("Watershed delineation failed")?;
    pb.finish_and_clear();

    println!("Delineation complete in {:.2?}", start.elapsed());
    for path in &report.artifacts {
        println!("  {}", path.display());
    }
    Ok(())
}
