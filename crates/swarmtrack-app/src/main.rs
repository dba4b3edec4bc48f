//! SwarmTrack - retroactive identity correction for recorded tracks.
//!
//! Reads a JSON track file, replays it frame by frame through the hindsight
//! engine and writes the corrected tracks.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use swarmtrack_hindsight::{replay, HindsightParams, TrackFile};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "swarmtrack")]
#[command(version)]
#[command(about = "Fix identity errors in multi-target tracks with hindsight", long_about = None)]
struct Cli {
    /// Track file to correct
    input: PathBuf,

    /// Hindsight parameters (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the corrected tracks
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the diagnostics report as JSON on stdout
    #[arg(short, long)]
    report: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let params = match &cli.config {
        Some(path) => HindsightParams::load(path)
            .with_context(|| format!("Failed to load parameters from {}", path.display()))?,
        None => HindsightParams::default(),
    };

    let input = TrackFile::load_from_file(&cli.input)
        .with_context(|| format!("Failed to read tracks from {}", cli.input.display()))?;
    info!(
        path = %cli.input.display(),
        frames = input.frames.len(),
        "Loaded tracks"
    );

    let (corrected, diag) = replay(&input, params);
    info!(fixed = diag.total_fixed(), frames = diag.nframes_analyzed, "Hindsight pass complete");

    if let Some(path) = &cli.output {
        corrected
            .save_to_file(path)
            .with_context(|| format!("Failed to write tracks to {}", path.display()))?;
        info!(path = %path.display(), "Wrote corrected tracks");
    }

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&diag)?);
    } else {
        for line in diag.to_string().lines() {
            info!("{}", line);
        }
    }

    Ok(())
}
