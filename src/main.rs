use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pitchtrace::{cache, cli, config, frames, AnalysisJob};

/// Creates a timestamped output directory and returns its path
fn create_output_dir() -> Result<String> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let output_dir = format!("./runs/{}", timestamp);
    fs::create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<()> {
    init_logging();
    let args: cli::Args = argh::from_env();
    let config = config::build_config(&args)?;

    let output_dir = create_output_dir()?;
    info!(dir = %output_dir, "created output directory");

    let frames = frames::load_frames(Path::new(&args.frames))?;
    let detections = frames::load_detections(Path::new(&args.detections))?;
    let report = AnalysisJob::new(config).run(&frames, &detections)?;

    let report_path = format!("{}/report.json", output_dir);
    let tracks_path = format!("{}/tracks.json", output_dir);
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&report_path, json).with_context(|| format!("writing {}", report_path))?;
    cache::store(Path::new(&tracks_path), &report.annotated)?;
    info!(
        report = %report_path,
        tracks = %tracks_path,
        players = report.players.len(),
        "report saved"
    );

    // Move the report to output_filepath if specified
    if !args.output_filepath.is_empty() {
        fs::rename(&report_path, &args.output_filepath)
            .with_context(|| format!("moving report to {}", args.output_filepath))?;
        info!(path = %args.output_filepath, "report moved");
    }

    Ok(())
}
