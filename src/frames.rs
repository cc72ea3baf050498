use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;
use tracing::{debug, info};

use crate::tracks::Detection;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Last run of digits in the file stem, so `frame_10` sorts after `frame_2`
fn frame_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let end = stem.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = stem[..end].rfind(|c: char| !c.is_ascii_digit()).map_or(0, |i| i + 1);
    stem[start..end].parse().ok()
}

/// Image files in `dir`, ordered by the frame number in their name and then
/// by name
pub fn frame_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .with_context(|| format!("reading frame directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.retain(|p| is_frame_file(p));
    paths.sort_by(|a, b| frame_number(a).cmp(&frame_number(b)).then_with(|| a.cmp(b)));
    Ok(paths)
}

/// Decodes every frame in `dir` to RGB, in frame number order
pub fn load_frames(dir: &Path) -> Result<Vec<RgbImage>> {
    let paths = frame_paths(dir)?;
    let frames = paths
        .iter()
        .map(|path| {
            debug!(path = %path.display(), "decoding frame");
            image::open(path)
                .map(|img| img.to_rgb8())
                .with_context(|| format!("decoding frame {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    info!(dir = %dir.display(), frames = frames.len(), "frames loaded");
    Ok(frames)
}

/// Reads the tracker output, a JSON array of detection records
pub fn load_detections(path: &Path) -> Result<Vec<Detection>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading detections {}", path.display()))?;
    let detections: Vec<Detection> =
        serde_json::from_str(&raw).with_context(|| format!("parsing detections {}", path.display()))?;
    info!(path = %path.display(), records = detections.len(), "detections loaded");
    Ok(detections)
}
