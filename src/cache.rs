use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

/// Reads a JSON snapshot from `path` if it exists, otherwise runs `compute`
/// and stores its result there. Without a path it just computes.
///
/// Snapshots are trusted as-is; nothing checks them against the input.
pub fn load_or_compute<T, F>(path: Option<&Path>, compute: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T>,
{
    let Some(path) = path else {
        return compute();
    };

    if path.exists() {
        let raw = fs::read_to_string(path).with_context(|| format!("reading snapshot {}", path.display()))?;
        let value = serde_json::from_str(&raw).with_context(|| format!("parsing snapshot {}", path.display()))?;
        info!(path = %path.display(), "loaded snapshot");
        return Ok(value);
    }

    let value = compute()?;
    store(path, &value)?;
    Ok(value)
}

pub fn store<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let raw = serde_json::to_string(value)?;
    fs::write(path, raw).with_context(|| format!("writing snapshot {}", path.display()))?;
    info!(path = %path.display(), "stored snapshot");
    Ok(())
}
