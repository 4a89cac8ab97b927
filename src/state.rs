//! Atomic JSON state files.
//!
//! All persistent state (`.dosette/medications.json`, `.dosette/alarms.json`)
//! goes through these helpers: serialize to a temporary sibling file, then
//! rename over the target so a crash mid-write never leaves a truncated file.

use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load and deserialize a JSON state file.
///
/// Returns an error if the file is missing or malformed; callers that treat
/// a missing file as "empty state" use `unwrap_or_default()`.
pub fn load_state<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .wrap_err_with(|| format!("failed to parse {}", path.display()))
}

/// Serialize and write a JSON state file atomically.
///
/// Creates parent directories as needed. The write goes to `<path>.tmp`
/// first and is renamed into place.
pub fn save_state<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value).wrap_err("failed to serialize state")?;

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json).wrap_err_with(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .wrap_err_with(|| format!("failed to rename {} into place", tmp.display()))?;

    Ok(())
}
