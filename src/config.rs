//! Configuration for dosette, loaded from TOML.
//!
//! # Configuration file format
//!
//! Dosette looks for `.dosette/config.toml` under the working directory.
//! All fields are optional; dosette runs with sensible defaults if the file
//! is missing or empty.
//!
//! ```toml
//! # How often the daemon checks for due reminders, in seconds (default: 30).
//! tick_interval_secs = 30
//!
//! # Title carried by every reminder notification.
//! reminder_title = "Medication reminder"
//!
//! # Where fired reminders go.
//! [output]
//! mode = "stdout"          # "stdout" | "file" | "webhook"
//! # path = ".dosette/alerts.jsonl"  # required for mode = "file"
//! # url  = "https://..."            # required for mode = "webhook"
//! ```

use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level dosette configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// How often the daemon checks for due reminders, in seconds (default: 30).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Title carried by every reminder notification.
    #[serde(default = "default_reminder_title")]
    pub reminder_title: String,

    /// Output mode configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output destination configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// "stdout" | "file" | "webhook" (default: "stdout").
    #[serde(default = "default_output_mode")]
    pub mode: String,

    /// Destination path for `mode = "file"`.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Destination URL for `mode = "webhook"`.
    #[serde(default)]
    pub url: Option<String>,
}

fn default_tick_interval() -> u64 {
    30
}

fn default_reminder_title() -> String {
    "Medication reminder".into()
}

fn default_output_mode() -> String {
    "stdout".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            reminder_title: default_reminder_title(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: default_output_mode(),
            path: None,
            url: None,
        }
    }
}

impl AppConfig {
    /// Path of the config file under `root`.
    pub fn path(root: &Path) -> PathBuf {
        root.join(".dosette/config.toml")
    }

    /// Load the config under `root`, falling back to defaults when the file
    /// is missing. A malformed file is an error, not a silent default.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).wrap_err_with(|| format!("failed to parse {}", path.display()))
    }
}

/// Commented template written by `dosette init`.
const CONFIG_TEMPLATE: &str = "\
# Dosette configuration. All fields are optional.

# How often the daemon checks for due reminders, in seconds.
# tick_interval_secs = 30

# Title carried by every reminder notification.
# reminder_title = \"Medication reminder\"

# Where fired reminders go.
# [output]
# mode = \"stdout\"                 # \"stdout\" | \"file\" | \"webhook\"
# path = \".dosette/alerts.jsonl\"  # required for mode = \"file\"
# url  = \"https://...\"            # required for mode = \"webhook\"
";

/// Create `.dosette/` and a commented config template under `root`.
///
/// Returns the config path. An existing config file is left untouched.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    let path = AppConfig::path(root);
    if path.exists() {
        return Ok(path);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, CONFIG_TEMPLATE)
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;

    Ok(path)
}
