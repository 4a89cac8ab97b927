//! Output modes — emit fired alerts as JSONL to various destinations.

use crate::alert::Alert;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use std::io::Write;
use std::path::PathBuf;

/// Where the daemon sends fired alerts.
#[derive(Debug, Clone)]
pub enum OutputMode {
    /// Write JSONL to stdout.
    Stdout,
    /// Append JSONL to a file.
    File(PathBuf),
    /// POST the alert batch as JSON to a webhook URL.
    Webhook(String),
}

impl OutputMode {
    /// Parse from config strings.
    pub fn from_config(mode: &str, path: Option<&PathBuf>, url: Option<&str>) -> Result<Self> {
        match mode {
            "stdout" => Ok(Self::Stdout),
            "file" => {
                let path = path
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from(".dosette/alerts.jsonl"));
                Ok(Self::File(path))
            }
            "webhook" => {
                let url =
                    url.ok_or_else(|| color_eyre::eyre::eyre!("webhook output requires a url"))?;
                Ok(Self::Webhook(url.to_string()))
            }
            other => Err(color_eyre::eyre::eyre!("unknown output mode: {other}")),
        }
    }
}

/// Emit a batch of alerts to the configured output destination.
pub async fn emit(alerts: &[Alert], mode: &OutputMode) -> Result<()> {
    if alerts.is_empty() {
        return Ok(());
    }

    match mode {
        OutputMode::Stdout => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for alert in alerts {
                let line = serde_json::to_string(alert).wrap_err("failed to serialize alert")?;
                writeln!(out, "{line}").wrap_err("failed to write alert to stdout")?;
            }
        }
        OutputMode::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
            }
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .wrap_err_with(|| format!("failed to open {}", path.display()))?;
            for alert in alerts {
                let line = serde_json::to_string(alert).wrap_err("failed to serialize alert")?;
                writeln!(file, "{line}")
                    .wrap_err_with(|| format!("failed to append to {}", path.display()))?;
            }
        }
        OutputMode::Webhook(url) => {
            let client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .wrap_err("failed to build HTTP client")?;
            let resp = client
                .post(url)
                .json(alerts)
                .send()
                .await
                .wrap_err_with(|| format!("failed to POST alerts to {url}"))?;
            if !resp.status().is_success() {
                color_eyre::eyre::bail!("webhook returned {}", resp.status());
            }
        }
    }

    Ok(())
}
