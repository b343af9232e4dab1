use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Entry, ExtractError, Extractor};
use crate::config::ExtractorConfig;

/// Extraction adapter that shells out to the `yt-dlp` binary and parses its
/// single-JSON-document output (`-J`). The extraction algorithm itself is
/// the tool's problem; this only owns the process boundary.
pub struct YtDlpExtractor {
    binary: String,
    socket_timeout_secs: u64,
    timeout_secs: u64,
}

impl YtDlpExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            socket_timeout_secs: config.socket_timeout_secs,
            timeout_secs: config.timeout_secs,
        }
    }

    fn build_args(&self, url: &str, allow_playlist: bool) -> Vec<String> {
        let mut args = vec![
            "-J".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout_secs.to_string(),
        ];

        args.push(if allow_playlist {
            "--yes-playlist".to_string()
        } else {
            "--no-playlist".to_string()
        });

        // "--" so a hostile identifier cannot smuggle extra flags
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Flatten the tool's output into entries. A playlist document carries
    /// its items under `entries` (null slots are unavailable items and get
    /// dropped); anything else is a single entry.
    fn parse_output(stdout: &[u8]) -> Result<Vec<Entry>, ExtractError> {
        let doc: serde_json::Value = serde_json::from_slice(stdout)?;

        match doc.get("entries").and_then(|e| e.as_array()) {
            Some(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| serde_json::from_value(item.clone()).map_err(ExtractError::from))
                .collect(),
            None => Ok(vec![serde_json::from_value(doc)?]),
        }
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn extract(&self, url: &str, allow_playlist: bool) -> Result<Vec<Entry>, ExtractError> {
        let args = self.build_args(url, allow_playlist);
        tracing::debug!("Running {} {}", self.binary, args.join(" "));

        let run = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), run)
            .await
            .map_err(|_| ExtractError::Timeout(self.timeout_secs))?
            .map_err(|source| ExtractError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("extractor exited with an error")
                .to_string();
            tracing::warn!("Extractor failed for '{}': {}", url, message);
            return Err(ExtractError::Tool(message));
        }

        Self::parse_output(&output.stdout)
    }
}
