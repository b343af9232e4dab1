pub mod ytdlp;

pub use ytdlp::YtDlpExtractor;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// One media format variant offered by an entry.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Format {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub resolution: Option<String>,
    pub filesize: Option<u64>,
    pub url: Option<String>,
}

/// One resolved media item, mirroring the extractor's JSON entry shape.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Entry {
    pub url: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub ext: Option<String>,
    pub filesize: Option<u64>,
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
    /// Raw cookie value as emitted by the extractor. Kept as JSON because
    /// the tool sometimes omits it or emits a non-string; both parse to an
    /// empty map.
    #[serde(default)]
    pub cookies: serde_json::Value,
    #[serde(default)]
    pub formats: Vec<Format>,
}

impl Entry {
    /// Cookie map reconstructed from the extractor's `"k=v; k2=v2"` string.
    pub fn cookie_map(&self) -> HashMap<String, String> {
        match &self.cookies {
            serde_json::Value::String(s) => parse_cookie_header(s),
            _ => HashMap::new(),
        }
    }
}

/// Parse a `Cookie`-header style string into a name → value map. Pairs
/// without a `=` are dropped; the rest of the string still parses.
pub fn parse_cookie_header(raw: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for pair in raw.split("; ") {
        if let Some((name, value)) = pair.split_once('=') {
            map.insert(name.to_string(), value.to_string());
        }
    }
    map
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    /// The tool exited non-zero; carries the last non-empty stderr line.
    #[error("{0}")]
    Tool(String),
    #[error("extractor output was not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("extractor timed out after {0} seconds")]
    Timeout(u64),
}

/// Boundary to the external extraction tool. The route layer maps
/// `ExtractError` to HTTP statuses; nothing below this trait knows about
/// HTTP.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Resolve a source URL into one or more entries. With `allow_playlist`
    /// a playlist URL yields every item; otherwise only the single video.
    async fn extract(&self, url: &str, allow_playlist: bool) -> Result<Vec<Entry>, ExtractError>;
}
