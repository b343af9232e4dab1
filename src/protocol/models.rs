use serde::{Deserialize, Serialize};

use crate::extractor::Entry;

/// One downloadable/playable variant offered to the client.
///
/// The synthetic "Default" and "Best (Proxy)" descriptors point at the
/// handle-based proxy URL; descriptors derived from upstream formats carry
/// the raw upstream URL and bypass the proxy. That asymmetry is inherited
/// behavior and deliberate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
    pub ext: String,
    pub resolution: String,
    /// 0 when the upstream size is unknown.
    pub filesize: u64,
    pub url: String,
}

/// Client-facing projection of one resolved entry. `id` doubles as the
/// stream handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: f64,
    pub uploader: String,
    pub stream_url: String,
    pub original_url: String,
    pub formats: Vec<FormatDescriptor>,
}

impl VideoMetadata {
    /// Project one resolved entry into the client-facing shape, with
    /// `handle` already issued for the entry's top-level stream target.
    pub fn from_entry(entry: &Entry, handle: &str) -> Self {
        let proxied_download = format!("/stream/{handle}?dl=1");
        let top_ext = entry.ext.clone().unwrap_or_else(|| "mp4".to_string());
        let mut formats = Vec::new();

        if entry.formats.is_empty() {
            formats.push(FormatDescriptor {
                format_id: None,
                ext: top_ext,
                resolution: "Default".to_string(),
                filesize: entry.filesize.unwrap_or(0),
                url: proxied_download,
            });
        } else {
            formats.push(FormatDescriptor {
                format_id: Some("proxy".to_string()),
                ext: top_ext,
                resolution: "Best (Proxy)".to_string(),
                filesize: entry.filesize.unwrap_or(0),
                url: proxied_download,
            });

            for format in &entry.formats {
                // Formats without a direct URL are unusable to the client
                let Some(url) = &format.url else { continue };
                formats.push(FormatDescriptor {
                    format_id: Some(format.format_id.clone().unwrap_or_else(|| "0".to_string())),
                    ext: format.ext.clone().unwrap_or_else(|| "mp4".to_string()),
                    resolution: format
                        .resolution
                        .clone()
                        .unwrap_or_else(|| "Unknown".to_string()),
                    filesize: format.filesize.unwrap_or(0),
                    url: url.clone(),
                });
            }
        }

        Self {
            id: handle.to_string(),
            title: entry
                .title
                .clone()
                .unwrap_or_else(|| "Unknown Title".to_string()),
            thumbnail: entry.thumbnail.clone().unwrap_or_default(),
            duration: entry.duration.unwrap_or(0.0),
            uploader: entry
                .uploader
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            stream_url: format!("/stream/{handle}"),
            original_url: entry.url.clone().unwrap_or_default(),
            formats,
        }
    }
}
