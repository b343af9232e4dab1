use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Deserialize;

use crate::{
    common::ApiError, protocol::VideoMetadata, server::AppState, session::StreamSession,
};

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /api/info
///
/// Resolves the URL through the extraction adapter, caches ONE stream
/// session for the top-level entry, and returns the client-facing metadata.
/// Extraction is playlist-aware, yet only the first entry is converted;
/// the remainder is discarded (inherited behavior, kept as observed).
pub async fn video_info(
    State(state): State<Arc<AppState>>,
    Json(body): Json<InfoRequest>,
) -> Result<Json<VideoMetadata>, ApiError> {
    let url = match body.url.as_deref() {
        Some(u) if !u.is_empty() => u,
        _ => return Err(ApiError::BadRequest),
    };

    tracing::debug!("Resolving media info for '{}'", url);

    let entries = state
        .extractor
        .extract(url, true)
        .await
        .map_err(|e| ApiError::Extraction(e.to_string()))?;

    let Some(entry) = entries.first() else {
        tracing::debug!("Extractor returned no entries for '{}'", url);
        return Err(ApiError::NoVideoFound);
    };

    let handle = state.cache.put(StreamSession {
        upstream_url: entry.url.clone().unwrap_or_default(),
        headers: entry.http_headers.clone(),
        cookies: entry.cookie_map(),
        title: entry.title.clone().unwrap_or_else(|| "video".to_string()),
        ext: entry.ext.clone(),
    });

    tracing::info!("Cached stream session {} for '{}'", handle, url);

    Ok(Json(VideoMetadata::from_entry(entry, &handle)))
}
