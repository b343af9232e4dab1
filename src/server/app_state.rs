use std::sync::Arc;

use crate::{config::Config, extractor::Extractor, session::SessionCache};

/// Top-level application state.
///
/// The extractor is injected as a trait object so tests can swap the yt-dlp
/// process boundary for a canned one, and the session cache is owned here
/// rather than living in a process global.
pub struct AppState {
    pub cache: SessionCache,
    pub extractor: Arc<dyn Extractor>,
    pub http: reqwest::Client,
    pub config: Config,
}
