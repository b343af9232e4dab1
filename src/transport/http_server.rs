use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    server::AppState,
    transport::routes::{index, info, stream},
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route("/version", get(get_version))
        .route("/api/info", post(info::video_info))
        .route("/stream/{handle}", get(stream::stream_video))
        .with_state(state)
}

/// GET /version
pub async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
