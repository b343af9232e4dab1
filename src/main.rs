use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use streamrelay::common::http::HttpClient;
use streamrelay::config::Config;
use streamrelay::extractor::YtDlpExtractor;
use streamrelay::server::AppState;
use streamrelay::session::SessionCache;
use streamrelay::transport;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let default_filter = config
        .logging
        .as_ref()
        .and_then(|l| l.level.clone())
        .unwrap_or_else(|| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let http = HttpClient::upstream(
        Duration::from_secs(config.upstream.connect_timeout_secs),
        Duration::from_secs(config.upstream.read_timeout_secs),
    )?;

    let shared_state = Arc::new(AppState {
        cache: SessionCache::new(),
        extractor: Arc::new(YtDlpExtractor::new(&config.extractor)),
        http,
        config: config.clone(),
    });

    let app = transport::http_server::router(shared_state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let address = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Stream relay listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
