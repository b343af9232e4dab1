use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, header},
    response::Response,
};
use futures::StreamExt;
use serde::Deserialize;

use crate::{common::ApiError, server::AppState, session::StreamSession};

/// Framing/encoding headers that stop being true once the body is
/// re-streamed through this process.
const EXCLUDED_HEADERS: [&str; 4] = [
    "content-encoding",
    "content-length",
    "transfer-encoding",
    "connection",
];

fn is_excluded(name: &HeaderName) -> bool {
    EXCLUDED_HEADERS
        .iter()
        .any(|excluded| name.as_str().eq_ignore_ascii_case(excluded))
}

fn cookie_header(cookies: &HashMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn attachment_value(session: &StreamSession) -> HeaderValue {
    let ext = session.ext.as_deref().unwrap_or("mp4");
    let title: String = session
        .title
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{title}.{ext}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub dl: Option<String>,
}

/// GET /stream/{handle}?dl=0|1
///
/// Re-issues the cached upstream request and relays status, filtered
/// headers, and the body as a forwarding byte stream. Nothing is buffered:
/// the client's read pace is the upstream's read pace, and a client
/// disconnect drops the upstream response mid-flight.
pub async fn stream_video(
    Path(handle): Path<String>,
    Query(params): Query<StreamQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let Some(session) = state.cache.get(&handle) else {
        tracing::debug!("Unknown stream handle: {}", handle);
        return Err(ApiError::UnknownHandle);
    };

    let is_download = params.dl.as_deref() == Some("1");

    let mut request = state.http.get(&session.upstream_url);
    for (name, value) in &session.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    if !session.cookies.is_empty() {
        request = request.header(header::COOKIE, cookie_header(&session.cookies));
    }

    let upstream = request.send().await.map_err(|e| {
        tracing::error!("Upstream fetch for handle {} failed: {}", handle, e);
        ApiError::Proxy(e.to_string())
    })?;

    let mut response = Response::builder().status(upstream.status().as_u16());
    for (name, value) in upstream.headers() {
        if is_excluded(name) {
            continue;
        }
        response = response.header(name, value);
    }

    if is_download {
        response = response.header(header::CONTENT_DISPOSITION, attachment_value(&session));
    }

    // Mid-stream upstream errors terminate the body; the status line is
    // already on the wire by then.
    let stream = upstream.bytes_stream().map(|item| item.map_err(|e| e.to_string()));
    response
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Proxy(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        Router,
        body::Body,
        http::{HeaderValue, Request, StatusCode, header},
        response::IntoResponse,
        routing::get,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        common::http::HttpClient,
        config::Config,
        extractor::{Entry, ExtractError, Extractor},
        server::AppState,
        session::{SessionCache, StreamSession},
        transport::http_server,
    };

    struct NoopExtractor;

    #[async_trait::async_trait]
    impl Extractor for NoopExtractor {
        async fn extract(
            &self,
            _url: &str,
            _allow_playlist: bool,
        ) -> Result<Vec<Entry>, ExtractError> {
            Ok(vec![])
        }
    }

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            cache: SessionCache::new(),
            extractor: Arc::new(NoopExtractor),
            http: HttpClient::upstream(Duration::from_secs(2), Duration::from_secs(2)).unwrap(),
            config: Config::default(),
        })
    }

    fn session_for(url: &str, title: &str, ext: Option<&str>) -> StreamSession {
        StreamSession {
            upstream_url: url.to_string(),
            headers: HashMap::from([("x-relay-check".to_string(), "yes".to_string())]),
            cookies: HashMap::from([("sid".to_string(), "abc".to_string())]),
            title: title.to_string(),
            ext: ext.map(str::to_string),
        }
    }

    /// Serve a canned media response on an ephemeral local port.
    async fn spawn_upstream() -> SocketAddr {
        async fn media(headers: axum::http::HeaderMap) -> impl IntoResponse {
            // Echo back whether the proxy attached its credentials
            let saw_header = headers
                .get("x-relay-check")
                .is_some_and(|v| v == "yes");
            let saw_cookie = headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("sid=abc"));

            let mut response = axum::response::Response::new(Body::from("media-bytes"));
            let h = response.headers_mut();
            h.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("video/mp4"),
            );
            h.insert("content-encoding", HeaderValue::from_static("identity"));
            h.insert("x-upstream-marker", HeaderValue::from_static("1"));
            h.insert(
                "x-saw-credentials",
                HeaderValue::from_static(if saw_header && saw_cookie { "1" } else { "0" }),
            );
            response
        }

        let app = Router::new().route("/media.bin", get(media));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn unknown_handle_is_404_regardless_of_query() {
        let app = http_server::router(test_state());

        for uri in ["/stream/deadbeef", "/stream/deadbeef?dl=1"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);

            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let text = String::from_utf8(bytes.to_vec()).unwrap();
            assert!(text.contains("expired or invalid"), "body was: {text}");
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn relays_body_and_filters_framing_headers() {
        let addr = spawn_upstream().await;
        let state = test_state();
        let handle = state.cache.put(session_for(
            &format!("http://{addr}/media.bin"),
            "My Video",
            None,
        ));
        let app = http_server::router(state);

        let response = app
            .oneshot(
                Request::get(format!("/stream/{handle}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "video/mp4"
        );
        assert_eq!(response.headers().get("x-upstream-marker").unwrap(), "1");
        assert_eq!(response.headers().get("x-saw-credentials").unwrap(), "1");

        for name in EXCLUDED_HEADERS {
            assert!(
                response.headers().get(name).is_none(),
                "header {name} must be stripped"
            );
        }
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"media-bytes");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dl_flag_appends_attachment_disposition() {
        let addr = spawn_upstream().await;
        let state = test_state();
        let handle = state.cache.put(session_for(
            &format!("http://{addr}/media.bin"),
            "My Video",
            None,
        ));
        let app = http_server::router(state);

        let response = app
            .oneshot(
                Request::get(format!("/stream/{handle}?dl=1"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"My Video.mp4\""
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dl_is_only_truthy_when_exactly_one() {
        let addr = spawn_upstream().await;
        let state = test_state();
        let handle = state.cache.put(session_for(
            &format!("http://{addr}/media.bin"),
            "My Video",
            None,
        ));
        let app = http_server::router(state);

        for query in ["?dl=0", "?dl=true", "?dl=11", ""] {
            let response = app
                .clone()
                .oneshot(
                    Request::get(format!("/stream/{handle}{query}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert!(
                response.headers().get(header::CONTENT_DISPOSITION).is_none(),
                "query '{query}' must not force a download"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn repeated_fetches_are_equivalent() {
        let addr = spawn_upstream().await;
        let state = test_state();
        let handle = state.cache.put(session_for(
            &format!("http://{addr}/media.bin"),
            "My Video",
            None,
        ));
        let app = http_server::router(state);

        let mut seen = Vec::new();
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::get(format!("/stream/{handle}?dl=0"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            seen.push((
                response.status(),
                response.headers().get(header::CONTENT_TYPE).cloned(),
            ));
        }
        assert_eq!(seen[0], seen[1]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_upstream_is_500_plain_text() {
        let state = test_state();
        // Port 9 (discard) is essentially never listening locally
        let handle = state
            .cache
            .put(session_for("http://127.0.0.1:9/media.bin", "x", None));
        let app = http_server::router(state);

        let response = app
            .oneshot(
                Request::get(format!("/stream/{handle}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("Error proxying stream:"), "body was: {text}");
    }

    #[test]
    fn excluded_header_match_is_case_insensitive() {
        for name in ["Content-Length", "CONTENT-ENCODING", "Transfer-Encoding", "connection"] {
            let parsed: HeaderName = name.parse().unwrap();
            assert!(is_excluded(&parsed), "{name} must be excluded");
        }
        let kept: HeaderName = "content-type".parse().unwrap();
        assert!(!is_excluded(&kept));
    }

    #[test]
    fn attachment_filename_uses_session_ext_with_mp4_fallback() {
        let with_ext = session_for("http://u", "Clip", Some("webm"));
        assert_eq!(
            attachment_value(&with_ext),
            "attachment; filename=\"Clip.webm\""
        );

        let without_ext = session_for("http://u", "Clip", None);
        assert_eq!(
            attachment_value(&without_ext),
            "attachment; filename=\"Clip.mp4\""
        );
    }

    #[test]
    fn attachment_filename_strips_quotes_and_control_chars() {
        let tricky = session_for("http://u", "a\"b\r\nc", None);
        assert_eq!(attachment_value(&tricky), "attachment; filename=\"abc.mp4\"");
    }

    #[test]
    fn cookie_header_joins_pairs() {
        let single = HashMap::from([("sid".to_string(), "abc".to_string())]);
        assert_eq!(cookie_header(&single), "sid=abc");

        let pair = HashMap::from([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]);
        let joined = cookie_header(&pair);
        assert!(joined == "a=1; b=2" || joined == "b=2; a=1");
    }
}
