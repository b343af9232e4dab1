use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Request-level failures surfaced by the HTTP API.
///
/// The info endpoint answers with a `{"error": ...}` JSON body; the stream
/// endpoint answers in plain text, matching what a `<video>` element or a
/// download dialog can actually display.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body carried no usable `url` field.
    #[error("No URL provided")]
    BadRequest,
    /// The extractor resolved the URL but produced zero entries.
    #[error("No video found")]
    NoVideoFound,
    /// The extractor itself failed; carries its message verbatim.
    #[error("{0}")]
    Extraction(String),
    /// Stream handle not present in the session cache.
    #[error("Video link expired or invalid")]
    UnknownHandle,
    /// The upstream media fetch failed before any bytes were relayed.
    #[error("Error proxying stream: {0}")]
    Proxy(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NoVideoFound | Self::UnknownHandle => StatusCode::NOT_FOUND,
            Self::Extraction(_) | Self::Proxy(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::UnknownHandle | Self::Proxy(_) => (status, self.to_string()).into_response(),
            _ => (
                status,
                Json(ErrorBody {
                    error: self.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::BadRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NoVideoFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::UnknownHandle.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Extraction("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Proxy("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn extraction_error_keeps_adapter_message() {
        let err = ApiError::Extraction("ERROR: unsupported URL".into());
        assert_eq!(err.to_string(), "ERROR: unsupported URL");
    }

    #[test]
    fn json_variants_serialize_as_error_object() {
        let body = serde_json::to_value(ErrorBody {
            error: ApiError::BadRequest.to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"error": "No URL provided"}));
    }
}
