use axum::body::to_bytes;
use axum::extract::multipart::MultipartError;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::predict::PredictError;
use crate::upload::UploadError;
use crate::validate::Rejection;

/// Everything `/predict` can fail with. Always rendered as `{"error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error("failed to store upload")]
    Storage(#[source] std::io::Error),
    #[error("{0}")]
    Internal(String),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Multipart(err) => Self::Multipart(err),
            UploadError::Io(err) => Self::Storage(err),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::Multipart(err) => err.status(),
            Self::Predict(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "prediction failed");
        } else {
            tracing::warn!(error = %self, %status, "upload rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Rewrites error responses produced outside the handlers, such as the body
/// limit's 413, into the `{"error": ...}` shape.
pub async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let message = match to_bytes(response.into_body(), 64 * 1024).await {
        Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).into_owned(),
        _ => status.canonical_reason().unwrap_or("request failed").to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
}
