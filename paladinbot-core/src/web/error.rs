use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

/// JSON error returned by every route.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: u32,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status_code: u32,
    timestamp: i64,
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    status_code: u16,
    error: String,
    error_code: u32,
}

impl ApiError {
    fn new(status: StatusCode, code: u32, title: &str, detail: impl AsRef<str>) -> Self {
        let detail = detail.as_ref();
        let message = if detail.is_empty() {
            title.to_string()
        } else {
            format!("{}: {}", title, detail)
        };
        Self { status, code, message }
    }

    pub fn bad_request(detail: impl AsRef<str>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, 10404, "Bad Request", detail)
    }

    pub fn forbidden(detail: impl AsRef<str>) -> Self {
        Self::new(StatusCode::FORBIDDEN, 10403, "Insufficient Permissions", detail)
    }

    pub fn not_found(detail: impl AsRef<str>) -> Self {
        Self::new(StatusCode::NOT_FOUND, 10440, "Not Found", detail)
    }

    pub fn internal(detail: impl AsRef<str>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, 10500, "Internal Server Error", detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> u32 {
        self.code
    }
}

impl From<crate::Error> for ApiError {
    fn from(e: crate::Error) -> Self {
        error!("request failed: {}", e);
        ApiError::internal("")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status_code: self.code,
            timestamp: chrono::Utc::now().timestamp(),
            error: ErrorDetail {
                status_code: self.status.as_u16(),
                error: self.message,
                error_code: self.code,
            },
        };
        (self.status, Json(body)).into_response()
    }
}
