//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`sv_core::Error`] so that route handlers
//! can return `Result<T, AppError>` and use `?` on library calls.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::middleware::request_id::current_request_id;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: sv_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: sv_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn inner(&self) -> &sv_core::Error {
        &self.inner
    }
}

impl From<sv_core::Error> for AppError {
    fn from(e: sv_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let request_id = self.request_id.or_else(current_request_id);
        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.code(),
            "request_id": request_id,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if let sv_core::Error::RangeNotSatisfiable { size } = self.inner {
            if let Ok(v) = HeaderValue::from_str(&format!("bytes */{size}")) {
                response.headers_mut().insert(header::CONTENT_RANGE, v);
            }
        }
        response
    }
}
