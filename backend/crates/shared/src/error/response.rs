//! HTTP rendering of [`AppError`] (feature `axum`)
//!
//! Bodies follow RFC 7807 problem details. Server errors carry a generic
//! `detail`; the real message stays in the logs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use super::app_error::AppError;

impl AppError {
    /// Problem details body for this error
    pub fn problem(&self) -> Value {
        json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.public_message(),
            "action": self.action(),
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.problem())).into_response()
    }
}
