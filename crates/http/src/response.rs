//! Success bodies shared by JSON endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{"status": "<message>"}` with an explicit status code.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    code: StatusCode,
    message: &'static str,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a str,
}

impl StatusMessage {
    pub const fn new(code: StatusCode, message: &'static str) -> Self {
        Self { code, message }
    }

    pub const fn ok(message: &'static str) -> Self {
        Self::new(StatusCode::OK, message)
    }

    pub const fn created(message: &'static str) -> Self {
        Self::new(StatusCode::CREATED, message)
    }
}

impl IntoResponse for StatusMessage {
    fn into_response(self) -> Response {
        (
            self.code,
            Json(StatusBody {
                status: self.message,
            }),
        )
            .into_response()
    }
}
