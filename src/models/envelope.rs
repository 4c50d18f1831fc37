use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON envelope returned by every private consent route.
///
/// Serialized as `{"status": <code>, "data": <payload>}`; the HTTP status of
/// the response matches `status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            data,
        }
    }

    pub fn with_status(status: StatusCode, data: Value) -> Self {
        Self {
            status: status.as_u16(),
            data,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
