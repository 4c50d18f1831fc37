//! # Centralized Error Handling
//!
//! Every failure a handler can hit ends up as an [`AppError`]. The error is
//! logged once, here, with its source chain, and then turned into a response:
//!
//! - private routes answer with the [`ApiResponse`] envelope (`AppError` itself)
//! - public routes answer with raw JSON ([`PublicError`])
//!
//! Consent manager failures keep the upstream status and body. Unreadable
//! bodies and refused path parameters are `400`; anything else becomes a
//! generic `500`.

use std::error::Error as _;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ApiResponse;
use crate::services::consent::ConsentError;

/// Central application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error")]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Consent(#[from] ConsentError),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Logs the error and returns the status and payload to send back.
    fn into_parts(self) -> (StatusCode, Value) {
        let source = self.source().map(ToString::to_string);

        match self {
            AppError::Db(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Value::String("Database error".into()),
                )
            }
            AppError::Consent(ConsentError::Upstream {
                endpoint,
                status,
                body,
            }) => {
                error!(%endpoint, status, %body, "Consent manager request failed");
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, body)
            }
            AppError::Consent(e @ ConsentError::InvalidPathSegment(_)) => {
                warn!(error = %e, "Rejected path parameter");
                (StatusCode::BAD_REQUEST, Value::String(e.to_string()))
            }
            AppError::Consent(e) => {
                error!(error = %e, ?source, "Consent manager request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Value::String(e.to_string()),
                )
            }
            AppError::NotFound(msg) => {
                warn!(message = msg, "Resource not found");
                (StatusCode::NOT_FOUND, Value::String(msg.into()))
            }
            AppError::BadRequest(msg) => {
                warn!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, Value::String(msg))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, data) = self.into_parts();
        ApiResponse::with_status(status, data).into_response()
    }
}

/// [`AppError`] rendered for the public routes: the upstream body as is, or
/// `{"error": message}`.
#[derive(Debug)]
pub struct PublicError(pub AppError);

impl From<AppError> for PublicError {
    fn from(e: AppError) -> Self {
        PublicError(e)
    }
}

impl From<ConsentError> for PublicError {
    fn from(e: ConsentError) -> Self {
        PublicError(e.into())
    }
}

impl IntoResponse for PublicError {
    fn into_response(self) -> Response {
        let (status, data) = self.0.into_parts();
        let body = match data {
            Value::String(message) => json!({ "error": message }),
            other => other,
        };
        (status, Json(body)).into_response()
    }
}

/// Convenience Result type alias that uses AppError as the error type.
pub type AppResult<T> = Result<T, AppError>;
