//! # Authentication Middleware
//!
//! Guards the private consent routes. Requests must carry a bearer token
//! issued by [`JwtService`](crate::services::jwt::JwtService).

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::{Span, debug, field, instrument, trace, warn};

use crate::models::AppState;

/// Authentication middleware for protecting routes
///
/// # Authentication Flow
///
/// 1. Extracts `Authorization` header with `Bearer <token>` format
/// 2. Validates the JWT token signature and expiration
/// 3. Records the token subject on the request span, so handler logs name
///    the caller
///
/// # Returns
///
/// - **Success**: Continues to next handler
/// - **Failure**: Returns `401 Unauthorized` for invalid/missing tokens
#[instrument(
    skip_all,
    fields(
        method = %req.method(),
        uri = %req.uri(),
        request_id = %uuid::Uuid::new_v4(),
        subject = field::Empty
    )
)]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    trace!("Processing authentication middleware");

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok());

    let Some(auth_header) = auth_header else {
        warn!("Missing Authorization header");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        warn!("Invalid Authorization header format");
        return Err(StatusCode::UNAUTHORIZED);
    };
    trace!("Extracted bearer token from Authorization header");

    match state.jwt_service.validate_access_token(token) {
        Ok(claims) => {
            Span::current().record("subject", claims.sub.as_str());
            debug!("Authentication successful");
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!(error = %e, "Token validation failed");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
