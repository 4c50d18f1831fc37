//! # Consent Manager Login
//!
//! Opens consent manager sessions for users and for this participant. A
//! user's consent manager account id is remembered on the local user record
//! the first time they log in.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use super::ErrorResponse;
use crate::error::PublicError;
use crate::models::{AppState, User};

pub const LOGIN_MISSING_PARAMS: &str = "Missing email or password from the request payload";

/// Request payload for logging a user in to the consent manager
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UserLoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Logs a user in to the consent manager.
///
/// POST /public/v1/consent/login
///
/// # Returns
///
/// - `200 OK` - Consent manager login response, passed through
/// - `400 Bad Request` - Missing or malformed email or password
/// - Upstream status and body when the consent manager rejects the login
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn consent_user_login(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, PublicError> {
    let payload = serde_json::from_slice::<UserLoginRequest>(&body)
        .ok()
        .filter(|p| p.validate().is_ok());
    let Some(payload) = payload else {
        warn!("Login request with missing credentials");
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: LOGIN_MISSING_PARAMS.to_string(),
            }),
        )
            .into_response());
    };

    let response = state
        .consent_client
        .user_login(&payload.email, &payload.password)
        .await?;

    if let Some(consent_id) = response.get("_id").and_then(Value::as_str) {
        remember_consent_id(&state, &payload.email, consent_id).await;
    }

    info!("User logged in to consent manager");
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Stores the consent manager id on the local user unless it already has one.
/// The login has succeeded upstream by then, so failures are only logged.
async fn remember_consent_id(state: &AppState, email: &str, consent_id: &str) {
    let user = match User::find_by_email(&state.db_pool, email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("No local user for login email");
            return;
        }
        Err(e) => {
            error!(error = %e, "Failed to look up user after login");
            return;
        }
    };

    if user.consent_id.is_some() {
        debug!(internal_id = %user.internal_id, "Consent id already set");
        return;
    }

    match User::set_consent_id_if_absent(&state.db_pool, email, consent_id).await {
        Ok(true) => info!(internal_id = %user.internal_id, consent_id, "Stored consent id on user"),
        Ok(false) => debug!(
            internal_id = %user.internal_id,
            "Consent id set concurrently, left unchanged"
        ),
        Err(e) => error!(error = %e, "Failed to store consent id on user"),
    }
}

/// Logs this gateway in to the consent manager as a participant.
///
/// POST /public/v1/consent/participant/login
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn consent_participant_login(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, PublicError> {
    let response = state.consent_client.participant_login().await?;
    info!("Participant logged in to consent manager");
    Ok(Json(response))
}
