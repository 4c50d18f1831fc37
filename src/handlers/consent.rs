//! # Private Consent Handlers
//!
//! Reads and writes consents through the consent manager on behalf of an
//! authenticated caller. All responses use the [`ApiResponse`] envelope.
//!
//! The consent manager identifies users in two ways:
//!
//! - the caller's own consent key, forwarded from the `x-user-key` header
//!   (`/me` routes, giving consent, triggering exchanges)
//! - the `user_identifier` stored on a local [`User`] record, looked up by
//!   internal id (`/users/{userId}` routes)

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, AppState, User};
use crate::utils::constant::{EMAIL_VALIDATION_REQUESTED, USER_KEY_HEADER};

/// Query parameters of [`give_consent`]
#[derive(Debug, Default, Deserialize)]
pub struct GiveConsentQuery {
    #[serde(rename = "triggerDataExchange")]
    pub trigger_data_exchange: Option<String>,
}

/// Query parameters of [`consent_data_exchange`]
#[derive(Debug, Default, Deserialize)]
pub struct DataExchangeQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Returns the caller's consent key, if the request carries one.
pub(crate) fn user_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_KEY_HEADER).and_then(|v| v.to_str().ok())
}

/// Gets the consents of the calling user.
///
/// GET /private/consent/me
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn get_my_consent(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<ApiResponse> {
    let response = state.consent_client.me(user_key(&headers)).await?;
    Ok(ApiResponse::ok(response))
}

/// Gets one consent of the calling user.
///
/// GET /private/consent/me/{id}
#[instrument(skip(state, headers), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn get_my_consent_by_id(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let response = state
        .consent_client
        .me_by_id(user_key(&headers), &id)
        .await?;
    Ok(ApiResponse::ok(response))
}

/// Gets the consents of a local user.
///
/// GET /private/consent/users/{userId}
///
/// # Returns
///
/// - `200 OK` - Consents as returned by the consent manager
/// - `404 Not Found` - No user with this internal id, or the user has no consent manager identifier
#[instrument(skip(state), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn get_user_consent(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse> {
    let identifier = resolve_user_identifier(&state, &user_id).await?;
    let response = state.consent_client.user_consent(&identifier).await?;
    Ok(ApiResponse::ok(response))
}

/// Gets one consent of a local user.
///
/// GET /private/consent/users/{userId}/{id}
#[instrument(skip(state), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn get_user_consent_by_id(
    State(state): State<Arc<AppState>>,
    Path((user_id, id)): Path<(String, String)>,
) -> AppResult<ApiResponse> {
    let identifier = resolve_user_identifier(&state, &user_id).await?;
    let response = state
        .consent_client
        .user_consent_by_id(&identifier, &id)
        .await?;
    Ok(ApiResponse::ok(response))
}

/// Gives consent for the calling user, forwarding the body untouched.
///
/// POST /private/consent?triggerDataExchange=true
///
/// When `triggerDataExchange` is `true` and the consent manager answered with
/// a consent rather than a pending `case` (such as
/// `email-validation-requested`), the data exchange for the new consent is
/// triggered before answering. The response is always the give-consent one.
///
/// A body that is not JSON answers `400 Bad Request` in the envelope.
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn give_consent(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<GiveConsentQuery>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<ApiResponse> {
    let Json(body) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let key = user_key(&headers);
    let response = state.consent_client.give_consent(key, &body).await?;

    if query.trigger_data_exchange.as_deref() == Some("true") {
        match pending_case(&response) {
            Some(case) => {
                info!(case, "Consent pending, data exchange not triggered");
            }
            None => match response.get("_id").and_then(Value::as_str) {
                Some(consent_id) => {
                    debug!(consent_id, "Triggering data exchange for new consent");
                    state.consent_client.data_exchange(key, consent_id).await?;
                }
                None => warn!("Consent response has no `_id`, data exchange not triggered"),
            },
        }
    }

    Ok(ApiResponse::ok(response))
}

/// Triggers the data exchange authorized by a consent.
///
/// POST /private/consent/data-exchange/{consentId}
///
/// The user key is the `x-user-key` header, or the consent manager identifier
/// of the local user named by the `userId` query parameter.
#[instrument(skip(state, headers), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn consent_data_exchange(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(consent_id): Path<String>,
    Query(query): Query<DataExchangeQuery>,
) -> AppResult<ApiResponse> {
    let identifier = match query.user_id.as_deref() {
        Some(user_id) => Some(resolve_user_identifier(&state, user_id).await?),
        None => None,
    };
    let key = identifier.as_deref().or_else(|| user_key(&headers));

    let response = state.consent_client.data_exchange(key, &consent_id).await?;
    Ok(ApiResponse::ok(response))
}

/// Returns the `case` of a give-consent response that did not produce a
/// consent yet. `null` and empty cases count as none.
fn pending_case(response: &Value) -> Option<&str> {
    match response.get("case") {
        None | Some(Value::Null) => None,
        Some(Value::String(case)) if case.is_empty() => None,
        Some(Value::String(case)) => Some(case.as_str()),
        Some(_) => Some(EMAIL_VALIDATION_REQUESTED),
    }
}

async fn resolve_user_identifier(state: &AppState, internal_id: &str) -> AppResult<String> {
    let Some(user) = User::find_by_internal_id(&state.db_pool, internal_id).await? else {
        error!(internal_id, "User not found");
        return Err(AppError::NotFound("User not found"));
    };

    user.user_identifier.ok_or_else(|| {
        error!(internal_id, "User has no userIdentifier");
        AppError::NotFound("User has no userIdentifier")
    })
}
