//! # Privacy Notice Handlers
//!
//! Privacy notices describe the processing a data exchange involves and are
//! what a user consents to.

use std::sync::Arc;

use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::AppResult;
use crate::models::{ApiResponse, AppState};

/// Gets the privacy notices that apply between a provider and a consumer.
///
/// GET /private/consent/{userId}/{providerSd}/{consumerSd}
///
/// `providerSd` and `consumerSd` are the base64 encoded self-description
/// URLs of the two participants.
#[instrument(skip(state), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn get_user_privacy_notices(
    State(state): State<Arc<AppState>>,
    Path((user_id, provider_sd, consumer_sd)): Path<(String, String, String)>,
) -> AppResult<ApiResponse> {
    let response = state
        .consent_client
        .privacy_notices(&user_id, &provider_sd, &consumer_sd)
        .await?;
    Ok(ApiResponse::ok(response))
}

/// GET /private/consent/{userId}/privacy-notices/{privacyNoticeId}
#[instrument(skip(state), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn get_user_privacy_notice_by_id(
    State(state): State<Arc<AppState>>,
    Path((user_id, privacy_notice_id)): Path<(String, String)>,
) -> AppResult<ApiResponse> {
    let response = state
        .consent_client
        .privacy_notice_by_id(&user_id, &privacy_notice_id)
        .await?;
    Ok(ApiResponse::ok(response))
}
