//! # Available Exchanges Handler
//!
//! Lists the exchanges this participant takes part in and points each one at
//! the privacy notices route of this gateway, so clients can go straight from
//! an exchange to the notices a user has to consent to.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::AppResult;
use crate::models::{ApiResponse, AppState};
use crate::utils::constant::USER_ID_PLACEHOLDER;
use crate::utils::url::join_url;

#[derive(Debug, Default, Deserialize)]
pub struct ExchangesQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Gets the available exchanges seen from `as` (`provider` or `consumer`).
///
/// GET /private/consent/exchanges/{as}?userId=
///
/// Each exchange gains a `privacyNoticeEndpoint` link. Without `userId` the
/// link keeps a literal `{userId}` placeholder.
#[instrument(skip(state), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn get_available_exchanges(
    State(state): State<Arc<AppState>>,
    Path(role): Path<String>,
    Query(query): Query<ExchangesQuery>,
) -> AppResult<ApiResponse> {
    let mut response = state.consent_client.available_exchanges(&role).await?;

    attach_privacy_notice_endpoints(
        &mut response,
        &role,
        query.user_id.as_deref(),
        &state.connector_endpoint,
    );

    Ok(ApiResponse::ok(response))
}

/// Adds `privacyNoticeEndpoint` to every entry of `response.exchanges`.
///
/// The participant's own self-description fills the provider slot when
/// `role` is `provider` and the consumer slot when `role` is `consumer`; the
/// other slot is the exchange's self-description.
pub fn attach_privacy_notice_endpoints(
    response: &mut Value,
    role: &str,
    user_id: Option<&str>,
    connector_endpoint: &str,
) {
    let participant_sd = response
        .pointer("/participant/base64SelfDescription")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let Some(exchanges) = response.get_mut("exchanges").and_then(Value::as_array_mut) else {
        debug!("Response has no exchanges to link");
        return;
    };

    let user = user_id.unwrap_or(USER_ID_PLACEHOLDER);
    for exchange in exchanges.iter_mut() {
        let exchange_sd = exchange
            .get("base64SelfDescription")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let provider_sd = if role == "provider" {
            participant_sd.as_str()
        } else {
            exchange_sd
        };
        let consumer_sd = if role == "consumer" {
            participant_sd.as_str()
        } else {
            exchange_sd
        };

        let endpoint = join_url(
            connector_endpoint,
            &format!("private/consent/{user}/{provider_sd}/{consumer_sd}"),
        );

        if let Some(fields) = exchange.as_object_mut() {
            fields.insert("privacyNoticeEndpoint".into(), Value::String(endpoint));
        }
    }
}
