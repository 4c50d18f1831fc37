//! # Consent Export and Import
//!
//! Both endpoints acknowledge the caller first and finish their work in a
//! background task, so the remote side is never kept waiting on a third
//! party. Failures after the acknowledgement can only be logged.
//!
//! - **Export**: a consumer presents a signed consent; the gateway generates an
//!   access token, returns it, then decrypts the consent and registers the
//!   token with the consent manager under the consent id.
//! - **Import**: the gateway forwards a signed consent to the export endpoint
//!   of the data provider named in the payload.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Instrument, debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::{ErrorResponse, MessageResponse};
use crate::models::AppState;
use crate::services::consent::{ConsentError, DataRequest};
use crate::services::decrypt::DecryptError;
use crate::utils::constant::{EXPORT_MISSING_PARAMS, IMPORT_MISSING_PARAMS};

/// Request payload of [`export_consent`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConsentRequest {
    #[validate(length(min = 1))]
    pub signed_consent: String,
    #[validate(length(min = 1))]
    pub encrypted: String,
}

/// Request payload of [`import_consent`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportConsentRequest {
    #[validate(length(min = 1))]
    pub data_provider_endpoint: String,
    #[validate(length(min = 1))]
    pub signed_consent: String,
    #[validate(length(min = 1))]
    pub encrypted: String,
}

#[derive(Debug, Error)]
enum ExportError {
    #[error(transparent)]
    Decrypt(#[from] DecryptError),
    #[error(transparent)]
    Consent(#[from] ConsentError),
}

/// Parses and validates a JSON body, `None` when it is malformed or incomplete.
fn parse_payload<T>(body: &Bytes) -> Option<T>
where
    T: for<'de> Deserialize<'de> + Validate,
{
    let payload: T = serde_json::from_slice(body).ok()?;
    payload.validate().ok()?;
    Some(payload)
}

fn missing_params(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Exports a consent to this gateway acting as data provider.
///
/// POST /public/v1/consent/export
///
/// # Returns
///
/// - `200 OK` with `{"message": "OK", "token"}` - Token generated, registration runs in background
/// - `400 Bad Request` - `signedConsent` or `encrypted` missing
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn export_consent(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(payload) = parse_payload::<ExportConsentRequest>(&body) else {
        warn!("Export request without signed consent");
        return missing_params(EXPORT_MISSING_PARAMS);
    };

    let token = Uuid::new_v4().to_string();
    debug!("Generated access token for exported consent");

    let background_token = token.clone();
    tokio::spawn(
        async move {
            if let Err(e) = register_access_token(&state, &payload, &background_token).await {
                error!(error = %e, "Consent export failed after acknowledgement");
            }
        }
        .in_current_span(),
    );

    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "OK".into(),
            token: Some(token),
        }),
    )
        .into_response()
}

async fn register_access_token(
    state: &AppState,
    payload: &ExportConsentRequest,
    token: &str,
) -> Result<(), ExportError> {
    let consent = state
        .decryptor
        .decrypt(&payload.signed_consent, &payload.encrypted)
        .await?;

    state
        .consent_client
        .post_access_token(&consent.id, token)
        .await?;
    info!(consent_id = %consent.id, "Access token registered for exported consent");
    Ok(())
}

/// Imports a consent by forwarding it to the data provider.
///
/// POST /public/v1/consent/import
///
/// # Returns
///
/// - `200 OK` with `{"message": "OK"}` - Forwarding runs in background
/// - `400 Bad Request` - `dataProviderEndpoint`, `signedConsent` or `encrypted` missing
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn import_consent(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(payload) = parse_payload::<ImportConsentRequest>(&body) else {
        warn!("Import request with missing params");
        return missing_params(IMPORT_MISSING_PARAMS);
    };

    let request = DataRequest {
        data_provider_endpoint: payload.data_provider_endpoint,
        signed_consent: payload.signed_consent,
        encrypted: payload.encrypted,
    };
    tokio::spawn(
        async move {
            match state.consent_client.post_data_request(&request).await {
                Ok(_) => info!("Consent forwarded to data provider"),
                Err(e) => error!(error = %e, "Consent import failed after acknowledgement"),
            }
        }
        .in_current_span(),
    );

    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "OK".into(),
            token: None,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_payload_requires_both_fields() {
        let ok = Bytes::from_static(br#"{"signedConsent": "jwt", "encrypted": "key"}"#);
        assert!(parse_payload::<ExportConsentRequest>(&ok).is_some());

        let invalid: [&[u8]; 5] = [
            br#"{"signedConsent": "jwt"}"#,
            br#"{"signedConsent": "", "encrypted": "key"}"#,
            br#"{}"#,
            b"",
            b"not json",
        ];
        for body in invalid {
            let body = Bytes::copy_from_slice(body);
            assert!(parse_payload::<ExportConsentRequest>(&body).is_none());
        }
    }

    #[test]
    fn import_payload_requires_provider_endpoint() {
        let body = Bytes::from_static(br#"{"signedConsent": "jwt", "encrypted": "key"}"#);
        assert!(parse_payload::<ImportConsentRequest>(&body).is_none());
    }
}
