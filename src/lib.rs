//! # Consent Gateway
//!
//! HTTP gateway between an API front door and an external consent manager.
//! Private routes read and give consents for authenticated callers; public
//! routes let other connectors export and import consents and open consent
//! manager sessions.
//!
//! ## Modules
//!
//! - [`config`] - Environment based configuration
//! - [`handlers`] - HTTP request handlers, one per endpoint
//! - [`middleware`] - Bearer token authentication for private routes
//! - [`models`] - Shared state, user records and the response envelope
//! - [`services`] - Consent manager client, consent decryption, JWT
//! - [`utils`] - Constants and small helpers

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::handlers::public::{
    consent_participant_login, consent_user_login, export_consent, import_consent,
    public_template_method,
};
use crate::handlers::{
    consent_data_exchange, get_available_exchanges, get_my_consent, get_my_consent_by_id,
    get_user_consent, get_user_consent_by_id, get_user_privacy_notice_by_id,
    get_user_privacy_notices, give_consent, health_check,
};
use crate::middleware::auth_middleware;
use crate::models::AppState;
use crate::services::consent::{ConsentClient, ConsentError};
use crate::services::decrypt::{ConsentDecryptor, JwtConsentDecryptor};
use crate::services::jwt::JwtService;

/// Creates an Axum router with the default consent decryption scheme.
///
/// This is a convenience function that calls [`app_with_decryptor`] with no
/// custom decryptor, so signed consents are verified by [`JwtConsentDecryptor`].
#[inline]
pub fn app(db_pool: PgPool, config: AppConfig) -> Result<Router, ConsentError> {
    app_with_decryptor(db_pool, config, None)
}

/// Creates an Axum router with application routes and state.
///
/// # Arguments
///
/// * `db_pool` - PostgreSQL database connection pool holding the `users` table
/// * `config` - Gateway configuration, see [`AppConfig::from_env`]
/// * `decryptor` - Optional custom decryption scheme for exported consents
///
/// # Errors
///
/// Returns [`ConsentError::Http`] if the consent manager HTTP client cannot be built.
pub fn app_with_decryptor(
    db_pool: PgPool,
    config: AppConfig,
    decryptor: Option<Arc<dyn ConsentDecryptor>>,
) -> Result<Router, ConsentError> {
    let decryptor = decryptor.unwrap_or_else(|| Arc::new(JwtConsentDecryptor));

    let consent_client = ConsentClient::new(
        config.consent_manager_url,
        config.participant,
        config.consent_timeout,
    )?;
    let jwt_service = JwtService::from_secret(config.jwt_secret.as_bytes());

    let state = Arc::new(AppState::new(
        db_pool,
        consent_client,
        jwt_service,
        decryptor,
        config.connector_endpoint,
    ));

    let private_routes = Router::new()
        .route("/private/consent", post(give_consent))
        .route("/private/consent/me", get(get_my_consent))
        .route("/private/consent/me/{id}", get(get_my_consent_by_id))
        .route("/private/consent/users/{userId}", get(get_user_consent))
        .route(
            "/private/consent/users/{userId}/{id}",
            get(get_user_consent_by_id),
        )
        .route(
            "/private/consent/data-exchange/{consentId}",
            post(consent_data_exchange),
        )
        .route(
            "/private/consent/exchanges/{as}",
            get(get_available_exchanges),
        )
        .route(
            "/private/consent/{userId}/privacy-notices/{privacyNoticeId}",
            get(get_user_privacy_notice_by_id),
        )
        .route(
            "/private/consent/{userId}/{providerSd}/{consumerSd}",
            get(get_user_privacy_notices),
        )
        .route_layer(from_fn_with_state(Arc::clone(&state), auth_middleware));

    let public_routes = Router::new()
        .route("/health-check", get(health_check))
        .route("/public/v1/template", get(public_template_method))
        .route("/public/v1/consent/export", post(export_consent))
        .route("/public/v1/consent/import", post(import_consent))
        .route("/public/v1/consent/login", post(consent_user_login))
        .route(
            "/public/v1/consent/participant/login",
            post(consent_participant_login),
        );

    info!("Consent gateway routes configured");

    Ok(Router::new()
        .merge(public_routes)
        .merge(private_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
