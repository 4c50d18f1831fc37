use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info};

use crate::services::{consent::ConsentClient, decrypt::ConsentDecryptor, jwt::JwtService};

/// Application state shared across requests. Needs to be thread-safe.
pub struct AppState {
    /// The PostgreSQL database connection pool.
    pub db_pool: PgPool,
    /// Client for the external consent manager.
    pub consent_client: ConsentClient,
    /// JWT service validating private route tokens.
    pub jwt_service: JwtService,
    /// Recovers consents from export payloads.
    pub decryptor: Arc<dyn ConsentDecryptor>,
    /// Public base URL of this gateway, used to build links handed to clients.
    pub connector_endpoint: String,
}

impl AppState {
    /// Creates a new application state with the provided services.
    ///
    /// # Arguments
    ///
    /// * `db_pool` - PostgreSQL database connection pool
    /// * `consent_client` - Client for the consent manager
    /// * `jwt_service` - Service for JWT token operations
    /// * `decryptor` - Signed consent decryption scheme
    /// * `connector_endpoint` - Public base URL of this gateway
    pub fn new(
        db_pool: PgPool,
        consent_client: ConsentClient,
        jwt_service: JwtService,
        decryptor: Arc<dyn ConsentDecryptor>,
        connector_endpoint: String,
    ) -> Self {
        info!("Initializing application state");
        debug!(
            consent_manager = %consent_client.base_url(),
            %connector_endpoint,
            "Consent gateway endpoints"
        );

        Self {
            db_pool,
            consent_client,
            jwt_service,
            decryptor,
            connector_endpoint,
        }
    }
}
