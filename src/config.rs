//! # Gateway Configuration
//!
//! All settings come from environment variables (optionally seeded from a
//! `.env` file by the binary). Credentials may instead be read from files
//! named by the matching `*_FILE` variable.
//!
//! ## Environment Variables
//!
//! - `CONSENT_MANAGER_URL` - Base URL of the consent manager
//! - `CONNECTOR_ENDPOINT` - Public base URL of this gateway, used in computed links
//! - `PARTICIPANT_CLIENT_ID` / `PARTICIPANT_CLIENT_ID_FILE` - Participant credentials
//! - `PARTICIPANT_CLIENT_SECRET` / `PARTICIPANT_CLIENT_SECRET_FILE` - Participant credentials
//! - `JWT_SECRET` / `JWT_SECRET_FILE` - Key for private route bearer tokens
//! - `CONSENT_TIMEOUT_SECS` - Upstream request timeout, defaults to 10 seconds

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::utils::constant::DEFAULT_CONSENT_TIMEOUT;
use crate::utils::secret::get_secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("env variable `{0}` should be set")]
    Missing(&'static str),
    #[error("env variable `{name}` is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Participant credentials used to open a consent manager session.
#[derive(Clone)]
pub struct ParticipantCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ParticipantCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Runtime configuration of the gateway.
#[derive(Clone)]
pub struct AppConfig {
    pub consent_manager_url: String,
    pub connector_endpoint: String,
    pub participant: ParticipantCredentials,
    pub jwt_secret: String,
    pub consent_timeout: Duration,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("consent_manager_url", &self.consent_manager_url)
            .field("connector_endpoint", &self.connector_endpoint)
            .field("participant", &self.participant)
            .field("consent_timeout", &self.consent_timeout)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when a required variable is absent and
    /// [`ConfigError::Invalid`] when `CONSENT_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let consent_manager_url = required("CONSENT_MANAGER_URL")?;
        let connector_endpoint = required("CONNECTOR_ENDPOINT")?;

        let client_id = get_secret("PARTICIPANT_CLIENT_ID_FILE", "PARTICIPANT_CLIENT_ID")
            .ok_or(ConfigError::Missing("PARTICIPANT_CLIENT_ID"))?;
        let client_secret =
            get_secret("PARTICIPANT_CLIENT_SECRET_FILE", "PARTICIPANT_CLIENT_SECRET")
                .ok_or(ConfigError::Missing("PARTICIPANT_CLIENT_SECRET"))?;
        let jwt_secret =
            get_secret("JWT_SECRET_FILE", "JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let consent_timeout = match env::var("CONSENT_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "CONSENT_TIMEOUT_SECS",
                    value,
                })?,
            Err(_) => DEFAULT_CONSENT_TIMEOUT,
        };

        let config = Self {
            consent_manager_url,
            connector_endpoint,
            participant: ParticipantCredentials {
                client_id,
                client_secret,
            },
            jwt_secret,
            consent_timeout,
        };
        debug!(?config, "Loaded configuration from environment");
        Ok(config)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}
