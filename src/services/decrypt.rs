//! # Signed Consent Decryption
//!
//! Exported consents arrive as a signed JWT (`signedConsent`) together with
//! the key material needed to verify it (`encrypted`). The trait lets the
//! gateway swap the unwrapping scheme without touching the handlers.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum DecryptError {
    #[error("consent key is not valid base64: {0}")]
    Key(#[from] base64::DecodeError),
    #[error("signed consent is invalid: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Consent payload recovered from a signed consent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptedConsent {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Recovers the consent carried by an export request.
#[async_trait]
pub trait ConsentDecryptor: Send + Sync {
    /// # Errors
    ///
    /// Returns [`DecryptError`] if the key cannot be read or the signature
    /// does not verify.
    async fn decrypt(
        &self,
        signed_consent: &str,
        encrypted: &str,
    ) -> Result<DecryptedConsent, DecryptError>;
}

/// Verifies HS256-signed consents whose signing key is sent base64-encoded
/// in `encrypted`.
///
/// Consents carry no expiry, so only the signature is checked.
pub struct JwtConsentDecryptor;

#[async_trait]
impl ConsentDecryptor for JwtConsentDecryptor {
    #[instrument(skip_all, fields(consent_length = signed_consent.len()))]
    async fn decrypt(
        &self,
        signed_consent: &str,
        encrypted: &str,
    ) -> Result<DecryptedConsent, DecryptError> {
        let key = STANDARD.decode(encrypted.trim())?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let data = decode::<DecryptedConsent>(
            signed_consent,
            &DecodingKey::from_secret(&key),
            &validation,
        )?;
        debug!(consent_id = %data.claims.id, "Signed consent verified");
        Ok(data.claims)
    }
}
