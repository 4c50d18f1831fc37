//! # Public Handlers
//!
//! Unauthenticated routes called by other connectors and by the consent
//! manager itself. Unlike the private routes they answer with raw JSON.

mod export;
mod login;
mod template;

pub use export::*;
pub use login::*;
pub use template::*;

use serde::{Deserialize, Serialize};

/// Acknowledgement sent before the background part of an export or import runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Error body of the public routes.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
