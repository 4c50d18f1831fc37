//! # Application Constants
//!
//! Defaults and fixed strings used by the gateway.

use std::time::Duration;

/// Timeout applied to every call made to the consent manager
/// when `CONSENT_TIMEOUT_SECS` is not set.
pub const DEFAULT_CONSENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Address the binary listens on when `BIND_ADDRESS` is not set.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8090";

/// Header carrying the user's consent manager key.
///
/// Forwarded verbatim on every user-scoped consent manager call.
pub const USER_KEY_HEADER: &str = "x-user-key";

/// `case` value the consent manager returns when consent is on hold
/// until the user confirms their email address.
pub const EMAIL_VALIDATION_REQUESTED: &str = "email-validation-requested";

/// Placeholder left in computed privacy notice links when the caller
/// did not say which user they are for.
pub const USER_ID_PLACEHOLDER: &str = "{userId}";

pub const EXPORT_MISSING_PARAMS: &str = "Missing body params from the request payload";
pub const IMPORT_MISSING_PARAMS: &str = "missing params from request payload";
pub const TEMPLATE_MESSAGE: &str = "This is a public template method, it doesn't do anything";

/// Expiration time for private route access tokens
pub const ACCESS_TOKEN_EXPIRY: Duration = Duration::from_secs(15 * 60);
