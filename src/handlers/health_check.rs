use axum::http::StatusCode;
use tracing::{debug, instrument};

/// Liveness probe for load balancers and orchestrators.
///
/// GET /health-check
///
/// Does not reach the database or the consent manager; always `200 OK` with
/// an empty body while the process is serving requests.
#[instrument]
pub async fn health_check() -> StatusCode {
    debug!("Health check endpoint accessed");
    StatusCode::OK
}
