use axum::Json;
use tracing::{debug, instrument};

use super::MessageResponse;
use crate::utils::constant::TEMPLATE_MESSAGE;

/// Template endpoint showing the public route conventions. Does nothing.
///
/// GET /public/v1/template
#[instrument]
pub async fn public_template_method() -> Json<MessageResponse> {
    debug!("Template endpoint accessed");
    Json(MessageResponse {
        message: TEMPLATE_MESSAGE.to_string(),
        token: None,
    })
}
