//! Administrator-only endpoints.

use std::sync::Arc;

use axum::{Extension, Json, Router, response::IntoResponse, routing::get};

use tenantgate_auth::{RequestContext, invitation_link};

use crate::app::{errors, services::AppServices};

pub fn router() -> Router {
    Router::new().route("/invitation-link", get(get_invitation_link))
}

/// GET /admin/invitation-link - invitation URL for the caller's tenant
pub async fn get_invitation_link(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    let auth = match services.guard.require_admin(&ctx).await {
        Ok(a) => a,
        Err(e) => return errors::auth_error_to_response(e),
    };

    let link = invitation_link(Some(services.config.base_url.as_str()), auth.tenant_id());
    tracing::info!(tenant_id = %auth.tenant_id(), user_id = %auth.user_id(), "invitation link generated");

    Json(serde_json::json!({
        "tenant_id": auth.tenant_id().to_string(),
        "link": link,
    }))
    .into_response()
}
