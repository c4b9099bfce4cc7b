use std::sync::Arc;

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use tenantgate_auth::RequestContext;

use crate::app::{errors, services::AppServices};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /whoami - identity and role of the caller in the selected tenant
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    match services.guard.require_auth(&ctx).await {
        Ok(auth) => Json(serde_json::json!({
            "user_id": auth.user_id().to_string(),
            "tenant_id": auth.tenant_id().to_string(),
            "role_key": auth.role_key().as_str(),
        }))
        .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
