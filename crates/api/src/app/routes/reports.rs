use std::sync::Arc;

use axum::{Extension, Json, Router, response::IntoResponse, routing::get};

use tenantgate_auth::{RequestContext, RoleKey};

use crate::app::{errors, services::AppServices};

/// Roles allowed to read accounting reports.
pub const LEDGER_READERS: &[RoleKey] = &[RoleKey::Admin, RoleKey::Contador, RoleKey::Supervisor];

pub fn router() -> Router {
    Router::new().route("/ledger-access", get(ledger_access))
}

/// GET /reports/ledger-access
pub async fn ledger_access(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    match services.guard.require_role(&ctx, LEDGER_READERS).await {
        Ok(auth) => Json(serde_json::json!({
            "granted": true,
            "role_key": auth.role_key().as_str(),
        }))
        .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
