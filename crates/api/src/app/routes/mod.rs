use axum::{Router, routing::get};

pub mod admin;
pub mod auth;
pub mod reports;
pub mod system;

/// Router for all guarded (tenant-scoped) endpoints.
///
/// Each handler runs the guard check it needs; there is no blanket layer.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/admin", admin::router())
        .nest("/reports", reports::router())
}
