use axum::{extract::Request, middleware::Next, response::Response};

use crate::context::request_context_from_headers;

/// Attach a [`tenantgate_auth::RequestContext`] to every request.
///
/// This never rejects: handlers decide which guard check applies.
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let ctx = request_context_from_headers(req.headers());
    req.extensions_mut().insert(ctx);
    next.run(req).await
}
