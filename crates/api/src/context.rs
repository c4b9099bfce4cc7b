//! Building the guard's [`RequestContext`] from HTTP headers.

use axum::http::{HeaderMap, header};

use tenantgate_auth::RequestContext;
use tenantgate_core::TenantId;

/// Cookie carrying the access token for browser clients.
pub const SESSION_COOKIE: &str = "tg-session";

/// Header selecting the tenant a request acts within.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Extract credential and tenant selection.
///
/// The bearer header wins over the session cookie. A tenant header that does
/// not parse is treated as absent.
pub fn request_context_from_headers(headers: &HeaderMap) -> RequestContext {
    let credential = bearer_token(headers).or_else(|| session_cookie(headers));
    let tenant_id = headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<TenantId>().ok());

    RequestContext::new(credential, tenant_id)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
