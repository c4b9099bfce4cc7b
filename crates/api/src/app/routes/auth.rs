//! Post-authentication callback.
//!
//! The hosted sign-in flow (email link, OAuth) lands here with a one-time
//! `code`. The exchange outcome never changes where we send the browser: the
//! reset-password page runs its own session check and shows the error.

use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::{Query, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header, uri::Authority},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;

use tenantgate_auth::{Session, SessionProvider};

use crate::app::services::AppServices;
use crate::config::AppConfig;
use crate::context::SESSION_COOKIE;

pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

pub fn router() -> Router {
    Router::new().route("/callback", get(callback))
}

/// GET /auth/callback?code=...
pub async fn callback(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    // An unreadable query string counts as "no code"; the redirect still happens.
    let code = query.ok().and_then(|Query(q)| q.code);
    let session = match code.as_deref().filter(|c| !c.is_empty()) {
        // Failure is deliberately dropped; see module docs.
        Some(code) => services
            .guard
            .sessions()
            .exchange_code_for_session(code)
            .await
            .ok(),
        None => None,
    };

    let origin = request_origin(&headers, &services.config);
    let location = HeaderValue::from_str(&format!("{origin}{RESET_PASSWORD_PATH}"))
        .or_else(|_| HeaderValue::from_str(&format!("{}{RESET_PASSWORD_PATH}", services.config.base_url)))
        .unwrap_or_else(|_| HeaderValue::from_static(RESET_PASSWORD_PATH));

    let mut response = (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response();
    if let Some(session) = session {
        if let Ok(cookie) = HeaderValue::from_str(&session_cookie(&session, origin.starts_with("https://"))) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
    }
    response
}

/// Origin the browser used to reach us.
///
/// `PUBLIC_ORIGIN` pins it; otherwise `Host` plus `X-Forwarded-Proto`, and
/// finally the configured base URL. `Host` is only used when it is a bare
/// `host[:port]` authority.
fn request_origin(headers: &HeaderMap, config: &AppConfig) -> String {
    if let Some(origin) = &config.public_origin {
        return origin.clone();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .and_then(|h| h.parse::<Authority>().ok())
        .filter(|a| !a.as_str().contains('@'));

    match host {
        Some(host) => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|s| *s == "http" || *s == "https")
                .unwrap_or("http");
            format!("{scheme}://{host}")
        }
        None => config.base_url.clone(),
    }
}

fn session_cookie(session: &Session, secure: bool) -> String {
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    let mut cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        session.access_token
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
