//! Invitation links handed to prospective tenant members.

use core::fmt::Display;

/// Base URL used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Environment variable that overrides [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "APP_BASE_URL";

/// Build `{base_url}/auth/accept-invite?tenant_id={tenant_id}`.
///
/// The tenant id is inserted verbatim; an empty `base_url` counts as unset.
pub fn invitation_link(base_url: Option<&str>, tenant_id: impl Display) -> String {
    let base = base_url
        .filter(|b| !b.is_empty())
        .unwrap_or(DEFAULT_BASE_URL);
    format!("{base}/auth/accept-invite?tenant_id={tenant_id}")
}

/// [`invitation_link`] with the base URL taken from `APP_BASE_URL`.
pub fn invitation_link_from_env(tenant_id: impl Display) -> String {
    invitation_link_from_lookup(|key| std::env::var(key).ok(), tenant_id)
}

/// [`invitation_link`] with the base URL read from `APP_BASE_URL` in an
/// arbitrary variable source.
pub fn invitation_link_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
    tenant_id: impl Display,
) -> String {
    let base = lookup(BASE_URL_ENV);
    invitation_link(base.as_deref(), tenant_id)
}
