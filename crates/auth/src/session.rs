//! Session provider contract.
//!
//! The provider is the only component that interprets credentials. Callers
//! hand it an opaque credential string (bearer token or cookie value).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use tenantgate_core::UserId;

/// Identity resolved from a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: UserId,
    pub email: Option<String>,
}

/// A freshly established session (result of a code exchange).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("exchange code is unknown or already used")]
    InvalidCode,

    #[error("exchange code has expired")]
    CodeExpired,

    #[error("failed to issue token: {0}")]
    Token(String),

    #[error("session provider unavailable: {0}")]
    Backend(String),
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolve the user behind `credential`.
    ///
    /// `Ok(None)` means "no valid session" (unknown, expired, tampered).
    /// `Err` is reserved for the provider itself failing.
    async fn current_user(&self, credential: &str) -> Result<Option<SessionUser>, SessionError>;

    /// Trade a single-use exchange code for a session.
    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, SessionError>;
}

#[async_trait]
impl<T> SessionProvider for Arc<T>
where
    T: SessionProvider + ?Sized,
{
    async fn current_user(&self, credential: &str) -> Result<Option<SessionUser>, SessionError> {
        (**self).current_user(credential).await
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, SessionError> {
        (**self).exchange_code_for_session(code).await
    }
}
