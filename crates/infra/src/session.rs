//! Session provider backed by HS256 access tokens and single-use exchange codes.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use tenantgate_auth::{
    Session, SessionClaims, SessionError, SessionProvider, SessionUser, validate_claims,
};

const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;
const DEFAULT_CODE_TTL_SECS: i64 = 5 * 60;

#[derive(Debug, Clone)]
struct PendingCode {
    user: SessionUser,
    expires_at: DateTime<Utc>,
}

/// Verifies bearer tokens signed with a shared secret and trades exchange
/// codes for fresh tokens.
///
/// Codes live in process memory; a restart invalidates outstanding ones.
pub struct JwtSessionProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
    code_ttl: Duration,
    codes: Mutex<HashMap<String, PendingCode>>,
}

impl JwtSessionProvider {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // Time-window checks are done by `validate_claims`, not the library.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            code_ttl: Duration::seconds(DEFAULT_CODE_TTL_SECS),
            codes: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
    }

    /// Sign an access token for `user`, valid from now for the token TTL.
    pub fn mint_token(&self, user: &SessionUser) -> Result<(String, DateTime<Utc>), SessionError> {
        self.mint_token_at(user, Utc::now())
    }

    pub fn mint_token_at(
        &self,
        user: &SessionUser,
        issued_at: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), SessionError> {
        let claims = SessionClaims {
            sub: user.user_id,
            email: user.email.clone(),
            iat: issued_at,
            exp: issued_at + self.token_ttl,
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SessionError::Token(e.to_string()))?;
        Ok((token, claims.exp))
    }

    /// Issue a single-use exchange code for `user`.
    ///
    /// This is the front half of an email-link or OAuth-style sign-in.
    /// Expired codes that were never redeemed are dropped here.
    pub fn issue_code(&self, user: SessionUser) -> Result<String, SessionError> {
        let now = Utc::now();
        let code = Uuid::now_v7().simple().to_string();
        let pending = PendingCode {
            user,
            expires_at: now + self.code_ttl,
        };

        let mut codes = self
            .codes
            .lock()
            .map_err(|_| SessionError::Backend("code table lock poisoned".to_string()))?;
        codes.retain(|_, p| p.expires_at > now);
        codes.insert(code.clone(), pending);
        Ok(code)
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Option<SessionClaims> {
        let data = match jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(error = %e, "rejected access token");
                return None;
            }
        };
        if let Err(e) = validate_claims(&data.claims, now) {
            tracing::debug!(error = %e, "rejected access token");
            return None;
        }
        Some(data.claims)
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn current_user(&self, credential: &str) -> Result<Option<SessionUser>, SessionError> {
        Ok(self.verify(credential, Utc::now()).map(|claims| SessionUser {
            user_id: claims.sub,
            email: claims.email,
        }))
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, SessionError> {
        // Removed before any check: a code is spent even when expired.
        let pending = self
            .codes
            .lock()
            .map_err(|_| SessionError::Backend("code table lock poisoned".to_string()))?
            .remove(code)
            .ok_or(SessionError::InvalidCode)?;

        let now = Utc::now();
        if now >= pending.expires_at {
            return Err(SessionError::CodeExpired);
        }

        let (access_token, expires_at) = self.mint_token_at(&pending.user, now)?;
        tracing::info!(user_id = %pending.user.user_id, "session established from exchange code");
        Ok(Session {
            access_token,
            user: pending.user,
            expires_at,
        })
    }
}
