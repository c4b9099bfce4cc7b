//! Request-scoped auth guard.
//!
//! Every call re-resolves the session and re-reads the membership row; nothing
//! is cached between requests, so a revoked membership or a changed role is
//! observed on the very next call.

use serde::Serialize;
use thiserror::Error;

use tenantgate_core::{TenantId, UserId};

use crate::{MembershipStore, RoleKey, SessionProvider};

/// What the caller brings to an authorization check.
///
/// Built by the transport layer (e.g. from a bearer header and a tenant
/// header) and passed explicitly; the guard never reaches for ambient state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    credential: Option<String>,
    tenant_id: Option<TenantId>,
}

impl RequestContext {
    pub fn new(credential: Option<String>, tenant_id: Option<TenantId>) -> Self {
        Self {
            credential,
            tenant_id,
        }
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }
}

/// Result of a successful authorization check.
///
/// Only [`AuthGuard`] constructs this, after both the session and an active
/// membership have been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    user_id: UserId,
    tenant_id: TenantId,
    role_key: RoleKey,
}

impl AuthContext {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn role_key(&self) -> RoleKey {
        self.role_key
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No valid session.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Valid session, but no active membership in the selected tenant.
    #[error("no active membership for the selected tenant")]
    Unauthorized,

    /// Active membership, but the role is not permitted.
    #[error("forbidden: role not permitted")]
    Forbidden,

    /// A collaborator failed; the check fails closed.
    #[error("auth backend unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Unauthorized => "unauthorized",
            AuthError::Forbidden => "forbidden",
            AuthError::Unavailable(_) => "unavailable",
        }
    }
}

/// Tenant-scoped RBAC guard over a session provider and a membership store.
#[derive(Debug, Clone)]
pub struct AuthGuard<S, M> {
    sessions: S,
    memberships: M,
}

impl<S, M> AuthGuard<S, M>
where
    S: SessionProvider,
    M: MembershipStore,
{
    pub fn new(sessions: S, memberships: M) -> Self {
        Self {
            sessions,
            memberships,
        }
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    pub fn memberships(&self) -> &M {
        &self.memberships
    }

    /// Resolve the caller's identity and role in the selected tenant.
    ///
    /// Checks run in order: session, tenant selection, membership. The first
    /// failure is returned as-is.
    pub async fn require_auth(&self, req: &RequestContext) -> Result<AuthContext, AuthError> {
        let Some(credential) = req.credential() else {
            tracing::debug!(reason = "missing_credential", "auth denied");
            return Err(AuthError::Unauthenticated);
        };

        let user = match self.sessions.current_user(credential).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!(reason = "invalid_session", "auth denied");
                return Err(AuthError::Unauthenticated);
            }
            Err(e) => {
                tracing::warn!(error = %e, "session provider failed");
                return Err(AuthError::Unavailable(e.to_string()));
            }
        };

        let Some(tenant_id) = req.tenant_id() else {
            tracing::debug!(user_id = %user.user_id, reason = "no_tenant_selected", "auth denied");
            return Err(AuthError::Unauthorized);
        };

        let membership = self
            .memberships
            .lookup(user.user_id, tenant_id)
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %user.user_id, tenant_id = %tenant_id, error = %e, "membership lookup failed");
                AuthError::Unavailable(e.to_string())
            })?;

        match membership {
            Some(m) if m.grants_access() => Ok(AuthContext {
                user_id: user.user_id,
                tenant_id,
                role_key: m.role_key,
            }),
            _ => {
                tracing::debug!(
                    user_id = %user.user_id,
                    tenant_id = %tenant_id,
                    reason = "no_active_membership",
                    "auth denied"
                );
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// [`require_auth`](Self::require_auth), then require one of `allowed`.
    pub async fn require_role(
        &self,
        req: &RequestContext,
        allowed: &[RoleKey],
    ) -> Result<AuthContext, AuthError> {
        let ctx = self.require_auth(req).await?;
        if allowed.contains(&ctx.role_key) {
            Ok(ctx)
        } else {
            tracing::debug!(
                user_id = %ctx.user_id,
                tenant_id = %ctx.tenant_id,
                role_key = %ctx.role_key,
                reason = "role_not_permitted",
                "auth denied"
            );
            Err(AuthError::Forbidden)
        }
    }

    pub async fn require_admin(&self, req: &RequestContext) -> Result<AuthContext, AuthError> {
        self.require_role(req, &[RoleKey::Admin]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::{Session, SessionError, SessionUser, StoreError, TenantMembership};

    #[derive(Default)]
    struct FakeSessions {
        tokens: HashMap<String, UserId>,
        broken: bool,
    }

    impl FakeSessions {
        fn with(token: &str, user_id: UserId) -> Self {
            let mut tokens = HashMap::new();
            tokens.insert(token.to_string(), user_id);
            Self {
                tokens,
                broken: false,
            }
        }
    }

    #[async_trait]
    impl SessionProvider for FakeSessions {
        async fn current_user(&self, credential: &str) -> Result<Option<SessionUser>, SessionError> {
            if self.broken {
                return Err(SessionError::Backend("down".into()));
            }
            Ok(self.tokens.get(credential).map(|user_id| SessionUser {
                user_id: *user_id,
                email: None,
            }))
        }

        async fn exchange_code_for_session(&self, _code: &str) -> Result<Session, SessionError> {
            Err(SessionError::InvalidCode)
        }
    }

    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<HashMap<(UserId, TenantId), TenantMembership>>,
        lookups: AtomicUsize,
        broken: bool,
    }

    impl FakeStore {
        fn put(&self, m: TenantMembership) {
            self.rows.lock().unwrap().insert((m.user_id, m.tenant_id), m);
        }
    }

    #[async_trait]
    impl MembershipStore for FakeStore {
        async fn lookup(
            &self,
            user_id: UserId,
            tenant_id: TenantId,
        ) -> Result<Option<TenantMembership>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(StoreError::Backend("connection refused".into()));
            }
            Ok(self.rows.lock().unwrap().get(&(user_id, tenant_id)).cloned())
        }
    }

    struct Fixture {
        guard: AuthGuard<FakeSessions, FakeStore>,
        user_id: UserId,
        tenant_id: TenantId,
    }

    fn fixture() -> Fixture {
        let user_id = UserId::new();
        let tenant_id = TenantId::new();
        Fixture {
            guard: AuthGuard::new(FakeSessions::with("tok", user_id), FakeStore::default()),
            user_id,
            tenant_id,
        }
    }

    fn req(credential: Option<&str>, tenant_id: Option<TenantId>) -> RequestContext {
        RequestContext::new(credential.map(str::to_string), tenant_id)
    }

    #[tokio::test]
    async fn missing_credential_is_unauthenticated() {
        let f = fixture();
        let err = f.guard.require_auth(&req(None, Some(f.tenant_id))).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated);
        assert_eq!(f.guard.memberships().lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_credential_is_unauthenticated_before_membership_lookup() {
        let f = fixture();
        f.guard
            .memberships()
            .put(TenantMembership::active(f.user_id, f.tenant_id, RoleKey::Admin));

        let err = f
            .guard
            .require_auth(&req(Some("forged"), Some(f.tenant_id)))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated);
        assert_eq!(f.guard.memberships().lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_tenant_selected_is_unauthorized() {
        let f = fixture();
        let err = f.guard.require_auth(&req(Some("tok"), None)).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn missing_membership_is_unauthorized() {
        let f = fixture();
        let err = f
            .guard
            .require_auth(&req(Some("tok"), Some(f.tenant_id)))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn inactive_membership_is_indistinguishable_from_absent() {
        let f = fixture();
        let absent = f
            .guard
            .require_auth(&req(Some("tok"), Some(f.tenant_id)))
            .await
            .unwrap_err();

        f.guard.memberships().put(TenantMembership {
            is_active: false,
            ..TenantMembership::active(f.user_id, f.tenant_id, RoleKey::Admin)
        });
        let inactive = f
            .guard
            .require_auth(&req(Some("tok"), Some(f.tenant_id)))
            .await
            .unwrap_err();

        assert_eq!(absent, inactive);
        assert_eq!(inactive, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn membership_in_another_tenant_does_not_leak() {
        let f = fixture();
        f.guard
            .memberships()
            .put(TenantMembership::active(f.user_id, TenantId::new(), RoleKey::Admin));

        let err = f
            .guard
            .require_auth(&req(Some("tok"), Some(f.tenant_id)))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn success_returns_ids_and_role_from_row() {
        let f = fixture();
        f.guard
            .memberships()
            .put(TenantMembership::active(f.user_id, f.tenant_id, RoleKey::Contador));

        let ctx = f
            .guard
            .require_auth(&req(Some("tok"), Some(f.tenant_id)))
            .await
            .unwrap();
        assert_eq!(ctx.user_id(), f.user_id);
        assert_eq!(ctx.tenant_id(), f.tenant_id);
        assert_eq!(ctx.role_key(), RoleKey::Contador);
    }

    #[tokio::test]
    async fn role_changes_are_seen_on_the_next_call() {
        let f = fixture();
        let r = req(Some("tok"), Some(f.tenant_id));
        f.guard
            .memberships()
            .put(TenantMembership::active(f.user_id, f.tenant_id, RoleKey::Admin));
        assert_eq!(f.guard.require_auth(&r).await.unwrap().role_key(), RoleKey::Admin);

        f.guard
            .memberships()
            .put(TenantMembership::active(f.user_id, f.tenant_id, RoleKey::Lectura));
        assert_eq!(f.guard.require_auth(&r).await.unwrap().role_key(), RoleKey::Lectura);
        assert_eq!(f.guard.require_admin(&r).await.unwrap_err(), AuthError::Forbidden);

        f.guard.memberships().put(TenantMembership {
            is_active: false,
            ..TenantMembership::active(f.user_id, f.tenant_id, RoleKey::Lectura)
        });
        assert_eq!(f.guard.require_auth(&r).await.unwrap_err(), AuthError::Unauthorized);
        assert_eq!(f.guard.memberships().lookups.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn require_admin_inherits_auth_failures() {
        let f = fixture();
        assert_eq!(
            f.guard.require_admin(&req(None, Some(f.tenant_id))).await.unwrap_err(),
            AuthError::Unauthenticated
        );
        assert_eq!(
            f.guard
                .require_admin(&req(Some("tok"), Some(f.tenant_id)))
                .await
                .unwrap_err(),
            AuthError::Unauthorized
        );
    }

    #[tokio::test]
    async fn require_role_accepts_any_listed_role() {
        let f = fixture();
        let r = req(Some("tok"), Some(f.tenant_id));
        f.guard
            .memberships()
            .put(TenantMembership::active(f.user_id, f.tenant_id, RoleKey::Supervisor));

        let allowed = [RoleKey::Admin, RoleKey::Supervisor];
        assert_eq!(
            f.guard.require_role(&r, &allowed).await.unwrap().role_key(),
            RoleKey::Supervisor
        );
        assert_eq!(
            f.guard.require_role(&r, &[RoleKey::Tecnico]).await.unwrap_err(),
            AuthError::Forbidden
        );
        assert_eq!(f.guard.require_role(&r, &[]).await.unwrap_err(), AuthError::Forbidden);
    }

    #[tokio::test]
    async fn collaborator_failures_fail_closed() {
        let user_id = UserId::new();
        let tenant_id = TenantId::new();

        let broken_sessions = AuthGuard::new(
            FakeSessions {
                broken: true,
                ..FakeSessions::with("tok", user_id)
            },
            FakeStore::default(),
        );
        let err = broken_sessions
            .require_auth(&req(Some("tok"), Some(tenant_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unavailable(_)));

        let broken_store = AuthGuard::new(
            FakeSessions::with("tok", user_id),
            FakeStore {
                broken: true,
                ..FakeStore::default()
            },
        );
        broken_store
            .memberships()
            .put(TenantMembership::active(user_id, tenant_id, RoleKey::Admin));
        let err = broken_store
            .require_admin(&req(Some("tok"), Some(tenant_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unavailable(_)));
        assert_eq!(err.code(), "unavailable");
    }

    #[test]
    fn auth_context_serializes_role_by_name() {
        let ctx = AuthContext {
            user_id: UserId::new(),
            tenant_id: TenantId::new(),
            role_key: RoleKey::Tecnico,
        };
        let v = serde_json::to_value(&ctx).unwrap();
        assert_eq!(v["role_key"], "Tecnico");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn block_on<F: std::future::Future>(fut: F) -> F::Output {
            tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap()
                .block_on(fut)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                ..ProptestConfig::default()
            })]

            #[test]
            fn require_admin_succeeds_iff_role_is_admin(
                role in proptest::sample::select(RoleKey::ALL.to_vec()),
                active in any::<bool>(),
            ) {
                let f = fixture();
                f.guard.memberships().put(TenantMembership {
                    user_id: f.user_id,
                    tenant_id: f.tenant_id,
                    role_key: role,
                    is_active: active,
                });
                let r = req(Some("tok"), Some(f.tenant_id));

                let auth = block_on(f.guard.require_auth(&r));
                let admin = block_on(f.guard.require_admin(&r));

                match (active, role) {
                    (false, _) => {
                        prop_assert_eq!(auth, Err(AuthError::Unauthorized));
                        prop_assert_eq!(admin, Err(AuthError::Unauthorized));
                    }
                    (true, RoleKey::Admin) => {
                        prop_assert_eq!(auth.unwrap().role_key(), RoleKey::Admin);
                        prop_assert_eq!(admin.unwrap().role_key(), RoleKey::Admin);
                    }
                    (true, other) => {
                        prop_assert_eq!(auth.unwrap().role_key(), other);
                        prop_assert_eq!(admin, Err(AuthError::Forbidden));
                    }
                }
            }
        }
    }
}
