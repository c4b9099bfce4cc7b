//! `tenantgate-auth` — tenant-scoped authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: sessions and
//! memberships are reached through the [`SessionProvider`] and
//! [`MembershipStore`] traits, implemented in `tenantgate-infra`.

pub mod claims;
pub mod guard;
pub mod invite;
pub mod membership;
pub mod roles;
pub mod session;

pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use guard::{AuthContext, AuthError, AuthGuard, RequestContext};
pub use invite::{invitation_link, invitation_link_from_env, invitation_link_from_lookup};
pub use membership::{MembershipStore, StoreError, TenantMembership};
pub use roles::RoleKey;
pub use session::{Session, SessionError, SessionProvider, SessionUser};
