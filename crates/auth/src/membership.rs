use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use tenantgate_core::{TenantId, UserId};

use crate::RoleKey;

/// A user's membership in a tenant (one row of the membership table).
///
/// Read-only from the guard's perspective: tenant administration creates and
/// deactivates these elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role_key: RoleKey,
    pub is_active: bool,
}

impl TenantMembership {
    pub fn active(user_id: UserId, tenant_id: TenantId, role_key: RoleKey) -> Self {
        Self {
            user_id,
            tenant_id,
            role_key,
            is_active: true,
        }
    }

    /// Whether this row grants access at all. Inactive rows count as absent.
    pub fn grants_access(&self) -> bool {
        self.is_active
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("membership store unavailable: {0}")]
    Backend(String),

    #[error("malformed membership row: {0}")]
    Decode(String),
}

/// Read access to tenant memberships, keyed by `(user_id, tenant_id)`.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn lookup(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> Result<Option<TenantMembership>, StoreError>;
}

#[async_trait]
impl<T> MembershipStore for Arc<T>
where
    T: MembershipStore + ?Sized,
{
    async fn lookup(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> Result<Option<TenantMembership>, StoreError> {
        (**self).lookup(user_id, tenant_id).await
    }
}
