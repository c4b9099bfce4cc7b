//! Postgres-backed membership store.
//!
//! Reads the `tenant_users` table:
//!
//! ```sql
//! CREATE TABLE tenant_users (
//!     tenant_id  uuid    NOT NULL,
//!     user_id    uuid    NOT NULL,
//!     role_key   text    NOT NULL,
//!     is_active  boolean NOT NULL DEFAULT true,
//!     PRIMARY KEY (tenant_id, user_id)
//! );
//! ```
//!
//! The table is owned by tenant administration; this adapter never writes.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use tenantgate_auth::{MembershipStore, RoleKey, StoreError, TenantMembership};
use tenantgate_core::{TenantId, UserId};

const LOOKUP_SQL: &str = r#"
    SELECT user_id, tenant_id, role_key, is_active
    FROM tenant_users
    WHERE tenant_id = $1 AND user_id = $2
"#;

pub struct PostgresMembershipStore {
    pool: Arc<PgPool>,
}

impl PostgresMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a small pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl MembershipStore for PostgresMembershipStore {
    async fn lookup(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> Result<Option<TenantMembership>, StoreError> {
        let row = sqlx::query(LOOKUP_SQL)
            .bind(*tenant_id.as_uuid())
            .bind(*user_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let decode = |e: sqlx::Error| StoreError::Decode(e.to_string());
        let row_user: Uuid = row.try_get("user_id").map_err(decode)?;
        let row_tenant: Uuid = row.try_get("tenant_id").map_err(decode)?;
        let role_key: String = row.try_get("role_key").map_err(decode)?;
        let is_active: bool = row.try_get("is_active").map_err(decode)?;

        let role_key: RoleKey = role_key
            .parse()
            .map_err(|e: tenantgate_core::DomainError| StoreError::Decode(e.to_string()))?;

        Ok(Some(TenantMembership {
            user_id: UserId::from_uuid(row_user),
            tenant_id: TenantId::from_uuid(row_tenant),
            role_key,
            is_active,
        }))
    }
}
