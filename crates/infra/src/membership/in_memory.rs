use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use tenantgate_auth::{MembershipStore, StoreError, TenantMembership};
use tenantgate_core::{TenantId, UserId};

type Table = HashMap<(TenantId, UserId), TenantMembership>;

/// In-memory membership table for tests/dev.
///
/// The mutators stand in for tenant administration flows; the guard only
/// calls [`MembershipStore::lookup`].
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    inner: RwLock<Table>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>, StoreError> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>, StoreError> {
        self.inner.write().map_err(|_| poisoned())
    }

    pub fn upsert(&self, membership: TenantMembership) -> Result<(), StoreError> {
        self.write()?
            .insert((membership.tenant_id, membership.user_id), membership);
        Ok(())
    }

    /// Flip `is_active` on an existing row. Returns `false` if there is no row.
    pub fn set_active(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        is_active: bool,
    ) -> Result<bool, StoreError> {
        match self.write()?.get_mut(&(tenant_id, user_id)) {
            Some(m) => {
                m.is_active = is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<Option<TenantMembership>, StoreError> {
        Ok(self.write()?.remove(&(tenant_id, user_id)))
    }

    /// All rows of a tenant, active or not.
    pub fn list(&self, tenant_id: TenantId) -> Result<Vec<TenantMembership>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .filter_map(|((t, _u), m)| if *t == tenant_id { Some(m.clone()) } else { None })
            .collect())
    }
}

fn poisoned() -> StoreError {
    tracing::error!("membership table lock poisoned");
    StoreError::Backend("membership table lock poisoned".to_string())
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn lookup(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> Result<Option<TenantMembership>, StoreError> {
        Ok(self.read()?.get(&(tenant_id, user_id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tenantgate_auth::RoleKey;

    #[tokio::test]
    async fn lookup_is_keyed_by_user_and_tenant() {
        let store = InMemoryMembershipStore::new();
        let (t1, t2) = (TenantId::new(), TenantId::new());
        let user = UserId::new();
        store
            .upsert(TenantMembership::active(user, t1, RoleKey::Operador))
            .unwrap();

        let hit = store.lookup(user, t1).await.unwrap().unwrap();
        assert_eq!(hit.role_key, RoleKey::Operador);
        assert!(store.lookup(user, t2).await.unwrap().is_none());
        assert!(store.lookup(UserId::new(), t1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deactivation_and_removal() {
        let store = InMemoryMembershipStore::new();
        let tenant = TenantId::new();
        let user = UserId::new();
        assert!(!store.set_active(tenant, user, false).unwrap());

        store
            .upsert(TenantMembership::active(user, tenant, RoleKey::Admin))
            .unwrap();
        assert!(store.set_active(tenant, user, false).unwrap());
        let row = store.lookup(user, tenant).await.unwrap().unwrap();
        assert!(!row.is_active);

        assert_eq!(store.list(tenant).unwrap().len(), 1);
        assert!(store.remove(tenant, user).unwrap().is_some());
        assert!(store.list(tenant).unwrap().is_empty());
    }

    #[tokio::test]
    async fn poisoned_table_reports_backend_errors() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let tenant = TenantId::new();
        let user = UserId::new();

        let poisoner = store.clone();
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(joined.is_err());

        let row = TenantMembership::active(user, tenant, RoleKey::Admin);
        assert!(matches!(store.upsert(row), Err(StoreError::Backend(_))));
        assert!(matches!(store.set_active(tenant, user, false), Err(StoreError::Backend(_))));
        assert!(matches!(store.remove(tenant, user), Err(StoreError::Backend(_))));
        assert!(matches!(store.list(tenant), Err(StoreError::Backend(_))));
        assert!(matches!(store.lookup(user, tenant).await, Err(StoreError::Backend(_))));
    }
}
