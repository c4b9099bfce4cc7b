//! Collaborator wiring: which session provider and membership store back the guard.

use std::sync::Arc;

use tenantgate_auth::{AuthGuard, MembershipStore, SessionProvider};
use tenantgate_infra::{InMemoryMembershipStore, JwtSessionProvider, PostgresMembershipStore};

use crate::config::AppConfig;

/// Guard over type-erased collaborators.
pub type ApiGuard = AuthGuard<Arc<dyn SessionProvider>, Arc<dyn MembershipStore>>;

pub struct AppServices {
    pub guard: ApiGuard,
    pub config: AppConfig,
}

impl AppServices {
    pub fn new(
        config: AppConfig,
        sessions: Arc<dyn SessionProvider>,
        memberships: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            guard: AuthGuard::new(sessions, memberships),
            config,
        }
    }
}

/// Build services from configuration.
///
/// `DATABASE_URL` selects the Postgres membership store; without it the store
/// is in-memory and starts empty (dev/test only).
pub async fn build_services(config: AppConfig) -> anyhow::Result<AppServices> {
    let sessions: Arc<dyn SessionProvider> =
        Arc::new(JwtSessionProvider::new(config.jwt_secret.as_bytes()));

    let memberships: Arc<dyn MembershipStore> = match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresMembershipStore::connect(url, config.db_max_connections).await?;
            tracing::info!("using postgres membership store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using empty in-memory membership store");
            Arc::new(InMemoryMembershipStore::new())
        }
    };

    Ok(AppServices::new(config, sessions, memberships))
}
