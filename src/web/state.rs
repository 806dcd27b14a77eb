use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use tracing::info;

use crate::{
    config::AppConfig,
    session::SessionRegistry,
    store::{HttpStore, MemoryStore, RemoteStore},
    web::{SESSION_TTL_DAYS, storage::ensure_storage_root},
};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RemoteStore>,
    sessions: SessionRegistry,
    config: Arc<AppConfig>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn RemoteStore> = match config.api_url.as_deref() {
            Some(api_url) => {
                let http = HttpStore::new(api_url);
                info!(api_url = %http.base_url(), "using remote Billed API");
                Arc::new(http)
            }
            None => {
                ensure_storage_root(&config.attachments_dir).await?;
                let memory = MemoryStore::new(&config.attachments_dir);
                memory
                    .ensure_seed_admin(&config.seed_admin.email, &config.seed_admin.password)
                    .await
                    .context("failed to seed admin account")?;
                info!(
                    attachments = %config.attachments_dir.display(),
                    "BILLED_API_URL not set, using in-memory store"
                );
                Arc::new(memory)
            }
        };

        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: Arc<dyn RemoteStore>, config: AppConfig) -> Self {
        Self {
            store,
            sessions: SessionRegistry::new(Duration::days(SESSION_TTL_DAYS)),
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
