use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::{apis::ApiClient, config::PortalConfig, images::ImageCache, web::session::SessionStore};

#[derive(Clone)]
pub struct AppState {
    config: Arc<PortalConfig>,
    api: ApiClient,
    sessions: SessionStore,
    images: ImageCache,
}

impl AppState {
    pub async fn new(config: PortalConfig) -> Result<Self> {
        let api = ApiClient::new(config.api_timeout).context("failed to initialize API client")?;

        let sessions = match config.database_url.as_deref() {
            Some(database_url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(database_url)
                    .await
                    .context("failed to connect to Postgres")?;

                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("failed to run database migrations")?;

                info!("sessions stored in Postgres");
                SessionStore::postgres(pool, config.session_ttl)
            }
            None => {
                warn!("DATABASE_URL not set; sessions are kept in memory and lost on restart");
                SessionStore::memory(config.session_ttl)
            }
        };

        let images = ImageCache::new(config.protected_dir());
        images
            .ensure_dir()
            .await
            .with_context(|| format!("failed to create {}", images.dir().display()))?;

        Ok(Self::from_parts(config, api, sessions, images))
    }

    pub fn from_parts(
        config: PortalConfig,
        api: ApiClient,
        sessions: SessionStore,
        images: ImageCache,
    ) -> Self {
        Self {
            config: Arc::new(config),
            api,
            sessions,
            images,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }
}
