use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    catalog::{CatalogClient, TmdbClient},
    config::AppConfig,
    db::{postgres::PgStore, Store},
    mail::{LogMailer, Mailer, SmtpMailer},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
    pub catalog: Arc<dyn CatalogClient>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and picks the mailer.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = PgStore::connect(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(store.pool()).await?;
        info!("database migrations applied");

        let mailer: Arc<dyn Mailer> = match &config.mail.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp, &config.mail)?),
            None => {
                warn!("SMTP_HOST not set; emails will be logged, not sent");
                Arc::new(LogMailer)
            }
        };

        if config.catalog.api_key.is_empty() {
            warn!("TMDB_API_KEY not set; catalog requests will be rejected upstream");
        }
        let catalog = Arc::new(TmdbClient::new(&config.catalog)?) as Arc<dyn CatalogClient>;

        Ok(Self::from_parts(Arc::new(store), config, mailer, catalog))
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        config: Arc<AppConfig>,
        mailer: Arc<dyn Mailer>,
        catalog: Arc<dyn CatalogClient>,
    ) -> Self {
        Self {
            store,
            config,
            mailer,
            catalog,
        }
    }

    /// In-memory state for tests: no database, mailer or network.
    #[cfg(test)]
    pub fn fake() -> Self {
        testing::TestApp::new().state
    }
}
