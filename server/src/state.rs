use color_eyre::eyre::Context;
use db::setup_db_pool;
use sqlx::PgPool;
use tracing::instrument;
use url::Url;

use crate::Result;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Url,
    pub port: u16,
}

impl AppConfig {
    #[instrument(name = "AppConfig::from_env")]
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("APP_BASE_URL")
            .wrap_err("Missing APP_BASE_URL, needed for app launch")?;
        let base_url = Url::parse(&base_url).wrap_err("Invalid APP_BASE_URL not parsable")?;

        let port = match std::env::var("PORT") {
            Ok(port) => port.parse().wrap_err("PORT must be a valid port number")?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self { base_url, port })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AppState {
    pub app: AppConfig,
    pub db: PgPool,
}

impl AppState {
    #[instrument(name = "AppState::from_env", err)]
    pub async fn from_env() -> Result<Self> {
        let app_state = AppState {
            app: AppConfig::from_env()?,
            db: setup_db_pool().await?,
        };

        Ok(app_state)
    }
}
