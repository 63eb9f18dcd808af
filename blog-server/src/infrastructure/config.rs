use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::logging::LogFormat;
use crate::infrastructure::page_cache::DEFAULT_PAGE_TTL;

const DEFAULT_MAX_CONNECTIONS: u32 = 20;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Required unless the server runs on the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    pub page_cache_ttl: Duration,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let db_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid DATABASE_MAX_CONNECTIONS: {}", e))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let page_cache_ttl = match lookup("PAGE_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .map_err(|e| anyhow::anyhow!("invalid PAGE_CACHE_TTL_SECS: {}", e))?,
            ),
            None => DEFAULT_PAGE_TTL,
        };
        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|e| anyhow::anyhow!("invalid LOG_FORMAT: {}", e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            host,
            port,
            database_url,
            db_max_connections,
            jwt_secret,
            cors_origins,
            page_cache_ttl,
            log_format,
        })
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))
    }
}
