use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:8000,http://127.0.0.1:8000";

/// Settings read from the environment (and `.env`, loaded by `main`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Without a database URL the server runs on the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub http_port: u16,
    pub cors_allowed_origins: String,
    pub media_root: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;

        let http_port = match lookup("HTTP_PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("HTTP_PORT is not a valid port: {}", port))?,
            None => DEFAULT_HTTP_PORT,
        };

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections,
            jwt_secret,
            http_port,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
            media_root: lookup("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("media")),
        })
    }

    pub fn http_addr(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s")])).unwrap();
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert!(config.database_url.is_none());
        assert_eq!(config.media_root, PathBuf::from("media"));
        assert_eq!(config.http_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn secret_is_required() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn bad_port_is_an_error() {
        let result = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s"), ("HTTP_PORT", "http")]));
        assert!(result.is_err());
    }
}
