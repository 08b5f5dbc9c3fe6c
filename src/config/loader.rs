//! Load configuration from a JSON file or from the environment.

use crate::config::{DbConfig, FileConfig};
use crate::error::ConfigError;
use std::path::Path;

/// Read `{"db": {...}, "entities": [...]}` from `path` and validate the connection section.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<FileConfig, ConfigError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config: FileConfig =
        serde_json::from_str(&text).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    config.db.validate()?;
    tracing::debug!(path = %path.display(), entities = config.entities.len(), "config loaded");
    Ok(config)
}

/// Build the connection config from `DB_DRIVER`, `DB_DSN` (or `DATABASE_URL`), `DB_TIMEZONE`,
/// `DB_MAX_CONNECTIONS` and `DB_QUERY_TIMEOUT_MS`.
pub fn from_env() -> Result<DbConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok())
}

fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<DbConfig, ConfigError> {
    let dsn = get("DB_DSN")
        .or_else(|| get("DATABASE_URL"))
        .ok_or_else(|| ConfigError::Load("DB_DSN or DATABASE_URL must be set".into()))?;
    let mut config = DbConfig::new(get("DB_DRIVER").unwrap_or_default(), dsn);
    config.timezone = get("DB_TIMEZONE").filter(|z| !z.trim().is_empty());
    if let Some(n) = get("DB_MAX_CONNECTIONS") {
        config.max_connections = parse_number("DB_MAX_CONNECTIONS", &n)?;
    }
    if let Some(ms) = get("DB_QUERY_TIMEOUT_MS") {
        config.query_timeout_ms = Some(parse_number("DB_QUERY_TIMEOUT_MS", &ms)?);
    }
    config.validate()?;
    Ok(config)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Load(format!("{} is not a number: '{}'", key, value)))
}

impl DbConfig {
    pub fn from_env() -> Result<DbConfig, ConfigError> {
        from_env()
    }
}
