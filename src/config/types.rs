//! Connection configuration.

use crate::dialect::{dsn, Engine, TimeZone};
use crate::error::ConfigError;
use crate::schema::{EntityDef, TableDescriptor};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    30
}

/// `{"driver": "mysql", "dsn": "user:pw@tcp(localhost:3306)/app", "timezone": "+08:00"}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// `mysql`, `postgres` or `sqlite`. Empty means: take it from the DSN scheme.
    #[serde(default)]
    pub driver: String,
    pub dsn: String,
    /// Zone timestamps are written in: `UTC`, `Local`, `Asia/Shanghai` or `+08:00`. Defaults to local time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_timeout_ms: Option<u64>,
}

impl DbConfig {
    pub fn new(driver: impl Into<String>, dsn: impl Into<String>) -> Self {
        DbConfig {
            driver: driver.into(),
            dsn: dsn.into(),
            timezone: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            query_timeout_ms: None,
        }
    }

    pub fn sqlite(dsn: impl Into<String>) -> Self {
        Self::new("sqlite", dsn)
    }

    pub fn with_timezone(mut self, zone: impl Into<String>) -> Self {
        self.timezone = Some(zone.into());
        self
    }

    pub fn with_query_timeout_ms(mut self, ms: u64) -> Self {
        self.query_timeout_ms = Some(ms);
        self
    }

    pub fn engine(&self) -> Result<Engine, ConfigError> {
        if !self.driver.trim().is_empty() {
            return Engine::from_name(&self.driver);
        }
        dsn::driver_from_dsn(&self.dsn).ok_or_else(|| ConfigError::UnknownDialect(String::new()))
    }

    pub fn time_zone(&self) -> Result<TimeZone, ConfigError> {
        TimeZone::from_config(self.timezone.as_deref())
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    /// Resolve the engine, time zone and DSN eagerly so mistakes surface at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = self.engine()?;
        self.time_zone()?;
        dsn::split_dsn(engine, &self.dsn)?;
        dsn::connect_url(engine, &self.dsn)?;
        if self.max_connections == 0 {
            return Err(ConfigError::Load("max_connections must be at least 1".into()));
        }
        Ok(())
    }
}

/// File layout: `{"db": {...}, "entities": [...]}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileConfig {
    pub db: DbConfig,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

impl FileConfig {
    /// Descriptors of the declared entities, in file order.
    pub fn descriptors(&self) -> Result<Vec<TableDescriptor>, ConfigError> {
        self.entities.iter().map(EntityDef::descriptor).collect()
    }
}
