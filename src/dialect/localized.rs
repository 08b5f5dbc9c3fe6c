//! Time-zone decoration for any dialect.

use crate::dialect::{Dialect, Engine};
use crate::error::ConfigError;
use crate::schema::{ColumnDescriptor, SemanticKind};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Zone timestamps are written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeZone {
    Utc,
    /// Process-local time.
    #[default]
    Local,
    Fixed(FixedOffset),
    /// IANA zone such as `Asia/Shanghai`; offsets follow its DST rules.
    Named(Tz),
}

impl TimeZone {
    pub fn localize(&self, t: &DateTime<Utc>) -> NaiveDateTime {
        match self {
            TimeZone::Utc => t.naive_utc(),
            TimeZone::Local => t.with_timezone(&chrono::Local).naive_local(),
            TimeZone::Fixed(offset) => t.with_timezone(offset).naive_local(),
            TimeZone::Named(tz) => t.with_timezone(tz).naive_local(),
        }
    }

    /// Parse an optional config value; absent or empty means process-local time.
    pub fn from_config(value: Option<&str>) -> Result<TimeZone, ConfigError> {
        match value {
            Some(v) if !v.trim().is_empty() => v.parse(),
            _ => Ok(TimeZone::Local),
        }
    }
}

impl FromStr for TimeZone {
    type Err = ConfigError;

    /// Accepts `UTC`, `Local`, an IANA name such as `Asia/Shanghai`, or a fixed offset such as
    /// `+08:00`, `-0530`, `+8`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidTimezone(s.to_string());
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "gmt" | "z" => return Ok(TimeZone::Utc),
            "local" => return Ok(TimeZone::Local),
            _ => {}
        }
        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return trimmed.parse::<Tz>().map(TimeZone::Named).map_err(|_| invalid()),
        };
        let (hours, minutes) = match rest.split_once(':') {
            Some((h, m)) => (h, m),
            None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
            None => (rest, "0"),
        };
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if !(0..60).contains(&minutes) {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(TimeZone::Fixed)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZone::Utc => f.write_str("UTC"),
            TimeZone::Local => f.write_str("Local"),
            TimeZone::Fixed(offset) => write!(f, "{}", offset),
            TimeZone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// Wraps a dialect and renders timestamps in `zone`; everything else is delegated.
#[derive(Debug, Clone)]
pub struct Localized {
    inner: Arc<dyn Dialect>,
    zone: TimeZone,
}

impl Localized {
    pub fn new(inner: Arc<dyn Dialect>, zone: TimeZone) -> Self {
        Localized { inner, zone }
    }
}

impl Dialect for Localized {
    fn engine(&self) -> Engine {
        self.inner.engine()
    }

    fn quote_ident(&self, ident: &str) -> String {
        self.inner.quote_ident(ident)
    }

    fn placeholder(&self, index: usize) -> String {
        self.inner.placeholder(index)
    }

    fn default_type(&self, kind: SemanticKind) -> (&'static str, Option<&'static str>) {
        self.inner.default_type(kind)
    }

    fn default_literal(&self, kind: SemanticKind) -> Option<&'static str> {
        self.inner.default_literal(kind)
    }

    fn auto_primary_key(&self) -> &'static str {
        self.inner.auto_primary_key()
    }

    fn type_clause(&self, column: &ColumnDescriptor) -> String {
        self.inner.type_clause(column)
    }

    fn localize(&self, t: &DateTime<Utc>) -> NaiveDateTime {
        self.zone.localize(t)
    }

    fn is_missing_table(&self, err: &sqlx::Error) -> bool {
        self.inner.is_missing_table(err)
    }
}
