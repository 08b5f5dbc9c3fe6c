//! SQL dialects: identifier quoting, type mapping, timestamp encoding and placeholders per engine.
//!
//! One struct per engine implements [`Dialect`]; [`Localized`] wraps any of them to render
//! timestamps in a configured time zone.

pub mod dsn;
mod localized;
mod mysql;
mod postgres;
mod sqlite;

pub use localized::{Localized, TimeZone};
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::ConfigError;
use crate::schema::{ColumnDescriptor, SemanticKind};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Layout used for timestamp literals and text-encoded timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Supported database engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    MySql,
    Postgres,
    Sqlite,
}

impl Engine {
    /// Resolve a driver name. Unknown names are a configuration error.
    pub fn from_name(name: &str) -> Result<Engine, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Engine::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Engine::Postgres),
            "sqlite" | "sqlite3" => Ok(Engine::Sqlite),
            other => Err(ConfigError::UnknownDialect(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Engine::MySql => "mysql",
            Engine::Postgres => "postgres",
            Engine::Sqlite => "sqlite",
        }
    }

    /// The engine's dialect, rendering timestamps in UTC.
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            Engine::MySql => Arc::new(MysqlDialect),
            Engine::Postgres => Arc::new(PostgresDialect),
            Engine::Sqlite => Arc::new(SqliteDialect),
        }
    }

    /// The engine's dialect decorated with a time zone.
    pub fn localized(self, zone: TimeZone) -> Arc<dyn Dialect> {
        Arc::new(Localized::new(self.dialect(), zone))
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait Dialect: fmt::Debug + Send + Sync {
    fn engine(&self) -> Engine;

    fn name(&self) -> &'static str {
        self.engine().name()
    }

    fn quote_ident(&self, ident: &str) -> String;

    /// Bind-parameter marker for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Type keyword and default `(length)` for a kind with no explicit `type:` tag.
    fn default_type(&self, kind: SemanticKind) -> (&'static str, Option<&'static str>);

    /// Implicit default literal for a non-null column with no explicit `type:` tag.
    fn default_literal(&self, kind: SemanticKind) -> Option<&'static str> {
        match kind {
            SemanticKind::Integer | SemanticKind::Float | SemanticKind::Boolean => Some("'0'"),
            SemanticKind::String => Some("''"),
            SemanticKind::Timestamp | SemanticKind::StructuredBlob => None,
        }
    }

    /// Full clause for the auto-increment `id` column.
    fn auto_primary_key(&self) -> &'static str;

    /// Type, length, nullability and default of one column, e.g. `VARCHAR(255) NOT NULL DEFAULT ''`.
    fn type_clause(&self, column: &ColumnDescriptor) -> String {
        if column.is_auto_primary_key() {
            return self.auto_primary_key().to_string();
        }
        let (sql_type, default_length, mut default_value) = match &column.explicit_type {
            Some(t) => (t.clone(), None, None),
            None => {
                let (t, len) = self.default_type(column.kind);
                (t.to_string(), len, self.default_literal(column.kind))
            }
        };
        let mut out = sql_type;
        match (&column.explicit_length, default_length) {
            (Some(len), _) => {
                out.push('(');
                out.push_str(len);
                out.push(')');
            }
            (None, Some(len)) => out.push_str(len),
            (None, None) => {}
        }
        if column.nullable {
            out.push_str(" NULL");
            default_value = None;
        } else {
            out.push_str(" NOT NULL");
        }
        if let Some(def) = column.explicit_default.as_deref().or(default_value) {
            out.push_str(" DEFAULT ");
            out.push_str(def);
        }
        out
    }

    /// Quoted column name followed by its type clause.
    fn column_definition(&self, column: &ColumnDescriptor) -> String {
        format!("{} {}", self.quote_ident(&column.name), self.type_clause(column))
    }

    /// Wall-clock time a timestamp is stored as. Base dialects store UTC.
    fn localize(&self, t: &DateTime<Utc>) -> NaiveDateTime {
        t.naive_utc()
    }

    /// Timestamp as an SQL literal, e.g. `'2024-05-01 08:00:00'`.
    fn encode_timestamp(&self, t: &DateTime<Utc>) -> String {
        format!("'{}'", self.localize(t).format(TIMESTAMP_FORMAT))
    }

    /// Whether `err` means the queried table does not exist.
    fn is_missing_table(&self, err: &sqlx::Error) -> bool;
}

/// Shared check for engine error codes and messages.
pub(crate) fn database_error_matches(err: &sqlx::Error, code: Option<&str>, message: Option<&str>) -> bool {
    let Some(db_err) = err.as_database_error() else {
        return false;
    };
    if let (Some(want), Some(got)) = (code, db_err.code()) {
        if got == want {
            return true;
        }
    }
    message.is_some_and(|m| db_err.message().to_ascii_lowercase().contains(m))
}

/// Double every occurrence of `quote` inside `ident` and wrap it.
pub(crate) fn quote_with(ident: &str, quote: char) -> String {
    let mut out = String::with_capacity(ident.len() + 2);
    out.push(quote);
    for c in ident.chars() {
        if c == quote {
            out.push(quote);
        }
        out.push(c);
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableDescriptor;
    use crate::schema::FieldDef;

    #[test]
    fn engine_names_and_aliases() {
        assert_eq!(Engine::from_name("mysql").unwrap(), Engine::MySql);
        assert_eq!(Engine::from_name("PostgreSQL").unwrap(), Engine::Postgres);
        assert_eq!(Engine::from_name("sqlite3").unwrap(), Engine::Sqlite);
        let err = Engine::from_name("oracle").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDialect(ref n) if n == "oracle"));
    }

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_with("a\"b", '"'), "\"a\"\"b\"");
        assert_eq!(MysqlDialect.quote_ident("t`x"), "`t``x`");
        assert_eq!(PostgresDialect.quote_ident("users"), "\"users\"");
    }

    #[test]
    fn type_clauses_follow_mapping_table() {
        let t = TableDescriptor::extract(
            "all_kinds",
            &[
                FieldDef::integer("Id"),
                FieldDef::integer("Count"),
                FieldDef::float("Price"),
                FieldDef::boolean("Enabled"),
                FieldDef::string("Name"),
                FieldDef::timestamp("Ctime"),
                FieldDef::blob("Config"),
                FieldDef::timestamp("Etime").optional(),
                FieldDef::integer("Limit").optional().tag("default:10"),
            ],
        )
        .unwrap();
        let render = |d: &dyn Dialect| t.columns.iter().map(|c| d.type_clause(c)).collect::<Vec<_>>();

        assert_eq!(
            render(&MysqlDialect),
            [
                "SERIAL PRIMARY KEY",
                "INT(11) NOT NULL DEFAULT '0'",
                "DECIMAL(20,2) NOT NULL DEFAULT '0'",
                "INT(11) NOT NULL DEFAULT '0'",
                "VARCHAR(255) NOT NULL DEFAULT ''",
                "DATETIME NOT NULL",
                "TEXT NOT NULL",
                "DATETIME NULL",
                "INT(11) NULL DEFAULT 10",
            ]
        );
        assert_eq!(
            render(&SqliteDialect),
            [
                "INTEGER PRIMARY KEY AUTOINCREMENT",
                "INT(11) NOT NULL DEFAULT '0'",
                "DECIMAL(20,2) NOT NULL DEFAULT '0'",
                "INT(11) NOT NULL DEFAULT '0'",
                "VARCHAR(255) NOT NULL DEFAULT ''",
                "DATETIME NOT NULL",
                "TEXT NOT NULL",
                "DATETIME NULL",
                "INT(11) NULL DEFAULT 10",
            ]
        );
        assert_eq!(
            render(&PostgresDialect),
            [
                "SERIAL PRIMARY KEY",
                "INTEGER NOT NULL DEFAULT '0'",
                "DECIMAL(20,2) NOT NULL DEFAULT '0'",
                "BOOLEAN NOT NULL DEFAULT FALSE",
                "VARCHAR(255) NOT NULL DEFAULT ''",
                "TIMESTAMP NOT NULL",
                "TEXT NOT NULL",
                "TIMESTAMP NULL",
                "INTEGER NULL DEFAULT 10",
            ]
        );
    }

    #[test]
    fn explicit_type_drops_implicit_length_and_default() {
        let c = ColumnDescriptor::new("f", SemanticKind::String).with_type("text");
        assert_eq!(MysqlDialect.type_clause(&c), "TEXT NOT NULL");
        let c = c.with_length("15").with_default("'aa'");
        assert_eq!(MysqlDialect.type_clause(&c), "TEXT(15) NOT NULL DEFAULT 'aa'");
    }

    #[test]
    fn explicit_length_overrides_default_length() {
        let c = ColumnDescriptor::new("mobile", SemanticKind::String).with_length("20");
        assert_eq!(SqliteDialect.type_clause(&c), "VARCHAR(20) NOT NULL DEFAULT ''");
    }

    #[test]
    fn placeholders_per_engine() {
        assert_eq!(MysqlDialect.placeholder(3), "?");
        assert_eq!(SqliteDialect.placeholder(3), "?");
        assert_eq!(PostgresDialect.placeholder(3), "$3");
    }

    #[test]
    fn base_dialects_encode_utc() {
        let t = DateTime::parse_from_rfc3339("2024-05-01T08:30:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(MysqlDialect.encode_timestamp(&t), "'2024-05-01 08:30:00'");
    }
}
