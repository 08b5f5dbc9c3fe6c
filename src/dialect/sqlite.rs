//! SQLite dialect.

use crate::dialect::{database_error_matches, quote_with, Dialect, Engine};
use crate::schema::SemanticKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn engine(&self) -> Engine {
        Engine::Sqlite
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_with(ident, '"')
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn default_type(&self, kind: SemanticKind) -> (&'static str, Option<&'static str>) {
        match kind {
            SemanticKind::Integer | SemanticKind::Boolean => ("INT", Some("(11)")),
            SemanticKind::Float => ("DECIMAL", Some("(20,2)")),
            SemanticKind::String => ("VARCHAR", Some("(255)")),
            SemanticKind::Timestamp => ("DATETIME", None),
            SemanticKind::StructuredBlob => ("TEXT", None),
        }
    }

    fn auto_primary_key(&self) -> &'static str {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    }

    fn is_missing_table(&self, err: &sqlx::Error) -> bool {
        database_error_matches(err, None, Some("no such table"))
    }
}
