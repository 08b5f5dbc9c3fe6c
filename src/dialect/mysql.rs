//! MySQL/MariaDB dialect.

use crate::dialect::{database_error_matches, quote_with, Dialect, Engine};
use crate::schema::SemanticKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn engine(&self) -> Engine {
        Engine::MySql
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_with(ident, '`')
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
        "SERIAL PRIMARY KEY"
    }

    fn is_missing_table(&self, err: &sqlx::Error) -> bool {
        // ER_NO_SUCH_TABLE (1146) reports SQLSTATE 42S02.
        database_error_matches(err, Some("42S02"), Some("doesn't exist"))
    }
}
