//! PostgreSQL dialect.

use crate::dialect::{database_error_matches, quote_with, Dialect, Engine};
use crate::schema::SemanticKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn engine(&self) -> Engine {
        Engine::Postgres
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_with(ident, '"')
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    // Postgres has no integer display width, so INTEGER carries no length.
    fn default_type(&self, kind: SemanticKind) -> (&'static str, Option<&'static str>) {
        match kind {
            SemanticKind::Integer => ("INTEGER", None),
            SemanticKind::Boolean => ("BOOLEAN", None),
            SemanticKind::Float => ("DECIMAL", Some("(20,2)")),
            SemanticKind::String => ("VARCHAR", Some("(255)")),
            SemanticKind::Timestamp => ("TIMESTAMP", None),
            SemanticKind::StructuredBlob => ("TEXT", None),
        }
    }

    fn default_literal(&self, kind: SemanticKind) -> Option<&'static str> {
        match kind {
            SemanticKind::Integer | SemanticKind::Float => Some("'0'"),
            SemanticKind::Boolean => Some("FALSE"),
            SemanticKind::String => Some("''"),
            SemanticKind::Timestamp | SemanticKind::StructuredBlob => None,
        }
    }

    fn auto_primary_key(&self) -> &'static str {
        "SERIAL PRIMARY KEY"
    }

    fn is_missing_table(&self, err: &sqlx::Error) -> bool {
        // undefined_table
        database_error_matches(err, Some("42P01"), None)
    }
}
