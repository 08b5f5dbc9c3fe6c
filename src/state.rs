//! Shared application state for routes.

use crate::db::Database;
use crate::schema::TableDescriptor;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Synchronized tables by name; list endpoints only serve these.
    pub tables: Arc<HashMap<String, TableDescriptor>>,
}

impl AppState {
    pub fn new(db: Database, tables: impl IntoIterator<Item = TableDescriptor>) -> Self {
        AppState {
            db,
            tables: Arc::new(tables.into_iter().map(|t| (t.name.clone(), t)).collect()),
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.get(name)
    }
}
