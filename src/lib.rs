//! tablesync: descriptor-driven schema synchronization and paginated queries for
//! MySQL, PostgreSQL and SQLite.
//!
//! At startup, [`bootstrap`] creates the database if needed, opens the pool and brings every
//! registered table up to its descriptor. At request time, build a [`Select`] and hand it to a
//! [`Paginator`].

pub mod case;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod schema;
pub mod serde_ext;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{DbConfig, FileConfig};
pub use db::Database;
pub use dialect::{Dialect, Engine, TimeZone};
pub use error::{ConfigError, DbError};
pub use migration::{apply_migrations, synchronize, SchemaDrift, SyncReport};
pub use response::{PageResult, Pagination};
pub use routes::{common_routes_with_ready, table_routes};
pub use schema::{Entity, EntityDef, FieldDef, SemanticKind, TableDescriptor};
pub use service::Paginator;
pub use sql::{Comparator, Condition, Insert, Select, SqlValue};
pub use state::AppState;
pub use store::ensure_database_exists;

/// Ensure the database exists, connect, ping, then synchronize `tables` in order.
pub async fn bootstrap(config: &DbConfig, tables: &[TableDescriptor]) -> Result<Database, DbError> {
    config.validate()?;
    ensure_database_exists(config).await?;
    let db = Database::connect(config).await?;
    db.ping().await?;
    apply_migrations(&db, tables).await?;
    Ok(db)
}
