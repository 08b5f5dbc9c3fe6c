//! Database handle: the engine's connection pool plus the dialect bound to it.

mod rows;

use crate::config::DbConfig;
use crate::dialect::{dsn, Dialect, Engine};
use crate::error::DbError;
use crate::sql::{QueryBuf, SqlValue};
use serde_json::Value;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Column, Executor, Statement, TypeInfo};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Connection pool of the active engine.
#[derive(Clone, Debug)]
pub enum Pool {
    MySql(MySqlPool),
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// A column as the live database reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveColumn {
    pub name: String,
    /// Type name as reported by the server (`INT4`, `VARCHAR`) or declared (SQLite `INT(11)`).
    /// `NULL` or empty when unknown.
    pub type_name: String,
}

fn column_list<C: Column>(columns: &[C]) -> Vec<LiveColumn> {
    columns
        .iter()
        .map(|c| LiveColumn {
            name: c.name().to_string(),
            type_name: c.type_info().name().to_string(),
        })
        .collect()
}

/// Bind every parameter of a QueryBuf; timestamps are written in the dialect's zone.
macro_rules! bind_all {
    ($query:expr, $params:expr, $dialect:expr) => {{
        let mut query = $query;
        for p in $params {
            query = match p {
                SqlValue::Null => query.bind(None::<i32>),
                SqlValue::Bool(b) => query.bind(*b),
                SqlValue::Int(i) => query.bind(*i),
                SqlValue::Float(f) => query.bind(*f),
                SqlValue::Text(s) => query.bind(s.clone()),
                SqlValue::Timestamp(t) => query.bind($dialect.localize(t)),
            };
        }
        query
    }};
}

#[derive(Clone, Debug)]
pub struct Database {
    pool: Pool,
    dialect: Arc<dyn Dialect>,
    query_timeout: Option<Duration>,
}

impl Database {
    /// Open a pool for `config`. The database itself must already exist
    /// (see [`crate::store::ensure_database_exists`]).
    pub async fn connect(config: &DbConfig) -> Result<Database, DbError> {
        let engine = config.engine()?;
        let zone = config.time_zone()?;
        let url = dsn::connect_url(engine, &config.dsn)?;
        let connect_err = |source| DbError::Connect {
            driver: engine.name().to_string(),
            source,
        };
        let acquire_timeout = Duration::from_secs(config.connect_timeout_secs);

        let pool = match engine {
            Engine::Postgres => Pool::Postgres(
                PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(acquire_timeout)
                    .connect(&url)
                    .await
                    .map_err(connect_err)?,
            ),
            Engine::MySql => Pool::MySql(
                MySqlPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(acquire_timeout)
                    .connect(&url)
                    .await
                    .map_err(connect_err)?,
            ),
            Engine::Sqlite => {
                let opts = SqliteConnectOptions::from_str(&url)
                    .map_err(connect_err)?
                    .create_if_missing(true);
                let mut pool_opts = SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(acquire_timeout);
                if dsn::is_memory(&config.dsn) {
                    // Each in-memory connection is its own database.
                    pool_opts = pool_opts
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                }
                Pool::Sqlite(pool_opts.connect_with(opts).await.map_err(connect_err)?)
            }
        };

        tracing::info!(driver = %engine, timezone = %zone, "database pool ready");
        Ok(Database {
            pool,
            dialect: engine.localized(zone),
            query_timeout: config.query_timeout(),
        })
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn engine(&self) -> Engine {
        self.dialect.engine()
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }

    /// Run `fut` under `limit`, logging the statement and how long it took.
    async fn timed<T, F>(&self, sql: &str, limit: Option<Duration>, fut: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let started = Instant::now();
        let result = match limit {
            Some(timeout) => tokio::time::timeout(timeout, fut).await.map_err(|_| DbError::Timeout {
                statement: sql.to_string(),
                timeout,
            })?,
            None => fut.await,
        };
        tracing::debug!(sql = %sql, elapsed_ms = started.elapsed().as_millis() as u64, ok = result.is_ok(), "query done");
        result.map_err(|e| DbError::query(sql, e))
    }

    /// All rows of `q` as JSON objects, in database order.
    pub async fn fetch_json(&self, q: &QueryBuf, timeout: Option<Duration>) -> Result<Vec<Value>, DbError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let limit = timeout.or(self.query_timeout);
        let d = self.dialect.as_ref();
        match &self.pool {
            Pool::Postgres(pool) => {
                let query = bind_all!(sqlx::query::<sqlx::Postgres>(&q.sql), &q.params, d);
                let fetched = self.timed(&q.sql, limit, query.fetch_all(pool)).await?;
                Ok(fetched.iter().map(rows::pg_row_to_json).collect())
            }
            Pool::MySql(pool) => {
                let query = bind_all!(sqlx::query::<sqlx::MySql>(&q.sql), &q.params, d);
                let fetched = self.timed(&q.sql, limit, query.fetch_all(pool)).await?;
                Ok(fetched.iter().map(rows::mysql_row_to_json).collect())
            }
            Pool::Sqlite(pool) => {
                let query = bind_all!(sqlx::query::<sqlx::Sqlite>(&q.sql), &q.params, d);
                let fetched = self.timed(&q.sql, limit, query.fetch_all(pool)).await?;
                Ok(fetched.iter().map(rows::sqlite_row_to_json).collect())
            }
        }
    }

    /// First column of the single row of a `COUNT(*)` query.
    pub async fn fetch_count(&self, q: &QueryBuf, timeout: Option<Duration>) -> Result<u64, DbError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let limit = timeout.or(self.query_timeout);
        let d = self.dialect.as_ref();
        let count: i64 = match &self.pool {
            Pool::Postgres(pool) => {
                let query = bind_all!(sqlx::query_scalar::<sqlx::Postgres, i64>(&q.sql), &q.params, d);
                self.timed(&q.sql, limit, query.fetch_one(pool)).await?
            }
            Pool::MySql(pool) => {
                let query = bind_all!(sqlx::query_scalar::<sqlx::MySql, i64>(&q.sql), &q.params, d);
                self.timed(&q.sql, limit, query.fetch_one(pool)).await?
            }
            Pool::Sqlite(pool) => {
                let query = bind_all!(sqlx::query_scalar::<sqlx::Sqlite, i64>(&q.sql), &q.params, d);
                self.timed(&q.sql, limit, query.fetch_one(pool)).await?
            }
        };
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Execute a parameterized statement; returns rows affected.
    pub async fn execute_query(&self, q: &QueryBuf) -> Result<u64, DbError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let limit = self.query_timeout;
        let d = self.dialect.as_ref();
        match &self.pool {
            Pool::Postgres(pool) => {
                let query = bind_all!(sqlx::query::<sqlx::Postgres>(&q.sql), &q.params, d);
                Ok(self.timed(&q.sql, limit, query.execute(pool)).await?.rows_affected())
            }
            Pool::MySql(pool) => {
                let query = bind_all!(sqlx::query::<sqlx::MySql>(&q.sql), &q.params, d);
                Ok(self.timed(&q.sql, limit, query.execute(pool)).await?.rows_affected())
            }
            Pool::Sqlite(pool) => {
                let query = bind_all!(sqlx::query::<sqlx::Sqlite>(&q.sql), &q.params, d);
                Ok(self.timed(&q.sql, limit, query.execute(pool)).await?.rows_affected())
            }
        }
    }

    /// Execute a statement without parameters (DDL).
    pub async fn execute(&self, sql: &str) -> Result<(), sqlx::Error> {
        tracing::debug!(sql = %sql, "execute");
        match &self.pool {
            Pool::Postgres(pool) => sqlx::query(sql).execute(pool).await.map(drop),
            Pool::MySql(pool) => sqlx::query(sql).execute(pool).await.map(drop),
            Pool::Sqlite(pool) => sqlx::query(sql).execute(pool).await.map(drop),
        }
    }

    /// Columns of `table` as the live database reports them. Fails with the driver's
    /// missing-table error when the table does not exist.
    pub async fn live_columns(&self, table: &str) -> Result<Vec<LiveColumn>, sqlx::Error> {
        let sql = format!("SELECT * FROM {} WHERE 1=0", self.dialect.quote_ident(table));
        tracing::debug!(sql = %sql, "live columns");
        Ok(match &self.pool {
            Pool::Postgres(pool) => column_list(pool.prepare(&sql).await?.columns()),
            Pool::MySql(pool) => column_list(pool.prepare(&sql).await?.columns()),
            Pool::Sqlite(pool) => {
                pool.prepare(&sql).await?;
                // Prepared SQLite statements carry no column types; read the declared ones.
                sqlx::query_as::<_, (String, String)>("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
                    .bind(table)
                    .fetch_all(pool)
                    .await?
                    .into_iter()
                    .map(|(name, type_name)| LiveColumn { name, type_name })
                    .collect()
            }
        })
    }

    pub async fn ping(&self) -> Result<(), DbError> {
        self.execute("SELECT 1").await.map_err(|e| DbError::query("SELECT 1", e))
    }

    pub async fn close(&self) {
        match &self.pool {
            Pool::Postgres(pool) => pool.close().await,
            Pool::MySql(pool) => pool.close().await,
            Pool::Sqlite(pool) => pool.close().await,
        }
    }
}
