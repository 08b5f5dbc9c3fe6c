//! Database creation before the pool opens.

use crate::config::DbConfig;
use crate::dialect::{dsn, Dialect, Engine, MysqlDialect, PostgresDialect};
use crate::error::DbError;
use sqlx::{ConnectOptions, Connection};
use std::str::FromStr;

/// Create the database named in the DSN if it does not exist, connecting through the
/// server-level DSN. SQLite, and DSNs that name no database, are left alone.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<(), DbError> {
    let engine = config.engine()?;
    let (db_name, server_dsn) = dsn::split_dsn(engine, &config.dsn)?;
    if db_name.is_empty() || server_dsn.is_empty() {
        return Ok(());
    }
    let connect_err = |source| DbError::Connect {
        driver: engine.name().to_string(),
        source,
    };

    match engine {
        Engine::Sqlite => Ok(()),
        Engine::MySql => {
            let url = dsn::connect_url(engine, &server_dsn)?;
            let mut conn = sqlx::MySqlConnection::connect(&url).await.map_err(connect_err)?;
            let sql = mysql_create_database_sql(&db_name);
            tracing::debug!(sql = %sql, "ensure database");
            sqlx::query(&sql)
                .execute(&mut conn)
                .await
                .map_err(|e| DbError::ddl(&db_name, &sql, e))?;
            let _ = conn.close().await;
            Ok(())
        }
        Engine::Postgres => {
            if db_name == "postgres" {
                return Ok(());
            }
            // Postgres needs a database to connect to; the maintenance one always exists.
            let opts = sqlx::postgres::PgConnectOptions::from_str(&server_dsn)
                .map_err(connect_err)?
                .database("postgres");
            let mut conn: sqlx::PgConnection = opts.connect().await.map_err(connect_err)?;
            let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(&db_name)
                .fetch_one(&mut conn)
                .await
                .map_err(|e| DbError::query("SELECT EXISTS(... pg_database ...)", e))?;
            if !exists.0 {
                let sql = format!("CREATE DATABASE {}", PostgresDialect.quote_ident(&db_name));
                sqlx::query(&sql)
                    .execute(&mut conn)
                    .await
                    .map_err(|e| DbError::ddl(&db_name, &sql, e))?;
                tracing::info!(database = %db_name, "created database");
            }
            let _ = conn.close().await;
            Ok(())
        }
    }
}

pub fn mysql_create_database_sql(db_name: &str) -> String {
    format!(
        "CREATE DATABASE IF NOT EXISTS {} DEFAULT CHARSET utf8mb4 COLLATE utf8mb4_general_ci",
        MysqlDialect.quote_ident(db_name)
    )
}
