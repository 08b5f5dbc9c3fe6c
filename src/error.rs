//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Developer/configuration mistakes. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("malformed tag on field '{field}': token '{token}' is not key:value")]
    MalformedTag { field: String, token: String },
    #[error("unknown dialect: '{0}'")]
    UnknownDialect(String),
    #[error("invalid dsn for {driver}: {reason}")]
    InvalidDsn { driver: String, reason: String },
    #[error("invalid timezone: '{0}'")]
    InvalidTimezone(String),
    #[error("duplicate column '{column}' in table {table}")]
    DuplicateColumn { table: String, column: String },
    #[error("index '{index}' on table {table} has no columns")]
    EmptyIndex { table: String, index: String },
    #[error("unknown column '{column}' in table {table}")]
    UnknownColumn { table: String, column: String },
    #[error("config load: {0}")]
    Load(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("connect to {driver} database: {source}")]
    Connect {
        driver: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("ddl on table {table} failed: {statement}: {source}")]
    Ddl {
        table: String,
        statement: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("query failed: {statement}: {source}")]
    Query {
        statement: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("query timed out after {timeout:?}: {statement}")]
    Timeout { statement: String, timeout: Duration },
    #[error("cannot use {value} as {kind} for column '{column}'")]
    Coerce {
        column: String,
        value: String,
        kind: &'static str,
    },
    #[error("decode row: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("table not found: {0}")]
    UnknownTable(String),
}

impl DbError {
    pub(crate) fn query(statement: impl Into<String>, source: sqlx::Error) -> Self {
        DbError::Query {
            statement: statement.into(),
            source,
        }
    }

    pub(crate) fn ddl(table: impl Into<String>, statement: impl Into<String>, source: sqlx::Error) -> Self {
        DbError::Ddl {
            table: table.into(),
            statement: statement.into(),
            source,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            DbError::Config(ConfigError::UnknownColumn { .. }) => (StatusCode::BAD_REQUEST, "bad_request"),
            DbError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            DbError::Connect { .. } => (StatusCode::SERVICE_UNAVAILABLE, "database_unavailable"),
            DbError::Ddl { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "schema_error"),
            DbError::Query { source, .. } => match source {
                sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "not_found"),
                sqlx::Error::PoolTimedOut => (StatusCode::SERVICE_UNAVAILABLE, "database_unavailable"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
            DbError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            DbError::Coerce { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
            DbError::Decode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "decode_error"),
            DbError::UnknownTable(_) => (StatusCode::NOT_FOUND, "not_found"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
