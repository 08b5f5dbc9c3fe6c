//! Liveness, readiness and build information.

use crate::dialect::Engine;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

/// Readiness: the pool answers a ping, and how many tables the service syncs.
#[derive(Debug, Serialize)]
struct ReadyBody {
    status: &'static str,
    driver: &'static str,
    tables: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    ping_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct VersionBody {
    name: &'static str,
    version: &'static str,
    engines: [&'static str; 3],
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    let started = Instant::now();
    let ping = state.db.ping().await;
    let mut body = ReadyBody {
        status: "ok",
        driver: state.db.engine().name(),
        tables: state.tables.len(),
        ping_ms: None,
    };
    match ping {
        Ok(()) => {
            body.ping_ms = Some(started.elapsed().as_millis() as u64);
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            tracing::warn!(error = %e, driver = body.driver, "readiness ping failed");
            body.status = "unavailable";
            (StatusCode::SERVICE_UNAVAILABLE, Json(body))
        }
    }
}

async fn version() -> Json<VersionBody> {
    Json(VersionBody {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        engines: [Engine::MySql.name(), Engine::Postgres.name(), Engine::Sqlite.name()],
    })
}

/// GET /health, /ready (pings the database) and /version.
pub fn common_routes_with_ready(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::db::Database;
    use crate::schema::{FieldDef, TableDescriptor};

    #[tokio::test]
    async fn version_lists_supported_engines() {
        let Json(body) = version().await;
        assert_eq!(body.name, "tablesync");
        assert_eq!(body.engines, ["mysql", "postgres", "sqlite"]);
    }

    #[tokio::test]
    async fn ready_reports_driver_and_tables() {
        let db = Database::connect(&DbConfig::sqlite(":memory:")).await.unwrap();
        let room = TableDescriptor::extract("room", &[FieldDef::integer("Id")]).unwrap();
        let state = AppState::new(db.clone(), [room]);

        let (status, Json(body)) = ready(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.driver, "sqlite");
        assert_eq!(body.tables, 1);
        assert!(body.ping_ms.is_some());

        db.close().await;
        let (status, Json(body)) = ready(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "unavailable");
        assert_eq!(body.ping_ms, None);
    }
}
