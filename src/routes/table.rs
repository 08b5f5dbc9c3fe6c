//! Read routes over synchronized tables.

use crate::handlers::table::page;
use crate::state::AppState;
use axum::{routing::post, Router};

/// POST /tables/:table/page with a [`crate::handlers::table::PageRequest`] body.
pub fn table_routes(state: AppState) -> Router {
    Router::new()
        .route("/tables/:table/page", post(page))
        .with_state(state)
}
