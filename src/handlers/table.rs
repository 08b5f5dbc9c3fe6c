//! Paginated listing of synchronized tables.

use crate::error::DbError;
use crate::response::{PageResult, Pagination};
use crate::service::Paginator;
use crate::sql::{Condition, Order, Select};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

/// `{"page": 0, "per_page": 20, "conditions": [...], "orders": [...]}`
#[derive(Debug, Default, Deserialize)]
pub struct PageRequest {
    #[serde(flatten)]
    pub pagination: Pagination,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

pub async fn page(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(req): Json<PageRequest>,
) -> Result<Json<PageResult<Value>>, DbError> {
    let descriptor = state.table(&table).ok_or_else(|| DbError::UnknownTable(table.clone()))?;
    let mut select = Select::for_table(descriptor).filters(req.conditions)?;
    for order in req.orders {
        select = select.order(order)?;
    }
    let page = Paginator::new(&state.db, select)
        .paginate(req.pagination)
        .load_page_json()
        .await?;
    Ok(Json(page))
}
