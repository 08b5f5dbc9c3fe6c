//! Count query plus bounded page query, returned as a [`PageResult`].

use crate::db::Database;
use crate::error::DbError;
use crate::response::{PageResult, Pagination};
use crate::sql::Select;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub struct Paginator<'a> {
    db: &'a Database,
    select: Select,
    timeout: Option<Duration>,
}

impl<'a> Paginator<'a> {
    pub fn new(db: &'a Database, select: impl Into<Select>) -> Self {
        Paginator {
            db,
            select: select.into(),
            timeout: None,
        }
    }

    /// Per-call limit, overriding the configured query timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.select = self.select.paginate(pagination.page, pagination.per_page);
        self
    }

    /// Rows of the requested page as JSON objects.
    pub async fn load_page_json(&self) -> Result<PageResult<Value>, DbError> {
        let dialect = self.db.dialect();
        let count = self.db.fetch_count(&self.select.build_count(dialect), self.timeout).await?;
        if count == 0 {
            return Ok(PageResult::empty());
        }
        let items = self.db.fetch_json(&self.select.build(dialect), self.timeout).await?;
        tracing::debug!(
            table = %self.select.table(),
            count,
            items = items.len(),
            "page loaded"
        );
        Ok(PageResult { items, count })
    }

    /// Rows of the requested page deserialized into `T`, in database order.
    pub async fn load_page<T: DeserializeOwned>(&self) -> Result<PageResult<T>, DbError> {
        let page = self.load_page_json().await?;
        let items = page
            .items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(PageResult {
            items,
            count: page.count,
        })
    }
}
