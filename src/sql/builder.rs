//! Builds parameterized SELECT, COUNT and INSERT statements.
//!
//! Identifiers go through the dialect's quoting; values are always bound.

use crate::dialect::Dialect;
use crate::error::{ConfigError, DbError};
use crate::schema::TableDescriptor;
use crate::sql::SqlValue;
use serde::{Deserialize, Serialize};

/// Statement text with its parameters in placeholder order.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    pub fn new(sql: impl Into<String>) -> Self {
        QueryBuf {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind `v` and return its placeholder.
    fn push_param(&mut self, dialect: &dyn Dialect, v: SqlValue) -> String {
        self.params.push(v);
        dialect.placeholder(self.params.len())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    IsNull,
}

impl Comparator {
    pub fn operator(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Neq => "<>",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Like => "LIKE",
            Comparator::IsNull => "IS NULL",
        }
    }
}

/// One predicate of a WHERE clause. A list of conditions is AND-combined.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Condition {
    pub column: String,
    pub comparator: Comparator,
    #[serde(default, deserialize_with = "value_from_json")]
    pub value: SqlValue,
}

fn value_from_json<'de, D: serde::Deserializer<'de>>(d: D) -> Result<SqlValue, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(SqlValue::from_json(&v))
}

impl Condition {
    pub fn new(column: impl Into<String>, comparator: Comparator, value: impl Into<SqlValue>) -> Self {
        Condition {
            column: column.into(),
            comparator,
            value: value.into(),
        }
    }

    fn render(&self, dialect: &dyn Dialect, q: &mut QueryBuf) -> String {
        let col = dialect.quote_ident(&self.column);
        match (self.comparator, self.value.is_null()) {
            (Comparator::IsNull, _) | (Comparator::Eq, true) => format!("{} IS NULL", col),
            (Comparator::Neq, true) => format!("{} IS NOT NULL", col),
            (cmp, _) => {
                let ph = q.push_param(dialect, self.value.clone());
                format!("{} {} {}", col, cmp.operator(), ph)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Composable SELECT over one table.
#[derive(Clone, Debug, Default)]
pub struct Select {
    table: String,
    conditions: Vec<Condition>,
    orders: Vec<Order>,
    page: u64,
    per_page: u64,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Select {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Conditions coerced against `table`; unknown columns are rejected when added.
    pub fn for_table(table: &TableDescriptor) -> TypedSelect<'_> {
        TypedSelect {
            descriptor: table,
            select: Select::from(table.name.clone()),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn where_(mut self, column: impl Into<String>, comparator: Comparator, value: impl Into<SqlValue>) -> Self {
        self.conditions.push(Condition::new(column, comparator, value));
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn filters(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.where_(column, Comparator::Eq, value)
    }

    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.where_(column, Comparator::IsNull, SqlValue::Null)
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.orders.push(Order {
            column: column.into(),
            direction: Direction::Asc,
        });
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.orders.push(Order {
            column: column.into(),
            direction: Direction::Desc,
        });
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    /// 0-based `page`; `per_page = 0` means no limit.
    pub fn paginate(mut self, page: u64, per_page: u64) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    fn push_where(&self, dialect: &dyn Dialect, q: &mut QueryBuf) {
        if self.conditions.is_empty() {
            return;
        }
        let parts: Vec<String> = self.conditions.iter().map(|c| c.render(dialect, q)).collect();
        q.sql.push_str(" WHERE ");
        q.sql.push_str(&parts.join(" AND "));
    }

    /// `SELECT * FROM t [WHERE ...] [ORDER BY ...] [LIMIT n OFFSET m]`.
    pub fn build(&self, dialect: &dyn Dialect) -> QueryBuf {
        let mut q = QueryBuf::new(format!("SELECT * FROM {}", dialect.quote_ident(&self.table)));
        self.push_where(dialect, &mut q);
        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{} {}", dialect.quote_ident(&o.column), dir)
                })
                .collect();
            q.sql.push_str(" ORDER BY ");
            q.sql.push_str(&orders.join(", "));
        }
        if self.per_page > 0 {
            let offset = self.page.saturating_mul(self.per_page);
            q.sql.push_str(&format!(" LIMIT {} OFFSET {}", self.per_page, offset));
        }
        q
    }

    /// `SELECT COUNT(*) FROM t [WHERE ...]`.
    pub fn build_count(&self, dialect: &dyn Dialect) -> QueryBuf {
        let mut q = QueryBuf::new(format!("SELECT COUNT(*) FROM {}", dialect.quote_ident(&self.table)));
        self.push_where(dialect, &mut q);
        q
    }
}

/// A [`Select`] bound to a descriptor.
#[derive(Clone, Debug)]
pub struct TypedSelect<'a> {
    descriptor: &'a TableDescriptor,
    select: Select,
}

impl<'a> TypedSelect<'a> {
    fn check_column(&self, column: &str) -> Result<&'a crate::schema::ColumnDescriptor, DbError> {
        self.descriptor.column(column).ok_or_else(|| {
            ConfigError::UnknownColumn {
                table: self.descriptor.name.clone(),
                column: column.to_string(),
            }
            .into()
        })
    }

    pub fn filter(mut self, condition: Condition) -> Result<Self, DbError> {
        let column = self.check_column(&condition.column)?;
        let value = match condition.comparator {
            Comparator::IsNull => SqlValue::Null,
            // LIKE patterns stay text whatever the column kind.
            Comparator::Like => condition.value,
            _ => condition.value.coerce(&column.name, column.kind)?,
        };
        self.select = self.select.filter(Condition { value, ..condition });
        Ok(self)
    }

    pub fn filters(self, conditions: impl IntoIterator<Item = Condition>) -> Result<Self, DbError> {
        conditions.into_iter().try_fold(self, |s, c| s.filter(c))
    }

    pub fn where_(self, column: impl Into<String>, comparator: Comparator, value: impl Into<SqlValue>) -> Result<Self, DbError> {
        self.filter(Condition::new(column, comparator, value))
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Result<Self, DbError> {
        self.where_(column, Comparator::Eq, value)
    }

    pub fn order(mut self, order: Order) -> Result<Self, DbError> {
        self.check_column(&order.column)?;
        self.select = self.select.order(order);
        Ok(self)
    }

    pub fn order_asc(self, column: impl Into<String>) -> Result<Self, DbError> {
        self.order(Order {
            column: column.into(),
            direction: Direction::Asc,
        })
    }

    pub fn order_desc(self, column: impl Into<String>) -> Result<Self, DbError> {
        self.order(Order {
            column: column.into(),
            direction: Direction::Desc,
        })
    }

    pub fn paginate(mut self, page: u64, per_page: u64) -> Self {
        self.select = self.select.paginate(page, per_page);
        self
    }

    pub fn into_select(self) -> Select {
        self.select
    }
}

impl From<TypedSelect<'_>> for Select {
    fn from(t: TypedSelect<'_>) -> Self {
        t.select
    }
}

/// Parameterized single-row INSERT.
#[derive(Clone, Debug, Default)]
pub struct Insert {
    table: String,
    values: Vec<(String, SqlValue)>,
}

impl Insert {
    pub fn into(table: impl Into<String>) -> Self {
        Insert {
            table: table.into(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    pub fn build(&self, dialect: &dyn Dialect) -> QueryBuf {
        let mut q = QueryBuf::new(String::new());
        let cols: Vec<String> = self.values.iter().map(|(c, _)| dialect.quote_ident(c)).collect();
        let placeholders: Vec<String> = self
            .values
            .iter()
            .map(|(_, v)| q.push_param(dialect, v.clone()))
            .collect();
        q.sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            dialect.quote_ident(&self.table),
            cols.join(", "),
            placeholders.join(", ")
        );
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MysqlDialect, PostgresDialect, SqliteDialect};
    use crate::schema::FieldDef;
    use chrono::{TimeZone, Utc};

    #[test]
    fn conditions_are_and_combined_in_order() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let q = Select::from("room")
            .eq("uid", 7)
            .where_("ctime", Comparator::Gte, t)
            .build(&SqliteDialect);
        assert_eq!(q.sql, r#"SELECT * FROM "room" WHERE "uid" = ? AND "ctime" >= ?"#);
        assert_eq!(q.params, vec![SqlValue::Int(7), SqlValue::Timestamp(t)]);
    }

    #[test]
    fn postgres_numbers_placeholders() {
        let q = Select::from("room")
            .eq("uid", 7)
            .where_("room_name", Comparator::Like, "a%")
            .build(&PostgresDialect);
        assert_eq!(q.sql, r#"SELECT * FROM "room" WHERE "uid" = $1 AND "room_name" LIKE $2"#);
    }

    #[test]
    fn null_comparisons_bind_nothing() {
        let q = Select::from("conference")
            .is_null("etime")
            .eq("room_id", SqlValue::Null)
            .where_("uid", Comparator::Neq, None::<i64>)
            .build(&MysqlDialect);
        assert_eq!(
            q.sql,
            "SELECT * FROM `conference` WHERE `etime` IS NULL AND `room_id` IS NULL AND `uid` IS NOT NULL"
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn order_and_pagination() {
        let q = Select::from("people").order_desc("id").order_asc("name").paginate(2, 5).build(&MysqlDialect);
        assert_eq!(q.sql, "SELECT * FROM `people` ORDER BY `id` DESC, `name` ASC LIMIT 5 OFFSET 10");
        let q = Select::from("people").paginate(3, 0).build(&MysqlDialect);
        assert_eq!(q.sql, "SELECT * FROM `people`");
    }

    #[test]
    fn count_ignores_order_and_limit() {
        let s = Select::from("people").eq("name", "a").order_desc("id").paginate(1, 5);
        let q = s.build_count(&PostgresDialect);
        assert_eq!(q.sql, r#"SELECT COUNT(*) FROM "people" WHERE "name" = $1"#);
        assert_eq!(q.params, vec![SqlValue::Text("a".into())]);
    }

    #[test]
    fn typed_select_coerces_and_rejects_unknown_columns() {
        let table = TableDescriptor::extract(
            "room",
            &[FieldDef::integer("Id"), FieldDef::integer("Uid"), FieldDef::timestamp("Ctime")],
        )
        .unwrap();
        let q = Select::for_table(&table)
            .eq("uid", "7")
            .unwrap()
            .where_("ctime", Comparator::Gte, "2024-05-01 08:00:00")
            .unwrap()
            .into_select()
            .build(&SqliteDialect);
        assert_eq!(q.sql, r#"SELECT * FROM "room" WHERE "uid" = ? AND "ctime" >= ?"#);
        assert_eq!(
            q.params,
            vec![SqlValue::Int(7), SqlValue::Timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())]
        );

        let err = Select::for_table(&table).eq("nope", 1).unwrap_err();
        assert!(matches!(err, DbError::Config(ConfigError::UnknownColumn { .. })));
        let err = Select::for_table(&table).eq("uid", "seven").unwrap_err();
        assert!(matches!(err, DbError::Coerce { .. }));
        assert!(Select::for_table(&table).order_desc("missing").is_err());
    }

    #[test]
    fn conditions_deserialize_from_json() {
        let c: Condition = serde_json::from_str(r#"{"column":"uid","comparator":"gte","value":3}"#).unwrap();
        assert_eq!(c, Condition::new("uid", Comparator::Gte, 3));
        let c: Condition = serde_json::from_str(r#"{"column":"etime","comparator":"isNull"}"#).unwrap();
        assert_eq!(c.value, SqlValue::Null);
    }

    #[test]
    fn insert_binds_every_value() {
        let q = Insert::into("people").value("name", "a").value("age", 3).build(&PostgresDialect);
        assert_eq!(q.sql, r#"INSERT INTO "people" ("name", "age") VALUES ($1, $2)"#);
        assert_eq!(q.params, vec![SqlValue::Text("a".into()), SqlValue::Int(3)]);
    }
}
