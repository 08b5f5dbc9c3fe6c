//! Row to JSON conversion: one object per row, keyed by column name.

use crate::dialect::TIMESTAMP_FORMAT;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, ColumnIndex, Decode, Row, Type, ValueRef};

/// Non-null cell decoded as `T`, or `None` when the column type is not compatible.
fn get<'r, R, T>(row: &'r R, idx: usize) -> Option<T>
where
    R: Row,
    usize: ColumnIndex<R>,
    T: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<Option<T>, _>(idx).ok().flatten()
}

fn is_null<R>(row: &R, idx: usize) -> bool
where
    R: Row,
    usize: ColumnIndex<R>,
{
    row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(true)
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn decimal(d: Decimal) -> Value {
    match d.to_f64() {
        Some(f) if d.fract().is_zero() => d.to_i64().map(Value::from).unwrap_or_else(|| float(f)),
        Some(f) => float(f),
        None => Value::String(d.to_string()),
    }
}

fn naive(t: chrono::NaiveDateTime) -> Value {
    Value::String(t.format(TIMESTAMP_FORMAT).to_string())
}

/// Integer, float, bool, timestamp and text cells, tried in that order.
macro_rules! common_cell {
    ($row:expr, $idx:expr) => {
        if let Some(v) = get::<_, i64>($row, $idx) {
            return Value::from(v);
        }
        if let Some(v) = get::<_, i32>($row, $idx) {
            return Value::from(v);
        }
        if let Some(v) = get::<_, i16>($row, $idx) {
            return Value::from(v);
        }
        if let Some(v) = get::<_, f64>($row, $idx) {
            return float(v);
        }
        if let Some(v) = get::<_, f32>($row, $idx) {
            return float(f64::from(v));
        }
        if let Some(v) = get::<_, bool>($row, $idx) {
            return Value::Bool(v);
        }
        if let Some(v) = get::<_, Decimal>($row, $idx) {
            return decimal(v);
        }
        if let Some(v) = get::<_, chrono::NaiveDateTime>($row, $idx) {
            return naive(v);
        }
    };
}

fn pg_cell(row: &PgRow, idx: usize) -> Value {
    if is_null(row, idx) {
        return Value::Null;
    }
    common_cell!(row, idx);
    if let Some(v) = get::<_, chrono::DateTime<chrono::Utc>>(row, idx) {
        return Value::String(v.to_rfc3339());
    }
    if let Some(v) = get::<_, chrono::NaiveDate>(row, idx) {
        return Value::String(v.format("%Y-%m-%d").to_string());
    }
    if let Some(v) = get::<_, String>(row, idx) {
        return Value::String(v);
    }
    if let Some(v) = get::<_, Value>(row, idx) {
        return v;
    }
    Value::Null
}

fn mysql_cell(row: &MySqlRow, idx: usize) -> Value {
    if is_null(row, idx) {
        return Value::Null;
    }
    if let Some(v) = get::<_, u64>(row, idx) {
        return Value::from(v);
    }
    common_cell!(row, idx);
    if let Some(v) = get::<_, String>(row, idx) {
        return Value::String(v);
    }
    if let Some(v) = get::<_, Value>(row, idx) {
        return v;
    }
    if let Some(v) = get::<_, Vec<u8>>(row, idx) {
        return Value::String(String::from_utf8_lossy(&v).into_owned());
    }
    Value::Null
}

fn sqlite_cell(row: &SqliteRow, idx: usize) -> Value {
    if is_null(row, idx) {
        return Value::Null;
    }
    if let Some(v) = get::<_, i64>(row, idx) {
        return Value::from(v);
    }
    if let Some(v) = get::<_, f64>(row, idx) {
        return float(v);
    }
    // Text before timestamps: SQLite stores DATETIME as text already in our layout.
    if let Some(v) = get::<_, String>(row, idx) {
        return Value::String(v);
    }
    if let Some(v) = get::<_, Vec<u8>>(row, idx) {
        return Value::String(String::from_utf8_lossy(&v).into_owned());
    }
    Value::Null
}

macro_rules! row_to_json {
    ($name:ident, $row:ty, $cell:ident) => {
        pub(crate) fn $name(row: &$row) -> Value {
            let mut map = Map::new();
            for col in row.columns() {
                map.insert(col.name().to_string(), $cell(row, col.ordinal()));
            }
            Value::Object(map)
        }
    };
}

row_to_json!(pg_row_to_json, PgRow, pg_cell);
row_to_json!(mysql_row_to_json, MySqlRow, mysql_cell);
row_to_json!(sqlite_row_to_json, SqliteRow, sqlite_cell);
