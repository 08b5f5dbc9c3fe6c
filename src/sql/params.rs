//! Bound-parameter values and their coercion to column kinds.

use crate::dialect::TIMESTAMP_FORMAT;
use crate::error::DbError;
use crate::schema::SemanticKind;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::fmt;

/// A value bound to a query parameter. Converts from Rust primitives and serde_json::Value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SqlValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    pub fn from_json(v: &Value) -> SqlValue {
        match v {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => SqlValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlValue::Text(v.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Convert to the representation a column of `kind` stores. `Null` passes through.
    pub fn coerce(self, column: &str, kind: SemanticKind) -> Result<SqlValue, DbError> {
        let fail = |v: &SqlValue| DbError::Coerce {
            column: column.to_string(),
            value: v.to_string(),
            kind: kind.as_str(),
        };
        let coerced = match (kind, &self) {
            (_, SqlValue::Null) => Some(SqlValue::Null),
            (SemanticKind::Integer, SqlValue::Int(_)) => Some(self.clone()),
            (SemanticKind::Integer, SqlValue::Bool(b)) => Some(SqlValue::Int(i64::from(*b))),
            (SemanticKind::Integer, SqlValue::Float(f)) if f.fract() == 0.0 => Some(SqlValue::Int(*f as i64)),
            (SemanticKind::Integer, SqlValue::Text(s)) => s.trim().parse().ok().map(SqlValue::Int),

            (SemanticKind::Float, SqlValue::Float(_)) => Some(self.clone()),
            (SemanticKind::Float, SqlValue::Int(i)) => Some(SqlValue::Float(*i as f64)),
            (SemanticKind::Float, SqlValue::Text(s)) => s.trim().parse().ok().map(SqlValue::Float),

            (SemanticKind::Boolean, SqlValue::Bool(_)) => Some(self.clone()),
            (SemanticKind::Boolean, SqlValue::Int(i @ (0 | 1))) => Some(SqlValue::Bool(*i == 1)),
            (SemanticKind::Boolean, SqlValue::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(SqlValue::Bool(true)),
                "false" | "0" => Some(SqlValue::Bool(false)),
                _ => None,
            },

            (SemanticKind::String, SqlValue::Text(_)) => Some(self.clone()),
            (SemanticKind::String, SqlValue::Int(i)) => Some(SqlValue::Text(i.to_string())),
            (SemanticKind::String, SqlValue::Float(f)) => Some(SqlValue::Text(f.to_string())),
            (SemanticKind::String, SqlValue::Bool(b)) => Some(SqlValue::Text(b.to_string())),

            (SemanticKind::Timestamp, SqlValue::Timestamp(_)) => Some(self.clone()),
            (SemanticKind::Timestamp, SqlValue::Text(s)) => parse_timestamp(s).map(SqlValue::Timestamp),

            (SemanticKind::StructuredBlob, SqlValue::Text(_)) => Some(self.clone()),
            _ => None,
        };
        coerced.ok_or_else(|| fail(&self))
    }
}

/// RFC 3339, or `YYYY-MM-DD HH:MM:SS` read as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok().map(|n| n.and_utc()))
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(x) => write!(f, "{}", x),
            SqlValue::Text(s) => write!(f, "{:?}", s),
            SqlValue::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

macro_rules! sql_value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                SqlValue::$variant(v.into())
            }
        })*
    };
}

sql_value_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    u32 => Int,
    f64 => Float,
    String => Text,
    &str => Text,
    DateTime<Utc> => Timestamp,
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

impl From<&Value> for SqlValue {
    fn from(v: &Value) -> Self {
        SqlValue::from_json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn converts_from_json() {
        assert_eq!(SqlValue::from_json(&json!(null)), SqlValue::Null);
        assert_eq!(SqlValue::from_json(&json!(7)), SqlValue::Int(7));
        assert_eq!(SqlValue::from_json(&json!(1.5)), SqlValue::Float(1.5));
        assert_eq!(SqlValue::from_json(&json!("x")), SqlValue::Text("x".into()));
        assert_eq!(SqlValue::from_json(&json!({"lat": 1})), SqlValue::Text(r#"{"lat":1}"#.into()));
    }

    #[test]
    fn converts_from_primitives() {
        assert_eq!(SqlValue::from(3_i32), SqlValue::Int(3));
        assert_eq!(SqlValue::from("a"), SqlValue::Text("a".into()));
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(true)), SqlValue::Bool(true));
    }

    #[test]
    fn coerces_text_to_declared_kind() {
        assert_eq!(SqlValue::from("7").coerce("uid", SemanticKind::Integer).unwrap(), SqlValue::Int(7));
        assert_eq!(SqlValue::from("true").coerce("on", SemanticKind::Boolean).unwrap(), SqlValue::Bool(true));
        assert_eq!(SqlValue::from("2.5").coerce("p", SemanticKind::Float).unwrap(), SqlValue::Float(2.5));
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(
            SqlValue::from("2024-05-01 08:00:00").coerce("ctime", SemanticKind::Timestamp).unwrap(),
            SqlValue::Timestamp(t)
        );
        assert_eq!(
            SqlValue::from("2024-05-01T10:00:00+02:00").coerce("ctime", SemanticKind::Timestamp).unwrap(),
            SqlValue::Timestamp(t)
        );
        assert_eq!(SqlValue::Int(5).coerce("name", SemanticKind::String).unwrap(), SqlValue::Text("5".into()));
        assert_eq!(SqlValue::Null.coerce("uid", SemanticKind::Integer).unwrap(), SqlValue::Null);
    }

    #[test]
    fn coercion_failure_names_the_column() {
        let err = SqlValue::from("seven").coerce("uid", SemanticKind::Integer).unwrap_err();
        match err {
            DbError::Coerce { column, kind, .. } => {
                assert_eq!(column, "uid");
                assert_eq!(kind, "integer");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(SqlValue::Int(2).coerce("on", SemanticKind::Boolean).is_err());
        assert!(SqlValue::Bool(true).coerce("ctime", SemanticKind::Timestamp).is_err());
    }
}
