//! Serde adapters for columns whose storage differs from the Rust field type.

/// A structured value stored as JSON text.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, PartialEq, Debug)]
/// struct Location { lat: i32 }
///
/// #[derive(Deserialize)]
/// struct Row {
///     #[serde(with = "tablesync::serde_ext::json_text")]
///     location: Location,
/// }
///
/// let row: Row = serde_json::from_str(r#"{"location": "{\"lat\": 3}"}"#).unwrap();
/// assert_eq!(row.location, Location { lat: 3 });
/// ```
pub mod json_text {
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub fn serialize<T: Serialize, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        let text = serde_json::to_string(value).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    /// Accepts the text form, or an already-decoded object.
    pub fn deserialize<'de, T: DeserializeOwned, D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(text) => serde_json::from_str(&text).map_err(D::Error::custom),
            other => serde_json::from_value(other).map_err(D::Error::custom),
        }
    }
}

/// A boolean stored as an integer (MySQL and SQLite `INT(11)` columns).
pub mod int_bool {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
            other => Err(D::Error::custom(format!("expected bool or integer, got {}", other))),
        }
    }
}
