//! Table, column and index descriptors: the desired end state handed to the synchronizer.

mod entity;
pub mod tag;

pub use entity::{Entity, EntityDef, FieldDef};

use serde::{Deserialize, Serialize};

/// What a field holds, independent of any SQL engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticKind {
    Integer,
    Float,
    Boolean,
    String,
    Timestamp,
    /// A serialized object stored as text.
    StructuredBlob,
}

/// Coarse type family used to compare a descriptor against a live column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum KindCategory {
    Number,
    String,
    Other,
}

impl SemanticKind {
    pub fn category(self) -> KindCategory {
        match self {
            SemanticKind::Integer | SemanticKind::Float | SemanticKind::Boolean => KindCategory::Number,
            SemanticKind::String => KindCategory::String,
            SemanticKind::Timestamp | SemanticKind::StructuredBlob => KindCategory::Other,
        }
    }

    pub fn is_number(self) -> bool {
        self.category() == KindCategory::Number
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SemanticKind::Integer => "integer",
            SemanticKind::Float => "float",
            SemanticKind::Boolean => "boolean",
            SemanticKind::String => "string",
            SemanticKind::Timestamp => "timestamp",
            SemanticKind::StructuredBlob => "structured_blob",
        }
    }
}

impl KindCategory {
    /// Classify an SQL type name as reported by a driver or written in a tag
    /// (`INT4`, `VARCHAR(255)`, `DATETIME`...). `None` when the name carries no type.
    pub fn of_sql_type(type_name: &str) -> Option<KindCategory> {
        let upper = type_name.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or("").trim();
        if base.is_empty() || base == "NULL" {
            return None;
        }
        let has = |words: &[&str]| words.iter().any(|w| base.contains(w));
        Some(if has(&["DATE", "TIME", "YEAR", "INTERVAL"]) {
            KindCategory::Other
        } else if has(&["INT", "SERIAL", "DEC", "NUMERIC", "REAL", "FLOAT", "DOUBLE", "BOOL", "BIT", "MONEY"]) {
            KindCategory::Number
        } else if has(&["CHAR", "TEXT", "CLOB", "ENUM"]) {
            KindCategory::String
        } else {
            KindCategory::Other
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: SemanticKind,
    pub nullable: bool,
    /// Upper-cased SQL type keyword from a `type:` tag.
    pub explicit_type: Option<String>,
    /// Size/precision without parentheses, e.g. `15` or `10,4`.
    pub explicit_length: Option<String>,
    /// Literal SQL default expression.
    pub explicit_default: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, kind: SemanticKind) -> Self {
        ColumnDescriptor {
            name: name.into(),
            kind,
            nullable: false,
            explicit_type: None,
            explicit_length: None,
            explicit_default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_type(mut self, sql_type: impl Into<String>) -> Self {
        self.explicit_type = Some(sql_type.into().to_uppercase());
        self
    }

    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.explicit_length = Some(length.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.explicit_default = Some(default.into());
        self
    }

    /// `id` with a numeric kind becomes the auto-increment primary key.
    pub fn is_auto_primary_key(&self) -> bool {
        self.name.eq_ignore_ascii_case("id") && self.kind.is_number()
    }

    /// Category the live column is expected to report: the explicit type when it names one,
    /// otherwise the storage of the kind (serialized objects live in text columns).
    pub fn storage_category(&self) -> Option<KindCategory> {
        if let Some(t) = &self.explicit_type {
            return KindCategory::of_sql_type(t);
        }
        Some(match self.kind {
            SemanticKind::StructuredBlob => KindCategory::String,
            kind => kind.category(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Plain,
    Unique,
    Primary,
}

impl IndexKind {
    /// Kind suffix of an `index:` tag. Unrecognized suffixes mean a plain index.
    pub fn from_tag(s: &str) -> Option<IndexKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => None,
            "unique" => Some(IndexKind::Unique),
            "primary" => Some(IndexKind::Primary),
            _ => Some(IndexKind::Plain),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub kind: IndexKind,
    pub columns: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    /// In order of first appearance.
    pub indexes: Vec<IndexDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        TableDescriptor {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_index(&self) -> Option<&IndexDescriptor> {
        self.indexes.iter().find(|i| i.kind == IndexKind::Primary)
    }

    /// Indexes created with their own `CREATE INDEX` statement.
    pub fn secondary_indexes(&self) -> impl Iterator<Item = &IndexDescriptor> {
        self.indexes.iter().filter(|i| i.kind != IndexKind::Primary)
    }
}
