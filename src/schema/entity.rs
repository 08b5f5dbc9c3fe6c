//! Entity registration: the field list an entity declares, and its extraction into a
//! [`TableDescriptor`].

use crate::case::to_snake_case;
use crate::error::ConfigError;
use crate::schema::tag::parse_tags;
use crate::schema::{ColumnDescriptor, IndexDescriptor, IndexKind, SemanticKind, TableDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One declared field of an entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field identifier; mapped to snake_case for the column name.
    pub name: String,
    pub kind: SemanticKind,
    /// Declared as optional: the column is nullable.
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub excluded: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: SemanticKind) -> Self {
        FieldDef {
            name: name.into(),
            kind,
            optional: false,
            tag: String::new(),
            excluded: false,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, SemanticKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, SemanticKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, SemanticKind::Boolean)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, SemanticKind::String)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, SemanticKind::Timestamp)
    }

    pub fn blob(name: impl Into<String>) -> Self {
        Self::new(name, SemanticKind::StructuredBlob)
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Not persisted; skipped by extraction.
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }
}

/// A type that maps onto one table.
///
/// ```
/// use tablesync::schema::{Entity, FieldDef};
///
/// struct Room;
///
/// impl Entity for Room {
///     const TABLE: &'static str = "room";
///
///     fn fields() -> Vec<FieldDef> {
///         vec![
///             FieldDef::integer("Id"),
///             FieldDef::integer("Uid").tag("index:uid_name,unique"),
///             FieldDef::string("RoomName").tag("index:uid_name"),
///             FieldDef::timestamp("Ctime"),
///         ]
///     }
/// }
///
/// let table = Room::descriptor().unwrap();
/// assert_eq!(table.columns.len(), 4);
/// assert_eq!(table.indexes[0].columns, ["uid", "room_name"]);
/// ```
pub trait Entity {
    const TABLE: &'static str;

    fn fields() -> Vec<FieldDef>;

    fn descriptor() -> Result<TableDescriptor, ConfigError> {
        TableDescriptor::extract(Self::TABLE, &Self::fields())
    }
}

/// Entity declared in configuration instead of code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityDef {
    pub table: String,
    pub fields: Vec<FieldDef>,
}

impl EntityDef {
    pub fn descriptor(&self) -> Result<TableDescriptor, ConfigError> {
        TableDescriptor::extract(&self.table, &self.fields)
    }
}

impl TableDescriptor {
    /// Build the descriptor from a field list in declaration order.
    pub fn extract(table: &str, fields: &[FieldDef]) -> Result<TableDescriptor, ConfigError> {
        let mut descriptor = TableDescriptor::new(table);
        // index name -> (position in descriptor.indexes, kind was explicit)
        let mut index_slots: HashMap<String, (usize, bool)> = HashMap::new();

        for field in fields {
            let tags = parse_tags(&field.name, &field.tag)?;
            if field.excluded || tags.excluded {
                continue;
            }
            let column_name = to_snake_case(&field.name);
            if descriptor.column(&column_name).is_some() {
                return Err(ConfigError::DuplicateColumn {
                    table: table.to_string(),
                    column: column_name,
                });
            }

            let mut column = ColumnDescriptor::new(column_name.clone(), field.kind);
            column.nullable = field.optional;
            column.explicit_type = tags.sql_type;
            column.explicit_length = tags.length;
            column.explicit_default = tags.default;
            descriptor.columns.push(column);

            for index in tags.indexes {
                if index.name.is_empty() {
                    return Err(ConfigError::EmptyIndex {
                        table: table.to_string(),
                        index: format!("<unnamed on {}>", column_name),
                    });
                }
                match index_slots.get_mut(&index.name) {
                    Some((pos, explicit)) => {
                        let existing = &mut descriptor.indexes[*pos];
                        existing.columns.push(column_name.clone());
                        if let (false, Some(kind)) = (*explicit, index.kind) {
                            existing.kind = kind;
                            *explicit = true;
                        }
                    }
                    None => {
                        index_slots.insert(index.name.clone(), (descriptor.indexes.len(), index.kind.is_some()));
                        descriptor.indexes.push(IndexDescriptor {
                            name: index.name,
                            kind: index.kind.unwrap_or(IndexKind::Plain),
                            columns: vec![column_name.clone()],
                        });
                    }
                }
            }
        }

        tracing::debug!(
            table = %table,
            columns = descriptor.columns.len(),
            indexes = descriptor.indexes.len(),
            "extracted table descriptor"
        );
        Ok(descriptor)
    }
}
