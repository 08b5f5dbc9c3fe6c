//! Field tag grammar: whitespace-separated `key:value` tokens.
//!
//! `type:TEXT length:15 default:'aa' index:name,unique`

use crate::error::ConfigError;
use crate::schema::IndexKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagPair {
    pub key: String,
    pub value: String,
}

/// Index membership declared by one `index:` token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexTag {
    pub name: String,
    /// `None` when the token names no kind (`index:c`).
    pub kind: Option<IndexKind>,
}

/// Everything a tag says about one field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldTags {
    pub sql_type: Option<String>,
    pub length: Option<String>,
    pub default: Option<String>,
    pub indexes: Vec<IndexTag>,
    pub excluded: bool,
}

/// Split a tag into ordered pairs. A token without `:` is a developer error, except the bare
/// exclusion marker `-`.
pub fn parse_pairs(field: &str, tag: &str) -> Result<Vec<TagPair>, ConfigError> {
    let mut pairs = Vec::new();
    for token in tag.split_whitespace() {
        if token == "-" {
            pairs.push(TagPair {
                key: "db".into(),
                value: "-".into(),
            });
            continue;
        }
        let Some((key, value)) = token.split_once(':') else {
            return Err(ConfigError::MalformedTag {
                field: field.to_string(),
                token: token.to_string(),
            });
        };
        pairs.push(TagPair {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        });
    }
    Ok(pairs)
}

pub fn parse_tags(field: &str, tag: &str) -> Result<FieldTags, ConfigError> {
    let mut tags = FieldTags::default();
    for pair in parse_pairs(field, tag)? {
        match pair.key.as_str() {
            "type" if !pair.value.is_empty() => tags.sql_type = Some(pair.value.to_uppercase()),
            "length" if !pair.value.is_empty() => tags.length = Some(pair.value),
            "default" if !pair.value.is_empty() => tags.default = Some(pair.value),
            "index" => {
                let (name, kind) = match pair.value.split_once(',') {
                    Some((name, kind)) => (name, IndexKind::from_tag(kind)),
                    None => (pair.value.as_str(), None),
                };
                tags.indexes.push(IndexTag {
                    name: name.to_string(),
                    kind,
                });
            }
            "db" if pair.value == "-" => tags.excluded = true,
            _ => {}
        }
    }
    Ok(tags)
}
