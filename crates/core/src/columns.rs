use std::fmt;

use serde_json::{Map, Value};

use crate::gateway::RawColumn;

pub const UNKNOWN_FIELD: &str = "unknown field";
pub const UNKNOWN_TYPE: &str = "unknown type";
pub const PRIMARY_KEY_ROLE: &str = "PRI";

const NAME_KEYS: [&str; 3] = ["columnName", "name", "field"];
const TYPE_KEYS: [&str; 3] = ["typeName", "dataType", "type"];
const NULLABLE_KEYS: [&str; 3] = ["nullable", "isNullable", "nullAble"];
const PRIMARY_KEY_FLAGS: [&str; 2] = ["primaryKey", "isPrimary"];
const DEFAULT_KEYS: [&str; 2] = ["default", "defaultValue"];
const EXTRA_KEYS: [&str; 3] = ["extra", "comment", "remarks"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nullability {
    Yes,
    No,
    #[default]
    Unknown,
}

impl fmt::Display for Nullability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yes => "YES",
            Self::No => "NO",
            Self::Unknown => "-",
        })
    }
}

/// An explicit `null` default is kept apart from a missing one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DefaultValue {
    #[default]
    Absent,
    Null,
    Value(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("-"),
            Self::Null => f.write_str("null"),
            Self::Value(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub data_type: String,
    pub nullable: Nullability,
    pub key_role: Option<String>,
    pub default_value: DefaultValue,
    pub extra: Option<String>,
}

impl ColumnDescriptor {
    #[must_use]
    pub fn named(column_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: UNKNOWN_TYPE.to_string(),
            nullable: Nullability::Unknown,
            key_role: None,
            default_value: DefaultValue::Absent,
            extra: None,
        }
    }

    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.key_role.as_deref() == Some(PRIMARY_KEY_ROLE)
    }

    /// `normalize(&d.to_raw()) == d`
    #[must_use]
    pub fn to_raw(&self) -> RawColumn {
        let mut raw = Map::new();
        raw.insert(NAME_KEYS[0].to_string(), Value::from(self.column_name.clone()));
        raw.insert(TYPE_KEYS[0].to_string(), Value::from(self.data_type.clone()));
        match self.nullable {
            Nullability::Yes => {
                raw.insert(NULLABLE_KEYS[0].to_string(), Value::Bool(true));
            }
            Nullability::No => {
                raw.insert(NULLABLE_KEYS[0].to_string(), Value::Bool(false));
            }
            Nullability::Unknown => {}
        }
        if let Some(key_role) = &self.key_role {
            raw.insert("key".to_string(), Value::from(key_role.clone()));
        }
        match &self.default_value {
            DefaultValue::Absent => {}
            DefaultValue::Null => {
                raw.insert(DEFAULT_KEYS[0].to_string(), Value::Null);
            }
            DefaultValue::Value(value) => {
                raw.insert(DEFAULT_KEYS[0].to_string(), Value::from(value.clone()));
            }
        }
        if let Some(extra) = &self.extra {
            raw.insert(EXTRA_KEYS[0].to_string(), Value::from(extra.clone()));
        }
        raw
    }
}

#[must_use]
pub fn normalize(raw: &RawColumn) -> ColumnDescriptor {
    ColumnDescriptor {
        column_name: first_text(raw, &NAME_KEYS).unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        data_type: first_text(raw, &TYPE_KEYS).unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
        nullable: nullability(raw),
        key_role: key_role(raw),
        default_value: default_value(raw),
        extra: first_text(raw, &EXTRA_KEYS),
    }
}

#[must_use]
pub fn normalize_all(raw_columns: &[RawColumn]) -> Vec<ColumnDescriptor> {
    raw_columns.iter().map(normalize).collect()
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn first_text(raw: &RawColumn, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| raw.get(*key).and_then(text))
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => {
            let text = text.trim();
            if ["YES", "Y", "TRUE"]
                .iter()
                .any(|candidate| text.eq_ignore_ascii_case(candidate))
            {
                Some(true)
            } else if ["NO", "N", "FALSE"]
                .iter()
                .any(|candidate| text.eq_ignore_ascii_case(candidate))
            {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn nullability(raw: &RawColumn) -> Nullability {
    let flags = NULLABLE_KEYS
        .iter()
        .filter_map(|key| raw.get(*key).and_then(flag))
        .collect::<Vec<_>>();

    if flags.contains(&true) {
        Nullability::Yes
    } else if flags.contains(&false) {
        Nullability::No
    } else {
        Nullability::Unknown
    }
}

fn key_role(raw: &RawColumn) -> Option<String> {
    if let Some(key) = raw
        .get("key")
        .and_then(text)
        .filter(|key| !key.trim().is_empty())
    {
        return Some(key);
    }

    PRIMARY_KEY_FLAGS
        .iter()
        .any(|key| raw.get(*key).and_then(flag) == Some(true))
        .then(|| PRIMARY_KEY_ROLE.to_string())
}

fn default_value(raw: &RawColumn) -> DefaultValue {
    if let Some(value) = first_text(raw, &DEFAULT_KEYS) {
        return DefaultValue::Value(value);
    }
    if DEFAULT_KEYS.iter().any(|key| raw.contains_key(*key)) {
        DefaultValue::Null
    } else {
        DefaultValue::Absent
    }
}
