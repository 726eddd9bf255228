//! Table rows: root rows and the child rows grouped under them.
//!
//! A record is classified once, at ingestion, by a [`RowSchema`]. Everything
//! downstream matches on [`Row`] instead of probing fields.

use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Field map of a row.
pub type Fields = HashMap<String, FieldValue>;

/// Errors raised while turning raw records into rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// The record has no value for the grouping key field
    #[error("record {index} has no value for key field '{field}'")]
    MissingKey {
        /// Position of the record in the response
        index: usize,
        /// Name of the key field
        field: String,
    },
    /// The record is not a JSON object
    #[error("record {index} is not an object")]
    NotAnObject {
        /// Position of the record in the response
        index: usize,
    },
}

/// A top-level row (e.g. a named build).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootRow {
    /// Group key (project name)
    pub key: String,
    /// Raw field values
    pub fields: Fields,
}

/// A sub-row (e.g. a per-OS run of a build).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRow {
    /// Sub-row label, also its display label
    pub key: String,
    /// Key of the root row this row belongs to
    pub parent_key: String,
    /// Raw field values
    pub fields: Fields,
}

/// A table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    /// Root row
    Root(RootRow),
    /// Child row
    Child(ChildRow),
}

impl Row {
    /// Create a root row.
    #[must_use]
    pub fn root(key: impl Into<String>) -> Self {
        Self::Root(RootRow {
            key: key.into(),
            fields: Fields::new(),
        })
    }

    /// Create a child row.
    #[must_use]
    pub fn child(key: impl Into<String>, parent_key: impl Into<String>) -> Self {
        Self::Child(ChildRow {
            key: key.into(),
            parent_key: parent_key.into(),
            fields: Fields::new(),
        })
    }

    /// Add a field value.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields_mut().insert(key.into(), value.into());
        self
    }

    /// Row key: the project name for roots, the sub-label for children.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Root(r) => &r.key,
            Self::Child(c) => &c.key,
        }
    }

    /// Key of the group this row belongs to: itself for roots, the parent for
    /// children.
    #[must_use]
    pub fn group_key(&self) -> &str {
        match self {
            Self::Root(r) => &r.key,
            Self::Child(c) => &c.parent_key,
        }
    }

    /// Parent key, `None` for roots.
    #[must_use]
    pub fn parent_key(&self) -> Option<&str> {
        match self {
            Self::Root(_) => None,
            Self::Child(c) => Some(&c.parent_key),
        }
    }

    /// Check if this is a root row.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root(_))
    }

    /// Raw field values.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        match self {
            Self::Root(r) => &r.fields,
            Self::Child(c) => &c.fields,
        }
    }

    fn fields_mut(&mut self) -> &mut Fields {
        match self {
            Self::Root(r) => &mut r.fields,
            Self::Child(c) => &mut c.fields,
        }
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields().get(key)
    }

    /// Get a field value, `Empty` when absent.
    #[must_use]
    pub fn value(&self, key: &str) -> &FieldValue {
        const EMPTY: &FieldValue = &FieldValue::Empty;
        self.get(key).unwrap_or(EMPTY)
    }
}

/// Describes how raw records map onto root and child rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSchema {
    /// Field holding the group key (e.g. `jenkins_project`)
    pub key_field: String,
    /// Field whose presence marks a child row (e.g. `sub_build_labels`).
    /// `None` means every record is a root.
    #[serde(default)]
    pub sub_label_field: Option<String>,
}

impl RowSchema {
    /// Create a schema where every record is a root row.
    #[must_use]
    pub fn flat(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            sub_label_field: None,
        }
    }

    /// Create a schema with root and child rows.
    #[must_use]
    pub fn grouped(key_field: impl Into<String>, sub_label_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            sub_label_field: Some(sub_label_field.into()),
        }
    }

    /// Classify one record.
    pub fn ingest(&self, index: usize, fields: Fields) -> Result<Row, RowError> {
        let key = fields
            .get(&self.key_field)
            .filter(|v| !v.is_blank())
            .map(FieldValue::display)
            .ok_or_else(|| RowError::MissingKey {
                index,
                field: self.key_field.clone(),
            })?;

        let sub_label = self
            .sub_label_field
            .as_ref()
            .and_then(|f| fields.get(f))
            .filter(|v| !v.is_blank())
            .map(FieldValue::display);

        Ok(match sub_label {
            Some(label) => Row::Child(ChildRow {
                key: label,
                parent_key: key,
                fields,
            }),
            None => Row::Root(RootRow { key, fields }),
        })
    }

    /// Classify a list of JSON records.
    pub fn ingest_json(&self, records: &[serde_json::Value]) -> Result<Vec<Row>, RowError> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let object = record.as_object().ok_or(RowError::NotAnObject { index })?;
                let fields = object
                    .iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v)))
                    .collect();
                self.ingest(index, fields)
            })
            .collect()
    }
}
