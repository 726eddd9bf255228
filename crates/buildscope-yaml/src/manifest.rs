//! Table manifests: a table's columns, row schema and default sort, loaded
//! from YAML.

use crate::error::ParseError;
use buildscope_core::{
    Column, ColumnRole, Formatter, ProblemCategory, RowSchema, SortDirection, SortSpec, SortType,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column role as written in a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    /// Ordinary value column
    Plain,
    /// Row identity, carries the tree control
    Identity,
    /// Count column
    Count,
    /// Unstable build count
    Unstable,
    /// Failed build count
    Failure,
    /// Aborted build count
    Aborted,
    /// Failed test count
    Failed,
    /// Build result
    Result,
    /// Sub-build label
    SubBuild,
}

impl From<RoleName> for ColumnRole {
    fn from(role: RoleName) -> Self {
        match role {
            RoleName::Plain => Self::Plain,
            RoleName::Identity => Self::Identity,
            RoleName::Count => Self::Count,
            RoleName::Unstable => Self::Problem(ProblemCategory::Unstable),
            RoleName::Failure => Self::Problem(ProblemCategory::Failure),
            RoleName::Aborted => Self::Problem(ProblemCategory::Aborted),
            RoleName::Failed => Self::Problem(ProblemCategory::Failed),
            RoleName::Result => Self::Result,
            RoleName::SubBuild => Self::SubBuild,
        }
    }
}

/// One column entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Field key in the row
    pub key: String,
    /// Header label
    pub label: String,
    /// Sort comparison
    #[serde(default, rename = "sort")]
    pub sort_type: SortType,
    /// Display formatter
    #[serde(default, rename = "format")]
    pub formatter: Option<Formatter>,
    /// Renderer role; inferred from the key when absent
    #[serde(default)]
    pub role: Option<RoleName>,
}

impl ColumnConfig {
    /// Build the column model entry.
    #[must_use]
    pub fn to_column(&self) -> Column {
        let role = self
            .role
            .map_or_else(|| ColumnRole::infer(&self.key), ColumnRole::from);
        Column {
            key: self.key.clone(),
            label: self.label.clone(),
            sort_type: self.sort_type,
            formatter: self.formatter,
            role,
        }
    }
}

/// Default sort entry. A bare column key sorts descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultSort {
    /// Column key, descending
    Column(String),
    /// Column key and direction
    Spec(SortSpec),
}

impl DefaultSort {
    /// Column key.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Column(c) => c,
            Self::Spec(s) => &s.column,
        }
    }

    /// As a sort spec.
    #[must_use]
    pub fn to_spec(&self) -> SortSpec {
        match self {
            Self::Column(c) => SortSpec::new(c.clone(), SortDirection::Descending),
            Self::Spec(s) => s.clone(),
        }
    }
}

/// Table manifest loaded from a `tables/*.yaml` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableManifest {
    /// Table name
    pub name: String,
    /// Title shown above the table
    #[serde(default)]
    pub title: String,
    /// How records map to root and child rows
    pub schema: RowSchema,
    /// Sort applied before first display
    pub default_sort: DefaultSort,
    /// Message shown instead of the table when there are no rows
    #[serde(default)]
    pub empty_message: String,
    /// Columns in display order
    pub columns: Vec<ColumnConfig>,
}

impl TableManifest {
    /// Parse a manifest from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml_ng::Error> {
        serde_yaml_ng::from_str(yaml)
    }

    /// Serialize manifest to YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(self)
    }

    /// Parse and validate.
    pub fn load(yaml: &str) -> Result<Self, ParseError> {
        let manifest = Self::from_yaml(yaml)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the manifest is usable as a table definition.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.name.trim().is_empty() {
            return Err(ParseError::Validation("name must not be empty".to_string()));
        }
        if self.schema.key_field.trim().is_empty() {
            return Err(ParseError::Validation(format!(
                "table '{}': schema.key_field must not be empty",
                self.name
            )));
        }
        if self.columns.is_empty() {
            return Err(ParseError::Validation(format!(
                "table '{}': columns must not be empty",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.key.as_str()) {
                return Err(ParseError::DuplicateColumn(column.key.clone()));
            }
        }

        let default = self.default_sort.column();
        if !seen.contains(default) {
            return Err(ParseError::UnknownDefaultColumn(default.to_string()));
        }
        Ok(())
    }

    /// Column model in display order.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        self.columns.iter().map(ColumnConfig::to_column).collect()
    }

    /// Default sort.
    #[must_use]
    pub fn default_sort(&self) -> SortSpec {
        self.default_sort.to_spec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILDS_YAML: &str = r#"
name: builds
title: Builds
schema:
  key_field: jenkins_project
  sub_label_field: sub_build_labels
default_sort: count
empty_message: No builds in this time period
columns:
  - key: jenkins_project
    label: project
    role: identity
  - key: avg
    label: avg dur.
    sort: int
    format: duration
  - key: count
    label: "total #"
    sort: int
  - key: failure_count
    label: "failure #"
    sort: int
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = TableManifest::load(BUILDS_YAML).unwrap();
        assert_eq!(manifest.name, "builds");
        assert_eq!(manifest.title, "Builds");
        assert_eq!(manifest.empty_message, "No builds in this time period");
        assert_eq!(
            manifest.schema,
            RowSchema::grouped("jenkins_project", "sub_build_labels")
        );
        assert_eq!(manifest.default_sort(), SortSpec::descending("count"));
    }

    #[test]
    fn test_columns_with_inferred_roles() {
        let columns = TableManifest::load(BUILDS_YAML).unwrap().columns();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].role, ColumnRole::Identity);
        assert_eq!(columns[1].sort_type, SortType::Int);
        assert_eq!(columns[1].formatter, Some(Formatter::Duration));
        assert_eq!(columns[2].role, ColumnRole::Count);
        assert_eq!(
            columns[3].role,
            ColumnRole::Problem(ProblemCategory::Failure)
        );
    }

    #[test]
    fn test_explicit_role_overrides_inference() {
        let config = ColumnConfig {
            key: "failure_count".to_string(),
            label: "f".to_string(),
            sort_type: SortType::Int,
            formatter: None,
            role: Some(RoleName::Plain),
        };
        assert_eq!(config.to_column().role, ColumnRole::Plain);
    }

    #[test]
    fn test_default_sort_with_direction() {
        let yaml = BUILDS_YAML.replace(
            "default_sort: count",
            "default_sort:\n  column: avg\n  direction: ascending",
        );
        let manifest = TableManifest::load(&yaml).unwrap();
        assert_eq!(
            manifest.default_sort(),
            SortSpec::new("avg", SortDirection::Ascending)
        );
    }

    #[test]
    fn test_unknown_default_column() {
        let yaml = BUILDS_YAML.replace("default_sort: count", "default_sort: nope");
        let err = TableManifest::load(&yaml).unwrap_err();
        assert!(matches!(err, ParseError::UnknownDefaultColumn(c) if c == "nope"));
    }

    #[test]
    fn test_duplicate_column() {
        let yaml = format!("{BUILDS_YAML}  - key: avg\n    label: again\n");
        let err = TableManifest::load(&yaml).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateColumn(c) if c == "avg"));
    }

    #[test]
    fn test_empty_columns() {
        let yaml = r"
name: t
schema:
  key_field: k
default_sort: k
columns: []
";
        let err = TableManifest::load(yaml).unwrap_err();
        assert!(matches!(err, ParseError::Validation(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            TableManifest::load("name: [").unwrap_err(),
            ParseError::Yaml(_)
        ));
    }

    #[test]
    fn test_roundtrip() {
        let manifest = TableManifest::load(BUILDS_YAML).unwrap();
        let yaml = manifest.to_yaml().unwrap();
        let manifest2 = TableManifest::load(&yaml).unwrap();
        assert_eq!(manifest, manifest2);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_load_never_panics(input in ".{0,200}") {
                let _ = TableManifest::load(&input);
            }

            #[test]
            fn prop_default_must_be_a_column(keys in prop::collection::hash_set("[a-z]{1,8}", 1..6), pick in any::<prop::sample::Index>()) {
                let keys: Vec<String> = keys.into_iter().collect();
                let default = pick.get(&keys).clone();
                let manifest = TableManifest {
                    name: "t".to_string(),
                    title: String::new(),
                    schema: RowSchema::flat("k"),
                    default_sort: DefaultSort::Column(default),
                    empty_message: String::new(),
                    columns: keys
                        .iter()
                        .map(|k| ColumnConfig {
                            key: k.clone(),
                            label: k.clone(),
                            sort_type: SortType::String,
                            formatter: None,
                            role: None,
                        })
                        .collect(),
                };
                prop_assert!(manifest.validate().is_ok());
                prop_assert_eq!(manifest.columns().len(), keys.len());
            }
        }
    }
}
