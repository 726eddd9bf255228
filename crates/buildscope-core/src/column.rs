//! Declarative column model.

use crate::format;
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};

/// How a column's raw values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    /// Lexicographic on the raw text
    #[default]
    String,
    /// Numeric on the raw value
    Int,
}

/// Display formatter applied to a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatter {
    /// Seconds as `1h 2m 3s`
    Duration,
    /// Epoch milliseconds as `YYYY/MM/DD HH:MM:SS`
    Timestamp,
    /// Epoch milliseconds as `YYYY/MM/DD HH:MM`
    TimestampMinutes,
    /// Build number as `#n`
    BuildNumber,
}

impl Formatter {
    /// Format a raw value. Non-numeric input falls back to its plain text.
    #[must_use]
    pub fn apply(self, value: &FieldValue) -> String {
        let Some(n) = value.as_number() else {
            return value.display();
        };
        match self {
            Self::Duration => format::human_duration(n),
            Self::Timestamp => format::timestamp(n as i64),
            Self::TimestampMinutes => format::timestamp_minutes(n as i64),
            Self::BuildNumber => format!("#{}", value.display()),
        }
    }
}

/// Problem categories that link to a filtered detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCategory {
    /// Unstable builds
    Unstable,
    /// Failed builds
    Failure,
    /// Aborted builds
    Aborted,
    /// Failed test runs
    Failed,
}

impl ProblemCategory {
    /// Query parameter value carried by the detail link (`f=`).
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Unstable => "UNSTABLE",
            Self::Failure => "FAILURE",
            Self::Aborted => "ABORTED",
            Self::Failed => "FAILED",
        }
    }

    /// CSS class for the link.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Unstable => "unstable",
            Self::Failure => "failure",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        }
    }
}

/// What a column means to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Ordinary value column
    #[default]
    Plain,
    /// Identifies the row (project or test name); carries the tree control
    Identity,
    /// Count column; zero renders as a de-emphasized marker
    Count,
    /// Count of problems of one category; non-zero renders as a link
    Problem(ProblemCategory),
    /// Build result (SUCCESS, FAILURE, ...)
    Result,
    /// Sub-build label column
    SubBuild,
}

impl ColumnRole {
    /// Infer the role from a column key.
    #[must_use]
    pub fn infer(key: &str) -> Self {
        if key == "count" {
            return Self::Count;
        }
        if !key.ends_with("_count") {
            return Self::Plain;
        }
        match key.split('_').next() {
            Some("unstable") => Self::Problem(ProblemCategory::Unstable),
            Some("failure") => Self::Problem(ProblemCategory::Failure),
            Some("aborted") => Self::Problem(ProblemCategory::Aborted),
            Some("failed") => Self::Problem(ProblemCategory::Failed),
            _ => Self::Count,
        }
    }

    /// Check whether zero values collapse to a marker.
    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Count | Self::Problem(_))
    }
}

/// Column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Field key in the row
    pub key: String,
    /// Header label
    pub label: String,
    /// Sort comparison
    #[serde(default)]
    pub sort_type: SortType,
    /// Optional display formatter
    #[serde(default)]
    pub formatter: Option<Formatter>,
    /// Renderer role
    #[serde(default)]
    pub role: ColumnRole,
}

impl Column {
    /// Create a string-sorted column; the role is inferred from the key.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        let key = key.into();
        let role = ColumnRole::infer(&key);
        Self {
            key,
            label: label.into(),
            sort_type: SortType::String,
            formatter: None,
            role,
        }
    }

    /// Sort numerically.
    #[must_use]
    pub const fn int(mut self) -> Self {
        self.sort_type = SortType::Int;
        self
    }

    /// Set the formatter.
    #[must_use]
    pub const fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Set the role.
    #[must_use]
    pub const fn role(mut self, role: ColumnRole) -> Self {
        self.role = role;
        self
    }

    /// Format a raw value for display.
    #[must_use]
    pub fn format(&self, value: &FieldValue) -> String {
        self.formatter
            .map_or_else(|| value.display(), |f| f.apply(value))
    }
}

/// Find a column by key.
#[must_use]
pub fn find_column<'a>(columns: &'a [Column], key: &str) -> Option<&'a Column> {
    columns.iter().find(|c| c.key == key)
}
