//! Sort engine: a stable total order over rows for one column.

use crate::column::{Column, SortType};
use crate::row::Row;
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first
    Ascending,
    /// Largest first
    #[default]
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Arrow shown next to the sorted header.
    #[must_use]
    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Ascending => "\u{25b2}",
            Self::Descending => "\u{25bc}",
        }
    }
}

/// Active sort: a column key and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column key
    pub column: String,
    /// Direction
    pub direction: SortDirection,
}

impl SortSpec {
    /// Create a sort spec.
    #[must_use]
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Descending sort on a column, the default for a fresh header click.
    #[must_use]
    pub fn descending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Descending)
    }

    /// Sort spec after clicking a header: same column toggles, another column
    /// starts descending.
    #[must_use]
    pub fn clicked(&self, column: &str) -> Self {
        if self.column == column {
            Self::new(column, self.direction.toggled())
        } else {
            Self::descending(column)
        }
    }
}

/// Compare two raw values under a sort type, ascending.
///
/// `Int` compares numbers; values that are not numbers sort below every
/// number. `String` compares text lexicographically; empty values sort first
/// and numbers compare by their display text.
#[must_use]
pub fn compare_values(a: &FieldValue, b: &FieldValue, sort_type: SortType) -> Ordering {
    match sort_type {
        SortType::Int => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        },
        SortType::String => match (a, b) {
            (FieldValue::Empty, FieldValue::Empty) => Ordering::Equal,
            (FieldValue::Empty, _) => Ordering::Less,
            (_, FieldValue::Empty) => Ordering::Greater,
            (FieldValue::Text(x), FieldValue::Text(y)) => x.cmp(y),
            _ => a.display().cmp(&b.display()),
        },
    }
}

/// Compare two rows by a column in a direction.
///
/// Descending flips the comparison but never the tie order, so the sort
/// stays stable both ways.
#[must_use]
pub fn compare_rows(a: &Row, b: &Row, column: &Column, direction: SortDirection) -> Ordering {
    let ord = compare_values(a.value(&column.key), b.value(&column.key), column.sort_type);
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

/// Stable permutation of `order` sorted by a column.
///
/// `order` is the current document order (indices into `rows`).
#[must_use]
pub fn sort_indices(
    rows: &[Row],
    order: &[usize],
    column: &Column,
    direction: SortDirection,
) -> Vec<usize> {
    let mut sorted = order.to_vec();
    sorted.sort_by(|&a, &b| compare_rows(&rows[a], &rows[b], column, direction));
    sorted
}

/// Stable sort order of all rows, as indices into `rows`.
#[must_use]
pub fn sort_order(rows: &[Row], column: &Column, direction: SortDirection) -> Vec<usize> {
    let identity: Vec<usize> = (0..rows.len()).collect();
    sort_indices(rows, &identity, column, direction)
}

/// Sort rows by a column. Stable: equal keys keep their input order.
#[must_use]
pub fn sort_rows(mut rows: Vec<Row>, column: &Column, direction: SortDirection) -> Vec<Row> {
    rows.sort_by(|a, b| compare_rows(a, b, column, direction));
    rows
}
