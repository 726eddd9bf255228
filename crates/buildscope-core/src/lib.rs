//! Core types for buildscope tables.
//!
//! This crate holds everything that decides what a build-history table shows,
//! independent of any rendering target:
//! - Row model: [`Row`] (root or child), [`FieldValue`], [`RowSchema`]
//! - Column model: [`Column`], [`SortType`], [`Formatter`], [`ColumnRole`]
//! - Sort engine: [`sort_rows`], [`SortSpec`]
//! - Tree organizer: [`TreeState`], [`ChildIndex`], [`organize`]
//! - Filter engine: [`FilterState`], [`filter_candidates`]
//! - Derivation: [`derive_visible_rows`] over a [`TableViewState`]

mod brick;
mod column;
mod filter;
pub mod format;
mod row;
mod sort;
mod tree;
mod value;
mod view;

pub use brick::{escape_html, Brick};
pub use column::{find_column, Column, ColumnRole, Formatter, ProblemCategory, SortType};
pub use filter::{filter_candidates, FilterState};
pub use row::{ChildRow, Fields, RootRow, Row, RowError, RowSchema};
pub use sort::{
    compare_rows, compare_values, sort_indices, sort_order, sort_rows, SortDirection, SortSpec,
};
pub use tree::{organize, ChildIndex, PlacedRow, Placement, TreeNodeState, TreeState};
pub use value::FieldValue;
pub use view::{
    derive_visible_rows, visible_rows, RowView, TableViewState, TreeControl, ViewError,
};
