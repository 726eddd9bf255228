//! Filter engine: narrows the table to a single project group.

use crate::row::Row;
use crate::tree::Placement;
use crate::view::RowView;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// The active project filter. An empty key means no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    project: String,
}

impl FilterState {
    /// Create an inactive filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active project key (`""` when inactive).
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Check if a filter key is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.project.is_empty()
    }

    /// Set the filter key. `""` clears it. Returns `true` if it changed.
    pub fn apply(&mut self, project: impl Into<String>) -> bool {
        let project = project.into();
        if project == self.project {
            return false;
        }
        debug!(from = %self.project, to = %project, "project filter changed");
        self.project = project;
        true
    }

    /// Clear the filter.
    pub fn clear(&mut self) -> bool {
        self.apply(String::new())
    }

    /// Check whether a row group passes the filter.
    #[must_use]
    pub fn admits(&self, group_key: &str) -> bool {
        !self.is_active() || self.project == group_key
    }
}

/// Filter suggestions: sorted, distinct keys of the visible root rows.
#[must_use]
pub fn filter_candidates(rows: &[Row], views: &[RowView]) -> Vec<String> {
    views
        .iter()
        .filter(|v| v.visible && v.placement == Placement::Root)
        .map(|v| rows[v.index].key().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
