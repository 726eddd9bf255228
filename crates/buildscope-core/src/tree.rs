//! Tree organizer: groups child rows under their root row.
//!
//! After every sort or refresh the document order is rebuilt so that each
//! child row immediately follows its root row. Children of one root are
//! ordered by label, descending. Children whose root is not in the current
//! collection are orphans: they are placed after all groups and are never
//! visible.

use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Open/closed state of one root row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNodeState {
    /// Children shown
    Open,
    /// Children hidden
    Closed,
    /// Never rendered with children yet
    #[default]
    Unset,
}

/// Per-root open/closed flags for one table instance.
///
/// Entries are never removed. A root missing from a new row collection keeps
/// its entry and simply has nothing to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeState {
    states: HashMap<String, TreeNodeState>,
}

impl TreeState {
    /// Create an empty tree state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a root key.
    #[must_use]
    pub fn get(&self, key: &str) -> TreeNodeState {
        self.states.get(key).copied().unwrap_or_default()
    }

    /// Check whether a root is open.
    #[must_use]
    pub fn is_open(&self, key: &str) -> bool {
        self.get(key) == TreeNodeState::Open
    }

    /// Turn `Unset` into `Closed`. Returns `true` if the entry was created.
    ///
    /// Unset already renders as closed, so this never changes what is shown.
    pub fn initialize(&mut self, key: &str) -> bool {
        if self.get(key) != TreeNodeState::Unset {
            return false;
        }
        self.states.insert(key.to_string(), TreeNodeState::Closed);
        true
    }

    /// Flip a root between open and closed. Returns the new state, or `None`
    /// if the root has no expand/collapse control yet.
    pub fn toggle(&mut self, key: &str) -> Option<TreeNodeState> {
        let next = match self.get(key) {
            TreeNodeState::Open => TreeNodeState::Closed,
            TreeNodeState::Closed => TreeNodeState::Open,
            TreeNodeState::Unset => return None,
        };
        self.states.insert(key.to_string(), next);
        debug!(root = key, state = ?next, "tree toggled");
        Some(next)
    }

    /// Set a root explicitly open or closed.
    pub fn set(&mut self, key: impl Into<String>, open: bool) {
        let state = if open {
            TreeNodeState::Open
        } else {
            TreeNodeState::Closed
        };
        self.states.insert(key.into(), state);
    }

    /// Number of roots with a recorded state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if no root has a recorded state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Parent key → child row indices, in sub-order.
#[derive(Debug, Clone, Default)]
pub struct ChildIndex {
    groups: HashMap<String, Vec<usize>>,
}

impl ChildIndex {
    /// Build the index from rows in the given (sorted) order.
    ///
    /// Children are ordered by label descending; equal labels keep `order`.
    #[must_use]
    pub fn build(rows: &[Row], order: &[usize]) -> Self {
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for &i in order {
            if let Row::Child(child) = &rows[i] {
                groups.entry(child.parent_key.clone()).or_default().push(i);
            }
        }
        for children in groups.values_mut() {
            children.sort_by(|&a, &b| rows[b].key().cmp(rows[a].key()));
        }
        Self { groups }
    }

    /// Children of a root, in sub-order.
    #[must_use]
    pub fn children(&self, parent: &str) -> &[usize] {
        self.groups.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check whether a root has at least one child.
    #[must_use]
    pub fn has_children(&self, parent: &str) -> bool {
        !self.children(parent).is_empty()
    }

    /// Number of parent groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Where a row landed in the document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// A root row
    Root,
    /// A child directly under its root
    Child,
    /// A child whose root is absent
    Orphan,
}

/// One row in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedRow {
    /// Index into the row collection
    pub index: usize,
    /// Placement kind
    pub placement: Placement,
}

/// Re-splice children after their roots.
///
/// Roots keep their position from `sorted`. A key shared by several root rows
/// gets its children after the first of them. Orphan groups follow all roots,
/// in order of first appearance in `sorted`.
#[must_use]
pub fn organize(rows: &[Row], sorted: &[usize], index: &ChildIndex) -> Vec<PlacedRow> {
    let mut placed = Vec::with_capacity(sorted.len());
    let mut processed: HashSet<&str> = HashSet::new();

    for &i in sorted {
        let Row::Root(root) = &rows[i] else {
            continue;
        };
        placed.push(PlacedRow {
            index: i,
            placement: Placement::Root,
        });
        if processed.insert(root.key.as_str()) {
            placed.extend(index.children(&root.key).iter().map(|&c| PlacedRow {
                index: c,
                placement: Placement::Child,
            }));
        }
    }

    let mut orphan_parents: Vec<&str> = Vec::new();
    for &i in sorted {
        if let Row::Child(child) = &rows[i] {
            let parent = child.parent_key.as_str();
            if !processed.contains(parent) && !orphan_parents.contains(&parent) {
                orphan_parents.push(parent);
            }
        }
    }
    if !orphan_parents.is_empty() {
        debug!(groups = orphan_parents.len(), "hiding orphaned child rows");
    }
    for parent in orphan_parents {
        placed.extend(index.children(parent).iter().map(|&c| PlacedRow {
            index: c,
            placement: Placement::Orphan,
        }));
    }

    placed
}
