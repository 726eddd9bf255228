//! Visible-row derivation.
//!
//! What the table shows is a pure function of the rows and a
//! [`TableViewState`]: sort, then organize the tree, then apply tree and
//! filter visibility. Nothing here remembers what was visible before.

use crate::column::{find_column, Column};
use crate::filter::FilterState;
use crate::row::Row;
use crate::sort::{sort_order, SortSpec};
use crate::tree::{organize, ChildIndex, Placement, TreeState};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors from deriving the visible rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// The sort names a column that does not exist
    #[error("unknown sort column '{0}'")]
    UnknownSortColumn(String),
}

/// Expand/collapse control shown on a root row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeControl {
    /// Root has no children
    None,
    /// Children hidden
    Collapsed,
    /// Children shown
    Expanded,
}

/// A row in document order with its derived display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowView {
    /// Index into the row collection
    pub index: usize,
    /// Root, child or orphan
    pub placement: Placement,
    /// Tree control (roots only)
    pub control: TreeControl,
    /// Whether the row is shown
    pub visible: bool,
}

/// Sort, tree and filter state of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableViewState {
    /// Active sort
    pub sort: SortSpec,
    /// Per-root open/closed state
    pub tree: TreeState,
    /// Active project filter
    pub filter: FilterState,
}

impl TableViewState {
    /// Create a view state with a default sort and no tree or filter state.
    #[must_use]
    pub fn new(sort: SortSpec) -> Self {
        Self {
            sort,
            tree: TreeState::new(),
            filter: FilterState::new(),
        }
    }

    /// Initialize tree entries for every present root that has children.
    ///
    /// Returns the number of entries created.
    pub fn initialize_tree(&mut self, rows: &[Row]) -> usize {
        let order: Vec<usize> = (0..rows.len()).collect();
        let index = ChildIndex::build(rows, &order);
        rows.iter()
            .filter(|r| r.is_root() && index.has_children(r.key()))
            .filter(|r| self.tree.initialize(r.key()))
            .count()
    }
}

/// Derive document order and visibility for every row.
pub fn derive_visible_rows(
    rows: &[Row],
    columns: &[Column],
    state: &TableViewState,
) -> Result<Vec<RowView>, ViewError> {
    let column = find_column(columns, &state.sort.column)
        .ok_or_else(|| ViewError::UnknownSortColumn(state.sort.column.clone()))?;
    let sorted = sort_order(rows, column, state.sort.direction);
    let index = ChildIndex::build(rows, &sorted);
    let mut seen_roots: HashSet<&str> = HashSet::new();

    Ok(organize(rows, &sorted, &index)
        .into_iter()
        .map(|placed| {
            let row = &rows[placed.index];
            let group = row.group_key();
            let (control, visible) = match placed.placement {
                Placement::Root => {
                    // Children sit under the first root with a given key.
                    let first = seen_roots.insert(group);
                    let control = if !first || !index.has_children(group) {
                        TreeControl::None
                    } else if state.tree.is_open(group) {
                        TreeControl::Expanded
                    } else {
                        TreeControl::Collapsed
                    };
                    (control, state.filter.admits(group))
                }
                Placement::Child => (
                    TreeControl::None,
                    state.filter.admits(group) && state.tree.is_open(group),
                ),
                Placement::Orphan => (TreeControl::None, false),
            };
            RowView {
                index: placed.index,
                placement: placed.placement,
                control,
                visible,
            }
        })
        .collect())
}

/// The visible rows, in document order.
pub fn visible_rows<'a>(
    rows: &'a [Row],
    columns: &[Column],
    state: &TableViewState,
) -> Result<Vec<&'a Row>, ViewError> {
    Ok(derive_visible_rows(rows, columns, state)?
        .into_iter()
        .filter(|v| v.visible)
        .map(|v| &rows[v.index])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortDirection;
    use proptest::prelude::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("jenkins_project", "project"),
            Column::new("count", "total #").int(),
        ]
    }

    fn state() -> TableViewState {
        TableViewState::new(SortSpec::descending("count"))
    }

    fn visible_keys(rows: &[Row], state: &TableViewState) -> Vec<String> {
        visible_rows(rows, &columns(), state)
            .unwrap()
            .iter()
            .map(|r| r.key().to_string())
            .collect()
    }

    fn two_groups() -> Vec<Row> {
        vec![
            Row::root("A").field("count", 5),
            Row::child("a1", "A").field("count", 2),
            Row::root("B").field("count", 9),
            Row::child("b1", "B").field("count", 4),
            Row::child("b2", "B").field("count", 1),
        ]
    }

    #[test]
    fn test_unset_root_is_collapsed_and_children_hidden() {
        let rows = vec![Row::root("A"), Row::child("b1", "A")];
        let views = derive_visible_rows(&rows, &columns(), &state()).unwrap();
        assert_eq!(views[0].control, TreeControl::Collapsed);
        assert!(views[0].visible);
        assert_eq!(views[1].placement, Placement::Child);
        assert!(!views[1].visible);
    }

    #[test]
    fn test_open_root_shows_children() {
        let rows = vec![Row::root("A"), Row::child("b1", "A")];
        let mut st = state();
        st.initialize_tree(&rows);
        st.tree.toggle("A");
        let views = derive_visible_rows(&rows, &columns(), &st).unwrap();
        assert_eq!(views[0].control, TreeControl::Expanded);
        assert!(views[1].visible);
    }

    #[test]
    fn test_root_without_children_has_no_control() {
        let rows = vec![Row::root("A")];
        let views = derive_visible_rows(&rows, &columns(), &state()).unwrap();
        assert_eq!(views[0].control, TreeControl::None);
    }

    #[test]
    fn test_duplicate_root_has_no_control() {
        let rows = vec![
            Row::root("A").field("count", 3),
            Row::root("A").field("count", 1),
            Row::child("a1", "A"),
        ];
        let views = derive_visible_rows(&rows, &columns(), &state()).unwrap();
        let controls: Vec<_> = views.iter().map(|v| v.control).collect();
        assert_eq!(
            controls,
            vec![TreeControl::Collapsed, TreeControl::None, TreeControl::None]
        );
        assert_eq!(views[1].index, 2);
    }

    #[test]
    fn test_initialize_tree_only_roots_with_children() {
        let rows = two_groups();
        let mut st = state();
        assert_eq!(st.initialize_tree(&rows), 2);
        assert_eq!(st.initialize_tree(&rows), 0);
        let rows = vec![Row::root("C")];
        assert_eq!(st.initialize_tree(&rows), 0);
        assert_eq!(st.tree.len(), 2);
    }

    #[test]
    fn test_sorted_roots_then_children() {
        let rows = two_groups();
        let mut st = state();
        st.tree.set("A", true);
        st.tree.set("B", true);
        assert_eq!(visible_keys(&rows, &st), vec!["B", "b2", "b1", "A", "a1"]);
    }

    #[test]
    fn test_filter_keeps_matching_group_only() {
        let rows = two_groups();
        let mut st = state();
        st.tree.set("A", true);
        st.filter.apply("A");
        assert_eq!(visible_keys(&rows, &st), vec!["A", "a1"]);
        st.tree.set("A", false);
        assert_eq!(visible_keys(&rows, &st), vec!["A"]);
    }

    #[test]
    fn test_filter_does_not_touch_tree_state() {
        let rows = two_groups();
        let mut st = state();
        st.initialize_tree(&rows);
        st.tree.toggle("B");
        let before = st.tree.clone();
        st.filter.apply("A");
        let _ = derive_visible_rows(&rows, &columns(), &st).unwrap();
        st.filter.clear();
        assert_eq!(st.tree, before);
        assert_eq!(visible_keys(&rows, &st), vec!["B", "b2", "b1", "A"]);
    }

    #[test]
    fn test_orphans_never_visible() {
        let rows = vec![Row::root("A"), Row::child("x", "ghost")];
        let mut st = state();
        st.tree.set("ghost", true);
        let views = derive_visible_rows(&rows, &columns(), &st).unwrap();
        assert_eq!(views[1].placement, Placement::Orphan);
        assert!(!views[1].visible);
    }

    #[test]
    fn test_unknown_sort_column() {
        let st = TableViewState::new(SortSpec::new("nope", SortDirection::Ascending));
        assert_eq!(
            derive_visible_rows(&[], &columns(), &st),
            Err(ViewError::UnknownSortColumn("nope".to_string()))
        );
    }

    fn arb_rows() -> impl Strategy<Value = Vec<Row>> {
        prop::collection::vec((0u8..4, prop::option::of(0u8..5), 0i64..10), 0..30).prop_map(
            |specs| {
                specs
                    .into_iter()
                    .map(|(group, sub, count)| {
                        let parent = format!("g{group}");
                        match sub {
                            Some(s) => Row::child(format!("s{s}"), parent),
                            None => Row::root(parent),
                        }
                        .field("count", count)
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_toggle_round_trip_restores_visibility(rows in arb_rows(), root in 0u8..4) {
            let mut st = state();
            st.initialize_tree(&rows);
            let key = format!("g{root}");
            let before = derive_visible_rows(&rows, &columns(), &st).unwrap();
            if st.tree.toggle(&key).is_some() {
                st.tree.toggle(&key);
            }
            let after = derive_visible_rows(&rows, &columns(), &st).unwrap();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn prop_clearing_filter_restores_rows(rows in arb_rows(), open in prop::collection::vec(any::<bool>(), 4), target in 0u8..4) {
            let mut st = state();
            for (i, o) in open.iter().enumerate() {
                st.tree.set(format!("g{i}"), *o);
            }
            let before = derive_visible_rows(&rows, &columns(), &st).unwrap();
            st.filter.apply(format!("g{target}"));
            let filtered = derive_visible_rows(&rows, &columns(), &st).unwrap();
            for v in filtered.iter().filter(|v| v.visible) {
                prop_assert_eq!(rows[v.index].group_key(), format!("g{target}"));
            }
            st.filter.clear();
            let after = derive_visible_rows(&rows, &columns(), &st).unwrap();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn prop_orphans_never_visible(rows in arb_rows(), open in any::<bool>()) {
            let mut st = state();
            for i in 0..4 {
                st.tree.set(format!("g{i}"), open);
            }
            for v in derive_visible_rows(&rows, &columns(), &st).unwrap() {
                let row = &rows[v.index];
                let has_root = rows.iter().any(|r| r.is_root() && r.key() == row.group_key());
                if !has_root {
                    prop_assert!(!v.visible);
                }
            }
        }

        #[test]
        fn prop_children_follow_their_root(rows in arb_rows()) {
            let views = derive_visible_rows(&rows, &columns(), &state()).unwrap();
            let mut current_root: Option<String> = None;
            for v in &views {
                let row = &rows[v.index];
                match v.placement {
                    Placement::Root => current_root = Some(row.key().to_string()),
                    Placement::Child => prop_assert_eq!(current_root.as_deref(), Some(row.group_key())),
                    Placement::Orphan => current_root = None,
                }
            }
        }

        #[test]
        fn prop_filter_is_idempotent(rows in arb_rows(), target in 0u8..4) {
            let mut st = state();
            st.filter.apply(format!("g{target}"));
            let once = derive_visible_rows(&rows, &columns(), &st).unwrap();
            st.filter.apply(format!("g{target}"));
            let twice = derive_visible_rows(&rows, &columns(), &st).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
