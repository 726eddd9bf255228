//! Dashboard pages.
//!
//! Each page turns a fetch response into one or more [`TablePanel`]s and
//! forwards user commands to them. Panels survive refreshes: the sort, tree
//! and filter state of the last table is carried into the next one.

mod builds;
mod detail;
mod test_results;

pub use builds::{BuildCells, BuildsPage};
pub use detail::{DetailCells, DetailKind, DetailPage, HistoryBlock, Subject};
pub use test_results::{TestCells, TestTables, TestsPage};

use crate::error::Result;
use crate::refresh::{EntityRef, RefreshOutcome, RefreshTrigger};
use crate::source::{FetchError, FetchRequest, FetchResult};
use crate::tables::BuiltinTable;
use crate::time_window::TimeWindow;
use buildscope_core::{escape_html, Brick, Row, TableViewState, TreeNodeState};
use buildscope_widgets::{CellRenderer, TableHandle, TableSortChanged};
use buildscope_yaml::TableManifest;
use std::rc::Rc;
use tracing::debug;

/// A dashboard page driven by the refresh loop.
pub trait Page {
    /// Data shown once a fetch succeeds.
    type Data;

    /// What to fetch for a window. `None` when the page has nothing to ask
    /// for yet, e.g. a detail page with no entity selected.
    fn request(&self, window: TimeWindow) -> Option<FetchRequest>;

    /// Classify a fetch result.
    fn outcome(&self, result: FetchResult) -> RefreshOutcome<Self::Data>;

    /// React to a trigger before its request is built.
    fn select(&mut self, _trigger: &RefreshTrigger) {}

    /// Enter the loading state.
    fn begin_loading(&mut self);

    /// Display a terminal outcome.
    fn show(&mut self, outcome: RefreshOutcome<Self::Data>, window: TimeWindow) -> Result<()>;

    /// Page markup.
    fn to_html(&self) -> String;
}

/// What a table panel currently displays.
#[derive(Debug)]
pub enum PanelState {
    /// Nothing requested yet
    Idle,
    /// Waiting for data
    Loading,
    /// Fetch failed
    Error(String),
    /// No rows in the window
    Empty(String),
    /// Rows displayed
    Ready(TableHandle),
}

type PanelHook = Rc<dyn Fn(&TableSortChanged)>;

/// One table slot of a page, with its manifest and carried view state.
pub struct TablePanel {
    manifest: TableManifest,
    state: PanelState,
    saved: Option<TableViewState>,
    on_sorted: Option<PanelHook>,
}

impl std::fmt::Debug for TablePanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TablePanel")
            .field("table", &self.manifest.name)
            .field("state", &self.state)
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}

impl TablePanel {
    /// Panel for a built-in table.
    pub fn new(table: BuiltinTable) -> Result<Self> {
        Ok(Self::from_manifest(table.manifest()?))
    }

    /// Panel for a loaded manifest.
    #[must_use]
    pub const fn from_manifest(manifest: TableManifest) -> Self {
        Self {
            manifest,
            state: PanelState::Idle,
            saved: None,
            on_sorted: None,
        }
    }

    /// Register a hook run after every header sort of every table this
    /// panel shows.
    #[must_use]
    pub fn on_sorted(mut self, hook: impl Fn(&TableSortChanged) + 'static) -> Self {
        self.on_sorted = Some(Rc::new(hook));
        self
    }

    /// Table manifest.
    #[must_use]
    pub const fn manifest(&self) -> &TableManifest {
        &self.manifest
    }

    /// Current display state.
    #[must_use]
    pub const fn state(&self) -> &PanelState {
        &self.state
    }

    /// The table, when rows are displayed.
    #[must_use]
    pub const fn table(&self) -> Option<&TableHandle> {
        match &self.state {
            PanelState::Ready(table) => Some(table),
            _ => None,
        }
    }

    /// Mutable table, when rows are displayed.
    pub fn table_mut(&mut self) -> Option<&mut TableHandle> {
        match &mut self.state {
            PanelState::Ready(table) => Some(table),
            _ => None,
        }
    }

    /// Check whether the panel is waiting for data.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, PanelState::Loading)
    }

    /// Turn raw records into rows with this table's schema.
    pub fn ingest(&self, records: &[serde_json::Value]) -> std::result::Result<Vec<Row>, FetchError> {
        Ok(self.manifest.schema.ingest_json(records)?)
    }

    /// Drop the displayed table, keeping its view state for the next one.
    pub fn begin_loading(&mut self) {
        if let PanelState::Ready(table) = std::mem::replace(&mut self.state, PanelState::Loading) {
            self.saved = Some(table.into_state());
        }
    }

    /// Show a fetch error.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.state = PanelState::Error(message.into());
    }

    /// Show the table's empty message.
    pub fn show_empty(&mut self) {
        self.state = PanelState::Empty(self.manifest.empty_message.clone());
    }

    /// Show rows. An empty collection shows the empty message instead.
    pub fn show_rows(&mut self, rows: Vec<Row>, cells: &dyn CellRenderer) -> Result<()> {
        if rows.is_empty() {
            self.show_empty();
            return Ok(());
        }
        let state = self
            .saved
            .take()
            .unwrap_or_else(|| TableViewState::new(self.manifest.default_sort()));
        let mut table =
            TableHandle::render_with_state(self.manifest.columns(), rows, state, cells)?
                .test_id(self.manifest.name.clone());
        if let Some(hook) = &self.on_sorted {
            let hook = Rc::clone(hook);
            table = table.on_sorted(move |msg| hook(msg));
        }
        debug!(table = %self.manifest.name, rows = table.row_count(), "panel ready");
        self.state = PanelState::Ready(table);
        Ok(())
    }

    /// Header click. Ignored unless a table is displayed.
    pub fn click_header(&mut self, key: &str) -> Result<Option<TableSortChanged>> {
        match self.table_mut() {
            Some(table) => Ok(Some(table.click_header(key)?)),
            None => Ok(None),
        }
    }

    /// Expand/collapse toggle. Ignored unless a table is displayed.
    pub fn toggle(&mut self, root: &str) -> Result<Option<TreeNodeState>> {
        match self.table_mut() {
            Some(table) => Ok(table.toggle(root)?),
            None => Ok(None),
        }
    }

    /// Project filter. Returns `false` when ignored.
    pub fn apply_filter(&mut self, project: &str) -> Result<bool> {
        match self.table_mut() {
            Some(table) => {
                table.apply_filter(project)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the project filter. Returns `false` when ignored.
    pub fn clear_filter(&mut self) -> Result<bool> {
        self.apply_filter("")
    }

    /// Panel markup.
    #[must_use]
    pub fn to_html(&self) -> String {
        match &self.state {
            PanelState::Idle => String::new(),
            PanelState::Loading => r#"<div class="msg loading">loading...</div>"#.to_string(),
            PanelState::Error(message) => {
                format!(r#"<div class="err-msg">{}</div>"#, escape_html(message))
            }
            PanelState::Empty(message) => {
                format!(r#"<div class="msg">{}</div>"#, escape_html(message))
            }
            PanelState::Ready(table) => table.to_html(),
        }
    }
}

/// The build a row stands for: the group key plus, for child rows, the
/// sub-build label.
#[must_use]
pub fn row_entity(row: &Row) -> EntityRef {
    let sub_label = if row.is_root() { "" } else { row.key() };
    EntityRef::new(row.group_key(), sub_label)
}

#[cfg(test)]
mod panel_tests {
    use super::*;
    use buildscope_core::SortDirection;
    use buildscope_widgets::plain;
    use std::cell::Cell;

    fn rows() -> Vec<Row> {
        vec![
            Row::root("A").field("avg", 10),
            Row::child("linux", "A").field("avg", 3),
            Row::root("B").field("avg", 20),
        ]
    }

    fn panel() -> TablePanel {
        TablePanel::new(BuiltinTable::Builds).unwrap()
    }

    #[test]
    fn test_starts_idle_and_ignores_commands() {
        let mut p = panel();
        assert!(matches!(p.state(), PanelState::Idle));
        assert_eq!(p.click_header("avg").unwrap(), None);
        assert_eq!(p.toggle("A").unwrap(), None);
        assert!(!p.apply_filter("A").unwrap());
        assert_eq!(p.to_html(), "");
    }

    #[test]
    fn test_default_sort_from_manifest() {
        let mut p = panel();
        p.show_rows(rows(), &plain).unwrap();
        let table = p.table().unwrap();
        assert_eq!(table.visible_keys(), vec!["B", "A"]);
        assert_eq!(table.state().sort.column, "avg");
        assert!(p.to_html().contains(r#"data-testid="builds""#));
    }

    #[test]
    fn test_state_carried_across_loading() {
        let mut p = panel();
        p.show_rows(rows(), &plain).unwrap();
        p.toggle("A").unwrap();
        p.apply_filter("A").unwrap();
        p.click_header("avg").unwrap();

        p.begin_loading();
        assert!(p.is_loading());
        assert!(p.table().is_none());
        assert_eq!(p.click_header("avg").unwrap(), None);

        p.show_rows(rows(), &plain).unwrap();
        let table = p.table().unwrap();
        assert_eq!(table.state().sort.direction, SortDirection::Ascending);
        assert_eq!(table.visible_keys(), vec!["A", "linux"]);
    }

    #[test]
    fn test_empty_rows_show_message() {
        let mut p = panel();
        p.show_rows(Vec::new(), &plain).unwrap();
        assert!(p.table().is_none());
        assert_eq!(
            p.to_html(),
            r#"<div class="msg">No builds in this time period</div>"#
        );
    }

    #[test]
    fn test_error_is_escaped() {
        let mut p = panel();
        p.show_error("<b>db</b> down");
        assert_eq!(
            p.to_html(),
            r#"<div class="err-msg">&lt;b&gt;db&lt;/b&gt; down</div>"#
        );
    }

    #[test]
    fn test_hook_survives_refresh() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let mut p = panel().on_sorted(move |_| seen.set(seen.get() + 1));
        p.show_rows(rows(), &plain).unwrap();
        p.click_header("min").unwrap();
        p.begin_loading();
        p.show_rows(rows(), &plain).unwrap();
        p.click_header("min").unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_row_entity() {
        assert_eq!(row_entity(&Row::root("A")), EntityRef::new("A", ""));
        assert_eq!(
            row_entity(&Row::child("linux, 386", "A")),
            EntityRef::new("A", "linux, 386")
        );
    }
}
