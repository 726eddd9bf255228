//! Hierarchical sortable table.
//!
//! [`TableHandle`] owns one table instance: its columns, the current row
//! collection, the pre-built cell contents and the [`TableViewState`]. Every
//! command (header click, tree toggle, filter change) updates the state and
//! re-derives document order and visibility from scratch.

use crate::cell::{CellContent, CellRenderer};
use buildscope_core::{
    derive_visible_rows, escape_html, filter_candidates, find_column, Brick, Column, ColumnRole,
    Placement, Row, RowView, SortDirection, SortSpec, SortType, TableViewState, TreeControl,
    TreeNodeState, ViewError,
};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by the table renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// No columns were given
    #[error("a table needs at least one column")]
    EmptyColumns,
    /// A sort or command named a column that does not exist
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    /// Deriving the visible rows failed
    #[error(transparent)]
    View(#[from] ViewError),
}

/// Message emitted when table sorting changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSortChanged {
    /// Column key being sorted
    pub column: String,
    /// Sort direction
    pub direction: SortDirection,
}

/// Header cell description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    /// Column key
    pub key: String,
    /// Header label
    pub label: String,
    /// Sort comparison
    pub sort_type: SortType,
    /// Direction if this column is the sorted one
    pub sorted: Option<SortDirection>,
}

type SortHook = Box<dyn FnMut(&TableSortChanged)>;

/// A rendered table and its live view state.
pub struct TableHandle {
    columns: Vec<Column>,
    rows: Vec<Row>,
    /// Cell contents by row index, then column index
    cells: Vec<Vec<CellContent>>,
    state: TableViewState,
    views: Vec<RowView>,
    /// Per-row keep flags ANDed into visibility
    row_mask: Option<Vec<bool>>,
    on_sorted: Option<SortHook>,
    test_id_value: Option<String>,
}

impl fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHandle")
            .field("columns", &self.columns.len())
            .field("rows", &self.rows.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TableHandle {
    /// Render a table sorted descending by `default_column`.
    pub fn render(
        columns: Vec<Column>,
        rows: Vec<Row>,
        default_column: &str,
        cells: &dyn CellRenderer,
    ) -> Result<Self, TableError> {
        let state = TableViewState::new(SortSpec::descending(default_column));
        Self::render_with_state(columns, rows, state, cells)
    }

    /// Render a table reusing tree, filter and sort state from an earlier
    /// table instance.
    pub fn render_with_state(
        columns: Vec<Column>,
        rows: Vec<Row>,
        state: TableViewState,
        cells: &dyn CellRenderer,
    ) -> Result<Self, TableError> {
        if columns.is_empty() {
            return Err(TableError::EmptyColumns);
        }
        if find_column(&columns, &state.sort.column).is_none() {
            return Err(TableError::UnknownColumn(state.sort.column));
        }

        let body = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| build_cell(column, row, cells))
                    .collect()
            })
            .collect();

        let mut table = Self {
            columns,
            rows,
            cells: body,
            state,
            views: Vec::new(),
            row_mask: None,
            on_sorted: None,
            test_id_value: None,
        };
        table.relayout()?;
        debug!(
            rows = table.rows.len(),
            sort = %table.state.sort.column,
            "table rendered"
        );
        Ok(table)
    }

    /// Register a hook run after every header sort.
    #[must_use]
    pub fn on_sorted(mut self, hook: impl FnMut(&TableSortChanged) + 'static) -> Self {
        self.on_sorted = Some(Box::new(hook));
        self
    }

    /// Set the test ID.
    #[must_use]
    pub fn test_id(mut self, id: impl Into<String>) -> Self {
        self.test_id_value = Some(id.into());
        self
    }

    fn relayout(&mut self) -> Result<(), TableError> {
        let created = self.state.initialize_tree(&self.rows);
        if created > 0 {
            debug!(roots = created, "initialized tree state");
        }
        self.views = derive_visible_rows(&self.rows, &self.columns, &self.state)?;
        if let Some(mask) = &self.row_mask {
            for view in &mut self.views {
                view.visible &= mask.get(view.index).copied().unwrap_or(true);
            }
        }
        Ok(())
    }

    /// Sort by a header click: the current column toggles direction, another
    /// column starts descending. Tree and filter are re-applied, then the
    /// `on_sorted` hook runs.
    pub fn click_header(&mut self, key: &str) -> Result<TableSortChanged, TableError> {
        if find_column(&self.columns, key).is_none() {
            return Err(TableError::UnknownColumn(key.to_string()));
        }
        let spec = self.state.sort.clicked(key);
        self.sort_by(spec)
    }

    /// Apply an explicit sort, then re-apply tree and filter.
    pub fn sort_by(&mut self, spec: SortSpec) -> Result<TableSortChanged, TableError> {
        if find_column(&self.columns, &spec.column).is_none() {
            return Err(TableError::UnknownColumn(spec.column));
        }
        self.state.sort = spec;
        self.relayout()?;

        let msg = TableSortChanged {
            column: self.state.sort.column.clone(),
            direction: self.state.sort.direction,
        };
        if let Some(hook) = self.on_sorted.as_mut() {
            hook(&msg);
        }
        Ok(msg)
    }

    /// Flip a root's expand/collapse control. Only that root's children
    /// change visibility. Returns `None` if the root has no control.
    pub fn toggle(&mut self, root: &str) -> Result<Option<TreeNodeState>, TableError> {
        let has_control = self.views.iter().any(|v| {
            v.placement == Placement::Root
                && v.control != TreeControl::None
                && self.rows[v.index].key() == root
        });
        if !has_control {
            warn!(root, "toggle ignored: root has no expand/collapse control");
            return Ok(None);
        }
        let next = self.state.tree.toggle(root);
        self.relayout()?;
        Ok(next)
    }

    /// Filter to one project group. `""` shows every group.
    pub fn apply_filter(&mut self, project: &str) -> Result<(), TableError> {
        self.state.filter.apply(project);
        self.relayout()
    }

    /// Remove the project filter.
    pub fn clear_filter(&mut self) -> Result<(), TableError> {
        self.apply_filter("")
    }

    /// Hide every row `keep` rejects, on top of tree and project filter.
    /// The mask survives sorts until cleared.
    pub fn retain_rows(&mut self, keep: impl Fn(&Row) -> bool) -> Result<(), TableError> {
        self.row_mask = Some(self.rows.iter().map(keep).collect());
        self.relayout()
    }

    /// Drop the row mask set by [`TableHandle::retain_rows`].
    pub fn clear_row_mask(&mut self) -> Result<(), TableError> {
        self.row_mask = None;
        self.relayout()
    }

    /// Filter suggestions from the currently visible root rows.
    #[must_use]
    pub fn filter_candidates(&self) -> Vec<String> {
        filter_candidates(&self.rows, &self.views)
    }

    /// Get columns.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get rows in input order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get row count.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the view state.
    #[must_use]
    pub const fn state(&self) -> &TableViewState {
        &self.state
    }

    /// Take the view state, to carry it into the next table instance.
    #[must_use]
    pub fn into_state(self) -> TableViewState {
        self.state
    }

    /// Every row in document order with its display state.
    #[must_use]
    pub fn document_order(&self) -> &[RowView] {
        &self.views
    }

    /// Visible rows in document order.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<&Row> {
        self.views
            .iter()
            .filter(|v| v.visible)
            .map(|v| &self.rows[v.index])
            .collect()
    }

    /// Keys of the visible rows in document order.
    #[must_use]
    pub fn visible_keys(&self) -> Vec<&str> {
        self.visible_rows().into_iter().map(Row::key).collect()
    }

    /// Cell contents of a row.
    #[must_use]
    pub fn cells(&self, row_index: usize) -> &[CellContent] {
        self.cells.get(row_index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell content of a row by column key.
    #[must_use]
    pub fn cell(&self, row_index: usize, column: &str) -> Option<&CellContent> {
        let col = self.columns.iter().position(|c| c.key == column)?;
        self.cells(row_index).get(col)
    }

    /// Header cells.
    #[must_use]
    pub fn headers(&self) -> Vec<HeaderCell> {
        self.columns
            .iter()
            .map(|c| HeaderCell {
                key: c.key.clone(),
                label: c.label.clone(),
                sort_type: c.sort_type,
                sorted: (c.key == self.state.sort.column).then_some(self.state.sort.direction),
            })
            .collect()
    }

    /// Index of the sorted column, used to highlight its cells.
    #[must_use]
    pub fn sorted_column_index(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.key == self.state.sort.column)
    }

    fn identity_cell_html(&self, view: &RowView, content: &CellContent) -> String {
        let row = &self.rows[view.index];
        let tree_class = match view.control {
            TreeControl::None => "",
            TreeControl::Collapsed => " tree-close",
            TreeControl::Expanded => " tree-open",
        };
        format!(
            r#"<div class="build-name-container{tree_class}" data-build-name="{}" data-is-root-build="{}"><div class="build-name-img"></div>{}</div>"#,
            escape_html(row.group_key()),
            row.is_root(),
            content.to_html()
        )
    }

    fn row_html(&self, view: &RowView, sorted_col: Option<usize>) -> String {
        let row = &self.rows[view.index];
        let mut class = String::from("bs-row");
        if view.placement != Placement::Root {
            class.push_str(" bs-sub-row");
        }
        let hidden = if view.visible { "" } else { " hidden" };

        let mut html = format!(
            r#"<tr class="{class}" data-key="{}"{hidden}>"#,
            escape_html(row.key())
        );
        for (i, (column, content)) in self
            .columns
            .iter()
            .zip(self.cells(view.index))
            .enumerate()
        {
            let sorting = if sorted_col == Some(i) { " sorting" } else { "" };
            let inner = if column.role == ColumnRole::Identity {
                self.identity_cell_html(view, content)
            } else {
                content.to_html()
            };
            html.push_str(&format!(r#"<td class="bs-cell{sorting}">{inner}</td>"#));
        }
        html.push_str("</tr>");
        html
    }
}

fn build_cell(column: &Column, row: &Row, cells: &dyn CellRenderer) -> CellContent {
    let value = row.value(&column.key);
    if column.role.is_count() && value.is_zero() {
        return CellContent::ZeroMarker;
    }
    let formatted = column.format(value);
    if let ColumnRole::Problem(category) = column.role {
        if let Some(href) = cells.problem_href(row, category) {
            return CellContent::link_with_class(
                href,
                formatted,
                format!("{} problems", category.css_class()),
            );
        }
    }
    cells.render_cell(column, &formatted, row)
}

impl Brick for TableHandle {
    fn brick_name(&self) -> &'static str {
        "TableHandle"
    }

    fn to_html(&self) -> String {
        let test_id = self.test_id_value.as_deref().unwrap_or("bs-table");
        let mut html = format!(r#"<table class="bs-table" data-testid="{}">"#, escape_html(test_id));

        html.push_str(r#"<thead><tr class="bs-header-row">"#);
        for header in self.headers() {
            let sort = match header.sort_type {
                SortType::Int => "int",
                SortType::String => "string",
            };
            let (class, arrow) = match header.sorted {
                Some(SortDirection::Ascending) => (" sorting-asc", SortDirection::Ascending.arrow()),
                Some(SortDirection::Descending) => {
                    (" sorting-desc", SortDirection::Descending.arrow())
                }
                None => ("", ""),
            };
            html.push_str(&format!(
                r#"<th class="bs-header{class}" data-sort="{sort}" data-key="{}">{}{arrow}</th>"#,
                escape_html(&header.key),
                escape_html(&header.label)
            ));
        }
        html.push_str("</tr></thead><tbody>");

        let sorted_col = self.sorted_column_index();
        for view in &self.views {
            html.push_str(&self.row_html(view, sorted_col));
        }
        html.push_str("</tbody></table>");
        html
    }

    fn to_css(&self) -> String {
        concat!(
            ".bs-table { border-collapse: collapse; width: 100%; }\n",
            ".bs-table .bs-header { cursor: pointer; }\n",
            ".bs-table .bs-sub-row { background: #fafafa; }\n",
            ".bs-table .sorting { background: #f3f6fb; }\n",
            ".bs-table .zero-value { color: #bbb; }\n",
            ".bs-table .tree-close .build-name-img::before { content: '+'; }\n",
            ".bs-table .tree-open .build-name-img::before { content: '-'; }\n",
        )
        .to_string()
    }

    fn test_id(&self) -> Option<&str> {
        self.test_id_value.as_deref()
    }
}
