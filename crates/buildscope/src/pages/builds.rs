//! Builds overview: one root row per project, one child row per sub-build.

use super::{row_entity, Page, TablePanel};
use crate::error::Result;
use crate::links::QueryLinks;
use crate::refresh::RefreshOutcome;
use crate::source::{FetchRequest, FetchResult};
use crate::tables::BuiltinTable;
use crate::time_window::TimeWindow;
use buildscope_core::{Column, ColumnRole, ProblemCategory, Row, TreeNodeState};
use buildscope_widgets::{CellContent, CellRenderer, SubstringMatcher, TableSortChanged};

/// Cells of the builds table.
///
/// Project cells link to the build history; child rows show their sub-build
/// label there instead of the project name.
#[derive(Debug, Clone)]
pub struct BuildCells {
    links: QueryLinks,
}

impl BuildCells {
    /// Cells linking into `links`' window.
    #[must_use]
    pub const fn new(links: QueryLinks) -> Self {
        Self { links }
    }
}

impl CellRenderer for BuildCells {
    fn render_cell(&self, column: &Column, formatted: &str, row: &Row) -> CellContent {
        if column.role != ColumnRole::Identity {
            return CellContent::text(formatted);
        }
        let text = if row.is_root() { formatted } else { row.key() };
        CellContent::link(self.links.build_history(&row_entity(row)), text)
    }

    fn problem_href(&self, row: &Row, category: ProblemCategory) -> Option<String> {
        Some(
            self.links
                .build_history_filtered(&row_entity(row), Some(category)),
        )
    }
}

/// The builds overview page.
#[derive(Debug)]
pub struct BuildsPage {
    panel: TablePanel,
    root_url: String,
    suggestions: SubstringMatcher,
}

impl BuildsPage {
    /// Create the page.
    pub fn new() -> Result<Self> {
        Ok(Self {
            panel: TablePanel::new(BuiltinTable::Builds)?,
            root_url: String::new(),
            suggestions: SubstringMatcher::new(Vec::<String>::new()),
        })
    }

    /// Set the server root that links are relative to.
    #[must_use]
    pub fn root_url(mut self, root: impl Into<String>) -> Self {
        self.root_url = root.into();
        self
    }

    /// The table panel.
    #[must_use]
    pub const fn panel(&self) -> &TablePanel {
        &self.panel
    }

    /// Header click.
    pub fn click_header(&mut self, key: &str) -> Result<Option<TableSortChanged>> {
        self.panel.click_header(key)
    }

    /// Expand or collapse a project.
    pub fn toggle(&mut self, project: &str) -> Result<Option<TreeNodeState>> {
        self.panel.toggle(project)
    }

    /// Show only one project.
    pub fn apply_filter(&mut self, project: &str) -> Result<bool> {
        let applied = self.panel.apply_filter(project)?;
        self.refresh_suggestions();
        Ok(applied)
    }

    /// Show every project again.
    pub fn clear_filter(&mut self) -> Result<bool> {
        let cleared = self.panel.clear_filter()?;
        self.refresh_suggestions();
        Ok(cleared)
    }

    /// Projects offered by the filter box, from the visible root rows.
    #[must_use]
    pub fn filter_candidates(&self) -> Vec<String> {
        self.panel
            .table()
            .map(buildscope_widgets::TableHandle::filter_candidates)
            .unwrap_or_default()
    }

    /// Filter box suggestions for typed text.
    #[must_use]
    pub fn filter_suggestions(&self, query: &str) -> Vec<&str> {
        self.suggestions.matches(query)
    }

    fn refresh_suggestions(&mut self) {
        self.suggestions = SubstringMatcher::new(self.filter_candidates());
    }
}

impl Page for BuildsPage {
    type Data = Vec<Row>;

    fn request(&self, window: TimeWindow) -> Option<FetchRequest> {
        Some(FetchRequest::Builds { window })
    }

    fn outcome(&self, result: FetchResult) -> RefreshOutcome<Vec<Row>> {
        match result
            .and_then(crate::source::FetchResponse::into_result)
            .and_then(|r| self.panel.ingest(&r.items))
        {
            Ok(rows) if rows.is_empty() => RefreshOutcome::Empty,
            other => other.into(),
        }
    }

    fn begin_loading(&mut self) {
        self.panel.begin_loading();
    }

    fn show(&mut self, outcome: RefreshOutcome<Vec<Row>>, window: TimeWindow) -> Result<()> {
        match outcome {
            RefreshOutcome::Failed(e) => self.panel.show_error(e.to_string()),
            RefreshOutcome::Empty => self.panel.show_empty(),
            RefreshOutcome::Populated(rows) => {
                let cells = BuildCells::new(QueryLinks::new(window).root_url(self.root_url.clone()));
                self.panel.show_rows(rows, &cells)?;
            }
        }
        self.refresh_suggestions();
        Ok(())
    }

    fn to_html(&self) -> String {
        format!(
            r#"<div class="builds-page"><h2>{}</h2>{}</div>"#,
            buildscope_core::escape_html(&self.panel.manifest().title),
            self.panel.to_html()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FetchError, FetchResponse};
    use serde_json::json;

    fn window() -> TimeWindow {
        TimeWindow::new(100, 200).unwrap()
    }

    fn response() -> FetchResult {
        Ok(FetchResponse::items(vec![
            json!({"jenkins_project": "go-test", "avg": 300, "count": 4, "failure_count": 1}),
            json!({"jenkins_project": "go-test", "sub_build_labels": "linux, 386", "avg": 250, "count": 2, "failure_count": 0}),
            json!({"jenkins_project": "presubmit", "avg": 90, "count": 7, "failure_count": 0}),
        ]))
    }

    fn loaded() -> BuildsPage {
        let mut page = BuildsPage::new().unwrap();
        let outcome = page.outcome(response());
        page.show(outcome, window()).unwrap();
        page
    }

    #[test]
    fn test_requests_builds_for_window() {
        let page = BuildsPage::new().unwrap();
        assert_eq!(
            page.request(window()),
            Some(FetchRequest::Builds { window: window() })
        );
    }

    #[test]
    fn test_sorted_by_average_duration() {
        let page = loaded();
        let table = page.panel().table().unwrap();
        assert_eq!(table.visible_keys(), vec!["go-test", "presubmit"]);
    }

    #[test]
    fn test_cells_link_to_history() {
        let page = loaded();
        let table = page.panel().table().unwrap();
        assert_eq!(
            table.cell(0, "jenkins_project"),
            Some(&CellContent::link(
                "jenkins-build?start=100&end=200&labels=&b=go-test",
                "go-test"
            ))
        );
        assert_eq!(
            table.cell(1, "jenkins_project"),
            Some(&CellContent::link(
                "jenkins-build?start=100&end=200&labels=linux%2C%20386&b=go-test",
                "linux, 386"
            ))
        );
        assert_eq!(
            table.cell(0, "failure_count"),
            Some(&CellContent::link_with_class(
                "jenkins-build?start=100&end=200&labels=&b=go-test&f=FAILURE",
                "1",
                "failure problems"
            ))
        );
        assert_eq!(table.cell(1, "failure_count"), Some(&CellContent::ZeroMarker));
        assert_eq!(table.cell(0, "avg"), Some(&CellContent::text("5m 0s")));
    }

    #[test]
    fn test_filter_and_suggestions() {
        let mut page = loaded();
        assert_eq!(page.filter_suggestions("TEST"), vec!["go-test"]);
        assert!(page.apply_filter("presubmit").unwrap());
        assert_eq!(page.filter_candidates(), vec!["presubmit"]);
        assert!(page.filter_suggestions("go").is_empty());
        assert!(page.clear_filter().unwrap());
        assert_eq!(page.filter_candidates(), vec!["go-test", "presubmit"]);
    }

    #[test]
    fn test_toggle_project() {
        let mut page = loaded();
        assert_eq!(page.toggle("go-test").unwrap(), Some(TreeNodeState::Open));
        let keys = page.panel().table().unwrap().visible_keys();
        assert_eq!(keys, vec!["go-test", "linux, 386", "presubmit"]);
    }

    #[test]
    fn test_empty_and_error_outcomes() {
        let page = BuildsPage::new().unwrap();
        assert_eq!(
            page.outcome(Ok(FetchResponse::items(vec![]))),
            RefreshOutcome::Empty
        );
        assert_eq!(
            page.outcome(Ok(FetchResponse::error("db down"))),
            RefreshOutcome::Failed(FetchError::Server("db down".into()))
        );
        assert!(matches!(
            page.outcome(Ok(FetchResponse::items(vec![json!({"avg": 1})]))),
            RefreshOutcome::Failed(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_html_has_title_and_table() {
        let page = loaded();
        let html = page.to_html();
        assert!(html.starts_with(r#"<div class="builds-page"><h2>Builds</h2><table"#));
        assert!(html.contains("tree-close"));
    }
}
