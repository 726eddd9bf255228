//! Tests overview: failed tests and longest-running tests, one flat table
//! each, both filled from a single response.

use super::{Page, TablePanel};
use crate::error::Result;
use crate::links::QueryLinks;
use crate::refresh::{EntityRef, RefreshOutcome};
use crate::source::{FetchRequest, FetchResponse, FetchResult};
use crate::tables::BuiltinTable;
use crate::time_window::TimeWindow;
use buildscope_core::format::clean_test_label;
use buildscope_core::{escape_html, Column, ColumnRole, ProblemCategory, Row};
use buildscope_widgets::{CellContent, CellRenderer};

const TEST_NAME: &str = "test_full_name";
const PROJECT: &str = "jenkins_project";
const SUB_BUILD: &str = "sub_build_labels";

/// Cells of the test tables.
#[derive(Debug, Clone)]
pub struct TestCells {
    links: QueryLinks,
}

impl TestCells {
    /// Cells linking into `links`' window.
    #[must_use]
    pub const fn new(links: QueryLinks) -> Self {
        Self { links }
    }

    fn build_of(row: &Row) -> EntityRef {
        EntityRef::new(row.value(PROJECT).display(), row.value(SUB_BUILD).display())
    }
}

impl CellRenderer for TestCells {
    fn render_cell(&self, column: &Column, formatted: &str, row: &Row) -> CellContent {
        let test = row.value(TEST_NAME).display();
        match (column.key.as_str(), column.role) {
            (TEST_NAME, _) => CellContent::link_with_class(
                self.links.test_case(&test, &Self::build_of(row)),
                clean_test_label(formatted),
                "test-case-link",
            ),
            (PROJECT, _) => CellContent::link(
                self.links.build_history_for_test(&test, &Self::build_of(row)),
                formatted,
            ),
            (_, ColumnRole::SubBuild) if formatted.is_empty() => {
                CellContent::styled("sub-build-cell no-sub-build", "none")
            }
            (_, ColumnRole::SubBuild) => CellContent::styled("sub-build-cell", formatted),
            _ => CellContent::text(formatted),
        }
    }

    fn problem_href(&self, row: &Row, category: ProblemCategory) -> Option<String> {
        (category == ProblemCategory::Failed).then(|| {
            self.links
                .test_failures(&row.value(TEST_NAME).display(), &Self::build_of(row))
        })
    }
}

/// Rows of both test tables.
#[derive(Debug, Clone, PartialEq)]
pub struct TestTables {
    /// Tests with failures
    pub failed: Vec<Row>,
    /// Slowest tests
    pub longest: Vec<Row>,
}

/// The tests overview page.
#[derive(Debug)]
pub struct TestsPage {
    failed: TablePanel,
    longest: TablePanel,
    root_url: String,
}

impl TestsPage {
    /// Create the page.
    pub fn new() -> Result<Self> {
        Ok(Self {
            failed: TablePanel::new(BuiltinTable::FailedTests)?,
            longest: TablePanel::new(BuiltinTable::LongestTests)?,
            root_url: String::new(),
        })
    }

    /// Set the server root that links are relative to.
    #[must_use]
    pub fn root_url(mut self, root: impl Into<String>) -> Self {
        self.root_url = root.into();
        self
    }

    /// Failed tests panel.
    #[must_use]
    pub const fn failed(&self) -> &TablePanel {
        &self.failed
    }

    /// Longest tests panel.
    #[must_use]
    pub const fn longest(&self) -> &TablePanel {
        &self.longest
    }

    /// Panel by table name, for commands coming from the page markup.
    pub fn panel_mut(&mut self, table: &str) -> Option<&mut TablePanel> {
        [&mut self.failed, &mut self.longest]
            .into_iter()
            .find(|p| p.manifest().name == table)
    }

    fn ingest(&self, response: FetchResponse) -> std::result::Result<TestTables, crate::source::FetchError> {
        let response = response.into_result()?;
        Ok(TestTables {
            failed: self.failed.ingest(&response.failed_tests)?,
            longest: self.longest.ingest(&response.longest_tests)?,
        })
    }

    fn panel_html(panel: &TablePanel) -> String {
        format!(
            r#"<div class="test-panel" data-table="{}"><h3>{}</h3>{}</div>"#,
            escape_html(&panel.manifest().name),
            escape_html(&panel.manifest().title),
            panel.to_html()
        )
    }
}

impl Page for TestsPage {
    type Data = TestTables;

    fn request(&self, window: TimeWindow) -> Option<FetchRequest> {
        Some(FetchRequest::Tests { window })
    }

    fn outcome(&self, result: FetchResult) -> RefreshOutcome<TestTables> {
        match result.and_then(|r| self.ingest(r)) {
            Ok(t) if t.failed.is_empty() && t.longest.is_empty() => RefreshOutcome::Empty,
            other => other.into(),
        }
    }

    fn begin_loading(&mut self) {
        self.failed.begin_loading();
        self.longest.begin_loading();
    }

    fn show(&mut self, outcome: RefreshOutcome<TestTables>, window: TimeWindow) -> Result<()> {
        match outcome {
            RefreshOutcome::Failed(e) => {
                self.failed.show_error(e.to_string());
                self.longest.show_error(e.to_string());
            }
            RefreshOutcome::Empty => {
                self.failed.show_empty();
                self.longest.show_empty();
            }
            RefreshOutcome::Populated(tables) => {
                let cells = TestCells::new(QueryLinks::new(window).root_url(self.root_url.clone()));
                self.failed.show_rows(tables.failed, &cells)?;
                self.longest.show_rows(tables.longest, &cells)?;
            }
        }
        Ok(())
    }

    fn to_html(&self) -> String {
        format!(
            r#"<div class="tests-page">{}{}</div>"#,
            Self::panel_html(&self.failed),
            Self::panel_html(&self.longest)
        )
    }
}
