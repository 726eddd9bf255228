//! Detail pages: the run history of one build or one test case.
//!
//! Besides the history table the page keeps a per-result statistics bar that
//! doubles as a multi-select result filter, a strip of colored history
//! blocks in table order, and two duration charts.

use super::{Page, TablePanel};
use crate::error::Result;
use crate::links::QueryLinks;
use crate::refresh::{EntityRef, RefreshOutcome, RefreshTrigger, TestCaseRef};
use crate::route::PageParams;
use crate::source::{FetchError, FetchRequest, FetchResponse, FetchResult};
use crate::tables::BuiltinTable;
use crate::time_window::TimeWindow;
use buildscope_core::{escape_html, Brick, Column, ColumnRole, Row};
use buildscope_widgets::{
    CellContent, CellRenderer, ChartKind, ChartRequest, ChartSink, DataSeries, DeferredChart,
    ResultFilterChanged, ResultStats, TableSortChanged, Typeahead,
};
use tracing::{debug, warn};

const BUILD_NUMBER: &str = "build_number";
const RESULT: &str = "result";
const DURATION: &str = "duration";

/// Which history a detail page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailKind {
    /// Runs of a build
    Build,
    /// Runs of a test case
    TestCase,
}

impl DetailKind {
    /// Result values, in stats display order.
    #[must_use]
    pub const fn results(self) -> &'static [&'static str] {
        match self {
            Self::Build => &["SUCCESS", "UNSTABLE", "FAILURE", "ABORTED"],
            Self::TestCase => &["PASSED", "FAILED", "SKIPPED"],
        }
    }

    /// Maximum typeahead suggestions.
    #[must_use]
    pub const fn suggestion_limit(self) -> usize {
        match self {
            Self::Build => 100,
            Self::TestCase => 200,
        }
    }

    const fn table(self) -> BuiltinTable {
        match self {
            Self::Build => BuiltinTable::BuildHistory,
            Self::TestCase => BuiltinTable::TestHistory,
        }
    }
}

/// What a detail page is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// A build
    Build(EntityRef),
    /// A test case
    TestCase(TestCaseRef),
}

impl Subject {
    /// Label shown in the entity input.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Build(b) => b.label(),
            Self::TestCase(t) => t.label(),
        }
    }

    /// Trigger that switches a page to this subject.
    #[must_use]
    pub fn trigger(&self) -> RefreshTrigger {
        match self {
            Self::Build(b) => RefreshTrigger::EntitySelected(b.clone()),
            Self::TestCase(t) => RefreshTrigger::TestCaseSelected(t.clone()),
        }
    }

    fn from_record(kind: DetailKind, record: &Row) -> Self {
        let build = EntityRef::new(
            record.value("jenkins_project").display(),
            record.value("sub_build_labels").display(),
        );
        match kind {
            DetailKind::Build => Self::Build(build),
            DetailKind::TestCase => Self::TestCase(TestCaseRef::new(
                record.value("test_full_name").display(),
                build,
            )),
        }
    }
}

/// One colored block of the history strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryBlock {
    /// Build number the block jumps to
    pub build_number: String,
    /// Lowercased result, used as CSS class
    pub result: String,
}

/// Cells of the history tables.
#[derive(Debug, Clone)]
pub struct DetailCells {
    links: QueryLinks,
}

impl DetailCells {
    /// Cells linking into `links`' server root.
    #[must_use]
    pub const fn new(links: QueryLinks) -> Self {
        Self { links }
    }
}

impl CellRenderer for DetailCells {
    fn render_cell(&self, column: &Column, formatted: &str, row: &Row) -> CellContent {
        if column.key == BUILD_NUMBER {
            return CellContent::link(self.links.build_run(&row.value("url").display()), formatted);
        }
        if column.role == ColumnRole::Result {
            return CellContent::styled(row.value(RESULT).display().to_lowercase(), formatted);
        }
        CellContent::text(formatted)
    }
}

/// A build or test case history page.
pub struct DetailPage<S = Vec<ChartRequest>> {
    kind: DetailKind,
    subject: Option<Subject>,
    panel: TablePanel,
    stats: Option<ResultStats>,
    selected: Vec<String>,
    charts: DeferredChart<S>,
    choices: Option<Typeahead<Subject>>,
    root_url: String,
}

impl<S> std::fmt::Debug for DetailPage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailPage")
            .field("kind", &self.kind)
            .field("subject", &self.subject)
            .field("panel", &self.panel)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl<S: ChartSink> DetailPage<S> {
    /// Create a page with no subject. Charts go to `sink` once it is ready.
    pub fn new(kind: DetailKind, sink: S) -> Result<Self> {
        Ok(Self {
            kind,
            subject: None,
            panel: TablePanel::new(kind.table())?,
            stats: None,
            selected: Vec::new(),
            charts: DeferredChart::new(sink),
            choices: None,
            root_url: String::new(),
        })
    }

    /// Create a page from link parameters: subject and preselected results.
    pub fn from_params(kind: DetailKind, params: &PageParams, sink: S) -> Result<Self> {
        let mut page = Self::new(kind, sink)?;
        page.subject = match (kind, &params.build, &params.test_full_name) {
            (DetailKind::Build, Some(build), _) => Some(Subject::Build(build.clone())),
            (DetailKind::TestCase, Some(build), Some(test)) => {
                Some(Subject::TestCase(TestCaseRef::new(test.clone(), build.clone())))
            }
            _ => None,
        };
        page.selected.clone_from(&params.result_filters);
        Ok(page)
    }

    /// Set the server root that build run links are relative to.
    #[must_use]
    pub fn root_url(mut self, root: impl Into<String>) -> Self {
        self.root_url = root.into();
        self
    }

    /// Page kind.
    #[must_use]
    pub const fn kind(&self) -> DetailKind {
        self.kind
    }

    /// Current subject.
    #[must_use]
    pub const fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    /// The history table panel.
    #[must_use]
    pub const fn panel(&self) -> &TablePanel {
        &self.panel
    }

    /// Result statistics of the displayed rows.
    #[must_use]
    pub const fn stats(&self) -> Option<&ResultStats> {
        self.stats.as_ref()
    }

    /// Selected result filters.
    #[must_use]
    pub fn selected_results(&self) -> &[String] {
        &self.selected
    }

    /// Chart queue.
    #[must_use]
    pub const fn charts(&self) -> &DeferredChart<S> {
        &self.charts
    }

    /// The chart library finished loading; flush queued charts.
    pub fn charts_ready(&mut self) -> usize {
        self.charts.mark_ready()
    }

    /// Header click. History blocks follow the new order.
    pub fn click_header(&mut self, key: &str) -> Result<Option<TableSortChanged>> {
        self.panel.click_header(key)
    }

    /// Toggle a result in the stats bar and filter the table by the
    /// selection. Ignored while no stats are shown.
    pub fn toggle_result(&mut self, result: &str) -> Result<Option<ResultFilterChanged>> {
        let Some(changed) = self.stats.as_mut().and_then(|s| s.toggle(result)) else {
            return Ok(None);
        };
        self.selected.clone_from(&changed.selected);
        self.apply_result_filter()?;
        Ok(Some(changed))
    }

    fn apply_result_filter(&mut self) -> Result<()> {
        let (Some(stats), Some(table)) = (&self.stats, self.panel.table_mut()) else {
            return Ok(());
        };
        if stats.selected().is_empty() {
            table.clear_row_mask()?;
        } else {
            table.retain_rows(|row| stats.admits(&row.value(RESULT).display()))?;
        }
        Ok(())
    }

    /// History blocks for every row in current document order, hidden rows
    /// included.
    #[must_use]
    pub fn history_blocks(&self) -> Vec<HistoryBlock> {
        let Some(table) = self.panel.table() else {
            return Vec::new();
        };
        table
            .document_order()
            .iter()
            .map(|view| {
                let row = &table.rows()[view.index];
                HistoryBlock {
                    build_number: row.value(BUILD_NUMBER).display(),
                    result: row.value(RESULT).display().to_lowercase(),
                }
            })
            .collect()
    }

    /// Request for the entities offered by the typeahead.
    #[must_use]
    pub const fn choices_request(&self, window: TimeWindow) -> FetchRequest {
        match self.kind {
            DetailKind::Build => FetchRequest::AvailableBuilds { window },
            DetailKind::TestCase => FetchRequest::AvailableTests { window },
        }
    }

    /// Load typeahead entries. Returns the number of distinct labels.
    pub fn load_choices(&mut self, result: FetchResult) -> std::result::Result<usize, FetchError> {
        let response = result.and_then(FetchResponse::into_result)?;
        let key_field = match self.kind {
            DetailKind::Build => "jenkins_project",
            DetailKind::TestCase => "test_full_name",
        };
        let records = buildscope_core::RowSchema::flat(key_field).ingest_json(&response.items)?;
        let kind = self.kind;
        let typeahead = Typeahead::new(records.iter().map(|r| {
            let subject = Subject::from_record(kind, r);
            (subject.label(), subject)
        }))
        .limit(kind.suggestion_limit());
        debug!(entries = typeahead.len(), "typeahead loaded");
        let n = typeahead.len();
        self.choices = Some(typeahead);
        Ok(n)
    }

    /// Typeahead suggestions.
    #[must_use]
    pub fn suggest(&self, query: &str) -> Vec<&str> {
        self.choices
            .as_ref()
            .map(|c| c.suggest(query))
            .unwrap_or_default()
    }

    /// Trigger for a chosen typeahead label, `None` for unknown labels.
    #[must_use]
    pub fn choose(&self, label: &str) -> Option<RefreshTrigger> {
        self.choices
            .as_ref()
            .and_then(|c| c.select(label))
            .map(Subject::trigger)
    }

    fn blocks_html(&self) -> String {
        let blocks: String = self
            .history_blocks()
            .iter()
            .map(|b| {
                format!(
                    r#"<div class="history-block {}" data-build-number="{}"></div>"#,
                    escape_html(&b.result),
                    escape_html(&b.build_number)
                )
            })
            .collect();
        format!(r#"<div class="history-blocks">{blocks}</div>"#)
    }
}

impl<S: ChartSink> Page for DetailPage<S> {
    type Data = Vec<Row>;

    fn request(&self, window: TimeWindow) -> Option<FetchRequest> {
        match self.subject.as_ref()? {
            Subject::Build(build) => Some(FetchRequest::BuildHistory {
                window,
                build: build.clone(),
            }),
            Subject::TestCase(t) => Some(FetchRequest::TestHistory {
                window,
                build: t.build.clone(),
                test_full_name: t.test_full_name.clone(),
            }),
        }
    }

    fn outcome(&self, result: FetchResult) -> RefreshOutcome<Vec<Row>> {
        match result
            .and_then(FetchResponse::into_result)
            .and_then(|r| self.panel.ingest(&r.items))
        {
            Ok(rows) if rows.is_empty() => RefreshOutcome::Empty,
            other => other.into(),
        }
    }

    fn select(&mut self, trigger: &RefreshTrigger) {
        let subject = match (self.kind, trigger) {
            (DetailKind::Build, RefreshTrigger::EntitySelected(b)) => Subject::Build(b.clone()),
            (DetailKind::TestCase, RefreshTrigger::TestCaseSelected(t)) => {
                Subject::TestCase(t.clone())
            }
            (_, RefreshTrigger::EntitySelected(_) | RefreshTrigger::TestCaseSelected(_)) => {
                warn!(kind = ?self.kind, ?trigger, "selection does not match page kind");
                return;
            }
            _ => return,
        };
        debug!(subject = %subject.label(), "subject selected");
        self.subject = Some(subject);
    }

    fn begin_loading(&mut self) {
        self.panel.begin_loading();
        self.stats = None;
    }

    fn show(&mut self, outcome: RefreshOutcome<Vec<Row>>, window: TimeWindow) -> Result<()> {
        match outcome {
            RefreshOutcome::Failed(e) => self.panel.show_error(e.to_string()),
            RefreshOutcome::Empty => self.panel.show_empty(),
            RefreshOutcome::Populated(rows) => {
                let cells = DetailCells::new(QueryLinks::new(window).root_url(self.root_url.clone()));
                self.panel.show_rows(rows, &cells)?;
                let Some(table) = self.panel.table() else {
                    return Ok(());
                };
                let stats = ResultStats::from_rows(self.kind.results(), table.rows(), RESULT)
                    .with_selected(&self.selected);
                let series = DataSeries::durations(table.rows(), BUILD_NUMBER, DURATION);
                self.stats = Some(stats);
                self.apply_result_filter()?;
                // Charts are queued after the table is laid out.
                for kind in [ChartKind::Histogram, ChartKind::Trend] {
                    self.charts.draw(ChartRequest {
                        kind,
                        series: series.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn to_html(&self) -> String {
        let heading = self
            .subject
            .as_ref()
            .map(Subject::label)
            .unwrap_or_default();
        let Some(table) = self.panel.table() else {
            return format!(
                r#"<div class="detail-page"><h2>{}</h2>{}</div>"#,
                escape_html(&heading),
                self.panel.to_html()
            );
        };
        let stats = self.stats.as_ref().map(Brick::to_html).unwrap_or_default();
        format!(
            r#"<div class="detail-page"><h2>{}</h2>{stats}{}<h3>{} ({})</h3>{}</div>"#,
            escape_html(&heading),
            self.blocks_html(),
            escape_html(&self.panel.manifest().title),
            table.row_count(),
            self.panel.to_html()
        )
    }
}
