//! Ties a page to the time window and the refresh state machine.

use crate::error::Result;
use crate::pages::Page;
use crate::refresh::{
    RefreshController, RefreshOutcome, RefreshState, RefreshTicket, RefreshTrigger,
};
use crate::source::{DataSource, FetchError, FetchRequest, FetchResult};
use crate::time_window::{Clock, Preset, SystemClock, TimeWindowController};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// A page, its time window and its refresh state.
pub struct Dashboard<P, C = SystemClock> {
    page: P,
    refresh: RefreshController,
    window: TimeWindowController<C>,
}

impl<P: fmt::Debug, C: Clock> fmt::Debug for Dashboard<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("page", &self.page)
            .field("refresh", &self.refresh)
            .field("window", &self.window)
            .finish()
    }
}

impl<P: Page, C: Clock> Dashboard<P, C> {
    /// Create a dashboard.
    pub fn new(page: P, window: TimeWindowController<C>) -> Self {
        Self {
            page,
            refresh: RefreshController::new(),
            window,
        }
    }

    /// The page.
    #[must_use]
    pub const fn page(&self) -> &P {
        &self.page
    }

    /// Mutable page, for commands that do not refetch.
    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    /// Refresh state.
    #[must_use]
    pub const fn state(&self) -> &RefreshState {
        self.refresh.state()
    }

    /// The time window controller.
    #[must_use]
    pub const fn window(&self) -> &TimeWindowController<C> {
        &self.window
    }

    /// Select a preset window. Returns the trigger to refresh with.
    pub fn select_preset(&mut self, preset: Preset) -> RefreshTrigger {
        RefreshTrigger::WindowChanged(self.window.select_preset(preset))
    }

    /// Select a custom window. Returns the trigger to refresh with.
    pub fn set_custom_window(&mut self, start_ms: i64, end_ms: i64) -> Result<RefreshTrigger> {
        Ok(RefreshTrigger::WindowChanged(
            self.window.set_custom(start_ms, end_ms)?,
        ))
    }

    /// Start a refresh: let the page react to the trigger, enter loading and
    /// build the request. `None` when the page has nothing to fetch.
    pub fn begin(&mut self, trigger: RefreshTrigger) -> Option<(RefreshTicket, FetchRequest)> {
        self.page.select(&trigger);
        let Some(request) = self.page.request(self.window.current_window()) else {
            debug!(?trigger, "nothing to fetch");
            return None;
        };
        let ticket = self.refresh.begin(trigger);
        self.page.begin_loading();
        Some((ticket, request))
    }

    /// Apply a fetch result. Stale results are dropped and return `None`.
    ///
    /// The refresh stays loading until the page has shown the outcome. When
    /// showing fails the page shows the error instead and the refresh ends in
    /// the error state.
    pub fn complete(
        &mut self,
        ticket: &RefreshTicket,
        result: FetchResult,
    ) -> Result<Option<RefreshState>> {
        let outcome = self.page.outcome(result);
        let Some(outcome) = self.refresh.accept(ticket, outcome) else {
            return Ok(None);
        };
        let window = self.window.current_window();
        let mut state = outcome.state();
        if let Err(e) = self.page.show(outcome, window) {
            warn!(error = %e, "cannot show refresh outcome");
            let error = FetchError::Render(e.to_string());
            state = RefreshState::Error(error.to_string());
            self.page.show(RefreshOutcome::Failed(error), window)?;
        }
        self.refresh.settle(ticket, state);
        Ok(Some(self.refresh.state().clone()))
    }

    /// Page markup.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.page.to_html()
    }
}

/// Start a refresh against a data source.
///
/// The dashboard enters loading before this returns, so callers can render
/// the loading state right away. The returned future fetches and applies the
/// result; it borrows the dashboard only after the fetch resolves, so other
/// triggers can start while it is in flight. The last trigger wins: a
/// response arriving after a newer refresh started is dropped and resolves
/// to `Ok(None)`. Returns `None` when the page has nothing to fetch.
pub fn start_refresh<P, C>(
    dashboard: &Rc<RefCell<Dashboard<P, C>>>,
    source: &dyn DataSource,
    trigger: RefreshTrigger,
) -> Option<LocalBoxFuture<'static, Result<Option<RefreshState>>>>
where
    P: Page + 'static,
    C: Clock + 'static,
{
    let (ticket, request) = dashboard.borrow_mut().begin(trigger)?;
    let fetch = source.fetch(&request);
    let dashboard = Rc::clone(dashboard);
    Some(
        async move {
            let result = fetch.await;
            dashboard.borrow_mut().complete(&ticket, result)
        }
        .boxed_local(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::pages::BuildsPage;
    use crate::source::FetchResponse;
    use crate::time_window::{FixedClock, TimeWindow};
    use buildscope_widgets::TableError;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    fn dashboard() -> Dashboard<BuildsPage, FixedClock> {
        Dashboard::new(
            BuildsPage::new().unwrap(),
            TimeWindowController::new(FixedClock(NOW)),
        )
    }

    fn builds() -> FetchResult {
        Ok(FetchResponse::items(vec![
            json!({"jenkins_project": "A", "avg": 1}),
        ]))
    }

    #[test]
    fn test_begin_complete() {
        let mut d = dashboard();
        let (ticket, request) = d.begin(RefreshTrigger::InitialLoad).unwrap();
        assert_eq!(request.window().end_ms, NOW);
        assert_eq!(d.state(), &RefreshState::Loading);
        assert!(d.page().panel().is_loading());

        let state = d.complete(&ticket, builds()).unwrap();
        assert_eq!(state, Some(RefreshState::Success));
        assert!(d.to_html().contains("bs-table"));
    }

    #[test]
    fn test_window_trigger_uses_new_window() {
        let mut d = dashboard();
        let trigger = d.select_preset(Preset::SixHours);
        let (_, request) = d.begin(trigger).unwrap();
        assert_eq!(request.window().duration_ms(), 6 * 3600 * 1000);
        assert!(d.set_custom_window(5, 1).is_err());
    }

    #[test]
    fn test_stale_completion_dropped() {
        let mut d = dashboard();
        let (first, _) = d.begin(RefreshTrigger::InitialLoad).unwrap();
        let (second, _) = d.begin(RefreshTrigger::InitialLoad).unwrap();
        assert_eq!(
            d.complete(&first, Err(FetchError::Transport("x".into()))).unwrap(),
            None
        );
        assert_eq!(d.state(), &RefreshState::Loading);
        d.complete(&second, builds()).unwrap();
        assert_eq!(d.state(), &RefreshState::Success);
    }

    /// Page whose table layout always fails.
    #[derive(Debug, Default)]
    struct BrokenPage {
        loading: bool,
        shown_error: Option<String>,
    }

    impl Page for BrokenPage {
        type Data = ();

        fn request(&self, window: TimeWindow) -> Option<FetchRequest> {
            Some(FetchRequest::Builds { window })
        }

        fn outcome(&self, result: FetchResult) -> RefreshOutcome<()> {
            result.map(|_| ()).into()
        }

        fn begin_loading(&mut self) {
            self.loading = true;
        }

        fn show(&mut self, outcome: RefreshOutcome<()>, _window: TimeWindow) -> Result<()> {
            match outcome {
                RefreshOutcome::Populated(()) => Err(DashboardError::Table(TableError::EmptyColumns)),
                RefreshOutcome::Failed(e) => {
                    self.loading = false;
                    self.shown_error = Some(e.to_string());
                    Ok(())
                }
                RefreshOutcome::Empty => {
                    self.loading = false;
                    Ok(())
                }
            }
        }

        fn to_html(&self) -> String {
            String::new()
        }
    }

    #[test]
    fn test_show_failure_ends_in_error_state() {
        let mut d = Dashboard::new(
            BrokenPage::default(),
            TimeWindowController::new(FixedClock(NOW)),
        );
        let (ticket, _) = d.begin(RefreshTrigger::InitialLoad).unwrap();
        assert!(d.page().loading);

        let state = d.complete(&ticket, builds()).unwrap();
        let expected = "cannot show response: a table needs at least one column";
        assert_eq!(state, Some(RefreshState::Error(expected.to_string())));
        assert_eq!(d.state(), &RefreshState::Error(expected.to_string()));
        assert!(!d.page().loading);
        assert_eq!(d.page().shown_error.as_deref(), Some(expected));
    }

    fn refresh_with(
        d: &mut Dashboard<BuildsPage, FixedClock>,
        items: Vec<serde_json::Value>,
    ) -> Option<RefreshState> {
        let (ticket, _) = d.begin(RefreshTrigger::InitialLoad).unwrap();
        d.complete(&ticket, Ok(FetchResponse::items(items))).unwrap()
    }

    fn visible(d: &Dashboard<BuildsPage, FixedClock>) -> Vec<String> {
        d.page()
            .panel()
            .table()
            .unwrap()
            .visible_keys()
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_open_root_survives_refresh_without_it() {
        let mut d = dashboard();
        let a = || json!({"jenkins_project": "A", "avg": 3});
        let a1 = || json!({"jenkins_project": "A", "sub_build_labels": "linux", "avg": 2});
        let b = || json!({"jenkins_project": "B", "avg": 1});

        refresh_with(&mut d, vec![a(), a1(), b()]);
        d.page_mut().toggle("A").unwrap();
        assert_eq!(visible(&d), vec!["A", "linux", "B"]);

        assert_eq!(refresh_with(&mut d, vec![b()]), Some(RefreshState::Success));
        assert_eq!(visible(&d), vec!["B"]);

        assert_eq!(
            refresh_with(&mut d, vec![a(), a1(), b()]),
            Some(RefreshState::Success)
        );
        assert_eq!(visible(&d), vec!["A", "linux", "B"]);
    }

    #[test]
    fn test_start_refresh() {
        let d = Rc::new(RefCell::new(dashboard()));
        let source = |_: &FetchRequest| async { builds() }.boxed_local();
        let pending = start_refresh(&d, &source, RefreshTrigger::InitialLoad).unwrap();
        assert_eq!(d.borrow().state(), &RefreshState::Loading);
        let state = futures::executor::block_on(pending).unwrap();
        assert_eq!(state, Some(RefreshState::Success));
    }
}
