//! Links from table cells to the detail pages.

use crate::refresh::EntityRef;
use crate::time_window::TimeWindow;
use buildscope_core::ProblemCategory;

/// Builds detail-page URLs scoped to one time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLinks {
    window: TimeWindow,
    root_url: String,
}

impl QueryLinks {
    /// Links for a window.
    #[must_use]
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            root_url: String::new(),
        }
    }

    /// Set the server root that build page paths are relative to.
    #[must_use]
    pub fn root_url(mut self, root: impl Into<String>) -> Self {
        self.root_url = root.into().trim_end_matches('/').to_string();
        self
    }

    /// Time window the links carry.
    #[must_use]
    pub const fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Build history page.
    #[must_use]
    pub fn build_history(&self, build: &EntityRef) -> String {
        self.build_history_filtered(build, None)
    }

    /// Build history page, showing only one result.
    #[must_use]
    pub fn build_history_filtered(
        &self,
        build: &EntityRef,
        problem: Option<ProblemCategory>,
    ) -> String {
        let mut params = self.window_params();
        params.push(("labels", build.sub_label.clone()));
        params.push(("b", build.name.clone()));
        if let Some(p) = problem {
            params.push(("f", p.as_param().to_string()));
        }
        query("jenkins-build", &params)
    }

    /// Build history page reached from a test row.
    #[must_use]
    pub fn build_history_for_test(&self, test_full_name: &str, build: &EntityRef) -> String {
        query("jenkins-build", &self.test_params(test_full_name, build))
    }

    /// Test case history page.
    #[must_use]
    pub fn test_case(&self, test_full_name: &str, build: &EntityRef) -> String {
        query("test-case", &self.test_params(test_full_name, build))
    }

    /// Failed runs of a test.
    #[must_use]
    pub fn test_failures(&self, test_full_name: &str, build: &EntityRef) -> String {
        let mut params = self.test_params(test_full_name, build);
        params.push(("f", ProblemCategory::Failed.as_param().to_string()));
        query("test-result", &params)
    }

    /// Page of one build run, from the run's server path.
    #[must_use]
    pub fn build_run(&self, path: &str) -> String {
        format!("{}/{}", self.root_url, path.trim_start_matches('/'))
    }

    fn window_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start", self.window.start_ms.to_string()),
            ("end", self.window.end_ms.to_string()),
        ]
    }

    fn test_params(&self, test_full_name: &str, build: &EntityRef) -> Vec<(&'static str, String)> {
        let mut params = self.window_params();
        params.push(("test_full_name", test_full_name.to_string()));
        params.push(("b", build.name.clone()));
        params.push(("labels", build.sub_label.clone()));
        params
    }
}

fn query(page: &str, params: &[(&str, String)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect();
    format!("{page}?{}", pairs.join("&"))
}
