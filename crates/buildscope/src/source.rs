//! Data source abstraction: what the dashboards ask for and what comes back.

use crate::refresh::EntityRef;
use crate::time_window::TimeWindow;
use buildscope_core::RowError;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fetch failure. The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server reported an error
    #[error("{0}")]
    Server(String),
    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(String),
    /// A record could not be turned into a row
    #[error("malformed response: {0}")]
    Malformed(#[from] RowError),
    /// The response arrived but the page could not display it
    #[error("cannot show response: {0}")]
    Render(String),
}

/// What a dashboard asks its data source for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchRequest {
    /// Per-project build summaries
    Builds {
        /// Time window
        window: TimeWindow,
    },
    /// Failed and longest test summaries
    Tests {
        /// Time window
        window: TimeWindow,
    },
    /// Run history of one build
    BuildHistory {
        /// Time window
        window: TimeWindow,
        /// Build and sub-build
        build: EntityRef,
    },
    /// Run history of one test case
    TestHistory {
        /// Time window
        window: TimeWindow,
        /// Build and sub-build the test ran in
        build: EntityRef,
        /// Full test name
        test_full_name: String,
    },
    /// Builds available for selection
    AvailableBuilds {
        /// Time window
        window: TimeWindow,
    },
    /// Test cases available for selection
    AvailableTests {
        /// Time window
        window: TimeWindow,
    },
}

impl FetchRequest {
    /// Time window of the request.
    #[must_use]
    pub const fn window(&self) -> &TimeWindow {
        match self {
            Self::Builds { window }
            | Self::Tests { window }
            | Self::BuildHistory { window, .. }
            | Self::TestHistory { window, .. }
            | Self::AvailableBuilds { window }
            | Self::AvailableTests { window } => window,
        }
    }
}

/// Response of the data source.
///
/// `items` carries the rows of single-table responses. The tests overview
/// fills `failed_tests` and `longest_tests` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// Non-empty when the server reports an error
    #[serde(default, alias = "errMsg")]
    pub error_message: String,
    /// Records
    #[serde(default, alias = "builds", alias = "tests")]
    pub items: Vec<serde_json::Value>,
    /// Failed-test records
    #[serde(default, alias = "failedTests")]
    pub failed_tests: Vec<serde_json::Value>,
    /// Longest-test records
    #[serde(default, alias = "longestTests")]
    pub longest_tests: Vec<serde_json::Value>,
}

impl FetchResponse {
    /// A successful response with records.
    #[must_use]
    pub fn items(items: Vec<serde_json::Value>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// A response carrying a server error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            ..Self::default()
        }
    }

    /// Turn a server-reported error into a [`FetchError`].
    pub fn into_result(self) -> Result<Self, FetchError> {
        if self.error_message.is_empty() {
            Ok(self)
        } else {
            Err(FetchError::Server(self.error_message))
        }
    }
}

/// Result of one fetch.
pub type FetchResult = Result<FetchResponse, FetchError>;

/// Supplies dashboard data. Futures are `!Send`; everything runs on the
/// browser's single thread.
pub trait DataSource {
    /// Fetch data for a request.
    fn fetch(&self, request: &FetchRequest) -> LocalBoxFuture<'static, FetchResult>;
}

impl<F> DataSource for F
where
    F: Fn(&FetchRequest) -> LocalBoxFuture<'static, FetchResult>,
{
    fn fetch(&self, request: &FetchRequest) -> LocalBoxFuture<'static, FetchResult> {
        self(request)
    }
}
