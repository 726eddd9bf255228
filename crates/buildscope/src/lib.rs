//! Buildscope: build and test history dashboards for a CI server.
//!
//! Four pages share one table engine:
//! - [`BuildsPage`]: per-project build summaries with expandable sub-builds
//! - [`TestsPage`]: failed tests and longest-running tests
//! - [`DetailPage`]: the run history of one build or one test case
//!
//! A [`Dashboard`] owns a page, the selected [`TimeWindow`] and the refresh
//! state machine. Every window change or entity selection starts a refresh;
//! only the newest one is ever applied.
//!
//! # Browser Usage (WASM)
//!
//! ```javascript
//! import init, { App } from './buildscope.js';
//!
//! async function main() {
//!     await init();
//!     const app = new App('dashboard', fetchData, drawChart);
//!     app.start();
//! }
//! ```

pub mod browser;
mod dashboard;
mod error;
mod links;
pub mod pages;
mod refresh;
mod route;
mod source;
mod tables;
mod time_window;

pub use buildscope_core::*;
pub use buildscope_widgets as widgets;
pub use buildscope_yaml as yaml;

pub use dashboard::{start_refresh, Dashboard};
pub use error::{DashboardError, Result};
pub use links::QueryLinks;
pub use pages::{BuildsPage, DetailKind, DetailPage, Page, PanelState, Subject, TablePanel, TestsPage};
pub use refresh::{
    EntityRef, RefreshController, RefreshOutcome, RefreshState, RefreshTicket, RefreshTrigger,
    TestCaseRef,
};
pub use route::{PageParams, Route};
pub use source::{DataSource, FetchError, FetchRequest, FetchResponse, FetchResult};
pub use tables::BuiltinTable;
pub use time_window::{
    Clock, FixedClock, Preset, SystemClock, TimeWindow, TimeWindowController, TimeWindowError,
};

#[cfg(target_arch = "wasm32")]
pub use browser::App;
