//! Refresh state machine with last-trigger-wins.
//!
//! Every trigger bumps a generation counter and hands out a ticket. Only the
//! response carrying the newest ticket is applied; older responses are
//! dropped no matter in which order they arrive.

use crate::source::FetchError;
use crate::time_window::TimeWindow;
use buildscope_core::format::{clean_test_label, entity_label};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A build (and optional sub-build) the detail pages are about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Build (project) name
    pub name: String,
    /// Sub-build labels, empty for the root build
    #[serde(default)]
    pub sub_label: String,
}

impl EntityRef {
    /// Create a reference.
    #[must_use]
    pub fn new(name: impl Into<String>, sub_label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_label: sub_label.into(),
        }
    }

    /// Display label: `name (sub)`.
    #[must_use]
    pub fn label(&self) -> String {
        entity_label(&self.name, &self.sub_label)
    }
}

/// A test case as run in one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestCaseRef {
    /// Full test name, parameters included
    pub test_full_name: String,
    /// Build and sub-build the test ran in
    pub build: EntityRef,
}

impl TestCaseRef {
    /// Create a reference.
    #[must_use]
    pub fn new(test_full_name: impl Into<String>, build: EntityRef) -> Self {
        Self {
            test_full_name: test_full_name.into(),
            build,
        }
    }

    /// Display label: `clean name (build,sub)`.
    #[must_use]
    pub fn label(&self) -> String {
        let mut parts = vec![self.build.name.as_str()];
        if !self.build.sub_label.is_empty() {
            parts.push(&self.build.sub_label);
        }
        format!(
            "{} ({})",
            clean_test_label(&self.test_full_name),
            parts.join(",")
        )
    }
}

/// What caused a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// First load of the page
    InitialLoad,
    /// The time window changed
    WindowChanged(TimeWindow),
    /// A different build was picked on a detail page
    EntitySelected(EntityRef),
    /// A different test case was picked on a detail page
    TestCaseSelected(TestCaseRef),
}

/// Refresh lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RefreshState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Waiting for the newest response
    Loading,
    /// Rows displayed
    Success,
    /// Fetch failed; carries the message shown to the user
    Error(String),
    /// The window holds no data
    Empty,
}

/// Proof of which trigger a response belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
    trigger: RefreshTrigger,
}

impl RefreshTicket {
    /// Generation number.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Trigger that started this refresh.
    #[must_use]
    pub const fn trigger(&self) -> &RefreshTrigger {
        &self.trigger
    }
}

/// Terminal result of one refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome<T> {
    /// The fetch failed
    Failed(FetchError),
    /// Nothing to show
    Empty,
    /// Data to show
    Populated(T),
}

impl<T> RefreshOutcome<T> {
    /// State entered for this outcome.
    #[must_use]
    pub fn state(&self) -> RefreshState {
        match self {
            Self::Failed(e) => RefreshState::Error(e.to_string()),
            Self::Empty => RefreshState::Empty,
            Self::Populated(_) => RefreshState::Success,
        }
    }

    /// Map the populated value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RefreshOutcome<U> {
        match self {
            Self::Failed(e) => RefreshOutcome::Failed(e),
            Self::Empty => RefreshOutcome::Empty,
            Self::Populated(v) => RefreshOutcome::Populated(f(v)),
        }
    }
}

impl<T> From<Result<T, FetchError>> for RefreshOutcome<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(v) => Self::Populated(v),
            Err(e) => Self::Failed(e),
        }
    }
}

/// Tracks the newest refresh and the current state.
#[derive(Debug, Clone, Default)]
pub struct RefreshController {
    generation: u64,
    state: RefreshState,
}

impl RefreshController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &RefreshState {
        &self.state
    }

    /// Check whether a refresh is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, RefreshState::Loading)
    }

    /// Start a refresh. Supersedes any refresh still in flight.
    pub fn begin(&mut self, trigger: RefreshTrigger) -> RefreshTicket {
        self.generation += 1;
        if self.is_loading() {
            debug!(generation = self.generation, "superseding in-flight refresh");
        }
        self.state = RefreshState::Loading;
        info!(generation = self.generation, trigger = ?trigger, "refresh started");
        RefreshTicket {
            generation: self.generation,
            trigger,
        }
    }

    /// Check whether a ticket belongs to the newest refresh.
    #[must_use]
    pub const fn is_current(&self, ticket: &RefreshTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply an outcome. Returns `None` and leaves the state untouched when
    /// the ticket is stale.
    pub fn finish<T>(
        &mut self,
        ticket: &RefreshTicket,
        outcome: RefreshOutcome<T>,
    ) -> Option<RefreshOutcome<T>> {
        let outcome = self.accept(ticket, outcome)?;
        self.settle(ticket, outcome.state());
        Some(outcome)
    }

    /// Pass an outcome through when the ticket is current, without leaving
    /// loading. Callers settle the state once the outcome is displayed.
    pub fn accept<T>(
        &self,
        ticket: &RefreshTicket,
        outcome: RefreshOutcome<T>,
    ) -> Option<RefreshOutcome<T>> {
        if self.is_current(ticket) {
            return Some(outcome);
        }
        warn!(
            stale = ticket.generation,
            current = self.generation,
            "dropping stale response"
        );
        None
    }

    /// Enter a terminal state. Ignored for stale tickets.
    pub fn settle(&mut self, ticket: &RefreshTicket, state: RefreshState) {
        if !self.is_current(ticket) {
            return;
        }
        self.state = state;
        match &self.state {
            RefreshState::Error(message) => warn!(generation = ticket.generation, %message, "refresh failed"),
            state => info!(generation = ticket.generation, ?state, "refresh finished"),
        }
    }
}
