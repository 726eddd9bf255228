//! Dashboard errors.

use crate::time_window::TimeWindowError;
use buildscope_widgets::TableError;
use buildscope_yaml::ParseError;
use thiserror::Error;

/// Errors raised while setting up or driving a dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A table manifest failed to load
    #[error("table manifest: {0}")]
    Manifest(#[from] ParseError),
    /// A table could not be rendered or updated
    #[error(transparent)]
    Table(#[from] TableError),
    /// Invalid time window
    #[error(transparent)]
    TimeWindow(#[from] TimeWindowError),
}

/// Result alias for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;
