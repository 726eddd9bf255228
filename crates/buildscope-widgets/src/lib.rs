//! Widgets for buildscope dashboards.

pub mod cell;
pub mod chart;
pub mod stats;
pub mod table;
pub mod typeahead;

pub use cell::{plain, CellContent, CellRenderer};
pub use chart::{ChartKind, ChartRequest, ChartSink, DataSeries, DeferredChart};
pub use stats::{ResultFilterChanged, ResultStat, ResultStats};
pub use table::{HeaderCell, TableError, TableHandle, TableSortChanged};
pub use typeahead::{SubstringMatcher, Typeahead};
