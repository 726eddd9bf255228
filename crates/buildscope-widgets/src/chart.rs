//! Duration charts and a sink that defers drawing until the charting
//! library is ready.

use buildscope_core::Row;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Chart kinds drawn on the detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChartKind {
    /// Histogram of durations
    #[default]
    Histogram,
    /// Area chart of durations over builds
    Trend,
}

/// A labelled data series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSeries {
    /// Series name
    pub name: String,
    /// Data points (label, y)
    pub points: Vec<(String, f64)>,
}

impl DataSeries {
    /// Create an empty series.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Add a data point.
    #[must_use]
    pub fn point(mut self, label: impl Into<String>, y: f64) -> Self {
        self.points.push((label.into(), y));
        self
    }

    /// Build the `("#n", duration)` series from detail rows, in row order.
    ///
    /// Rows without a numeric duration are charted as zero.
    #[must_use]
    pub fn durations(rows: &[Row], number_field: &str, duration_field: &str) -> Self {
        let points = rows
            .iter()
            .map(|row| {
                let label = format!("#{}", row.value(number_field).display());
                let duration = row.value(duration_field).as_number().unwrap_or(0.0);
                (label, duration)
            })
            .collect();
        Self {
            name: "Duration".to_string(),
            points,
        }
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get min/max Y values.
    #[must_use]
    pub fn y_range(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let min = self
            .points
            .iter()
            .map(|(_, y)| *y)
            .fold(f64::INFINITY, f64::min);
        let max = self
            .points
            .iter()
            .map(|(_, y)| *y)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }
}

/// One chart to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    /// Chart kind
    pub kind: ChartKind,
    /// Data to chart
    pub series: DataSeries,
}

/// Something that draws charts, typically the browser charting library.
pub trait ChartSink {
    /// Draw one chart.
    fn draw(&mut self, request: &ChartRequest);
}

impl ChartSink for Vec<ChartRequest> {
    fn draw(&mut self, request: &ChartRequest) {
        self.push(request.clone());
    }
}

/// Queues draws until [`DeferredChart::mark_ready`], then forwards them.
#[derive(Debug)]
pub struct DeferredChart<S> {
    sink: S,
    ready: bool,
    pending: Vec<ChartRequest>,
}

impl<S: ChartSink> DeferredChart<S> {
    /// Wrap a sink that is not ready yet.
    pub const fn new(sink: S) -> Self {
        Self {
            sink,
            ready: false,
            pending: Vec::new(),
        }
    }

    /// Check if the sink is ready.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Requests waiting for the sink.
    #[must_use]
    pub fn pending(&self) -> &[ChartRequest] {
        &self.pending
    }

    /// Draw now if ready, otherwise queue. Only the latest queued request
    /// per chart kind is kept.
    pub fn draw(&mut self, request: ChartRequest) {
        if self.ready {
            self.sink.draw(&request);
            return;
        }
        debug!(kind = ?request.kind, "chart library not ready, queueing draw");
        match self.pending.iter_mut().find(|r| r.kind == request.kind) {
            Some(slot) => *slot = request,
            None => self.pending.push(request),
        }
    }

    /// Mark the sink ready and flush queued draws in order. Returns the
    /// number flushed.
    pub fn mark_ready(&mut self) -> usize {
        self.ready = true;
        let pending = std::mem::take(&mut self.pending);
        for request in &pending {
            self.sink.draw(request);
        }
        pending.len()
    }

    /// Get the wrapped sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }
}
