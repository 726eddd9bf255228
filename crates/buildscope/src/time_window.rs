//! Time window selection: preset durations ending now, or a custom range.

use buildscope_core::format::timestamp_minutes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Errors from time window input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeWindowError {
    /// Preset label not recognized
    #[error("unknown time period '{0}'")]
    UnknownPreset(String),
    /// Start after end
    #[error("time period starts after it ends ({start_ms} > {end_ms})")]
    Inverted {
        /// Start, epoch milliseconds
        start_ms: i64,
        /// End, epoch milliseconds
        end_ms: i64,
    },
}

/// Preset durations offered by the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Preset {
    /// 6 hours
    #[serde(rename = "6h")]
    SixHours,
    /// 12 hours
    #[serde(rename = "12h")]
    TwelveHours,
    /// 1 day
    #[serde(rename = "1d")]
    OneDay,
    /// 3 days
    #[serde(rename = "3d")]
    ThreeDays,
    /// 1 week
    #[default]
    #[serde(rename = "1w")]
    OneWeek,
    /// 2 weeks
    #[serde(rename = "2w")]
    TwoWeeks,
    /// 30 days
    #[serde(rename = "1m")]
    OneMonth,
    /// 60 days
    #[serde(rename = "2m")]
    TwoMonths,
    /// 90 days
    #[serde(rename = "3m")]
    ThreeMonths,
    /// 180 days
    #[serde(rename = "6m")]
    SixMonths,
}

const HOUR: i64 = 3600;
const DAY: i64 = 24 * HOUR;

impl Preset {
    /// All presets, shortest first.
    pub const ALL: [Self; 10] = [
        Self::SixHours,
        Self::TwelveHours,
        Self::OneDay,
        Self::ThreeDays,
        Self::OneWeek,
        Self::TwoWeeks,
        Self::OneMonth,
        Self::TwoMonths,
        Self::ThreeMonths,
        Self::SixMonths,
    ];

    /// Picker label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SixHours => "6h",
            Self::TwelveHours => "12h",
            Self::OneDay => "1d",
            Self::ThreeDays => "3d",
            Self::OneWeek => "1w",
            Self::TwoWeeks => "2w",
            Self::OneMonth => "1m",
            Self::TwoMonths => "2m",
            Self::ThreeMonths => "3m",
            Self::SixMonths => "6m",
        }
    }

    /// Length in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::SixHours => 6 * HOUR,
            Self::TwelveHours => 12 * HOUR,
            Self::OneDay => DAY,
            Self::ThreeDays => 3 * DAY,
            Self::OneWeek => 7 * DAY,
            Self::TwoWeeks => 14 * DAY,
            Self::OneMonth => 30 * DAY,
            Self::TwoMonths => 60 * DAY,
            Self::ThreeMonths => 90 * DAY,
            Self::SixMonths => 180 * DAY,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Preset {
    type Err = TimeWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.label() == s)
            .ok_or_else(|| TimeWindowError::UnknownPreset(s.to_string()))
    }
}

/// A `[start, end]` range in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start, epoch milliseconds
    pub start_ms: i64,
    /// End, epoch milliseconds
    pub end_ms: i64,
}

impl TimeWindow {
    /// Create a window, rejecting a start after the end.
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self, TimeWindowError> {
        if start_ms > end_ms {
            return Err(TimeWindowError::Inverted { start_ms, end_ms });
        }
        Ok(Self { start_ms, end_ms })
    }

    /// The preset's duration ending at `now_ms`.
    #[must_use]
    pub const fn ending_at(preset: Preset, now_ms: i64) -> Self {
        Self {
            start_ms: now_ms - preset.seconds() * 1000,
            end_ms: now_ms,
        }
    }

    /// Length in milliseconds.
    #[must_use]
    pub const fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Start and end labels as shown in the picker inputs.
    #[must_use]
    pub fn labels(&self) -> (String, String) {
        (timestamp_minutes(self.start_ms), timestamp_minutes(self.end_ms))
    }
}

/// Source of the current time.
pub trait Clock {
    /// Now, in epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

type WindowListener = Box<dyn FnMut(&TimeWindow)>;

/// Owns the selected time window and notifies listeners when it changes.
pub struct TimeWindowController<C = SystemClock> {
    clock: C,
    window: TimeWindow,
    preset: Option<Preset>,
    listeners: Vec<WindowListener>,
}

impl<C: Clock> fmt::Debug for TimeWindowController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeWindowController")
            .field("window", &self.window)
            .field("preset", &self.preset)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<C: Clock> TimeWindowController<C> {
    /// Start on the default preset ending now.
    pub fn new(clock: C) -> Self {
        let preset = Preset::default();
        let window = TimeWindow::ending_at(preset, clock.now_ms());
        Self {
            clock,
            window,
            preset: Some(preset),
            listeners: Vec::new(),
        }
    }

    /// Start on a custom range, e.g. one carried in a page link. Either
    /// bound falls back to the default preset when absent.
    pub fn with_range(
        clock: C,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
    ) -> Result<Self, TimeWindowError> {
        let mut controller = Self::new(clock);
        if start_ms.is_some() || end_ms.is_some() {
            let start = start_ms.unwrap_or(controller.window.start_ms);
            let end = end_ms.unwrap_or(controller.window.end_ms);
            controller.window = TimeWindow::new(start, end)?;
            controller.preset = None;
        }
        Ok(controller)
    }

    /// Register a change listener.
    pub fn on_change(&mut self, listener: impl FnMut(&TimeWindow) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// The current window.
    #[must_use]
    pub const fn current_window(&self) -> TimeWindow {
        self.window
    }

    /// The selected preset, `None` for a custom range.
    #[must_use]
    pub const fn selected_preset(&self) -> Option<Preset> {
        self.preset
    }

    /// Select a preset; the window ends now. Always notifies, even when the
    /// same preset is selected again.
    pub fn select_preset(&mut self, preset: Preset) -> TimeWindow {
        self.preset = Some(preset);
        self.set(TimeWindow::ending_at(preset, self.clock.now_ms()))
    }

    /// Select a custom range.
    pub fn set_custom(&mut self, start_ms: i64, end_ms: i64) -> Result<TimeWindow, TimeWindowError> {
        let window = TimeWindow::new(start_ms, end_ms)?;
        self.preset = None;
        Ok(self.set(window))
    }

    fn set(&mut self, window: TimeWindow) -> TimeWindow {
        debug!(
            start = window.start_ms,
            end = window.end_ms,
            preset = ?self.preset,
            "time window changed"
        );
        self.window = window;
        for listener in &mut self.listeners {
            listener(&window);
        }
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_presets_in_order() {
        let labels: Vec<_> = Preset::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(
            labels,
            vec!["6h", "12h", "1d", "3d", "1w", "2w", "1m", "2m", "3m", "6m"]
        );
        assert!(Preset::ALL.windows(2).all(|w| w[0].seconds() < w[1].seconds()));
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("2w".parse::<Preset>().unwrap(), Preset::TwoWeeks);
        assert_eq!(
            "5y".parse::<Preset>().unwrap_err(),
            TimeWindowError::UnknownPreset("5y".to_string())
        );
        assert_eq!(Preset::OneMonth.to_string(), "1m");
    }

    #[test]
    fn test_default_is_one_week_ending_now() {
        let c = TimeWindowController::new(FixedClock(NOW));
        assert_eq!(c.selected_preset(), Some(Preset::OneWeek));
        let w = c.current_window();
        assert_eq!(w.end_ms, NOW);
        assert_eq!(w.duration_ms(), 7 * 24 * 3600 * 1000);
    }

    #[test]
    fn test_select_preset_notifies() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut c = TimeWindowController::new(FixedClock(NOW));
        c.on_change(move |w| sink.borrow_mut().push(*w));

        let w = c.select_preset(Preset::SixHours);
        assert_eq!(w.start_ms, NOW - 6 * 3600 * 1000);
        c.select_preset(Preset::SixHours);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_custom_range() {
        let mut c = TimeWindowController::new(FixedClock(NOW));
        let w = c.set_custom(10, 20).unwrap();
        assert_eq!(w, TimeWindow { start_ms: 10, end_ms: 20 });
        assert_eq!(c.selected_preset(), None);
        assert_eq!(
            c.set_custom(30, 20).unwrap_err(),
            TimeWindowError::Inverted { start_ms: 30, end_ms: 20 }
        );
        assert_eq!(c.current_window(), w);
    }

    #[test]
    fn test_with_range() {
        let c = TimeWindowController::with_range(FixedClock(NOW), Some(5), Some(9)).unwrap();
        assert_eq!(c.current_window(), TimeWindow { start_ms: 5, end_ms: 9 });
        assert_eq!(c.selected_preset(), None);

        let c = TimeWindowController::with_range(FixedClock(NOW), None, None).unwrap();
        assert_eq!(c.selected_preset(), Some(Preset::OneWeek));
    }

    #[test]
    fn test_labels() {
        let w = TimeWindow::new(0, 60_000).unwrap();
        assert_eq!(
            w.labels(),
            ("1970/01/01 00:00".to_string(), "1970/01/01 00:01".to_string())
        );
    }
}
