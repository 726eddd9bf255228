//! Display formatters for durations, timestamps and labels.

use chrono::DateTime;
use regex::Regex;
use std::sync::OnceLock;

/// Format a duration in seconds as `1h 2m 3s`.
///
/// Hours and minutes are omitted when zero; seconds are always shown.
#[must_use]
pub fn human_duration(seconds: f64) -> String {
    let total = seconds.max(0.0);
    let h = (total / 3600.0).floor();
    let m = ((total - 3600.0 * h) / 60.0).floor();
    let s = (total - 3600.0 * h - 60.0 * m).floor();

    let mut out = String::new();
    if h > 0.0 {
        out.push_str(&format!("{h}h "));
    }
    if m > 0.0 {
        out.push_str(&format!("{m}m "));
    }
    out.push_str(&format!("{s}s"));
    out
}

/// Format epoch milliseconds as `YYYY/MM/DD HH:MM:SS` (UTC).
#[must_use]
pub fn timestamp(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms).map_or_else(
        || epoch_ms.to_string(),
        |t| t.format("%Y/%m/%d %H:%M:%S").to_string(),
    )
}

/// Format epoch milliseconds as `YYYY/MM/DD HH:MM` (UTC).
#[must_use]
pub fn timestamp_minutes(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms).map_or_else(
        || epoch_ms.to_string(),
        |t| t.format("%Y/%m/%d %H:%M").to_string(),
    )
}

fn bracketed_params() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^\[\]]*)\[[^\[\]]*\]").expect("static regex is valid"))
}

/// Strip bracketed parameter segments from a test name.
///
/// `v.io/x.TestFoo[linux]` becomes `v.io/x.TestFoo`.
#[must_use]
pub fn clean_test_label(label: &str) -> String {
    bracketed_params()
        .replace_all(label, "$1")
        .trim()
        .to_string()
}

/// Label for an entity with an optional sub-label: `name (sub)`.
#[must_use]
pub fn entity_label(name: &str, sub_label: &str) -> String {
    if sub_label.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({sub_label})")
    }
}

/// Percentage with one decimal place.
#[must_use]
pub fn percent(part: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 / total as f64 * 100.0)
}
