//! Per-result statistics bar with a multi-select result filter.

use buildscope_core::{escape_html, format::percent, Brick, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Count of one result value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStat {
    /// Result value, e.g. `SUCCESS`
    pub result: String,
    /// Number of items with that result
    pub count: usize,
    /// Whether the stat is selected as a filter
    pub selected: bool,
}

/// Message emitted when the result selection changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFilterChanged {
    /// Selected results, in display order
    pub selected: Vec<String>,
}

/// Result counts over a set of items, in a fixed display order.
///
/// Clicking a stat toggles it in the selection; with nothing selected every
/// row is admitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStats {
    total: usize,
    stats: Vec<ResultStat>,
}

impl ResultStats {
    /// Count results. Only values listed in `available` get a stat, in that
    /// order; absent results are skipped.
    #[must_use]
    pub fn count<'a>(available: &[&str], results: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut total = 0;
        for result in results {
            *counts.entry(result).or_default() += 1;
            total += 1;
        }
        let stats = available
            .iter()
            .filter_map(|r| {
                counts.get(r).map(|&count| ResultStat {
                    result: (*r).to_string(),
                    count,
                    selected: false,
                })
            })
            .collect();
        Self { total, stats }
    }

    /// Count the `field` values of a row collection.
    #[must_use]
    pub fn from_rows(available: &[&str], rows: &[Row], field: &str) -> Self {
        let values: Vec<String> = rows.iter().map(|r| r.value(field).display()).collect();
        Self::count(available, values.iter().map(String::as_str))
    }

    /// Pre-select results, e.g. from the page URL.
    #[must_use]
    pub fn with_selected<S: AsRef<str>>(mut self, selected: &[S]) -> Self {
        for stat in &mut self.stats {
            stat.selected = selected.iter().any(|s| s.as_ref() == stat.result);
        }
        self
    }

    /// Number of counted items.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Stats in display order.
    #[must_use]
    pub fn stats(&self) -> &[ResultStat] {
        &self.stats
    }

    /// Stat for a result value.
    #[must_use]
    pub fn get(&self, result: &str) -> Option<&ResultStat> {
        self.stats.iter().find(|s| s.result == result)
    }

    /// Text for one stat: `RESULT: n (x.x%)`.
    #[must_use]
    pub fn label(&self, stat: &ResultStat) -> String {
        format!(
            "{}: {} ({})",
            stat.result,
            stat.count,
            percent(stat.count, self.total)
        )
    }

    /// Whole stats line, comma separated.
    #[must_use]
    pub fn summary(&self) -> String {
        self.stats
            .iter()
            .map(|s| self.label(s))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Toggle a result in the selection. Unknown results are ignored.
    pub fn toggle(&mut self, result: &str) -> Option<ResultFilterChanged> {
        let stat = self.stats.iter_mut().find(|s| s.result == result)?;
        stat.selected = !stat.selected;
        debug!(result, selected = stat.selected, "result filter toggled");
        Some(ResultFilterChanged {
            selected: self.selected(),
        })
    }

    /// Selected results in display order.
    #[must_use]
    pub fn selected(&self) -> Vec<String> {
        self.stats
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.result.clone())
            .collect()
    }

    /// Check whether a row with this result is shown.
    #[must_use]
    pub fn admits(&self, result: &str) -> bool {
        !self.stats.iter().any(|s| s.selected)
            || self.stats.iter().any(|s| s.selected && s.result == result)
    }
}

impl Brick for ResultStats {
    fn brick_name(&self) -> &'static str {
        "ResultStats"
    }

    fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="details-stats">"#);
        for (i, stat) in self.stats.iter().enumerate() {
            let sep = if i == 0 { "" } else { ", " };
            let selected = if stat.selected { " selected" } else { "" };
            html.push_str(&format!(
                r#"<span class="status-item{selected}" data-result="{}">{sep}{}</span>"#,
                escape_html(&stat.result),
                escape_html(&self.label(stat))
            ));
        }
        html.push_str("</div>");
        html
    }

    fn to_css(&self) -> String {
        ".details-stats .status-item { cursor: pointer; }\n\
         .details-stats .status-item.selected { font-weight: bold; }\n"
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILD_RESULTS: [&str; 4] = ["SUCCESS", "UNSTABLE", "FAILURE", "ABORTED"];

    fn stats() -> ResultStats {
        ResultStats::count(
            &BUILD_RESULTS,
            ["SUCCESS", "FAILURE", "SUCCESS", "SUCCESS", "FAILURE", "SUCCESS"],
        )
    }

    #[test]
    fn test_count_in_display_order() {
        let s = stats();
        assert_eq!(s.total(), 6);
        let results: Vec<_> = s.stats().iter().map(|s| s.result.as_str()).collect();
        assert_eq!(results, vec!["SUCCESS", "FAILURE"]);
        assert_eq!(s.get("SUCCESS").unwrap().count, 4);
        assert!(s.get("ABORTED").is_none());
    }

    #[test]
    fn test_unlisted_results_count_toward_total_only() {
        let s = ResultStats::count(&BUILD_RESULTS, ["SUCCESS", "NOT_BUILT"]);
        assert_eq!(s.total(), 2);
        assert_eq!(s.stats().len(), 1);
        assert_eq!(s.summary(), "SUCCESS: 1 (50.0%)");
    }

    #[test]
    fn test_summary_one_decimal() {
        assert_eq!(stats().summary(), "SUCCESS: 4 (66.7%), FAILURE: 2 (33.3%)");
    }

    #[test]
    fn test_toggle_selection() {
        let mut s = stats();
        assert!(s.admits("SUCCESS"));
        assert!(s.admits("FAILURE"));

        let msg = s.toggle("FAILURE").unwrap();
        assert_eq!(msg.selected, vec!["FAILURE"]);
        assert!(!s.admits("SUCCESS"));
        assert!(s.admits("FAILURE"));

        s.toggle("SUCCESS");
        assert_eq!(s.selected(), vec!["SUCCESS", "FAILURE"]);

        s.toggle("SUCCESS");
        s.toggle("FAILURE");
        assert!(s.selected().is_empty());
        assert!(s.admits("SUCCESS"));
    }

    #[test]
    fn test_toggle_unknown_result() {
        let mut s = stats();
        assert!(s.toggle("ABORTED").is_none());
    }

    #[test]
    fn test_preselected() {
        let s = stats().with_selected(&["FAILURE"]);
        assert!(s.get("FAILURE").unwrap().selected);
        let html = s.to_html();
        assert!(html.contains(r#"<span class="status-item selected" data-result="FAILURE">, FAILURE: 2 (33.3%)</span>"#));
    }

    #[test]
    fn test_from_rows() {
        let rows = vec![
            Row::root("1").field("result", "PASSED"),
            Row::root("2").field("result", "SKIPPED"),
        ];
        let s = ResultStats::from_rows(&["PASSED", "FAILED", "SKIPPED"], &rows, "result");
        assert_eq!(s.summary(), "PASSED: 1 (50.0%), SKIPPED: 1 (50.0%)");
    }
}
