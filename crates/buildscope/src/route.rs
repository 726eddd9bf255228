//! Page routing and query parameters carried by dashboard links.

use crate::refresh::EntityRef;
use std::collections::HashMap;

/// Dashboard page addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Per-project build summaries
    Builds,
    /// Failed and longest tests
    Tests,
    /// Run history of one build
    BuildHistory,
    /// Run history of one test case
    TestHistory,
}

impl Route {
    /// Match a location path by its last segment. Query string and hash are
    /// ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split('?').next().unwrap_or(path);
        let path = path.split('#').next().unwrap_or(path);
        let last = path.split('/').rfind(|s| !s.is_empty())?;
        match last {
            "jenkins-builds" => Some(Self::Builds),
            "test-results" => Some(Self::Tests),
            "jenkins-build" => Some(Self::BuildHistory),
            "test-case" | "test-result" => Some(Self::TestHistory),
            _ => None,
        }
    }

    /// Path segment of the page.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Builds => "jenkins-builds",
            Self::Tests => "test-results",
            Self::BuildHistory => "jenkins-build",
            Self::TestHistory => "test-case",
        }
    }
}

/// Parameters of a detail-page link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageParams {
    /// Build and sub-build (`b`, `labels`)
    pub build: Option<EntityRef>,
    /// Full test name (`test_full_name`)
    pub test_full_name: Option<String>,
    /// Window start (`start`)
    pub start_ms: Option<i64>,
    /// Window end (`end`)
    pub end_ms: Option<i64>,
    /// Preselected results (`f`, comma separated)
    pub result_filters: Vec<String>,
}

impl PageParams {
    /// Parse a location search string, with or without the leading `?`.
    /// Unparsable numbers are treated as absent.
    #[must_use]
    pub fn parse(search: &str) -> Self {
        let raw = parse_query(search);
        let get = |k: &str| raw.get(k).filter(|v| !v.is_empty()).cloned();

        let build = get("b").map(|name| EntityRef {
            name,
            sub_label: get("labels").unwrap_or_default(),
        });
        Self {
            build,
            test_full_name: get("test_full_name"),
            start_ms: get("start").and_then(|v| v.parse().ok()),
            end_ms: get("end").and_then(|v| v.parse().ok()),
            result_filters: get("f")
                .map(|f| {
                    f.split(',')
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

fn parse_query(search: &str) -> HashMap<String, String> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), decode(v))
        })
        .collect()
}

fn decode(s: &str) -> String {
    let s = s.replace('+', " ");
    urlencoding::decode(&s).map_or_else(|_| s.clone(), |d| d.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_path() {
        assert_eq!(Route::from_path("/jenkins-builds"), Some(Route::Builds));
        assert_eq!(
            Route::from_path("/plugin/analyzer/jenkins-build?b=x"),
            Some(Route::BuildHistory)
        );
        assert_eq!(Route::from_path("test-result#top"), Some(Route::TestHistory));
        assert_eq!(Route::from_path("/"), None);
        assert_eq!(Route::from_path("/settings"), None);
        assert_eq!(Route::from_path(Route::Tests.path()), Some(Route::Tests));
    }

    #[test]
    fn test_parse_detail_params() {
        let p = PageParams::parse(
            "?start=100&end=200&labels=linux%2C%20386&b=go%20test&f=FAILURE,ABORTED",
        );
        assert_eq!(p.build, Some(EntityRef::new("go test", "linux, 386")));
        assert_eq!(p.start_ms, Some(100));
        assert_eq!(p.end_ms, Some(200));
        assert_eq!(p.result_filters, vec!["FAILURE", "ABORTED"]);
        assert_eq!(p.test_full_name, None);
    }

    #[test]
    fn test_parse_missing_and_bad_values() {
        let p = PageParams::parse("start=NaN&b=&test_full_name=a+b");
        assert_eq!(p.start_ms, None);
        assert_eq!(p.build, None);
        assert_eq!(p.test_full_name.as_deref(), Some("a b"));
        assert!(p.result_filters.is_empty());
        assert_eq!(PageParams::parse(""), PageParams::default());
    }
}
