//! Typeahead suggestions for switching the entity shown on a detail page.

use std::collections::BTreeMap;

/// Default number of suggestions returned.
pub const DEFAULT_LIMIT: usize = 100;

/// Case-insensitive substring matcher over a sorted candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringMatcher {
    candidates: Vec<String>,
    lowered: Vec<String>,
    limit: usize,
}

impl SubstringMatcher {
    /// Create a matcher. Candidates are sorted and de-duplicated.
    #[must_use]
    pub fn new(candidates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut candidates: Vec<String> = candidates.into_iter().map(Into::into).collect();
        candidates.sort();
        candidates.dedup();
        let lowered = candidates.iter().map(|c| c.to_lowercase()).collect();
        Self {
            candidates,
            lowered,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Set the maximum number of suggestions.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Candidates containing `query`, ignoring case, in sorted order.
    /// An empty query suggests nothing.
    #[must_use]
    pub fn matches(&self, query: &str) -> Vec<&str> {
        if query.is_empty() {
            return Vec::new();
        }
        let query = query.to_lowercase();
        self.candidates
            .iter()
            .zip(&self.lowered)
            .filter(|(_, lower)| lower.contains(&query))
            .map(|(c, _)| c.as_str())
            .take(self.limit)
            .collect()
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check if there are no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Maps display labels to the entities they stand for.
#[derive(Debug, Clone)]
pub struct Typeahead<T> {
    entries: BTreeMap<String, T>,
    matcher: SubstringMatcher,
}

impl<T> Typeahead<T> {
    /// Build from `(label, entity)` pairs. A repeated label keeps the last
    /// entity.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (String, T)>) -> Self {
        let entries: BTreeMap<String, T> = entries.into_iter().collect();
        let matcher = SubstringMatcher::new(entries.keys().cloned());
        Self { entries, matcher }
    }

    /// Set the maximum number of suggestions.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.matcher = self.matcher.limit(limit);
        self
    }

    /// Suggested labels for a query.
    #[must_use]
    pub fn suggest(&self, query: &str) -> Vec<&str> {
        self.matcher.matches(query)
    }

    /// Entity for a selected label.
    #[must_use]
    pub fn select(&self, label: &str) -> Option<&T> {
        self.entries.get(label)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_substring() {
        let m = SubstringMatcher::new(["vanadium-go-test", "Vanadium-Integration", "other"]);
        assert_eq!(m.matches("VANADIUM"), vec!["Vanadium-Integration", "vanadium-go-test"]);
        assert_eq!(m.matches("go-t"), vec!["vanadium-go-test"]);
        assert!(m.matches("zzz").is_empty());
    }

    #[test]
    fn test_empty_query_suggests_nothing() {
        let m = SubstringMatcher::new(["a"]);
        assert!(m.matches("").is_empty());
    }

    #[test]
    fn test_regex_characters_are_literal() {
        let m = SubstringMatcher::new(["TestFoo[linux]", "TestFoo"]);
        assert_eq!(m.matches("[linux"), vec!["TestFoo[linux]"]);
        assert_eq!(m.matches("."), Vec::<&str>::new());
    }

    #[test]
    fn test_limit() {
        let m = SubstringMatcher::new((0..10).map(|i| format!("build-{i}"))).limit(3);
        assert_eq!(m.matches("build"), vec!["build-0", "build-1", "build-2"]);
        assert_eq!(m.len(), 10);
    }

    #[test]
    fn test_dedup() {
        let m = SubstringMatcher::new(["a", "a", "b"]);
        assert_eq!(m.len(), 2);
        assert!(!m.is_empty());
    }

    #[test]
    fn test_typeahead_select() {
        let t = Typeahead::new(vec![
            ("go-test (linux)".to_string(), ("go-test", "linux")),
            ("go-test (darwin)".to_string(), ("go-test", "darwin")),
        ]);
        assert_eq!(t.suggest("linux"), vec!["go-test (linux)"]);
        assert_eq!(t.select("go-test (darwin)"), Some(&("go-test", "darwin")));
        assert!(t.select("missing").is_none());
        assert_eq!(t.len(), 2);
    }
}
