//! Built-in table definitions, embedded from `tables/*.yaml`.

use buildscope_yaml::{ParseError, TableManifest};

/// The tables the dashboards show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTable {
    /// Builds overview
    Builds,
    /// Tests with failures
    FailedTests,
    /// Slowest tests
    LongestTests,
    /// Runs of one build
    BuildHistory,
    /// Runs of one test case
    TestHistory,
}

impl BuiltinTable {
    /// Every built-in table.
    pub const ALL: [Self; 5] = [
        Self::Builds,
        Self::FailedTests,
        Self::LongestTests,
        Self::BuildHistory,
        Self::TestHistory,
    ];

    /// Manifest source.
    #[must_use]
    pub const fn yaml(self) -> &'static str {
        match self {
            Self::Builds => include_str!("../tables/builds.yaml"),
            Self::FailedTests => include_str!("../tables/failed_tests.yaml"),
            Self::LongestTests => include_str!("../tables/longest_tests.yaml"),
            Self::BuildHistory => include_str!("../tables/build_history.yaml"),
            Self::TestHistory => include_str!("../tables/test_history.yaml"),
        }
    }

    /// Parsed and validated manifest.
    pub fn manifest(self) -> Result<TableManifest, ParseError> {
        TableManifest::load(self.yaml())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildscope_core::{ColumnRole, ProblemCategory, SortSpec};

    #[test]
    fn test_all_manifests_load() {
        for table in BuiltinTable::ALL {
            let manifest = table.manifest().unwrap();
            assert!(!manifest.empty_message.is_empty(), "{table:?}");
        }
    }

    #[test]
    fn test_builds_table() {
        let m = BuiltinTable::Builds.manifest().unwrap();
        assert_eq!(m.default_sort(), SortSpec::descending("avg"));
        let columns = m.columns();
        assert_eq!(columns.len(), 9);
        assert_eq!(columns[4].label, "total #");
        assert_eq!(columns[5].role, ColumnRole::Count);
        assert_eq!(columns[8].role, ColumnRole::Problem(ProblemCategory::Aborted));
    }

    #[test]
    fn test_tests_tables() {
        let failed = BuiltinTable::FailedTests.manifest().unwrap();
        let longest = BuiltinTable::LongestTests.manifest().unwrap();
        assert_eq!(failed.default_sort(), SortSpec::descending("failed_count"));
        assert_eq!(longest.default_sort(), SortSpec::descending("avg_duration"));
        assert_eq!(failed.empty_message, "No failed tests found in this time period");
        assert_eq!(longest.empty_message, "No tests found in this time period");
        assert_eq!(failed.columns(), longest.columns());
    }
}
