//! Error types for manifest parsing.

use thiserror::Error;

/// Error type for manifest parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
    /// The default sort names no column
    #[error("default sort column '{0}' is not a column of the table")]
    UnknownDefaultColumn(String),
    /// Two columns share a key
    #[error("duplicate column key '{0}'")]
    DuplicateColumn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::Validation("columns must not be empty".to_string());
        assert_eq!(err.to_string(), "Validation error: columns must not be empty");

        let err = ParseError::UnknownDefaultColumn("count".to_string());
        assert_eq!(
            err.to_string(),
            "default sort column 'count' is not a column of the table"
        );

        let err = ParseError::DuplicateColumn("avg".to_string());
        assert_eq!(err.to_string(), "duplicate column key 'avg'");
    }

    #[test]
    fn test_yaml_error_converts() {
        let yaml_err = serde_yaml_ng::from_str::<Vec<u32>>("{").unwrap_err();
        let err = ParseError::from(yaml_err);
        assert!(err.to_string().starts_with("YAML error:"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
