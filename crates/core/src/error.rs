use thiserror::Error;

/// Errors produced by the pure parts of dumpkeeper (no I/O variants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    #[error("Database URL does not name a database: {0}")]
    MissingDatabase(String),

    #[error("Invalid last-restore marker: {0}")]
    InvalidMarker(String),

    #[error("Invalid restore point metadata: {0}")]
    InvalidMetadata(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_display() {
        let error = CoreError::InvalidUrl("relative URL without a base".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid database URL: relative URL without a base"
        );
    }

    #[test]
    fn test_missing_database_display() {
        let error = CoreError::MissingDatabase("postgresql://localhost".to_string());
        assert_eq!(
            error.to_string(),
            "Database URL does not name a database: postgresql://localhost"
        );
    }

    #[test]
    fn test_invalid_marker_display() {
        let error = CoreError::InvalidMarker("yesterday".to_string());
        assert_eq!(error.to_string(), "Invalid last-restore marker: yesterday");
    }
}
