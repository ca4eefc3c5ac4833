//! Error types for tablegate

use thiserror::Error;

/// Result type alias for tablegate operations
pub type GateResult<T> = Result<T, GateError>;

/// Errors raised around the query core.
///
/// Classification and compilation never fail; these cover the collaborators
/// (allow-list, configuration, pool, execution, row shaping).
#[derive(Debug, Error)]
pub enum GateError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Table rejected by the allow-list
    #[error("Table not allowed: {0}")]
    TableNotAllowed(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl GateError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if the allow-list rejected the table
    pub fn is_table_not_allowed(&self) -> bool {
        matches!(self, Self::TableNotAllowed(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a row decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Message reported by the database driver, if this error came from it.
    ///
    /// Prefers the server's own message over the driver's wrapper text.
    pub fn driver_message(&self) -> Option<String> {
        match self {
            Self::Query(err) => Some(
                err.as_db_error()
                    .map(|db| db.message().to_string())
                    .unwrap_or_else(|| err.to_string()),
            ),
            Self::Connection(msg) | Self::Pool(msg) => Some(msg.clone()),
            _ => None,
        }
    }
}

impl From<deadpool_postgres::PoolError> for GateError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_column() {
        let err = GateError::decode("created_at", "unsupported type");
        assert!(err.is_decode());
        assert_eq!(
            err.to_string(),
            "Decode error on column 'created_at': unsupported type"
        );
    }

    #[test]
    fn table_not_allowed_predicate() {
        let err = GateError::TableNotAllowed("secrets".to_string());
        assert!(err.is_table_not_allowed());
        assert!(!err.is_not_found());
        assert_eq!(err.driver_message(), None);
    }

    #[test]
    fn pool_error_exposes_driver_message() {
        let err = GateError::Pool("timed out".to_string());
        assert_eq!(err.driver_message().as_deref(), Some("timed out"));
    }
}
