//! Error types for the migration library.

use thiserror::Error;

/// Process exit code for configuration problems.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Process exit code for connection failures.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Process exit code for inventory (source account) failures.
pub const EXIT_INVENTORY_ERROR: u8 = 3;
/// Process exit code when the run finished but some users or targets failed.
pub const EXIT_PARTIAL_FAILURE: u8 = 4;
/// Process exit code for file errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Process exit code when the run was interrupted.
pub const EXIT_CANCELLED: u8 = 130;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connecting to (or pinging) a server failed. `target` is already redacted.
    #[error("Connection to {target} failed: {message}")]
    Connection { target: String, message: String },

    /// A query or statement failed.
    #[error("{context}: {message}")]
    Query { context: String, message: String },

    /// The include/exclude filters left nothing to migrate.
    #[error("no accounts matched the include/exclude filters")]
    NoMatchingAccounts,

    /// Reading the grants of a single source account failed.
    #[error("grants for {account}: {message}")]
    Inventory { account: String, message: String },

    /// A network operation exceeded its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Migration was cancelled (SIGINT, etc.)
    #[error("migration cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create a Connection error for an endpoint.
    pub fn connection(target: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Connection {
            target: target.into(),
            message: message.to_string(),
        }
    }

    /// Create a Query error with context about where it occurred.
    pub fn query(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Query {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an Inventory error for one account.
    pub fn inventory(account: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Inventory {
            account: account.into(),
            message: message.to_string(),
        }
    }

    /// Exit code the CLI reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) | MigrateError::Json(_) => {
                EXIT_CONFIG_ERROR
            }
            MigrateError::Connection { .. } | MigrateError::Timeout(_) => EXIT_CONNECTION_ERROR,
            MigrateError::Query { .. }
            | MigrateError::NoMatchingAccounts
            | MigrateError::Inventory { .. } => EXIT_INVENTORY_ERROR,
            MigrateError::Io(_) => EXIT_IO_ERROR,
            MigrateError::Cancelled => EXIT_CANCELLED,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            MigrateError::connection("db", "refused").exit_code(),
            EXIT_CONNECTION_ERROR
        );
        assert_eq!(
            MigrateError::NoMatchingAccounts.exit_code(),
            EXIT_INVENTORY_ERROR
        );
        assert_eq!(MigrateError::Cancelled.exit_code(), EXIT_CANCELLED);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(MigrateError::from(io).exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = MigrateError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error: missing"));
    }
}
