//! Error types for the slice-extraction library.

use thiserror::Error;

/// Main error type for slice-extraction operations.
#[derive(Error, Debug)]
pub enum SliceError {
    /// Configuration error (missing file, invalid JSON, bad values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source database connection or query error.
    ///
    /// Driver errors carry their native diagnostic payload (SQLSTATE and
    /// detail string) and surface unchanged.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// Connection pool error with context about where it occurred.
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// The foreign-key graph contains a cycle: Kahn's algorithm could not
    /// order every reached table.
    #[error("cycle in foreign-key graph: ordered {sorted} of {reached} tables")]
    Cycle { sorted: usize, reached: usize },

    /// An internal invariant was violated (disjoint partition, parsed-CSV
    /// header, needed-FK column presence). Indicates a bug or a schema
    /// change mid-run.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// IO error (file operations).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SliceError {
    /// Create a Pool error with context about where it occurred.
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        SliceError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create an Invariant error.
    pub fn invariant(message: impl Into<String>) -> Self {
        SliceError::Invariant(message.into())
    }

    /// Format error with full details including the source chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Process exit code for this error. Every unhandled error exits 1.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Result type alias for slice-extraction operations.
pub type Result<T> = std::result::Result<T, SliceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_error_carries_context() {
        let err = SliceError::pool("timed out", "getting connection for columns_of");
        let msg = err.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("columns_of"));
    }

    #[test]
    fn cycle_error_names_counts() {
        let err = SliceError::Cycle {
            sorted: 3,
            reached: 5,
        };
        assert_eq!(
            err.to_string(),
            "cycle in foreign-key graph: ordered 3 of 5 tables"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn format_detailed_includes_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = SliceError::Io(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error"));
    }
}
