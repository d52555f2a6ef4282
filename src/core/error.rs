/// Error Module
///
/// This module defines the error type shared by every row stream. Errors are
/// never thrown out of band: each one is delivered as the `Err` half of an
/// item pulled from a [`Scan`](crate::Scan), [`Query`](crate::Query) or
/// [`Exec`](crate::Exec) sequence, after which that sequence yields nothing.
use rusqlite::types::FromSqlError;
use thiserror::Error;

/// Error type for row streaming.
///
/// Variants follow the order in which a failure can happen while streaming:
/// - Submitting a query or command to the store
/// - Enumerating the result columns
/// - Decoding a single row
/// - Finalizing or closing the cursor
/// - Executing one step of a write pipeline, or reading its input
#[derive(Error, Debug)]
pub enum SqlRangeError {
    /// Driver errors raised by SQLite while preparing, binding or executing
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The cursor could not report its column names
    #[error("Column enumeration failed: {0}")]
    Columns(String),

    /// A column value could not be converted into the target attribute
    #[error("Decode error on column {column:?}: {source}")]
    Decode {
        column: String,
        #[source]
        source: FromSqlError,
    },

    /// A result column has no mapped attribute to decode into
    #[error("Unscannable target: column {column:?} at position {index} is not mapped by the row shape")]
    UnscannableTarget { column: String, index: usize },

    /// The cursor reported a trailing error after its last row
    #[error("Cursor finalization failed: {0}")]
    Finalize(String),

    /// Releasing the cursor failed
    #[error("Cursor close failed: {0}")]
    Close(String),

    /// A column name requested by the caller is not mapped by the row shape
    #[error("Column {0:?} not found in row shape")]
    ColumnNotFound(String),

    /// Error forwarded from a caller-supplied input sequence
    #[error("Input error: {0}")]
    Input(String),

    /// The caller's context was cancelled
    #[error("Context cancelled")]
    Cancelled,

    /// The caller's context deadline passed
    #[error("Context deadline exceeded")]
    DeadlineExceeded,

    /// An attribute value could not be converted into a store value
    #[error("Value conversion failed for attribute at {path:?}: {message}")]
    Value { path: Vec<usize>, message: String },

    /// The store did not report a generated identifier
    #[error("Generated identifier is not available for this command")]
    NoInsertId,

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SqlRangeError {
    /// Wraps a conversion failure for `column` in a [`SqlRangeError::Decode`].
    pub fn decode(column: impl Into<String>, source: FromSqlError) -> Self {
        SqlRangeError::Decode {
            column: column.into(),
            source,
        }
    }

    /// Returns true for errors produced by a cancelled or expired context.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SqlRangeError::Cancelled | SqlRangeError::DeadlineExceeded)
    }
}

/// Type alias for Result to use SqlRangeError as the error type.
pub type Result<T> = std::result::Result<T, SqlRangeError>;
