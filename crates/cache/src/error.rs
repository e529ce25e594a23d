//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! A cache miss is never an error. Only infrastructure failures (the database
//! file cannot be opened or written) and data that cannot be decoded are
//! raised to the caller.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The database could not be opened, read or written.
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A stored value could not be decoded into its typed form.
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// A table descriptor names something that is not a plain SQL identifier.
    #[display("invalid table descriptor: {_0}")]
    InvalidDescriptor(#[error(not(source))] &'static str),
    /// Rows in a discriminated table must be written with a media type.
    #[display("media type required when writing to {_0}")]
    MissingMediaType(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}

/// Raise a failed read.
///
/// A row that cannot be decoded is corrupt, so retrying it never helps.
pub(crate) fn read_error(err: sqlx::Error) -> Error {
    let kind = match &err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => ErrorKind::InvalidData("stored row"),
        _ => ErrorKind::Database,
    };
    exn::Exn::new(err).raise(kind)
}
