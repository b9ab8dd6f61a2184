//! Error types for the fermage library.
//!
//! Internal code works with `anyhow` (`Res<T>`) and adds context as errors bubble up. At the public
//! boundary every error is tagged with an `ErrorType` so that callers can tell a missing year sheet
//! from a bad selection without matching on message text.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Result type used internally, where only the error message and context chain matter.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// Result type returned by public functions.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of failure, as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The workbook has no sheet for the requested year.
    MissingSheet,
    /// A data row does not have the expected shape, or holds a value outside its allowed range.
    MalformedRow,
    /// No row matches the requested owner and tenant.
    NotFound,
    /// None of the selected parcels produced an invoice line.
    NoLines,
    /// The user's selection is incomplete or refers to unknown parcels.
    Selection,
    /// Reading or writing a file failed.
    Io,
    /// The configuration is missing or invalid.
    Config,
    /// The PDF document could not be produced.
    Render,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// The public error type. It wraps an `anyhow::Error` together with its `ErrorType`.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    /// Shorthand for an error built from a message.
    pub(crate) fn msg(error_type: ErrorType, message: impl Display) -> Self {
        Self::new(error_type, anyhow::anyhow!("{message}"))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The alternate form prints the whole context chain on one line.
        write!(f, "{:#}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts any result with an `anyhow`-compatible error into a public `Result`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
