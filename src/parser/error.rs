//! Parser error types for profile analysis

use thiserror::Error;

/// Errors that can occur during profile parsing
///
/// `MissingQuery` is the only error `analyze_document` surfaces: every
/// other malformed or absent field resolves to a zero/placeholder value.
/// The parse variants are produced by the strict [`ValueParser`] API and
/// swallowed by its fail-soft wrappers.
///
/// [`ValueParser`]: crate::parser::core::ValueParser
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid profile: missing Query object")]
    MissingQuery,

    #[error("failed to parse duration: {0}")]
    ParseDurationError(String),

    #[error("failed to parse bytes: {0}")]
    ParseBytesError(String),
}

/// Result type alias for parser operations
pub type ParseResult<T> = Result<T, ParseError>;
