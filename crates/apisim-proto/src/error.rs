//! Protocol error types.

use thiserror::Error;

/// Errors raised while parsing query input.
#[derive(Debug, Error)]
pub enum Error {
    /// A filter key does not follow the `<field>_<operator>` pattern.
    #[error("invalid filter key '{0}': expected <field>_<operator>")]
    InvalidFilterKey(String),

    /// The filter payload is not a JSON object.
    #[error("filter must be an object, got {0}")]
    InvalidFilter(String),

    /// The include list is malformed.
    #[error("invalid include: {0}")]
    InvalidInclude(String),

    /// The page object is malformed.
    #[error("invalid page: {0}")]
    InvalidPage(String),

    /// An offset marker could not be decoded.
    #[error("invalid offset marker '{0}'")]
    InvalidCursor(String),

    /// Input of the wrong shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// JSON decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
