//! Core error types.

use apisim_proto::RecordId;
use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Query input was rejected before any record was scanned.
    #[error("validation error: {0}")]
    Validation(String),

    /// Query input could not be parsed.
    #[error("validation error: {0}")]
    Protocol(#[from] apisim_proto::Error),

    /// The queried entity is not registered in the catalog.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// A single-record lookup found nothing.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Entity name.
        entity: String,
        /// Requested identifier.
        id: RecordId,
    },

    /// The schema bundle was rejected at catalog construction.
    #[error("schema error: {0}")]
    Schema(String),

    /// IO error while loading configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while loading configuration or fixtures.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check whether this error belongs to the validation class.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Protocol(_) | Error::UnknownEntity(_)
        )
    }
}

/// Shorthand for building a validation error.
pub(crate) fn validation(message: impl Into<String>) -> Error {
    Error::Validation(message.into())
}
