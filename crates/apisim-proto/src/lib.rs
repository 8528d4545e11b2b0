//! Query vocabulary for simulated API list endpoints.
//!
//! This crate defines the types every list endpoint shares: opaque records,
//! filter specifications, page objects, include lists, offset markers and
//! query results. It carries no evaluation logic.
//!
//! # Modules
//!
//! - [`record`] - Records and record identifiers
//! - [`query`] - Filter, page and include input types
//! - [`cursor`] - Offset marker encoding
//! - [`result`] - Query results and pagination metadata
//! - [`error`] - Input parsing errors

pub mod cursor;
pub mod error;
pub mod query;
pub mod record;
pub mod result;

pub use cursor::Cursor;
pub use error::Error;
pub use query::{FilterOp, FilterSpec, IncludeSpec, ListQuery, PageSpec};
pub use record::{Record, RecordId};
pub use result::{PageMetadata, QueryResult};
