//! In-memory record storage.
//!
//! Collections are keyed by entity name; within a collection, records are
//! keyed by their identifier. The query engine reads through the
//! [`RecordSource`] trait and never mutates stored records.

mod store;

pub use store::{Collection, MemoryStore, RecordSource};
