//! Catalog of queryable entities.
//!
//! The catalog describes each entity's filterable fields, default ordering,
//! page limits and default filters, plus the named relations that can be
//! included alongside results.

mod catalog;
mod entity;
mod field;
mod relation;
mod schema;
mod types;

pub use catalog::Catalog;
pub use entity::{DefaultWindow, EntityDef, IncludeMode, OrderBy, OrderDirection, PageLimits};
pub use field::{FieldDef, Minimum};
pub use relation::{Cardinality, EmbedShape, RelationDef};
pub use schema::SchemaBundle;
pub use types::{IdType, Normalize, ScalarType};
