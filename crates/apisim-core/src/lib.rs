//! apisim core - entity catalog, record store, and list query engine.
//!
//! Every list endpoint of the simulated APIs goes through the same pipeline:
//! filter a collection by named predicates, sort deterministically, cut a
//! page with an offset marker, and optionally include related records.

pub mod catalog;
pub mod config;
pub mod entities;
pub mod error;
pub mod query;
pub mod storage;

pub use catalog::{
    Cardinality, Catalog, DefaultWindow, EntityDef, FieldDef, IdType, IncludeMode, Normalize,
    OrderBy, OrderDirection, PageLimits, RelationDef, ScalarType, SchemaBundle,
};
pub use config::EngineConfig;
pub use entities::stock_schema;
pub use error::Error;
pub use query::{QueryExecutor, QueryPlan, QueryPlanner};
pub use storage::{Collection, MemoryStore, RecordSource};

/// Re-export protocol types.
pub use apisim_proto as proto;
