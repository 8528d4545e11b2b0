//! Query engine.
//!
//! A [`ListQuery`](apisim_proto::ListQuery) is planned against the catalog
//! (all validation happens here), then executed as a scan: filter, sort,
//! paginate, include.

mod executor;
mod filter;
mod include;
mod paginate;
mod planner;
mod sort;
mod value;

pub use executor::QueryExecutor;
pub use filter::{compile_filter, FilterEvaluator, Operand, Predicate};
pub use include::{resolve_includes, RelationshipIncluder};
pub use paginate::{Page, PagePlan, Paginator, ResumePosition};
pub use planner::{QueryPlan, QueryPlanner};
pub use sort::{SortEngine, SortKey, SortRow, SortTerm};
pub use value::{is_blank, FieldValue, Malformed};
