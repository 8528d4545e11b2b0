//! Query planner: validates a [`ListQuery`] and resolves it into a
//! [`QueryPlan`] before any record is read.

use std::collections::HashSet;

use apisim_proto::{FilterSpec, ListQuery};
use tracing::trace;

use super::filter::{compile_filter, Predicate};
use super::include::resolve_includes;
use super::paginate::{PagePlan, Paginator};
use super::sort::SortKey;
use crate::catalog::{Catalog, EntityDef, IncludeMode, RelationDef};
use crate::config::EngineConfig;
use crate::error::Error;

/// An execution plan for a list query.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// Resolved entity definition.
    pub entity: EntityDef,
    /// Compiled caller filter followed by the applicable defaults.
    pub predicates: Vec<Predicate>,
    /// Ordering.
    pub sort_key: SortKey,
    /// Paging instructions.
    pub page: PagePlan,
    /// Relations to include.
    pub includes: Vec<RelationDef>,
    /// How includes are returned.
    pub include_mode: IncludeMode,
}

/// Query planner that validates queries against the catalog.
pub struct QueryPlanner<'a> {
    catalog: &'a Catalog,
    config: &'a EngineConfig,
}

impl<'a> QueryPlanner<'a> {
    /// Create a new query planner.
    pub fn new(catalog: &'a Catalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Plan a list query.
    ///
    /// Rejects unknown entities, unknown or mistyped filter keys, inverted
    /// ranges, bad page sizes, undecodable offset markers and unknown
    /// includes.
    pub fn plan(&self, query: &ListQuery) -> Result<QueryPlan, Error> {
        let entity = self.catalog.entity(&query.entity)?;

        let mut predicates = compile_filter(entity, &query.filter)?;
        predicates.extend(compile_filter(entity, &self.default_filter(entity, &query.filter))?);
        let sort_key = SortKey::for_entity(entity)?;
        let includes = resolve_includes(self.catalog, entity, query.include.as_ref())?;
        let page = Paginator::plan(
            entity.page_limits(self.config.default_page),
            query.page.as_ref(),
            query.include_metadata,
            &sort_key,
            entity.id_type,
        )?;

        trace!(
            entity = %entity.name,
            predicates = predicates.len(),
            includes = includes.len(),
            limit = ?page.limit,
            "planned query"
        );

        Ok(QueryPlan {
            entity: entity.clone(),
            predicates,
            sort_key,
            page,
            includes,
            include_mode: entity.include_mode,
        })
    }

    /// The entity's defaults that still apply next to the caller's filter.
    ///
    /// A default filter is dropped when the caller mentions the same field
    /// with any operator, including a null value. A window bound is dropped
    /// only when the caller sets that same key, so the other bound stays.
    fn default_filter(&self, entity: &EntityDef, filter: &FilterSpec) -> FilterSpec {
        let mentioned: HashSet<&str> = filter
            .iter()
            .filter_map(|(key, _)| entity.resolve_key(key))
            .map(|(field, _)| field.name.as_str())
            .collect();

        let mut defaults = FilterSpec::new();
        for (key, value) in entity.default_filters.iter() {
            let field = entity.resolve_key(key).map(|(field, _)| field.name.as_str());
            if field.is_some_and(|name| mentioned.contains(name)) {
                continue;
            }
            defaults.insert(key, value.clone());
        }

        if let Some(window) = &entity.default_window {
            for (key, value) in window.to_filter(self.config.today()).iter() {
                if filter.get(key).is_none() {
                    defaults.insert(key, value.clone());
                }
            }
        }
        defaults
    }
}
