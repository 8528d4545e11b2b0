//! Query executor: runs planned queries against a record source.

use std::collections::BTreeMap;

use apisim_proto::{IncludeSpec, ListQuery, QueryResult, Record, RecordId};
use tracing::debug;

use super::filter::FilterEvaluator;
use super::include::{resolve_includes, RelationshipIncluder};
use super::paginate::Paginator;
use super::planner::{QueryPlan, QueryPlanner};
use super::sort::{SortEngine, SortRow};
use crate::catalog::{Catalog, IncludeMode};
use crate::config::EngineConfig;
use crate::error::Error;
use crate::storage::RecordSource;

/// Query executor that runs list queries and single-record lookups.
///
/// Stored records are never modified; results carry copies.
pub struct QueryExecutor<'a, S: RecordSource + ?Sized> {
    store: &'a S,
    catalog: &'a Catalog,
    config: EngineConfig,
}

impl<'a, S: RecordSource + ?Sized> QueryExecutor<'a, S> {
    /// Create a new query executor with the default configuration.
    pub fn new(store: &'a S, catalog: &'a Catalog) -> Self {
        Self {
            store,
            catalog,
            config: EngineConfig::default(),
        }
    }

    /// Use a specific engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The engine configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute a list query.
    pub fn execute(&self, query: &ListQuery) -> Result<QueryResult, Error> {
        let plan = QueryPlanner::new(self.catalog, &self.config).plan(query)?;
        Ok(self.execute_plan(&plan))
    }

    /// Execute a pre-planned query.
    ///
    /// Records missing a required field, or whose filter or sort fields have
    /// the wrong type, are skipped.
    pub fn execute_plan(&self, plan: &QueryPlan) -> QueryResult {
        let entity = &plan.entity;
        let mut rows = Vec::new();
        let mut scanned = 0usize;
        let mut skipped = 0usize;

        if let Some(collection) = self.store.collection(&entity.name) {
            for (id, record) in collection.iter() {
                scanned += 1;
                let keys = FilterEvaluator::check_required(entity, record)
                    .and_then(|()| FilterEvaluator::evaluate(&plan.predicates, record))
                    .and_then(|matched| {
                        if matched {
                            plan.sort_key.extract(record).map(Some)
                        } else {
                            Ok(None)
                        }
                    });
                match keys {
                    Ok(Some(keys)) => rows.push(SortRow { id, record, keys }),
                    Ok(None) => {}
                    Err(malformed) => {
                        skipped += 1;
                        debug!(entity = %entity.name, id = %id, reason = %malformed, "skipping malformed record");
                    }
                }
            }
        }

        let matched = rows.len();
        SortEngine::sort(&plan.sort_key, &mut rows);
        let page = Paginator::paginate(rows, &plan.page, &plan.sort_key);

        let includer = RelationshipIncluder::new(self.store, self.catalog, &plan.includes);
        let mut included = BTreeMap::new();
        let items: Vec<Record> = page
            .rows
            .iter()
            .map(|row| {
                let mut item = row.record.clone();
                if !includer.is_empty() {
                    match plan.include_mode {
                        IncludeMode::Embed => includer.embed(&mut item),
                        IncludeMode::Sideload => includer.sideload(&item, &mut included),
                    }
                }
                item
            })
            .collect();

        debug!(
            entity = %entity.name,
            scanned,
            skipped,
            matched,
            returned = items.len(),
            "executed query"
        );

        let mut result = QueryResult::new(items).with_included(included.into_values().collect());
        if let Some(metadata) = page.metadata {
            result = result.with_metadata(metadata);
        }
        result
    }

    /// Fetch one record by identifier, embedding the requested relations.
    ///
    /// Single-record lookups always embed, whatever the entity's include mode.
    pub fn get(
        &self,
        entity: &str,
        id: impl Into<RecordId>,
        include: Option<&IncludeSpec>,
    ) -> Result<Record, Error> {
        let def = self.catalog.entity(entity)?;
        let relations = resolve_includes(self.catalog, def, include)?;
        let requested = id.into();

        let record = def
            .id_type
            .coerce(&requested)
            .and_then(|id| self.store.get(entity, &id))
            .ok_or_else(|| Error::NotFound {
                entity: entity.to_string(),
                id: requested.clone(),
            })?;

        let mut item = record.clone();
        RelationshipIncluder::new(self.store, self.catalog, &relations).embed(&mut item);
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, FieldDef, IdType, OrderBy, RelationDef, SchemaBundle};
    use crate::storage::MemoryStore;
    use apisim_proto::PageSpec;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::new(
            SchemaBundle::new(1)
                .with_entity(
                    EntityDef::new("events", "id")
                        .with_id_type(IdType::Integer)
                        .with_field(FieldDef::string("title").at("attributes.title"))
                        .with_field(FieldDef::datetime("updated_at").at("attributes.updated_at").required())
                        .order_by(OrderBy::desc("updated_at")),
                )
                .with_entity(EntityDef::new("spend_categories", "id").with_id_type(IdType::Integer))
                .with_relation(
                    RelationDef::one("spend_category", "events", "spend_category_id", "spend_categories")
                        .with_fields(["name"]),
                ),
        )
        .unwrap()
    }

    fn store(catalog: &Catalog) -> MemoryStore {
        MemoryStore::from_json(
            catalog,
            json!({
                "events": {
                    "1": {"id": 1, "spend_category_id": 5, "attributes": {"title": "RFP fleet", "updated_at": "2024-05-01T09:00:00Z"}},
                    "2": {"id": 2, "spend_category_id": 5, "attributes": {"title": "RFI office", "updated_at": "2024-06-01T09:00:00Z"}},
                    "3": {"id": 3, "attributes": {"title": "no timestamp"}},
                    "4": {"id": 4, "attributes": {"title": "bad timestamp", "updated_at": "yesterday"}}
                },
                "spend_categories": {"5": {"id": 5, "name": "Fleet", "code": "FLT"}}
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_execute_skips_malformed_and_sorts() {
        let catalog = catalog();
        let store = store(&catalog);
        let executor = QueryExecutor::new(&store, &catalog);

        let result = executor.execute(&ListQuery::new("events")).unwrap();
        let ids: Vec<_> = result.items.iter().map(|r| r.get("id").cloned()).collect();
        assert_eq!(ids, vec![Some(json!(2)), Some(json!(1))]);
        assert!(result.metadata.is_none());
        assert!(result.included.is_empty());
    }

    #[test]
    fn test_execute_does_not_mutate_store() {
        let catalog = catalog();
        let store = store(&catalog);
        let executor = QueryExecutor::new(&store, &catalog);

        let result = executor
            .execute(&ListQuery::new("events").with_include(IncludeSpec::parse("spend_category").unwrap()))
            .unwrap();
        assert_eq!(result.items[0].get("spend_category"), Some(&json!({"name": "Fleet"})));

        let stored = store.get("events", &RecordId::Int(2)).unwrap();
        assert!(stored.get("spend_category").is_none());
    }

    #[test]
    fn test_empty_collection() {
        let catalog = catalog();
        let store = MemoryStore::new();
        let executor = QueryExecutor::new(&store, &catalog);

        let result = executor
            .execute(&ListQuery::new("events").with_page(PageSpec::sized(5)).with_metadata())
            .unwrap();
        assert!(result.is_empty());
        let meta = result.metadata.unwrap();
        assert_eq!(meta.total_count, 0);
        assert!(meta.offset_marker.is_none());
    }

    #[test]
    fn test_get() {
        let catalog = catalog();
        let store = store(&catalog);
        let executor = QueryExecutor::new(&store, &catalog);

        let include = IncludeSpec::parse("spend_category").unwrap();
        let record = executor.get("events", "1", Some(&include)).unwrap();
        assert_eq!(record.get_path("spend_category.name"), Some(&json!("Fleet")));

        let err = executor.get("events", 99i64, None).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(!err.is_validation());

        assert!(executor.get("events", "abc", None).is_err());
        assert!(executor.get("widgets", 1i64, None).unwrap_err().is_validation());
    }
}
