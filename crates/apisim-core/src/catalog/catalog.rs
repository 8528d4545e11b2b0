//! Catalog of entities and relations, validated once at construction.

use std::collections::{BTreeMap, HashSet};

use apisim_proto::FilterOp;
use chrono::NaiveDate;
use tracing::info;

use super::{EntityDef, RelationDef, ScalarType, SchemaBundle};
use crate::error::Error;
use crate::query::{compile_filter, FieldValue};

/// The read-only catalog the query engine consults.
///
/// Built from a [`SchemaBundle`]; construction rejects inconsistent
/// definitions so that queries never meet a broken schema.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: u64,
    entities: BTreeMap<String, EntityDef>,
    /// Relations keyed by source entity, in declaration order.
    relations: BTreeMap<String, Vec<RelationDef>>,
}

impl Catalog {
    /// Validate a bundle and build the catalog.
    pub fn new(bundle: SchemaBundle) -> Result<Self, Error> {
        for (key, entity) in &bundle.entities {
            if key != &entity.name {
                return Err(Error::Schema(format!(
                    "entity registered as '{}' is named '{}'",
                    key, entity.name
                )));
            }
            validate_entity(entity)?;
        }

        let mut relations: BTreeMap<String, Vec<RelationDef>> = BTreeMap::new();
        for relation in bundle.relations {
            validate_relation(&bundle.entities, &relation)?;
            let list = relations.entry(relation.from_entity.clone()).or_default();
            if list.iter().any(|r| r.name == relation.name) {
                return Err(Error::Schema(format!(
                    "duplicate relation '{}' on entity '{}'",
                    relation.name, relation.from_entity
                )));
            }
            list.push(relation);
        }

        info!(
            version = bundle.version,
            entities = bundle.entities.len(),
            relations = relations.values().map(Vec::len).sum::<usize>(),
            "catalog loaded"
        );

        Ok(Self {
            version: bundle.version,
            entities: bundle.entities,
            relations,
        })
    }

    /// Schema version of the bundle this catalog was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get an entity definition by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Get an entity definition, failing for unknown names.
    pub fn entity(&self, name: &str) -> Result<&EntityDef, Error> {
        self.entities
            .get(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// List all entity names, sorted.
    pub fn list_entities(&self) -> Vec<&str> {
        self.entities.keys().map(String::as_str).collect()
    }

    /// Get all relations where the given entity is the source.
    pub fn relations_from(&self, entity: &str) -> &[RelationDef] {
        self.relations.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get a relation by source entity and name.
    pub fn relation(&self, entity: &str, name: &str) -> Option<&RelationDef> {
        self.relations_from(entity).iter().find(|r| r.name == name)
    }

    /// Names of the relations an entity supports, sorted.
    pub fn relation_names(&self, entity: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .relations_from(entity)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

fn validate_entity(entity: &EntityDef) -> Result<(), Error> {
    let fail = |msg: String| Err(Error::Schema(format!("entity '{}': {}", entity.name, msg)));

    if entity.name.is_empty() {
        return Err(Error::Schema("entity name must not be empty".into()));
    }
    if entity.identity_field.is_empty() {
        return fail("identity field must not be empty".into());
    }

    let mut seen = HashSet::new();
    for field in &entity.fields {
        if field.name.is_empty() || field.path().is_empty() {
            return fail("field names and paths must not be empty".into());
        }
        if !seen.insert(field.name.as_str()) {
            return fail(format!("duplicate field '{}'", field.name));
        }
        for op in field.operators() {
            if !field.field_type.supports(op) {
                return fail(format!(
                    "field '{}' of type {} cannot use operator '{}'",
                    field.name,
                    field.field_type.name(),
                    op
                ));
            }
        }
        if field.normalize.is_some() && field.field_type != ScalarType::String {
            return fail(format!("only string fields can be normalized, '{}' is not", field.name));
        }
        if let Some(bad) = field.allowed.iter().find(|v| FieldValue::from_json(v, field).is_none()) {
            return fail(format!(
                "allowed value {} does not fit field '{}' of type {}",
                bad,
                field.name,
                field.field_type.name()
            ));
        }
        if field.minimum.is_some() && !matches!(field.field_type, ScalarType::Integer | ScalarType::Number) {
            return fail(format!("only numeric fields can have a minimum, '{}' is not", field.name));
        }
    }

    for order in &entity.default_order {
        if entity.get_field(&order.field).is_none() {
            return fail(format!("default order uses unknown field '{}'", order.field));
        }
    }

    if let Some(limits) = entity.page {
        if limits.default_size == 0 || limits.max_size == 0 {
            return fail("page sizes must be positive".into());
        }
        if limits.default_size > limits.max_size {
            return fail(format!(
                "default page size {} exceeds maximum {}",
                limits.default_size, limits.max_size
            ));
        }
    }

    compile_filter(entity, &entity.default_filters)
        .map_err(|e| Error::Schema(format!("entity '{}': default filters: {}", entity.name, e)))?;

    if let Some(window) = &entity.default_window {
        for (key, expected) in [(&window.lower_key, FilterOp::From), (&window.upper_key, FilterOp::To)] {
            match entity.resolve_key(key) {
                Some((field, op))
                    if op == expected
                        && matches!(field.field_type, ScalarType::Date | ScalarType::DateTime) => {}
                _ => {
                    return fail(format!(
                        "default window key '{}' must be a date '_{}' filter",
                        key, expected
                    ))
                }
            }
        }
        // The window must also compile as a filter.
        compile_filter(entity, &window.to_filter(NaiveDate::default()))
            .map_err(|e| Error::Schema(format!("entity '{}': default window: {}", entity.name, e)))?;
    }

    Ok(())
}

fn validate_relation(
    entities: &BTreeMap<String, EntityDef>,
    relation: &RelationDef,
) -> Result<(), Error> {
    if relation.name.is_empty() || relation.foreign_key.is_empty() {
        return Err(Error::Schema(format!(
            "relation on '{}' needs a name and a foreign key",
            relation.from_entity
        )));
    }
    for entity in [&relation.from_entity, &relation.to_entity] {
        if !entities.contains_key(entity) {
            return Err(Error::Schema(format!(
                "relation '{}' references unknown entity '{}'",
                relation.name, entity
            )));
        }
    }
    Ok(())
}
