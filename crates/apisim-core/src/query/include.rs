//! Relationship inclusion.
//!
//! Included relations are resolved against the store after the page has
//! been cut. Embedding writes a projected copy of the related record into
//! the owning record; sideloading gathers related records into a
//! deduplicated list. Unresolvable references are left as they are.

use std::collections::BTreeMap;

use apisim_proto::{IncludeSpec, Record, RecordId};
use serde_json::{json, Value};
use tracing::debug;

use crate::catalog::{Catalog, EmbedShape, EntityDef, RelationDef};
use crate::error::{validation, Error};
use crate::storage::RecordSource;

/// Validate requested relation names against an entity.
///
/// Returns the relation definitions in request order. Unknown names are
/// rejected with the sorted list of valid ones.
pub fn resolve_includes(
    catalog: &Catalog,
    entity: &EntityDef,
    include: Option<&IncludeSpec>,
) -> Result<Vec<RelationDef>, Error> {
    let Some(include) = include else {
        return Ok(Vec::new());
    };

    let unknown: Vec<&str> = include
        .names()
        .iter()
        .map(String::as_str)
        .filter(|name| catalog.relation(&entity.name, name).is_none())
        .collect();
    if !unknown.is_empty() {
        let valid = catalog.relation_names(&entity.name);
        return Err(validation(format!(
            "unsupported include '{}' for {}; supported: {}",
            unknown.join(", "),
            entity.name,
            if valid.is_empty() {
                "(none)".to_string()
            } else {
                valid.join(", ")
            }
        )));
    }

    Ok(include
        .names()
        .iter()
        .filter_map(|name| catalog.relation(&entity.name, name).cloned())
        .collect())
}

/// Resolves relations for records of one entity.
pub struct RelationshipIncluder<'a, S: RecordSource + ?Sized> {
    store: &'a S,
    catalog: &'a Catalog,
    relations: &'a [RelationDef],
}

impl<'a, S: RecordSource + ?Sized> RelationshipIncluder<'a, S> {
    /// Create an includer for the given relations.
    pub fn new(store: &'a S, catalog: &'a Catalog, relations: &'a [RelationDef]) -> Self {
        Self {
            store,
            catalog,
            relations,
        }
    }

    /// Check whether there is anything to include.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Embed each relation into the record.
    ///
    /// A to-one reference that resolves is replaced by the projected target
    /// at the embed path. A to-many list is rebuilt element-wise, keeping
    /// elements that do not resolve. Resource-shaped relations wrap the
    /// result in a `data` document; otherwise absent references write
    /// nothing.
    pub fn embed(&self, record: &mut Record) {
        for relation in self.relations {
            let reference = record.get_path(&relation.foreign_key).cloned();
            let embedded = match relation.shape {
                EmbedShape::Bare => self.embed_bare(relation, reference),
                EmbedShape::Resource => self.embed_resource(relation, reference),
            };
            if let Some(value) = embedded {
                record.set_path(relation.embed_path(), value);
            }
        }
    }

    /// Collect related records into `out`, keyed by entity and identifier.
    ///
    /// Each entry is `{"type": <entity>, "id": <id>, "attributes": <record>}`.
    pub fn sideload(&self, record: &Record, out: &mut BTreeMap<(String, RecordId), Record>) {
        for relation in self.relations {
            let references: Vec<&Value> = match record.get_path(&relation.foreign_key) {
                Some(Value::Array(items)) if relation.is_many() => items.iter().collect(),
                Some(value) if !relation.is_many() => vec![value],
                _ => continue,
            };

            for reference in references {
                let Some((id, target)) = self.resolve(relation, reference) else {
                    continue;
                };
                let key = (relation.to_entity.clone(), id);
                if out.contains_key(&key) {
                    continue;
                }
                if let Ok(entry) = Record::from_value(resource(relation, &key.1, target)) {
                    out.insert(key, entry);
                }
            }
        }
    }

    fn embed_bare(&self, relation: &RelationDef, reference: Option<Value>) -> Option<Value> {
        let reference = reference?;
        if !relation.is_many() {
            return self.resolve(relation, &reference).map(|(_, target)| target.into_value());
        }

        let Value::Array(items) = reference else {
            debug!(relation = %relation.name, "to-many reference is not a list");
            return None;
        };
        let resolved = items
            .into_iter()
            .map(|item| match self.resolve(relation, &item) {
                Some((_, target)) => target.into_value(),
                None => item,
            })
            .collect();
        Some(Value::Array(resolved))
    }

    fn embed_resource(&self, relation: &RelationDef, reference: Option<Value>) -> Option<Value> {
        if !relation.is_many() {
            let (id, target) = self.resolve(relation, &reference?)?;
            return Some(json!({ "data": resource(relation, &id, target) }));
        }

        let items = match reference {
            Some(Value::Array(items)) => items,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                debug!(relation = %relation.name, "to-many reference is not a list");
                return None;
            }
        };
        let data: Vec<Value> = items
            .into_iter()
            .map(|item| match self.resolve(relation, &item) {
                Some((id, target)) => resource(relation, &id, target),
                None => item,
            })
            .collect();
        Some(json!({ "data": data }))
    }

    /// Look up and project the target of one reference.
    fn resolve(&self, relation: &RelationDef, reference: &Value) -> Option<(RecordId, Record)> {
        let raw = RecordId::from_reference(reference)?;
        let id = match self.catalog.get_entity(&relation.to_entity) {
            Some(target) => target.id_type.coerce(&raw)?,
            None => raw,
        };
        match self.store.get(&relation.to_entity, &id) {
            Some(target) => Some((id, target.project(&relation.fields))),
            None => {
                debug!(
                    relation = %relation.name,
                    target = %relation.to_entity,
                    id = %id,
                    "related record not found"
                );
                None
            }
        }
    }
}

/// A resolved target as a `{type, id, attributes}` resource.
fn resource(relation: &RelationDef, id: &RecordId, target: Record) -> Value {
    json!({
        "type": relation.to_entity,
        "id": id.to_value(),
        "attributes": target.into_value(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{IdType, SchemaBundle};
    use crate::storage::MemoryStore;

    fn catalog() -> Catalog {
        Catalog::new(
            SchemaBundle::new(1)
                .with_entity(EntityDef::new("contracts", "id").with_id_type(IdType::Integer))
                .with_entity(EntityDef::new("contract_types", "id").with_id_type(IdType::Integer))
                .with_entity(EntityDef::new("attachments", "id").with_id_type(IdType::Integer))
                .with_relation(
                    RelationDef::one("contract_type", "contracts", "contract_type_id", "contract_types")
                        .with_fields(["id", "name"])
                        .embed_at("relationships.contract_type"),
                )
                .with_relation(RelationDef::many(
                    "attachments",
                    "contracts",
                    "attachment_ids",
                    "attachments",
                )),
        )
        .unwrap()
    }

    fn store(catalog: &Catalog) -> MemoryStore {
        MemoryStore::from_json(
            catalog,
            json!({
                "contract_types": {"3": {"id": 3, "name": "Lease", "internal": true}},
                "attachments": {"1": {"id": 1, "file": "a.pdf"}, "2": {"id": 2, "file": "b.pdf"}}
            }),
        )
        .unwrap()
    }

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn test_resolve_includes_validation() {
        let catalog = catalog();
        let contracts = catalog.entity("contracts").unwrap();

        let rels = resolve_includes(&catalog, contracts, Some(&IncludeSpec::parse("attachments,contract_type").unwrap())).unwrap();
        assert_eq!(rels[0].name, "attachments");
        assert_eq!(rels[1].name, "contract_type");

        let err = resolve_includes(&catalog, contracts, Some(&IncludeSpec::parse("owner").unwrap())).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("owner"));
        assert!(msg.contains("attachments, contract_type"));

        let types = catalog.entity("contract_types").unwrap();
        let err = resolve_includes(&catalog, types, Some(&IncludeSpec::parse("x").unwrap())).unwrap_err();
        assert!(err.to_string().contains("(none)"));

        assert!(resolve_includes(&catalog, contracts, None).unwrap().is_empty());
    }

    #[test]
    fn test_embed_one_with_projection() {
        let catalog = catalog();
        let store = store(&catalog);
        let relations = vec![catalog.relation("contracts", "contract_type").cloned().unwrap()];
        let includer = RelationshipIncluder::new(&store, &catalog, &relations);

        let mut rec = record(json!({"id": 1, "contract_type_id": {"type": "contract_types", "id": "3"}}));
        includer.embed(&mut rec);
        assert_eq!(
            rec.get_path("relationships.contract_type"),
            Some(&json!({"id": 3, "name": "Lease"}))
        );

        let mut dangling = record(json!({"id": 2, "contract_type_id": 99}));
        includer.embed(&mut dangling);
        assert!(dangling.get_path("relationships.contract_type").is_none());
        assert_eq!(dangling.get("contract_type_id"), Some(&json!(99)));
    }

    #[test]
    fn test_embed_many_keeps_unresolved() {
        let catalog = catalog();
        let store = store(&catalog);
        let relations = vec![catalog.relation("contracts", "attachments").cloned().unwrap()];
        let includer = RelationshipIncluder::new(&store, &catalog, &relations);

        let mut rec = record(json!({"id": 1, "attachment_ids": [2, 7]}));
        includer.embed(&mut rec);
        assert_eq!(
            rec.get("attachments"),
            Some(&json!([{"id": 2, "file": "b.pdf"}, 7]))
        );

        let mut none = record(json!({"id": 3}));
        includer.embed(&mut none);
        assert!(none.get("attachments").is_none());
    }

    #[test]
    fn test_embed_resource_documents() {
        let catalog = catalog();
        let store = store(&catalog);
        let relations = vec![
            RelationDef::one("contract_type", "contracts", "contract_type_id", "contract_types")
                .as_resource()
                .embed_at("relationships.contract_type"),
            RelationDef::many("attachments", "contracts", "attachment_ids", "attachments")
                .as_resource()
                .embed_at("relationships.attachments"),
        ];
        let includer = RelationshipIncluder::new(&store, &catalog, &relations);

        let mut rec = record(json!({"id": 1, "contract_type_id": 3, "attachment_ids": [1, 9]}));
        includer.embed(&mut rec);
        assert_eq!(
            rec.get_path("relationships.contract_type"),
            Some(&json!({"data": {
                "type": "contract_types",
                "id": 3,
                "attributes": {"id": 3, "name": "Lease", "internal": true}
            }}))
        );
        assert_eq!(
            rec.get_path("relationships.attachments.data"),
            Some(&json!([
                {"type": "attachments", "id": 1, "attributes": {"id": 1, "file": "a.pdf"}},
                9
            ]))
        );

        // No references: to-many still gets an empty document, to-one nothing
        let mut bare = record(json!({"id": 2}));
        includer.embed(&mut bare);
        assert_eq!(bare.get_path("relationships.attachments"), Some(&json!({"data": []})));
        assert!(bare.get_path("relationships.contract_type").is_none());
    }

    #[test]
    fn test_sideload_dedupes() {
        let catalog = catalog();
        let store = store(&catalog);
        let relations: Vec<RelationDef> = catalog.relations_from("contracts").to_vec();
        let includer = RelationshipIncluder::new(&store, &catalog, &relations);

        let mut out = BTreeMap::new();
        includer.sideload(&record(json!({"contract_type_id": 3, "attachment_ids": [2, 1]})), &mut out);
        includer.sideload(&record(json!({"contract_type_id": 3, "attachment_ids": [1]})), &mut out);

        let keys: Vec<(String, RecordId)> = out.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                ("attachments".to_string(), RecordId::Int(1)),
                ("attachments".to_string(), RecordId::Int(2)),
                ("contract_types".to_string(), RecordId::Int(3)),
            ]
        );
        let entry = &out[&("contract_types".to_string(), RecordId::Int(3))];
        assert_eq!(entry.get("type"), Some(&json!("contract_types")));
        assert_eq!(entry.get_path("attributes.name"), Some(&json!("Lease")));
    }
}
