//! Record collections and the in-memory store.

use std::collections::hash_map;
use std::collections::HashMap;

use apisim_proto::{Record, RecordId};
use serde_json::Value;

use crate::catalog::Catalog;
use crate::error::{validation, Error};

/// Read access to entity collections.
pub trait RecordSource {
    /// Get the collection for an entity, if any records were loaded.
    fn collection(&self, entity: &str) -> Option<&Collection>;

    /// Look up a single record.
    fn get(&self, entity: &str, id: &RecordId) -> Option<&Record> {
        self.collection(entity).and_then(|c| c.get(id))
    }
}

/// Records of one entity keyed by identifier.
///
/// The key is authoritative: the engine never re-reads the identifier from
/// the record body.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: HashMap<RecordId, Record>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(&mut self, id: RecordId, record: Record) -> Option<Record> {
        self.records.insert(id, record)
    }

    /// Remove a record.
    pub fn remove(&mut self, id: &RecordId) -> Option<Record> {
        self.records.remove(id)
    }

    /// Get a record by identifier.
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    /// Iterate over all records, in no particular order.
    pub fn iter(&self) -> hash_map::Iter<'_, RecordId, Record> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<(RecordId, Record)> for Collection {
    fn from_iter<I: IntoIterator<Item = (RecordId, Record)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// In-memory store holding one [`Collection`] per entity.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: HashMap<String, Collection>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under an explicit identifier.
    pub fn insert(
        &mut self,
        entity: impl Into<String>,
        id: impl Into<RecordId>,
        record: Record,
    ) -> Option<Record> {
        self.collections
            .entry(entity.into())
            .or_default()
            .insert(id.into(), record)
    }

    /// Insert a record keyed by its identity field.
    pub fn insert_record(
        &mut self,
        catalog: &Catalog,
        entity: &str,
        record: Record,
    ) -> Result<RecordId, Error> {
        let def = catalog.entity(entity)?;
        let id = record
            .get_path(&def.identity_field)
            .and_then(RecordId::from_reference)
            .and_then(|id| def.id_type.coerce(&id))
            .ok_or_else(|| {
                validation(format!(
                    "{} record has no usable '{}' identifier",
                    entity, def.identity_field
                ))
            })?;
        self.insert(entity, id.clone(), record);
        Ok(id)
    }

    /// Remove a record.
    pub fn remove(&mut self, entity: &str, id: &RecordId) -> Option<Record> {
        self.collections.get_mut(entity)?.remove(id)
    }

    /// Drop all records of one entity.
    pub fn clear(&mut self, entity: &str) {
        self.collections.remove(entity);
    }

    /// Drop everything.
    pub fn clear_all(&mut self) {
        self.collections.clear();
    }

    /// Total number of records across collections.
    pub fn len(&self) -> usize {
        self.collections.values().map(Collection::len).sum()
    }

    /// Check whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load fixtures of the form `{"<entity>": {"<id>": {...record...}}}`.
    ///
    /// Object keys are parsed with the entity's identifier type.
    pub fn from_json(catalog: &Catalog, fixtures: Value) -> Result<Self, Error> {
        let mut store = Self::new();
        store.load_json(catalog, fixtures)?;
        Ok(store)
    }

    /// Merge fixtures into the store. See [`MemoryStore::from_json`].
    pub fn load_json(&mut self, catalog: &Catalog, fixtures: Value) -> Result<(), Error> {
        let Value::Object(entities) = fixtures else {
            return Err(validation("fixtures must be an object keyed by entity"));
        };

        for (entity, records) in entities {
            let def = catalog.entity(&entity)?;
            let Value::Object(records) = records else {
                return Err(validation(format!(
                    "fixtures for '{}' must be an object keyed by identifier",
                    entity
                )));
            };
            let collection = self.collections.entry(entity.clone()).or_default();
            for (key, value) in records {
                let id = def.id_type.parse(&key).ok_or_else(|| {
                    validation(format!("invalid {} identifier '{}'", entity, key))
                })?;
                collection.insert(id, Record::from_value(value)?);
            }
        }
        Ok(())
    }
}

impl RecordSource for MemoryStore {
    fn collection(&self, entity: &str) -> Option<&Collection> {
        self.collections.get(entity)
    }
}
