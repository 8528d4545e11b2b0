//! Deterministic ordering of matched records.

use std::cmp::Ordering;

use apisim_proto::{Cursor, Record, RecordId};

use super::value::{FieldValue, Malformed};
use crate::catalog::{EntityDef, FieldDef, OrderDirection};
use crate::error::Error;

/// One term of a sort key.
#[derive(Debug, Clone)]
pub struct SortTerm {
    /// Field sorted on.
    pub field: FieldDef,
    /// Sort direction.
    pub direction: OrderDirection,
}

/// An entity's default ordering with the identifier tie-break.
///
/// Missing values sort before present ones regardless of direction, and
/// the identifier always breaks ties in ascending order, so the order is
/// total.
#[derive(Debug, Clone, Default)]
pub struct SortKey {
    terms: Vec<SortTerm>,
}

/// A matched record with its extracted sort values.
#[derive(Debug, Clone)]
pub struct SortRow<'a> {
    /// Record identifier (the collection key).
    pub id: &'a RecordId,
    /// The stored record.
    pub record: &'a Record,
    /// Values of each sort term.
    pub keys: Vec<Option<FieldValue>>,
}

impl SortKey {
    /// Build the sort key from the entity's default ordering.
    pub fn for_entity(entity: &EntityDef) -> Result<Self, Error> {
        let terms = entity
            .default_order
            .iter()
            .map(|order| {
                let field = entity.get_field(&order.field).ok_or_else(|| {
                    Error::Schema(format!(
                        "entity '{}' orders by unknown field '{}'",
                        entity.name, order.field
                    ))
                })?;
                Ok(SortTerm {
                    field: field.clone(),
                    direction: order.direction,
                })
            })
            .collect::<Result<_, Error>>()?;
        Ok(Self { terms })
    }

    /// The sort terms, excluding the identifier tie-break.
    pub fn terms(&self) -> &[SortTerm] {
        &self.terms
    }

    /// Number of sort terms, excluding the identifier tie-break.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check whether ordering is by identifier only.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Read the sort values from a record.
    pub fn extract(&self, record: &Record) -> Result<Vec<Option<FieldValue>>, Malformed> {
        self.terms
            .iter()
            .map(|term| FieldValue::from_record(record.get_path(term.field.path()), &term.field))
            .collect()
    }

    /// Compare two positions given as sort values plus identifier.
    pub fn compare_keys(
        &self,
        a_keys: &[Option<FieldValue>],
        a_id: &RecordId,
        b_keys: &[Option<FieldValue>],
        b_id: &RecordId,
    ) -> Ordering {
        for (i, term) in self.terms.iter().enumerate() {
            let ord = match (a_keys.get(i).and_then(Option::as_ref), b_keys.get(i).and_then(Option::as_ref)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => match term.direction {
                    OrderDirection::Asc => a.compare(b),
                    OrderDirection::Desc => b.compare(a),
                },
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a_id.cmp(b_id)
    }

    /// Compare two rows.
    pub fn compare(&self, a: &SortRow<'_>, b: &SortRow<'_>) -> Ordering {
        self.compare_keys(&a.keys, a.id, &b.keys, b.id)
    }

    /// Offset marker for a row.
    pub fn cursor(&self, row: &SortRow<'_>) -> Cursor {
        let values = row
            .keys
            .iter()
            .map(|v| v.as_ref().map(FieldValue::canonical).unwrap_or_default())
            .collect();
        Cursor::new(values, row.id.to_string())
    }
}

/// Sorts matched rows.
pub struct SortEngine;

impl SortEngine {
    /// Sort rows in place by the key.
    pub fn sort(key: &SortKey, rows: &mut [SortRow<'_>]) {
        rows.sort_by(|a, b| key.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OrderBy;
    use serde_json::json;

    fn trips() -> EntityDef {
        EntityDef::new("trips", "trip_id")
            .with_field(FieldDef::date("start_date"))
            .with_field(FieldDef::string("trip_name"))
            .order_by(OrderBy::asc("start_date"))
    }

    fn rows<'a>(key: &SortKey, data: &'a [(RecordId, Record)]) -> Vec<SortRow<'a>> {
        data.iter()
            .map(|(id, record)| SortRow {
                id,
                record,
                keys: key.extract(record).unwrap(),
            })
            .collect()
    }

    fn data(entries: &[(&str, serde_json::Value)]) -> Vec<(RecordId, Record)> {
        entries
            .iter()
            .map(|(id, v)| (RecordId::from(*id), Record::from_value(v.clone()).unwrap()))
            .collect()
    }

    #[test]
    fn test_sort_with_tie_break() {
        let key = SortKey::for_entity(&trips()).unwrap();
        let data = data(&[
            ("T3", json!({"start_date": "2024-08-01"})),
            ("T2", json!({"start_date": "2024-07-01"})),
            ("T1", json!({"start_date": "2024-08-01"})),
            ("T4", json!({})),
        ]);
        let mut rows = rows(&key, &data);
        SortEngine::sort(&key, &mut rows);

        let ids: Vec<String> = rows.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["T4", "T2", "T1", "T3"]);
    }

    #[test]
    fn test_descending_keeps_missing_first() {
        let entity = EntityDef::new("events", "id")
            .with_field(FieldDef::datetime("updated_at"))
            .order_by(OrderBy::desc("updated_at"));
        let key = SortKey::for_entity(&entity).unwrap();
        let data = data(&[
            ("a", json!({"updated_at": "2024-01-01T00:00:00Z"})),
            ("b", json!({"updated_at": "2024-06-01T00:00:00Z"})),
            ("c", json!({})),
        ]);
        let mut rows = rows(&key, &data);
        SortEngine::sort(&key, &mut rows);

        let ids: Vec<String> = rows.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_identifier_only_ordering() {
        let key = SortKey::for_entity(&EntityDef::new("contracts", "id")).unwrap();
        assert!(key.is_empty());
        let a = RecordId::Int(2);
        let b = RecordId::Int(10);
        assert_eq!(key.compare_keys(&[], &a, &[], &b), Ordering::Less);
    }

    #[test]
    fn test_cursor_text() {
        let key = SortKey::for_entity(&trips()).unwrap();
        let data = data(&[("T-102", json!({"start_date": "2024-07-15"})), ("T-9", json!({}))]);
        let rows = rows(&key, &data);
        assert_eq!(key.cursor(&rows[0]).encode(), "2024-07-15_T-102");
        assert_eq!(key.cursor(&rows[1]).encode(), "_T-9");
    }

    #[test]
    fn test_unknown_order_field() {
        let entity = EntityDef::new("trips", "trip_id").order_by(OrderBy::asc("start_date"));
        assert!(matches!(SortKey::for_entity(&entity), Err(Error::Schema(_))));
    }
}
