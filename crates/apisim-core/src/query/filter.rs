//! Filter compilation and evaluation.
//!
//! A [`FilterSpec`] is compiled against an entity into typed [`Predicate`]s
//! before any record is read. Evaluation is a conjunction: a record matches
//! when every predicate holds.

use std::collections::BTreeMap;

use apisim_proto::record::json_kind;
use apisim_proto::{FilterOp, FilterSpec, Record};
use serde_json::Value;

use super::value::{is_blank, FieldValue, Malformed};
use crate::catalog::{EntityDef, FieldDef, Minimum};
use crate::error::{validation, Error};

/// Compiled comparison operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single typed value.
    Value(FieldValue),
    /// Any of several typed values (list operand to equals/not_equals).
    AnyOf(Vec<FieldValue>),
    /// Substring for contains/not_contains, already normalized.
    Text(String),
    /// Flag for empty/not_empty; `false` inverts the test.
    Flag(bool),
}

/// One compiled filter condition.
#[derive(Debug, Clone)]
pub struct Predicate {
    /// The filter key the condition came from.
    pub key: String,
    /// The field being tested.
    pub field: FieldDef,
    /// Comparison operator.
    pub op: FilterOp,
    /// Comparison operand.
    pub operand: Operand,
}

impl Predicate {
    /// Test a record.
    ///
    /// Records missing the field match only the negative operators
    /// (`not_equals`, `not_contains`) and `empty`. A value of the wrong
    /// type is reported as [`Malformed`].
    pub fn matches(&self, record: &Record) -> Result<bool, Malformed> {
        let raw = record.get_path(self.field.path());

        if let Operand::Flag(flag) = self.operand {
            let blank = is_blank(raw);
            return Ok(match self.op {
                FilterOp::NotEmpty => !blank == flag,
                _ => blank == flag,
            });
        }

        let value = FieldValue::from_record(raw, &self.field)?;
        let Some(value) = value else {
            return Ok(matches!(self.op, FilterOp::NotEquals | FilterOp::NotContains));
        };

        Ok(match (&self.operand, self.op) {
            (Operand::Value(expected), FilterOp::Equals) => value == *expected,
            (Operand::Value(expected), FilterOp::NotEquals) => value != *expected,
            (Operand::AnyOf(options), FilterOp::Equals) => options.contains(&value),
            (Operand::AnyOf(options), FilterOp::NotEquals) => !options.contains(&value),
            (Operand::Text(needle), FilterOp::Contains) => value.contains(needle),
            (Operand::Text(needle), FilterOp::NotContains) => !value.contains(needle),
            (Operand::Value(bound), FilterOp::From) => value.compare(bound).is_ge(),
            (Operand::Value(bound), FilterOp::To) => value.compare(bound).is_le(),
            _ => false,
        })
    }
}

/// Evaluates compiled predicates against records.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Check that every predicate holds.
    pub fn evaluate(predicates: &[Predicate], record: &Record) -> Result<bool, Malformed> {
        for predicate in predicates {
            if !predicate.matches(record)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Check that the record carries a parsable value for each required field.
    pub fn check_required(entity: &EntityDef, record: &Record) -> Result<(), Malformed> {
        for field in entity.required_fields() {
            if FieldValue::from_record(record.get_path(field.path()), field)?.is_none() {
                return Err(Malformed {
                    field: field.name.clone(),
                    reason: "required value is missing".into(),
                });
            }
        }
        Ok(())
    }
}

/// Compile a filter against an entity.
///
/// Every key must name a declared field and an operator the field allows;
/// all unknown keys are reported together. Null values are accepted and
/// ignored once their key is known.
pub fn compile_filter(entity: &EntityDef, filter: &FilterSpec) -> Result<Vec<Predicate>, Error> {
    let mut unknown = Vec::new();
    let mut predicates = Vec::new();

    for (key, value) in filter.iter() {
        let Some((field, op)) = entity.resolve_key(key) else {
            unknown.push(key.to_string());
            continue;
        };
        if value.is_null() {
            continue;
        }
        predicates.push(Predicate {
            key: key.to_string(),
            field: field.clone(),
            op,
            operand: compile_operand(key, field, op, value)?,
        });
    }

    if !unknown.is_empty() {
        return Err(validation(format!(
            "unsupported filter key(s) for {}: {}",
            entity.name,
            unknown.join(", ")
        )));
    }

    check_ranges(&predicates)?;
    Ok(predicates)
}

fn compile_operand(key: &str, field: &FieldDef, op: FilterOp, value: &Value) -> Result<Operand, Error> {
    let expected = |what: &str| {
        validation(format!(
            "filter '{}' expects {}, got {}",
            key,
            what,
            json_kind(value)
        ))
    };
    let typed = |v: &Value| {
        let parsed = FieldValue::from_json(v, field).ok_or_else(|| {
            validation(format!(
                "filter '{}' expects a value of type {}, got {}",
                key,
                field.field_type.name(),
                v
            ))
        })?;
        check_domain(key, field, &parsed)?;
        Ok::<_, Error>(parsed)
    };

    match op {
        FilterOp::Equals | FilterOp::NotEquals => match value {
            Value::Array(items) => Ok(Operand::AnyOf(
                items.iter().map(typed).collect::<Result<_, _>>()?,
            )),
            other => Ok(Operand::Value(typed(other)?)),
        },
        FilterOp::Contains | FilterOp::NotContains => match value {
            Value::String(s) => Ok(Operand::Text(field.normalize_text(s))),
            _ => Err(expected("a string")),
        },
        FilterOp::From | FilterOp::To => Ok(Operand::Value(typed(value)?)),
        FilterOp::Empty | FilterOp::NotEmpty => match value {
            Value::Bool(flag) => Ok(Operand::Flag(*flag)),
            _ => Err(expected("a boolean")),
        },
    }
}

/// Reject values outside the field's allowed set or below its minimum.
fn check_domain(key: &str, field: &FieldDef, value: &FieldValue) -> Result<(), Error> {
    if !field.allowed.is_empty() {
        let admitted = field
            .allowed
            .iter()
            .filter_map(|v| FieldValue::from_json(v, field))
            .any(|allowed| allowed == *value);
        if !admitted {
            let names: Vec<String> = field.allowed.iter().map(Value::to_string).collect();
            return Err(validation(format!(
                "filter '{}' got {}; allowed values: {}",
                key,
                value.canonical(),
                names.join(", ")
            )));
        }
    }

    if let Some(minimum) = field.minimum {
        let number = match value {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Num(n) => Some(*n),
            _ => None,
        };
        if let Some(number) = number.filter(|n| !minimum.admits(*n)) {
            let relation = match minimum {
                Minimum::AtLeast(_) => "at least",
                Minimum::Above(_) => "greater than",
            };
            return Err(validation(format!(
                "filter '{}' must be {} {}, got {}",
                key,
                relation,
                minimum.bound(),
                number
            )));
        }
    }
    Ok(())
}

/// Reject a lower bound that lies after the upper bound on the same field.
fn check_ranges(predicates: &[Predicate]) -> Result<(), Error> {
    let mut bounds: BTreeMap<&str, (Option<&Predicate>, Option<&Predicate>)> = BTreeMap::new();
    for p in predicates {
        let entry = bounds.entry(p.field.name.as_str()).or_default();
        match p.op {
            FilterOp::From => entry.0 = Some(p),
            FilterOp::To => entry.1 = Some(p),
            _ => {}
        }
    }

    for (lower, upper) in bounds.values() {
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if let (Operand::Value(from), Operand::Value(to)) = (&lower.operand, &upper.operand) {
                if from.compare(to).is_gt() {
                    return Err(validation(format!(
                        "filter '{}' ({}) is after '{}' ({})",
                        lower.key,
                        from.canonical(),
                        upper.key,
                        to.canonical()
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Normalize, ScalarType};
    use serde_json::json;

    fn contracts() -> EntityDef {
        EntityDef::new("contracts", "id")
            .with_field(
                FieldDef::string("title")
                    .at("attributes.title")
                    .only(&[FilterOp::Contains, FilterOp::NotContains]),
            )
            .with_field(FieldDef::string("state").at("attributes.state"))
            .with_field(FieldDef::integer("number").at("attributes.number"))
            .with_field(FieldDef::date("actual_start_date").at("attributes.actual_start_date"))
            .with_field(FieldDef::string("external_id").at("attributes.external_id"))
            .with_field(
                FieldDef::string("currency")
                    .at("attributes.currency")
                    .normalized(Normalize::Upper),
            )
            .with_field(FieldDef::new("needs_attention", ScalarType::Boolean).at("attributes.needs_attention"))
    }

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn matches(filter: Value, rec: &Record) -> bool {
        let predicates = compile_filter(&contracts(), &FilterSpec::from_value(filter).unwrap()).unwrap();
        FilterEvaluator::evaluate(&predicates, rec).unwrap()
    }

    fn sample() -> Record {
        record(json!({
            "id": 1,
            "attributes": {
                "title": "Fleet lease renewal",
                "state": "active",
                "number": 42,
                "actual_start_date": "2024-03-01",
                "external_id": "  ",
                "currency": "usd",
                "needs_attention": false
            }
        }))
    }

    #[test]
    fn test_equals_and_lists() {
        let rec = sample();
        assert!(matches(json!({"state_equals": "active"}), &rec));
        assert!(!matches(json!({"state_equals": "draft"}), &rec));
        assert!(matches(json!({"state_equals": ["draft", "active"]}), &rec));
        assert!(!matches(json!({"state_not_equals": ["draft", "active"]}), &rec));
        assert!(matches(json!({"needs_attention_equals": false}), &rec));
        assert!(matches(json!({"currency_equals": "USD"}), &rec));
        assert!(matches(json!({"currency_equals": "Usd"}), &rec));
    }

    #[test]
    fn test_contains() {
        let rec = sample();
        assert!(matches(json!({"title_contains": "lease"}), &rec));
        assert!(!matches(json!({"title_contains": "Lease"}), &rec));
        assert!(matches(json!({"title_not_contains": "office"}), &rec));
    }

    #[test]
    fn test_ranges_are_inclusive() {
        let rec = sample();
        assert!(matches(json!({"number_from": 42, "number_to": 42}), &rec));
        assert!(!matches(json!({"number_from": 43}), &rec));
        assert!(matches(json!({"actual_start_date_from": "2024-03-01"}), &rec));
        assert!(!matches(json!({"actual_start_date_to": "2024-02-29"}), &rec));
    }

    #[test]
    fn test_empty_flags() {
        let rec = sample();
        assert!(matches(json!({"external_id_empty": true}), &rec));
        assert!(!matches(json!({"external_id_empty": false}), &rec));
        assert!(!matches(json!({"external_id_not_empty": true}), &rec));
        assert!(matches(json!({"external_id_not_empty": false}), &rec));
    }

    #[test]
    fn test_missing_field() {
        let rec = record(json!({"id": 2, "attributes": {}}));
        assert!(!matches(json!({"state_equals": "active"}), &rec));
        assert!(matches(json!({"state_not_equals": "active"}), &rec));
        assert!(!matches(json!({"title_contains": "x"}), &rec));
        assert!(matches(json!({"title_not_contains": "x"}), &rec));
        assert!(!matches(json!({"number_from": 1}), &rec));
        assert!(matches(json!({"state_empty": true}), &rec));
    }

    #[test]
    fn test_malformed_record_value() {
        let rec = record(json!({"attributes": {"number": "forty-two"}}));
        let predicates =
            compile_filter(&contracts(), &FilterSpec::new().with("number_from", 1)).unwrap();
        let err = FilterEvaluator::evaluate(&predicates, &rec).unwrap_err();
        assert_eq!(err.field, "number");
    }

    #[test]
    fn test_unknown_keys_reported() {
        let filter = FilterSpec::new()
            .with("bogus_field_equals", 1)
            .with("title_equals", "x")
            .with("state_equals", "active");
        let err = compile_filter(&contracts(), &filter).unwrap_err();
        let msg = err.to_string();
        assert!(err.is_validation());
        assert!(msg.contains("bogus_field_equals"));
        assert!(msg.contains("title_equals"));
        assert!(!msg.contains("state_equals"));
    }

    #[test]
    fn test_wrong_operand_type() {
        let err = compile_filter(&contracts(), &FilterSpec::new().with("number_from", "abc")).unwrap_err();
        assert!(err.to_string().contains("number_from"));
        assert!(err.to_string().contains("integer"));

        let err = compile_filter(&contracts(), &FilterSpec::new().with("external_id_empty", "yes")).unwrap_err();
        assert!(err.to_string().contains("boolean"));

        assert!(compile_filter(
            &contracts(),
            &FilterSpec::new().with("actual_start_date_from", "not a date")
        )
        .is_err());
    }

    #[test]
    fn test_value_domain_enforced() {
        let entity = EntityDef::new("trips", "trip_id")
            .with_field(
                FieldDef::string("booking_type")
                    .normalized(Normalize::Upper)
                    .one_of(["Air", "Car", "Rail"]),
            )
            .with_field(FieldDef::integer("contract_type_id").above(0.0))
            .with_field(FieldDef::integer("renew_number_of_times").at_least(0.0));
        let compile = |filter: Value| compile_filter(&entity, &FilterSpec::from_value(filter).unwrap());

        assert!(compile(json!({"booking_type_equals": "Rail"})).is_ok());
        assert!(compile(json!({"booking_type_equals": "rail"})).is_ok());
        let err = compile(json!({"booking_type_equals": "Bus"})).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("allowed values"));
        assert!(compile(json!({"booking_type_not_equals": ["Air", "Bus"]})).is_err());

        assert!(compile(json!({"contract_type_id_equals": 1})).is_ok());
        assert!(compile(json!({"contract_type_id_equals": 0})).is_err());
        let err = compile(json!({"contract_type_id_not_equals": -3})).unwrap_err();
        assert!(err.to_string().contains("greater than 0"));

        assert!(compile(json!({"renew_number_of_times_from": 0})).is_ok());
        let err = compile(json!({"renew_number_of_times_to": -1})).unwrap_err();
        assert!(err.to_string().contains("at least 0"));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let filter = FilterSpec::new()
            .with("actual_start_date_from", "2024-05-01")
            .with("actual_start_date_to", "2024-01-01");
        let err = compile_filter(&contracts(), &filter).unwrap_err();
        assert!(err.to_string().contains("actual_start_date_from"));
    }

    #[test]
    fn test_null_values_ignored() {
        let filter = FilterSpec::new().with("state_equals", Value::Null);
        assert!(compile_filter(&contracts(), &filter).unwrap().is_empty());

        let filter = FilterSpec::new().with("bogus_equals", Value::Null);
        assert!(compile_filter(&contracts(), &filter).is_err());
    }

    #[test]
    fn test_check_required() {
        let entity = EntityDef::new("trips", "trip_id").with_field(FieldDef::date("start_date").required());
        assert!(FilterEvaluator::check_required(&entity, &record(json!({"start_date": "2024-01-01"}))).is_ok());
        assert!(FilterEvaluator::check_required(&entity, &record(json!({}))).is_err());
        assert!(FilterEvaluator::check_required(&entity, &record(json!({"start_date": "soon"}))).is_err());
    }
}
