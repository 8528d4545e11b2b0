//! Typed field values.
//!
//! Records hold loosely-typed JSON; comparisons happen on [`FieldValue`],
//! parsed according to the catalog's [`ScalarType`] for the field.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::catalog::{FieldDef, ScalarType};
use apisim_proto::record::json_kind;

/// A record value that does not match its field's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Malformed {
    /// Field name.
    pub field: String,
    /// What was wrong.
    pub reason: String,
}

impl Malformed {
    fn new(field: &FieldDef, reason: impl Into<String>) -> Self {
        Self {
            field: field.name.clone(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.field, self.reason)
    }
}

/// A comparable value parsed from a record or a filter operand.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// String value, already normalized.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Num(f64),
    /// Boolean value.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    /// Read a field from a raw record value.
    ///
    /// Absent and null values yield `Ok(None)`; values of the wrong shape
    /// yield [`Malformed`].
    pub fn from_record(raw: Option<&Value>, field: &FieldDef) -> Result<Option<Self>, Malformed> {
        match raw {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Self::from_json(value, field).map(Some).ok_or_else(|| {
                Malformed::new(
                    field,
                    format!("expected {}, got {}", field.field_type.name(), json_kind(value)),
                )
            }),
        }
    }

    /// Parse a JSON value as the field's type. `None` if it does not fit.
    pub fn from_json(value: &Value, field: &FieldDef) -> Option<Self> {
        match (field.field_type, value) {
            (ScalarType::String, Value::String(s)) => Some(FieldValue::Str(field.normalize_text(s))),
            (ScalarType::Integer, Value::Number(n)) => n.as_i64().map(FieldValue::Int),
            (ScalarType::Number, Value::Number(n)) => n.as_f64().map(FieldValue::Num),
            (ScalarType::Boolean, Value::Bool(b)) => Some(FieldValue::Bool(*b)),
            (ScalarType::Date | ScalarType::DateTime, Value::String(s)) => {
                Self::parse_text(s, field.field_type)
            }
            _ => None,
        }
    }

    /// Parse canonical text (as produced by [`FieldValue::canonical`]).
    pub fn parse_text(text: &str, ty: ScalarType) -> Option<Self> {
        match ty {
            ScalarType::String => Some(FieldValue::Str(text.to_string())),
            ScalarType::Integer => text.parse().ok().map(FieldValue::Int),
            ScalarType::Number => text.parse().ok().map(FieldValue::Num),
            ScalarType::Boolean => text.parse().ok().map(FieldValue::Bool),
            ScalarType::Date => parse_date(text).map(FieldValue::Date),
            ScalarType::DateTime => parse_datetime(text).map(FieldValue::DateTime),
        }
    }

    /// Canonical text form, used in offset markers.
    pub fn canonical(&self) -> String {
        match self {
            FieldValue::Str(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Num(n) => n.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    /// Total order over values.
    ///
    /// Integers and numbers compare numerically, dates compare against
    /// timestamps at midnight UTC. Unrelated kinds fall back to a fixed
    /// kind order.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        use FieldValue::*;
        match (self, other) {
            (Str(a), Str(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Num(a), Num(b)) => a.total_cmp(b),
            (Int(a), Num(b)) => (*a as f64).total_cmp(b),
            (Num(a), Int(b)) => a.total_cmp(&(*b as f64)),
            (Bool(a), Bool(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            (Date(a), DateTime(b)) => midnight(*a).cmp(b),
            (DateTime(a), Date(b)) => a.cmp(&midnight(*b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Substring test; only strings contain anything.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            FieldValue::Str(s) => s.contains(needle),
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Bool(_) => 0,
            FieldValue::Int(_) | FieldValue::Num(_) => 1,
            FieldValue::Date(_) | FieldValue::DateTime(_) => 2,
            FieldValue::Str(_) => 3,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

/// Check whether a raw value counts as empty.
///
/// Absent, null, whitespace-only strings and empty lists or objects are empty.
pub fn is_blank(raw: Option<&Value>) -> bool {
    match raw {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(text).map(|dt| dt.date_naive()))
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(midnight)
}
