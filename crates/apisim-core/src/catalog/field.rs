//! Field definitions for entities.

use apisim_proto::FilterOp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{Normalize, ScalarType};

/// A filterable field within an entity.
///
/// The field's `name` is what callers use in filter keys; `path` is where the
/// value lives inside a record (dot-separated), which defaults to the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name as used in filter keys.
    pub name: String,
    /// Record path, when it differs from the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Field data type.
    pub field_type: ScalarType,
    /// Allowed operators; `None` means the type's defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<FilterOp>>,
    /// Records without a parsable value for this field are skipped.
    #[serde(default)]
    pub required: bool,
    /// String normalization applied before comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<Normalize>,
    /// Values a filter may compare against; empty accepts any value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<Value>,
    /// Lower bound on numeric filter values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Minimum>,
}

/// Lower bound on a numeric filter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Minimum {
    /// Value must be greater than or equal to the bound.
    AtLeast(f64),
    /// Value must be strictly greater than the bound.
    Above(f64),
}

impl Minimum {
    /// The bound itself.
    pub fn bound(&self) -> f64 {
        match *self {
            Minimum::AtLeast(b) | Minimum::Above(b) => b,
        }
    }

    /// Check a value against the bound.
    pub fn admits(&self, value: f64) -> bool {
        match *self {
            Minimum::AtLeast(b) => value >= b,
            Minimum::Above(b) => value > b,
        }
    }
}

impl FieldDef {
    /// Create an optional field stored under its own name.
    pub fn new(name: impl Into<String>, field_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            path: None,
            field_type,
            operators: None,
            required: false,
            normalize: None,
            allowed: Vec::new(),
            minimum: None,
        }
    }

    /// Create a string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ScalarType::String)
    }

    /// Create an integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ScalarType::Integer)
    }

    /// Create a number field.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ScalarType::Number)
    }

    /// Create a boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ScalarType::Boolean)
    }

    /// Create a date field.
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, ScalarType::Date)
    }

    /// Create a datetime field.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, ScalarType::DateTime)
    }

    /// Store the value at a different record path.
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Restrict the allowed operators.
    pub fn only(mut self, operators: &[FilterOp]) -> Self {
        self.operators = Some(operators.to_vec());
        self
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Normalize string values before comparison.
    pub fn normalized(mut self, normalize: Normalize) -> Self {
        self.normalize = Some(normalize);
        self
    }

    /// Accept only these filter values.
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    /// Reject filter values below `bound`.
    pub fn at_least(mut self, bound: f64) -> Self {
        self.minimum = Some(Minimum::AtLeast(bound));
        self
    }

    /// Reject filter values at or below `bound`.
    pub fn above(mut self, bound: f64) -> Self {
        self.minimum = Some(Minimum::Above(bound));
        self
    }

    /// Record path of the value.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }

    /// The allowed operators.
    pub fn operators(&self) -> Vec<FilterOp> {
        match &self.operators {
            Some(ops) => ops.clone(),
            None => self.field_type.default_operators(),
        }
    }

    /// Check whether an operator is allowed on this field.
    pub fn allows(&self, op: FilterOp) -> bool {
        match &self.operators {
            Some(ops) => ops.contains(&op),
            None => self.field_type.supports(op),
        }
    }

    /// Apply the field's string normalization, if any.
    pub fn normalize_text(&self, text: &str) -> String {
        match self.normalize {
            Some(n) => n.apply(text),
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_builder() {
        let field = FieldDef::string("title")
            .at("attributes.title")
            .only(&[FilterOp::Contains, FilterOp::NotContains]);

        assert_eq!(field.path(), "attributes.title");
        assert!(field.allows(FilterOp::Contains));
        assert!(!field.allows(FilterOp::Equals));
        assert!(!field.required);
    }

    #[test]
    fn test_default_path_and_operators() {
        let field = FieldDef::date("start_date").required();
        assert_eq!(field.path(), "start_date");
        assert!(field.allows(FilterOp::From));
        assert!(!field.allows(FilterOp::Contains));
        assert!(field.required);
    }

    #[test]
    fn test_normalize_text() {
        let field = FieldDef::string("currency").normalized(Normalize::Upper);
        assert_eq!(field.normalize_text("eur"), "EUR");
        assert_eq!(FieldDef::string("name").normalize_text("eur"), "eur");
    }

    #[test]
    fn test_value_domain_builders() {
        let field = FieldDef::string("booking_type").one_of(["Air", "Rail"]);
        assert_eq!(field.allowed, vec![Value::from("Air"), Value::from("Rail")]);

        let count = FieldDef::integer("renew_number_of_times").at_least(0.0);
        assert!(count.minimum.is_some_and(|m| m.admits(0.0)));
        assert!(!count.minimum.is_some_and(|m| m.admits(-1.0)));

        let id = FieldDef::integer("contract_type_id").above(0.0);
        assert!(!id.minimum.is_some_and(|m| m.admits(0.0)));
        assert_eq!(id.minimum.map(|m| m.bound()), Some(0.0));
    }

    #[test]
    fn test_value_domain_from_json() {
        let field: FieldDef = serde_json::from_str(
            r#"{"name": "level", "field_type": "integer", "minimum": {"above": 0}, "allowed": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(field.minimum, Some(Minimum::Above(0.0)));
        assert_eq!(field.allowed.len(), 2);
    }
}
