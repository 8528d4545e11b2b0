//! Core type definitions for the catalog.

use apisim_proto::{FilterOp, RecordId};
use serde::{Deserialize, Serialize};

/// Scalar types a filterable field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// UTF-8 string.
    String,
    /// 64-bit signed integer.
    Integer,
    /// Floating point number.
    Number,
    /// Boolean value.
    Boolean,
    /// Calendar date (`YYYY-MM-DD`).
    Date,
    /// Timestamp (ISO-8601, UTC when no offset is given).
    DateTime,
}

impl ScalarType {
    /// Human-readable type name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Integer => "integer",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Date => "date",
            ScalarType::DateTime => "datetime",
        }
    }

    /// Check if values of this type support range bounds.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, ScalarType::Boolean)
    }

    /// Check whether an operator can be applied to this type.
    pub fn supports(&self, op: FilterOp) -> bool {
        match op {
            FilterOp::Equals | FilterOp::NotEquals | FilterOp::Empty | FilterOp::NotEmpty => true,
            FilterOp::Contains | FilterOp::NotContains => matches!(self, ScalarType::String),
            FilterOp::From | FilterOp::To => self.is_orderable(),
        }
    }

    /// The operators a field of this type allows unless restricted.
    pub fn default_operators(&self) -> Vec<FilterOp> {
        FilterOp::ALL
            .iter()
            .copied()
            .filter(|op| self.supports(*op))
            .collect()
    }
}

/// Native type of an entity's identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    /// Integer identifiers, ordered numerically.
    Integer,
    /// String identifiers, ordered lexicographically.
    #[default]
    String,
}

impl IdType {
    /// Parse identifier text.
    pub fn parse(&self, text: &str) -> Option<RecordId> {
        match self {
            IdType::Integer => text.trim().parse::<i64>().ok().map(RecordId::Int),
            IdType::String if !text.is_empty() => Some(RecordId::Str(text.to_string())),
            IdType::String => None,
        }
    }

    /// Convert an identifier of either kind into this type.
    pub fn coerce(&self, id: &RecordId) -> Option<RecordId> {
        match (self, id) {
            (IdType::Integer, RecordId::Int(_)) | (IdType::String, RecordId::Str(_)) => {
                Some(id.clone())
            }
            (IdType::Integer, RecordId::Str(s)) => self.parse(s),
            (IdType::String, RecordId::Int(i)) => Some(RecordId::Str(i.to_string())),
        }
    }
}

/// Normalization applied to string values before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalize {
    /// Compare upper-cased (currency codes, booking types).
    Upper,
    /// Compare lower-cased.
    Lower,
}

impl Normalize {
    /// Apply the normalization.
    pub fn apply(&self, text: &str) -> String {
        match self {
            Normalize::Upper => text.to_uppercase(),
            Normalize::Lower => text.to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_support() {
        assert!(ScalarType::String.supports(FilterOp::Contains));
        assert!(!ScalarType::Integer.supports(FilterOp::Contains));
        assert!(ScalarType::Date.supports(FilterOp::From));
        assert!(!ScalarType::Boolean.supports(FilterOp::To));
        assert!(ScalarType::Boolean.supports(FilterOp::NotEmpty));
    }

    #[test]
    fn test_default_operators() {
        let ops = ScalarType::Boolean.default_operators();
        assert_eq!(
            ops,
            vec![
                FilterOp::Equals,
                FilterOp::NotEquals,
                FilterOp::Empty,
                FilterOp::NotEmpty
            ]
        );
        assert_eq!(ScalarType::String.default_operators().len(), 6);
    }

    #[test]
    fn test_id_coercion() {
        assert_eq!(
            IdType::Integer.coerce(&RecordId::from("12")),
            Some(RecordId::Int(12))
        );
        assert_eq!(IdType::Integer.coerce(&RecordId::from("x")), None);
        assert_eq!(
            IdType::String.coerce(&RecordId::Int(5)),
            Some(RecordId::from("5"))
        );
        assert_eq!(IdType::String.parse(""), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(Normalize::Upper.apply("usd"), "USD");
        assert_eq!(Normalize::Lower.apply("Air"), "air");
    }
}
