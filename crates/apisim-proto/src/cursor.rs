//! Offset markers.
//!
//! A marker encodes the sort position of the last returned record as
//! `<sort value>_..._<identifier>`, e.g. `2024-07-15_T-102`. Callers treat it
//! as opaque and only hand it back.

use crate::error::Error;

const SEPARATOR: char = '_';

/// Decoded offset marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Canonical text of each sort field value, in sort key order.
    /// An empty string stands for a missing value.
    pub sort_values: Vec<String>,
    /// Identifier of the last returned record.
    pub id: String,
}

impl Cursor {
    /// Create a cursor.
    pub fn new(sort_values: Vec<String>, id: impl Into<String>) -> Self {
        Self {
            sort_values,
            id: id.into(),
        }
    }

    /// Encode as an offset marker string.
    pub fn encode(&self) -> String {
        let mut marker = String::new();
        for value in &self.sort_values {
            marker.push_str(value);
            marker.push(SEPARATOR);
        }
        marker.push_str(&self.id);
        marker
    }

    /// Decode a marker produced for a sort key with `sort_fields` fields.
    ///
    /// Sort values are split from the left, so the identifier may itself
    /// contain the separator.
    pub fn decode(marker: &str, sort_fields: usize) -> Result<Self, Error> {
        let mut parts: Vec<&str> = marker.splitn(sort_fields + 1, SEPARATOR).collect();
        if parts.len() != sort_fields + 1 {
            return Err(Error::InvalidCursor(marker.to_string()));
        }
        let id = parts.pop().unwrap_or_default();
        if id.is_empty() {
            return Err(Error::InvalidCursor(marker.to_string()));
        }
        Ok(Self {
            sort_values: parts.into_iter().map(str::to_string).collect(),
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_date_and_id() {
        let cursor = Cursor::new(vec!["2024-07-15".into()], "T-102");
        assert_eq!(cursor.encode(), "2024-07-15_T-102");
    }

    #[test]
    fn test_decode_keeps_separator_in_id() {
        let cursor = Cursor::decode("2024-07-15_trip_7", 1).unwrap();
        assert_eq!(cursor.sort_values, vec!["2024-07-15"]);
        assert_eq!(cursor.id, "trip_7");
    }

    #[test]
    fn test_decode_identifier_only() {
        let cursor = Cursor::decode("42", 0).unwrap();
        assert!(cursor.sort_values.is_empty());
        assert_eq!(cursor.id, "42");
    }

    #[test]
    fn test_decode_missing_sort_value() {
        let cursor = Cursor::decode("_9", 1).unwrap();
        assert_eq!(cursor.sort_values, vec![String::new()]);
        assert_eq!(cursor.id, "9");
    }

    #[test]
    fn test_decode_rejects_short_marker() {
        assert!(Cursor::decode("2024-07-15", 1).is_err());
        assert!(Cursor::decode("2024-07-15_", 1).is_err());
        assert!(Cursor::decode("", 0).is_err());
    }
}
