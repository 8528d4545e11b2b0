//! Result types for list queries.

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Pagination metadata, returned only when requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Size of the filtered set before truncation.
    pub total_count: usize,
    /// Effective page size.
    pub limit: usize,
    /// Resume token for the next page; `None` on the final page.
    pub offset_marker: Option<String>,
}

impl PageMetadata {
    /// Check whether this page is the last one.
    pub fn is_last_page(&self) -> bool {
        self.offset_marker.is_none()
    }
}

/// The result of a list query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Returned records, in sort order.
    pub items: Vec<Record>,
    /// Pagination metadata, if requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PageMetadata>,
    /// Related records for entities that sideload their includes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Record>,
}

impl QueryResult {
    /// Create a result with items only.
    pub fn new(items: Vec<Record>) -> Self {
        Self {
            items,
            metadata: None,
            included: Vec::new(),
        }
    }

    /// Attach pagination metadata.
    pub fn with_metadata(mut self, metadata: PageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach sideloaded records.
    pub fn with_included(mut self, included: Vec<Record>) -> Self {
        self.included = included;
        self
    }

    /// Number of returned items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check whether no items were returned.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_shape_without_metadata() {
        let item = Record::from_value(json!({"id": 1})).unwrap();
        let result = QueryResult::new(vec![item]);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"items": [{"id": 1}]})
        );
    }

    #[test]
    fn test_response_shape_with_metadata() {
        let result = QueryResult::new(vec![]).with_metadata(PageMetadata {
            total_count: 4,
            limit: 10,
            offset_marker: None,
        });
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "items": [],
                "metadata": {"total_count": 4, "limit": 10, "offset_marker": null}
            })
        );
        assert!(result.metadata.unwrap().is_last_page());
    }
}
