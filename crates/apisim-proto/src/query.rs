//! Query input types for list endpoints.
//!
//! A list query names an entity collection and carries a filter
//! specification, an optional page object, and an optional include list.
//! Sorting is not part of the query: every entity declares its own order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::record::json_kind;

/// Filter operators, applied as a suffix on a field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact match, or set membership for list input.
    Equals,
    /// Negated exact match or set membership.
    NotEquals,
    /// Substring match.
    Contains,
    /// Negated substring match.
    NotContains,
    /// Inclusive lower bound.
    From,
    /// Inclusive upper bound.
    To,
    /// Field absent, null, or blank.
    Empty,
    /// Field present and not blank.
    NotEmpty,
}

impl FilterOp {
    /// Every operator.
    pub const ALL: [FilterOp; 8] = [
        FilterOp::Equals,
        FilterOp::NotEquals,
        FilterOp::Contains,
        FilterOp::NotContains,
        FilterOp::From,
        FilterOp::To,
        FilterOp::Empty,
        FilterOp::NotEmpty,
    ];

    /// The key suffix for this operator (without the separating underscore).
    pub fn suffix(&self) -> &'static str {
        match self {
            FilterOp::Equals => "equals",
            FilterOp::NotEquals => "not_equals",
            FilterOp::Contains => "contains",
            FilterOp::NotContains => "not_contains",
            FilterOp::From => "from",
            FilterOp::To => "to",
            FilterOp::Empty => "empty",
            FilterOp::NotEmpty => "not_empty",
        }
    }

    /// Build the operator-qualified key for a field.
    pub fn key(&self, field: &str) -> String {
        format!("{}_{}", field, self.suffix())
    }

    /// Split an operator-qualified key into every plausible `(field, op)` pair.
    ///
    /// `state_not_equals` yields both `("state", NotEquals)` and
    /// `("state_not", Equals)`; the caller decides which field exists.
    pub fn split_key(key: &str) -> Vec<(&str, FilterOp)> {
        Self::ALL
            .iter()
            .filter_map(|op| {
                let field = key.strip_suffix(op.suffix())?.strip_suffix('_')?;
                (!field.is_empty()).then_some((field, *op))
            })
            .collect()
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Mapping from operator-qualified field name to comparison value.
///
/// Keys iterate in sorted order so validation messages are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(BTreeMap<String, Value>);

impl FilterSpec {
    /// Create an empty filter (matches everything).
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a filter from a JSON object. `null` yields an empty filter.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(Error::InvalidFilter(json_kind(&other).to_string())),
        }
    }

    /// Add a filter entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a filter entry, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get the value for a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the filter is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Pagination input.
///
/// There is no page number: only a size and, optionally, the offset marker
/// returned by a previous page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSpec {
    /// Requested page size. Must be positive when present.
    #[serde(default)]
    pub size: Option<i64>,
    /// Offset marker to resume after.
    #[serde(default)]
    pub after: Option<String>,
}

impl PageSpec {
    /// Page with an explicit size.
    pub fn sized(size: i64) -> Self {
        Self {
            size: Some(size),
            after: None,
        }
    }

    /// Resume after the given offset marker.
    pub fn after(mut self, marker: impl Into<String>) -> Self {
        self.after = Some(marker.into());
        self
    }

    /// Build a page object from JSON. `null` yields no page object.
    pub fn from_value(value: Value) -> Result<Option<Self>, Error> {
        match value {
            Value::Null => Ok(None),
            Value::Object(_) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::InvalidPage(e.to_string())),
            other => Err(Error::InvalidPage(format!(
                "page must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// A deduplicated list of relationship names to include.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncludeSpec(Vec<String>);

impl IncludeSpec {
    /// Parse a comma-separated include string.
    ///
    /// Names are trimmed, blanks dropped and duplicates removed, keeping
    /// first-seen order. A string naming nothing is rejected.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let spec = Self::from_names(input.split(','));
        if spec.is_empty() {
            return Err(Error::InvalidInclude(
                "include must name at least one relationship".to_string(),
            ));
        }
        Ok(spec)
    }

    /// Build from an iterator of names, applying the same normalization as
    /// [`IncludeSpec::parse`].
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        }
        Self(out)
    }

    /// The relationship names.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Check whether a relationship was requested.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Check whether nothing was requested.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A list query against one entity collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    /// Entity collection to query.
    pub entity: String,
    /// Filter predicates (AND-combined).
    pub filter: FilterSpec,
    /// Pagination input, if any.
    pub page: Option<PageSpec>,
    /// Relationships to include, if any.
    pub include: Option<IncludeSpec>,
    /// Whether to return pagination metadata.
    pub include_metadata: bool,
}

/// Boundary shape of a list query as callers submit it.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawListQuery {
    entity: String,
    #[serde(default)]
    filter: Value,
    #[serde(default)]
    page: Value,
    #[serde(default, rename = "_include", alias = "include")]
    include: Option<String>,
    #[serde(default)]
    include_metadata: bool,
}

impl ListQuery {
    /// Create a query for an entity with no filter, page or include.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Default::default()
        }
    }

    /// Parse a query from its JSON boundary form:
    /// `{"entity", "filter"?, "page"?, "_include"?, "include_metadata"?}`.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let raw: RawListQuery = serde_json::from_value(value)?;
        Ok(Self {
            entity: raw.entity,
            filter: FilterSpec::from_value(raw.filter)?,
            page: PageSpec::from_value(raw.page)?,
            include: raw.include.as_deref().map(IncludeSpec::parse).transpose()?,
            include_metadata: raw.include_metadata,
        })
    }

    /// Replace the filter.
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    /// Add a single filter entry.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(key, value);
        self
    }

    /// Set the page object.
    pub fn with_page(mut self, page: PageSpec) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the include list.
    pub fn with_include(mut self, include: IncludeSpec) -> Self {
        self.include = Some(include);
        self
    }

    /// Request pagination metadata.
    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_key_candidates() {
        let candidates = FilterOp::split_key("state_not_equals");
        assert!(candidates.contains(&("state", FilterOp::NotEquals)));
        assert!(candidates.contains(&("state_not", FilterOp::Equals)));

        assert_eq!(
            FilterOp::split_key("updated_at_from"),
            vec![("updated_at", FilterOp::From)]
        );
        assert!(FilterOp::split_key("equals").is_empty());
        assert!(FilterOp::split_key("_equals").is_empty());
        assert!(FilterOp::split_key("title").is_empty());
    }

    #[test]
    fn test_op_key_roundtrip() {
        for op in FilterOp::ALL {
            let key = op.key("title");
            assert!(FilterOp::split_key(&key).contains(&("title", op)));
        }
    }

    #[test]
    fn test_include_parse() {
        let spec = IncludeSpec::parse(" contract_type, spend_category ,,contract_type").unwrap();
        assert_eq!(spec.names(), &["contract_type", "spend_category"]);
        assert!(spec.contains("spend_category"));

        assert!(IncludeSpec::parse("").is_err());
        assert!(IncludeSpec::parse(" , ").is_err());
    }

    #[test]
    fn test_filter_from_value() {
        let filter = FilterSpec::from_value(json!({"title_contains": "lease"})).unwrap();
        assert_eq!(filter.get("title_contains"), Some(&json!("lease")));

        assert!(FilterSpec::from_value(json!(null)).unwrap().is_empty());
        assert!(FilterSpec::from_value(json!([1])).is_err());
    }

    #[test]
    fn test_page_from_value() {
        assert_eq!(PageSpec::from_value(json!(null)).unwrap(), None);
        assert_eq!(
            PageSpec::from_value(json!({"size": 3})).unwrap(),
            Some(PageSpec::sized(3))
        );
        // Page numbers are not part of the vocabulary
        assert!(PageSpec::from_value(json!({"size": 3, "number": 2})).is_err());
        assert!(PageSpec::from_value(json!({"size": "ten"})).is_err());
        assert!(PageSpec::from_value(json!(10)).is_err());
    }

    #[test]
    fn test_list_query_from_value() {
        let query = ListQuery::from_value(json!({
            "entity": "contracts",
            "filter": {"state_equals": ["active", "draft"]},
            "page": {"size": 5},
            "_include": "supplier_company",
            "include_metadata": true
        }))
        .unwrap();

        assert_eq!(query.entity, "contracts");
        assert_eq!(query.filter.len(), 1);
        assert_eq!(query.page, Some(PageSpec::sized(5)));
        assert_eq!(
            query.include.as_ref().map(|i| i.names().to_vec()),
            Some(vec!["supplier_company".to_string()])
        );
        assert!(query.include_metadata);

        let bare = ListQuery::from_value(json!({"entity": "events"})).unwrap();
        assert_eq!(bare, ListQuery::new("events"));

        assert!(ListQuery::from_value(json!({"entity": "events", "sort": "id"})).is_err());
    }
}
