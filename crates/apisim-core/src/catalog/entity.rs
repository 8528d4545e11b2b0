//! Entity definitions.

use apisim_proto::{FilterOp, FilterSpec};
use chrono::{Months, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use super::field::FieldDef;
use super::types::IdType;
use crate::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// An entity definition: one queryable collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity name (unique within the catalog).
    pub name: String,
    /// Name of the record field carrying the identifier.
    pub identity_field: String,
    /// Native identifier type.
    #[serde(default)]
    pub id_type: IdType,
    /// Filterable fields.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Default ordering. The identifier is always appended as a tie-break.
    #[serde(default)]
    pub default_order: Vec<OrderBy>,
    /// Page size limits; `None` uses the engine defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageLimits>,
    /// Filters applied unless the caller constrains the same field.
    #[serde(default, skip_serializing_if = "FilterSpec::is_empty")]
    pub default_filters: FilterSpec,
    /// Date window applied unless the caller constrains the window fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_window: Option<DefaultWindow>,
    /// How included relations are returned.
    #[serde(default)]
    pub include_mode: IncludeMode,
}

/// Order specification for default ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Field name to order by.
    pub field: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: OrderDirection,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// Page size limits for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    /// Size used when paging without an explicit size.
    pub default_size: usize,
    /// Largest accepted size.
    pub max_size: usize,
    /// Page even when the caller sent no page object.
    #[serde(default)]
    pub always_paginate: bool,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
            always_paginate: false,
        }
    }
}

impl PageLimits {
    /// Limits with the given default and maximum.
    pub fn new(default_size: usize, max_size: usize) -> Self {
        Self {
            default_size,
            max_size,
            always_paginate: false,
        }
    }

    /// Page every listing.
    pub fn always(mut self) -> Self {
        self.always_paginate = true;
        self
    }
}

/// A rolling date window relative to the reference date.
///
/// Produces `<lower_key>: today - lookback_days` and
/// `<upper_key>: today + lookahead_months`, so records overlapping the
/// window are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultWindow {
    /// Filter key receiving the lower bound (e.g. `end_date_from`).
    pub lower_key: String,
    /// Days before the reference date.
    pub lookback_days: u32,
    /// Filter key receiving the upper bound (e.g. `start_date_to`).
    pub upper_key: String,
    /// Calendar months after the reference date.
    pub lookahead_months: u32,
}

impl DefaultWindow {
    /// Compute the window bounds around `today`.
    pub fn bounds(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let lower = today
            .checked_sub_signed(TimeDelta::days(i64::from(self.lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        let upper = today
            .checked_add_months(Months::new(self.lookahead_months))
            .unwrap_or(NaiveDate::MAX);
        (lower, upper)
    }

    /// The window as filter entries.
    pub fn to_filter(&self, today: NaiveDate) -> FilterSpec {
        let (lower, upper) = self.bounds(today);
        FilterSpec::new()
            .with(self.lower_key.clone(), lower.format("%Y-%m-%d").to_string())
            .with(self.upper_key.clone(), upper.format("%Y-%m-%d").to_string())
    }
}

/// How included relations appear in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeMode {
    /// Write the related record into the owning record.
    #[default]
    Embed,
    /// Collect related records into the result's `included` list.
    Sideload,
}

impl EntityDef {
    /// Create a new entity definition with string identifiers.
    pub fn new(name: impl Into<String>, identity_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: identity_field.into(),
            id_type: IdType::String,
            fields: Vec::new(),
            default_order: Vec::new(),
            page: None,
            default_filters: FilterSpec::new(),
            default_window: None,
            include_mode: IncludeMode::Embed,
        }
    }

    /// Set the identifier type.
    pub fn with_id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    /// Add a field to the entity.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Append a default ordering term.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.default_order.push(order);
        self
    }

    /// Set page limits.
    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.page = Some(limits);
        self
    }

    /// Add a default filter entry.
    pub fn with_default_filter(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.default_filters.insert(key, value);
        self
    }

    /// Set the default date window.
    pub fn with_default_window(mut self, window: DefaultWindow) -> Self {
        self.default_window = Some(window);
        self
    }

    /// Return related records in the `included` list.
    pub fn sideloaded(mut self) -> Self {
        self.include_mode = IncludeMode::Sideload;
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve a filter key to the field and operator it names.
    ///
    /// Field names may contain underscores, so every split is tried and the
    /// first one naming a declared field that allows the operator wins.
    pub fn resolve_key(&self, key: &str) -> Option<(&FieldDef, FilterOp)> {
        FilterOp::split_key(key).into_iter().find_map(|(name, op)| {
            self.get_field(name)
                .filter(|field| field.allows(op))
                .map(|field| (field, op))
        })
    }

    /// Effective page limits.
    pub fn page_limits(&self, fallback: PageLimits) -> PageLimits {
        self.page.unwrap_or(fallback)
    }

    /// Fields a record must carry to be listed.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.required)
    }
}

impl OrderBy {
    /// Create ascending order.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Create descending order.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }
}
