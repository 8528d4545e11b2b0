//! Page limiting and resumption.

use apisim_proto::{Cursor, PageMetadata, PageSpec, RecordId};

use super::sort::{SortKey, SortRow};
use super::value::FieldValue;
use crate::catalog::{IdType, PageLimits};
use crate::error::{validation, Error};

/// A decoded resume position: the sort values and identifier of the last
/// record of the previous page.
#[derive(Debug, Clone)]
pub struct ResumePosition {
    /// Sort values (missing values as `None`).
    pub keys: Vec<Option<FieldValue>>,
    /// Identifier.
    pub id: RecordId,
}

/// Resolved paging instructions for one query.
#[derive(Debug, Clone, Default)]
pub struct PagePlan {
    /// Number of records to return; `None` returns everything.
    pub limit: Option<usize>,
    /// Resume after this position.
    pub after: Option<ResumePosition>,
    /// Whether to attach [`PageMetadata`].
    pub include_metadata: bool,
}

/// One page of sorted rows.
#[derive(Debug)]
pub struct Page<'a> {
    /// Rows on the page, in order.
    pub rows: Vec<SortRow<'a>>,
    /// Metadata, when requested.
    pub metadata: Option<PageMetadata>,
}

/// Applies page limits to sorted rows.
pub struct Paginator;

impl Paginator {
    /// Validate the caller's page object and resolve the plan.
    ///
    /// Without a page object, results are truncated only when metadata is
    /// requested or the entity always paginates.
    pub fn plan(
        limits: PageLimits,
        page: Option<&PageSpec>,
        include_metadata: bool,
        sort_key: &SortKey,
        id_type: IdType,
    ) -> Result<PagePlan, Error> {
        let size = match page.and_then(|p| p.size) {
            Some(size) if size <= 0 => {
                return Err(validation(format!(
                    "page size must be a positive integer, got {}",
                    size
                )))
            }
            Some(size) => {
                let size = usize::try_from(size).unwrap_or(usize::MAX);
                if size > limits.max_size {
                    return Err(validation(format!(
                        "page size {} exceeds the maximum of {}",
                        size, limits.max_size
                    )));
                }
                Some(size)
            }
            None => None,
        };

        let limit = size.or_else(|| {
            (page.is_some() || include_metadata || limits.always_paginate)
                .then_some(limits.default_size)
        });

        let after = match page.and_then(|p| p.after.as_deref()) {
            Some(marker) => Some(Self::decode(marker, sort_key, id_type)?),
            None => None,
        };

        Ok(PagePlan {
            limit,
            after,
            include_metadata,
        })
    }

    /// Decode an offset marker against the sort key.
    pub fn decode(marker: &str, sort_key: &SortKey, id_type: IdType) -> Result<ResumePosition, Error> {
        let invalid = || validation(format!("invalid offset marker '{}'", marker));
        let cursor = Cursor::decode(marker, sort_key.len())?;

        let keys = sort_key
            .terms()
            .iter()
            .zip(&cursor.sort_values)
            .map(|(term, text)| {
                if text.is_empty() {
                    Ok(None)
                } else {
                    FieldValue::parse_text(text, term.field.field_type)
                        .map(Some)
                        .ok_or_else(invalid)
                }
            })
            .collect::<Result<_, _>>()?;
        let id = id_type.parse(&cursor.id).ok_or_else(invalid)?;

        Ok(ResumePosition { keys, id })
    }

    /// Cut the page out of the full sorted result.
    ///
    /// `total_count` counts every row passed in, including rows before a
    /// resume position. The offset marker is set exactly when rows remain
    /// after the page, so `offset_marker.is_none()` matches
    /// `total_count <= page length` only on first pages. A resumed last
    /// page has no marker while `total_count` still exceeds its length.
    pub fn paginate<'a>(rows: Vec<SortRow<'a>>, plan: &PagePlan, sort_key: &SortKey) -> Page<'a> {
        let total_count = rows.len();

        let start = match &plan.after {
            Some(pos) => rows.partition_point(|row| {
                sort_key
                    .compare_keys(&row.keys, row.id, &pos.keys, &pos.id)
                    .is_le()
            }),
            None => 0,
        };
        let mut remaining: Vec<SortRow<'a>> = rows.into_iter().skip(start).collect();
        let available = remaining.len();
        if let Some(limit) = plan.limit {
            remaining.truncate(limit);
        }

        let metadata = plan.include_metadata.then(|| {
            let offset_marker = if available > remaining.len() {
                remaining.last().map(|row| sort_key.cursor(row).encode())
            } else {
                None
            };
            PageMetadata {
                total_count,
                limit: plan.limit.unwrap_or(available),
                offset_marker,
            }
        });

        Page {
            rows: remaining,
            metadata,
        }
    }
}
