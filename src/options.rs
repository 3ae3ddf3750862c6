//! Per-call configuration for filter evaluation.
//!
//! `FilterOptions` is constructed fresh per call and never mutated by the
//! engine. The canonical cache signature serialized here must include
//! `order_by` and `limit`: two calls differing only in limit must never
//! collide in the result cache.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{FilterError, FilterResult};

/// Default maximum expression nesting depth
pub const DEFAULT_MAX_DEPTH: u8 = 3;

/// Valid range for `max_depth`
pub const MAX_DEPTH_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Record comparator used in place of field-based sorting when supplied
pub type Comparator = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// Sort direction for an `order_by` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A single sort key: dot-path field + direction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Immutable per-call filter configuration
#[derive(Clone)]
pub struct FilterOptions {
    /// Governs all string comparisons, wildcard matching and regex matching
    pub case_sensitive: bool,
    /// Maximum expression nesting depth (1-10)
    pub max_depth: u8,
    /// Opt-in result caching; staleness after data mutation is the caller's
    /// responsibility
    pub enable_cache: bool,
    /// Stable multi-key sort applied after matching
    pub order_by: Vec<SortKey>,
    /// Slice applied after filtering and sorting
    pub limit: Option<usize>,
    /// When set, replaces the `order_by` key comparison entirely. Calls with
    /// a custom comparator bypass the result cache.
    pub custom_comparator: Option<Comparator>,
    /// Collect a per-record trace tree
    pub debug: bool,
    /// Record per-node elapsed time in the trace
    pub show_timings: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            max_depth: DEFAULT_MAX_DEPTH,
            enable_cache: false,
            order_by: Vec::new(),
            limit: None,
            custom_comparator: None,
            debug: false,
            show_timings: false,
        }
    }
}

impl std::fmt::Debug for FilterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterOptions")
            .field("case_sensitive", &self.case_sensitive)
            .field("max_depth", &self.max_depth)
            .field("enable_cache", &self.enable_cache)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("custom_comparator", &self.custom_comparator.is_some())
            .field("debug", &self.debug)
            .field("show_timings", &self.show_timings)
            .finish()
    }
}

impl FilterOptions {
    /// Validate option values. Fails fast before any record is evaluated.
    pub fn validate(&self) -> FilterResult<()> {
        if !MAX_DEPTH_RANGE.contains(&self.max_depth) {
            return Err(FilterError::InvalidOptions(format!(
                "max_depth must be between {} and {}, got {}",
                MAX_DEPTH_RANGE.start(),
                MAX_DEPTH_RANGE.end(),
                self.max_depth
            )));
        }
        for key in &self.order_by {
            if key.field.is_empty() {
                return Err(FilterError::InvalidOptions(
                    "order_by field must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Canonical JSON signature of every option that affects the result set.
    /// Includes `order_by` and `limit` by design.
    pub(crate) fn cache_signature(&self) -> String {
        let order_by: Vec<Value> = self
            .order_by
            .iter()
            .map(|k| {
                json!({
                    "field": k.field,
                    "direction": match k.direction {
                        SortDirection::Asc => "asc",
                        SortDirection::Desc => "desc",
                    },
                })
            })
            .collect();
        json!({
            "caseSensitive": self.case_sensitive,
            "maxDepth": self.max_depth,
            "orderBy": order_by,
            "limit": self.limit,
        })
        .to_string()
    }
}
