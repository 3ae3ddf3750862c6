//! docsift - In-memory JSON filtering with a declarative operator DSL.
//!
//! This crate evaluates MongoDB-style filter expressions against in-memory
//! `serde_json` collections. Expressions are validated once into a checked
//! tree, then matched recursively with short-circuiting; results can be
//! sorted, sliced, cached or streamed lazily.
//!
//! # Main Components
//!
//! - **Validator**: checks a raw expression and resolves all shorthand
//! - **Operator library**: comparison, array, string, geospatial and
//!   datetime operator families, extensible at runtime
//! - **Engine**: owns the operator registry and both LRU caches and exposes
//!   the eager, lazy, early-exit and debug entry points
//!
//! # Example
//!
//! ```rust
//! use docsift::filter;
//! use serde_json::json;
//!
//! let users = vec![
//!     json!({"name": "Alice", "age": 30}),
//!     json!({"name": "Bob", "age": 25}),
//! ];
//!
//! let results = filter(&users, &json!({"age": {"$gte": 26}})).unwrap();
//! assert_eq!(results, vec![json!({"name": "Alice", "age": 30})]);
//! ```

pub mod cache;
pub mod debug;
pub mod engine;
pub mod error;
pub mod expression;
pub mod lazy;
mod matcher;
pub mod ops;
pub mod options;
mod sort;
pub mod value;

// Re-export main types for convenience
pub use cache::CacheStats;
pub use debug::{FilterTrace, RecordTrace, TraceNode};
pub use engine::FilterEngine;
pub use error::{FilterError, FilterResult};
pub use expression::{ConditionValue, Expression, OperatorCond};
pub use lazy::FilterIter;
pub use ops::geo::GeoPoint;
pub use ops::{EvalContext, OperatorFamily, OperatorFn, OperatorRegistry};
pub use options::{Comparator, FilterOptions, SortDirection, SortKey};

use serde_json::Value;

/// Filter a collection with default options using a throwaway engine.
///
/// Convenience wrapper; callers that filter repeatedly or want caching
/// should hold a [`FilterEngine`] instead.
pub fn filter(data: &[Value], expression: &Value) -> FilterResult<Vec<Value>> {
    FilterEngine::new().filter(data, expression, &FilterOptions::default())
}

/// Filter a collection with explicit options using a throwaway engine
pub fn filter_with_options(
    data: &[Value],
    expression: &Value,
    options: &FilterOptions,
) -> FilterResult<Vec<Value>> {
    FilterEngine::new().filter(data, expression, options)
}

/// True as soon as any record matches, with default options
pub fn filter_exists(data: &[Value], expression: &Value) -> FilterResult<bool> {
    FilterEngine::new().filter_exists(data, expression, &FilterOptions::default())
}

/// Count of matching records, with default options
pub fn filter_count(data: &[Value], expression: &Value) -> FilterResult<usize> {
    FilterEngine::new().filter_count(data, expression, &FilterOptions::default())
}
