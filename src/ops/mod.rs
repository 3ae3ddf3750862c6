//! Operator library: five independently-registrable families of pure
//! predicate functions dispatched by `$`-prefixed key.
//!
//! Adding an operator requires only a `(key, evaluator)` registration; the
//! matcher's dispatch logic never changes. The logical keys `$and`/`$or`/
//! `$not` are structural and handled by the matcher itself, since they
//! recurse into sub-expressions rather than test a field value.
//!
//! Evaluators receive the resolved field as `Option<&Value>`: `None` means
//! the dot-path did not resolve, and each operator documents its own
//! missing-field semantics (`$ne`/`$nin`/`$exists: false` are satisfied by a
//! missing field; every other operator fails on it).

pub mod array;
pub mod comparison;
pub mod datetime;
pub mod geo;
pub mod string;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde_json::Value;

use crate::cache::RegexCache;
use crate::options::FilterOptions;

/// Operator family, used for registry introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFamily {
    Comparison,
    Array,
    String,
    Geospatial,
    Datetime,
    Custom,
}

/// Evaluation context threaded through every operator call. `now` is
/// captured once per filter call so all records in one pass see the same
/// clock.
pub struct EvalContext<'a> {
    pub options: &'a FilterOptions,
    pub registry: &'a OperatorRegistry,
    pub regex_cache: &'a RegexCache,
    pub now: DateTime<Local>,
}

/// A pure operator predicate: (resolved field, operand, context) -> matched
pub type OperatorFn = Arc<dyn Fn(Option<&Value>, &Value, &EvalContext) -> bool + Send + Sync>;

/// Registry mapping operator key to evaluator, grouped by family
#[derive(Clone)]
pub struct OperatorRegistry {
    ops: HashMap<String, (OperatorFamily, OperatorFn)>,
}

impl OperatorRegistry {
    /// Empty registry, for tests injecting a bespoke operator set
    pub fn empty() -> Self {
        Self {
            ops: HashMap::new(),
        }
    }

    /// Registry with every built-in family registered
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        comparison::register(&mut registry);
        array::register(&mut registry);
        string::register(&mut registry);
        geo::register(&mut registry);
        datetime::register(&mut registry);
        registry
    }

    /// Register an operator. Re-registering a key replaces the evaluator.
    pub fn register(&mut self, key: impl Into<String>, family: OperatorFamily, f: OperatorFn) {
        self.ops.insert(key.into(), (family, f));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ops.contains_key(key)
    }

    pub fn family(&self, key: &str) -> Option<OperatorFamily> {
        self.ops.get(key).map(|(family, _)| *family)
    }

    pub(crate) fn get(&self, key: &str) -> Option<&OperatorFn> {
        self.ops.get(key).map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
