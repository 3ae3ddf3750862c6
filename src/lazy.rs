//! Lazy evaluation: an iterator that walks the source once and yields each
//! matching record on demand, without materializing an intermediate vector.
//!
//! Lazy variants never sort, never slice and never touch the result cache;
//! `order_by` and `limit` apply only to eager calls. Early-exit operations
//! (first-N, exists, count) are plain iterator consumers over [`FilterIter`].

use chrono::{DateTime, Local};
use serde_json::Value;

use crate::cache::RegexCache;
use crate::expression::Expression;
use crate::matcher;
use crate::ops::{EvalContext, OperatorRegistry};
use crate::options::FilterOptions;

/// Lazy stream of matching records, restartable only by re-invoking the
/// entry point
pub struct FilterIter<'a> {
    source: std::slice::Iter<'a, Value>,
    expr: Expression,
    options: FilterOptions,
    registry: &'a OperatorRegistry,
    regex_cache: &'a RegexCache,
    now: DateTime<Local>,
}

impl<'a> FilterIter<'a> {
    pub(crate) fn new(
        source: &'a [Value],
        expr: Expression,
        options: FilterOptions,
        registry: &'a OperatorRegistry,
        regex_cache: &'a RegexCache,
    ) -> Self {
        Self {
            source: source.iter(),
            expr,
            options,
            registry,
            regex_cache,
            // One clock for the whole pass
            now: Local::now(),
        }
    }
}

impl<'a> Iterator for FilterIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        loop {
            let record = self.source.next()?;
            let ctx = EvalContext {
                options: &self.options,
                registry: self.registry,
                regex_cache: self.regex_cache,
                now: self.now,
            };
            if matcher::matches(record, &self.expr, &ctx) {
                return Some(record);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Upper bound only; matches cannot be predicted
        (0, self.source.size_hint().1)
    }
}
