//! Filter engine: the public entry points.
//!
//! An engine owns its operator registry and both caches, so two engine
//! instances never share state and tests can build isolated ones. All entry
//! points are synchronous and side-effect-free apart from cache population;
//! validation errors surface before any record is evaluated and no partial
//! result is ever returned.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use serde_json::Value;
use tracing::debug;

use crate::cache::{
    fingerprint_source, hash_json, hash_str, RegexCache, ResultCache, ResultKey,
    DEFAULT_REGEX_CAPACITY, DEFAULT_RESULT_CAPACITY,
};
use crate::debug::{FilterTrace, RecordTrace, TraceOpts};
use crate::error::FilterResult;
use crate::expression::{validate, Expression};
use crate::lazy::FilterIter;
use crate::matcher;
use crate::ops::{EvalContext, OperatorFamily, OperatorFn, OperatorRegistry};
use crate::options::FilterOptions;
use crate::sort;

/// In-memory filter engine over `serde_json` collections
pub struct FilterEngine {
    registry: OperatorRegistry,
    result_cache: ResultCache,
    regex_cache: RegexCache,
}

impl FilterEngine {
    /// Engine with the standard operator set and default cache capacities
    pub fn new() -> Self {
        Self::with_capacities(DEFAULT_RESULT_CAPACITY, DEFAULT_REGEX_CAPACITY)
    }

    /// Engine with explicit cache capacities (result entries per source
    /// collection, compiled regexes overall)
    pub fn with_capacities(result_capacity: usize, regex_capacity: usize) -> Self {
        Self {
            registry: OperatorRegistry::standard(),
            result_cache: ResultCache::new(result_capacity),
            regex_cache: RegexCache::new(regex_capacity),
        }
    }

    /// Register an additional operator. Takes effect for every subsequent
    /// call on this engine; re-registering a key replaces the evaluator.
    pub fn register_operator(
        &mut self,
        key: impl Into<String>,
        family: OperatorFamily,
        f: OperatorFn,
    ) {
        self.registry.register(key, family, f);
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Filter a collection eagerly: validate, match every record, then sort
    /// and slice per the options.
    pub fn filter(
        &self,
        data: &[Value],
        expression: &Value,
        options: &FilterOptions,
    ) -> FilterResult<Vec<Value>> {
        options.validate()?;
        let expr = validate(expression, options, &self.registry)?;
        let started = Instant::now();

        let cache_key = self.cache_key(data, expression, options);
        if let Some(key) = &cache_key {
            if let Some(hit) = self.result_cache.get(key.0, &key.1) {
                debug!(records = hit.len(), "result cache hit");
                return Ok((*hit).clone());
            }
        }

        let mut results = self.eval_eager(data, &expr, options);
        sort::sort_and_limit(&mut results, options);

        if let Some((source, key)) = cache_key {
            self.result_cache
                .insert(source, key, Arc::new(results.clone()));
        }
        debug!(
            scanned = data.len(),
            matched = results.len(),
            elapsed = ?started.elapsed(),
            "filter complete"
        );
        Ok(results)
    }

    /// Lazy variant: yields matching records on demand, in source order.
    /// `order_by` and `limit` do not apply and the result cache is not
    /// consulted.
    pub fn filter_lazy<'a>(
        &'a self,
        data: &'a [Value],
        expression: &Value,
        options: &FilterOptions,
    ) -> FilterResult<FilterIter<'a>> {
        options.validate()?;
        let expr = validate(expression, options, &self.registry)?;
        Ok(FilterIter::new(
            data,
            expr,
            options.clone(),
            &self.registry,
            &self.regex_cache,
        ))
    }

    /// First `n` matches, stopping the scan as soon as they are found
    pub fn filter_first(
        &self,
        data: &[Value],
        expression: &Value,
        n: usize,
        options: &FilterOptions,
    ) -> FilterResult<Vec<Value>> {
        Ok(self
            .filter_lazy(data, expression, options)?
            .take(n)
            .cloned()
            .collect())
    }

    /// True as soon as any record matches
    pub fn filter_exists(
        &self,
        data: &[Value],
        expression: &Value,
        options: &FilterOptions,
    ) -> FilterResult<bool> {
        Ok(self.filter_lazy(data, expression, options)?.next().is_some())
    }

    /// Count of matching records, scanning fully with O(1) extra memory
    pub fn filter_count(
        &self,
        data: &[Value],
        expression: &Value,
        options: &FilterOptions,
    ) -> FilterResult<usize> {
        Ok(self.filter_lazy(data, expression, options)?.count())
    }

    /// Debug variant: same results as [`filter`](Self::filter), plus an
    /// evaluation trace. Per-record trace trees are collected when
    /// `options.debug` is set; the summary counts and timing are always
    /// present. Never reads or writes the result cache.
    pub fn filter_debug(
        &self,
        data: &[Value],
        expression: &Value,
        options: &FilterOptions,
    ) -> FilterResult<(Vec<Value>, FilterTrace)> {
        options.validate()?;
        let expr = validate(expression, options, &self.registry)?;
        let started = Instant::now();
        let trace_opts = TraceOpts {
            timings: options.show_timings,
        };

        let ctx = EvalContext {
            options,
            registry: &self.registry,
            regex_cache: &self.regex_cache,
            now: Local::now(),
        };
        let mut results = Vec::new();
        let mut records = Vec::new();
        for (index, record) in data.iter().enumerate() {
            let (matched, root) = matcher::matches_traced(record, &expr, &ctx, trace_opts);
            if matched {
                results.push(record.clone());
            }
            if options.debug {
                records.push(RecordTrace {
                    index,
                    matched,
                    root,
                });
            }
        }
        let matched = results.len();
        sort::sort_and_limit(&mut results, options);

        let trace = FilterTrace {
            matched,
            total: data.len(),
            execution_time: started.elapsed(),
            records,
        };
        Ok((results, trace))
    }

    /// Drop every cached result and compiled regex
    pub fn clear_cache(&self) {
        self.result_cache.clear();
        self.regex_cache.clear();
        debug!("caches cleared");
    }

    pub fn result_cache(&self) -> &ResultCache {
        &self.result_cache
    }

    pub fn regex_cache(&self) -> &RegexCache {
        &self.regex_cache
    }

    fn eval_eager(&self, data: &[Value], expr: &Expression, options: &FilterOptions) -> Vec<Value> {
        let ctx = EvalContext {
            options,
            registry: &self.registry,
            regex_cache: &self.regex_cache,
            now: Local::now(),
        };
        data.iter()
            .filter(|record| matcher::matches(record, expr, &ctx))
            .cloned()
            .collect()
    }

    /// Cache key for this call, or `None` when caching does not apply.
    /// A custom comparator cannot be serialized into a stable signature, so
    /// those calls bypass the cache.
    fn cache_key(
        &self,
        data: &[Value],
        expression: &Value,
        options: &FilterOptions,
    ) -> Option<(u64, ResultKey)> {
        if !options.enable_cache {
            return None;
        }
        if options.custom_comparator.is_some() {
            debug!("result cache bypassed: custom comparator in use");
            return None;
        }
        let source = fingerprint_source(data);
        let key = ResultKey {
            expr: hash_json(expression),
            options: hash_str(&options.cache_signature()),
        };
        Some((source, key))
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use serde_json::json;

    fn people() -> Vec<Value> {
        vec![
            json!({"name": "Alice", "age": 30}),
            json!({"name": "Bob", "age": 25}),
        ]
    }

    #[test]
    fn test_basic_filter() {
        let engine = FilterEngine::new();
        let results = engine
            .filter(&people(), &json!({"age": {"$gte": 26}}), &Default::default())
            .unwrap();
        assert_eq!(results, vec![json!({"name": "Alice", "age": 30})]);
    }

    #[test]
    fn test_invalid_expression_fails_before_scan() {
        let engine = FilterEngine::new();
        let err = engine
            .filter(&people(), &json!({"age": {"$unknownOp": 5}}), &Default::default())
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidExpression(_)));
    }

    #[test]
    fn test_cache_hit_returns_same_results() {
        let engine = FilterEngine::new();
        let data = people();
        let expr = json!({"age": {"$gte": 26}});
        let options = FilterOptions {
            enable_cache: true,
            ..Default::default()
        };

        let first = engine.filter(&data, &expr, &options).unwrap();
        let second = engine.filter(&data, &expr, &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.result_cache().stats().hits, 1);
        assert_eq!(engine.result_cache().stats().misses, 1);
    }

    #[test]
    fn test_clear_cache() {
        let engine = FilterEngine::new();
        let data = people();
        let expr = json!({"age": {"$gte": 26}});
        let options = FilterOptions {
            enable_cache: true,
            ..Default::default()
        };
        engine.filter(&data, &expr, &options).unwrap();
        assert_eq!(engine.result_cache().len(), 1);
        engine.clear_cache();
        assert!(engine.result_cache().is_empty());
    }

    #[test]
    fn test_custom_comparator_bypasses_cache() {
        let engine = FilterEngine::new();
        let data = people();
        let expr = json!({});
        let options = FilterOptions {
            enable_cache: true,
            custom_comparator: Some(Arc::new(|a: &Value, b: &Value| {
                a["age"].as_i64().cmp(&b["age"].as_i64())
            })),
            ..Default::default()
        };
        let results = engine.filter(&data, &expr, &options).unwrap();
        assert_eq!(results[0]["name"], "Bob");
        assert!(engine.result_cache().is_empty());
    }

    #[test]
    fn test_first_exists_count() {
        let engine = FilterEngine::new();
        let data: Vec<Value> = (0..50).map(|i| json!({"id": i})).collect();
        let expr = json!({"id": {"$gte": 10}});
        let options = FilterOptions::default();

        let first = engine.filter_first(&data, &expr, 3, &options).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0]["id"], 10);

        assert!(engine.filter_exists(&data, &expr, &options).unwrap());
        assert!(!engine
            .filter_exists(&data, &json!({"id": {"$gte": 100}}), &options)
            .unwrap());

        assert_eq!(engine.filter_count(&data, &expr, &options).unwrap(), 40);
    }

    #[test]
    fn test_debug_trace_matches_plain_results() {
        let engine = FilterEngine::new();
        let data = people();
        let expr = json!({"age": {"$gte": 26}});
        let options = FilterOptions {
            debug: true,
            show_timings: true,
            ..Default::default()
        };

        let plain = engine.filter(&data, &expr, &options).unwrap();
        let (traced, trace) = engine.filter_debug(&data, &expr, &options).unwrap();
        assert_eq!(plain, traced);
        assert_eq!(trace.total, 2);
        assert_eq!(trace.matched, 1);
        assert_eq!(trace.records.len(), 2);
        assert!(trace.records[0].matched);
        assert!(!trace.records[1].matched);
        assert!(trace.records[0].root.elapsed.is_some());
    }

    #[test]
    fn test_registered_operator_usable_in_expression() {
        let mut engine = FilterEngine::new();
        engine.register_operator(
            "$isEven",
            OperatorFamily::Custom,
            Arc::new(|actual, operand, _ctx| {
                let Some(want) = operand.as_bool() else {
                    return false;
                };
                actual
                    .and_then(Value::as_i64)
                    .map(|n| (n % 2 == 0) == want)
                    .unwrap_or(false)
            }),
        );
        let data: Vec<Value> = (1..=4).map(|i| json!({"n": i})).collect();
        let results = engine
            .filter(&data, &json!({"n": {"$isEven": true}}), &Default::default())
            .unwrap();
        assert_eq!(results, vec![json!({"n": 2}), json!({"n": 4})]);
    }
}
