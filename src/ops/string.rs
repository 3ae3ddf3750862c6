//! String operators: `$contains`, `$startsWith`, `$endsWith`, `$like`,
//! `$regex`.
//!
//! All matching honors `case_sensitive` (default false). `$like` uses SQL
//! wildcard syntax (`%` = zero or more characters, `_` = exactly one).
//! Patterns compile through the shared regex LRU; an invalid or oversized
//! pattern never matches. A missing or non-string field fails every
//! operator here.

use std::sync::Arc;

use serde_json::Value;

use super::{EvalContext, OperatorFamily, OperatorRegistry};
use crate::value::wildcard_to_regex;

pub(crate) fn register(registry: &mut OperatorRegistry) {
    let fam = OperatorFamily::String;
    registry.register(
        "$contains",
        fam,
        Arc::new(|a, o, c| with_strings(a, o, c, |s, p| s.contains(p))),
    );
    registry.register(
        "$startsWith",
        fam,
        Arc::new(|a, o, c| with_strings(a, o, c, |s, p| s.starts_with(p))),
    );
    registry.register(
        "$endsWith",
        fam,
        Arc::new(|a, o, c| with_strings(a, o, c, |s, p| s.ends_with(p))),
    );
    registry.register("$like", fam, Arc::new(eval_like));
    registry.register("$regex", fam, Arc::new(eval_regex));
}

fn with_strings(
    actual: Option<&Value>,
    operand: &Value,
    ctx: &EvalContext,
    test: impl Fn(&str, &str) -> bool,
) -> bool {
    let (Some(Value::String(s)), Some(pattern)) = (actual, operand.as_str()) else {
        return false;
    };
    if ctx.options.case_sensitive {
        test(s, pattern)
    } else {
        test(&s.to_lowercase(), &pattern.to_lowercase())
    }
}

fn eval_like(actual: Option<&Value>, operand: &Value, ctx: &EvalContext) -> bool {
    let (Some(Value::String(s)), Some(pattern)) = (actual, operand.as_str()) else {
        return false;
    };
    let anchored = wildcard_to_regex(pattern);
    match ctx
        .regex_cache
        .get_or_compile(&anchored, !ctx.options.case_sensitive)
    {
        Some(re) => re.is_match(s),
        None => false,
    }
}

fn eval_regex(actual: Option<&Value>, operand: &Value, ctx: &EvalContext) -> bool {
    let (Some(Value::String(s)), Some(pattern)) = (actual, operand.as_str()) else {
        return false;
    };
    match ctx
        .regex_cache
        .get_or_compile(pattern, !ctx.options.case_sensitive)
    {
        Some(re) => re.is_match(s),
        None => false,
    }
}
