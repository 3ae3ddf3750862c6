//! Comparison operators: `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`,
//! `$exists`.
//!
//! Missing-field semantics: `$ne` treats a missing field as "not equal" and
//! matches; `$exists: false` matches a missing field; everything else fails
//! on missing. Ordering operators require mutually ordered types; a
//! mismatch is a non-match, never an error.

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

use super::{EvalContext, OperatorFamily, OperatorRegistry};
use crate::value::{try_compare, values_equal};

pub(crate) fn register(registry: &mut OperatorRegistry) {
    let fam = OperatorFamily::Comparison;
    registry.register("$eq", fam, Arc::new(eval_eq));
    registry.register("$ne", fam, Arc::new(eval_ne));
    registry.register("$gt", fam, Arc::new(|a, o, c| ordered(a, o, c, &[Ordering::Greater])));
    registry.register(
        "$gte",
        fam,
        Arc::new(|a, o, c| ordered(a, o, c, &[Ordering::Greater, Ordering::Equal])),
    );
    registry.register("$lt", fam, Arc::new(|a, o, c| ordered(a, o, c, &[Ordering::Less])));
    registry.register(
        "$lte",
        fam,
        Arc::new(|a, o, c| ordered(a, o, c, &[Ordering::Less, Ordering::Equal])),
    );
    registry.register("$exists", fam, Arc::new(eval_exists));
}

fn eval_eq(actual: Option<&Value>, operand: &Value, ctx: &EvalContext) -> bool {
    match actual {
        Some(v) => values_equal(v, operand, ctx.options.case_sensitive),
        // {field: {$eq: null}} matches a missing field, like a null literal
        None => operand.is_null(),
    }
}

fn eval_ne(actual: Option<&Value>, operand: &Value, ctx: &EvalContext) -> bool {
    !eval_eq(actual, operand, ctx)
}

fn ordered(
    actual: Option<&Value>,
    operand: &Value,
    ctx: &EvalContext,
    accept: &[Ordering],
) -> bool {
    match actual {
        Some(v) => try_compare(v, operand, ctx.options.case_sensitive)
            .map(|ord| accept.contains(&ord))
            .unwrap_or(false),
        None => false,
    }
}

fn eval_exists(actual: Option<&Value>, operand: &Value, _ctx: &EvalContext) -> bool {
    match operand.as_bool() {
        // An explicit null still counts as existing
        Some(want) => actual.is_some() == want,
        None => false,
    }
}
