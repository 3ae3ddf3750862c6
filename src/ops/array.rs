//! Array operators: `$in`, `$nin`, `$all`, `$size`.
//!
//! `$in` matches when the field equals any operand value, or, when the
//! field is itself an array, when any element does. `$nin` is its negation
//! and is satisfied by a missing field.

use std::sync::Arc;

use serde_json::Value;

use super::{EvalContext, OperatorFamily, OperatorRegistry};
use crate::value::values_equal;

pub(crate) fn register(registry: &mut OperatorRegistry) {
    let fam = OperatorFamily::Array;
    registry.register("$in", fam, Arc::new(eval_in));
    registry.register("$nin", fam, Arc::new(|a, o, c| !eval_in(a, o, c)));
    registry.register("$all", fam, Arc::new(eval_all));
    registry.register("$size", fam, Arc::new(eval_size));
}

fn eval_in(actual: Option<&Value>, operand: &Value, ctx: &EvalContext) -> bool {
    let (Some(actual), Some(candidates)) = (actual, operand.as_array()) else {
        return false;
    };
    let case_sensitive = ctx.options.case_sensitive;
    match actual {
        Value::Array(elements) => elements
            .iter()
            .any(|e| candidates.iter().any(|c| values_equal(e, c, case_sensitive))),
        single => candidates
            .iter()
            .any(|c| values_equal(single, c, case_sensitive)),
    }
}

fn eval_all(actual: Option<&Value>, operand: &Value, ctx: &EvalContext) -> bool {
    let (Some(Value::Array(elements)), Some(required)) = (actual, operand.as_array()) else {
        return false;
    };
    required.iter().all(|r| {
        elements
            .iter()
            .any(|e| values_equal(e, r, ctx.options.case_sensitive))
    })
}

fn eval_size(actual: Option<&Value>, operand: &Value, _ctx: &EvalContext) -> bool {
    match (actual, operand.as_u64()) {
        (Some(Value::Array(elements)), Some(n)) => elements.len() as u64 == n,
        _ => false,
    }
}
