//! Recursive expression matcher.
//!
//! `matches` is total: given a validated expression it never fails, and any
//! operand an operator cannot interpret resolves to `false`. Logical nodes
//! short-circuit (`$and` stops at the first false, `$or` at the first true),
//! which also bounds trace size: skipped branches produce no trace nodes.
//!
//! Tracing and plain evaluation share one code path so the traced result can
//! never diverge from the untraced one.

use std::time::Instant;

use serde_json::Value;

use crate::debug::{TraceNode, TraceOpts};
use crate::expression::{ConditionValue, Expression};
use crate::ops::EvalContext;
use crate::value::{get_path, has_wildcards, strings_equal, values_equal, wildcard_to_regex};

/// Evaluate a validated expression against one record
pub(crate) fn matches(record: &Value, expr: &Expression, ctx: &EvalContext) -> bool {
    eval(record, expr, ctx, None).0
}

/// Evaluate with trace collection; returns the outcome and the trace tree
pub(crate) fn matches_traced(
    record: &Value,
    expr: &Expression,
    ctx: &EvalContext,
    opts: TraceOpts,
) -> (bool, TraceNode) {
    let (result, node) = eval(record, expr, ctx, Some(opts));
    (result, node.expect("trace requested"))
}

fn eval(
    record: &Value,
    expr: &Expression,
    ctx: &EvalContext,
    trace: Option<TraceOpts>,
) -> (bool, Option<TraceNode>) {
    let started = trace
        .filter(|t| t.timings)
        .map(|_| Instant::now());
    let mut children = Vec::new();

    let result = match expr {
        Expression::And(subs) => {
            let mut all = true;
            for sub in subs {
                let (r, node) = eval(record, sub, ctx, trace);
                children.extend(node);
                if !r {
                    all = false;
                    break;
                }
            }
            all
        }
        Expression::Or(subs) => {
            let mut any = false;
            for sub in subs {
                let (r, node) = eval(record, sub, ctx, trace);
                children.extend(node);
                if r {
                    any = true;
                    break;
                }
            }
            any
        }
        Expression::Not(sub) => {
            let (r, node) = eval(record, sub, ctx, trace);
            children.extend(node);
            !r
        }
        Expression::Field { path, condition } => eval_field(record, path, condition, ctx),
    };

    let node = trace.map(|_| TraceNode {
        label: expr.describe(),
        result,
        elapsed: started.map(|s| s.elapsed()),
        children,
    });
    (result, node)
}

fn eval_field(record: &Value, path: &str, condition: &ConditionValue, ctx: &EvalContext) -> bool {
    let actual = get_path(record, path);
    match condition {
        ConditionValue::Literal(literal) => literal_matches(actual, literal, ctx),
        ConditionValue::AnyOf(candidates) => any_of(actual, candidates, ctx),
        ConditionValue::Operators(ops) => ops.iter().all(|op| match ctx.registry.get(&op.key) {
            Some(f) => f(actual, &op.operand, ctx),
            // Unreachable after validation; an unknown key is a non-match
            None => false,
        }),
    }
}

/// Bare value shorthand. String literals support `%`/`_` wildcards and a
/// leading `!` negation; `null` matches a missing field.
fn literal_matches(actual: Option<&Value>, literal: &Value, ctx: &EvalContext) -> bool {
    if let Value::String(pattern) = literal {
        let (negate, pattern) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, pattern.as_str()),
        };
        let matched = match actual {
            Some(Value::String(s)) => {
                if has_wildcards(pattern) {
                    let anchored = wildcard_to_regex(pattern);
                    ctx.regex_cache
                        .get_or_compile(&anchored, !ctx.options.case_sensitive)
                        .map(|re| re.is_match(s))
                        .unwrap_or(false)
                } else {
                    strings_equal(s, pattern, ctx.options.case_sensitive)
                }
            }
            _ => false,
        };
        return negate != matched;
    }

    match actual {
        Some(v) => values_equal(v, literal, ctx.options.case_sensitive),
        None => literal.is_null(),
    }
}

/// Bare array shorthand: OR over set membership, same semantics as `$in`
fn any_of(actual: Option<&Value>, candidates: &[Value], ctx: &EvalContext) -> bool {
    let Some(actual) = actual else {
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
