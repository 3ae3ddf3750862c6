//! Value-level helpers shared by the validator, matcher and post-processor:
//! dot-path resolution, equality and ordering, wildcard translation, guarded
//! regex construction and datetime parsing.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{FilterError, FilterResult};

/// Maximum allowed regex pattern length to prevent DoS attacks
const MAX_REGEX_PATTERN_LEN: usize = 1024;

/// Maximum regex compiled size (1MB) to prevent memory exhaustion
const MAX_REGEX_SIZE: usize = 1 << 20;

/// Resolve a dot-delimited field path against a record.
///
/// Returns `None` when any intermediate segment is missing, so callers can
/// distinguish a missing field from an explicit JSON `null`. Numeric
/// segments index into arrays (`"items.0.name"`).
#[inline]
pub fn get_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for part in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Compare two strings honoring case sensitivity
#[inline]
pub fn strings_equal(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Strict equality: numbers compare numerically, strings honor case
/// sensitivity, everything else requires identical types. `'30'` never
/// equals `30`.
#[inline]
pub fn values_equal(left: &Value, right: &Value, case_sensitive: bool) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => strings_equal(a, b, case_sensitive),
        _ => left == right,
    }
}

/// Ordering for the `$gt`/`$gte`/`$lt`/`$lte` operators: both sides must be
/// mutually ordered (both numbers, or both strings, compared as datetimes
/// when both parse as such). A type mismatch yields `None`, never an error.
#[inline]
pub fn try_compare(left: &Value, right: &Value, case_sensitive: bool) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => {
            if let (Some(da), Some(db)) = (parse_datetime(left), parse_datetime(right)) {
                return Some(da.cmp(&db));
            }
            if case_sensitive {
                Some(a.as_str().cmp(b.as_str()))
            } else {
                Some(a.to_lowercase().cmp(&b.to_lowercase()))
            }
        }
        _ => None,
    }
}

/// Total ordering used by the post-processor's stable sort. Missing fields
/// are passed as `None` and sort before everything else, like JSON null.
#[inline]
pub fn compare_for_sort(a: Option<&Value>, b: Option<&Value>, case_sensitive: bool) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            if case_sensitive {
                x.cmp(y)
            } else {
                x.to_lowercase().cmp(&y.to_lowercase())
            }
        }
        // Mixed or unordered types keep their original relative order
        _ => Ordering::Equal,
    }
}

/// True when a literal string uses `%`/`_` wildcard syntax
#[inline]
pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains('%') || pattern.contains('_')
}

/// Translate a `%`/`_` wildcard pattern into an anchored regex. `%` matches
/// zero or more characters, `_` exactly one; regex metacharacters are
/// escaped.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut regex_pattern = String::with_capacity(pattern.len() + 2);
    regex_pattern.push('^');
    for c in pattern.chars() {
        match c {
            '%' => regex_pattern.push_str(".*"),
            '_' => regex_pattern.push('.'),
            '^' | '$' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
            | '\\' => {
                regex_pattern.push('\\');
                regex_pattern.push(c);
            }
            _ => regex_pattern.push(c),
        }
    }
    regex_pattern.push('$');
    regex_pattern
}

/// Create a regex with safety limits. The Rust regex crate is inherently
/// ReDoS-resistant (no backtracking), so the residual risk is memory: both
/// pattern length and compiled size are bounded.
pub fn safe_regex(pattern: &str, case_insensitive: bool) -> FilterResult<regex::Regex> {
    if pattern.len() > MAX_REGEX_PATTERN_LEN {
        return Err(FilterError::InvalidExpression(format!(
            "regex pattern too long: {} bytes (max {})",
            pattern.len(),
            MAX_REGEX_PATTERN_LEN
        )));
    }

    regex::RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .size_limit(MAX_REGEX_SIZE)
        .build()
        .map_err(|e| FilterError::InvalidExpression(format!("invalid regex pattern: {}", e)))
}

/// Parse a date value (millisecond timestamp or date string) into a UTC
/// instant. Tries RFC 3339 first, then `%Y-%m-%d %H:%M:%S`, then `%Y-%m-%d`.
pub fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .map(|dt| dt.and_utc())
                    .ok()
            })
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            }),
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?),
        _ => None,
    }
}
