//! Raw expression validation.
//!
//! Turns an untrusted `serde_json::Value` into a checked [`Expression`],
//! rejecting unknown operator keys, malformed operands, out-of-range
//! coordinates and over-deep nesting before any record is touched. Pure
//! function, no side effects.
//!
//! Shorthand is resolved here, once: a bare value becomes a `Literal`
//! equality, a bare array becomes `AnyOf`, and a plain nested object is
//! flattened into dot-path field conditions. The matcher never re-inspects
//! value shapes.

use serde_json::Value;

use crate::error::{FilterError, FilterResult};
use crate::ops::geo::GeoPoint;
use crate::ops::OperatorRegistry;
use crate::options::FilterOptions;
use crate::value::safe_regex;

use super::ast::{ConditionValue, Expression, OperatorCond};

/// Validate a raw expression against the given options and registry.
///
/// Depth counts logical nesting and nested plain-object levels; the top
/// level is depth 1.
pub fn validate(
    raw: &Value,
    options: &FilterOptions,
    registry: &OperatorRegistry,
) -> FilterResult<Expression> {
    let validator = Validator {
        registry,
        max_depth: options.max_depth,
    };
    validator.expression(raw, 1)
}

fn invalid(msg: impl Into<String>) -> FilterError {
    FilterError::InvalidExpression(msg.into())
}

struct Validator<'a> {
    registry: &'a OperatorRegistry,
    max_depth: u8,
}

impl Validator<'_> {
    fn check_depth(&self, depth: u8) -> FilterResult<()> {
        if depth > self.max_depth {
            return Err(FilterError::MaxDepthExceeded {
                max: self.max_depth,
            });
        }
        Ok(())
    }

    fn expression(&self, raw: &Value, depth: u8) -> FilterResult<Expression> {
        self.check_depth(depth)?;
        let obj = raw
            .as_object()
            .ok_or_else(|| invalid(format!("expression must be an object, got {}", raw)))?;
        if obj.is_empty() {
            return Ok(Expression::match_all());
        }

        // Multiple top-level keys are implicitly ANDed
        let mut subs = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            subs.push(self.entry(key, value, depth)?);
        }
        Ok(if subs.len() == 1 {
            subs.pop().unwrap()
        } else {
            Expression::And(subs)
        })
    }

    fn entry(&self, key: &str, value: &Value, depth: u8) -> FilterResult<Expression> {
        match key {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| invalid(format!("{} requires an array operand", key)))?;
                let subs = arr
                    .iter()
                    .map(|e| self.expression(e, depth + 1))
                    .collect::<FilterResult<Vec<_>>>()?;
                Ok(if key == "$and" {
                    Expression::And(subs)
                } else {
                    Expression::Or(subs)
                })
            }
            "$not" => Ok(Expression::Not(Box::new(
                self.expression(value, depth + 1)?,
            ))),
            _ if key.starts_with('$') => Err(invalid(format!(
                "operator {} cannot appear at expression level",
                key
            ))),
            _ => self.field(key, value, depth),
        }
    }

    /// Validate one field condition. `path` is the dot-path accumulated so
    /// far; nested plain objects extend it.
    fn field(&self, path: &str, value: &Value, depth: u8) -> FilterResult<Expression> {
        self.check_depth(depth)?;
        match value {
            // Bare array shorthand: OR over set membership
            Value::Array(vals) => Ok(Expression::Field {
                path: path.to_string(),
                condition: ConditionValue::AnyOf(vals.clone()),
            }),
            Value::Object(map) if !map.is_empty() => {
                let has_ops = map.keys().any(|k| k.starts_with('$'));
                if !has_ops {
                    // Plain nested object: flatten into dot-path conditions
                    let mut subs = Vec::with_capacity(map.len());
                    for (k, v) in map {
                        subs.push(self.field(&format!("{}.{}", path, k), v, depth + 1)?);
                    }
                    return Ok(if subs.len() == 1 {
                        subs.pop().unwrap()
                    } else {
                        Expression::And(subs)
                    });
                }

                // Operator map; plain keys mixed in are nested conditions
                let mut ops = Vec::new();
                let mut nested = Vec::new();
                for (k, v) in map {
                    if k.starts_with('$') {
                        self.operator(k, v)?;
                        ops.push(OperatorCond {
                            key: k.clone(),
                            operand: v.clone(),
                        });
                    } else {
                        nested.push(self.field(&format!("{}.{}", path, k), v, depth + 1)?);
                    }
                }
                let op_expr = Expression::Field {
                    path: path.to_string(),
                    condition: ConditionValue::Operators(ops),
                };
                if nested.is_empty() {
                    Ok(op_expr)
                } else {
                    nested.insert(0, op_expr);
                    Ok(Expression::And(nested))
                }
            }
            // Bare value shorthand (includes the empty object)
            _ => Ok(Expression::Field {
                path: path.to_string(),
                condition: ConditionValue::Literal(value.clone()),
            }),
        }
    }

    /// Operand shape check for one operator key
    fn operator(&self, key: &str, operand: &Value) -> FilterResult<()> {
        match key {
            "$eq" | "$ne" => Ok(()),
            "$gt" | "$gte" | "$lt" | "$lte" => {
                if operand.is_number() || operand.is_string() {
                    Ok(())
                } else {
                    Err(invalid(format!(
                        "{} requires a number or string operand, got {}",
                        key, operand
                    )))
                }
            }
            "$exists" | "$isWeekday" | "$isWeekend" => {
                if operand.is_boolean() {
                    Ok(())
                } else {
                    Err(invalid(format!("{} requires a boolean operand", key)))
                }
            }
            "$in" | "$nin" | "$all" => {
                if operand.is_array() {
                    Ok(())
                } else {
                    Err(invalid(format!("{} requires an array operand", key)))
                }
            }
            "$size" => {
                if operand.as_u64().is_some() {
                    Ok(())
                } else {
                    Err(invalid("$size requires a non-negative integer operand"))
                }
            }
            "$contains" | "$startsWith" | "$endsWith" | "$like" => {
                if operand.is_string() {
                    Ok(())
                } else {
                    Err(invalid(format!("{} requires a string operand", key)))
                }
            }
            "$regex" => {
                let pattern = operand
                    .as_str()
                    .ok_or_else(|| invalid("$regex requires a string operand"))?;
                safe_regex(pattern, false).map(|_| ())
            }
            "$near" => self.near_operand(operand),
            "$geoBox" => self.geo_box_operand(operand),
            "$geoPolygon" => self.geo_polygon_operand(operand),
            "$recent" | "$upcoming" => duration_operand(key, operand),
            "$dayOfWeek" => match operand.as_u64() {
                Some(d) if d <= 6 => Ok(()),
                _ => Err(invalid("$dayOfWeek requires an integer between 0 and 6")),
            },
            "$timeOfDay" => time_of_day_operand(operand),
            "$age" => age_operand(operand),
            _ => {
                if self.registry.contains(key) {
                    // Registered custom operator; operand shape is its own
                    // concern
                    Ok(())
                } else {
                    Err(invalid(format!("unknown operator {}", key)))
                }
            }
        }
    }

    fn near_operand(&self, operand: &Value) -> FilterResult<()> {
        let obj = operand
            .as_object()
            .ok_or_else(|| invalid("$near requires an object operand"))?;
        let center = obj
            .get("center")
            .ok_or_else(|| invalid("$near requires a center point"))?;
        valid_point_operand("$near center", center)?;
        match obj.get("maxDistanceMeters").and_then(Value::as_f64) {
            Some(d) if d >= 0.0 => {}
            _ => return Err(invalid("$near requires a non-negative maxDistanceMeters")),
        }
        if let Some(min) = obj.get("minDistanceMeters") {
            match min.as_f64() {
                Some(d) if d >= 0.0 => {}
                _ => return Err(invalid("$near minDistanceMeters must be non-negative")),
            }
        }
        Ok(())
    }

    fn geo_box_operand(&self, operand: &Value) -> FilterResult<()> {
        let obj = operand
            .as_object()
            .ok_or_else(|| invalid("$geoBox requires an object operand"))?;
        for corner in ["southwest", "northeast"] {
            let point = obj
                .get(corner)
                .ok_or_else(|| invalid(format!("$geoBox requires a {} point", corner)))?;
            valid_point_operand(&format!("$geoBox {}", corner), point)?;
        }
        Ok(())
    }

    fn geo_polygon_operand(&self, operand: &Value) -> FilterResult<()> {
        let arr = operand
            .as_array()
            .ok_or_else(|| invalid("$geoPolygon requires an array of points"))?;
        if arr.len() < 3 {
            return Err(invalid("$geoPolygon requires at least 3 vertices"));
        }
        for (i, v) in arr.iter().enumerate() {
            valid_point_operand(&format!("$geoPolygon vertex {}", i), v)?;
        }
        Ok(())
    }
}

fn valid_point_operand(what: &str, value: &Value) -> FilterResult<()> {
    let point = GeoPoint::from_value(value)
        .ok_or_else(|| invalid(format!("{} is not a valid point: {}", what, value)))?;
    if !point.is_valid() {
        return Err(invalid(format!(
            "{} coordinates out of range: lat {}, lng {}",
            what, point.lat, point.lng
        )));
    }
    Ok(())
}

fn duration_operand(key: &str, operand: &Value) -> FilterResult<()> {
    let obj = operand
        .as_object()
        .ok_or_else(|| invalid(format!("{} requires a duration object", key)))?;
    let mut any = false;
    for unit in ["days", "hours", "minutes"] {
        if let Some(v) = obj.get(unit) {
            if v.as_u64().is_none() {
                return Err(invalid(format!(
                    "{} {} must be a non-negative integer",
                    key, unit
                )));
            }
            any = true;
        }
    }
    if !any {
        return Err(invalid(format!(
            "{} requires at least one of days, hours, minutes",
            key
        )));
    }
    Ok(())
}

fn time_of_day_operand(operand: &Value) -> FilterResult<()> {
    let obj = operand
        .as_object()
        .ok_or_else(|| invalid("$timeOfDay requires an object operand"))?;
    for bound in ["start", "end"] {
        match obj.get(bound).and_then(Value::as_u64) {
            Some(h) if h <= 23 => {}
            _ => {
                return Err(invalid(format!(
                    "$timeOfDay {} must be an hour between 0 and 23",
                    bound
                )))
            }
        }
    }
    Ok(())
}

fn age_operand(operand: &Value) -> FilterResult<()> {
    let obj = operand
        .as_object()
        .ok_or_else(|| invalid("$age requires an object operand"))?;
    let mut any = false;
    for bound in ["min", "max"] {
        if let Some(v) = obj.get(bound) {
            if v.as_u64().is_none() {
                return Err(invalid(format!(
                    "$age {} must be a non-negative integer",
                    bound
                )));
            }
            any = true;
        }
    }
    if !any {
        return Err(invalid("$age requires at least one of min, max"));
    }
    if let Some(unit) = obj.get("unit") {
        match unit.as_str() {
            Some("years") | Some("months") | Some("days") => {}
            _ => return Err(invalid("$age unit must be years, months or days")),
        }
    }
    Ok(())
}
