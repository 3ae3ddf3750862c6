//! Validated expression AST.

use serde_json::Value;

/// A validated filter expression. Logical nodes short-circuit; field nodes
/// dispatch into the operator registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Every sub-expression must match (stops at first false)
    And(Vec<Expression>),
    /// Any sub-expression may match (stops at first true)
    Or(Vec<Expression>),
    /// Negation of one sub-expression
    Not(Box<Expression>),
    /// A condition on one dot-path field
    Field {
        path: String,
        condition: ConditionValue,
    },
}

/// The resolved operand of a field condition. Shorthand is resolved during
/// validation, never during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// Bare value shorthand: equality, with `%`/`_` wildcards and leading
    /// `!` negation for strings
    Literal(Value),
    /// Bare array shorthand: OR over set membership
    AnyOf(Vec<Value>),
    /// Explicit `$`-operator map; multiple operators are implicitly ANDed
    Operators(Vec<OperatorCond>),
}

/// One `$`-operator applied to a field
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorCond {
    pub key: String,
    pub operand: Value,
}

impl Expression {
    /// Expression that matches every record (empty expression object)
    pub fn match_all() -> Self {
        Expression::And(Vec::new())
    }

    /// Compact human-readable label, used for debug trace nodes
    pub fn describe(&self) -> String {
        match self {
            Expression::And(subs) => format!("$and ({})", subs.len()),
            Expression::Or(subs) => format!("$or ({})", subs.len()),
            Expression::Not(_) => "$not".to_string(),
            Expression::Field { path, condition } => match condition {
                ConditionValue::Literal(v) => format!("{} = {}", path, v),
                ConditionValue::AnyOf(vals) => format!("{} in {} values", path, vals.len()),
                ConditionValue::Operators(ops) => {
                    let keys: Vec<&str> = ops.iter().map(|o| o.key.as_str()).collect();
                    format!("{} {}", path, keys.join(" "))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe() {
        let expr = Expression::Field {
            path: "age".to_string(),
            condition: ConditionValue::Operators(vec![OperatorCond {
                key: "$gte".to_string(),
                operand: json!(26),
            }]),
        };
        assert_eq!(expr.describe(), "age $gte");

        let expr = Expression::Field {
            path: "name".to_string(),
            condition: ConditionValue::Literal(json!("Alice")),
        };
        assert_eq!(expr.describe(), "name = \"Alice\"");
    }
}
