//! Condition expression evaluator

use serde_json::Value;

use super::ast::{CompareOp, Expression, Literal};
use crate::waypoint::workflow::state::WorkflowState;

/// Evaluate a condition expression against workflow state.
///
/// A missing field compares equal to `null`. Ordering operators are
/// false unless both sides are numbers.
pub fn evaluate(expr: &Expression, state: &WorkflowState) -> bool {
    match expr {
        Expression::True => true,
        Expression::False => false,
        Expression::Compare { path, op, right } => compare(state.get_path(path), *op, right),
        Expression::And(left, right) => evaluate(left, state) && evaluate(right, state),
        Expression::Or(left, right) => evaluate(left, state) || evaluate(right, state),
        Expression::Not(inner) => !evaluate(inner, state),
    }
}

fn compare(left: Option<&Value>, op: CompareOp, right: &Literal) -> bool {
    match op {
        CompareOp::Eq => matches_literal(left.unwrap_or(&Value::Null), right),
        CompareOp::NotEq => !matches_literal(left.unwrap_or(&Value::Null), right),
        CompareOp::Gt => ordered(left, right, |a, b| a > b),
        CompareOp::Gte => ordered(left, right, |a, b| a >= b),
        CompareOp::Lt => ordered(left, right, |a, b| a < b),
        CompareOp::Lte => ordered(left, right, |a, b| a <= b),
        CompareOp::Contains => contains(left, right),
    }
}

fn matches_literal(value: &Value, literal: &Literal) -> bool {
    match (value, literal) {
        (Value::Null, Literal::Null) => true,
        (Value::String(s), Literal::String(expected)) => s == expected,
        (Value::Bool(b), Literal::Boolean(expected)) => b == expected,
        (Value::Number(n), Literal::Number(expected)) => n
            .as_f64()
            .is_some_and(|f| (f - expected).abs() < f64::EPSILON),
        _ => false,
    }
}

fn ordered(left: Option<&Value>, right: &Literal, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (left.and_then(Value::as_f64), right) {
        (Some(value), Literal::Number(bound)) => cmp(value, *bound),
        _ => false,
    }
}

fn contains(left: Option<&Value>, right: &Literal) -> bool {
    match (left, right) {
        (Some(Value::String(s)), Literal::String(needle)) => s.contains(needle.as_str()),
        (Some(Value::Array(items)), literal) => {
            items.iter().any(|item| matches_literal(item, literal))
        }
        (Some(Value::Object(map)), Literal::String(key)) => map.contains_key(key),
        _ => false,
    }
}
