//! Structural deep equality over [`Value`].
//!
//! Categories are tried in a fixed precedence: lists, nil, strings, iterable
//! containers, records, then a same-value-zero fallback. The iterable branch
//! compares iteration sequences positionally, so `Map`, `Set`, and `Buffer`
//! all share one generic path at the cost of making set and map equality
//! order-sensitive. That trade is part of the contract and is pinned by
//! tests; do not "fix" it by sorting.

use crate::value::Value;
use im::HashMap;

/// Answers whether two values are structurally equivalent.
///
/// Total and pure: never fails, never mutates.
///
/// # Examples
///
/// ```rust
/// use thunklet::{deep_equal, value::Value};
/// let a = Value::list([Value::Number(1.0), Value::from("x")]);
/// let b = Value::list([Value::Number(1.0), Value::from("x")]);
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &Value::Number(1.0)));
/// ```
pub fn deep_equal(left: &Value, right: &Value) -> bool {
    let left_is_list = matches!(left, Value::List(_));
    let right_is_list = matches!(right, Value::List(_));
    if left_is_list || right_is_list {
        return match (left, right) {
            (Value::List(a), Value::List(b)) => lists_equal(a, b),
            _ => false,
        };
    }

    if left.is_nil() || right.is_nil() {
        return same_value_zero(left, right);
    }

    let left_is_string = matches!(left, Value::String(_));
    let right_is_string = matches!(right, Value::String(_));
    if left_is_string || right_is_string {
        return same_value_zero(left, right);
    }

    match (sequence(left), sequence(right)) {
        (Some(a), Some(b)) => return sequences_equal(a, b),
        (None, None) => {}
        _ => return false,
    }

    let left_is_record = matches!(left, Value::Record(_));
    let right_is_record = matches!(right, Value::Record(_));
    if left_is_record || right_is_record {
        return match (left, right) {
            (Value::Record(a), Value::Record(b)) => records_equal(a, b),
            _ => false,
        };
    }

    same_value_zero(left, right)
}

/// Same-value-zero comparison: NaN equals NaN, +0 equals -0, otherwise
/// strict per-category equality. Values of different categories are never
/// equal.
pub fn same_value_zero(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}

fn lists_equal(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|(a, b)| deep_equal(a, b))
}

fn records_equal(left: &HashMap<String, Value>, right: &HashMap<String, Value>) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .all(|(key, value)| right.get(key).is_some_and(|other| deep_equal(value, other)))
}

/// The iteration sequence of an iterable container, or None for values with
/// no iteration capability. Map entries iterate as `[key, value]` pairs,
/// buffers as numbers.
fn sequence<'a>(value: &'a Value) -> Option<Box<dyn Iterator<Item = Value> + 'a>> {
    match value {
        Value::Set(items) => Some(Box::new(items.iter().cloned())),
        Value::Buffer(bytes) => Some(Box::new(bytes.iter().map(|b| Value::Number(*b as f64)))),
        Value::Map(entries) => Some(Box::new(
            entries
                .iter()
                .map(|(key, value)| Value::List(vec![key.clone(), value.clone()])),
        )),
        _ => None,
    }
}

fn sequences_equal(
    mut left: Box<dyn Iterator<Item = Value> + '_>,
    mut right: Box<dyn Iterator<Item = Value> + '_>,
) -> bool {
    loop {
        match (left.next(), right.next()) {
            (Some(a), Some(b)) => {
                if !deep_equal(&a, &b) {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}
