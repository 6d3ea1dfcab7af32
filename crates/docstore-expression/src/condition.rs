//! Evaluation of resolved condition trees against an item.
//!
//! Comparisons are deliberately lenient: a missing attribute or a
//! type-mismatched pair of operands makes the comparison false instead of
//! erroring. Structural failures (ill-typed function operands, unresolved
//! placeholders) still surface as errors.

use std::cmp::Ordering;

use docstore_model::{parse_number, AttributeValue, Item};
use tracing::trace;

use crate::ast::{Comparator, ConditionExpression, Predicate, Value};
use crate::error::ExpressionError;
use crate::value::{calculate_value, item_path_value, nth_arg, CalculateValueCaller};

/// Recursively evaluate a resolved condition tree against `item`.
///
/// # Errors
///
/// Returns [`ExpressionError::TypeMismatch`] for ill-typed predicate
/// operands and [`ExpressionError::Internal`] if an unresolved placeholder
/// survived resolution. Missing attributes and mismatched comparison types
/// are not errors; they make the enclosing comparison false.
pub fn eval_condition_expression(
    expr: &ConditionExpression,
    caller: CalculateValueCaller,
    item: Option<&Item>,
) -> Result<bool, ExpressionError> {
    let result = eval_node(expr, caller, item)?;
    trace!(%caller, result, "evaluated condition expression");
    Ok(result)
}

fn eval_node(
    expr: &ConditionExpression,
    caller: CalculateValueCaller,
    item: Option<&Item>,
) -> Result<bool, ExpressionError> {
    match expr {
        ConditionExpression::Comparison { op, left, right } => {
            let (Some(left), Some(right)) =
                (eval_operand(left, caller, item)?, eval_operand(right, caller, item)?)
            else {
                return Ok(false);
            };
            Ok(compare(*op, &left, &right))
        }
        ConditionExpression::Between { value, low, high } => {
            let (Some(value), Some(low), Some(high)) = (
                eval_operand(value, caller, item)?,
                eval_operand(low, caller, item)?,
                eval_operand(high, caller, item)?,
            ) else {
                return Ok(false);
            };
            Ok(compare(Comparator::Ge, &value, &low) && compare(Comparator::Le, &value, &high))
        }
        ConditionExpression::In { value, list } => {
            let Some(value) = eval_operand(value, caller, item)? else {
                return Ok(false);
            };
            for candidate in list {
                if let Some(candidate) = eval_operand(candidate, caller, item)?
                    && compare(Comparator::Eq, &value, &candidate)
                {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        ConditionExpression::FunctionPredicate { name, args } => {
            eval_predicate(*name, args, caller, item)
        }
        ConditionExpression::And(left, right) => {
            Ok(eval_node(left, caller, item)? && eval_node(right, caller, item)?)
        }
        ConditionExpression::Or(left, right) => {
            Ok(eval_node(left, caller, item)? || eval_node(right, caller, item)?)
        }
        ConditionExpression::Not(inner) => Ok(!eval_node(inner, caller, item)?),
        ConditionExpression::Parenthesized(inner) => eval_node(inner, caller, item),
    }
}

/// Evaluate a comparison operand, mapping a missing attribute to `None`
/// rather than an error.
fn eval_operand(
    value: &Value,
    caller: CalculateValueCaller,
    item: Option<&Item>,
) -> Result<Option<AttributeValue>, ExpressionError> {
    match calculate_value(value, caller, item) {
        Ok(v) => Ok(Some(v)),
        Err(ExpressionError::MissingAttribute { .. }) => Ok(None),
        Err(other) => Err(other),
    }
}

fn compare(op: Comparator, left: &AttributeValue, right: &AttributeValue) -> bool {
    match op {
        Comparator::Eq => values_equal(left, right),
        Comparator::Ne => !values_equal(left, right),
        Comparator::Lt | Comparator::Le | Comparator::Gt | Comparator::Ge => {
            let Some(ordering) = compare_ord(left, right) else {
                return false;
            };
            match op {
                Comparator::Lt => ordering == Ordering::Less,
                Comparator::Le => ordering != Ordering::Greater,
                Comparator::Gt => ordering == Ordering::Greater,
                Comparator::Ge => ordering != Ordering::Less,
                Comparator::Eq | Comparator::Ne => unreachable!("handled above"),
            }
        }
    }
}

/// Equality by value rather than by representation: number pairs compare
/// numerically ("5.0" equals "5"), number sets by numeric membership, and
/// lists and maps recurse so nested numbers get the same treatment. All
/// other pairs fall back to structural equality.
fn values_equal(left: &AttributeValue, right: &AttributeValue) -> bool {
    match (left, right) {
        (AttributeValue::N(a), AttributeValue::N(b)) => match (parse_number(a), parse_number(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => a == b,
        },
        (AttributeValue::Ns(a), AttributeValue::Ns(b)) => {
            a.len() == b.len()
                && a.iter().all(|element| match parse_number(element) {
                    Ok(parsed) => b
                        .iter()
                        .any(|other| parse_number(other).is_ok_and(|p| p == parsed)),
                    Err(_) => b.contains(element),
                })
        }
        (AttributeValue::L(a), AttributeValue::L(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (AttributeValue::M(a), AttributeValue::M(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
        }
        _ => left == right,
    }
}

/// Ordering is defined for strings, numbers (by numeric value), and binary
/// blobs. Everything else, including mismatched types, is unordered.
fn compare_ord(left: &AttributeValue, right: &AttributeValue) -> Option<Ordering> {
    match (left, right) {
        (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.cmp(b)),
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            let a = parse_number(a).ok()?;
            let b = parse_number(b).ok()?;
            Some(a.cmp(&b))
        }
        (AttributeValue::B(a), AttributeValue::B(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn eval_predicate(
    name: Predicate,
    args: &[Value],
    caller: CalculateValueCaller,
    item: Option<&Item>,
) -> Result<bool, ExpressionError> {
    match name {
        Predicate::AttributeExists => {
            let path = predicate_path(name, nth_arg(name, args, 0)?)?;
            Ok(item_path_value(path, item).is_some())
        }
        Predicate::AttributeNotExists => {
            let path = predicate_path(name, nth_arg(name, args, 0)?)?;
            Ok(item_path_value(path, item).is_none())
        }
        Predicate::AttributeType => {
            let expected = calculate_value(nth_arg(name, args, 1)?, caller, item)?;
            let Some(expected) = expected.as_s() else {
                return Err(ExpressionError::type_mismatch(format!(
                    "attribute_type() second argument must be a string, found {}",
                    expected.type_descriptor()
                )));
            };
            if !KNOWN_TYPE_TAGS.contains(&expected) {
                return Err(ExpressionError::type_mismatch(format!(
                    "attribute_type() does not recognize type '{expected}'"
                )));
            }
            let path = predicate_path(name, nth_arg(name, args, 0)?)?;
            let Some(actual) = item_path_value(path, item) else {
                return Ok(false);
            };
            Ok(actual.type_descriptor() == expected)
        }
        Predicate::BeginsWith => {
            let (Some(operand), Some(prefix)) = (
                eval_operand(nth_arg(name, args, 0)?, caller, item)?,
                eval_operand(nth_arg(name, args, 1)?, caller, item)?,
            ) else {
                return Ok(false);
            };
            match (&operand, &prefix) {
                (AttributeValue::S(s), AttributeValue::S(p)) => Ok(s.starts_with(p.as_str())),
                (AttributeValue::B(b), AttributeValue::B(p)) => Ok(b.starts_with(p)),
                _ => {
                    if matches!(prefix, AttributeValue::S(_) | AttributeValue::B(_)) {
                        Ok(false)
                    } else {
                        Err(ExpressionError::type_mismatch(format!(
                            "begins_with() second argument must be a string or binary, found {}",
                            prefix.type_descriptor()
                        )))
                    }
                }
            }
        }
        Predicate::Contains => {
            let (Some(haystack), Some(needle)) = (
                eval_operand(nth_arg(name, args, 0)?, caller, item)?,
                eval_operand(nth_arg(name, args, 1)?, caller, item)?,
            ) else {
                return Ok(false);
            };
            Ok(contains(&haystack, &needle))
        }
    }
}

const KNOWN_TYPE_TAGS: [&str; 10] = ["S", "N", "B", "SS", "NS", "BS", "BOOL", "NULL", "L", "M"];

fn predicate_path<'a>(name: Predicate, arg: &'a Value) -> Result<&'a crate::ast::Path, ExpressionError> {
    match arg {
        Value::PathRef(path) => Ok(path),
        _ => Err(ExpressionError::type_mismatch(format!(
            "{name}() requires an attribute path argument"
        ))),
    }
}

fn contains(haystack: &AttributeValue, needle: &AttributeValue) -> bool {
    match (haystack, needle) {
        (AttributeValue::S(s), AttributeValue::S(sub)) => s.contains(sub.as_str()),
        (AttributeValue::Ss(set), AttributeValue::S(element)) => set.contains(element),
        (AttributeValue::Ns(set), AttributeValue::N(element)) => {
            let Ok(element) = parse_number(element) else {
                return false;
            };
            set.iter()
                .any(|e| parse_number(e).is_ok_and(|parsed| parsed == element))
        }
        (AttributeValue::Bs(set), AttributeValue::B(element)) => set.contains(element),
        (AttributeValue::L(list), needle) => list.iter().any(|e| values_equal(e, needle)),
        _ => false,
    }
}

/// True when any path reference in the tree starts at `attribute_name`.
/// Used for read-dependency analysis before a write.
#[must_use]
pub fn condition_expression_on(expr: &ConditionExpression, attribute_name: &str) -> bool {
    let mut found = false;
    for_condition_expression_on(expr, |root| {
        if root == attribute_name {
            found = true;
        }
    });
    found
}

/// Invoke `callback` once per path-reference occurrence with that
/// reference's top-level attribute name. The same name is reported once per
/// occurrence, so callbacks must tolerate repeats.
pub fn for_condition_expression_on(expr: &ConditionExpression, mut callback: impl FnMut(&str)) {
    walk_condition(expr, &mut callback);
}

fn walk_condition(expr: &ConditionExpression, callback: &mut dyn FnMut(&str)) {
    match expr {
        ConditionExpression::Comparison { left, right, .. } => {
            walk_value(left, callback);
            walk_value(right, callback);
        }
        ConditionExpression::Between { value, low, high } => {
            walk_value(value, callback);
            walk_value(low, callback);
            walk_value(high, callback);
        }
        ConditionExpression::In { value, list } => {
            walk_value(value, callback);
            for candidate in list {
                walk_value(candidate, callback);
            }
        }
        ConditionExpression::FunctionPredicate { args, .. } => {
            for arg in args {
                walk_value(arg, callback);
            }
        }
        ConditionExpression::And(left, right) | ConditionExpression::Or(left, right) => {
            walk_condition(left, callback);
            walk_condition(right, callback);
        }
        ConditionExpression::Not(inner) | ConditionExpression::Parenthesized(inner) => {
            walk_condition(inner, callback);
        }
    }
}

fn walk_value(value: &Value, callback: &mut dyn FnMut(&str)) {
    match value {
        Value::Literal(_) | Value::ValueRef(_) => {}
        Value::PathRef(path) => callback(path.root()),
        Value::FunctionCall { args, .. } => {
            for arg in args {
                walk_value(arg, callback);
            }
        }
        Value::Arithmetic { left, right, .. } => {
            walk_value(left, callback);
            walk_value(right, callback);
        }
    }
}
