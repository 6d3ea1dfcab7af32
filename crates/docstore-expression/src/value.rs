//! Evaluation of value expressions against an item.
//!
//! Everything here assumes resolution has already run: a [`Value::ValueRef`]
//! reaching evaluation is an engine bug and reported as
//! [`ExpressionError::Internal`].

use bigdecimal::BigDecimal;
use std::fmt;

use docstore_model::{check_range, format_number, parse_number, AttributeValue, Item};
use tracing::trace;

use crate::ast::{ArithmeticOp, Path, PathOperator, Value, ValueFunction};
use crate::error::ExpressionError;

/// Which expression kind a value is being calculated for. The kind gates
/// which functions are allowed: `if_not_exists`/`list_append` belong to
/// update expressions, `size` to condition expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculateValueCaller {
    /// The right-hand side of an update clause.
    UpdateExpression,
    /// A condition evaluated next to an update (e.g. a conditional write).
    ConditionExpression,
    /// A condition evaluated on its own (e.g. a filtered read).
    ConditionExpressionAlone,
}

impl CalculateValueCaller {
    /// True for the update-expression caller.
    #[must_use]
    pub fn is_update(self) -> bool {
        matches!(self, Self::UpdateExpression)
    }
}

impl fmt::Display for CalculateValueCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Both condition callers read the same to users; the distinction
        // only matters for internal gating.
        match self {
            Self::UpdateExpression => write!(f, "UpdateExpression"),
            Self::ConditionExpression | Self::ConditionExpressionAlone => {
                write!(f, "ConditionExpression")
            }
        }
    }
}

/// Look up the value a path points at inside an item, descending maps by
/// name and lists by index. Returns `None` when any step is absent or the
/// intermediate value has the wrong shape.
pub(crate) fn item_path_value<'a>(
    path: &Path,
    item: Option<&'a Item>,
) -> Option<&'a AttributeValue> {
    let mut current = item?.get(path.root())?;
    for op in &path.operators {
        current = match op {
            PathOperator::Attribute(name) => current.as_m()?.get(name)?,
            PathOperator::Index(idx) => current.as_l()?.get(*idx)?,
        };
    }
    Some(current)
}

/// Calculate a resolved value expression against `item`.
///
/// # Errors
///
/// Returns [`ExpressionError::MissingAttribute`] when a path reference does
/// not resolve, [`ExpressionError::TypeMismatch`] for ill-typed operands or
/// a function used in the wrong expression kind, and
/// [`ExpressionError::Internal`] if the tree still holds an unresolved
/// placeholder.
pub fn calculate_value(
    value: &Value,
    caller: CalculateValueCaller,
    item: Option<&Item>,
) -> Result<AttributeValue, ExpressionError> {
    match value {
        Value::Literal(v) => Ok(v.clone()),
        Value::ValueRef(name) => Err(ExpressionError::Internal {
            message: format!("unresolved value placeholder {name} reached evaluation"),
        }),
        Value::PathRef(path) => item_path_value(path, item).cloned().ok_or_else(|| {
            ExpressionError::MissingAttribute {
                path: path.to_string(),
            }
        }),
        Value::FunctionCall { name, args } => calculate_function(*name, args, caller, item),
        Value::Arithmetic { op, left, right } => {
            let left = calculate_value(left, caller, item)?;
            let right = calculate_value(right, caller, item)?;
            calculate_arithmetic(*op, &left, &right)
        }
    }
}

/// Fetch a function argument by position, reporting a hand-built tree with
/// too few arguments as an internal error instead of panicking.
pub(crate) fn nth_arg<'a>(
    name: impl fmt::Display,
    args: &'a [Value],
    index: usize,
) -> Result<&'a Value, ExpressionError> {
    args.get(index).ok_or_else(|| ExpressionError::Internal {
        message: format!("{name}() is missing argument {index}"),
    })
}

fn calculate_function(
    name: ValueFunction,
    args: &[Value],
    caller: CalculateValueCaller,
    item: Option<&Item>,
) -> Result<AttributeValue, ExpressionError> {
    match name {
        ValueFunction::IfNotExists => {
            if !caller.is_update() {
                return Err(ExpressionError::type_mismatch(format!(
                    "if_not_exists() is not allowed in {caller}"
                )));
            }
            let Value::PathRef(path) = nth_arg(name, args, 0)? else {
                return Err(ExpressionError::Internal {
                    message: "if_not_exists() first argument is not a path".to_owned(),
                });
            };
            match item_path_value(path, item) {
                Some(existing) => Ok(existing.clone()),
                None => calculate_value(nth_arg(name, args, 1)?, caller, item),
            }
        }
        ValueFunction::ListAppend => {
            if !caller.is_update() {
                return Err(ExpressionError::type_mismatch(format!(
                    "list_append() is not allowed in {caller}"
                )));
            }
            let first = calculate_value(nth_arg(name, args, 0)?, caller, item)?;
            let second = calculate_value(nth_arg(name, args, 1)?, caller, item)?;
            match (first, second) {
                (AttributeValue::L(mut head), AttributeValue::L(tail)) => {
                    head.extend(tail);
                    Ok(AttributeValue::L(head))
                }
                (first, second) => Err(ExpressionError::type_mismatch(format!(
                    "list_append() requires two lists, found {} and {}",
                    first.type_descriptor(),
                    second.type_descriptor()
                ))),
            }
        }
        ValueFunction::Size => {
            if caller.is_update() {
                return Err(ExpressionError::type_mismatch(format!(
                    "size() is not allowed in {caller}"
                )));
            }
            let operand = calculate_value(nth_arg(name, args, 0)?, caller, item)?;
            let len = match &operand {
                AttributeValue::S(s) => s.len(),
                AttributeValue::B(b) => b.len(),
                AttributeValue::Ss(v) => v.len(),
                AttributeValue::Ns(v) => v.len(),
                AttributeValue::Bs(v) => v.len(),
                AttributeValue::L(v) => v.len(),
                AttributeValue::M(m) => m.len(),
                other => {
                    return Err(ExpressionError::type_mismatch(format!(
                        "size() is not defined for type {}",
                        other.type_descriptor()
                    )));
                }
            };
            Ok(AttributeValue::N(len.to_string()))
        }
    }
}

fn calculate_arithmetic(
    op: ArithmeticOp,
    left: &AttributeValue,
    right: &AttributeValue,
) -> Result<AttributeValue, ExpressionError> {
    let (Some(left_text), Some(right_text)) = (left.as_n(), right.as_n()) else {
        return Err(ExpressionError::type_mismatch(format!(
            "'{op}' requires two numbers, found {} and {}",
            left.type_descriptor(),
            right.type_descriptor()
        )));
    };
    let left = parse_number(left_text)?;
    let right = parse_number(right_text)?;
    let result = match op {
        ArithmeticOp::Plus => left + right,
        ArithmeticOp::Minus => left - right,
    };
    check_range(&result)?;
    Ok(AttributeValue::N(format_number(&result)))
}

/// Which mutation a set/number right-hand side is being calculated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetRhsOp {
    /// An ADD clause.
    Add,
    /// A DELETE clause.
    Delete,
}

/// Calculate the value an ADD or DELETE clause leaves at `path`.
///
/// Returns `Ok(None)` when the attribute should end up absent: a DELETE on
/// an already-absent path, or a DELETE that removes a set's last element.
/// ADD always produces a value.
///
/// # Errors
///
/// Returns [`ExpressionError::TypeMismatch`] when the operand type does not
/// fit the operation or the existing value.
pub fn calculate_set_rhs(
    op: SetRhsOp,
    path: &Path,
    rhs: &Value,
    item: Option<&Item>,
) -> Result<Option<AttributeValue>, ExpressionError> {
    let operand = calculate_value(rhs, CalculateValueCaller::UpdateExpression, item)?;
    let current = item_path_value(path, item);
    let result = match op {
        SetRhsOp::Add => apply_add(path, current, operand).map(Some),
        SetRhsOp::Delete => apply_delete(path, current, operand),
    }?;
    trace!(?op, path = %path, produced = result.is_some(), "calculated set mutation");
    Ok(result)
}

fn apply_add(
    path: &Path,
    current: Option<&AttributeValue>,
    operand: AttributeValue,
) -> Result<AttributeValue, ExpressionError> {
    match (current, operand) {
        (None, AttributeValue::N(n)) => {
            parse_number(&n)?;
            Ok(AttributeValue::N(n))
        }
        (Some(AttributeValue::N(existing)), AttributeValue::N(n)) => {
            let sum = parse_number(existing)? + parse_number(&n)?;
            check_range(&sum)?;
            Ok(AttributeValue::N(format_number(&sum)))
        }
        (None, operand @ (AttributeValue::Ss(_) | AttributeValue::Ns(_) | AttributeValue::Bs(_))) => {
            Ok(operand)
        }
        (Some(AttributeValue::Ss(existing)), AttributeValue::Ss(additions)) => {
            let mut merged = existing.clone();
            for element in additions {
                if !merged.contains(&element) {
                    merged.push(element);
                }
            }
            Ok(AttributeValue::Ss(merged))
        }
        (Some(AttributeValue::Ns(existing)), AttributeValue::Ns(additions)) => {
            let mut merged = existing.clone();
            for element in additions {
                let parsed = parse_number(&element)?;
                if !number_set_contains(&merged, &parsed)? {
                    merged.push(element);
                }
            }
            Ok(AttributeValue::Ns(merged))
        }
        (Some(AttributeValue::Bs(existing)), AttributeValue::Bs(additions)) => {
            let mut merged = existing.clone();
            for element in additions {
                if !merged.contains(&element) {
                    merged.push(element);
                }
            }
            Ok(AttributeValue::Bs(merged))
        }
        (current, operand) => Err(ExpressionError::type_mismatch(format!(
            "ADD on '{path}' does not apply to {} and {}",
            current.map_or("an absent attribute", AttributeValue::type_descriptor),
            operand.type_descriptor()
        ))),
    }
}

fn apply_delete(
    path: &Path,
    current: Option<&AttributeValue>,
    operand: AttributeValue,
) -> Result<Option<AttributeValue>, ExpressionError> {
    if !matches!(
        operand,
        AttributeValue::Ss(_) | AttributeValue::Ns(_) | AttributeValue::Bs(_)
    ) {
        return Err(ExpressionError::type_mismatch(format!(
            "DELETE on '{path}' requires a set operand, found {}",
            operand.type_descriptor()
        )));
    }
    // Deleting from an absent attribute is a no-op.
    let Some(current) = current else {
        return Ok(None);
    };
    let remaining = match (current, operand) {
        (AttributeValue::Ss(existing), AttributeValue::Ss(removals)) => AttributeValue::Ss(
            existing
                .iter()
                .filter(|e| !removals.contains(e))
                .cloned()
                .collect(),
        ),
        (AttributeValue::Ns(existing), AttributeValue::Ns(removals)) => {
            let parsed: Vec<BigDecimal> = removals
                .iter()
                .map(|e| parse_number(e))
                .collect::<Result<_, _>>()?;
            let mut kept = Vec::with_capacity(existing.len());
            for element in existing {
                if !parsed.contains(&parse_number(element)?) {
                    kept.push(element.clone());
                }
            }
            AttributeValue::Ns(kept)
        }
        (AttributeValue::Bs(existing), AttributeValue::Bs(removals)) => AttributeValue::Bs(
            existing
                .iter()
                .filter(|e| !removals.contains(e))
                .cloned()
                .collect(),
        ),
        (current, operand) => {
            return Err(ExpressionError::type_mismatch(format!(
                "DELETE on '{path}' does not apply to {} and {}",
                current.type_descriptor(),
                operand.type_descriptor()
            )));
        }
    };
    // A set must never be empty; deleting the last element drops the
    // attribute instead.
    let empty = match &remaining {
        AttributeValue::Ss(v) => v.is_empty(),
        AttributeValue::Ns(v) => v.is_empty(),
        AttributeValue::Bs(v) => v.is_empty(),
        _ => false,
    };
    Ok(if empty { None } else { Some(remaining) })
}

/// Membership test on a number set by numeric value, so "1" and "1.0" count
/// as the same element.
pub(crate) fn number_set_contains(
    set: &[String],
    candidate: &BigDecimal,
) -> Result<bool, ExpressionError> {
    for element in set {
        if parse_number(element)? == *candidate {
            return Ok(true);
        }
    }
    Ok(false)
}
