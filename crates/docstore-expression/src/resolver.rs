//! In-place placeholder resolution.
//!
//! Resolution rewrites parsed trees so that no `#name` or `:value` token
//! survives: `#name` segments become literal attribute names, `:value`
//! references become [`Value::Literal`] nodes. Every dictionary lookup is
//! recorded in a caller-owned used set, so one pair of sets can span several
//! expressions of the same request; [`verify_all_used`] then rejects
//! dictionary entries nothing referenced.
//!
//! Resolving an update expression also checks its clause paths for overlap,
//! which is only decidable after `#name` substitution.

use std::collections::{HashMap, HashSet};

use docstore_model::AttributeValue;
use tracing::debug;

use crate::ast::{ConditionExpression, Path, PathOperator, UpdateExpression, Value};
use crate::error::{ExpressionError, PlaceholderKind};

/// Resolve all placeholders of an update expression in place, then check
/// that no two clauses act on the same or prefix-related paths.
///
/// # Errors
///
/// Returns [`ExpressionError::UndefinedPlaceholder`] for a `#name` or
/// `:value` token with no dictionary entry, and
/// [`ExpressionError::PathConflict`] when two clause paths overlap.
pub fn resolve_update_expression(
    expr: &mut UpdateExpression,
    names: Option<&HashMap<String, String>>,
    values: Option<&HashMap<String, AttributeValue>>,
    used_names: &mut HashSet<String>,
    used_values: &mut HashSet<String>,
) -> Result<(), ExpressionError> {
    for clause in &mut expr.set {
        resolve_path(&mut clause.path, names, used_names)?;
        resolve_value(&mut clause.value, names, values, used_names, used_values)?;
    }
    for path in &mut expr.remove {
        resolve_path(path, names, used_names)?;
    }
    for clause in &mut expr.add {
        resolve_path(&mut clause.path, names, used_names)?;
        resolve_value(&mut clause.rhs, names, values, used_names, used_values)?;
    }
    for clause in &mut expr.delete {
        resolve_path(&mut clause.path, names, used_names)?;
        resolve_value(&mut clause.rhs, names, values, used_names, used_values)?;
    }
    check_path_conflicts(expr)?;
    debug!(
        set = expr.set.len(),
        remove = expr.remove.len(),
        add = expr.add.len(),
        delete = expr.delete.len(),
        "resolved update expression"
    );
    Ok(())
}

/// Resolve all placeholders of a condition expression in place.
///
/// # Errors
///
/// Returns [`ExpressionError::UndefinedPlaceholder`] for a `#name` or
/// `:value` token with no dictionary entry.
pub fn resolve_condition_expression(
    expr: &mut ConditionExpression,
    names: Option<&HashMap<String, String>>,
    values: Option<&HashMap<String, AttributeValue>>,
    used_names: &mut HashSet<String>,
    used_values: &mut HashSet<String>,
) -> Result<(), ExpressionError> {
    match expr {
        ConditionExpression::Comparison { left, right, .. } => {
            resolve_value(left, names, values, used_names, used_values)?;
            resolve_value(right, names, values, used_names, used_values)
        }
        ConditionExpression::Between { value, low, high } => {
            resolve_value(value, names, values, used_names, used_values)?;
            resolve_value(low, names, values, used_names, used_values)?;
            resolve_value(high, names, values, used_names, used_values)
        }
        ConditionExpression::In { value, list } => {
            resolve_value(value, names, values, used_names, used_values)?;
            for candidate in list {
                resolve_value(candidate, names, values, used_names, used_values)?;
            }
            Ok(())
        }
        ConditionExpression::FunctionPredicate { args, .. } => {
            for arg in args {
                resolve_value(arg, names, values, used_names, used_values)?;
            }
            Ok(())
        }
        ConditionExpression::And(left, right) | ConditionExpression::Or(left, right) => {
            resolve_condition_expression(left, names, values, used_names, used_values)?;
            resolve_condition_expression(right, names, values, used_names, used_values)
        }
        ConditionExpression::Not(inner) | ConditionExpression::Parenthesized(inner) => {
            resolve_condition_expression(inner, names, values, used_names, used_values)
        }
    }
}

/// Resolve `#name` placeholders of a projection expression in place.
///
/// # Errors
///
/// Returns [`ExpressionError::UndefinedPlaceholder`] for a `#name` token
/// with no dictionary entry.
pub fn resolve_projection_expression(
    paths: &mut [Path],
    names: Option<&HashMap<String, String>>,
    used_names: &mut HashSet<String>,
) -> Result<(), ExpressionError> {
    for path in paths {
        resolve_path(path, names, used_names)?;
    }
    Ok(())
}

/// Check that every key of `dict` appears in `used`.
///
/// Reports the lexicographically first unused key, so the error is stable
/// regardless of hash ordering.
///
/// # Errors
///
/// Returns [`ExpressionError::UnusedPlaceholder`] naming the unused entry.
pub fn verify_all_used<V>(
    dict: Option<&HashMap<String, V>>,
    used: &HashSet<String>,
    kind: PlaceholderKind,
) -> Result<(), ExpressionError> {
    let Some(dict) = dict else {
        return Ok(());
    };
    let unused = dict
        .keys()
        .filter(|key| !used.contains(*key))
        .min()
        .cloned();
    match unused {
        Some(name) => Err(ExpressionError::UnusedPlaceholder { kind, name }),
        None => Ok(()),
    }
}

fn resolve_path(
    path: &mut Path,
    names: Option<&HashMap<String, String>>,
    used_names: &mut HashSet<String>,
) -> Result<(), ExpressionError> {
    if path.root.starts_with('#') {
        path.root = lookup_name(&path.root, names, used_names)?;
    }
    for op in &mut path.operators {
        if let PathOperator::Attribute(name) = op
            && name.starts_with('#')
        {
            *name = lookup_name(name, names, used_names)?;
        }
    }
    Ok(())
}

fn lookup_name(
    placeholder: &str,
    names: Option<&HashMap<String, String>>,
    used_names: &mut HashSet<String>,
) -> Result<String, ExpressionError> {
    let resolved = names.and_then(|dict| dict.get(placeholder)).ok_or_else(|| {
        ExpressionError::UndefinedPlaceholder {
            kind: PlaceholderKind::Name,
            name: placeholder.to_owned(),
        }
    })?;
    used_names.insert(placeholder.to_owned());
    Ok(resolved.clone())
}

fn resolve_value(
    value: &mut Value,
    names: Option<&HashMap<String, String>>,
    values: Option<&HashMap<String, AttributeValue>>,
    used_names: &mut HashSet<String>,
    used_values: &mut HashSet<String>,
) -> Result<(), ExpressionError> {
    match value {
        Value::Literal(_) => Ok(()),
        Value::ValueRef(name) => {
            let resolved = values.and_then(|dict| dict.get(name.as_str())).ok_or_else(
                || ExpressionError::UndefinedPlaceholder {
                    kind: PlaceholderKind::Value,
                    name: name.clone(),
                },
            )?;
            used_values.insert(name.clone());
            *value = Value::Literal(resolved.clone());
            Ok(())
        }
        Value::PathRef(path) => resolve_path(path, names, used_names),
        Value::FunctionCall { args, .. } => {
            for arg in args {
                resolve_value(arg, names, values, used_names, used_values)?;
            }
            Ok(())
        }
        Value::Arithmetic { left, right, .. } => {
            resolve_value(left, names, values, used_names, used_values)?;
            resolve_value(right, names, values, used_names, used_values)
        }
    }
}

fn check_path_conflicts(expr: &UpdateExpression) -> Result<(), ExpressionError> {
    let paths: Vec<&Path> = expr.clause_paths().collect();
    for (i, first) in paths.iter().enumerate() {
        for second in &paths[i + 1..] {
            if first.is_prefix_of(second) || second.is_prefix_of(first) {
                return Err(ExpressionError::PathConflict {
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }
    }
    Ok(())
}
