//! End-to-end tests of the parse -> resolve -> evaluate pipeline, driving
//! the engine the way the API layer does: items arrive in wire-form JSON,
//! dictionaries come from the request, and all expressions of one request
//! share a single pair of usage sets.

use std::collections::{HashMap, HashSet};
use std::sync::Once;

use docstore_expression::{
    calculate_set_rhs, calculate_value, condition_expression_on, eval_condition_expression,
    parse_condition_expression, parse_update_expression, resolve_condition_expression,
    resolve_update_expression, verify_all_used, CalculateValueCaller, ExpressionError,
    PlaceholderKind, SetRhsOp,
};
use docstore_model::{validate_value, AttributeValue, Item};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn wire_item(json: &str) -> Item {
    serde_json::from_str(json).unwrap()
}

fn values(pairs: &[(&str, AttributeValue)]) -> HashMap<String, AttributeValue> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

fn n(text: &str) -> AttributeValue {
    AttributeValue::N(text.to_owned())
}

/// Resolve and evaluate a standalone condition against an item.
fn check(
    input: &str,
    dict: &HashMap<String, AttributeValue>,
    item: Option<&Item>,
) -> Result<bool, ExpressionError> {
    let mut expr = parse_condition_expression(input)?;
    let mut used_names = HashSet::new();
    let mut used_values = HashSet::new();
    resolve_condition_expression(&mut expr, None, Some(dict), &mut used_names, &mut used_values)?;
    verify_all_used(Some(dict), &used_values, PlaceholderKind::Value)?;
    eval_condition_expression(&expr, CalculateValueCaller::ConditionExpressionAlone, item)
}

#[test]
fn test_should_evaluate_conditions_against_wire_form_item() {
    init_tracing();
    let item = wire_item(
        r#"{"x": {"N": "5"}, "y": {"M": {"z": {"L": [{"N": "1"}, {"N": "2"}, {"N": "3"}]}}}}"#,
    );

    assert!(check("y.z[1] = :two", &values(&[(":two", n("2"))]), Some(&item)).unwrap());
    assert!(check(
        "x BETWEEN :lo AND :hi",
        &values(&[(":lo", n("1")), (":hi", n("10"))]),
        Some(&item)
    )
    .unwrap());
    assert!(check("attribute_not_exists(missing)", &values(&[]), Some(&item)).unwrap());
}

#[test]
fn test_should_apply_full_update_pipeline() {
    init_tracing();
    let previous = wire_item(
        r#"{
            "counter": {"N": "2.50"},
            "tags": {"SS": ["red", "green"]},
            "old": {"BOOL": true}
        }"#,
    );
    let dict = values(&[
        (":inc", n("0.25")),
        (":more", AttributeValue::Ss(vec!["blue".to_owned()])),
        (":rm", AttributeValue::Ss(vec!["green".to_owned()])),
    ]);
    let mut update = parse_update_expression(
        "SET counter = counter + :inc ADD tags :more DELETE extras :rm REMOVE old",
    )
    .unwrap();
    let mut used_names = HashSet::new();
    let mut used_values = HashSet::new();
    resolve_update_expression(
        &mut update,
        None,
        Some(&dict),
        &mut used_names,
        &mut used_values,
    )
    .unwrap();
    verify_all_used(Some(&dict), &used_values, PlaceholderKind::Value).unwrap();

    let mut next = previous.clone();
    for clause in &update.set {
        let value = calculate_value(
            &clause.value,
            CalculateValueCaller::UpdateExpression,
            Some(&previous),
        )
        .unwrap();
        next.insert(clause.path.root().to_owned(), value);
    }
    for path in &update.remove {
        next.remove(path.root());
    }
    for clause in &update.add {
        if let Some(value) =
            calculate_set_rhs(SetRhsOp::Add, &clause.path, &clause.rhs, Some(&previous)).unwrap()
        {
            next.insert(clause.path.root().to_owned(), value);
        }
    }
    for clause in &update.delete {
        match calculate_set_rhs(SetRhsOp::Delete, &clause.path, &clause.rhs, Some(&previous))
            .unwrap()
        {
            Some(value) => {
                next.insert(clause.path.root().to_owned(), value);
            }
            None => {
                next.remove(clause.path.root());
            }
        }
    }

    // Exact decimal arithmetic, never a float approximation.
    assert_eq!(next.get("counter"), Some(&n("2.75")));
    assert_eq!(
        next.get("tags"),
        Some(&AttributeValue::Ss(vec![
            "red".to_owned(),
            "green".to_owned(),
            "blue".to_owned()
        ]))
    );
    // DELETE on an attribute the item never had leaves it absent.
    assert!(!next.contains_key("extras"));
    assert!(!next.contains_key("old"));
}

#[test]
fn test_should_substitute_placeholders_before_conflict_check() {
    init_tracing();
    let names: HashMap<String, String> = [("#c".to_owned(), "counter".to_owned())].into();
    let dict = values(&[(":v", n("1"))]);

    // `#c` and `counter.sub` conflict once the placeholder resolves.
    let mut update = parse_update_expression("SET #c = :v REMOVE counter.sub").unwrap();
    let err = resolve_update_expression(
        &mut update,
        Some(&names),
        Some(&dict),
        &mut HashSet::new(),
        &mut HashSet::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ExpressionError::PathConflict { .. }));
}

#[test]
fn test_should_reject_unused_dictionary_entries_per_request() {
    init_tracing();
    // One request, two expressions, one shared usage set. `:limit` is used
    // by the condition only, so the request-level check passes; `:spare`
    // is used by neither, so it fails.
    let dict = values(&[
        (":new", n("1")),
        (":limit", n("10")),
        (":spare", n("99")),
    ]);
    let mut update = parse_update_expression("SET x = :new").unwrap();
    let mut condition = parse_condition_expression("x < :limit").unwrap();
    let mut used_names = HashSet::new();
    let mut used_values = HashSet::new();
    resolve_update_expression(&mut update, None, Some(&dict), &mut used_names, &mut used_values)
        .unwrap();
    resolve_condition_expression(
        &mut condition,
        None,
        Some(&dict),
        &mut used_names,
        &mut used_values,
    )
    .unwrap();

    let err = verify_all_used(Some(&dict), &used_values, PlaceholderKind::Value).unwrap_err();
    assert!(matches!(
        err,
        ExpressionError::UnusedPlaceholder { name, .. } if name == ":spare"
    ));
}

#[test]
fn test_should_prefer_existing_value_in_if_not_exists() {
    init_tracing();
    let dict = values(&[(":default", n("0"))]);
    let mut update = parse_update_expression("SET x = if_not_exists(x, :default)").unwrap();
    resolve_update_expression(
        &mut update,
        None,
        Some(&dict),
        &mut HashSet::new(),
        &mut HashSet::new(),
    )
    .unwrap();

    let existing = wire_item(r#"{"x": {"N": "41"}}"#);
    let kept = calculate_value(
        &update.set[0].value,
        CalculateValueCaller::UpdateExpression,
        Some(&existing),
    )
    .unwrap();
    assert_eq!(kept, n("41"));

    let empty: Item = HashMap::new();
    let defaulted = calculate_value(
        &update.set[0].value,
        CalculateValueCaller::UpdateExpression,
        Some(&empty),
    )
    .unwrap();
    assert_eq!(defaulted, n("0"));
}

#[test]
fn test_should_treat_absent_numeric_add_as_zero() {
    init_tracing();
    let dict = values(&[(":five", n("5"))]);
    let mut update = parse_update_expression("ADD counter :five").unwrap();
    resolve_update_expression(
        &mut update,
        None,
        Some(&dict),
        &mut HashSet::new(),
        &mut HashSet::new(),
    )
    .unwrap();

    let empty: Item = HashMap::new();
    let clause = &update.add[0];
    let result =
        calculate_set_rhs(SetRhsOp::Add, &clause.path, &clause.rhs, Some(&empty)).unwrap();
    assert_eq!(result, Some(n("5")));
}

#[test]
fn test_should_report_attributes_read_by_condition() {
    init_tracing();
    let expr = parse_condition_expression("attribute_exists(foo) AND size(bar) > :v").unwrap();
    assert!(condition_expression_on(&expr, "foo"));
    assert!(condition_expression_on(&expr, "bar"));
    assert!(!condition_expression_on(&expr, "baz"));
}

#[test]
fn test_should_validate_wire_values_before_deserialization() {
    init_tracing();
    let two_tags: serde_json::Value = serde_json::json!({"S": "x", "N": "1"});
    assert!(validate_value(&two_tags, "ExpressionAttributeValues").is_err());
    let empty_set: serde_json::Value = serde_json::json!({"NS": []});
    assert!(validate_value(&empty_set, "ExpressionAttributeValues").is_err());
    let fine: serde_json::Value = serde_json::json!({"L": [{"S": "ok"}, {"N": "1"}]});
    validate_value(&fine, "ExpressionAttributeValues").unwrap();
}

#[test]
fn test_should_fail_arithmetic_on_non_numeric_operand() {
    init_tracing();
    let dict = values(&[
        (":a", n("2.50")),
        (":b", AttributeValue::S("0.25".to_owned())),
    ]);
    let mut update = parse_update_expression("SET total = :a + :b").unwrap();
    resolve_update_expression(
        &mut update,
        None,
        Some(&dict),
        &mut HashSet::new(),
        &mut HashSet::new(),
    )
    .unwrap();
    let err = calculate_value(
        &update.set[0].value,
        CalculateValueCaller::UpdateExpression,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ExpressionError::TypeMismatch { .. }));
}
