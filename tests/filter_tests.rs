//! End-to-end filtering behavior through the public API.

use docsift::{filter, filter_with_options, FilterError, FilterOptions, SortKey};
use serde_json::{json, Value};

fn people() -> Vec<Value> {
    vec![
        json!({"name": "Alice", "age": 30}),
        json!({"name": "Bob", "age": 25}),
    ]
}

fn products() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Laptop", "price": 1200, "category": "Electronics"}),
        json!({"id": 2, "name": "Novel", "price": 15, "category": "Books"}),
        json!({"id": 3, "name": "Headphones", "price": 150, "category": "Electronics"}),
        json!({"id": 4, "name": "Textbook", "price": 120, "category": "Books"}),
        json!({"id": 5, "name": "Monitor", "price": 450, "category": "Electronics"}),
    ]
}

#[test]
fn test_simple_operator_filter() {
    let results = filter(&people(), &json!({"age": {"$gte": 26}})).unwrap();
    assert_eq!(results, vec![json!({"name": "Alice", "age": 30})]);
}

#[test]
fn test_combined_constraints_preserve_source_order() {
    let results = filter(
        &products(),
        &json!({
            "price": {"$gte": 100, "$lte": 500},
            "category": {"$in": ["Electronics", "Books"]},
        }),
    )
    .unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![3, 4, 5]);
}

#[test]
fn test_unknown_operator_is_rejected_up_front() {
    let err = filter(&people(), &json!({"age": {"$unknownOp": 5}})).unwrap_err();
    assert!(matches!(err, FilterError::InvalidExpression(_)));
}

#[test]
fn test_idempotence() {
    let expr = json!({"price": {"$gte": 100}});
    let once = filter(&products(), &expr).unwrap();
    let twice = filter(&once, &expr).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_array_or_shorthand_equivalence() {
    let shorthand = filter(&products(), &json!({"category": ["Electronics", "Books"]})).unwrap();
    let explicit = filter(
        &products(),
        &json!({"category": {"$in": ["Electronics", "Books"]}}),
    )
    .unwrap();
    assert_eq!(shorthand, explicit);
    assert_eq!(shorthand.len(), 5);
}

#[test]
fn test_empty_expression_matches_everything() {
    assert_eq!(filter(&products(), &json!({})).unwrap().len(), 5);
}

#[test]
fn test_literal_shorthand_wildcards() {
    let results = filter(&products(), &json!({"name": "%book%"})).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Textbook");

    let negated = filter(&products(), &json!({"category": "!books"})).unwrap();
    assert_eq!(negated.len(), 3);
}

#[test]
fn test_null_literal_matches_missing_field() {
    let data = vec![
        json!({"id": 1, "deleted_at": null}),
        json!({"id": 2, "deleted_at": "2024-01-01"}),
        json!({"id": 3}),
    ];
    let results = filter(&data, &json!({"deleted_at": null})).unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn test_dot_path_resolution() {
    let data = vec![
        json!({"id": 1, "user": {"address": {"city": "Paris"}}}),
        json!({"id": 2, "user": {"address": {"city": "Lyon"}}}),
        json!({"id": 3, "user": {}}),
    ];
    let results = filter(&data, &json!({"user.address.city": "paris"})).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], 1);

    // Missing intermediate segment satisfies $ne
    let results = filter(&data, &json!({"user.address.city": {"$ne": "Paris"}})).unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_mixed_operator_and_plain_keys_in_one_operand() {
    let data = vec![
        json!({"id": 1, "stats": {"count": 3, "max": 9}}),
        json!({"id": 2, "stats": {"count": 7, "max": 9}}),
        json!({"id": 3}),
    ];
    // $-keys dispatch on the field itself; plain keys become nested
    // dot-path conditions
    let results = filter(&data, &json!({"stats": {"$exists": true, "count": 3}})).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], 1);
}

#[test]
fn test_logical_composition() {
    let results = filter(
        &products(),
        &json!({"$or": [
            {"price": {"$lt": 100}},
            {"$and": [{"category": "Electronics"}, {"price": {"$lt": 500}}]},
        ]}),
    )
    .unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![2, 3, 5]);

    let results = filter(&products(), &json!({"$not": {"category": "Electronics"}})).unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn test_no_cross_type_coercion() {
    let data = vec![json!({"n": 30}), json!({"n": "30"})];
    let results = filter(&data, &json!({"n": 30})).unwrap();
    assert_eq!(results, vec![json!({"n": 30})]);
}

#[test]
fn test_case_sensitivity_option() {
    let data = vec![json!({"name": "Alice"})];
    assert_eq!(filter(&data, &json!({"name": "alice"})).unwrap().len(), 1);

    let strict = FilterOptions {
        case_sensitive: true,
        ..Default::default()
    };
    assert!(filter_with_options(&data, &json!({"name": "alice"}), &strict)
        .unwrap()
        .is_empty());
}

#[test]
fn test_order_by_is_stable() {
    let data = vec![json!({"a": 1, "id": 1}), json!({"a": 1, "id": 2})];
    let options = FilterOptions {
        order_by: vec![SortKey::asc("a")],
        ..Default::default()
    };
    let results = filter_with_options(&data, &json!({}), &options).unwrap();
    assert_eq!(results[0]["id"], 1);
    assert_eq!(results[1]["id"], 2);
}

#[test]
fn test_order_by_and_limit() {
    let options = FilterOptions {
        order_by: vec![SortKey::desc("price")],
        limit: Some(2),
        ..Default::default()
    };
    let results = filter_with_options(&products(), &json!({}), &options).unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 5]);
}

#[test]
fn test_option_validation_fails_fast() {
    let options = FilterOptions {
        max_depth: 0,
        ..Default::default()
    };
    let err = filter_with_options(&people(), &json!({}), &options).unwrap_err();
    assert!(matches!(err, FilterError::InvalidOptions(_)));
}

#[test]
fn test_max_depth_enforced() {
    let deep = json!({"$and": [{"$or": [{"$not": {"a": 1}}]}]});
    let err = filter(&people(), &deep).unwrap_err();
    assert!(matches!(err, FilterError::MaxDepthExceeded { max: 3 }));

    let relaxed = FilterOptions {
        max_depth: 5,
        ..Default::default()
    };
    assert!(filter_with_options(&people(), &deep, &relaxed).is_ok());
}
