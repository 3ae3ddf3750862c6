//! Geospatial and datetime operators through the public API.

use chrono::{Duration, Utc};
use docsift::{filter, FilterError};
use serde_json::{json, Value};

fn ids(results: &[Value]) -> Vec<i64> {
    results.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

#[test]
fn test_near_distance_thresholds() {
    // ~1113 m east of the origin along the equator
    let data = vec![json!({"id": 1, "location": {"lat": 0.0, "lng": 0.01}})];

    let wide = json!({"location": {"$near": {
        "center": {"lat": 0.0, "lng": 0.0},
        "maxDistanceMeters": 2000.0,
    }}});
    assert_eq!(ids(&filter(&data, &wide).unwrap()), vec![1]);

    let tight = json!({"location": {"$near": {
        "center": {"lat": 0.0, "lng": 0.0},
        "maxDistanceMeters": 500.0,
    }}});
    assert!(filter(&data, &tight).unwrap().is_empty());
}

#[test]
fn test_near_accepts_pair_points() {
    let data = vec![json!({"id": 1, "location": [48.8566, 2.3522]})];
    let expr = json!({"location": {"$near": {
        "center": {"lat": 48.8584, "lng": 2.2945},
        "maxDistanceMeters": 10_000.0,
    }}});
    assert_eq!(ids(&filter(&data, &expr).unwrap()), vec![1]);
}

#[test]
fn test_geo_box() {
    let data = vec![
        json!({"id": 1, "location": {"lat": 40.7, "lng": -74.0}}),
        json!({"id": 2, "location": {"lat": 34.0, "lng": -118.2}}),
    ];
    let expr = json!({"location": {"$geoBox": {
        "southwest": {"lat": 40.0, "lng": -75.0},
        "northeast": {"lat": 41.0, "lng": -73.0},
    }}});
    assert_eq!(ids(&filter(&data, &expr).unwrap()), vec![1]);
}

#[test]
fn test_geo_polygon_containment() {
    let square = json!([
        {"lat": 0.0, "lng": 0.0},
        {"lat": 0.0, "lng": 2.0},
        {"lat": 2.0, "lng": 2.0},
        {"lat": 2.0, "lng": 0.0},
    ]);
    let data = vec![
        json!({"id": 1, "location": {"lat": 1.0, "lng": 1.0}}),
        json!({"id": 2, "location": {"lat": 3.0, "lng": 3.0}}),
    ];
    let expr = json!({"location": {"$geoPolygon": square}});
    assert_eq!(ids(&filter(&data, &expr).unwrap()), vec![1]);
}

#[test]
fn test_out_of_range_coordinates_rejected() {
    let data = vec![json!({"id": 1, "location": {"lat": 0.0, "lng": 0.0}})];
    let expr = json!({"location": {"$near": {
        "center": {"lat": 95.0, "lng": 0.0},
        "maxDistanceMeters": 1000.0,
    }}});
    assert!(matches!(
        filter(&data, &expr).unwrap_err(),
        FilterError::InvalidExpression(_)
    ));
}

#[test]
fn test_invalid_record_point_never_matches() {
    let data = vec![
        json!({"id": 1, "location": {"lat": 95.0, "lng": 0.0}}),
        json!({"id": 2, "location": "not a point"}),
        json!({"id": 3}),
    ];
    let expr = json!({"location": {"$near": {
        "center": {"lat": 0.0, "lng": 0.0},
        "maxDistanceMeters": 1e9,
    }}});
    assert!(filter(&data, &expr).unwrap().is_empty());
}

#[test]
fn test_recent_and_upcoming() {
    let data = vec![
        json!({"id": 1, "ts": (Utc::now() - Duration::hours(1)).to_rfc3339()}),
        json!({"id": 2, "ts": (Utc::now() - Duration::days(10)).to_rfc3339()}),
        json!({"id": 3, "ts": (Utc::now() + Duration::days(2)).to_rfc3339()}),
        json!({"id": 4, "ts": "not a date"}),
    ];
    assert_eq!(
        ids(&filter(&data, &json!({"ts": {"$recent": {"days": 7}}})).unwrap()),
        vec![1]
    );
    assert_eq!(
        ids(&filter(&data, &json!({"ts": {"$upcoming": {"days": 7}}})).unwrap()),
        vec![3]
    );
}

#[test]
fn test_age_bounds() {
    let data = vec![
        json!({"id": 1, "dob": "1990-05-01"}),
        json!({"id": 2, "dob": "2015-05-01"}),
        json!({"id": 3}),
    ];
    assert_eq!(
        ids(&filter(&data, &json!({"dob": {"$age": {"min": 18}}})).unwrap()),
        vec![1]
    );
    assert_eq!(
        ids(&filter(&data, &json!({"dob": {"$age": {"max": 17}}})).unwrap()),
        vec![2]
    );
}

#[test]
fn test_datetime_operand_validation() {
    let data = vec![json!({"id": 1, "ts": "2024-01-01"})];
    assert!(filter(&data, &json!({"ts": {"$recent": {}}})).is_err());
    assert!(filter(&data, &json!({"ts": {"$dayOfWeek": 9}})).is_err());
    assert!(filter(&data, &json!({"ts": {"$timeOfDay": {"start": 9}}})).is_err());
    assert!(filter(&data, &json!({"dob": {"$age": {"min": 18, "unit": "decades"}}})).is_err());
}

#[test]
fn test_day_of_week_against_known_dates() {
    // Midday UTC stays on the same calendar day in any local offset
    // within ±11h, keeping the weekday stable for this test.
    let data = vec![
        json!({"id": 1, "ts": "2024-06-03T12:00:00Z"}), // Monday
        json!({"id": 2, "ts": "2024-06-08T12:00:00Z"}), // Saturday
    ];
    assert_eq!(
        ids(&filter(&data, &json!({"ts": {"$isWeekday": true}})).unwrap()),
        vec![1]
    );
    assert_eq!(
        ids(&filter(&data, &json!({"ts": {"$isWeekend": true}})).unwrap()),
        vec![2]
    );
    assert_eq!(
        ids(&filter(&data, &json!({"ts": {"$dayOfWeek": 6}})).unwrap()),
        vec![2]
    );
}
