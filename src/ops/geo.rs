//! Geospatial operators: `$near`, `$geoBox`, `$geoPolygon`.
//!
//! Points are `{lat, lng}` with lat in [-90, 90] and lng in [-180, 180];
//! an invalid point never matches any geospatial operator. `$geoBox` does
//! not wrap across the ±180° antimeridian: a box whose `southwest.lng` is
//! greater than `northeast.lng` matches nothing. `$geoPolygon` behavior on
//! self-intersecting polygons is unspecified.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EvalContext, OperatorFamily, OperatorRegistry};

/// Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Parse a geo point from JSON.
    /// Supports `{ "lat": 48.8, "lng": 2.3 }` (also `lon`/`latitude`/
    /// `longitude` keys) or a `[lat, lng]` pair.
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(obj) = value.as_object() {
            let lat = obj.get("lat").or(obj.get("latitude"))?.as_f64()?;
            let lng = obj
                .get("lng")
                .or(obj.get("lon"))
                .or(obj.get("longitude"))?
                .as_f64()?;
            return Some(Self::new(lat, lng));
        }

        if let Some(arr) = value.as_array() {
            if arr.len() == 2 {
                return Some(Self::new(arr[0].as_f64()?, arr[1].as_f64()?));
            }
        }

        None
    }

    /// Coordinate-range check; invalid points never match
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance in meters via the spherical law of cosines
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    // Clamp against floating-point drift before acos
    let central = (phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * delta_lng.cos())
        .clamp(-1.0, 1.0);

    EARTH_RADIUS_M * central.acos()
}

/// Ray-casting point-in-polygon test (odd-crossing rule) over the ordered
/// vertex list, with lng as x and lat as y
pub fn point_in_polygon(point: &GeoPoint, vertices: &[GeoPoint]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = (vertices[i].lng, vertices[i].lat);
        let (xj, yj) = (vertices[j].lng, vertices[j].lat);
        let crosses = (yi > point.lat) != (yj > point.lat);
        if crosses && point.lng < (xj - xi) * (point.lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub(crate) fn register(registry: &mut OperatorRegistry) {
    let fam = OperatorFamily::Geospatial;
    registry.register("$near", fam, Arc::new(eval_near));
    registry.register("$geoBox", fam, Arc::new(eval_geo_box));
    registry.register("$geoPolygon", fam, Arc::new(eval_geo_polygon));
}

fn valid_point(value: Option<&Value>) -> Option<GeoPoint> {
    GeoPoint::from_value(value?).filter(GeoPoint::is_valid)
}

fn eval_near(actual: Option<&Value>, operand: &Value, _ctx: &EvalContext) -> bool {
    let Some(point) = valid_point(actual) else {
        return false;
    };
    let Some(obj) = operand.as_object() else {
        return false;
    };
    let Some(center) = obj.get("center").and_then(|c| valid_point(Some(c))) else {
        return false;
    };
    let Some(max_distance) = obj.get("maxDistanceMeters").and_then(Value::as_f64) else {
        return false;
    };
    let min_distance = obj
        .get("minDistanceMeters")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let distance = distance_meters(&point, &center);
    distance <= max_distance && distance >= min_distance
}

fn eval_geo_box(actual: Option<&Value>, operand: &Value, _ctx: &EvalContext) -> bool {
    let Some(point) = valid_point(actual) else {
        return false;
    };
    let Some(obj) = operand.as_object() else {
        return false;
    };
    let (Some(sw), Some(ne)) = (
        obj.get("southwest").and_then(|v| valid_point(Some(v))),
        obj.get("northeast").and_then(|v| valid_point(Some(v))),
    ) else {
        return false;
    };

    point.lat >= sw.lat && point.lat <= ne.lat && point.lng >= sw.lng && point.lng <= ne.lng
}

fn eval_geo_polygon(actual: Option<&Value>, operand: &Value, _ctx: &EvalContext) -> bool {
    let Some(point) = valid_point(actual) else {
        return false;
    };
    let Some(raw) = operand.as_array() else {
        return false;
    };
    let mut vertices = Vec::with_capacity(raw.len());
    for v in raw {
        match GeoPoint::from_value(v).filter(GeoPoint::is_valid) {
            Some(p) => vertices.push(p),
            None => return false,
        }
    }
    point_in_polygon(&point, &vertices)
}
