use serde::{Deserialize, Serialize};

/// Approximate meters per degree. The service area spans a few kilometers, so
/// a flat degree-to-meter scale is accurate enough and keeps this pure.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a point from nullable lat/lon columns; both must be present.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Self { lat, lon }),
            _ => None,
        }
    }

    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        distance_meters(self, other)
    }

    /// Degree deltas of a square box that contains every point within `radius_meters`.
    pub fn bounding_box(&self, radius_meters: f64) -> BoundingBox {
        let delta = radius_meters / METERS_PER_DEGREE;
        BoundingBox {
            min_lat: self.lat - delta,
            max_lat: self.lat + delta,
            min_lon: self.lon - delta,
            max_lon: self.lon + delta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }
}

/// Planar distance in meters between two coordinates
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = a.lat - b.lat;
    let d_lon = a.lon - b.lon;
    (d_lat * d_lat + d_lon * d_lon).sqrt() * METERS_PER_DEGREE
}

pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    distance_meters(a, b) / 1000.0
}
