// src/distance.rs
//! Great-circle distances between home coordinates and origin geometries.

use serde::{Deserialize, Serialize};

/// Mean earth radius in km.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

pub type Point = Coordinates;

/// Geometries an origin can be described with. Only points carry a
/// distance for now.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    Polygon(Vec<Point>),
}

pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let rlat1 = a.latitude.to_radians();
    let rlat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + rlat1.cos() * rlat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Best coordinates for display.
pub fn extract_coordinates(geometry: &Geometry) -> Option<Coordinates> {
    match geometry {
        Geometry::Point(p) => Some(*p),
        Geometry::Polygon(_) => {
            tracing::debug!("coordinate extraction not implemented for polygons");
            None
        }
    }
}

/// Distance in km, `f64::INFINITY` where it cannot be determined.
pub fn distance_to_geometry(home: Coordinates, geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Point(p) => haversine_km(*p, home),
        Geometry::Polygon(points) => {
            tracing::debug!(vertices = points.len(), "distance not implemented for polygons");
            f64::INFINITY
        }
    }
}
