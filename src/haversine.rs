//! Great-circle geometry and the straight-line route estimate.
//!
//! The estimate is the last step of the resolver's fallback chain.
//! Less accurate than a road route (ignores roads) but always available.

use serde::{Deserialize, Serialize};

use crate::error::GeoError;
use crate::model::{Coordinate, ProviderTier, Route};
use crate::polyline::Polyline;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Minutes per straight-line kilometer (~30 km/h effective).
pub const DEFAULT_MINUTES_PER_KM: f64 = 2.0;

/// Haversine great-circle distance in kilometers.
pub fn distance_km(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1_rad = from.latitude().to_radians();
    let lat2_rad = to.latitude().to_radians();
    let delta_lat = (to.latitude() - from.latitude()).to_radians();
    let delta_lng = (to.longitude() - from.longitude()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Axis-aligned box in latitude/longitude space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl BoundingBox {
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.min.latitude()..=self.max.latitude()).contains(&point.latitude())
            && (self.min.longitude()..=self.max.longitude()).contains(&point.longitude())
    }

    pub fn center(&self) -> Coordinate {
        midpoint(&self.min, &self.max)
    }
}

fn midpoint(a: &Coordinate, b: &Coordinate) -> Coordinate {
    // The mean of two in-range coordinates is always in range.
    Coordinate::new_unchecked(
        (a.latitude() + b.latitude()) / 2.0,
        (a.longitude() + b.longitude()) / 2.0,
    )
}

/// Smallest box containing every point.
pub fn bounding_box(points: &[Coordinate]) -> Result<BoundingBox, GeoError> {
    let first = points.first().ok_or(GeoError::EmptyInput)?;
    let (mut min_lat, mut min_lng) = (first.latitude(), first.longitude());
    let (mut max_lat, mut max_lng) = (min_lat, min_lng);

    for point in &points[1..] {
        min_lat = min_lat.min(point.latitude());
        min_lng = min_lng.min(point.longitude());
        max_lat = max_lat.max(point.latitude());
        max_lng = max_lng.max(point.longitude());
    }

    Ok(BoundingBox {
        min: Coordinate::new(min_lat, min_lng)?,
        max: Coordinate::new(max_lat, max_lng)?,
    })
}

/// Builds straight-line routes from great-circle distance and a fixed pace.
#[derive(Debug, Clone, Copy)]
pub struct StraightLineEstimator {
    /// Assumed minutes needed per kilometer.
    pub minutes_per_km: f64,
}

impl Default for StraightLineEstimator {
    fn default() -> Self {
        Self {
            minutes_per_km: DEFAULT_MINUTES_PER_KM,
        }
    }
}

impl StraightLineEstimator {
    pub fn new(minutes_per_km: f64) -> Self {
        Self { minutes_per_km }
    }

    pub fn estimate(&self, origin: Coordinate, destination: Coordinate) -> Route {
        let distance = distance_km(&origin, &destination);
        Route {
            distance_km: distance,
            duration_minutes: distance * self.minutes_per_km,
            geometry: Polyline::new(vec![origin, destination]),
            source: ProviderTier::StraightLineEstimate,
            is_estimate: true,
        }
    }
}

/// Straight-line route with the default pace. Never fails.
pub fn estimate_route(origin: Coordinate, destination: Coordinate) -> Route {
    StraightLineEstimator::default().estimate(origin, destination)
}
