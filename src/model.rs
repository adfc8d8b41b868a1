//! Value types shared by the resolver and the clustering engine.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GeoError;
use crate::polyline::Polyline;

/// Decimal places kept when building a [`RouteKey`].
pub const ROUTE_KEY_PRECISION: i32 = 6;

/// A WGS84 position. Immutable once constructed.
///
/// Deserialization goes through [`Coordinate::new`], so out-of-range input
/// is rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = GeoError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(GeoError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// For values derived from coordinates that are already valid, such as
    /// means and clamped values.
    pub(crate) fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        debug_assert!(Coordinate::new(latitude, longitude).is_ok());
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Equal after rounding both coordinates to [`ROUTE_KEY_PRECISION`].
    pub fn same_position(&self, other: &Coordinate) -> bool {
        round_component(self.latitude) == round_component(other.latitude)
            && round_component(self.longitude) == round_component(other.longitude)
    }
}

fn round_component(value: f64) -> f64 {
    let factor = 10f64.powi(ROUTE_KEY_PRECISION);
    let rounded = (value * factor).round() / factor;
    // -0.0 and 0.0 must produce the same key
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// An origin/destination pair to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
}

impl RouteRequest {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
        }
    }

    pub fn key(&self) -> RouteKey {
        RouteKey::new(&self.origin, &self.destination)
    }
}

/// Canonical `"{o.lat},{o.lng}-{d.lat},{d.lng}"` string at six decimal places.
///
/// Used for single-flight deduplication and for the route cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey(String);

impl RouteKey {
    pub fn new(origin: &Coordinate, destination: &Coordinate) -> Self {
        let precision = ROUTE_KEY_PRECISION as usize;
        RouteKey(format!(
            "{:.p$},{:.p$}-{:.p$},{:.p$}",
            round_component(origin.latitude),
            round_component(origin.longitude),
            round_component(destination.latitude),
            round_component(destination.longitude),
            p = precision,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routing sources in fallback order. The derived `Ord` is the order in
/// which the resolver tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderTier {
    Primary,
    Secondary,
    DirectApi,
    StraightLineEstimate,
}

impl ProviderTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderTier::Primary => "primary",
            ProviderTier::Secondary => "secondary",
            ProviderTier::DirectApi => "direct-api",
            ProviderTier::StraightLineEstimate => "straight-line-estimate",
        }
    }
}

impl fmt::Display for ProviderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved route. `is_estimate` is only set for the straight-line
/// fallback, which renderers should draw as an approximation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub geometry: Polyline,
    pub source: ProviderTier,
    pub is_estimate: bool,
}

/// A map marker candidate for clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub coordinate: Coordinate,
    pub weight: u32,
}

impl PointOfInterest {
    pub fn new(id: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            coordinate,
            weight: 1,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }
}

/// Visual weight class of a cluster badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

impl SizeTier {
    /// Small up to 5, Medium 6 to 10, Large above 10.
    pub fn for_weight(total_weight: u64) -> Self {
        match total_weight {
            0..=5 => SizeTier::Small,
            6..=10 => SizeTier::Medium,
            _ => SizeTier::Large,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub centroid: Coordinate,
    pub members: BTreeSet<String>,
    pub total_weight: u64,
    pub size_tier: SizeTier,
}
