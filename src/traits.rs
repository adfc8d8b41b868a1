//! Seams between the resolver, the routing backends and the clustering
//! engine.
//!
//! Concrete backends implement [`RouteProvider`]; tests substitute their own.

use std::time::Duration;

use crate::error::{ClusterError, ProviderError};
use crate::model::{Cluster, Coordinate, PointOfInterest, ProviderTier, Route};

/// One external routing backend.
///
/// Implementations are called from several threads at once and must not
/// retry internally: the resolver tries each tier at most once per
/// resolution.
pub trait RouteProvider: Send + Sync {
    /// Position of this provider in the fallback order.
    fn tier(&self) -> ProviderTier;

    /// Fetch a road route. `timeout` bounds the whole HTTP exchange.
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        timeout: Duration,
    ) -> Result<Route, ProviderError>;
}

/// Groups points of interest for display.
///
/// `radius` is in the same unit as the coordinates. Implementations must
/// return a partition of the input ids and be deterministic for a given
/// point set.
pub trait ClusterEngine {
    fn cluster(
        &self,
        points: &[PointOfInterest],
        radius: f64,
    ) -> Result<Vec<Cluster>, ClusterError>;
}
