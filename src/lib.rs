//! route-cluster: route resolution with provider fallback, and map marker
//! clustering.
//!
//! [`resolver::RouteResolver`] turns an origin/destination pair into a route,
//! trying road-routing providers in order and ending with a straight-line
//! estimate, so it never fails. [`cluster::GreedyClusterEngine`] groups
//! points of interest into deterministic, size-tiered clusters.

pub mod cluster;
pub mod config;
pub mod error;
pub mod haversine;
pub mod model;
pub mod osrm;
pub mod polyline;
pub mod primary;
pub mod provider;
pub mod resolver;
pub mod secondary;
pub mod traits;

pub use cluster::GreedyClusterEngine;
pub use config::{ClusterConfig, ResolverConfig, RoutingConfig};
pub use error::{ClusterError, GeoError, ProviderError};
pub use model::{
    Cluster, Coordinate, PointOfInterest, ProviderTier, Route, RouteKey, RouteRequest, SizeTier,
};
pub use resolver::{ResolutionState, RouteResolver};
pub use traits::{ClusterEngine, RouteProvider};
