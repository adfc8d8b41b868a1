//! Error types for geometry, routing providers and clustering.

use thiserror::Error;

use crate::model::ProviderTier;

/// Failures of the pure geometry helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// An operation that needs at least one point received none.
    #[error("input point set is empty")]
    EmptyInput,
    /// Latitude outside [-90, 90], longitude outside [-180, 180], or a
    /// non-finite component.
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Failure of a single routing provider call.
///
/// These never reach callers of [`crate::resolver::RouteResolver::resolve`];
/// the resolver logs them and falls back to the next tier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Transport error, timeout, non-2xx status or malformed body.
    #[error("{tier} provider unavailable: {reason}")]
    Unavailable { tier: ProviderTier, reason: String },
    /// The provider answered successfully but reported zero routes.
    #[error("{tier} provider found no route")]
    NoRouteFound { tier: ProviderTier },
}

impl ProviderError {
    pub fn unavailable(tier: ProviderTier, reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            tier,
            reason: reason.into(),
        }
    }

    /// Classify a transport-level `reqwest` failure.
    pub fn from_http(tier: ProviderTier, err: &reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if let Some(status) = err.status() {
            format!("http status {}", status)
        } else if err.is_decode() {
            format!("malformed response body: {}", err)
        } else {
            err.to_string()
        };
        ProviderError::Unavailable { tier, reason }
    }

    pub fn tier(&self) -> ProviderTier {
        match self {
            ProviderError::Unavailable { tier, .. } | ProviderError::NoRouteFound { tier } => *tier,
        }
    }
}

/// Caller misuse of the clustering engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    #[error("cluster radius must be a positive finite number, got {0}")]
    InvalidRadius(f64),
    #[error("duplicate point of interest id {0:?}")]
    DuplicateId(String),
    #[error("point of interest {id:?} has zero weight")]
    InvalidWeight { id: String },
}
