//! Runtime configuration for the resolver and its providers.

use std::time::Duration;

use serde::Deserialize;

use crate::haversine::{DEFAULT_MINUTES_PER_KM, StraightLineEstimator};
use crate::model::ProviderTier;
use crate::provider::ProviderConfig;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Timeout for the primary provider, which is allowed to be slow.
    pub primary_timeout_secs: u64,
    /// Timeout for every other provider tier.
    pub fallback_timeout_secs: u64,
    /// Pace of the straight-line estimate.
    pub minutes_per_km: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            primary_timeout_secs: 30,
            fallback_timeout_secs: 10,
            minutes_per_km: DEFAULT_MINUTES_PER_KM,
        }
    }
}

impl ResolverConfig {
    pub fn timeout_for(&self, tier: ProviderTier) -> Duration {
        match tier {
            ProviderTier::Primary => Duration::from_secs(self.primary_timeout_secs),
            _ => Duration::from_secs(self.fallback_timeout_secs),
        }
    }

    pub fn estimator(&self) -> StraightLineEstimator {
        StraightLineEstimator::new(self.minutes_per_km)
    }
}

/// Everything needed to build a resolver backed by the three HTTP providers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub primary: ProviderConfig,
    pub secondary: ProviderConfig,
    pub direct: ProviderConfig,
    pub resolver: ResolverConfig,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            primary: ProviderConfig::primary_default(),
            secondary: ProviderConfig::secondary_default(),
            direct: ProviderConfig::osrm_default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl RoutingConfig {
    /// Defaults overridden by `ROUTE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("ROUTE_PRIMARY_URL") {
            config.primary.base_url = url;
        }
        if let Some(key) = lookup("ROUTE_PRIMARY_KEY") {
            config.primary.api_key = Some(key);
        }
        if let Some(url) = lookup("ROUTE_SECONDARY_URL") {
            config.secondary.base_url = url;
        }
        if let Some(key) = lookup("ROUTE_SECONDARY_KEY") {
            config.secondary.api_key = Some(key);
        }
        if let Some(url) = lookup("ROUTE_OSRM_URL") {
            config.direct.base_url = url;
        }
        config
    }
}

/// Screen-space settings for zoom-based clustering.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Grouping radius in screen pixels.
    pub pixel_radius: f64,
    /// Web-mercator tile edge in pixels.
    pub tile_size: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            pixel_radius: 80.0,
            tile_size: 256.0,
        }
    }
}
