//! Plumbing shared by the HTTP routing providers.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ProviderError;
use crate::model::{Coordinate, ProviderTier, Route};
use crate::polyline::Polyline;

const USER_AGENT: &str = concat!("route-cluster/", env!("CARGO_PKG_VERSION"));

/// Endpoint settings for one routing backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub profile: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            profile: profile.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub(crate) fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Blocking client shared by all requests of one provider.
///
/// No client-wide timeout: the resolver supplies one per call.
pub(crate) fn build_client() -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()
}

/// Send a request and decode a 2xx JSON body.
pub(crate) fn fetch_json<T: DeserializeOwned>(
    tier: ProviderTier,
    request: reqwest::blocking::RequestBuilder,
    timeout: Duration,
) -> Result<T, ProviderError> {
    request
        .timeout(timeout)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.json::<T>())
        .map_err(|err| ProviderError::from_http(tier, &err))
}

/// Convert GeoJSON `[lng, lat]` pairs into coordinates.
pub(crate) fn from_lng_lat(
    tier: ProviderTier,
    pairs: &[[f64; 2]],
) -> Result<Vec<Coordinate>, ProviderError> {
    pairs
        .iter()
        .map(|[lng, lat]| {
            Coordinate::new(*lat, *lng).map_err(|err| {
                ProviderError::unavailable(tier, format!("malformed geometry: {}", err))
            })
        })
        .collect()
}

/// Validate provider totals and build a road route from them.
pub(crate) fn road_route(
    tier: ProviderTier,
    origin: Coordinate,
    destination: Coordinate,
    distance_m: f64,
    duration_s: f64,
    geometry: Vec<Coordinate>,
) -> Result<Route, ProviderError> {
    if !distance_m.is_finite() || distance_m < 0.0 {
        return Err(ProviderError::unavailable(
            tier,
            format!("malformed distance {}", distance_m),
        ));
    }
    if !duration_s.is_finite() || duration_s < 0.0 {
        return Err(ProviderError::unavailable(
            tier,
            format!("malformed duration {}", duration_s),
        ));
    }

    Ok(Route {
        distance_km: distance_m / 1000.0,
        duration_minutes: duration_s / 60.0,
        geometry: Polyline::new(geometry).anchored(origin, destination),
        source: tier,
        is_estimate: false,
    })
}
