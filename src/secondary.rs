//! Secondary road-routing provider: GraphHopper-style `route` API.
//!
//! Paths come back with an encoded polyline and a duration in milliseconds.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::{Coordinate, ProviderTier, Route};
use crate::polyline::{ENCODED_PRECISION, Polyline};
use crate::provider::{self, ProviderConfig};
use crate::traits::RouteProvider;

const TIER: ProviderTier = ProviderTier::Secondary;

impl ProviderConfig {
    pub fn secondary_default() -> Self {
        ProviderConfig::new("https://graphhopper.com/api/1", "car")
    }
}

#[derive(Debug, Clone)]
pub struct SecondaryRoadProvider {
    config: ProviderConfig,
    client: reqwest::blocking::Client,
}

impl SecondaryRoadProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = provider::build_client()?;
        Ok(Self { config, client })
    }

    fn query(&self, origin: &Coordinate, destination: &Coordinate) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("point", format!("{:.6},{:.6}", origin.latitude(), origin.longitude())),
            ("point", format!("{:.6},{:.6}", destination.latitude(), destination.longitude())),
            ("profile", self.config.profile.clone()),
            ("points_encoded", "true".to_string()),
        ];
        if let Some(key) = &self.config.api_key {
            query.push(("key", key.clone()));
        }
        query
    }
}

impl RouteProvider for SecondaryRoadProvider {
    fn tier(&self) -> ProviderTier {
        TIER
    }

    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        timeout: Duration,
    ) -> Result<Route, ProviderError> {
        let request = self
            .client
            .get(format!("{}/route", self.config.base()))
            .query(&self.query(&origin, &destination));

        let response: RouteResponse = provider::fetch_json(TIER, request, timeout)?;
        response.into_route(origin, destination)
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    paths: Vec<Path>,
}

#[derive(Debug, Deserialize)]
struct Path {
    /// Meters.
    distance: f64,
    /// Milliseconds.
    time: f64,
    points: String,
}

impl RouteResponse {
    fn into_route(
        self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Route, ProviderError> {
        let path = self
            .paths
            .into_iter()
            .next()
            .ok_or(ProviderError::NoRouteFound { tier: TIER })?;
        let geometry = Polyline::decode(&path.points, ENCODED_PRECISION).map_err(|err| {
            ProviderError::unavailable(TIER, format!("malformed geometry: {}", err))
        })?;
        provider::road_route(
            TIER,
            origin,
            destination,
            path.distance,
            path.time / 1000.0,
            geometry.into_points(),
        )
    }
}
