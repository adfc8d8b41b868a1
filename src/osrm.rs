//! Direct OSRM `route` service adapter, bypassing any routing client library.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::{Coordinate, ProviderTier, Route};
use crate::provider::{self, ProviderConfig};
use crate::traits::RouteProvider;

const TIER: ProviderTier = ProviderTier::DirectApi;

impl ProviderConfig {
    /// Public OSRM demo server.
    pub fn osrm_default() -> Self {
        ProviderConfig::new("https://router.project-osrm.org", "driving")
    }
}

#[derive(Debug, Clone)]
pub struct DirectApiProvider {
    config: ProviderConfig,
    client: reqwest::blocking::Client,
}

impl DirectApiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = provider::build_client()?;
        Ok(Self { config, client })
    }

    fn url(&self, origin: &Coordinate, destination: &Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson",
            self.config.base(),
            self.config.profile,
            origin.longitude(),
            origin.latitude(),
            destination.longitude(),
            destination.latitude()
        )
    }
}

impl RouteProvider for DirectApiProvider {
    fn tier(&self) -> ProviderTier {
        TIER
    }

    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        timeout: Duration,
    ) -> Result<Route, ProviderError> {
        let response = self
            .client
            .get(self.url(&origin, &destination))
            .timeout(timeout)
            .send()
            .map_err(|err| ProviderError::from_http(TIER, &err))?;

        // OSRM reports routing failures such as NoRoute with a 400 status and
        // a JSON body, so the body is decoded before the status is judged.
        let status = response.status();
        let body = match response.json::<OsrmRouteResponse>() {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(ProviderError::unavailable(TIER, format!("http status {}", status)));
            }
            Err(err) => return Err(ProviderError::from_http(TIER, &err)),
        };

        body.into_route(origin, destination)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

impl OsrmRouteResponse {
    fn into_route(
        self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Route, ProviderError> {
        match self.code.as_str() {
            "Ok" => {}
            "NoRoute" => return Err(ProviderError::NoRouteFound { tier: TIER }),
            code => {
                let detail = self.message.unwrap_or_default();
                return Err(ProviderError::unavailable(
                    TIER,
                    format!("osrm code {}: {}", code, detail),
                ));
            }
        }

        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or(ProviderError::NoRouteFound { tier: TIER })?;
        let geometry = provider::from_lng_lat(TIER, &route.geometry.coordinates)?;
        provider::road_route(TIER, origin, destination, route.distance, route.duration, geometry)
    }
}
