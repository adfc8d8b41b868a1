//! Primary road-routing provider: OpenRouteService-style directions API.
//!
//! Requests go to `POST {base}/v2/directions/{profile}/geojson` and come back
//! as a GeoJSON feature collection, one feature per candidate route.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::model::{Coordinate, ProviderTier, Route};
use crate::provider::{self, ProviderConfig};
use crate::traits::RouteProvider;

const TIER: ProviderTier = ProviderTier::Primary;

impl ProviderConfig {
    pub fn primary_default() -> Self {
        ProviderConfig::new("https://api.openrouteservice.org", "driving-car")
    }
}

#[derive(Debug, Clone)]
pub struct PrimaryRoadProvider {
    config: ProviderConfig,
    client: reqwest::blocking::Client,
}

impl PrimaryRoadProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = provider::build_client()?;
        Ok(Self { config, client })
    }
}

impl RouteProvider for PrimaryRoadProvider {
    fn tier(&self) -> ProviderTier {
        TIER
    }

    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        timeout: Duration,
    ) -> Result<Route, ProviderError> {
        let url = format!(
            "{}/v2/directions/{}/geojson",
            self.config.base(),
            self.config.profile
        );
        let body = DirectionsRequest {
            coordinates: vec![
                [origin.longitude(), origin.latitude()],
                [destination.longitude(), destination.latitude()],
            ],
        };

        let mut request = self.client.post(url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, key.as_str());
        }

        let response: DirectionsResponse = provider::fetch_json(TIER, request, timeout)?;
        response.into_route(origin, destination)
    }
}

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
    geometry: LineString,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    summary: Summary,
}

// The service leaves out zero-valued totals.
#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct LineString {
    coordinates: Vec<[f64; 2]>,
}

impl DirectionsResponse {
    fn into_route(
        self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Route, ProviderError> {
        let feature = self
            .features
            .into_iter()
            .next()
            .ok_or(ProviderError::NoRouteFound { tier: TIER })?;
        let geometry = provider::from_lng_lat(TIER, &feature.geometry.coordinates)?;
        let summary = feature.properties.summary;
        provider::road_route(
            TIER,
            origin,
            destination,
            summary.distance,
            summary.duration,
            geometry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_feature_collection_to_route() {
        let origin = coord(5.6037, -0.187);
        let destination = coord(5.6145, -0.206);
        let body: DirectionsResponse = serde_json::from_str(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"summary": {"distance": 3200.0, "duration": 540.0}},
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[-0.1871, 5.6038], [-0.2059, 5.6144]]
                    }
                }]
            }"#,
        )
        .unwrap();

        let route = body.into_route(origin, destination).unwrap();
        assert_eq!(route.source, ProviderTier::Primary);
        assert_eq!(route.distance_km, 3.2);
        assert_eq!(route.duration_minutes, 9.0);
        // Snapped endpoints differ, so the requested ones are added.
        assert_eq!(route.geometry.len(), 4);
        assert_eq!(route.geometry.first(), Some(&origin));
        assert_eq!(route.geometry.last(), Some(&destination));
    }

    #[test]
    fn test_empty_feature_collection() {
        let body: DirectionsResponse =
            serde_json::from_str(r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        let err = body.into_route(coord(0.0, 0.0), coord(0.1, 0.1)).unwrap_err();
        assert_eq!(err, ProviderError::NoRouteFound { tier: ProviderTier::Primary });
    }

    #[test]
    fn test_missing_summary_totals_default_to_zero() {
        let here = coord(5.6037, -0.187);
        let body: DirectionsResponse = serde_json::from_str(
            r#"{"features": [{
                "properties": {"summary": {}},
                "geometry": {"coordinates": [[-0.187, 5.6037]]}
            }]}"#,
        )
        .unwrap();
        let route = body.into_route(here, here).unwrap();
        assert_eq!(route.distance_km, 0.0);
        assert_eq!(route.geometry.len(), 2);
    }
}
