//! Greedy, deterministic point-of-interest clustering.
//!
//! Points are visited in id order. Each unclustered point seeds a cluster
//! that keeps absorbing unclustered points within `radius` of its running
//! centroid until a full sweep adds nothing. Worst case O(n²), which is fine
//! for the tens to low hundreds of markers a map view holds; larger sets
//! want a spatial index behind the same [`ClusterEngine`] trait.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::ClusterConfig;
use crate::error::ClusterError;
use crate::haversine::BoundingBox;
use crate::model::{Cluster, Coordinate, PointOfInterest, SizeTier};
use crate::traits::ClusterEngine;

/// Degrees of longitude covered by `pixel_radius` screen pixels at `zoom`
/// on a web-mercator map.
pub fn radius_for_zoom(pixel_radius: f64, zoom: f64, tile_size: f64) -> f64 {
    pixel_radius * 360.0 / (tile_size * 2f64.powf(zoom))
}

#[derive(Debug, Clone, Default)]
pub struct GreedyClusterEngine {
    config: ClusterConfig,
}

impl GreedyClusterEngine {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Cluster the points visible in `viewport` using the configured pixel
    /// radius at `zoom`.
    pub fn cluster_viewport(
        &self,
        points: &[PointOfInterest],
        viewport: &BoundingBox,
        zoom: f64,
    ) -> Result<Vec<Cluster>, ClusterError> {
        let visible: Vec<PointOfInterest> = points
            .iter()
            .filter(|point| viewport.contains(&point.coordinate))
            .cloned()
            .collect();
        let radius = radius_for_zoom(self.config.pixel_radius, zoom, self.config.tile_size);
        debug!(
            visible = visible.len(),
            total = points.len(),
            zoom,
            radius,
            "clustering viewport"
        );
        self.cluster(&visible, radius)
    }
}

impl ClusterEngine for GreedyClusterEngine {
    fn cluster(
        &self,
        points: &[PointOfInterest],
        radius: f64,
    ) -> Result<Vec<Cluster>, ClusterError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ClusterError::InvalidRadius(radius));
        }

        let mut ordered: Vec<&PointOfInterest> = points.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));
        validate(&ordered)?;

        let mut assigned = vec![false; ordered.len()];
        let mut clusters = Vec::new();

        for seed in 0..ordered.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut group = Group::new(ordered[seed]);

            // Everything before `seed` is already assigned.
            loop {
                let mut absorbed = false;
                for candidate in seed + 1..ordered.len() {
                    if assigned[candidate] {
                        continue;
                    }
                    if group.distance_to(&ordered[candidate].coordinate) <= radius {
                        group.absorb(ordered[candidate]);
                        assigned[candidate] = true;
                        absorbed = true;
                    }
                }
                if !absorbed {
                    break;
                }
            }

            clusters.push(group.finish());
        }

        debug!(points = ordered.len(), clusters = clusters.len(), radius, "clustered points");
        Ok(clusters)
    }
}

fn validate(ordered: &[&PointOfInterest]) -> Result<(), ClusterError> {
    if let Some(pair) = ordered.windows(2).find(|pair| pair[0].id == pair[1].id) {
        return Err(ClusterError::DuplicateId(pair[0].id.clone()));
    }
    if let Some(point) = ordered.iter().find(|point| point.weight == 0) {
        return Err(ClusterError::InvalidWeight {
            id: point.id.clone(),
        });
    }
    Ok(())
}

/// A cluster under construction.
struct Group<'a> {
    seed: &'a PointOfInterest,
    members: BTreeSet<String>,
    total_weight: u64,
    mean_lat: f64,
    mean_lng: f64,
}

impl<'a> Group<'a> {
    fn new(seed: &'a PointOfInterest) -> Self {
        Self {
            seed,
            members: BTreeSet::from([seed.id.clone()]),
            total_weight: u64::from(seed.weight),
            mean_lat: seed.coordinate.latitude(),
            mean_lng: seed.coordinate.longitude(),
        }
    }

    fn distance_to(&self, point: &Coordinate) -> f64 {
        (point.latitude() - self.mean_lat).hypot(point.longitude() - self.mean_lng)
    }

    fn absorb(&mut self, point: &PointOfInterest) {
        self.members.insert(point.id.clone());
        self.total_weight += u64::from(point.weight);
        let n = self.members.len() as f64;
        self.mean_lat += (point.coordinate.latitude() - self.mean_lat) / n;
        self.mean_lng += (point.coordinate.longitude() - self.mean_lng) / n;
    }

    fn finish(self) -> Cluster {
        let centroid = Coordinate::new_unchecked(
            self.mean_lat.clamp(-90.0, 90.0),
            self.mean_lng.clamp(-180.0, 180.0),
        );
        Cluster {
            id: format!("cluster-{}", self.seed.id),
            centroid,
            members: self.members,
            total_weight: self.total_weight,
            size_tier: SizeTier::for_weight(self.total_weight),
        }
    }
}
