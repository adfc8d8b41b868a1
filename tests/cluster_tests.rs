mod common;

use std::collections::BTreeSet;

use quickcheck::{QuickCheck, TestResult};
use route_cluster::{ClusterEngine, ClusterError, GreedyClusterEngine, PointOfInterest, SizeTier};

use common::coord;

fn poi(id: &str, lat: f64, lng: f64) -> PointOfInterest {
    PointOfInterest::new(id, coord(lat, lng))
}

/// Build a point set from small integer offsets around Accra.
fn points_from_offsets(offsets: &[(u8, u8, u8)]) -> Vec<PointOfInterest> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, (dlat, dlng, weight))| {
            PointOfInterest::new(
                format!("poi-{:03}", i),
                coord(5.55 + *dlat as f64 * 0.001, -0.25 + *dlng as f64 * 0.001),
            )
            .with_weight(u32::from(*weight % 4) + 1)
        })
        .collect()
}

fn memberships(clusters: &[route_cluster::Cluster]) -> BTreeSet<BTreeSet<String>> {
    clusters.iter().map(|cluster| cluster.members.clone()).collect()
}

#[test]
fn ten_nearby_points_form_one_cluster() {
    let points: Vec<_> = (0..10)
        .map(|i| {
            let lng = -0.187 + (i % 3) as f64 * 0.001;
            poi(&format!("shop-{}", i), 5.6037 + i as f64 * 0.001, lng)
        })
        .collect();

    let clusters = GreedyClusterEngine::default().cluster(&points, 0.02).unwrap();

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members.len(), 10);
    assert_eq!(clusters[0].total_weight, 10);
    assert_eq!(clusters[0].size_tier, SizeTier::Medium);
}

#[test]
fn heavy_points_raise_tier() {
    let points: Vec<_> = (0..10)
        .map(|i| poi(&format!("shop-{}", i), 5.6037 + i as f64 * 0.001, -0.187).with_weight(2))
        .collect();

    let clusters = GreedyClusterEngine::default().cluster(&points, 0.02).unwrap();

    assert_eq!(clusters[0].total_weight, 20);
    assert_eq!(clusters[0].size_tier, SizeTier::Large);
}

#[test]
fn empty_input_gives_no_clusters() {
    let clusters = GreedyClusterEngine::default().cluster(&[], 0.02).unwrap();
    assert!(clusters.is_empty());
}

#[test]
fn single_point_is_small_cluster() {
    let clusters = GreedyClusterEngine::default()
        .cluster(&[poi("only", 5.6037, -0.187)], 0.02)
        .unwrap();

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].size_tier, SizeTier::Small);
    assert_eq!(clusters[0].centroid, coord(5.6037, -0.187));
}

#[test]
fn negative_radius_is_rejected() {
    let result = GreedyClusterEngine::default().cluster(&[poi("a", 0.0, 0.0)], -1.0);
    assert_eq!(result, Err(ClusterError::InvalidRadius(-1.0)));
}

#[test]
fn distant_neighbourhoods_split() {
    let mut points = Vec::new();
    for i in 0..4 {
        points.push(poi(&format!("osu-{}", i), 5.556 + i as f64 * 0.001, -0.182));
        points.push(poi(&format!("legon-{}", i), 5.650 + i as f64 * 0.001, -0.187));
    }

    let clusters = GreedyClusterEngine::default().cluster(&points, 0.01).unwrap();

    assert_eq!(clusters.len(), 2);
    assert!(clusters.iter().all(|cluster| cluster.members.len() == 4));
    assert_eq!(clusters[0].id, "cluster-legon-0");
    assert_eq!(clusters[1].id, "cluster-osu-0");
}

#[test]
fn prop_clusters_partition_input() {
    fn prop(offsets: Vec<(u8, u8, u8)>, radius_steps: u8) -> TestResult {
        let radius = (radius_steps as f64 + 1.0) * 0.002;
        let points = points_from_offsets(&offsets);
        let clusters = match GreedyClusterEngine::default().cluster(&points, radius) {
            Ok(clusters) => clusters,
            Err(_) => return TestResult::failed(),
        };

        let member_count: usize = clusters.iter().map(|c| c.members.len()).sum();
        let union: BTreeSet<String> = clusters
            .iter()
            .flat_map(|c| c.members.iter().cloned())
            .collect();
        let ids: BTreeSet<String> = points.iter().map(|p| p.id.clone()).collect();
        let weights_match = clusters.iter().all(|c| {
            let total: u64 = points
                .iter()
                .filter(|p| c.members.contains(&p.id))
                .map(|p| u64::from(p.weight))
                .sum();
            total == c.total_weight && SizeTier::for_weight(total) == c.size_tier
        });

        let none_empty = clusters.iter().all(|c| !c.members.is_empty());
        TestResult::from_bool(
            union == ids && member_count == points.len() && weights_match && none_empty,
        )
    }
    QuickCheck::new().quickcheck(prop as fn(Vec<(u8, u8, u8)>, u8) -> TestResult);
}

#[test]
fn prop_clustering_ignores_input_order() {
    fn prop(offsets: Vec<(u8, u8, u8)>) -> TestResult {
        let points = points_from_offsets(&offsets);
        let mut reversed = points.clone();
        reversed.reverse();

        let engine = GreedyClusterEngine::default();
        match (engine.cluster(&points, 0.01), engine.cluster(&reversed, 0.01)) {
            (Ok(a), Ok(b)) => TestResult::from_bool(memberships(&a) == memberships(&b) && a == b),
            _ => TestResult::failed(),
        }
    }
    QuickCheck::new().quickcheck(prop as fn(Vec<(u8, u8, u8)>) -> TestResult);
}
