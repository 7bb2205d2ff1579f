use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::lattice::{LatticeIndex, half_sphere_offsets, offset};
use crate::table::ClusterTable;

/// Parameters of [`single_linkage_3d`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SingleLinkage3d {
    /// Only lattice points within this Euclidean lattice distance are linked.
    pub lattice_cutoff: f64,

    /// Only pairs whose distance is strictly below this are linked.
    pub value_cutoff: f64,

    /// Merging stops once this many clusters remain. Default: 1.
    #[serde(default = "default_min_clusters")]
    pub min_clusters: usize,
}

fn default_min_clusters() -> usize {
    1
}

impl SingleLinkage3d {
    /// Uses `threshold` for both cutoffs and merges down to one cluster.
    pub fn new(threshold: f64) -> Self {
        Self {
            lattice_cutoff: threshold,
            value_cutoff: threshold,
            min_clusters: default_min_clusters(),
        }
    }
}

struct Edge {
    a: usize,
    b: usize,
    distance: f64,
}

/// Single-linkage clustering of voxels on a 3D lattice.
///
/// Candidate pairs are lattice points of `indices` within
/// `lattice_cutoff` of each other. `value` returns the data at a lattice
/// point, or `None` outside the domain; points without data take part in no
/// pair but still form their own cluster. Pairs whose `distance` is below
/// `value_cutoff` are merged shortest first until `min_clusters` clusters
/// remain or no pair is left; equal distances keep enumeration order. The
/// floor is checked after each merge, so at least one merge happens whenever
/// a pair qualifies.
///
/// Clusters are returned as member lists, numbered and ordered by the first
/// appearance of their members in `indices`.
pub fn single_linkage_3d<V, F, G, I>(
    indices: I,
    value: F,
    distance: G,
    params: &SingleLinkage3d,
) -> Vec<Vec<LatticeIndex>>
where
    I: IntoIterator<Item = LatticeIndex>,
    F: Fn(&LatticeIndex) -> Option<V>,
    G: Fn(&LatticeIndex, &V, &LatticeIndex, &V) -> f64,
{
    let mut table = ClusterTable::from_elements(indices);
    let points: Vec<LatticeIndex> = table.elements().to_vec();
    let position: HashMap<LatticeIndex, usize> =
        points.iter().enumerate().map(|(i, p)| (*p, i)).collect();
    let values: Vec<Option<V>> = points.iter().map(&value).collect();
    let offsets = half_sphere_offsets(params.lattice_cutoff);

    let mut edges = Vec::new();
    for (a, p) in points.iter().enumerate() {
        let Some(va) = &values[a] else { continue };
        for o in &offsets {
            let q = offset(p, o);
            let Some(&b) = position.get(&q) else { continue };
            let Some(vb) = &values[b] else { continue };
            let d = distance(p, va, &q, vb);
            if d < params.value_cutoff {
                edges.push(Edge { a, b, distance: d });
            }
        }
    }
    edges.sort_by(|x, y| x.distance.total_cmp(&y.distance));
    debug!(
        points = points.len(),
        edges = edges.len(),
        lattice_cutoff = params.lattice_cutoff,
        value_cutoff = params.value_cutoff,
        "single linkage"
    );

    let mut remaining = table.len();
    for e in &edges {
        if !table.concat_cluster(&points[e.a], &points[e.b]) {
            continue;
        }
        remaining -= 1;
        trace!(a = ?points[e.a], b = ?points[e.b], distance = e.distance, remaining, "merged");
        if remaining <= params.min_clusters {
            break;
        }
    }
    table.to_cluster_member_lists()
}

/// Euclidean distance between lattice points, ignoring their data.
pub fn lattice_distance<V>(a: &LatticeIndex, _: &V, b: &LatticeIndex, _: &V) -> f64 {
    let d2: i64 = (0..3).map(|i| i64::from(a[i] - b[i]).pow(2)).sum();
    (d2 as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(threshold: f64, min_clusters: usize) -> SingleLinkage3d {
        SingleLinkage3d {
            min_clusters,
            ..SingleLinkage3d::new(threshold)
        }
    }

    fn some(_: &LatticeIndex) -> Option<f64> {
        Some(1.0)
    }

    #[test]
    fn far_point_stays_isolated() {
        let indices = [[0, 0, 0], [1, 0, 0], [5, 5, 5]];
        let p = SingleLinkage3d {
            lattice_cutoff: 2.0,
            value_cutoff: f64::INFINITY,
            min_clusters: 1,
        };
        let clusters = single_linkage_3d(indices, some, lattice_distance, &p);
        assert_eq!(clusters, vec![vec![[0, 0, 0], [1, 0, 0]], vec![[5, 5, 5]]]);
    }

    #[test]
    fn shortest_edges_merge_first() {
        // Merges (0,0,0)-(1,0,0) at 1, then stops at two clusters before
        // linking (3,0,0) at distance 2.
        let indices = [[0, 0, 0], [1, 0, 0], [3, 0, 0]];
        let clusters = single_linkage_3d(indices, some, lattice_distance, &params(2.5, 2));
        assert_eq!(clusters, vec![vec![[0, 0, 0], [1, 0, 0]], vec![[3, 0, 0]]]);

        let clusters = single_linkage_3d(indices, some, lattice_distance, &params(2.5, 1));
        assert_eq!(clusters, vec![vec![[0, 0, 0], [1, 0, 0], [3, 0, 0]]]);
    }

    #[test]
    fn value_cutoff_is_strict() {
        let indices = [[0, 0, 0], [0, 2, 0]];
        let p = SingleLinkage3d {
            lattice_cutoff: 3.0,
            value_cutoff: 2.0,
            min_clusters: 1,
        };
        assert_eq!(single_linkage_3d(indices, some, lattice_distance, &p).len(), 2);
    }

    #[test]
    fn value_distance_drives_the_order() {
        // A chain of three on the lattice; the value distance prefers the
        // second link, and the floor of two stops after it.
        let indices = [[0, 0, 0], [1, 0, 0], [2, 0, 0]];
        let value = |i: &LatticeIndex| Some([0.0, 10.0, 10.5][i[0] as usize]);
        let distance = |_: &LatticeIndex, a: &f64, _: &LatticeIndex, b: &f64| (a - b).abs();
        let p = SingleLinkage3d {
            lattice_cutoff: 1.0,
            value_cutoff: 100.0,
            min_clusters: 2,
        };
        let clusters = single_linkage_3d(indices, value, distance, &p);
        assert_eq!(clusters, vec![vec![[0, 0, 0]], vec![[1, 0, 0], [2, 0, 0]]]);
    }

    #[test]
    fn points_without_data_stay_single() {
        let indices = [[0, 0, 0], [1, 0, 0], [2, 0, 0]];
        let value = |i: &LatticeIndex| (i[0] != 1).then_some(0.0);
        let clusters = single_linkage_3d(indices, value, lattice_distance, &params(1.5, 1));
        assert_eq!(clusters.len(), 3);
    }

    #[test]
    fn floor_is_checked_after_merging() {
        // Two points already sit at a floor of two; the closest pair still
        // merges once.
        let p = SingleLinkage3d {
            lattice_cutoff: 1.5,
            value_cutoff: 10.0,
            min_clusters: 2,
        };
        let clusters = single_linkage_3d([[0, 0, 0], [1, 0, 0]], some, lattice_distance, &p);
        assert_eq!(clusters, vec![vec![[0, 0, 0], [1, 0, 0]]]);

        // Without a qualifying pair nothing merges.
        let clusters = single_linkage_3d([[0, 0, 0], [4, 0, 0]], some, lattice_distance, &p);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn duplicates_and_empty() {
        let p = params(2.0, 1);
        let clusters = single_linkage_3d([[0, 0, 0], [0, 0, 0]], some, lattice_distance, &p);
        assert_eq!(clusters, vec![vec![[0, 0, 0]]]);
        let empty: [LatticeIndex; 0] = [];
        assert!(single_linkage_3d(empty, some, lattice_distance, &p).is_empty());
    }

    #[test]
    fn params_from_yaml() {
        let p: SingleLinkage3d =
            serde_yaml::from_str("lattice_cutoff: 2.0\nvalue_cutoff: 1.5\n").unwrap();
        assert_eq!(p.min_clusters, 1);
        assert_eq!(p.value_cutoff, 1.5);
    }
}
