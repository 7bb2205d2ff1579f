//! Clustering of voxel lattices, dispatched on [`ClusteringConfig`].

use std::hash::Hash;

use hotspot_vptree::{Euclidean, Metric, VpTree};
use tracing::debug;

use crate::config::ClusteringConfig;
use crate::dbscan::dbscan;
use crate::error::ClusterError;
use crate::lattice::LatticeIndex;
use crate::linkage::{SingleLinkage3d, lattice_distance, single_linkage_3d};
use crate::meanshift::{MeanShiftClusters, MeanShiftParams};
use crate::multi::{MergedCluster, merge_clusters, multi_mean_shift};

fn position(idx: &LatticeIndex) -> [f64; 3] {
    idx.map(f64::from)
}

/// Clusters voxels with the strategy selected by `config`, whose distances
/// must already be in lattice units.
///
/// `value` returns the voxel data, `None` outside the grid. Single-linkage
/// links lattice neighbours within `threshold`; DBSCAN uses Euclidean lattice
/// distance; mean-shift additionally weights every voxel by its value.
/// Voxels without data never join another voxel under single-linkage or
/// mean-shift and come back as singleton clusters.
///
/// # Errors
/// Propagates [`ClusterError::EmptyNeighborhood`] from mean-shift.
pub fn cluster_voxels<I, F>(
    indices: I,
    value: F,
    config: &ClusteringConfig,
) -> Result<Vec<Vec<LatticeIndex>>, ClusterError>
where
    I: IntoIterator<Item = LatticeIndex>,
    F: Fn(&LatticeIndex) -> Option<f64>,
{
    let clusters = match *config {
        ClusteringConfig::SingleLinkage { threshold } => {
            let params = SingleLinkage3d::new(threshold);
            single_linkage_3d(indices, value, lattice_distance, &params)
        }
        ClusteringConfig::Dbscan { epsilon, min_pts } => {
            dbscan(indices, Euclidean, epsilon, min_pts).collect()
        }
        ClusteringConfig::MeanShift { bandwidth } => {
            mean_shift_voxels(indices, value, MeanShiftParams::new(bandwidth))?
        }
    };
    debug!(clusters = clusters.len(), ?config, "voxels clustered");
    Ok(clusters)
}

fn mean_shift_voxels<I, F>(
    indices: I,
    value: F,
    params: MeanShiftParams,
) -> Result<Vec<Vec<LatticeIndex>>, ClusterError>
where
    I: IntoIterator<Item = LatticeIndex>,
    F: Fn(&LatticeIndex) -> Option<f64>,
{
    let mut weighted = Vec::new();
    let mut weights = Vec::new();
    let mut singletons = Vec::new();
    for idx in indices {
        match value(&idx) {
            Some(w) => {
                weighted.push(idx);
                weights.push(w);
            }
            None => singletons.push(vec![idx]),
        }
    }
    if !singletons.is_empty() {
        debug!(voxels = singletons.len(), "voxels without data left out of mean-shift");
    }

    let origin = VpTree::build(weighted.iter().map(position), Euclidean);
    let mut modes = MeanShiftClusters::converge(origin, &weights, &Euclidean, params)?;
    let mut out = Vec::new();
    while let Some(mut cluster) = modes.next_cluster() {
        let mut members = Vec::new();
        while let Some(i) = cluster.next_index() {
            members.push(weighted[i]);
        }
        out.push(members);
    }
    out.extend(singletons);
    Ok(out)
}

/// Clusters several voxel sources and combines the result.
///
/// Mean-shift runs once over the summed sources (see
/// [`multi_mean_shift`]); a voxel without data adds no weight. The other
/// strategies cluster every source on its own and merge clusters overlapping
/// by at least `merge_rate` (see [`merge_clusters`]).
pub fn multi_cluster_voxels<S, F, I, G>(
    sources: G,
    config: &ClusteringConfig,
    merge_rate: f64,
) -> Result<Vec<MergedCluster<LatticeIndex, S>>, ClusterError>
where
    S: Hash + Eq + Clone,
    F: Fn(&LatticeIndex) -> Option<f64>,
    I: IntoIterator<Item = LatticeIndex>,
    G: IntoIterator<Item = (I, F, S)>,
{
    if let ClusteringConfig::MeanShift { bandwidth } = *config {
        let groups = sources.into_iter().map(|(indices, value, source)| {
            let weight = move |i: &LatticeIndex| value(i).unwrap_or(0.0);
            (indices, weight, source)
        });
        let params = MeanShiftParams::new(bandwidth);
        let clusters = multi_mean_shift(groups, position, Euclidean, Euclidean, params)?;
        return Ok(clusters.collect());
    }

    let mut clusters = Vec::new();
    for (indices, value, source) in sources {
        for cluster in cluster_voxels(indices, value, config)? {
            clusters.push((cluster, source.clone()));
        }
    }
    Ok(merge_clusters(&clusters, merge_rate))
}

/// Keeps voxels that are dense enough and close to an anchor point.
///
/// A voxel passes when its value is at least `value_threshold` and some
/// anchor lies strictly within `position_cutoff` of its position.
pub struct VoxelFilter<P, D> {
    anchors: VpTree<P, D>,
    value_threshold: f64,
    position_cutoff: f64,
}

impl<P, D: Metric<P>> VoxelFilter<P, D> {
    pub fn new<A>(anchors: A, metric: D, value_threshold: f64, position_cutoff: f64) -> Self
    where
        A: IntoIterator<Item = P>,
    {
        Self {
            anchors: VpTree::build(anchors, metric),
            value_threshold,
            position_cutoff,
        }
    }

    /// Checks one voxel given its value and position.
    pub fn accepts(&self, value: Option<f64>, position: &P) -> bool {
        value.is_some_and(|v| v >= self.value_threshold)
            && self.anchors.exists_within(position, self.position_cutoff)
    }

    /// Returns the voxels of `indices` that pass, in input order.
    pub fn retain<I, F, L>(&self, indices: I, value: F, locate: L) -> Vec<LatticeIndex>
    where
        I: IntoIterator<Item = LatticeIndex>,
        F: Fn(&LatticeIndex) -> Option<f64>,
        L: Fn(&LatticeIndex) -> P,
    {
        indices
            .into_iter()
            .filter(|i| self.accepts(value(i), &locate(i)))
            .collect()
    }
}
