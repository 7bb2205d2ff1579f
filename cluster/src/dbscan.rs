use hotspot_vptree::{Metric, VpTree};
use tracing::debug;

use crate::expand::Clusters;

/// Runs density-based clustering (DBSCAN) over `elements`.
///
/// # Parameters
/// - `bandwidth`: neighbors are elements strictly closer than this (epsilon)
/// - `density_threshold`: minimum neighborhood size, the element itself
///   included, for an element to seed or extend a cluster (min points)
///
/// # Returns
/// A lazy sequence of clusters. Elements too sparse to seed a cluster are
/// noise unless a dense element reaches them, in which case they join as
/// border members without extending the cluster further. Noise never
/// appears in any cluster; use [`Clusters::into_labels`] to see it.
///
/// With `density_threshold == 1` the partition equals
/// [`neighbor_merge`](crate::neighbor_merge) with the same bandwidth.
pub fn dbscan<T, D, I>(
    elements: I,
    metric: D,
    bandwidth: f64,
    density_threshold: usize,
) -> Clusters<T, D>
where
    D: Metric<T>,
    I: IntoIterator<Item = T>,
{
    let tree = VpTree::build(elements, metric);
    dbscan_tree(tree, bandwidth, density_threshold)
}

/// Same as [`dbscan`] over an already built index.
pub fn dbscan_tree<T, D: Metric<T>>(
    tree: VpTree<T, D>,
    bandwidth: f64,
    density_threshold: usize,
) -> Clusters<T, D> {
    debug!(elements = tree.len(), bandwidth, density_threshold, "dbscan");
    Clusters::new(tree, bandwidth, density_threshold)
}
