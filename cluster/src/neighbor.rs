use hotspot_vptree::{Metric, VpTree};
use tracing::debug;

use crate::expand::Clusters;

/// Groups elements into connected components of the "closer than
/// `bandwidth`" relation.
///
/// Every element ends up in exactly one cluster. A non-positive bandwidth
/// yields one singleton per element.
pub fn neighbor_merge<T, D, I>(elements: I, metric: D, bandwidth: f64) -> Clusters<T, D>
where
    D: Metric<T>,
    I: IntoIterator<Item = T>,
{
    neighbor_merge_tree(VpTree::build(elements, metric), bandwidth)
}

/// Same as [`neighbor_merge`] over an already built index.
pub fn neighbor_merge_tree<T, D: Metric<T>>(tree: VpTree<T, D>, bandwidth: f64) -> Clusters<T, D> {
    debug!(elements = tree.len(), bandwidth, "neighbor merge");
    Clusters::new(tree, bandwidth, 0)
}
