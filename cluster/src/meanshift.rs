use hotspot_vptree::{Match, Metric, VpTree};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ClusterError;
use crate::expand::{Cluster, Clusters};
use crate::vector::VectorSpace;

/// Movement below this fraction of the bandwidth ends an element's updates.
const CONVERGENCE_RATE: f64 = 0.001;

/// Controls weighted mean-shift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanShiftParams {
    /// Radius of the neighborhood whose weighted centroid replaces a point.
    pub bandwidth: f64,

    /// Converged points closer than this end up in the same cluster.
    /// Default (0): the convergence threshold, `0.001 * bandwidth`.
    #[serde(default)]
    pub merge_radius: f64,
}

impl MeanShiftParams {
    /// Creates parameters with the default merge radius.
    pub fn new(bandwidth: f64) -> Self {
        Self {
            bandwidth,
            merge_radius: 0.0,
        }
    }

    /// Returns the step length below which an element counts as converged.
    pub fn convergence_threshold(&self) -> f64 {
        self.bandwidth * CONVERGENCE_RATE
    }

    fn with_defaults(mut self) -> Self {
        if self.merge_radius == 0.0 {
            self.merge_radius = self.convergence_threshold();
        }
        self
    }
}

/// Runs weighted mean-shift over `elements`.
///
/// Each element moves to the weighted centroid of the originals strictly
/// within `bandwidth` of its current position until a step moves it less
/// than the convergence threshold. Converged points are then grouped with
/// [`neighbor_merge`](crate::neighbor_merge) at `merge_radius`, and every
/// cluster yields the original elements whose points converged together.
///
/// Convergence runs eagerly here; grouping is lazy.
///
/// # Errors
/// [`ClusterError::EmptyNeighborhood`] if a point ever has no original
/// within `bandwidth`, which means the bandwidth is too small for the
/// spacing of the data.
pub fn weighted_mean_shift<T, D, V, W, I>(
    elements: I,
    weight: W,
    metric: D,
    space: V,
    params: MeanShiftParams,
) -> Result<MeanShiftClusters<T, D>, ClusterError>
where
    T: Clone,
    D: Metric<T> + Clone,
    V: VectorSpace<T>,
    W: Fn(&T) -> f64,
    I: IntoIterator<Item = T>,
{
    let origin = VpTree::build(elements, metric);
    let weights: Vec<f64> = origin.items().iter().map(weight).collect();
    MeanShiftClusters::converge(origin, &weights, &space, params)
}

/// Same as [`weighted_mean_shift`], returning each cluster together with its
/// converged center and the original element nearest to that center.
pub fn weighted_mean_shift_detail<T, D, V, W, I>(
    elements: I,
    weight: W,
    metric: D,
    space: V,
    params: MeanShiftParams,
) -> Result<MeanShiftDetails<T, D>, ClusterError>
where
    T: Clone,
    D: Metric<T> + Clone,
    V: VectorSpace<T>,
    W: Fn(&T) -> f64,
    I: IntoIterator<Item = T>,
{
    let clusters = weighted_mean_shift(elements, weight, metric, space, params)?;
    Ok(clusters.detailed())
}

/// Lazy clusters produced by weighted mean-shift.
///
/// Like [`Clusters`], this is single-pass: pull clusters with
/// [`MeanShiftClusters::next_cluster`] or iterate for owned `Vec`s.
pub struct MeanShiftClusters<T, D> {
    origin: VpTree<T, D>,
    merged: Clusters<T, D>,
}

impl<T, D> MeanShiftClusters<T, D>
where
    T: Clone,
    D: Metric<T> + Clone,
{
    pub(crate) fn converge<V: VectorSpace<T>>(
        origin: VpTree<T, D>,
        weights: &[f64],
        space: &V,
        params: MeanShiftParams,
    ) -> Result<Self, ClusterError> {
        let params = params.with_defaults();
        let threshold = params.convergence_threshold();
        debug!(
            elements = origin.len(),
            bandwidth = params.bandwidth,
            merge_radius = params.merge_radius,
            "weighted mean-shift"
        );

        let gravity = Gravity {
            origin: &origin,
            weights,
            space,
            bandwidth: params.bandwidth,
        };

        let mut modes = Vec::with_capacity(origin.len());
        let mut total_steps = 0usize;
        for (i, start) in origin.items().iter().enumerate() {
            let mut cur = start.clone();
            let mut steps = 0usize;
            loop {
                let next = gravity.update(&cur)?;
                steps += 1;
                let moved = origin.metric().distance(&cur, &next);
                cur = next;
                if moved < threshold {
                    break;
                }
            }
            trace!(element = i, steps, "converged");
            total_steps += steps;
            modes.push(cur);
        }
        debug!(elements = modes.len(), total_steps, "mean-shift converged");

        let merged = Clusters::new(
            VpTree::build(modes, origin.metric().clone()),
            params.merge_radius,
            0,
        );
        Ok(Self { origin, merged })
    }
}

impl<T, D: Metric<T>> MeanShiftClusters<T, D> {
    /// Starts the next cluster; see [`Clusters::next_cluster`].
    pub fn next_cluster(&mut self) -> Option<MeanShiftCluster<'_, T, D>> {
        let inner = self.merged.next_cluster()?;
        Some(MeanShiftCluster {
            inner,
            origin: &self.origin,
        })
    }

    /// Returns the index over the original elements.
    pub fn origin(&self) -> &VpTree<T, D> {
        &self.origin
    }

    /// Returns the converged point of every original element, in input order.
    pub fn modes(&self) -> &[T] {
        self.merged.tree().items()
    }

    /// Switches to yielding [`ModeCluster`]s.
    pub fn detailed(self) -> MeanShiftDetails<T, D> {
        MeanShiftDetails { clusters: self }
    }
}

impl<T: Clone, D: Metric<T>> Iterator for MeanShiftClusters<T, D> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        self.next_cluster().map(|c| c.cloned().collect())
    }
}

/// One mean-shift cluster being drawn; yields original elements.
pub struct MeanShiftCluster<'a, T, D: Metric<T>> {
    inner: Cluster<'a, T, D>,
    origin: &'a VpTree<T, D>,
}

impl<'a, T, D: Metric<T>> MeanShiftCluster<'a, T, D> {
    /// Returns the converged point of the element that started the cluster.
    pub fn mode(&self) -> &'a T {
        self.inner.first()
    }

    /// Returns the original element nearest to [`MeanShiftCluster::mode`].
    pub fn nearest_original(&self) -> Option<Match> {
        self.origin.nearest(self.mode())
    }

    /// Returns the input position of the next member.
    pub fn next_index(&mut self) -> Option<usize> {
        self.inner.next_index()
    }
}

impl<'a, T, D: Metric<T>> Iterator for MeanShiftCluster<'a, T, D> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let origin = self.origin;
        self.inner.next_index().map(|i| &origin.items()[i])
    }
}

/// A mean-shift cluster with its convergence details.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeCluster<T> {
    /// Original elements in the cluster.
    pub members: Vec<T>,

    /// Converged point of the first member.
    pub mode: T,

    /// Original element nearest to `mode`, by input position.
    pub nearest: Match,
}

/// Iterator over [`ModeCluster`]s.
pub struct MeanShiftDetails<T, D> {
    clusters: MeanShiftClusters<T, D>,
}

impl<T: Clone, D: Metric<T>> Iterator for MeanShiftDetails<T, D> {
    type Item = ModeCluster<T>;

    fn next(&mut self) -> Option<ModeCluster<T>> {
        let cluster = self.clusters.next_cluster()?;
        let mode = cluster.mode().clone();
        let nearest = cluster.nearest_original()?;
        Some(ModeCluster {
            members: cluster.cloned().collect(),
            mode,
            nearest,
        })
    }
}

/// One gravity update: the weighted centroid of the bandwidth-neighborhood.
///
/// A neighborhood whose weights sum to zero has no centroid; the point stays
/// where it is and so converges on the spot.
struct Gravity<'a, T, D, V> {
    origin: &'a VpTree<T, D>,
    weights: &'a [f64],
    space: &'a V,
    bandwidth: f64,
}

impl<T: Clone, D: Metric<T>, V: VectorSpace<T>> Gravity<'_, T, D, V> {
    fn update(&self, query: &T) -> Result<T, ClusterError> {
        let neighbors = self.origin.range(query, self.bandwidth);
        let (first, rest) = neighbors
            .split_first()
            .ok_or(ClusterError::EmptyNeighborhood {
                bandwidth: self.bandwidth,
            })?;

        let items = self.origin.items();
        let mut total = self.weights[first.index];
        let mut sum = self.space.scale(&items[first.index], total);
        for m in rest {
            let w = self.weights[m.index];
            total += w;
            sum = self.space.add(&sum, &self.space.scale(&items[m.index], w));
        }
        if total == 0.0 {
            trace!(neighbors = neighbors.len(), "weightless neighborhood");
            return Ok(query.clone());
        }
        Ok(self.space.scale(&sum, 1.0 / total))
    }
}

#[cfg(test)]
mod tests {
    use hotspot_vptree::Euclidean;

    use super::*;

    fn unit(_: &[f64; 2]) -> f64 {
        1.0
    }

    #[test]
    fn tight_group_converges_to_one_cluster() {
        let points = vec![[0.0, 0.0], [0.3, 0.0], [0.0, 0.3], [0.3, 0.3], [0.15, 0.15]];
        let params = MeanShiftParams::new(1.0);
        let clusters: Vec<Vec<[f64; 2]>> =
            weighted_mean_shift(points.clone(), unit, Euclidean, Euclidean, params)
                .unwrap()
                .collect();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), points.len());
        for p in &points {
            assert!(clusters[0].contains(p));
        }
    }

    #[test]
    fn separated_groups_stay_apart() {
        let points = vec![
            [0.0, 0.0],
            [0.5, 0.0],
            [0.0, 0.5],
            [20.0, 20.0],
            [20.5, 20.0],
            [20.0, 20.5],
        ];
        let params = MeanShiftParams::new(2.0);
        let mut clusters: Vec<Vec<[f64; 2]>> =
            weighted_mean_shift(points, unit, Euclidean, Euclidean, params)
                .unwrap()
                .collect();
        clusters.sort_by(|a, b| a[0][0].total_cmp(&b[0][0]));
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 3);
        assert!(clusters[0].iter().all(|p| p[0] < 1.0));
        assert!(clusters[1].iter().all(|p| p[0] > 19.0));
    }

    #[test]
    fn weights_pull_the_mode() {
        // Symmetric pair, the heavy point dominates the centroid.
        let points = vec![[0.0], [1.0]];
        let weight = |p: &[f64; 1]| if p[0] == 1.0 { 3.0 } else { 1.0 };
        let params = MeanShiftParams::new(2.0);
        let details: Vec<ModeCluster<[f64; 1]>> =
            weighted_mean_shift_detail(points, weight, Euclidean, Euclidean, params)
                .unwrap()
                .collect();
        assert_eq!(details.len(), 1);
        let mode = details[0].mode;
        assert!((mode[0] - 0.75).abs() < 1e-9, "mode {mode:?}");
        assert_eq!(details[0].nearest.index, 1);
    }

    #[test]
    fn detail_reports_mode_and_nearest_original() {
        let points = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.5, 0.5]];
        let params = MeanShiftParams::new(2.0);
        let details: Vec<ModeCluster<[f64; 2]>> =
            weighted_mean_shift_detail(points, unit, Euclidean, Euclidean, params)
                .unwrap()
                .collect();
        assert_eq!(details.len(), 1);
        let mode = details[0].mode;
        assert!((mode[0] - 0.5).abs() < 1e-9 && (mode[1] - 0.5).abs() < 1e-9, "mode {mode:?}");
        assert_eq!(details[0].nearest.index, 4);
        assert_eq!(details[0].members.len(), 5);
    }

    #[test]
    fn empty_neighborhood_is_an_error() {
        let points = vec![[0.0], [1.0]];
        let params = MeanShiftParams::new(0.0);
        let res = weighted_mean_shift(points, |_: &[f64; 1]| 1.0, Euclidean, Euclidean, params);
        assert!(matches!(res, Err(ClusterError::EmptyNeighborhood { .. })));
    }

    #[test]
    fn weightless_points_stay_in_place() {
        // The far point and its neighborhood carry no weight; it converges
        // where it started instead of failing.
        let points = vec![[0.0], [1.0], [20.0]];
        let weight = |p: &[f64; 1]| if p[0] < 10.0 { 1.0 } else { 0.0 };
        let params = MeanShiftParams::new(3.0);
        let clusters = weighted_mean_shift(points, weight, Euclidean, Euclidean, params).unwrap();
        let modes = clusters.modes();
        assert!((modes[0][0] - 0.5).abs() < 1e-9);
        assert!((modes[1][0] - 0.5).abs() < 1e-9);
        assert_eq!(modes[2], [20.0]);
        assert_eq!(clusters.count(), 2);
    }

    #[test]
    fn closure_vector_space() {
        let points = vec![1.0_f64, 1.2, 1.1, 9.0, 9.1];
        let space = (|a: &f64, b: &f64| a + b, |a: &f64, w: f64| a * w);
        let metric = |a: &f64, b: &f64| (a - b).abs();
        let params = MeanShiftParams::new(1.0);
        let clusters = weighted_mean_shift(points, |_: &f64| 1.0, metric, space, params).unwrap();
        let clusters: Vec<Vec<f64>> = clusters
            .map(|mut c| {
                c.sort_by(f64::total_cmp);
                c
            })
            .collect();
        assert_eq!(clusters, vec![vec![1.0, 1.1, 1.2], vec![9.0, 9.1]]);
    }

    #[test]
    fn modes_are_reported_in_input_order() {
        let points = vec![[0.0], [0.4], [10.0]];
        let params = MeanShiftParams::new(1.0);
        let clusters =
            weighted_mean_shift(points, |_: &[f64; 1]| 1.0, Euclidean, Euclidean, params).unwrap();
        let modes = clusters.modes();
        assert_eq!(modes.len(), 3);
        assert!((modes[0][0] - 0.2).abs() < 1e-9);
        assert!((modes[1][0] - 0.2).abs() < 1e-9);
        assert_eq!(modes[2], [10.0]);
    }

    #[test]
    fn params_defaults() {
        let p = MeanShiftParams::new(2.0);
        assert_eq!(p.convergence_threshold(), 0.002);
        assert_eq!(p.with_defaults().merge_radius, 0.002);
        let p = MeanShiftParams {
            bandwidth: 2.0,
            merge_radius: 0.5,
        };
        assert_eq!(p.with_defaults().merge_radius, 0.5);
    }
}
