//! Integer lattice helpers for voxel-indexed data.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Position of a voxel on the 3D integer lattice.
pub type LatticeIndex = [i32; 3];

/// Radii within this of an integer are widened so that lattice points at
/// exactly the radius are kept.
const RADIUS_EPSILON: f64 = 1e-8;

const AXIS_STEPS: [(LatticeIndex, usize, bool); 6] = [
    ([1, 0, 0], 0, true),
    ([0, 1, 0], 1, true),
    ([0, 0, 1], 2, true),
    ([-1, 0, 0], 0, false),
    ([0, -1, 0], 1, false),
    ([0, 0, -1], 2, false),
];

/// Inclusive lattice bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeBox {
    pub min: LatticeIndex,
    pub max: LatticeIndex,
}

impl LatticeBox {
    pub fn contains(&self, idx: &LatticeIndex) -> bool {
        (0..3).all(|ax| self.min[ax] <= idx[ax] && idx[ax] <= self.max[ax])
    }
}

/// Adds two lattice indices.
pub(crate) fn offset(idx: &LatticeIndex, by: &LatticeIndex) -> LatticeIndex {
    [idx[0] + by[0], idx[1] + by[1], idx[2] + by[2]]
}

/// Returns every offset within Euclidean distance `r` of the origin, origin
/// included, in lexicographic order.
///
/// A negative or NaN radius gives no offsets.
pub fn sphere_offsets(r: f64) -> Vec<LatticeIndex> {
    if r.is_nan() || r < 0.0 {
        return Vec::new();
    }
    let r = if r - r.floor() < RADIUS_EPSILON {
        r * (1.0 + RADIUS_EPSILON)
    } else {
        r
    };
    let r2 = r * r;
    let max = r.floor() as i32;

    let mut out = Vec::new();
    for i in -max..=max {
        for j in -max..=max {
            for k in -max..=max {
                if f64::from(i * i + j * j + k * k) <= r2 {
                    out.push([i, j, k]);
                }
            }
        }
    }
    out
}

/// Returns the offsets of [`sphere_offsets`] that compare greater than the
/// origin. For any two lattice points within `r`, exactly one of them reaches
/// the other through one of these offsets.
pub fn half_sphere_offsets(r: f64) -> Vec<LatticeIndex> {
    sphere_offsets(r)
        .into_iter()
        .filter(|o| *o > [0, 0, 0])
        .collect()
}

/// Grows a lattice cluster by `margin` lattice units.
///
/// Every boundary voxel, one with an axis neighbour outside the cluster and
/// not beyond `bounds`, contributes the ball of radius `margin` around it.
/// Added voxels are clipped to `bounds`. Returns the grown set in
/// lexicographic order.
///
/// Boundary is judged against the input cluster only, never against voxels
/// added during the same call, so the result does not depend on iteration
/// order even though it can grow wider than a sequential expansion would.
pub fn expand_cluster<I>(
    indices: I,
    margin: f64,
    bounds: Option<&LatticeBox>,
) -> Vec<LatticeIndex>
where
    I: IntoIterator<Item = LatticeIndex>,
{
    let cluster: HashSet<LatticeIndex> = indices.into_iter().collect();
    let ball = sphere_offsets(margin);
    let mut grown = cluster.clone();

    for idx in &cluster {
        let on_boundary = AXIS_STEPS.iter().any(|(step, ax, upward)| {
            let at_edge = bounds.is_some_and(|b| {
                if *upward {
                    idx[*ax] >= b.max[*ax]
                } else {
                    idx[*ax] <= b.min[*ax]
                }
            });
            !at_edge && !cluster.contains(&offset(idx, step))
        });
        if !on_boundary {
            continue;
        }
        grown.extend(
            ball.iter()
                .map(|o| offset(idx, o))
                .filter(|p| bounds.is_none_or(|b| b.contains(p))),
        );
    }

    let mut out: Vec<LatticeIndex> = grown.into_iter().collect();
    out.sort_unstable();
    out
}

/// Divides a physical distance by the voxel width.
///
/// A non-zero integral result is nudged away from zero by `1e-8` so lattice
/// points never sit exactly on the resulting cutoff.
pub fn to_index_unit(value: f64, voxel_width: f64) -> f64 {
    let v = value / voxel_width;
    if v.fract() == 0.0 && v != 0.0 {
        v + 1e-8f64.copysign(v)
    } else {
        v
    }
}
