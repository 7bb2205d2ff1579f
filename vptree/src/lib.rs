//! Vantage-point tree for exact nearest-neighbor and range queries over any
//! metric space.
//!
//! The tree is built once from an iterator of elements plus a distance
//! function and is immutable afterwards. Queries prune with the triangle
//! inequality, so results are exact as long as the distance is a metric.
//!
//! # Usage
//!
//! ```
//! use hotspot_vptree::{Euclidean, VpTree};
//!
//! let tree = VpTree::build(vec![[0.0, 0.0], [3.0, 4.0], [10.0, 0.0]], Euclidean);
//!
//! let m = tree.nearest(&[2.5, 4.0]).unwrap();
//! assert_eq!(m.index, 1);
//!
//! let near: Vec<usize> = tree.range(&[0.0, 0.0], 6.0).iter().map(|m| m.index).collect();
//! assert_eq!(near.len(), 2);
//!
//! assert!(!tree.exists_within(&[100.0, 0.0], 50.0));
//! ```
//!
//! # Structure
//!
//! Every node either holds a pivot element or further splits its ancestor
//! pivot's near region. A split stores the median distance from the pivot to
//! the elements of its range: elements sorted before the median go to the
//! near side, the median element becomes the pivot of the far side.

pub mod linear;
mod metric;
mod search;
mod tree;

pub use metric::{Euclidean, Metric};
pub use tree::{Match, VpTree};
