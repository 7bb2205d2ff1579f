//! Hotspot clustering over metric and lattice data.
//!
//! Built on [`hotspot_vptree`]: neighbor merge (connected components under a
//! distance cutoff), DBSCAN, weighted mean-shift, lattice single-linkage, a
//! union-find [`ClusterTable`] and the multi-source merges that combine
//! clusters found per source.
//!
//! # Usage
//!
//! ```
//! use hotspot_cluster::{dbscan, neighbor_merge};
//! use hotspot_vptree::Euclidean;
//!
//! let points = vec![[0.0], [1.0], [2.0], [10.0], [11.0], [30.0]];
//!
//! let clusters: Vec<Vec<[f64; 1]>> = neighbor_merge(points.clone(), Euclidean, 1.5).collect();
//! assert_eq!(clusters.len(), 3);
//!
//! // [30.0] is too sparse for a cluster of its own.
//! let labels = dbscan(points, Euclidean, 1.5, 2).into_labels();
//! assert_eq!(labels, vec![Some(0), Some(0), Some(0), Some(1), Some(1), None]);
//! ```
//!
//! # Lazy clusters
//!
//! Neighbor merge, DBSCAN and mean-shift decide membership while clusters are
//! drawn. [`Clusters::next_cluster`] lends one [`Cluster`] at a time; a
//! cluster dropped half-read is finished silently so the following ones stay
//! exact. The sequence is single-pass.

mod config;
mod dbscan;
mod error;
mod expand;
mod lattice;
mod linkage;
mod meanshift;
mod multi;
mod neighbor;
mod table;
mod vector;
mod voxel;

pub use config::ClusteringConfig;
pub use dbscan::{dbscan, dbscan_tree};
pub use error::ClusterError;
pub use expand::{Cluster, Clusters};
pub use lattice::{
    LatticeBox, LatticeIndex, expand_cluster, half_sphere_offsets, sphere_offsets, to_index_unit,
};
pub use linkage::{SingleLinkage3d, lattice_distance, single_linkage_3d};
pub use meanshift::{
    MeanShiftCluster, MeanShiftClusters, MeanShiftDetails, MeanShiftParams, ModeCluster,
    weighted_mean_shift, weighted_mean_shift_detail,
};
pub use multi::{
    MergedCluster, MultiMeanShift, WeightedUnion, merge_clusters, multi_mean_shift, sum_weights,
};
pub use neighbor::{neighbor_merge, neighbor_merge_tree};
pub use table::ClusterTable;
pub use vector::VectorSpace;
pub use voxel::{VoxelFilter, cluster_voxels, multi_cluster_voxels};
