use serde::{Deserialize, Serialize};

use crate::error::ClusterError;
use crate::lattice::to_index_unit;

/// Selects the clustering strategy and its parameters.
///
/// ```yaml
/// algorithm: dbscan
/// epsilon: 1.5
/// min_pts: 4
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum ClusteringConfig {
    /// Lattice single-linkage, `threshold` used for both cutoffs.
    SingleLinkage { threshold: f64 },

    /// DBSCAN with neighborhood radius `epsilon`.
    Dbscan { epsilon: f64, min_pts: usize },

    /// Weighted mean-shift.
    MeanShift { bandwidth: f64 },
}

impl ClusteringConfig {
    /// Parses a config from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self, ClusterError> {
        serde_json::from_slice(data).map_err(|e| ClusterError::InvalidConfig(e.to_string()))
    }

    /// Parses a config from YAML bytes.
    pub fn from_yaml(data: &[u8]) -> Result<Self, ClusterError> {
        serde_yaml::from_slice(data).map_err(|e| ClusterError::InvalidConfig(e.to_string()))
    }

    /// Converts every distance from physical units to lattice units.
    pub fn to_index_unit(self, voxel_width: f64) -> Self {
        match self {
            Self::SingleLinkage { threshold } => Self::SingleLinkage {
                threshold: to_index_unit(threshold, voxel_width),
            },
            Self::Dbscan { epsilon, min_pts } => Self::Dbscan {
                epsilon: to_index_unit(epsilon, voxel_width),
                min_pts,
            },
            Self::MeanShift { bandwidth } => Self::MeanShift {
                bandwidth: to_index_unit(bandwidth, voxel_width),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_each_algorithm() {
        let yaml = b"algorithm: single_linkage\nthreshold: 2.0\n";
        let c = ClusteringConfig::from_yaml(yaml).unwrap();
        assert_eq!(c, ClusteringConfig::SingleLinkage { threshold: 2.0 });

        let yaml = b"algorithm: dbscan\nepsilon: 1.5\nmin_pts: 4\n";
        let c = ClusteringConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            c,
            ClusteringConfig::Dbscan {
                epsilon: 1.5,
                min_pts: 4
            }
        );

        let json = br#"{"algorithm":"mean_shift","bandwidth":3.0}"#;
        let c = ClusteringConfig::from_json(json).unwrap();
        assert_eq!(c, ClusteringConfig::MeanShift { bandwidth: 3.0 });
    }

    #[test]
    fn unknown_algorithm_is_invalid() {
        let err = ClusteringConfig::from_yaml(b"algorithm: kmeans\nk: 3\n").unwrap_err();
        assert!(matches!(err, ClusterError::InvalidConfig(_)));
        assert!(err.to_string().starts_with("cluster: invalid config"));
    }

    #[test]
    fn missing_field_is_invalid() {
        let json = br#"{"algorithm":"dbscan","epsilon":1.0}"#;
        let err = ClusteringConfig::from_json(json).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidConfig(_)));
    }

    #[test]
    fn serializes_with_tag() {
        let json = serde_json::to_string(&ClusteringConfig::MeanShift { bandwidth: 2.5 }).unwrap();
        assert_eq!(json, r#"{"algorithm":"mean_shift","bandwidth":2.5}"#);
    }

    #[test]
    fn index_unit_leaves_min_pts() {
        let c = ClusteringConfig::Dbscan {
            epsilon: 3.0,
            min_pts: 4,
        }
        .to_index_unit(0.5);
        assert_eq!(
            c,
            ClusteringConfig::Dbscan {
                epsilon: 6.0 + 1e-8,
                min_pts: 4
            }
        );

        let c = ClusteringConfig::MeanShift { bandwidth: 1.25 }.to_index_unit(0.5);
        assert_eq!(c, ClusteringConfig::MeanShift { bandwidth: 2.5 });
    }

    #[test]
    fn index_unit_keeps_the_original() {
        let physical = ClusteringConfig::SingleLinkage { threshold: 1.0 };
        let lattice = physical.to_index_unit(0.25);
        let threshold = to_index_unit(1.0, 0.25);
        assert_eq!(lattice, ClusteringConfig::SingleLinkage { threshold });
        assert_eq!(physical, ClusteringConfig::SingleLinkage { threshold: 1.0 });
    }
}
