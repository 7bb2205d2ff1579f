use thiserror::Error;

/// Errors returned by clustering operations.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cluster: element not found in cluster table")]
    NotFound,

    #[error("cluster: no neighbors within bandwidth {bandwidth} during mean-shift update")]
    EmptyNeighborhood { bandwidth: f64 },

    #[error("cluster: invalid config: {0}")]
    InvalidConfig(String),
}
