//! Error types for the StressNet core.

use crate::node::NodeId;
use thiserror::Error;

/// Errors raised by graph construction, connection and propagation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// An operation referenced a node id that is not registered
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// Decay factor outside (0, 1]
    #[error("Invalid decay {0}: must be in (0, 1]")]
    InvalidDecay(f64),

    /// Negligibility threshold below zero or not finite
    #[error("Invalid minimum effect {0}: must be finite and >= 0")]
    InvalidMinEffect(f64),

    /// Proximity radius below zero or not finite
    #[error("Invalid proximity radius {0}: must be finite and >= 0")]
    InvalidRadius(f64),

    /// An ingested sample named a sensor outside the catalog
    #[error(transparent)]
    Sensor(#[from] SensorError),
}

impl GraphError {
    /// Creates an unknown-node error.
    pub fn unknown(id: impl Into<NodeId>) -> Self {
        Self::UnknownNode(id.into())
    }
}

/// Errors raised when validating sensor names at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    /// Sensor name not present in the catalog
    #[error("Unknown sensor: {0}")]
    UnknownSensor(String),
}
