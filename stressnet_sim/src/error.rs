//! Error types for the simulation harness.

use stressnet_core::GraphError;
use thiserror::Error;

/// Errors raised while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Graph construction, sample validation or propagation failed
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Reading a config file or writing an export failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config or export (de)serialization failed
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration value out of range
    #[error("Config error: {0}")]
    Config(String),
}

impl SimError {
    /// Creates a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
