//! StressNet Core - Sensor Propagation over Spatial Graphs
//!
//! Models a structure (a scanned slope, a tunnel, a building shell) as a set
//! of sampled points connected by proximity. A sensor change at one point
//! spreads to nearby points with exponential decay by hop count:
//! 1. **Graph**: nodes with 3D positions and named readings, symmetric adjacency
//! 2. **Propagation**: FIFO breadth-first spread, first visit wins, negligible
//!    branches pruned
//! 3. **Aggregation**: per-sensor averages and 0-100 risk for dashboards
//!
//! ```
//! use nalgebra::Point3;
//! use stressnet_core::{Node, SpatialGraph};
//!
//! let mut graph = SpatialGraph::new(0.7).unwrap();
//! graph.add_node(Node::new(0, Point3::new(0.0, 0.0, 0.0)));
//! graph.add_node(Node::new(1, Point3::new(1.0, 0.0, 0.0)));
//! graph.add_connection(0u64, 1u64).unwrap();
//!
//! graph.propagate_change(0u64, "Temperature_C", 10.0).unwrap();
//! assert!((graph.node(1u64).unwrap().get_sensor("Temperature_C") - 7.0).abs() < 1e-9);
//! ```

pub mod aggregation;
pub mod builder;
pub mod error;
pub mod graph;
pub mod node;
pub mod propagation;
pub mod sensors;
pub mod shared;
pub mod snapshot;

// Re-export key types for convenience
pub use aggregation::{average, node_risk, normalized_risk, overall_risk, RiskReport, SensorSummary};
pub use builder::{GraphBuilder, NodeSample};
pub use error::{GraphError, SensorError};
pub use graph::{GraphConfig, SpatialGraph};
pub use node::{Node, NodeId, SensorKey};
pub use propagation::{AppliedEffect, PropagationEngine, PropagationReport, ToolPlacement};
pub use sensors::{SensorCatalog, SensorRange, SensorSpec};
pub use shared::SharedGraph;
pub use snapshot::{GraphSnapshot, NodeState};
