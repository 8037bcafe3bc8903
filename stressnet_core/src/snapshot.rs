//! Serializable view of a graph for visualization and reporting layers.

use crate::aggregation::RiskReport;
use crate::graph::SpatialGraph;
use crate::node::{NodeId, SensorKey};
use crate::sensors::SensorCatalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// State of one node at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub id: NodeId,
    pub position: [f64; 3],
    pub sensors: BTreeMap<SensorKey, f64>,
}

/// Consistent copy of a graph's nodes, edges and risk figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub pass_id: Uuid,
    pub decay: f64,
    /// Sorted by id
    pub nodes: Vec<NodeState>,
    /// Each undirected edge once, as `(low, high)`
    pub edges: Vec<(NodeId, NodeId)>,
    pub risk: RiskReport,
}

impl GraphSnapshot {
    pub fn capture(graph: &SpatialGraph, catalog: &SensorCatalog) -> Self {
        let nodes = graph
            .node_ids()
            .into_iter()
            .filter_map(|id| graph.node(id))
            .map(|node| {
                let p = node.position();
                NodeState {
                    id: node.id(),
                    position: [p.x, p.y, p.z],
                    sensors: node.sensors().clone(),
                }
            })
            .collect();

        Self {
            pass_id: graph.pass_id(),
            decay: graph.decay(),
            nodes,
            edges: graph.edges(),
            risk: RiskReport::compute(graph, catalog),
        }
    }

    pub fn node(&self, id: impl Into<NodeId>) -> Option<&NodeState> {
        let id = id.into();
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
