//! The propagation engine - decayed breadth-first spread of a sensor change.
//!
//! A change applied at a source node spreads to its neighbors, their
//! neighbors and so on. The effect reaching a node `h` hops away is
//!
//! ```text
//! effect(h) = delta * decay^h
//! ```
//!
//! always computed from the original `delta`, never compounded from the
//! effect of the parent hop. Branches whose effect would not exceed the
//! graph's `min_effect` are never enqueued, which bounds the spread radius.
//!
//! Traversal is FIFO, so the first visit to a node is also its shortest hop
//! distance. Each node is mutated at most once per call.

use crate::error::GraphError;
use crate::graph::SpatialGraph;
use crate::node::{NodeId, SensorKey};
use crate::sensors::SensorRange;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Adjustments smaller than this are treated as "no change".
const NO_CHANGE_EPSILON: f64 = 1e-9;

/// One applied effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedEffect {
    pub node: NodeId,
    /// Hop distance from the source
    pub hops: u32,
    pub effect: f64,
}

/// Outcome of a single propagation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationReport {
    pub source: NodeId,
    pub sensor: SensorKey,
    pub delta: f64,
    /// Effects in the order they were applied (non-decreasing hop count)
    pub applied: Vec<AppliedEffect>,
    /// Number of neighbor branches dropped as negligible
    pub pruned: usize,
}

impl PropagationReport {
    /// Number of nodes that received an effect.
    pub fn visited(&self) -> usize {
        self.applied.len()
    }

    /// Largest hop distance that received an effect.
    pub fn max_hops(&self) -> u32 {
        self.applied.iter().map(|e| e.hops).max().unwrap_or(0)
    }

    /// Effect applied to `node`, if it was reached.
    pub fn effect_on(&self, node: impl Into<NodeId>) -> Option<f64> {
        let node = node.into();
        self.applied.iter().find(|e| e.node == node).map(|e| e.effect)
    }
}

/// Spreads a sensor change through a [`SpatialGraph`].
///
/// The engine only borrows the graph for the duration of a call; it holds no
/// state of its own beyond scratch buffers.
pub struct PropagationEngine<'g> {
    graph: &'g mut SpatialGraph,
}

impl<'g> PropagationEngine<'g> {
    pub fn new(graph: &'g mut SpatialGraph) -> Self {
        Self { graph }
    }

    /// Adds `delta` to `key` at `source` and spreads it with per-hop decay.
    ///
    /// Fails with [`GraphError::UnknownNode`] before touching any state when
    /// the source is not registered.
    pub fn propagate_change(
        &mut self,
        source: impl Into<NodeId>,
        key: impl Into<SensorKey>,
        delta: f64,
    ) -> Result<PropagationReport, GraphError> {
        let source = source.into();
        let key = key.into();
        self.graph.require(source)?;

        let decay = self.graph.decay();
        let min_effect = self.graph.config().min_effect;

        let _span = tracing::debug_span!("propagate", %source, sensor = %key, delta).entered();

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<(NodeId, u32, f64)> = VecDeque::new();
        queue.push_back((source, 0, delta));

        let mut applied = Vec::new();
        let mut pruned = 0usize;

        while let Some((id, hops, effect)) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }

            // Every queued id was either the checked source or a neighbor
            // listed in adjacency, and adjacency only references registered nodes.
            let Some(node) = self.graph.node_mut(id) else {
                continue;
            };
            node.add_to_sensor(key.as_str(), effect);
            applied.push(AppliedEffect { node: id, hops, effect });

            let weakened = delta * decay.powi(hops as i32 + 1);
            if let Some(neighbors) = self.graph.neighbor_set(id) {
                for &neighbor in neighbors {
                    if visited.contains(&neighbor) {
                        continue;
                    }
                    if weakened.abs() > min_effect {
                        queue.push_back((neighbor, hops + 1, weakened));
                    } else {
                        pruned += 1;
                        tracing::trace!(%neighbor, weakened, "negligible effect pruned");
                    }
                }
            }
        }

        let report = PropagationReport {
            source,
            sensor: key,
            delta,
            applied,
            pruned,
        };
        tracing::debug!(
            visited = report.visited(),
            max_hops = report.max_hops(),
            pruned = report.pruned,
            "propagation complete"
        );
        Ok(report)
    }

    /// Steps a sensor by `step`, clamped to `range`, and propagates the
    /// resulting delta.
    ///
    /// The delta is `clamp(old + step) - old`, so the source never leaves the
    /// range. Returns `Ok(None)` when clamping leaves nothing to apply.
    pub fn adjust_sensor(
        &mut self,
        node: impl Into<NodeId>,
        key: impl Into<SensorKey>,
        step: f64,
        range: SensorRange,
    ) -> Result<Option<PropagationReport>, GraphError> {
        let node = node.into();
        let key = key.into();
        let old = self.graph.require(node)?.get_sensor(key.as_str());
        let delta = range.clamp(old + step) - old;
        if delta.abs() < NO_CHANGE_EPSILON {
            tracing::debug!(%node, sensor = %key, old, step, "adjustment clamped to no-op");
            return Ok(None);
        }
        self.propagate_change(node, key, delta).map(Some)
    }

    /// Applies a placed tool to the node nearest its position.
    ///
    /// Only nodes within `tool.range_radius` are candidates; ties go to the
    /// lower id. Returns `Ok(None)` when no node is in range or the clamped
    /// adjustment is empty.
    pub fn place_tool(
        &mut self,
        tool: &ToolPlacement,
        key: impl Into<SensorKey>,
        range: SensorRange,
    ) -> Result<Option<PropagationReport>, GraphError> {
        let target = self
            .graph
            .nodes_in_range(&tool.position, tool.range_radius)
            .into_iter()
            .filter_map(|id| {
                self.graph
                    .node(id)
                    .map(|n| (id, nalgebra::distance(n.position(), &tool.position)))
            })
            .min_by(|(id_a, d_a), (id_b, d_b)| d_a.total_cmp(d_b).then(id_a.cmp(id_b)));

        let Some((target, _)) = target else {
            tracing::debug!(tool = %tool.name, "no node within tool range");
            return Ok(None);
        };

        tracing::debug!(tool = %tool.name, %target, "tool placed");
        self.adjust_sensor(target, key, tool.sensor_effect, range)
    }
}

/// A perturbation source dropped onto the model (e.g. a charge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPlacement {
    /// Tool name (e.g. "TNT", "Micro-D")
    pub name: String,
    pub position: Point3<f64>,
    /// Only nodes within this distance can receive the effect
    pub range_radius: f64,
    /// Step applied to the target sensor before clamping
    pub sensor_effect: f64,
}

impl ToolPlacement {
    pub fn new(name: &str, position: Point3<f64>, range_radius: f64, sensor_effect: f64) -> Self {
        Self {
            name: name.to_string(),
            position,
            range_radius,
            sensor_effect,
        }
    }
}

impl SpatialGraph {
    /// Shorthand for [`PropagationEngine::propagate_change`].
    pub fn propagate_change(
        &mut self,
        source: impl Into<NodeId>,
        key: impl Into<SensorKey>,
        delta: f64,
    ) -> Result<PropagationReport, GraphError> {
        PropagationEngine::new(self).propagate_change(source, key, delta)
    }
}
