//! The spatial graph: nodes plus a symmetric proximity relation.
//!
//! A graph is built fresh for every analysis pass (uploaded model, CSV batch)
//! and owned by whoever drives that pass. There is no global instance.

use crate::error::GraphError;
use crate::node::{Node, NodeId};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

/// Effects at or below this magnitude are not propagated further.
pub const DEFAULT_MIN_EFFECT: f64 = 1e-6;

/// Default per-hop attenuation.
pub const DEFAULT_DECAY: f64 = 0.7;

/// Configuration for a [`SpatialGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Per-hop multiplicative attenuation, in (0, 1]
    pub decay: f64,

    /// Negligibility cutoff for propagated effects (strictly greater is kept)
    pub min_effect: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            decay: DEFAULT_DECAY,
            min_effect: DEFAULT_MIN_EFFECT,
        }
    }
}

impl GraphConfig {
    /// Default configuration with a custom decay.
    pub fn with_decay(decay: f64) -> Self {
        Self {
            decay,
            ..Self::default()
        }
    }

    /// Checks that decay lies in (0, 1] and the cutoff is a finite non-negative number.
    pub fn validate(&self) -> Result<(), GraphError> {
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(GraphError::InvalidDecay(self.decay));
        }
        if !(self.min_effect.is_finite() && self.min_effect >= 0.0) {
            return Err(GraphError::InvalidMinEffect(self.min_effect));
        }
        Ok(())
    }
}

/// Nodes and their bidirectional connectivity.
#[derive(Debug, Clone)]
pub struct SpatialGraph {
    /// Identifies the analysis pass this graph belongs to
    pass_id: Uuid,

    config: GraphConfig,

    /// Iterated in id order
    nodes: BTreeMap<NodeId, Node>,

    /// Symmetric: `b ∈ adjacency[a]` iff `a ∈ adjacency[b]`
    adjacency: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl SpatialGraph {
    /// Creates an empty graph with the given decay and the default cutoff.
    pub fn new(decay: f64) -> Result<Self, GraphError> {
        Self::with_config(GraphConfig::with_decay(decay))
    }

    /// Creates an empty graph from a validated configuration.
    pub fn with_config(config: GraphConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self {
            pass_id: Uuid::new_v4(),
            config,
            nodes: BTreeMap::new(),
            adjacency: HashMap::new(),
        })
    }

    pub fn pass_id(&self) -> Uuid {
        self.pass_id
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn decay(&self) -> f64 {
        self.config.decay
    }

    /// Registers a node. An existing node with the same id is replaced, but
    /// its connections are kept.
    pub fn add_node(&mut self, node: Node) {
        let id = node.id();
        self.nodes.insert(id, node);
        self.adjacency.entry(id).or_default();
    }

    /// Connects two registered nodes in both directions.
    ///
    /// Re-adding an existing edge is a no-op, as is connecting a node to itself.
    pub fn add_connection(
        &mut self,
        a: impl Into<NodeId>,
        b: impl Into<NodeId>,
    ) -> Result<(), GraphError> {
        let (a, b) = (a.into(), b.into());
        self.require(a)?;
        self.require(b)?;
        if a == b {
            return Ok(());
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        Ok(())
    }

    /// Neighbor ids in ascending order. Unknown ids have no neighbors.
    pub fn get_neighbors(&self, id: impl Into<NodeId>) -> Vec<NodeId> {
        self.adjacency
            .get(&id.into())
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn neighbor_set(&self, id: NodeId) -> Option<&BTreeSet<NodeId>> {
        self.adjacency.get(&id)
    }

    /// Euclidean distance between two registered nodes.
    pub fn distance(&self, a: impl Into<NodeId>, b: impl Into<NodeId>) -> Result<f64, GraphError> {
        let a = self.require(a.into())?;
        let b = self.require(b.into())?;
        Ok(a.distance_to(b))
    }

    /// Sets every existing reading on every node to `value`. Keys are kept.
    pub fn reset_sensors(&mut self, value: f64) {
        for node in self.nodes.values_mut() {
            node.fill_sensors(value);
        }
    }

    /// Connects every pair of nodes whose distance is at most `radius`.
    ///
    /// Pairwise scan; large samples should pre-compute pairs with a spatial
    /// index and call [`add_connection`](Self::add_connection) directly.
    /// Returns the number of newly created edges.
    pub fn connect_within(&mut self, radius: f64) -> Result<usize, GraphError> {
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(GraphError::InvalidRadius(radius));
        }

        let ids = self.node_ids();
        let mut pairs = Vec::new();
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                if self.distance(a, b)? <= radius && !self.are_connected(a, b) {
                    pairs.push((a, b));
                }
            }
        }

        for &(a, b) in &pairs {
            self.add_connection(a, b)?;
        }
        tracing::debug!(radius, created = pairs.len(), "proximity connections built");
        Ok(pairs.len())
    }

    /// Ids of nodes within `radius` of `point`, ascending.
    pub fn nodes_in_range(&self, point: &Point3<f64>, radius: f64) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| nalgebra::distance(n.position(), point) <= radius)
            .map(Node::id)
            .collect()
    }

    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency.get(&a).is_some_and(|set| set.contains(&b))
    }

    pub fn contains(&self, id: impl Into<NodeId>) -> bool {
        self.nodes.contains_key(&id.into())
    }

    pub fn node(&self, id: impl Into<NodeId>) -> Option<&Node> {
        self.nodes.get(&id.into())
    }

    pub fn node_mut(&mut self, id: impl Into<NodeId>) -> Option<&mut Node> {
        self.nodes.get_mut(&id.into())
    }

    /// All nodes, ascending by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node ids, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// Every undirected edge once, as `(low, high)`, ascending.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges: Vec<(NodeId, NodeId)> = self
            .adjacency
            .iter()
            .flat_map(|(&a, set)| set.iter().filter(move |&&b| a < b).map(move |&b| (a, b)))
            .collect();
        edges.sort_unstable();
        edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub(crate) fn require(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn line_graph(n: u64) -> SpatialGraph {
        let mut graph = SpatialGraph::new(0.7).unwrap();
        for i in 0..n {
            graph.add_node(Node::new(i, Point3::new(i as f64, 0.0, 0.0)));
        }
        graph
    }

    #[test]
    fn test_decay_validation() {
        assert!(SpatialGraph::new(1.0).is_ok());
        assert_eq!(SpatialGraph::new(0.0).unwrap_err(), GraphError::InvalidDecay(0.0));
        assert_eq!(SpatialGraph::new(1.5).unwrap_err(), GraphError::InvalidDecay(1.5));
        assert!(matches!(SpatialGraph::new(f64::NAN), Err(GraphError::InvalidDecay(_))));

        let config = GraphConfig {
            decay: 0.5,
            min_effect: -1.0,
        };
        assert_eq!(
            SpatialGraph::with_config(config).unwrap_err(),
            GraphError::InvalidMinEffect(-1.0)
        );
    }

    #[test]
    fn test_add_node_creates_empty_adjacency() {
        let graph = line_graph(1);
        assert!(graph.contains(0u64));
        assert!(graph.get_neighbors(0u64).is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_node_overwrite_keeps_connections() {
        let mut graph = line_graph(2);
        graph.add_connection(0u64, 1u64).unwrap();

        let mut replacement = Node::new(0, Point3::new(5.0, 5.0, 5.0));
        replacement.set_sensor("Temperature_C", 33.0);
        graph.add_node(replacement);

        assert_eq!(graph.get_neighbors(0u64), vec![NodeId(1)]);
        assert_eq!(graph.node(0u64).unwrap().get_sensor("Temperature_C"), 33.0);
        assert_eq!(graph.node(0u64).unwrap().position(), &Point3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_add_connection_is_idempotent_and_symmetric() {
        let mut graph = line_graph(3);
        graph.add_connection(0u64, 1u64).unwrap();
        let before = (graph.get_neighbors(0u64), graph.get_neighbors(1u64));

        graph.add_connection(0u64, 1u64).unwrap();
        graph.add_connection(1u64, 0u64).unwrap();

        assert_eq!((graph.get_neighbors(0u64), graph.get_neighbors(1u64)), before);
        assert_eq!(graph.get_neighbors(0u64), vec![NodeId(1)]);
        assert_eq!(graph.get_neighbors(1u64), vec![NodeId(0)]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_self_connection_is_ignored() {
        let mut graph = line_graph(1);
        graph.add_connection(0u64, 0u64).unwrap();
        assert!(graph.get_neighbors(0u64).is_empty());
    }

    #[test]
    fn test_unknown_ids_fail_without_mutation() {
        let mut graph = line_graph(2);
        assert_eq!(
            graph.add_connection(0u64, 9u64).unwrap_err(),
            GraphError::UnknownNode(NodeId(9))
        );
        assert_eq!(
            graph.add_connection(8u64, 9u64).unwrap_err(),
            GraphError::UnknownNode(NodeId(8))
        );
        assert!(graph.get_neighbors(0u64).is_empty());
        assert!(graph.get_neighbors(9u64).is_empty());
        assert_eq!(graph.distance(0u64, 9u64).unwrap_err(), GraphError::UnknownNode(NodeId(9)));
    }

    #[test]
    fn test_distance() {
        let mut graph = SpatialGraph::new(0.7).unwrap();
        graph.add_node(Node::new(0, Point3::new(1.0, 2.0, 3.0)));
        graph.add_node(Node::new(1, Point3::new(4.0, 6.0, 3.0)));
        assert_relative_eq!(graph.distance(0u64, 1u64).unwrap(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(graph.distance(1u64, 1u64).unwrap(), 0.0);
    }

    #[test]
    fn test_reset_sensors_keeps_keys() {
        let mut graph = SpatialGraph::new(0.7).unwrap();
        graph.add_node(Node::with_sensors(
            0,
            Point3::origin(),
            [("Temperature_C", 20.0), ("Rainfall_mm", 80.0)],
        ));
        graph.add_node(Node::new(1, Point3::new(1.0, 0.0, 0.0)));

        graph.reset_sensors(5.0);

        let a = graph.node(0u64).unwrap();
        assert_eq!(a.get_sensor("Temperature_C"), 5.0);
        assert_eq!(a.get_sensor("Rainfall_mm"), 5.0);
        assert!(graph.node(1u64).unwrap().sensors().is_empty());
    }

    #[test]
    fn test_connect_within() {
        let mut graph = SpatialGraph::new(0.7).unwrap();
        graph.add_node(Node::new(0, Point3::new(0.0, 0.0, 0.0)));
        graph.add_node(Node::new(1, Point3::new(1.0, 0.0, 0.0)));
        graph.add_node(Node::new(2, Point3::new(10.0, 0.0, 0.0)));

        assert_eq!(graph.connect_within(1.0).unwrap(), 1);
        assert_eq!(graph.edges(), vec![(NodeId(0), NodeId(1))]);
        assert!(graph.get_neighbors(2u64).is_empty());

        // Already-present edges are not counted again
        assert_eq!(graph.connect_within(1.0).unwrap(), 0);
        assert_eq!(graph.connect_within(-1.0).unwrap_err(), GraphError::InvalidRadius(-1.0));
    }

    #[test]
    fn test_nodes_in_range() {
        let graph = line_graph(5);
        let ids = graph.nodes_in_range(&Point3::new(2.0, 0.5, 0.0), 1.2);
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(3)]);
    }

    proptest! {
        #[test]
        fn prop_adjacency_stays_symmetric(pairs in prop::collection::vec((0u64..8, 0u64..8), 0..40)) {
            let mut graph = line_graph(8);
            for (a, b) in pairs {
                graph.add_connection(a, b).unwrap();
            }
            for id in graph.node_ids() {
                for n in graph.get_neighbors(id) {
                    prop_assert!(graph.get_neighbors(n).contains(&id));
                    prop_assert_ne!(n, id);
                }
            }
            prop_assert_eq!(graph.edges().len(), graph.edge_count());
        }
    }
}
