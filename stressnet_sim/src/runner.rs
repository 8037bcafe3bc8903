//! Scenario runner - executes propagation scenarios and checks their outcomes.

use crate::error::SimError;
use crate::exporter::SimExport;
use crate::scenarios::ScenarioId;
use crate::world::{SimConfig, SimWorld};

use nalgebra::Point3;
use stressnet_core::{
    GraphError, Node, NodeId, PropagationEngine, SensorCatalog, SensorRange, SpatialGraph,
    ToolPlacement,
};
use tracing::{debug, info, warn};

const TEMPERATURE: &str = "Temperature_C";

/// Tolerance for comparing propagated readings against closed-form values.
const TOLERANCE: f64 = 1e-9;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Nodes in the scenario graph
    pub nodes: usize,

    /// Undirected edges in the scenario graph
    pub edges: usize,

    /// Propagation calls made
    pub propagations: usize,

    /// Total node updates across all propagations
    pub node_updates: usize,

    /// Deepest hop reached by any propagation
    pub max_hops: u32,

    /// Graph-wide risk at the end, if computed
    pub final_risk: Option<f64>,
}

/// Why a scenario did not pass.
enum Failure {
    Assertion(String),
    Error(SimError),
}

impl From<SimError> for Failure {
    fn from(err: SimError) -> Self {
        Failure::Error(err)
    }
}

impl From<GraphError> for Failure {
    fn from(err: GraphError) -> Self {
        Failure::Error(err.into())
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Assertion(msg) => write!(f, "{}", msg),
            Failure::Error(err) => write!(f, "{}", err),
        }
    }
}

type Outcome = Result<ScenarioMetrics, Failure>;

fn ensure(condition: bool, msg: impl FnOnce() -> String) -> Result<(), Failure> {
    if condition {
        Ok(())
    } else {
        Err(Failure::Assertion(msg()))
    }
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= TOLERANCE * expected.abs().max(1.0)
}

/// Unit-spaced chain `0-1-...-(n-1)` along the x axis.
fn chain(n: u64, decay: f64) -> Result<SpatialGraph, GraphError> {
    let mut graph = SpatialGraph::new(decay)?;
    for i in 0..n {
        graph.add_node(Node::new(i, Point3::new(i as f64, 0.0, 0.0)));
    }
    graph.connect_within(1.0)?;
    Ok(graph)
}

fn reading(graph: &SpatialGraph, id: u64) -> f64 {
    graph.node(id).map(|n| n.get_sensor(TEMPERATURE)).unwrap_or(f64::NAN)
}

fn graph_metrics(graph: &SpatialGraph) -> ScenarioMetrics {
    ScenarioMetrics {
        nodes: graph.len(),
        edges: graph.edge_count(),
        ..Default::default()
    }
}

/// Runs propagation scenarios.
pub struct ScenarioRunner {
    /// Configuration for seeded scenarios
    config: SimConfig,

    catalog: SensorCatalog,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            catalog: SensorCatalog::standard(),
        }
    }

    /// Replaces the sensor catalog.
    pub fn with_catalog(mut self, catalog: SensorCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.config.seed);

        let outcome = match scenario {
            ScenarioId::IsolatedNode => self.run_isolated_node(),
            ScenarioId::ChainDecay => self.run_chain_decay(),
            ScenarioId::PruningBoundary => self.run_pruning_boundary(),
            ScenarioId::CycleSingleVisit => self.run_cycle_single_visit(),
            ScenarioId::ThreeNodeExample => self.run_three_node_example(),
            ScenarioId::ToolBlast => self.run_tool_blast(),
            ScenarioId::RandomCloud => self.run_random_cloud().map(|(metrics, _)| metrics),
        };

        match outcome {
            Ok(metrics) => ScenarioResult {
                scenario,
                seed: self.config.seed,
                passed: true,
                failure_reason: None,
                metrics,
            },
            Err(failure) => {
                warn!("{} failed: {}", scenario.name(), failure);
                ScenarioResult {
                    scenario,
                    seed: self.config.seed,
                    passed: false,
                    failure_reason: Some(failure.to_string()),
                    metrics: ScenarioMetrics::default(),
                }
            }
        }
    }

    /// Runs the seeded cloud scenario and returns its frame export.
    ///
    /// The result carries the same checks as [`ScenarioId::RandomCloud`].
    pub fn run_with_export(&self) -> Result<(ScenarioResult, SimExport), SimError> {
        let (metrics, export) = self.cloud_pass()?;
        let (_, replay) = self.cloud_pass()?;
        let check = check_cloud(&export, &replay);
        if let Err(reason) = &check {
            warn!("{} export failed: {}", ScenarioId::RandomCloud.name(), reason);
        }

        let result = ScenarioResult {
            scenario: ScenarioId::RandomCloud,
            seed: self.config.seed,
            passed: check.is_ok(),
            failure_reason: check.err().map(|f| f.to_string()),
            metrics,
        };
        Ok((result, export))
    }

    /// One seeded world run with its metrics.
    fn cloud_pass(&self) -> Result<(ScenarioMetrics, SimExport), SimError> {
        let mut world = SimWorld::new(self.config.clone(), self.catalog.clone())?;
        let export = world.run(ScenarioId::RandomCloud.name())?;
        let metrics = ScenarioMetrics {
            propagations: export.frames.len(),
            node_updates: export.frames.iter().map(|f| f.visited).sum(),
            max_hops: export.frames.iter().map(|f| f.max_hops).max().unwrap_or(0),
            final_risk: export.final_snapshot.as_ref().map(|s| s.risk.overall),
            ..graph_metrics(&world.graph)
        };
        Ok((metrics, export))
    }

    /// PROP-001: a node with no neighbors takes the whole delta alone.
    fn run_isolated_node(&self) -> Outcome {
        let mut graph = SpatialGraph::new(self.config.decay)?;
        graph.add_node(Node::with_sensors(0, Point3::origin(), [(TEMPERATURE, 21.0)]));
        graph.add_node(Node::with_sensors(1, Point3::new(50.0, 0.0, 0.0), [(TEMPERATURE, 21.0)]));

        let report = graph.propagate_change(0u64, TEMPERATURE, 4.0)?;

        ensure(close(reading(&graph, 0), 25.0), || {
            format!("source reads {} instead of 25.0", reading(&graph, 0))
        })?;
        ensure(reading(&graph, 1) == 21.0, || "unconnected node was touched".to_string())?;
        ensure(report.visited() == 1, || format!("{} nodes visited", report.visited()))?;

        Ok(ScenarioMetrics {
            propagations: 1,
            node_updates: report.visited(),
            ..graph_metrics(&graph)
        })
    }

    /// PROP-002: hop `i` on a chain receives `delta * decay^i`.
    fn run_chain_decay(&self) -> Outcome {
        let decay = self.config.decay;
        let delta = 10.0;
        let mut graph = chain(30, decay)?;

        let report = graph.propagate_change(0u64, TEMPERATURE, delta)?;

        let mut previous = f64::INFINITY;
        for effect in &report.applied {
            let expected = delta * decay.powi(effect.hops as i32);
            ensure(close(effect.effect, expected), || {
                format!("hop {}: {} != {}", effect.hops, effect.effect, expected)
            })?;
            if decay < 1.0 {
                ensure(effect.effect.abs() < previous, || {
                    format!("hop {} did not decay", effect.hops)
                })?;
            }
            previous = effect.effect.abs();
        }
        debug!("chain reached {} hops", report.max_hops());

        Ok(ScenarioMetrics {
            propagations: 1,
            node_updates: report.visited(),
            max_hops: report.max_hops(),
            ..graph_metrics(&graph)
        })
    }

    /// PROP-003: with decay 0.5 and delta 1.0, hops >= 20 receive nothing.
    fn run_pruning_boundary(&self) -> Outcome {
        let mut graph = chain(40, 0.5)?;
        let report = graph.propagate_change(0u64, TEMPERATURE, 1.0)?;

        for i in 0..40u64 {
            let value = reading(&graph, i);
            if i < 20 {
                ensure(close(value, 0.5f64.powi(i as i32)), || {
                    format!("hop {} reads {}", i, value)
                })?;
            } else {
                ensure(value == 0.0, || format!("hop {} beyond cutoff reads {}", i, value))?;
            }
        }

        Ok(ScenarioMetrics {
            propagations: 1,
            node_updates: report.visited(),
            max_hops: report.max_hops(),
            ..graph_metrics(&graph)
        })
    }

    /// PROP-004: triangle 0-1-2-0, every node applied exactly once.
    fn run_cycle_single_visit(&self) -> Outcome {
        let decay = self.config.decay;
        let mut graph = SpatialGraph::new(decay)?;
        graph.add_node(Node::new(0, Point3::new(0.0, 0.0, 0.0)));
        graph.add_node(Node::new(1, Point3::new(1.0, 0.0, 0.0)));
        graph.add_node(Node::new(2, Point3::new(0.5, 0.8, 0.0)));
        graph.add_connection(0u64, 1u64)?;
        graph.add_connection(1u64, 2u64)?;
        graph.add_connection(2u64, 0u64)?;

        let report = graph.propagate_change(0u64, TEMPERATURE, 5.0)?;

        ensure(report.visited() == 3, || format!("{} applications", report.visited()))?;
        for id in [1u64, 2] {
            ensure(close(reading(&graph, id), 5.0 * decay), || {
                format!("node {} reads {}", id, reading(&graph, id))
            })?;
        }

        Ok(ScenarioMetrics {
            propagations: 1,
            node_updates: report.visited(),
            max_hops: report.max_hops(),
            ..graph_metrics(&graph)
        })
    }

    /// PROP-005: +10.0 at the source, +7.0 at its neighbor, outlier unchanged.
    fn run_three_node_example(&self) -> Outcome {
        let mut graph = SpatialGraph::new(0.7)?;
        graph.add_node(Node::new(0, Point3::new(0.0, 0.0, 0.0)));
        graph.add_node(Node::new(1, Point3::new(1.0, 0.0, 0.0)));
        graph.add_node(Node::new(2, Point3::new(10.0, 0.0, 0.0)));
        graph.connect_within(2.0)?;

        let report = graph.propagate_change(0u64, TEMPERATURE, 10.0)?;

        ensure(close(reading(&graph, 0), 10.0), || "source != +10.0".to_string())?;
        ensure(close(reading(&graph, 1), 7.0), || "neighbor != +7.0".to_string())?;
        ensure(reading(&graph, 2) == 0.0, || "outlier was touched".to_string())?;

        Ok(ScenarioMetrics {
            propagations: 1,
            node_updates: report.visited(),
            max_hops: report.max_hops(),
            ..graph_metrics(&graph)
        })
    }

    /// PROP-006: a tool near a cluster clamps the nearest node and spreads.
    fn run_tool_blast(&self) -> Outcome {
        let decay = self.config.decay;
        let range = SensorRange::new(0.0, 60.0);
        let mut graph = chain(10, decay)?;
        if let Some(node) = graph.node_mut(4u64) {
            node.set_sensor(TEMPERATURE, 50.0);
        }

        let tool = ToolPlacement::new("TNT", Point3::new(4.2, 0.5, 0.0), 2.0, 80.0);
        let report = PropagationEngine::new(&mut graph)
            .place_tool(&tool, TEMPERATURE, range)?
            .ok_or_else(|| Failure::Assertion("tool reached no node".to_string()))?;

        ensure(report.source == NodeId(4), || format!("tool hit node {}", report.source))?;
        ensure(close(reading(&graph, 4), 60.0), || {
            format!("source not clamped: {}", reading(&graph, 4))
        })?;
        ensure(close(reading(&graph, 5), 10.0 * decay), || {
            format!("neighbor reads {}", reading(&graph, 5))
        })?;

        let missed = ToolPlacement::new("Nano-X", Point3::new(100.0, 0.0, 0.0), 15.0, 30.0);
        let none = PropagationEngine::new(&mut graph).place_tool(&missed, TEMPERATURE, range)?;
        ensure(none.is_none(), || "out-of-range tool had an effect".to_string())?;

        Ok(ScenarioMetrics {
            propagations: 1,
            node_updates: report.visited(),
            max_hops: report.max_hops(),
            ..graph_metrics(&graph)
        })
    }

    /// PROP-007: seeded cloud; every frame stays within the risk scale and
    /// replaying the seed reproduces the run.
    fn run_random_cloud(&self) -> Result<(ScenarioMetrics, SimExport), Failure> {
        let (metrics, export) = self.cloud_pass()?;
        let (_, replay) = self.cloud_pass()?;
        check_cloud(&export, &replay)?;
        Ok((metrics, export))
    }
}

/// Checks a cloud run against its replay.
fn check_cloud(export: &SimExport, replay: &SimExport) -> Result<(), Failure> {
    ensure(export.frames == replay.frames, || "seed replay diverged".to_string())?;
    for frame in &export.frames {
        ensure((0.0..=100.0).contains(&frame.overall_risk), || {
            format!("step {} risk {} out of scale", frame.step, frame.overall_risk)
        })?;
        ensure(frame.visited >= 1, || format!("step {} visited nothing", frame.step))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(SimConfig {
            num_nodes: 40,
            extent: 30.0,
            proximity_radius: 8.0,
            steps: 15,
            ..Default::default()
        })
    }

    #[test]
    fn test_all_scenarios_pass() {
        let runner = runner();
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(
                result.passed,
                "{} failed: {:?}",
                scenario,
                result.failure_reason
            );
        }
    }

    #[test]
    fn test_pruning_metrics() {
        let result = runner().run(ScenarioId::PruningBoundary);
        assert_eq!(result.metrics.node_updates, 20);
        assert_eq!(result.metrics.max_hops, 19);
        assert_eq!(result.metrics.edges, 39);
    }

    #[test]
    fn test_invalid_decay_is_reported_as_failure() {
        let runner = ScenarioRunner::new(SimConfig {
            decay: 1.5,
            ..Default::default()
        });
        let result = runner.run(ScenarioId::ChainDecay);
        assert!(!result.passed);
        assert!(result.failure_reason.unwrap().contains("Invalid decay"));
    }

    #[test]
    fn test_export_carries_metrics() {
        let (result, export) = runner().run_with_export().unwrap();
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.nodes, 40);
        assert_eq!(result.metrics.propagations, export.frames.len());
        assert_relative_eq!(
            result.metrics.final_risk.unwrap(),
            export.final_snapshot.as_ref().unwrap().risk.overall
        );
    }

    #[test]
    fn test_export_metrics_match_scenario_run() {
        let runner = runner();
        let (exported, _) = runner.run_with_export().unwrap();
        let scenario = runner.run(ScenarioId::RandomCloud);
        assert_eq!(exported.metrics.node_updates, scenario.metrics.node_updates);
        assert_eq!(exported.metrics.final_risk, scenario.metrics.final_risk);
    }

    #[test]
    fn test_cloud_check_rejects_bad_frames() {
        let (_, export) = runner().run_with_export().unwrap();
        assert!(check_cloud(&export, &export).is_ok());

        let mut out_of_scale = export.clone();
        out_of_scale.frames[0].overall_risk = 140.0;
        let err = check_cloud(&out_of_scale, &out_of_scale).unwrap_err();
        assert!(err.to_string().contains("out of scale"));

        let mut idle = export.clone();
        idle.frames[0].visited = 0;
        let err = check_cloud(&idle, &idle).unwrap_err();
        assert!(err.to_string().contains("visited nothing"));

        let mut diverged = export.clone();
        diverged.frames[0].delta += 1e-12;
        let err = check_cloud(&export, &diverged).unwrap_err();
        assert_eq!(err.to_string(), "seed replay diverged");
    }
}
