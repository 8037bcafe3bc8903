//! Aggregation Service - display-ready statistics over a stress graph.
//!
//! - **Average**: arithmetic mean of one sensor across every node
//! - **Normalized risk**: a reading mapped onto its physical range as 0-100
//! - **Overall risk**: mean normalized risk across the configured sensors
//!
//! All functions are read-only and return `0.0` for an empty graph rather
//! than failing.

use crate::graph::SpatialGraph;
use crate::node::{Node, NodeId, SensorKey};
use crate::sensors::{SensorCatalog, SensorRange};
use serde::{Deserialize, Serialize};

/// Mean of `key` across all nodes; `0.0` when the graph has no nodes.
pub fn average(key: &str, graph: &SpatialGraph) -> f64 {
    if graph.is_empty() {
        return 0.0;
    }
    let sum: f64 = graph.nodes().map(|n| n.get_sensor(key)).sum();
    sum / graph.len() as f64
}

/// Maps `value` onto `range` as a percentage clamped to `[0, 100]`.
///
/// A degenerate range (`max == min`) uses a denominator of `1.0`. A NaN
/// reading scores `0.0`.
pub fn normalized_risk(value: f64, range: SensorRange) -> f64 {
    clamp_percent(unclamped_risk(value, range))
}

fn clamp_percent(risk: f64) -> f64 {
    if risk.is_nan() {
        0.0
    } else {
        risk.clamp(0.0, 100.0)
    }
}

fn unclamped_risk(value: f64, range: SensorRange) -> f64 {
    let span = range.span();
    let denom = if span != 0.0 { span } else { 1.0 };
    (value - range.min) / denom * 100.0
}

/// Mean normalized risk of the per-sensor graph averages.
///
/// `0.0` when no sensors are configured.
pub fn overall_risk(graph: &SpatialGraph, sensor_ranges: &[(SensorKey, SensorRange)]) -> f64 {
    if sensor_ranges.is_empty() {
        return 0.0;
    }
    let total: f64 = sensor_ranges
        .iter()
        .map(|(key, range)| normalized_risk(average(key.as_str(), graph), *range))
        .sum();
    total / sensor_ranges.len() as f64
}

/// Risk of a single node across the catalog.
///
/// Per-sensor values are averaged before clamping, so one sensor far past
/// its range can pull the node's score up on its own.
pub fn node_risk(node: &Node, catalog: &SensorCatalog) -> f64 {
    if catalog.is_empty() {
        return 0.0;
    }
    let total: f64 = catalog
        .iter()
        .map(|spec| unclamped_risk(node.get_sensor(spec.key.as_str()), spec.range))
        .sum();
    clamp_percent(total / catalog.len() as f64)
}

/// Average and risk for one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSummary {
    pub key: SensorKey,
    pub average: f64,
    pub risk: f64,
}

/// Graph-wide risk figures for a dashboard refresh.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskReport {
    pub per_sensor: Vec<SensorSummary>,
    pub overall: f64,
}

impl RiskReport {
    /// Computes every catalog sensor's summary and the overall risk.
    pub fn compute(graph: &SpatialGraph, catalog: &SensorCatalog) -> Self {
        let per_sensor: Vec<SensorSummary> = catalog
            .iter()
            .map(|spec| {
                let avg = average(spec.key.as_str(), graph);
                SensorSummary {
                    key: spec.key.clone(),
                    average: avg,
                    risk: normalized_risk(avg, spec.range),
                }
            })
            .collect();

        let overall = if per_sensor.is_empty() {
            0.0
        } else {
            per_sensor.iter().map(|s| s.risk).sum::<f64>() / per_sensor.len() as f64
        };

        Self { per_sensor, overall }
    }

    pub fn sensor(&self, key: &str) -> Option<&SensorSummary> {
        self.per_sensor.iter().find(|s| s.key.as_str() == key)
    }
}

// =============================================================================
// HEATMAP
// =============================================================================

/// Blue → yellow → red ramp for `norm ∈ [0, 1]` (clamped).
pub fn heat_color(norm: f64) -> [f64; 3] {
    let norm = if norm.is_nan() { 0.0 } else { norm.clamp(0.0, 1.0) };
    if norm < 0.5 {
        let t = norm / 0.5;
        [t, t, 1.0 - t]
    } else {
        let t = (norm - 0.5) / 0.5;
        [1.0, 1.0 - t, 0.0]
    }
}

/// Per-node colors for `key`, normalized against the graph's own spread.
///
/// Sorted by node id. A flat spread uses a denominator of `1.0`.
pub fn heatmap(graph: &SpatialGraph, key: &str) -> Vec<(NodeId, [f64; 3])> {
    let readings: Vec<(NodeId, f64)> = graph
        .node_ids()
        .into_iter()
        .filter_map(|id| graph.node(id).map(|n| (id, n.get_sensor(key))))
        .collect();

    let (lo, hi) = readings
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| (lo.min(v), hi.max(v)));
    let spread = if hi - lo != 0.0 { hi - lo } else { 1.0 };

    readings
        .into_iter()
        .map(|(id, v)| (id, heat_color((v - lo) / spread)))
        .collect()
}
