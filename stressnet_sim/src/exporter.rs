//! JSON exporter for simulation runs.
//!
//! Exports one frame per applied perturbation plus the final graph snapshot,
//! for external visualizers.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use stressnet_core::{GraphSnapshot, NodeId, PropagationReport, SensorKey};
use uuid::Uuid;

/// A single applied perturbation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationFrame {
    /// Step number within the run (1-based)
    pub step: usize,

    pub source: NodeId,

    pub sensor: SensorKey,

    /// Delta applied at the source after clamping
    pub delta: f64,

    /// Nodes that received an effect
    pub visited: usize,

    /// Deepest hop reached
    pub max_hops: u32,

    /// Graph-wide risk after the change
    pub overall_risk: f64,
}

impl PerturbationFrame {
    pub fn from_report(step: usize, report: &PropagationReport, overall_risk: f64) -> Self {
        Self {
            step,
            source: report.source,
            sensor: report.sensor.clone(),
            delta: report.delta,
            visited: report.visited(),
            max_hops: report.max_hops(),
            overall_risk,
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Analysis pass the frames belong to
    pub pass_id: Uuid,

    /// All frames
    pub frames: Vec<PerturbationFrame>,

    /// Graph state after the last frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_snapshot: Option<GraphSnapshot>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64, pass_id: Uuid) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            pass_id,
            frames: Vec::new(),
            final_snapshot: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: PerturbationFrame) {
        self.frames.push(frame);
    }

    /// Attaches the final graph state.
    pub fn finalize(&mut self, snapshot: GraphSnapshot) {
        self.final_snapshot = Some(snapshot);
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
