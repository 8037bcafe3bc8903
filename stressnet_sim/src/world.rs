//! SimWorld - one simulated analysis pass.

use crate::error::SimError;
use crate::exporter::{PerturbationFrame, SimExport};
use crate::sampler::Sampler;

use serde::{Deserialize, Serialize};
use std::path::Path;
use stressnet_core::{
    overall_risk, GraphBuilder, GraphConfig, GraphSnapshot, PropagationEngine, PropagationReport,
    SensorCatalog, SpatialGraph,
};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Number of sampled nodes
    pub num_nodes: usize,

    /// Side length of the sampling cube
    pub extent: f64,

    /// Nodes at most this far apart are connected
    pub proximity_radius: f64,

    /// Per-hop propagation decay
    pub decay: f64,

    /// Initial reading noise, as a fraction of each sensor's span
    pub sensor_noise_std: f64,

    /// Random perturbations applied after the graph is built
    pub steps: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            // The dashboard caps a pass at 200 sampled vertices
            num_nodes: 200,
            extent: 100.0,
            proximity_radius: 15.0,
            decay: 0.7,
            sensor_noise_std: 0.1,
            steps: 50,
        }
    }
}

impl SimConfig {
    /// Loads a config from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.num_nodes == 0 {
            return Err(SimError::config("num_nodes must be at least 1"));
        }
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(SimError::config(format!("extent must be > 0, got {}", self.extent)));
        }
        if !(self.sensor_noise_std.is_finite() && self.sensor_noise_std >= 0.0) {
            return Err(SimError::config(format!(
                "sensor_noise_std must be >= 0, got {}",
                self.sensor_noise_std
            )));
        }
        GraphConfig::with_decay(self.decay).validate()?;
        if !(self.proximity_radius.is_finite() && self.proximity_radius >= 0.0) {
            return Err(SimError::config(format!(
                "proximity_radius must be >= 0, got {}",
                self.proximity_radius
            )));
        }
        Ok(())
    }
}

/// A built graph plus the sampler that drives it.
pub struct SimWorld {
    pub config: SimConfig,

    pub catalog: SensorCatalog,

    pub graph: SpatialGraph,

    sampler: Sampler,

    step_count: usize,
}

impl SimWorld {
    /// Samples nodes and builds the proximity graph.
    pub fn new(config: SimConfig, catalog: SensorCatalog) -> Result<Self, SimError> {
        config.validate()?;

        let mut sampler = Sampler::new(config.seed, config.extent, config.sensor_noise_std)?;
        let samples = sampler.samples(config.num_nodes, &catalog);

        let graph = GraphBuilder::new(GraphConfig::with_decay(config.decay))
            .samples(samples)
            .proximity_radius(config.proximity_radius)
            .catalog(catalog.clone())
            .build()?;

        Ok(Self {
            config,
            catalog,
            graph,
            sampler,
            step_count: 0,
        })
    }

    /// Applies one random clamped adjustment: random node, random catalog
    /// sensor, step up to a tenth of the sensor's span either way.
    ///
    /// Returns `None` when the catalog is empty or clamping swallowed the step.
    pub fn step(&mut self) -> Result<Option<PropagationReport>, SimError> {
        self.step_count += 1;
        if self.catalog.is_empty() || self.graph.is_empty() {
            return Ok(None);
        }

        let ids = self.graph.node_ids();
        let node = ids[self.sampler.index(ids.len())];
        let pick = self.sampler.index(self.catalog.len());
        let Some(spec) = self.catalog.iter().nth(pick) else {
            return Ok(None);
        };
        let step = self.sampler.symmetric(spec.range.span() / 10.0);

        let report = PropagationEngine::new(&mut self.graph).adjust_sensor(
            node,
            spec.key.clone(),
            step,
            spec.range,
        )?;
        Ok(report)
    }

    /// Runs all configured steps, recording a frame for each applied change.
    pub fn run(&mut self, scenario: &str) -> Result<SimExport, SimError> {
        let mut export = SimExport::new(scenario, self.config.seed, self.graph.pass_id());

        for _ in 0..self.config.steps {
            if let Some(report) = self.step()? {
                let risk = overall_risk(&self.graph, &self.catalog.ranges());
                tracing::debug!(
                    step = self.step_count,
                    source = %report.source,
                    sensor = %report.sensor,
                    visited = report.visited(),
                    risk,
                    "perturbation applied"
                );
                export.add_frame(PerturbationFrame::from_report(self.step_count, &report, risk));
            }
        }

        export.finalize(GraphSnapshot::capture(&self.graph, &self.catalog));
        Ok(export)
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}
