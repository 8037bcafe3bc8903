//! StressNet Deterministic Scenario Harness
//!
//! Drives the propagation core through reproducible scenarios:
//! - **Sampling**: node positions and initial readings drawn from one seeded
//!   ChaCha8 stream
//! - **Perturbation**: random clamped sensor adjustments, each propagated
//!   through the proximity graph
//! - **Checking**: each scenario asserts a propagation property and reports
//!   pass/fail with metrics
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                    SimWorld                       │
//! │  ┌──────────┐   samples   ┌──────────────────┐   │
//! │  │ Sampler  │────────────►│  GraphBuilder    │   │
//! │  │ (seeded) │             │  → SpatialGraph  │   │
//! │  └────┬─────┘             └────────┬─────────┘   │
//! │       │ perturbations              │             │
//! │       └──────────►  PropagationEngine            │
//! │                            │                     │
//! │                     RiskReport / SimExport       │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use stressnet_sim::{ScenarioRunner, SimConfig};
//! use stressnet_sim::scenarios::ScenarioId;
//!
//! let runner = ScenarioRunner::new(SimConfig { seed: 42, ..Default::default() });
//! let result = runner.run(ScenarioId::ChainDecay);
//! assert!(result.passed);
//! ```

mod error;
mod exporter;
mod runner;
mod sampler;
mod world;
pub mod scenarios;

pub use error::SimError;
pub use exporter::{PerturbationFrame, SimExport};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use sampler::Sampler;
pub use world::{SimConfig, SimWorld};
