//! Seeded sample generator for simulated analysis passes.
//!
//! Stands in for the mesh/CSV layer: produces node positions inside a cube
//! and an initial sensor snapshot per node. Everything is drawn from one
//! ChaCha8 stream, so a seed fully determines the sample set.

use nalgebra::Point3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use stressnet_core::{NodeSample, SensorCatalog};

use crate::error::SimError;

/// Deterministic source of node samples and perturbations.
pub struct Sampler {
    rng: ChaCha8Rng,

    /// Side length of the sampling cube (centered on the origin)
    extent: f64,

    /// Reading noise as a fraction of each sensor's span
    noise: Normal<f64>,
}

impl Sampler {
    /// Creates a sampler.
    ///
    /// `noise_std` is relative: `0.1` means one standard deviation is 10% of
    /// a sensor's range.
    pub fn new(seed: u64, extent: f64, noise_std: f64) -> Result<Self, SimError> {
        if !(extent.is_finite() && extent > 0.0) {
            return Err(SimError::config(format!("extent must be > 0, got {extent}")));
        }
        if !(noise_std.is_finite() && noise_std >= 0.0) {
            return Err(SimError::config(format!("sensor noise must be >= 0, got {noise_std}")));
        }
        let noise = Normal::new(0.0, noise_std)
            .map_err(|e| SimError::config(format!("invalid sensor noise {noise_std}: {e}")))?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            extent,
            noise,
        })
    }

    /// Uniform point inside the sampling cube.
    pub fn position(&mut self) -> Point3<f64> {
        let half = self.extent / 2.0;
        Point3::new(
            self.rng.gen_range(-half..=half),
            self.rng.gen_range(-half..=half),
            self.rng.gen_range(-half..=half),
        )
    }

    /// One sample with every catalog sensor at its midpoint plus noise,
    /// clamped to range.
    pub fn sample(&mut self, catalog: &SensorCatalog) -> NodeSample {
        let mut sample = NodeSample::new(self.position());
        for spec in catalog.iter() {
            let jitter = self.noise.sample(&mut self.rng) * spec.range.span();
            sample = sample.with_sensor(spec.key.clone(), spec.range.clamp(spec.range.midpoint() + jitter));
        }
        sample
    }

    pub fn samples(&mut self, count: usize, catalog: &SensorCatalog) -> Vec<NodeSample> {
        (0..count).map(|_| self.sample(catalog)).collect()
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Uniform value in `[-limit, limit]`.
    pub fn symmetric(&mut self, limit: f64) -> f64 {
        if limit <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-limit..=limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_samples() {
        let catalog = SensorCatalog::standard();
        let mut a = Sampler::new(42, 10.0, 0.1).unwrap();
        let mut b = Sampler::new(42, 10.0, 0.1).unwrap();
        assert_eq!(a.samples(20, &catalog), b.samples(20, &catalog));
    }

    #[test]
    fn test_samples_stay_in_bounds() {
        let catalog = SensorCatalog::standard();
        let mut sampler = Sampler::new(7, 4.0, 0.5).unwrap();
        for sample in sampler.samples(200, &catalog) {
            assert!(sample.position.coords.iter().all(|c| c.abs() <= 2.0));
            for spec in catalog.iter() {
                let v = sample.sensors[&spec.key];
                assert!(v >= spec.range.min && v <= spec.range.max);
            }
        }
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(Sampler::new(1, 0.0, 0.1), Err(SimError::Config(_))));
        assert!(matches!(Sampler::new(1, 1.0, -1.0), Err(SimError::Config(_))));
        assert!(matches!(Sampler::new(1, 1.0, f64::NAN), Err(SimError::Config(_))));
        assert!(matches!(Sampler::new(1, f64::INFINITY, 0.1), Err(SimError::Config(_))));
    }

    #[test]
    fn test_symmetric_range() {
        let mut sampler = Sampler::new(3, 1.0, 0.0).unwrap();
        for _ in 0..100 {
            assert!(sampler.symmetric(2.5).abs() <= 2.5);
        }
        assert_eq!(sampler.symmetric(0.0), 0.0);
    }
}
