//! Sensor catalog: the named channels a stress model monitors and their
//! physical ranges.
//!
//! Ranges serve two purposes:
//! - clamping UI/tool adjustments before a delta is propagated
//! - normalizing readings into a 0-100 risk scale

use crate::error::SensorError;
use crate::node::SensorKey;
use serde::{Deserialize, Serialize};

/// Inclusive physical range of a sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorRange {
    pub min: f64,
    pub max: f64,
}

impl SensorRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Restricts `value` to `[min, max]`.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Width of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Midpoint of the range.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    pub key: SensorKey,
    /// Human-readable gauge label
    pub label: String,
    pub unit: String,
    pub range: SensorRange,
}

impl SensorSpec {
    pub fn new(key: &str, label: &str, unit: &str, range: SensorRange) -> Self {
        Self {
            key: SensorKey::new(key),
            label: label.to_string(),
            unit: unit.to_string(),
            range,
        }
    }
}

/// Ordered set of monitored sensor channels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorCatalog {
    specs: Vec<SensorSpec>,
}

impl SensorCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The six channels monitored by the ground-stress dashboard.
    pub fn standard() -> Self {
        Self {
            specs: vec![
                SensorSpec::new("Temperature_C", "Temperature", "°C", SensorRange::new(0.0, 60.0)),
                SensorSpec::new("Humidity_%", "Humidity", "%", SensorRange::new(0.0, 100.0)),
                SensorSpec::new(
                    "GroundPressure_kPa",
                    "Ground Pressure",
                    "kPa",
                    SensorRange::new(80.0, 120.0),
                ),
                SensorSpec::new("Vibration_mm_s", "Vibration", "mm/s", SensorRange::new(0.0, 10.0)),
                SensorSpec::new("CrackWidth_mm", "Crack Width", "mm", SensorRange::new(0.0, 5.0)),
                SensorSpec::new("Rainfall_mm", "Rainfall", "mm", SensorRange::new(0.0, 200.0)),
            ],
        }
    }

    /// Adds a channel, replacing any existing entry with the same key.
    pub fn with_sensor(mut self, spec: SensorSpec) -> Self {
        match self.specs.iter_mut().find(|s| s.key == spec.key) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
        self
    }

    /// Validates a sensor name coming from outside (UI, CSV header, CLI).
    pub fn resolve(&self, name: &str) -> Result<&SensorSpec, SensorError> {
        self.get(name)
            .ok_or_else(|| SensorError::UnknownSensor(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&SensorSpec> {
        self.specs.iter().find(|s| s.key.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorSpec> {
        self.specs.iter()
    }

    /// `(key, range)` pairs in catalog order, as consumed by risk aggregation.
    pub fn ranges(&self) -> Vec<(SensorKey, SensorRange)> {
        self.specs.iter().map(|s| (s.key.clone(), s.range)).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_clamp() {
        let range = SensorRange::new(80.0, 120.0);
        assert_eq!(range.clamp(50.0), 80.0);
        assert_eq!(range.clamp(130.0), 120.0);
        assert_eq!(range.clamp(101.5), 101.5);
        assert_eq!(range.span(), 40.0);
        assert_eq!(range.midpoint(), 100.0);
    }

    #[test]
    fn test_standard_catalog() {
        let catalog = SensorCatalog::standard();
        assert_eq!(catalog.len(), 6);

        let pressure = catalog.resolve("GroundPressure_kPa").unwrap();
        assert_eq!(pressure.range, SensorRange::new(80.0, 120.0));
        assert_eq!(pressure.unit, "kPa");

        let keys: Vec<&str> = catalog.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys[0], "Temperature_C");
        assert_eq!(keys[5], "Rainfall_mm");
    }

    #[test]
    fn test_resolve_unknown_sensor() {
        let catalog = SensorCatalog::standard();
        assert_eq!(
            catalog.resolve("temperature").unwrap_err(),
            SensorError::UnknownSensor("temperature".to_string())
        );
    }

    #[test]
    fn test_with_sensor_replaces_by_key() {
        let catalog = SensorCatalog::new()
            .with_sensor(SensorSpec::new("Tilt_deg", "Tilt", "°", SensorRange::new(0.0, 10.0)))
            .with_sensor(SensorSpec::new("Tilt_deg", "Tilt", "°", SensorRange::new(0.0, 45.0)));

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Tilt_deg").unwrap().range.max, 45.0);
    }
}
