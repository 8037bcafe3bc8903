//! Nodes: spatial points bearing named sensor readings.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Stable identifier for a node within one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a sensor channel (e.g. `Temperature_C`).
///
/// Keys are validated against a [`SensorCatalog`](crate::sensors::SensorCatalog)
/// at the ingestion boundary; the graph itself accepts any key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorKey(String);

impl SensorKey {
    /// Creates a key from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SensorKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SensorKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SensorKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SensorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A spatial sample point in the stress graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,

    position: Point3<f64>,

    /// Sensor readings keyed by channel name. Keys appear on first write.
    sensors: BTreeMap<SensorKey, f64>,
}

impl Node {
    /// Creates a node with no sensor readings.
    pub fn new(id: impl Into<NodeId>, position: Point3<f64>) -> Self {
        Self {
            id: id.into(),
            position,
            sensors: BTreeMap::new(),
        }
    }

    /// Creates a node seeded with an initial sensor snapshot.
    pub fn with_sensors<K, I>(id: impl Into<NodeId>, position: Point3<f64>, sensors: I) -> Self
    where
        K: Into<SensorKey>,
        I: IntoIterator<Item = (K, f64)>,
    {
        Self {
            id: id.into(),
            position,
            sensors: sensors.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    /// Returns the stored reading, or `0.0` when the key was never written.
    pub fn get_sensor(&self, key: &str) -> f64 {
        self.sensors.get(key).copied().unwrap_or(0.0)
    }

    /// Inserts or overwrites a reading. No range clamping happens here.
    pub fn set_sensor(&mut self, key: impl Into<SensorKey>, value: f64) {
        self.sensors.insert(key.into(), value);
    }

    /// Adds `effect` to a reading, treating an absent key as `0.0`.
    pub(crate) fn add_to_sensor(&mut self, key: &str, effect: f64) {
        let value = self.get_sensor(key) + effect;
        self.set_sensor(key, value);
    }

    /// Overwrites every existing reading with `value`, keeping the key set.
    pub(crate) fn fill_sensors(&mut self, value: f64) {
        for reading in self.sensors.values_mut() {
            *reading = value;
        }
    }

    /// Read-only view of all readings.
    pub fn sensors(&self) -> &BTreeMap<SensorKey, f64> {
        &self.sensors
    }

    /// Euclidean distance to another node.
    pub fn distance_to(&self, other: &Node) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }
}
