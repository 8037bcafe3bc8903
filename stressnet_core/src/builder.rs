//! Ingestion: turning a spatial sample set into a connected graph.

use crate::error::{GraphError, SensorError};
use crate::graph::{GraphConfig, SpatialGraph};
use crate::node::{Node, SensorKey};
use crate::sensors::SensorCatalog;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One sampled point with its initial sensor snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSample {
    pub position: Point3<f64>,
    #[serde(default)]
    pub sensors: BTreeMap<SensorKey, f64>,
}

impl NodeSample {
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            sensors: BTreeMap::new(),
        }
    }

    pub fn with_sensor(mut self, key: impl Into<SensorKey>, value: f64) -> Self {
        self.sensors.insert(key.into(), value);
        self
    }

    /// Rejects sensor names that the catalog does not know.
    pub fn validate(&self, catalog: &SensorCatalog) -> Result<(), SensorError> {
        for key in self.sensors.keys() {
            catalog.resolve(key.as_str())?;
        }
        Ok(())
    }
}

/// Builds a [`SpatialGraph`] for one analysis pass.
///
/// Node ids are assigned `0..n` in sample order. When a proximity radius is
/// set, every pair at most that far apart is connected. When a catalog is
/// set, every sample's sensor names must resolve against it.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: GraphConfig,
    samples: Vec<NodeSample>,
    proximity_radius: Option<f64>,
    catalog: Option<SensorCatalog>,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn samples(mut self, samples: impl IntoIterator<Item = NodeSample>) -> Self {
        self.samples.extend(samples);
        self
    }

    pub fn sample(mut self, sample: NodeSample) -> Self {
        self.samples.push(sample);
        self
    }

    pub fn proximity_radius(mut self, radius: f64) -> Self {
        self.proximity_radius = Some(radius);
        self
    }

    pub fn catalog(mut self, catalog: SensorCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn build(self) -> Result<SpatialGraph, GraphError> {
        let mut graph = SpatialGraph::with_config(self.config)?;
        if let Some(radius) = self.proximity_radius {
            if !(radius.is_finite() && radius >= 0.0) {
                return Err(GraphError::InvalidRadius(radius));
            }
        }

        if let Some(catalog) = &self.catalog {
            for sample in &self.samples {
                sample.validate(catalog)?;
            }
        }

        for (idx, sample) in self.samples.into_iter().enumerate() {
            graph.add_node(Node::with_sensors(idx as u64, sample.position, sample.sensors));
        }

        if let Some(radius) = self.proximity_radius {
            graph.connect_within(radius)?;
        }

        tracing::info!(
            pass_id = %graph.pass_id(),
            nodes = graph.len(),
            edges = graph.edge_count(),
            decay = graph.decay(),
            "graph built"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;

    #[test]
    fn test_build_assigns_ids_and_connects() {
        let graph = GraphBuilder::new(GraphConfig::default())
            .sample(NodeSample::new(Point3::new(0.0, 0.0, 0.0)).with_sensor("Temperature_C", 20.0))
            .sample(NodeSample::new(Point3::new(1.0, 0.0, 0.0)))
            .sample(NodeSample::new(Point3::new(10.0, 0.0, 0.0)))
            .proximity_radius(2.0)
            .build()
            .unwrap();

        assert_eq!(graph.node_ids(), vec![NodeId(0), NodeId(1), NodeId(2)]);
        assert_eq!(graph.edges(), vec![(NodeId(0), NodeId(1))]);
        assert_eq!(graph.node(0u64).unwrap().get_sensor("Temperature_C"), 20.0);
    }

    #[test]
    fn test_build_without_radius_has_no_edges() {
        let graph = GraphBuilder::new(GraphConfig::default())
            .samples((0..4).map(|i| NodeSample::new(Point3::new(i as f64, 0.0, 0.0))))
            .build()
            .unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_build_rejects_bad_config() {
        let err = GraphBuilder::new(GraphConfig::with_decay(2.0)).build().unwrap_err();
        assert_eq!(err, GraphError::InvalidDecay(2.0));

        let err = GraphBuilder::default()
            .proximity_radius(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidRadius(_)));
    }

    #[test]
    fn test_sample_validation() {
        let catalog = SensorCatalog::standard();
        let ok = NodeSample::new(Point3::origin()).with_sensor("Humidity_%", 40.0);
        assert!(ok.validate(&catalog).is_ok());

        let bad = NodeSample::new(Point3::origin()).with_sensor("Wind_kph", 3.0);
        assert_eq!(
            bad.validate(&catalog).unwrap_err(),
            SensorError::UnknownSensor("Wind_kph".to_string())
        );
    }

    #[test]
    fn test_build_rejects_unknown_sensor_against_catalog() {
        let samples = vec![
            NodeSample::new(Point3::origin()).with_sensor("Temperature_C", 20.0),
            NodeSample::new(Point3::new(1.0, 0.0, 0.0)).with_sensor("Wind_kph", 3.0),
        ];

        let err = GraphBuilder::new(GraphConfig::default())
            .samples(samples.clone())
            .catalog(SensorCatalog::standard())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::Sensor(SensorError::UnknownSensor("Wind_kph".to_string()))
        );

        // Without a catalog, keys are taken as given
        let graph = GraphBuilder::new(GraphConfig::default())
            .samples(samples)
            .build()
            .unwrap();
        assert_eq!(graph.node(1u64).unwrap().get_sensor("Wind_kph"), 3.0);
    }

    #[test]
    fn test_sample_from_json() {
        let json = r#"{"position": [1.0, 2.0, 3.0], "sensors": {"Rainfall_mm": 12.5}}"#;
        let sample: NodeSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(sample.sensors.get("Rainfall_mm"), Some(&12.5));

        let bare: NodeSample = serde_json::from_str(r#"{"position": [0.0, 0.0, 0.0]}"#).unwrap();
        assert!(bare.sensors.is_empty());
    }
}
