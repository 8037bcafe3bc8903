//! Propagation scenarios for the deterministic harness.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// PROP-001: change on a node with no neighbors
    IsolatedNode,

    /// PROP-002: exponential decay along a unit-spaced chain
    ChainDecay,

    /// PROP-003: negligible effects stop the spread at hop 20
    PruningBoundary,

    /// PROP-004: cycles mutate each node once
    CycleSingleVisit,

    /// PROP-005: three points, one connected pair, one outlier
    ThreeNodeExample,

    /// PROP-006: tool dropped near the model, clamped at the source
    ToolBlast,

    /// PROP-007: seeded random sample cloud with random perturbations
    RandomCloud,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::IsolatedNode,
            ScenarioId::ChainDecay,
            ScenarioId::PruningBoundary,
            ScenarioId::CycleSingleVisit,
            ScenarioId::ThreeNodeExample,
            ScenarioId::ToolBlast,
            ScenarioId::RandomCloud,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::IsolatedNode => "isolated_node",
            ScenarioId::ChainDecay => "chain_decay",
            ScenarioId::PruningBoundary => "pruning_boundary",
            ScenarioId::CycleSingleVisit => "cycle_single_visit",
            ScenarioId::ThreeNodeExample => "three_node_example",
            ScenarioId::ToolBlast => "tool_blast",
            ScenarioId::RandomCloud => "random_cloud",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::IsolatedNode => "Single node receives the full delta, nothing else changes",
            ScenarioId::ChainDecay => "Effect at hop i equals delta * decay^i and shrinks with i",
            ScenarioId::PruningBoundary => "decay=0.5, delta=1: hops >= 20 stay untouched",
            ScenarioId::CycleSingleVisit => "Triangle 0-1-2-0: every node applied exactly once",
            ScenarioId::ThreeNodeExample => "decay=0.7: +10.0, +7.0, isolated node unchanged",
            ScenarioId::ToolBlast => "Tool near node cluster: nearest node clamped, neighbors decayed",
            ScenarioId::RandomCloud => "Seeded cloud, proximity graph, random clamped perturbations",
        }
    }

    /// Returns true if the scenario depends on the seed.
    pub fn is_seeded(&self) -> bool {
        matches!(self, ScenarioId::RandomCloud)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "isolated_node" | "isolated" | "prop-001" => Ok(ScenarioId::IsolatedNode),
            "chain_decay" | "chain" | "prop-002" => Ok(ScenarioId::ChainDecay),
            "pruning_boundary" | "pruning" | "prop-003" => Ok(ScenarioId::PruningBoundary),
            "cycle_single_visit" | "cycle" | "prop-004" => Ok(ScenarioId::CycleSingleVisit),
            "three_node_example" | "three_node" | "prop-005" => Ok(ScenarioId::ThreeNodeExample),
            "tool_blast" | "tool" | "prop-006" => Ok(ScenarioId::ToolBlast),
            "random_cloud" | "cloud" | "prop-007" => Ok(ScenarioId::RandomCloud),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
            assert_eq!(scenario.to_string(), scenario.name());
        }
    }

    #[test]
    fn test_aliases_and_unknown() {
        assert_eq!("PROP-004".parse::<ScenarioId>(), Ok(ScenarioId::CycleSingleVisit));
        assert_eq!("Cloud".parse::<ScenarioId>(), Ok(ScenarioId::RandomCloud));
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }
}
