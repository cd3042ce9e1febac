//! Scenario configuration, loaded from JSON.
//!
//! Every field has a default, so `{}` describes the reference power-aware routing scenario:
//! 10^6 units of uniform traffic in one class, links provisioned at 3x the shortest-path
//! peak, five sampled candidate paths per class, at most five active nodes.

use crate::formulation::{Accounting, IndicatorDomain, NodeActivation, ObjectiveTemplate, PowerCosts};
use crate::path::{HasMiddlebox, NullPredicate, PathPredicate, ServiceChain};
use crate::traffic::ClassProfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("Invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    #[default]
    MinRoutingCost,
    MinRoutingCostWithPower,
    MinPower,
    MinMaxLinkLoad,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    #[default]
    Null,
    HasMiddlebox,
    ServiceChain,
}

impl PredicateKind {
    pub fn build(&self) -> Box<dyn PathPredicate> {
        match self {
            PredicateKind::Null => Box::new(NullPredicate),
            PredicateKind::HasMiddlebox => Box::new(HasMiddlebox),
            PredicateKind::ServiceChain => Box::new(ServiceChain),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PowerConfig {
    pub node: f64,
    pub link: f64,
}

impl Default for PowerConfig {
    fn default() -> Self { Self { node: 1500.0, link: 500.0 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    // Traffic
    pub total_volume: f64,
    pub classes: BTreeMap<String, ClassProfile>,
    pub oversubscription: f64,

    // Paths
    pub predicate: PredicateKind,
    pub path_length_factor: f64,
    /// Fixed hop bound. Overrides `path_length_factor` when set.
    pub max_path_length: Option<usize>,
    pub max_paths: usize,
    /// Random sample size per class; `None` keeps every generated path.
    pub paths_per_class: Option<usize>,
    pub seed: u64,

    // Formulation
    pub indicators: IndicatorDomain,
    pub node_activation: NodeActivation,
    pub link_indicators: bool,
    pub capacity_accounting: Accounting,
    pub min_active_nodes: usize,
    pub node_budget: f64,
    pub node_cost: f64,
    pub link_budget: Option<f64>,
    pub link_cost: f64,
    pub objective: ObjectiveKind,
    pub power: PowerConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            total_volume: 1e6,
            classes: BTreeMap::from([(
                "allTraffic".to_string(),
                ClassProfile { weight: 1.0, flow_size: 2000.0, services: Vec::new() },
            )]),
            oversubscription: 3.0,
            predicate: PredicateKind::Null,
            path_length_factor: 1.5,
            max_path_length: None,
            max_paths: 1000,
            paths_per_class: Some(5),
            seed: 0,
            indicators: IndicatorDomain::Binary,
            node_activation: NodeActivation::TransitOnly,
            link_indicators: false,
            capacity_accounting: Accounting::NoNormalize,
            min_active_nodes: 1,
            node_budget: 5.0,
            node_cost: 1.0,
            link_budget: None,
            link_cost: 1.0,
            objective: ObjectiveKind::MinRoutingCost,
            power: PowerConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("total_volume", self.total_volume)?;
        if self.classes.is_empty() {
            return Err(invalid("classes", "at least one traffic class is required"));
        }
        for profile in self.classes.values() {
            non_negative("classes.weight", profile.weight)?;
            non_negative("classes.flow_size", profile.flow_size)?;
        }
        positive("oversubscription", self.oversubscription)?;
        positive("path_length_factor", self.path_length_factor)?;
        if self.max_path_length == Some(0) {
            return Err(invalid("max_path_length", "must be at least one hop"));
        }
        if self.max_paths == 0 {
            return Err(invalid("max_paths", "must be at least 1"));
        }
        if self.paths_per_class == Some(0) {
            return Err(invalid("paths_per_class", "must be at least 1"));
        }
        non_negative("node_budget", self.node_budget)?;
        non_negative("node_cost", self.node_cost)?;
        non_negative("link_cost", self.link_cost)?;
        non_negative("power.node", self.power.node)?;
        non_negative("power.link", self.power.link)?;
        if let Some(budget) = self.link_budget {
            non_negative("link_budget", budget)?;
            if !self.link_indicators {
                return Err(invalid("link_budget", "needs link_indicators"));
            }
        }
        Ok(())
    }

    pub fn objective_template(&self) -> ObjectiveTemplate {
        let power = PowerCosts::uniform(self.power.node, self.power.link);
        match self.objective {
            ObjectiveKind::MinRoutingCost => ObjectiveTemplate::MinRoutingCost,
            ObjectiveKind::MinRoutingCostWithPower => ObjectiveTemplate::MinRoutingCostWithPower(power),
            ObjectiveKind::MinPower => ObjectiveTemplate::MinPower(power),
            ObjectiveKind::MinMaxLinkLoad => ObjectiveTemplate::MinMaxLinkLoad,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 { Ok(()) } else { Err(invalid(field, format!("{value} is not a finite, non-negative number"))) }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 { Ok(()) } else { Err(invalid(field, format!("{value} is not a finite, positive number"))) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_empty_json_is_the_reference_scenario() {
        let config = ScenarioConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ScenarioConfig::default());
        assert_eq!(config.classes["allTraffic"].flow_size, 2000.0);
        assert_eq!(config.paths_per_class, Some(5));
        assert_eq!(config.objective_template(), ObjectiveTemplate::MinRoutingCost);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "node_budget": 3,
            "objective": "min_routing_cost_with_power",
            "node_activation": "all-on-path",
            "power": { "node": 100 }
        }"#;
        let config = ScenarioConfig::from_json_str(json).unwrap();
        assert_eq!(config.node_budget, 3.0);
        assert_eq!(config.node_activation, NodeActivation::AllOnPath);
        assert_eq!(config.power, PowerConfig { node: 100.0, link: 500.0 });
        assert_eq!(
            config.objective_template(),
            ObjectiveTemplate::MinRoutingCostWithPower(PowerCosts::uniform(100.0, 500.0))
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(matches!(ScenarioConfig::from_json_str(r#"{"node_budjet": 3}"#), Err(ConfigError::Parse(_))));
    }

    #[rstest]
    #[case(r#"{"oversubscription": 0}"#, "oversubscription")]
    #[case(r#"{"total_volume": -1}"#, "total_volume")]
    #[case(r#"{"max_paths": 0}"#, "max_paths")]
    #[case(r#"{"paths_per_class": 0}"#, "paths_per_class")]
    #[case(r#"{"classes": {}}"#, "classes")]
    #[case(r#"{"link_budget": 4}"#, "link_budget")]
    fn test_invalid_values(#[case] json: &str, #[case] expected: &str) {
        match ScenarioConfig::from_json_str(json) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected invalid '{expected}', got {other:?}"),
        }
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"seed": 7, "paths_per_class": null}}"#).unwrap();
        let config = ScenarioConfig::from_path(file.path()).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.paths_per_class, None);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScenarioConfig::from_path(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
