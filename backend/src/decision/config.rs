//! Decision-process configuration
//!
//! Turns raw parameter records into constructed strategies, once per run.
//! Every failure here is a configuration error and surfaces before the
//! first tick: unknown kinds, missing or mistyped parameters, unknown
//! utility functions, names no strategy was built for, and deliberative
//! strategies lacking an importance attitude for a group pair they serve.
//!
//! Record format (JSON):
//!
//! ```json
//! {
//!   "Kiesling":   {"rangeEpsilon": 0.1, "utilityFunction": "ValueMapping"},
//!   "cautious":   {"type": "DeliberativeDecision", "utilityFunction": "ValueMapping",
//!                  "importanceAttitudeMap": {"households": {"heating": 0.7}}}
//! }
//! ```
//!
//! When `type` is absent, the record's key names the kind.

use crate::decision::deliberative::{DeliberativeDecision, ImportanceAttitudeMap};
use crate::decision::kiesling::KieslingDecision;
use crate::decision::take_the_best::{TakeTheBestDecision, TakeTheBestVariant};
use crate::decision::utility::{UtilityFunction, UtilityRegistry};
use crate::decision::DecisionProcess;
use crate::models::agent::attribute_keys;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Recognized decision-process kinds
pub const DECISION_KINDS: [&str; 4] = [
    "Kiesling",
    "TakeTheBest",
    "SchwarzTakeTheBest",
    "DeliberativeDecision",
];

/// Configuration errors (fatal at build time)
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid decision process '{name}': {reason}")]
    InvalidDecisionProcess { name: String, reason: String },

    #[error("Decision process '{name}' has unknown kind '{kind}'")]
    UnknownDecisionKind { name: String, kind: String },

    #[error("Decision process '{process}' uses unknown utility function '{function}'")]
    UnknownUtilityFunction { process: String, function: String },

    #[error("Decision process '{name}' referenced by {referenced_by} is not configured")]
    UnresolvedDecisionProcess { name: String, referenced_by: String },

    #[error("Consumer group '{name}' referenced by {referenced_by} is not configured")]
    UnknownConsumerGroup { name: String, referenced_by: String },

    #[error("Decision process '{process}' has no importance attitude for consumer group '{consumer_group}' and product group '{product_group}'")]
    MissingImportanceAttitude {
        process: String,
        consumer_group: String,
        product_group: String,
    },
}

fn default_social_norm_attribute() -> String {
    attribute_keys::SOCIAL_NORM.to_string()
}

/// Typed parameters of one decision process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecisionProcessSpec {
    Kiesling {
        #[serde(rename = "rangeEpsilon")]
        range_epsilon: f64,
        #[serde(rename = "utilityFunction")]
        utility_function: String,
    },
    TakeTheBest {
        #[serde(rename = "utilityFunction")]
        utility_function: String,
    },
    SchwarzTakeTheBest {
        #[serde(rename = "utilityFunction")]
        utility_function: String,
        #[serde(rename = "socialNormAttribute", default = "default_social_norm_attribute")]
        social_norm_attribute: String,
    },
    DeliberativeDecision {
        #[serde(rename = "utilityFunction")]
        utility_function: String,
        #[serde(rename = "importanceAttitudeMap")]
        importance_attitude_map: ImportanceAttitudeMap,
    },
}

impl DecisionProcessSpec {
    /// Parse a raw record registered under `name`
    pub fn from_record(name: &str, record: &Value) -> Result<Self, ConfigError> {
        let mut object = record
            .as_object()
            .cloned()
            .ok_or_else(|| ConfigError::InvalidDecisionProcess {
                name: name.to_string(),
                reason: "parameter record must be an object".to_string(),
            })?;

        let kind = match object.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(_) => {
                return Err(ConfigError::InvalidDecisionProcess {
                    name: name.to_string(),
                    reason: "'type' must be a string".to_string(),
                })
            }
            None => name.to_string(),
        };
        if !DECISION_KINDS.contains(&kind.as_str()) {
            return Err(ConfigError::UnknownDecisionKind {
                name: name.to_string(),
                kind,
            });
        }
        object.insert("type".to_string(), Value::String(kind));

        let spec: DecisionProcessSpec =
            serde_json::from_value(Value::Object(object)).map_err(|e| {
                ConfigError::InvalidDecisionProcess {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            })?;
        spec.validate(name)?;
        Ok(spec)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DecisionProcessSpec::Kiesling { .. } => "Kiesling",
            DecisionProcessSpec::TakeTheBest { .. } => "TakeTheBest",
            DecisionProcessSpec::SchwarzTakeTheBest { .. } => "SchwarzTakeTheBest",
            DecisionProcessSpec::DeliberativeDecision { .. } => "DeliberativeDecision",
        }
    }

    pub fn utility_function(&self) -> &str {
        match self {
            DecisionProcessSpec::Kiesling { utility_function, .. }
            | DecisionProcessSpec::TakeTheBest { utility_function }
            | DecisionProcessSpec::SchwarzTakeTheBest { utility_function, .. }
            | DecisionProcessSpec::DeliberativeDecision { utility_function, .. } => utility_function,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidDecisionProcess {
            name: name.to_string(),
            reason,
        };
        match self {
            DecisionProcessSpec::Kiesling { range_epsilon, .. } => {
                if !range_epsilon.is_finite() || *range_epsilon < 0.0 {
                    return Err(invalid(format!(
                        "rangeEpsilon must be a non-negative number, got {}",
                        range_epsilon
                    )));
                }
            }
            DecisionProcessSpec::DeliberativeDecision {
                importance_attitude_map,
                ..
            } => {
                for (consumer_group, groups) in importance_attitude_map {
                    for (product_group, weight) in groups {
                        if !(0.0..=1.0).contains(weight) {
                            return Err(invalid(format!(
                                "importance attitude for {}/{} must lie in [0, 1], got {}",
                                consumer_group, product_group, weight
                            )));
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Construct the strategy
    pub fn build(&self, name: &str, utilities: &UtilityRegistry) -> Result<Arc<dyn DecisionProcess>, ConfigError> {
        let utility: Arc<dyn UtilityFunction> =
            utilities
                .get(self.utility_function())
                .ok_or_else(|| ConfigError::UnknownUtilityFunction {
                    process: name.to_string(),
                    function: self.utility_function().to_string(),
                })?;

        let process: Arc<dyn DecisionProcess> = match self {
            DecisionProcessSpec::Kiesling { range_epsilon, .. } => {
                Arc::new(KieslingDecision::new(name, *range_epsilon, utility))
            }
            DecisionProcessSpec::TakeTheBest { .. } => {
                Arc::new(TakeTheBestDecision::new(name, TakeTheBestVariant::Plain, utility))
            }
            DecisionProcessSpec::SchwarzTakeTheBest {
                social_norm_attribute,
                ..
            } => Arc::new(TakeTheBestDecision::new(
                name,
                TakeTheBestVariant::Schwarz {
                    social_norm_attribute: social_norm_attribute.clone(),
                },
                utility,
            )),
            DecisionProcessSpec::DeliberativeDecision {
                importance_attitude_map,
                ..
            } => Arc::new(DeliberativeDecision::new(
                name,
                utility,
                importance_attitude_map.clone(),
            )),
        };
        Ok(process)
    }
}

/// Name → strategy registry for one run
#[derive(Debug, Clone, Default)]
pub struct DecisionConfiguration {
    processes: BTreeMap<String, Arc<dyn DecisionProcess>>,
    specs: BTreeMap<String, DecisionProcessSpec>,
}

impl DecisionConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and construct every record
    pub fn build(records: &BTreeMap<String, Value>, utilities: &UtilityRegistry) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        for (name, record) in records {
            let spec = DecisionProcessSpec::from_record(name, record)?;
            config.insert(name.clone(), spec, utilities)?;
        }
        Ok(config)
    }

    /// Construct and register one strategy, replacing any previous one
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        spec: DecisionProcessSpec,
        utilities: &UtilityRegistry,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        spec.validate(&name)?;
        let process = spec.build(&name, utilities)?;
        self.processes.insert(name.clone(), process);
        self.specs.insert(name, spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DecisionProcess>> {
        self.processes.get(name).cloned()
    }

    pub fn spec(&self, name: &str) -> Option<&DecisionProcessSpec> {
        self.specs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processes.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.processes.keys().map(String::as_str).collect()
    }

    /// Check every referenced name resolves, eagerly
    ///
    /// `consumer_groups` pairs each consumer group with its default process;
    /// `product_groups` pairs each product group with its optional override.
    /// A deliberative process must carry an importance attitude for every
    /// (consumer group, product group) pair it could decide for: a default
    /// for every product group, an override for every consumer group.
    pub fn validate_references(
        &self,
        consumer_groups: &[(&str, &str)],
        product_groups: &[(&str, Option<&str>)],
    ) -> Result<(), ConfigError> {
        for (group, process) in consumer_groups {
            self.require(process, &format!("consumer group '{}'", group))?;
        }
        for (group, process) in product_groups {
            if let Some(process) = process {
                self.require(process, &format!("product group '{}'", group))?;
            }
        }

        // A default also scores overridden groups when candidate overrides
        // disagree, so it must cover every product group.
        for (consumer_group, default) in consumer_groups {
            for (product_group, override_process) in product_groups {
                let reachable = std::iter::once(*default).chain(*override_process);
                for process in reachable {
                    self.require_attitude(process, consumer_group, product_group)?;
                }
            }
        }
        Ok(())
    }

    fn require_attitude(&self, process: &str, consumer_group: &str, product_group: &str) -> Result<(), ConfigError> {
        if let Some(DecisionProcessSpec::DeliberativeDecision {
            importance_attitude_map,
            ..
        }) = self.specs.get(process)
        {
            let covered = importance_attitude_map
                .get(consumer_group)
                .is_some_and(|groups| groups.contains_key(product_group));
            if !covered {
                return Err(ConfigError::MissingImportanceAttitude {
                    process: process.to_string(),
                    consumer_group: consumer_group.to_string(),
                    product_group: product_group.to_string(),
                });
            }
        }
        Ok(())
    }

    fn require(&self, name: &str, referenced_by: &str) -> Result<(), ConfigError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(ConfigError::UnresolvedDecisionProcess {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_names_kind_when_type_absent() {
        let spec = DecisionProcessSpec::from_record(
            "Kiesling",
            &json!({"rangeEpsilon": 0.1, "utilityFunction": "ValueMapping"}),
        )
        .unwrap();
        assert_eq!(spec.kind(), "Kiesling");
    }

    #[test]
    fn test_explicit_type_wins() {
        let spec = DecisionProcessSpec::from_record(
            "lexi",
            &json!({"type": "SchwarzTakeTheBest", "utilityFunction": "ValueMapping"}),
        )
        .unwrap();
        assert_eq!(
            spec,
            DecisionProcessSpec::SchwarzTakeTheBest {
                utility_function: "ValueMapping".to_string(),
                social_norm_attribute: "social_norm".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_parameter_fails_fast() {
        let err = DecisionProcessSpec::from_record("Kiesling", &json!({"utilityFunction": "ValueMapping"}))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDecisionProcess { .. }));
    }

    #[test]
    fn test_negative_epsilon_rejected() {
        let err = DecisionProcessSpec::from_record(
            "Kiesling",
            &json!({"rangeEpsilon": -1.0, "utilityFunction": "ValueMapping"}),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDecisionProcess { .. }));
    }

    #[test]
    fn test_unknown_kind() {
        let err = DecisionProcessSpec::from_record("Magic", &json!({})).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownDecisionKind {
                name: "Magic".to_string(),
                kind: "Magic".to_string(),
            }
        );
    }
}
