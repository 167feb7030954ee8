//! Tests for decision-process configuration
//!
//! Every misconfiguration surfaces while building, before any tick runs.

use adoption_simulator_core_rs::decision::{ConfigError, DecisionConfiguration, DecisionProcessSpec, UtilityRegistry};
use serde_json::{json, Value};
use std::collections::BTreeMap;

fn records(value: Value) -> BTreeMap<String, Value> {
    serde_json::from_value(value).unwrap()
}

fn build(value: Value) -> Result<DecisionConfiguration, ConfigError> {
    DecisionConfiguration::build(&records(value), &UtilityRegistry::with_builtins())
}

#[test]
fn test_builds_every_kind() {
    let config = build(json!({
        "Kiesling": {"rangeEpsilon": 0.2, "utilityFunction": "ValueMapping"},
        "TakeTheBest": {"utilityFunction": "ValueMapping"},
        "SchwarzTakeTheBest": {"utilityFunction": "PerceivedValue"},
        "careful": {
            "type": "DeliberativeDecision",
            "utilityFunction": "ValueMapping",
            "importanceAttitudeMap": {"households": {"heating": 0.7}}
        }
    }))
    .unwrap();

    assert_eq!(
        config.names(),
        vec!["Kiesling", "SchwarzTakeTheBest", "TakeTheBest", "careful"]
    );
    assert_eq!(config.get("careful").unwrap().name(), "careful");
    assert_eq!(config.spec("careful").unwrap().kind(), "DeliberativeDecision");
    assert!(config.get("missing").is_none());
}

#[test]
fn test_unknown_utility_function_fails() {
    let err = build(json!({
        "TakeTheBest": {"utilityFunction": "Astrology"}
    }))
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownUtilityFunction {
            process: "TakeTheBest".to_string(),
            function: "Astrology".to_string(),
        }
    );
}

#[test]
fn test_mistyped_parameter_fails() {
    let err = build(json!({
        "Kiesling": {"rangeEpsilon": "wide", "utilityFunction": "ValueMapping"}
    }))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidDecisionProcess { ref name, .. } if name == "Kiesling"));
}

#[test]
fn test_record_must_be_object() {
    let err = build(json!({"Kiesling": 0.1})).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidDecisionProcess { .. }));
}

#[test]
fn test_importance_attitude_out_of_range_fails() {
    let err = build(json!({
        "DeliberativeDecision": {
            "utilityFunction": "ValueMapping",
            "importanceAttitudeMap": {"households": {"heating": 1.5}}
        }
    }))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidDecisionProcess { .. }));
}

#[test]
fn test_unresolved_reference_fails() {
    let config = build(json!({
        "TakeTheBest": {"utilityFunction": "ValueMapping"}
    }))
    .unwrap();

    let err = config
        .validate_references(&[("households", "Kiesling")], &[("heating", None)])
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnresolvedDecisionProcess {
            name: "Kiesling".to_string(),
            referenced_by: "consumer group 'households'".to_string(),
        }
    );

    let err = config
        .validate_references(&[("households", "TakeTheBest")], &[("heating", Some("Nope"))])
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnresolvedDecisionProcess { ref name, .. } if name == "Nope"));
}

#[test]
fn test_deliberative_needs_attitude_for_every_served_pair() {
    let config = build(json!({
        "TakeTheBest": {"utilityFunction": "ValueMapping"},
        "DeliberativeDecision": {
            "utilityFunction": "ValueMapping",
            "importanceAttitudeMap": {"households": {"heating": 0.7}}
        }
    }))
    .unwrap();

    // covered pair
    assert!(config
        .validate_references(&[("households", "DeliberativeDecision")], &[("heating", None)])
        .is_ok());

    // a second consumer group without attitudes
    let err = config
        .validate_references(
            &[("households", "DeliberativeDecision"), ("firms", "DeliberativeDecision")],
            &[("heating", None)],
        )
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::MissingImportanceAttitude {
            process: "DeliberativeDecision".to_string(),
            consumer_group: "firms".to_string(),
            product_group: "heating".to_string(),
        }
    );
}

#[test]
fn test_deliberative_default_covers_overridden_product_groups() {
    let config = build(json!({
        "TakeTheBest": {"utilityFunction": "ValueMapping"},
        "DeliberativeDecision": {
            "utilityFunction": "ValueMapping",
            "importanceAttitudeMap": {"households": {"heating": 0.7}}
        }
    }))
    .unwrap();

    // mixed candidates from both groups fall back to the default
    let err = config
        .validate_references(
            &[("households", "DeliberativeDecision")],
            &[("heating", None), ("cars", Some("TakeTheBest"))],
        )
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::MissingImportanceAttitude {
            process: "DeliberativeDecision".to_string(),
            consumer_group: "households".to_string(),
            product_group: "cars".to_string(),
        }
    );

    let covered = build(json!({
        "TakeTheBest": {"utilityFunction": "ValueMapping"},
        "DeliberativeDecision": {
            "utilityFunction": "ValueMapping",
            "importanceAttitudeMap": {"households": {"heating": 0.7, "cars": 0.2}}
        }
    }))
    .unwrap();
    assert!(covered
        .validate_references(
            &[("households", "DeliberativeDecision")],
            &[("heating", None), ("cars", Some("TakeTheBest"))],
        )
        .is_ok());
}

#[test]
fn test_deliberative_override_covers_every_consumer_group() {
    let config = build(json!({
        "TakeTheBest": {"utilityFunction": "ValueMapping"},
        "DeliberativeDecision": {
            "utilityFunction": "ValueMapping",
            "importanceAttitudeMap": {"households": {"cars": 0.4}}
        }
    }))
    .unwrap();

    let err = config
        .validate_references(
            &[("households", "TakeTheBest"), ("firms", "TakeTheBest")],
            &[("cars", Some("DeliberativeDecision"))],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingImportanceAttitude { ref consumer_group, .. } if consumer_group == "firms"
    ));
}

#[test]
fn test_insert_replaces_existing_process() {
    let utilities = UtilityRegistry::with_builtins();
    let mut config = DecisionConfiguration::new();
    config
        .insert(
            "Kiesling",
            DecisionProcessSpec::Kiesling {
                range_epsilon: 0.0,
                utility_function: "ValueMapping".to_string(),
            },
            &utilities,
        )
        .unwrap();
    config
        .insert(
            "Kiesling",
            DecisionProcessSpec::Kiesling {
                range_epsilon: 0.5,
                utility_function: "ValueMapping".to_string(),
            },
            &utilities,
        )
        .unwrap();

    assert_eq!(config.names().len(), 1);
    assert_eq!(
        config.spec("Kiesling"),
        Some(&DecisionProcessSpec::Kiesling {
            range_epsilon: 0.5,
            utility_function: "ValueMapping".to_string(),
        })
    );
}
