//! Configuration validation
//!
//! Rules:
//! - input paths are non-empty
//! - column names are non-empty and x/y/z are distinct
//! - engine settings pass their range checks (non-negative finite epsilon)
//! - at least one sink, sink names unique, per-sink range checks

use std::collections::HashSet;

use ::validator::Validate;
use contracts::{ContractError, RunBlueprint};

/// Validate a RunBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    validate_inputs(blueprint)?;
    validate_columns(blueprint)?;
    validate_engine(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// Input paths must be set
fn validate_inputs(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    let inputs = &blueprint.inputs;
    if inputs.reference.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "inputs.reference",
            "reference path cannot be empty",
        ));
    }
    if inputs.test.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "inputs.test",
            "test path cannot be empty",
        ));
    }
    Ok(())
}

/// Column names
fn validate_columns(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    let columns = &blueprint.columns;
    let named = [
        ("columns.timestamp", &columns.timestamp),
        ("columns.sec", &columns.sec),
        ("columns.nanosec", &columns.nanosec),
        ("columns.x", &columns.x),
        ("columns.y", &columns.y),
        ("columns.z", &columns.z),
    ];
    for (field, name) in named {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                field,
                "column name cannot be empty",
            ));
        }
    }

    let mut seen = HashSet::new();
    for (field, name) in &named[3..] {
        if !seen.insert(name.as_str()) {
            return Err(ContractError::config_validation(
                *field,
                format!("duplicate position column '{name}'"),
            ));
        }
    }
    Ok(())
}

/// Engine settings
fn validate_engine(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    let engine = &blueprint.engine;
    if !engine.degenerate_epsilon.is_finite() {
        return Err(ContractError::config_validation(
            "engine.degenerate_epsilon",
            format!("must be finite, got {}", engine.degenerate_epsilon),
        ));
    }
    engine
        .validate()
        .map_err(|e| ContractError::config_validation("engine", e.to_string()))
}

/// Sink configs
fn validate_sinks(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    if blueprint.sinks.is_empty() {
        return Err(ContractError::config_validation(
            "sinks",
            "at least one sink is required",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        sink.validate().map_err(|e| {
            ContractError::config_validation(format!("sinks[{}]", idx), e.to_string())
        })?;
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if let Some(path) = sink.params.get("path") {
            if path.trim().is_empty() {
                return Err(ContractError::config_validation(
                    format!("sinks[{}].params.path", idx),
                    "path cannot be empty",
                ));
            }
        }
    }
    Ok(())
}
