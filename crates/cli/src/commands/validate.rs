//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{CorrespondenceMode, RunBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    reference: String,
    test: String,
    mode: CorrespondenceMode,
    projection: String,
    output_dir: String,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    reference: blueprint.inputs.reference.display().to_string(),
                    test: blueprint.inputs.test.display().to_string(),
                    mode: blueprint.engine.mode,
                    projection: blueprint.engine.projection.to_string(),
                    output_dir: blueprint.output_directory().display().to_string(),
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RunBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    for (role, path) in [
        ("reference", &blueprint.inputs.reference),
        ("test", &blueprint.inputs.test),
    ] {
        if !path.exists() {
            warnings.push(format!("{} file does not exist yet: {}", role, path.display()));
        }
    }

    if !blueprint.sinks.iter().any(|s| s.sink_type == SinkType::Csv) {
        warnings.push("No csv sink configured - per-sample errors will not be written".to_string());
    }

    if blueprint.engine.mode.is_time_based() && !blueprint.engine.validate_reference_order {
        warnings.push(format!(
            "Reference order check disabled in {} mode - unsorted references give undefined pairs",
            blueprint.engine.mode
        ));
    }

    if blueprint.engine.mode == CorrespondenceMode::NearestNeighborXY {
        warnings.push(
            "nearest_neighbor_xy pairs the last two running-minimum hits, not the two nearest points"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Reference: {}", summary.reference);
            println!("  Test: {}", summary.test);
            println!("  Mode: {} ({} projection)", summary.mode, summary.projection);
            println!("  Output: {}", summary.output_dir);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
