//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::CaptureBlueprint;
use frame_archive::USER_QUEUE_SIZE;
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
    stream_count: usize,
    bytes_per_frameset: usize,
    freelist_capacity: usize,
    queue_capacity: usize,
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
                    stream_count: blueprint.streams.len(),
                    bytes_per_frameset: blueprint
                        .stream_modes()
                        .enabled()
                        .map(|(_, mode)| mode.frame_size())
                        .sum(),
                    freelist_capacity: blueprint.archive.freelist_capacity,
                    queue_capacity: blueprint.capture.queue_capacity,
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
fn collect_warnings(blueprint: &CaptureBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let streams = blueprint.stream_modes().enabled_count();

    // Queued framesets, the pending set and the syncer all hold frames
    let worst_case = (blueprint.capture.queue_capacity + 2) * streams;
    if worst_case > USER_QUEUE_SIZE {
        warnings.push(format!(
            "capture.queue_capacity={} may hold up to {} frames; the archive has {} slots",
            blueprint.capture.queue_capacity, worst_case, USER_QUEUE_SIZE
        ));
    }

    if blueprint.archive.freelist_capacity < streams {
        warnings.push(format!(
            "archive.freelist_capacity={} is below the number of streams ({}); buffers will be reallocated",
            blueprint.archive.freelist_capacity, streams
        ));
    }

    let fastest = blueprint.streams.iter().map(|s| s.fps).max().unwrap_or(0);
    let slowest = blueprint.streams.iter().map(|s| s.fps).min().unwrap_or(0);
    if slowest > 0 && fastest / slowest >= 2 {
        warnings.push(format!(
            "stream rates differ ({} vs {} fps); framesets follow the slowest stream",
            fastest, slowest
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Streams: {}", summary.stream_count);
            println!("  Bytes per frameset: {}", summary.bytes_per_frameset);
            println!("  Freelist capacity: {}", summary.freelist_capacity);
            println!("  Queue capacity: {}", summary.queue_capacity);
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_with_queue_warning() {
        let file = write_config(
            r#"
[capture]
queue_capacity = 40

[[streams]]
stream = "depth"
width = 4
height = 4
format = "z16"
fps = 30

[[streams]]
stream = "color"
width = 4
height = 4
format = "rgb8"
fps = 30
"#,
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.stream_count, 2);
        assert_eq!(summary.bytes_per_frameset, 4 * 4 * 2 + 4 * 4 * 3);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("queue_capacity"));
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/capture.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
