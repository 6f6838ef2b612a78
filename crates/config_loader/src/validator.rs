//! Configuration validation
//!
//! Rules:
//! - at least one stream is enabled
//! - each stream kind appears at most once
//! - width, height and fps > 0
//! - freelist_capacity > 0, freelist_max_age >= 0
//! - queue_capacity > 0

use std::collections::HashSet;

use contracts::{CaptureBlueprint, ContractError};

/// Validate a CaptureBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    validate_streams_present(blueprint)?;
    validate_unique_streams(blueprint)?;
    validate_stream_modes(blueprint)?;
    validate_archive(blueprint)?;
    validate_capture(blueprint)?;
    Ok(())
}

fn validate_streams_present(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    if blueprint.streams.is_empty() {
        return Err(ContractError::config_validation(
            "streams",
            "at least one stream must be enabled",
        ));
    }
    Ok(())
}

/// Each stream kind indexes one archive slot, so it may appear only once
fn validate_unique_streams(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for stream in &blueprint.streams {
        if !seen.insert(stream.stream) {
            return Err(ContractError::config_validation(
                format!("streams[stream={}]", stream.stream),
                "duplicate stream",
            ));
        }
    }
    Ok(())
}

fn validate_stream_modes(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    for stream in &blueprint.streams {
        if stream.width == 0 || stream.height == 0 {
            return Err(ContractError::config_validation(
                format!("streams[{}].width/height", stream.stream),
                format!(
                    "resolution must be non-zero, got {}x{}",
                    stream.width, stream.height
                ),
            ));
        }
        if stream.fps == 0 {
            return Err(ContractError::config_validation(
                format!("streams[{}].fps", stream.stream),
                "fps must be > 0",
            ));
        }
    }
    Ok(())
}

fn validate_archive(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let archive = &blueprint.archive;
    if archive.freelist_capacity == 0 {
        return Err(ContractError::config_validation(
            "archive.freelist_capacity",
            "freelist_capacity must be > 0",
        ));
    }
    if archive.freelist_max_age < 0 {
        return Err(ContractError::config_validation(
            "archive.freelist_max_age",
            format!(
                "freelist_max_age must be >= 0, got {}",
                archive.freelist_max_age
            ),
        ));
    }
    Ok(())
}

fn validate_capture(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    if blueprint.capture.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "capture.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    Ok(())
}
