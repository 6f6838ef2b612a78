//! Error types for CLI operations.

use std::path::Path;

use capture::CaptureError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Capture session failed
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }
}

/// Fail early when the configuration file is missing
pub fn ensure_config_exists(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::config_not_found(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config() {
        let err = ensure_config_exists(Path::new("/nonexistent/capture.toml")).unwrap_err();
        assert!(matches!(err, CliError::ConfigNotFound { .. }));
        assert!(err.to_string().contains("/nonexistent/capture.toml"));
    }

    #[test]
    fn test_capture_error_conversion() {
        let err: CliError = CaptureError::ChannelClosed.into();
        assert!(err.to_string().starts_with("Capture failed"));
    }
}
