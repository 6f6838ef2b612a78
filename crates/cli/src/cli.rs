//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Frame Archive - reference-counted frame buffers for multi-stream cameras
#[derive(Parser, Debug)]
#[command(
    name = "frame-archive",
    author,
    version,
    about = "Multi-stream camera frame archive",
    long_about = "Capture framesets from a camera device through a bounded, recycling frame archive.\n\n\
                  Loads a stream configuration, drives the device, assembles one frame per \n\
                  enabled stream into framesets and reports archive and capture statistics."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FRAME_ARCHIVE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FRAME_ARCHIVE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture framesets from the device
    Run(RunArgs),

    /// Validate configuration file without capturing
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "capture.toml",
        env = "FRAME_ARCHIVE_CONFIG"
    )]
    pub config: PathBuf,

    /// Number of framesets to consume (0 = until Ctrl+C)
    #[arg(long, default_value = "0", env = "FRAME_ARCHIVE_MAX_FRAMESETS")]
    pub max_framesets: u64,

    /// Capture timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "FRAME_ARCHIVE_TIMEOUT")]
    pub timeout: u64,

    /// Override the mock device rate (Hz)
    #[arg(long)]
    pub frequency: Option<f64>,

    /// Override the number of warm-up framesets
    #[arg(long)]
    pub warmup: Option<u32>,

    /// Override the frameset queue capacity
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Validate configuration and exit without capturing
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FRAME_ARCHIVE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "capture.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "capture.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::parse_from([
            "frame-archive",
            "-v",
            "run",
            "--config",
            "cam.toml",
            "--max-framesets",
            "10",
            "--warmup",
            "0",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("cam.toml"));
                assert_eq!(args.max_framesets, 10);
                assert_eq!(args.warmup, Some(0));
                assert!(args.queue_capacity.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
