//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::CaptureBlueprint;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::ensure_config_exists;
use crate::pipeline::{CapturePipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_capture(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    ensure_config_exists(&args.config)?;

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    apply_overrides(&mut blueprint, args);

    info!(
        streams = blueprint.streams.len(),
        warmup_frames = blueprint.capture.warmup_frames,
        queue_capacity = blueprint.capture.queue_capacity,
        freelist_capacity = blueprint.archive.freelist_capacity,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = CapturePipeline::new(PipelineConfig {
        blueprint,
        max_framesets: (args.max_framesets != 0).then_some(args.max_framesets),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
        frequency_hz: args.frequency,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    let shutdown_signal = shutdown_signal();

    info!("Starting capture...");

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Capture failed")?;
            info!(
                framesets = stats.framesets,
                dropped = stats.capture.framesets_dropped,
                fps = format!("{:.2}", stats.fps()),
                "Capture completed successfully"
            );
            stats.print_summary();
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping capture...");
        }
    }

    info!("Frame Archive finished");
    Ok(())
}

fn apply_overrides(blueprint: &mut CaptureBlueprint, args: &RunArgs) {
    if let Some(warmup) = args.warmup {
        info!(warmup, "Overriding warm-up framesets from CLI");
        blueprint.capture.warmup_frames = warmup;
    }
    if let Some(capacity) = args.queue_capacity {
        info!(capacity, "Overriding queue capacity from CLI");
        blueprint.capture.queue_capacity = capacity.max(1);
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &CaptureBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Streams ({}):", blueprint.streams.len());
    for stream in &blueprint.streams {
        println!(
            "  - {} {}x{} {:?} @ {} fps",
            stream.stream, stream.width, stream.height, stream.format, stream.fps
        );
    }
    println!("\nArchive:");
    println!("  Freelist capacity: {}", blueprint.archive.freelist_capacity);
    println!("  Freelist max age: {}", blueprint.archive.freelist_max_age);
    println!("\nCapture:");
    println!("  Warm-up framesets: {}", blueprint.capture.warmup_frames);
    println!("  Queue capacity: {}", blueprint.capture.queue_capacity);
    println!("  Frame timeout: {} ms", blueprint.capture.frame_timeout_ms);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_apply_overrides() {
        let mut blueprint = ConfigLoader::load_from_str(
            r#"
[[streams]]
stream = "depth"
width = 4
height = 4
format = "z16"
fps = 30
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let args = RunArgs {
            config: "capture.toml".into(),
            max_framesets: 0,
            timeout: 0,
            frequency: None,
            warmup: Some(0),
            queue_capacity: Some(0),
            dry_run: true,
            metrics_port: 0,
        };
        apply_overrides(&mut blueprint, &args);
        assert_eq!(blueprint.capture.warmup_frames, 0);
        assert_eq!(blueprint.capture.queue_capacity, 1);
    }
}
