//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::CaptureBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::ensure_config_exists;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    streams: Vec<StreamInfo>,
    archive: ArchiveInfo,
    capture: CaptureInfo,
}

#[derive(Serialize)]
struct StreamInfo {
    stream: String,
    width: u32,
    height: u32,
    format: String,
    fps: u32,
    frame_bytes: usize,
}

#[derive(Serialize)]
struct ArchiveInfo {
    pool_capacity: usize,
    freelist_capacity: usize,
    freelist_max_age: i64,
}

#[derive(Serialize)]
struct CaptureInfo {
    warmup_frames: u32,
    queue_capacity: usize,
    frame_timeout_ms: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    ensure_config_exists(&args.config)?;

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &CaptureBlueprint) -> ConfigInfo {
    let streams = blueprint
        .streams
        .iter()
        .map(|s| StreamInfo {
            stream: s.stream.to_string(),
            width: s.width,
            height: s.height,
            format: format!("{:?}", s.format),
            fps: s.fps,
            frame_bytes: s.mode().frame_size(),
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        streams,
        archive: ArchiveInfo {
            pool_capacity: frame_archive::USER_QUEUE_SIZE,
            freelist_capacity: blueprint.archive.freelist_capacity,
            freelist_max_age: blueprint.archive.freelist_max_age,
        },
        capture: CaptureInfo {
            warmup_frames: blueprint.capture.warmup_frames,
            queue_capacity: blueprint.capture.queue_capacity,
            frame_timeout_ms: blueprint.capture.frame_timeout_ms,
        },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Frame Archive Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Version: {}", info.version);

    println!("\n📷 Streams ({})", info.streams.len());
    for (i, s) in info.streams.iter().enumerate() {
        let prefix = if i == info.streams.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} {} {}x{} {} @ {} fps ({} bytes/frame)",
            prefix, s.stream, s.width, s.height, s.format, s.fps, s.frame_bytes
        );
    }

    println!("\n🗄  Archive");
    println!("   ├─ Pool capacity: {}", info.archive.pool_capacity);
    println!("   ├─ Freelist capacity: {}", info.archive.freelist_capacity);
    println!("   └─ Freelist max age: {}", info.archive.freelist_max_age);

    println!("\n⚙️  Capture");
    println!("   ├─ Warm-up framesets: {}", info.capture.warmup_frames);
    println!("   ├─ Queue capacity: {}", info.capture.queue_capacity);
    println!("   └─ Frame timeout: {} ms", info.capture.frame_timeout_ms);

    println!();
}
