//! CaptureBlueprint - Config Loader output
//!
//! Describes a full capture configuration: enabled streams and their modes,
//! archive sizing and consumer-side capture settings.

use serde::{Deserialize, Serialize};

use crate::{PixelFormat, StreamKind, StreamMode, StreamModes};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete capture blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Archive sizing
    #[serde(default)]
    pub archive: ArchiveSettings,

    /// Consumer-side capture settings
    #[serde(default)]
    pub capture: CaptureSettings,

    /// Enabled streams
    pub streams: Vec<StreamConfig>,
}

impl CaptureBlueprint {
    /// Build the immutable per-stream mode table.
    pub fn stream_modes(&self) -> StreamModes {
        let mut modes = StreamModes::new();
        for stream in &self.streams {
            modes.set(stream.stream, stream.mode());
        }
        modes
    }
}

/// Archive sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Maximum number of retired buffers kept for reuse
    #[serde(default = "default_freelist_capacity")]
    pub freelist_capacity: usize,

    /// Retired buffers older than this (device timestamp units) are discarded
    #[serde(default = "default_freelist_max_age")]
    pub freelist_max_age: i64,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            freelist_capacity: default_freelist_capacity(),
            freelist_max_age: default_freelist_max_age(),
        }
    }
}

fn default_freelist_capacity() -> usize {
    32
}

fn default_freelist_max_age() -> i64 {
    1000
}

/// Consumer-side capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Framesets discarded at startup to let auto-exposure settle
    #[serde(default = "default_warmup_frames")]
    pub warmup_frames: u32,

    /// Capacity of the frameset delivery queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long `wait_for_frames` blocks before timing out
    #[serde(default = "default_frame_timeout_ms")]
    pub frame_timeout_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            warmup_frames: default_warmup_frames(),
            queue_capacity: default_queue_capacity(),
            frame_timeout_ms: default_frame_timeout_ms(),
        }
    }
}

fn default_warmup_frames() -> u32 {
    30
}

fn default_queue_capacity() -> usize {
    4
}

fn default_frame_timeout_ms() -> u64 {
    5000
}

/// One enabled stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Stream kind
    pub stream: StreamKind,

    /// Image width in pixels, must be > 0
    pub width: u32,

    /// Image height in pixels, must be > 0
    pub height: u32,

    /// Pixel format
    pub format: PixelFormat,

    /// Frame rate, must be > 0
    pub fps: u32,
}

impl StreamConfig {
    /// Stream mode described by this entry
    pub fn mode(&self) -> StreamMode {
        StreamMode::new(self.width, self.height, self.format, self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let json = r#"{
            "streams": [
                { "stream": "color", "width": 4, "height": 2, "format": "rgb8", "fps": 30 }
            ]
        }"#;
        let bp: CaptureBlueprint = serde_json::from_str(json).unwrap();
        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(bp.archive.freelist_capacity, 32);
        assert_eq!(bp.archive.freelist_max_age, 1000);
        assert_eq!(bp.capture.warmup_frames, 30);
    }

    #[test]
    fn test_stream_modes_from_blueprint() {
        let bp = CaptureBlueprint {
            version: ConfigVersion::V1,
            archive: ArchiveSettings::default(),
            capture: CaptureSettings::default(),
            streams: vec![StreamConfig {
                stream: StreamKind::Depth,
                width: 8,
                height: 4,
                format: PixelFormat::Z16,
                fps: 15,
            }],
        };

        let modes = bp.stream_modes();
        assert!(modes.is_enabled(StreamKind::Depth));
        assert!(!modes.is_enabled(StreamKind::Color));
        assert_eq!(modes.get(StreamKind::Depth).unwrap().frame_size(), 64);
    }
}
