//! Stream kinds and per-stream modes.
//!
//! A stream kind doubles as an index into every per-stream table of the
//! archive, so the set is closed and its cardinality is a compile-time constant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Native stream kinds produced by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Depth,
    Color,
    Infrared,
    Infrared2,
}

impl StreamKind {
    /// Number of native streams.
    pub const COUNT: usize = 4;

    /// All stream kinds in index order.
    pub const ALL: [StreamKind; Self::COUNT] = [
        StreamKind::Depth,
        StreamKind::Color,
        StreamKind::Infrared,
        StreamKind::Infrared2,
    ];

    /// Table index of this stream.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stream for a table index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Lowercase name, matching the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            StreamKind::Depth => "depth",
            StreamKind::Color => "color",
            StreamKind::Infrared => "infrared",
            StreamKind::Infrared2 => "infrared2",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel layout of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Z16,
    Disparity16,
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
    Yuyv,
    Y8,
    Y16,
}

impl PixelFormat {
    /// Bytes per pixel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Y8 => 1,
            PixelFormat::Z16
            | PixelFormat::Disparity16
            | PixelFormat::Yuyv
            | PixelFormat::Y16 => 2,
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }
}

/// Selected mode of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMode {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Pixel format
    pub format: PixelFormat,

    /// Nominal frame rate
    pub fps: u32,
}

impl StreamMode {
    /// Create a new stream mode
    pub fn new(width: u32, height: u32, format: PixelFormat, fps: u32) -> Self {
        Self {
            width,
            height,
            format,
            fps,
        }
    }

    /// Size in bytes of one frame in this mode.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Per-stream mode table. A stream without a mode is disabled.
///
/// Built once before the archive is constructed and never mutated afterwards,
/// which is what lets any thread read it without locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamModes {
    modes: [Option<StreamMode>; StreamKind::COUNT],
}

impl StreamModes {
    /// Empty table, every stream disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style enable.
    pub fn with(mut self, stream: StreamKind, mode: StreamMode) -> Self {
        self.set(stream, mode);
        self
    }

    /// Enable a stream with the given mode, replacing any previous mode.
    pub fn set(&mut self, stream: StreamKind, mode: StreamMode) {
        self.modes[stream.index()] = Some(mode);
    }

    /// Mode of a stream, if enabled.
    #[inline]
    pub fn get(&self, stream: StreamKind) -> Option<&StreamMode> {
        self.modes[stream.index()].as_ref()
    }

    #[inline]
    pub fn is_enabled(&self, stream: StreamKind) -> bool {
        self.modes[stream.index()].is_some()
    }

    /// Enabled streams in index order.
    pub fn enabled(&self) -> impl Iterator<Item = (StreamKind, &StreamMode)> + '_ {
        StreamKind::ALL
            .iter()
            .zip(self.modes.iter())
            .filter_map(|(stream, mode)| mode.as_ref().map(|m| (*stream, m)))
    }

    /// Number of enabled streams.
    pub fn enabled_count(&self) -> usize {
        self.modes.iter().filter(|m| m.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_index_round_trip() {
        for stream in StreamKind::ALL {
            assert_eq!(StreamKind::from_index(stream.index()), Some(stream));
        }
        assert_eq!(StreamKind::from_index(StreamKind::COUNT), None);
    }

    #[test]
    fn test_stream_serde_name() {
        let json = serde_json::to_string(&StreamKind::Infrared2).unwrap();
        assert_eq!(json, "\"infrared2\"");
        assert_eq!(StreamKind::Infrared2.to_string(), "infrared2");
    }

    #[test]
    fn test_frame_size() {
        let mode = StreamMode::new(640, 480, PixelFormat::Rgb8, 30);
        assert_eq!(mode.frame_size(), 640 * 480 * 3);

        let depth = StreamMode::new(640, 480, PixelFormat::Z16, 30);
        assert_eq!(depth.frame_size(), 640 * 480 * 2);
    }

    #[test]
    fn test_stream_modes_enabled() {
        let modes = StreamModes::new()
            .with(
                StreamKind::Color,
                StreamMode::new(4, 2, PixelFormat::Rgb8, 30),
            )
            .with(StreamKind::Infrared, StreamMode::new(4, 2, PixelFormat::Y8, 30));

        assert!(modes.is_enabled(StreamKind::Color));
        assert!(!modes.is_enabled(StreamKind::Depth));
        assert_eq!(modes.enabled_count(), 2);

        let enabled: Vec<_> = modes.enabled().map(|(s, _)| s).collect();
        assert_eq!(enabled, vec![StreamKind::Color, StreamKind::Infrared]);
    }
}
