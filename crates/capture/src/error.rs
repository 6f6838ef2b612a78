//! Capture error types

use frame_archive::ArchiveError;
use thiserror::Error;

/// Capture error
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Archive rejected an operation
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// No frameset arrived in time
    #[error("no frameset within {waited_ms} ms")]
    Timeout {
        /// How long the caller waited
        waited_ms: u64,
    },

    /// Device stopped and every queued frameset was consumed
    #[error("frameset channel closed")]
    ChannelClosed,

    /// Session already streaming
    #[error("device {device} is already streaming")]
    AlreadyStreaming {
        /// Device name
        device: String,
    },
}

/// Capture Result type alias
pub type Result<T> = std::result::Result<T, CaptureError>;
