//! # Frame Archive
//!
//! Reference-counted frame buffers for a multi-stream camera pipeline.
//!
//! Responsibilities:
//! - Per-stream backbuffers filled by the producer
//! - Publication into a bounded frame pool with lock-free observer counts
//! - Framesets (one frame per stream) and detached references in bounded pools
//! - Buffer recycling through an age-limited freelist
//! - Continuations run exactly once when a frame's storage is given back
//!
//! ## Example
//!
//! ```ignore
//! use frame_archive::{FrameArchive, FrameSet, StreamKind};
//!
//! let mut archive = FrameArchive::from_blueprint(&blueprint);
//!
//! // Producer: fill the backbuffer and publish it
//! let data = archive.alloc_frame(StreamKind::Color, ts, n, now, false)?;
//! data.copy_from_slice(&pixels);
//! let color = archive.track_frame(StreamKind::Color)?;
//!
//! // Consumer: group frames and keep them alive as long as needed
//! let mut set = FrameSet::new();
//! set.place_frame(StreamKind::Color, color);
//! let stored = archive.store_frameset(set)?;
//! ```

mod archive;
mod error;
mod frame;
mod frame_ref;
mod frameset;
mod freelist;
mod pool;
mod stats;

/// Capacity of each archive pool (frames, framesets, detached references)
pub const USER_QUEUE_SIZE: usize = 64;

pub use archive::{
    ArchiveHandle, ArchiveId, FlushHook, FrameArchive, FrameSetHandle, RefHandle,
};
pub use error::{ArchiveError, HandleError, PoolKind, Result};
pub use frame::{Frame, FrameContinuation, FrameMetadata};
pub use frame_ref::{FrameData, FrameRef};
pub use frameset::FrameSet;
pub use pool::{FixedPool, Handle, PoolExhausted, PoolId};
pub use stats::ArchiveStats;

// Re-export contracts types
pub use contracts::{ArchiveSettings, PixelFormat, StreamKind, StreamMode, StreamModes};
