use std::fmt;

use contracts::StreamKind;
use thiserror::Error;

use crate::archive::ArchiveId;
use crate::pool::PoolId;

/// Pools owned by an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Frames,
    FrameSets,
    FrameRefs,
}

impl PoolKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            PoolKind::Frames => "frames",
            PoolKind::FrameSets => "framesets",
            PoolKind::FrameRefs => "frame_refs",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a handle or reference was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("handle issued by pool {found}, expected pool {expected}")]
    ForeignPool { expected: PoolId, found: PoolId },

    #[error("slot {index} is free or was reused (handle generation {generation})")]
    Stale { index: usize, generation: u32 },

    #[error("reference belongs to archive {found}, expected archive {expected}")]
    ForeignArchive { expected: ArchiveId, found: ArchiveId },

    #[error("null frame reference")]
    Null,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("{pool} pool exhausted: all {capacity} slots in use")]
    PoolExhausted { pool: PoolKind, capacity: usize },

    #[error("invalid {pool} handle: {source}")]
    InvalidHandle {
        pool: PoolKind,
        #[source]
        source: HandleError,
    },

    #[error("stream {stream} is not enabled")]
    StreamDisabled { stream: StreamKind },

    #[error("no pending frame in the {stream} backbuffer")]
    EmptyBackbuffer { stream: StreamKind },

    #[error("frameset has no frame for stream {stream}")]
    EmptySlot { stream: StreamKind },
}

impl ArchiveError {
    pub fn pool_exhausted(pool: PoolKind, capacity: usize) -> Self {
        Self::PoolExhausted { pool, capacity }
    }

    pub fn invalid_handle(pool: PoolKind, source: HandleError) -> Self {
        Self::InvalidHandle { pool, source }
    }

    pub fn is_pool_exhausted(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
