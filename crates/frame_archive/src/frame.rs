//! Producer-side frame values.

use std::fmt;

use contracts::StreamKind;

use crate::archive::{ArchiveId, FrameArchive};
use crate::error::Result;
use crate::frame_ref::FrameRef;

/// Capture metadata carried by every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetadata {
    pub stream: StreamKind,

    /// Device clock, milliseconds
    pub timestamp: i64,

    /// Device frame counter
    pub frame_number: u64,

    /// Host wall clock at arrival, milliseconds
    pub system_time: i64,
}

impl FrameMetadata {
    pub fn new(stream: StreamKind, timestamp: i64, frame_number: u64, system_time: i64) -> Self {
        Self {
            stream,
            timestamp,
            frame_number,
            system_time,
        }
    }

    /// Metadata of a frame that has not been captured yet
    pub fn empty(stream: StreamKind) -> Self {
        Self::new(stream, 0, 0, 0)
    }
}

/// Action run exactly once when a frame's storage is given back.
///
/// Lets the producer return a device-owned buffer (a DMA slot, a driver
/// ring entry) at the moment no consumer can observe it anymore.
pub struct FrameContinuation(Box<dyn FnOnce() + Send + 'static>);

impl FrameContinuation {
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(action))
    }

    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for FrameContinuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FrameContinuation")
    }
}

/// A frame that has not been published yet.
///
/// Owned and mutated by the producer only. Publishing moves it into the
/// archive and yields the first [`FrameRef`].
#[derive(Debug)]
pub struct Frame {
    data: Vec<u8>,
    metadata: FrameMetadata,
    owner: Option<ArchiveId>,
    continuation: Option<FrameContinuation>,
}

impl Frame {
    /// Frame built outside an archive, e.g. a synthetic or decoded image
    pub fn new(metadata: FrameMetadata, data: Vec<u8>) -> Self {
        Self {
            data,
            metadata,
            owner: None,
            continuation: None,
        }
    }

    /// Frame with no storage
    pub fn empty(stream: StreamKind) -> Self {
        Self::new(FrameMetadata::empty(stream), Vec::new())
    }

    pub(crate) fn owned(metadata: FrameMetadata, data: Vec<u8>, owner: ArchiveId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::new(metadata, data)
        }
    }

    pub fn with_continuation(mut self, continuation: FrameContinuation) -> Self {
        self.continuation = Some(continuation);
        self
    }

    /// Replace the continuation. A previous continuation is dropped unrun.
    pub fn set_continuation(&mut self, continuation: FrameContinuation) {
        self.continuation = Some(continuation);
    }

    /// True when the frame holds no storage
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    pub fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    #[inline]
    pub fn stream(&self) -> StreamKind {
        self.metadata.stream
    }

    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.metadata.timestamp
    }

    #[inline]
    pub fn frame_number(&self) -> u64 {
        self.metadata.frame_number
    }

    #[inline]
    pub fn system_time(&self) -> i64 {
        self.metadata.system_time
    }

    /// Archive whose backbuffer produced this frame, if any
    pub fn owner(&self) -> Option<ArchiveId> {
        self.owner
    }

    pub fn has_continuation(&self) -> bool {
        self.continuation.is_some()
    }

    /// Move the frame into the archive.
    ///
    /// See [`FrameArchive::publish_frame`].
    pub fn publish(self, archive: &mut FrameArchive) -> Result<FrameRef> {
        archive.publish_frame(self)
    }

    pub(crate) fn into_parts(self) -> (Vec<u8>, FrameMetadata, Option<FrameContinuation>) {
        (self.data, self.metadata, self.continuation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_empty_frame() {
        let frame = Frame::empty(StreamKind::Depth);
        assert!(frame.is_empty());
        assert_eq!(frame.stream(), StreamKind::Depth);
        assert_eq!(frame.owner(), None);
        assert!(!frame.has_continuation());
    }

    #[test]
    fn test_continuation_runs_once_via_parts() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let frame = Frame::new(FrameMetadata::new(StreamKind::Color, 10, 1, 20), vec![1, 2, 3])
            .with_continuation(FrameContinuation::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        assert_eq!(frame.timestamp(), 10);
        assert_eq!(frame.frame_number(), 1);
        assert_eq!(frame.system_time(), 20);

        let (data, _, continuation) = frame.into_parts();
        assert_eq!(data, vec![1, 2, 3]);
        continuation.unwrap().run();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
