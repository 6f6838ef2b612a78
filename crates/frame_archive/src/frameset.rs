use contracts::StreamKind;

use crate::frame::FrameMetadata;
use crate::frame_ref::{FrameData, FrameRef};

/// One optional frame reference per stream kind.
///
/// Cloning adds one observer to every non-null member; dropping releases
/// them.
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    frames: [FrameRef; StreamKind::COUNT],
}

impl FrameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `frame` in the slot of `stream`, releasing the previous occupant.
    pub fn place_frame(&mut self, stream: StreamKind, frame: FrameRef) {
        let previous = std::mem::replace(&mut self.frames[stream.index()], frame);
        drop(previous);
    }

    /// Move the reference out of the slot of `stream`, leaving it null.
    ///
    /// No observer count changes.
    pub fn detach_ref(&mut self, stream: StreamKind) -> FrameRef {
        std::mem::take(&mut self.frames[stream.index()])
    }

    /// Release every member
    pub fn cleanup(&mut self) {
        for frame in &mut self.frames {
            frame.reset();
        }
    }

    #[inline]
    pub fn get(&self, stream: StreamKind) -> &FrameRef {
        &self.frames[stream.index()]
    }

    pub fn contains(&self, stream: StreamKind) -> bool {
        !self.frames[stream.index()].is_null()
    }

    /// Number of non-null members
    pub fn len(&self) -> usize {
        self.frames.iter().filter(|f| !f.is_null()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(FrameRef::is_null)
    }

    /// Non-null members in stream order
    pub fn iter(&self) -> impl Iterator<Item = (StreamKind, &FrameRef)> + '_ {
        StreamKind::ALL
            .iter()
            .zip(self.frames.iter())
            .filter(|(_, frame)| !frame.is_null())
            .map(|(stream, frame)| (*stream, frame))
    }

    pub fn data(&self, stream: StreamKind) -> Option<FrameData<'_>> {
        self.get(stream).data()
    }

    pub fn metadata(&self, stream: StreamKind) -> Option<FrameMetadata> {
        self.get(stream).metadata()
    }

    pub fn timestamp(&self, stream: StreamKind) -> Option<i64> {
        self.get(stream).timestamp()
    }

    pub fn frame_number(&self, stream: StreamKind) -> Option<u64> {
        self.get(stream).frame_number()
    }

    pub fn system_time(&self, stream: StreamKind) -> Option<i64> {
        self.get(stream).system_time()
    }
}
