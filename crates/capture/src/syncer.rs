//! Frameset assembly
//!
//! Collects the newest frame of every enabled stream and emits a frameset
//! once all of them are present. A stream that delivers again before the
//! set is complete replaces its older frame.

use std::sync::{Mutex, PoisonError};

use contracts::{StreamKind, StreamModes};
use frame_archive::{ArchiveHandle, FlushHook, FrameRef, FrameSet};
use tracing::trace;

pub struct FrameSyncer {
    required: Vec<StreamKind>,
    pending: Mutex<FrameSet>,
}

impl FrameSyncer {
    pub fn new(modes: &StreamModes) -> Self {
        Self {
            required: modes.enabled().map(|(stream, _)| stream).collect(),
            pending: Mutex::new(FrameSet::new()),
        }
    }

    /// Add a published frame; returns the frameset it completes, if any.
    ///
    /// Null and stale references are ignored.
    pub fn push(&self, frame: FrameRef) -> Option<FrameSet> {
        let stream = frame.stream()?;
        if !self.required.contains(&stream) {
            return None;
        }

        let (replaced, complete) = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            let replaced = pending.detach_ref(stream);
            pending.place_frame(stream, frame);

            let complete = self.required.iter().all(|s| pending.contains(*s));
            let emitted = complete.then(|| std::mem::take(&mut *pending));
            (replaced, emitted)
        };

        if !replaced.is_null() {
            trace!(stream = %stream, "newer frame replaced pending frame");
        }
        drop(replaced);
        complete
    }

    /// Release every pending frame
    pub fn clear(&self) {
        let pending = std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner));
        drop(pending);
    }

    /// Number of streams waiting for their partners
    pub fn pending_len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl FlushHook for FrameSyncer {
    fn on_flush(&self, _archive: &ArchiveHandle) {
        self.clear();
    }
}
