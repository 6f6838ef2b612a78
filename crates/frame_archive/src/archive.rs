//! The frame archive.
//!
//! [`FrameArchive`] is the producer half: it owns the per-stream
//! backbuffers, allocates and publishes frames and flushes on drop.
//! [`ArchiveHandle`] is the cloneable consumer half: it works on published
//! frames and the frameset and reference pools.
//!
//! Lock discipline: the archive mutex guards the three pools and the
//! freelist. It is never held while a pooled value is dropped, a cell's data
//! lock is taken, or a continuation runs, so a continuation or a
//! `FrameRef` drop may re-enter the archive from any thread.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ArchiveSettings, CaptureBlueprint, StreamKind, StreamMode, StreamModes};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{ArchiveError, HandleError, PoolKind, Result};
use crate::frame::{Frame, FrameContinuation, FrameMetadata};
use crate::frame_ref::{FrameCell, FrameRef, Release};
use crate::frameset::FrameSet;
use crate::freelist::Freelist;
use crate::pool::{FixedPool, Handle};
use crate::stats::{ArchiveCounters, ArchiveStats, Occupancy};
use crate::USER_QUEUE_SIZE;

static NEXT_ARCHIVE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique archive identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArchiveId(u64);

impl ArchiveId {
    fn next() -> Self {
        Self(NEXT_ARCHIVE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "archive-{}", self.0)
    }
}

/// Frame pool entry; the frame itself lives in the matching cell
#[derive(Debug)]
pub(crate) struct PublishedFrame {
    stream: StreamKind,
}

pub(crate) type FrameHandle = Handle<PublishedFrame>;

/// Handle to a frameset stored in the archive
pub type FrameSetHandle = Handle<FrameSet>;

/// Handle to a frame reference stored in the archive
pub type RefHandle = Handle<FrameRef>;

/// Called at the start of every flush, before any pool is drained.
///
/// Layers that keep frame references outside the archive pools (a
/// synchronizer's pending queues) release them here.
pub trait FlushHook: Send + Sync {
    fn on_flush(&self, archive: &ArchiveHandle);
}

struct ArchiveState {
    frames: FixedPool<PublishedFrame, USER_QUEUE_SIZE>,
    framesets: FixedPool<FrameSet, USER_QUEUE_SIZE>,
    refs: FixedPool<FrameRef, USER_QUEUE_SIZE>,
    freelist: Freelist,
}

pub(crate) struct ArchiveCore {
    id: ArchiveId,
    modes: StreamModes,
    freelist_max_age: i64,
    cells: Box<[FrameCell]>,
    state: Mutex<ArchiveState>,
    counters: ArchiveCounters,
}

impl ArchiveCore {
    fn new(modes: StreamModes, settings: &ArchiveSettings) -> Self {
        let cells: Vec<FrameCell> = (0..USER_QUEUE_SIZE).map(|_| FrameCell::new()).collect();
        Self {
            id: ArchiveId::next(),
            modes,
            freelist_max_age: settings.freelist_max_age,
            cells: cells.into_boxed_slice(),
            state: Mutex::new(ArchiveState {
                frames: FixedPool::new(),
                framesets: FixedPool::new(),
                refs: FixedPool::new(),
                freelist: Freelist::new(settings.freelist_capacity),
            }),
            counters: ArchiveCounters::default(),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> ArchiveId {
        self.id
    }

    #[inline]
    pub(crate) fn cell(&self, handle: FrameHandle) -> Option<&FrameCell> {
        self.cells.get(handle.index())
    }

    fn lock_state(&self) -> MutexGuard<'_, ArchiveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop one observer; reclaim the frame if it was the last.
    pub(crate) fn release_frame(&self, handle: FrameHandle) {
        let Some(cell) = self.cell(handle) else {
            return;
        };
        if cell.release(handle.generation()) == Release::Last
            && self.reclaim(cell, handle).is_some()
        {
            ArchiveCounters::bump(&self.counters.frames_released);
        }
    }

    /// Withdraw a frame regardless of its observers.
    fn unpublish(&self, handle: FrameHandle) -> std::result::Result<FrameMetadata, HandleError> {
        let stale = HandleError::Stale {
            index: handle.index(),
            generation: handle.generation(),
        };
        let cell = self.cell(handle).ok_or(stale)?;
        if !cell.detach(handle.generation()) {
            return Err(stale);
        }
        let metadata = self.reclaim(cell, handle).ok_or(stale)?;
        ArchiveCounters::bump(&self.counters.frames_unpublished);
        Ok(metadata)
    }

    /// Return a frame's storage to the freelist and its slot to the pool,
    /// then run its continuation.
    ///
    /// The cell is emptied before the pool slot is freed, so a concurrent
    /// publish can never install into a cell that still holds this frame.
    fn reclaim(&self, cell: &FrameCell, handle: FrameHandle) -> Option<FrameMetadata> {
        let retired = cell.take(handle.generation());

        let (metadata, continuation) = {
            let mut state = self.lock_state();
            // The observer count lets exactly one caller reach this per frame
            let freed = state.frames.deallocate(handle);
            debug_assert!(freed.is_ok(), "frame slot reclaimed twice");
            if let Err(e) = freed {
                error!(archive = %self.id, slot = handle.index(), error = %e, "Frame slot already free");
            }

            let Some(retired) = retired else {
                return None;
            };
            self.push_freelist(&mut state, retired.data, retired.metadata.timestamp);
            (retired.metadata, retired.continuation)
        };

        trace!(
            archive = %self.id,
            stream = %metadata.stream,
            frame_number = metadata.frame_number,
            "Frame reclaimed"
        );
        observability::record_frame_released(metadata.stream);

        if let Some(continuation) = continuation {
            continuation.run();
        }
        Some(metadata)
    }

    /// Retire storage of a frame that never made it into the pool.
    fn discard(&self, frame: Frame) {
        let (data, metadata, continuation) = frame.into_parts();
        if !data.is_empty() {
            let mut state = self.lock_state();
            self.push_freelist(&mut state, data, metadata.timestamp);
        }
        ArchiveCounters::bump(&self.counters.frames_dropped);
        if let Some(continuation) = continuation {
            continuation.run();
        }
    }

    fn push_freelist(&self, state: &mut ArchiveState, data: Vec<u8>, timestamp: i64) {
        if state.freelist.push(data, timestamp) {
            ArchiveCounters::bump(&self.counters.buffers_evicted);
            observability::record_buffer_discarded("capacity");
        }
        observability::record_freelist_depth(state.freelist.len());
    }

    /// Resolve a reference to a live frame of this archive.
    fn resolve(&self, frame: &FrameRef) -> std::result::Result<FrameHandle, HandleError> {
        let handle = frame.handle().ok_or(HandleError::Null)?;
        if let Some(found) = frame.archive_id() {
            if found != self.id {
                return Err(HandleError::ForeignArchive {
                    expected: self.id,
                    found,
                });
            }
        }
        if !frame.is_live() {
            return Err(HandleError::Stale {
                index: handle.index(),
                generation: handle.generation(),
            });
        }
        Ok(handle)
    }

    fn invalid_handle(&self, pool: PoolKind, source: HandleError) -> ArchiveError {
        error!(archive = %self.id, pool = %pool, error = %source, "Invalid handle");
        ArchiveCounters::bump(&self.counters.invalid_handles);
        observability::record_invalid_handle(pool.as_str());
        ArchiveError::invalid_handle(pool, source)
    }

    fn pool_exhausted(&self, pool: PoolKind, capacity: usize) -> ArchiveError {
        warn!(archive = %self.id, pool = %pool, capacity, "Pool exhausted");
        ArchiveCounters::bump(&self.counters.pool_exhausted);
        observability::record_pool_exhausted(pool.as_str());
        ArchiveError::pool_exhausted(pool, capacity)
    }

    fn stats(&self) -> ArchiveStats {
        let occupancy = {
            let state = self.lock_state();
            Occupancy {
                live_frames: state.frames.len(),
                live_framesets: state.framesets.len(),
                live_refs: state.refs.len(),
                freelist_depth: state.freelist.len(),
            }
        };
        ArchiveStats::snapshot(&self.counters, occupancy)
    }
}

/// Consumer-side view of an archive.
///
/// Cheap to clone and safe to use from any thread.
#[derive(Clone)]
pub struct ArchiveHandle {
    core: Arc<ArchiveCore>,
}

impl ArchiveHandle {
    #[inline]
    pub fn id(&self) -> ArchiveId {
        self.core.id
    }

    /// Whether frames of `stream` are produced at all
    #[inline]
    pub fn is_stream_enabled(&self, stream: StreamKind) -> bool {
        self.core.modes.is_enabled(stream)
    }

    /// Mode of `stream`, `None` when the stream is disabled
    #[inline]
    pub fn get_mode(&self, stream: StreamKind) -> Option<StreamMode> {
        self.core.modes.get(stream).copied()
    }

    pub fn modes(&self) -> &StreamModes {
        &self.core.modes
    }

    /// Withdraw a published frame even though it is still observed.
    ///
    /// Its storage returns to the freelist with contents intact and its
    /// continuation runs. Every outstanding reference, `frame` included,
    /// turns stale. Returns the withdrawn frame's metadata.
    pub fn unpublish_frame(&self, frame: &FrameRef) -> Result<FrameMetadata> {
        let handle = self
            .core
            .resolve(frame)
            .map_err(|e| self.core.invalid_handle(PoolKind::Frames, e))?;
        let metadata = self
            .core
            .unpublish(handle)
            .map_err(|e| self.core.invalid_handle(PoolKind::Frames, e))?;
        debug!(
            archive = %self.core.id,
            stream = %metadata.stream,
            frame_number = metadata.frame_number,
            "Frame unpublished"
        );
        Ok(metadata)
    }

    /// Move a frameset into the frameset pool.
    ///
    /// Every non-null member must be a live frame of this archive.
    pub fn store_frameset(&self, set: FrameSet) -> Result<FrameSetHandle> {
        for (_, frame) in set.iter() {
            self.core
                .resolve(frame)
                .map_err(|e| self.core.invalid_handle(PoolKind::Frames, e))?;
        }
        let stored = self.core.lock_state().framesets.allocate(set);
        stored.map_err(|rejected| {
            let capacity = rejected.capacity();
            drop(rejected.into_inner());
            self.core.pool_exhausted(PoolKind::FrameSets, capacity)
        })
    }

    /// Duplicate a pooled frameset; every member gains one observer.
    pub fn clone_frameset(&self, set: FrameSetHandle) -> Result<FrameSetHandle> {
        let cloned = {
            let mut state = self.core.lock_state();
            let copy = match state.framesets.get(set) {
                Ok(original) => original.clone(),
                Err(e) => {
                    drop(state);
                    return Err(self.core.invalid_handle(PoolKind::FrameSets, e));
                }
            };
            state.framesets.allocate(copy)
        };
        cloned.map_err(|rejected| {
            let capacity = rejected.capacity();
            drop(rejected.into_inner());
            self.core.pool_exhausted(PoolKind::FrameSets, capacity)
        })
    }

    /// Copy a pooled frameset out of the pool; the copy holds its own observers.
    pub fn frameset(&self, set: FrameSetHandle) -> Result<FrameSet> {
        let state = self.core.lock_state();
        match state.framesets.get(set) {
            Ok(stored) => Ok(stored.clone()),
            Err(e) => {
                drop(state);
                Err(self.core.invalid_handle(PoolKind::FrameSets, e))
            }
        }
    }

    /// Remove a pooled frameset and release its members.
    pub fn release_frameset(&self, set: FrameSetHandle) -> Result<()> {
        let removed = self.core.lock_state().framesets.deallocate(set);
        match removed {
            Ok(set) => {
                drop(set);
                Ok(())
            }
            Err(e) => Err(self.core.invalid_handle(PoolKind::FrameSets, e)),
        }
    }

    /// Move one member of a pooled frameset into the reference pool.
    ///
    /// The member's slot in the frameset becomes null; no count changes.
    pub fn detach_frame_ref(&self, set: FrameSetHandle, stream: StreamKind) -> Result<RefHandle> {
        let mut state = self.core.lock_state();
        let frame = match state.framesets.get_mut(set) {
            Ok(stored) => stored.detach_ref(stream),
            Err(e) => {
                drop(state);
                return Err(self.core.invalid_handle(PoolKind::FrameSets, e));
            }
        };
        if frame.is_null() {
            return Err(ArchiveError::EmptySlot { stream });
        }

        match state.refs.allocate(frame) {
            Ok(handle) => Ok(handle),
            Err(rejected) => {
                let capacity = rejected.capacity();
                let frame = rejected.into_inner();
                // Slot is null now, putting the reference back drops nothing
                let orphan = match state.framesets.get_mut(set) {
                    Ok(stored) => {
                        stored.place_frame(stream, frame);
                        None
                    }
                    Err(_) => Some(frame),
                };
                drop(state);
                drop(orphan);
                Err(self.core.pool_exhausted(PoolKind::FrameRefs, capacity))
            }
        }
    }

    /// Move a frame reference into the reference pool.
    pub fn store_frame_ref(&self, frame: FrameRef) -> Result<RefHandle> {
        self.core
            .resolve(&frame)
            .map_err(|e| self.core.invalid_handle(PoolKind::Frames, e))?;
        let stored = self.core.lock_state().refs.allocate(frame);
        stored.map_err(|rejected| {
            let capacity = rejected.capacity();
            drop(rejected.into_inner());
            self.core.pool_exhausted(PoolKind::FrameRefs, capacity)
        })
    }

    /// Duplicate a pooled reference; the frame gains one observer.
    pub fn clone_frame(&self, frame: RefHandle) -> Result<RefHandle> {
        let cloned = {
            let mut state = self.core.lock_state();
            let copy = match state.refs.get(frame) {
                Ok(original) => original.clone(),
                Err(e) => {
                    drop(state);
                    return Err(self.core.invalid_handle(PoolKind::FrameRefs, e));
                }
            };
            state.refs.allocate(copy)
        };
        cloned.map_err(|rejected| {
            let capacity = rejected.capacity();
            drop(rejected.into_inner());
            self.core.pool_exhausted(PoolKind::FrameRefs, capacity)
        })
    }

    /// Copy a pooled reference out of the pool.
    pub fn frame_ref(&self, frame: RefHandle) -> Result<FrameRef> {
        let state = self.core.lock_state();
        match state.refs.get(frame) {
            Ok(stored) => Ok(stored.clone()),
            Err(e) => {
                drop(state);
                Err(self.core.invalid_handle(PoolKind::FrameRefs, e))
            }
        }
    }

    /// Remove a pooled reference and release its observer.
    pub fn release_frame_ref(&self, frame: RefHandle) -> Result<()> {
        let removed = self.core.lock_state().refs.deallocate(frame);
        match removed {
            Ok(frame) => {
                drop(frame);
                Ok(())
            }
            Err(e) => Err(self.core.invalid_handle(PoolKind::FrameRefs, e)),
        }
    }

    pub fn stats(&self) -> ArchiveStats {
        self.core.stats()
    }
}

impl fmt::Debug for ArchiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveHandle")
            .field("id", &self.core.id)
            .field("modes", &self.core.modes)
            .finish()
    }
}

/// Producer half of the archive.
///
/// Owns one backbuffer per stream. Dereferences to [`ArchiveHandle`] for the
/// consumer-side operations. Dropping it flushes.
pub struct FrameArchive {
    handle: ArchiveHandle,
    backbuffers: [Frame; StreamKind::COUNT],
    flush_hook: Option<Arc<dyn FlushHook>>,
}

impl FrameArchive {
    /// Archive with default freelist settings
    pub fn new(modes: StreamModes) -> Self {
        Self::with_settings(modes, &ArchiveSettings::default())
    }

    pub fn with_settings(modes: StreamModes, settings: &ArchiveSettings) -> Self {
        let core = ArchiveCore::new(modes, settings);
        info!(
            archive = %core.id,
            enabled_streams = core.modes.enabled_count(),
            pool_capacity = USER_QUEUE_SIZE,
            freelist_capacity = settings.freelist_capacity,
            freelist_max_age = settings.freelist_max_age,
            "Frame archive created"
        );
        Self {
            handle: ArchiveHandle {
                core: Arc::new(core),
            },
            backbuffers: StreamKind::ALL.map(Frame::empty),
            flush_hook: None,
        }
    }

    pub fn from_blueprint(blueprint: &CaptureBlueprint) -> Self {
        Self::with_settings(blueprint.stream_modes(), &blueprint.archive)
    }

    /// Register a hook run at the start of every flush
    pub fn set_flush_hook(&mut self, hook: Arc<dyn FlushHook>) {
        self.flush_hook = Some(hook);
    }

    pub fn with_flush_hook(mut self, hook: Arc<dyn FlushHook>) -> Self {
        self.set_flush_hook(hook);
        self
    }

    #[inline]
    pub fn handle(&self) -> &ArchiveHandle {
        &self.handle
    }

    /// Prepare the backbuffer of `stream` and return its storage.
    ///
    /// An unpublished frame still sitting in the backbuffer is discarded.
    /// Freelist buffers last used more than `freelist_max_age` before
    /// `timestamp` are dropped first. With `requires_allocation` the storage
    /// is always fresh and zeroed; otherwise a freelist buffer of the right
    /// size is reused as-is, stale contents included.
    pub fn alloc_frame(
        &mut self,
        stream: StreamKind,
        timestamp: i64,
        frame_number: u64,
        system_time: i64,
        requires_allocation: bool,
    ) -> Result<&mut [u8]> {
        let core = &self.handle.core;
        let mode = core
            .modes
            .get(stream)
            .copied()
            .ok_or(ArchiveError::StreamDisabled { stream })?;
        let size = mode.frame_size();

        let pending = std::mem::replace(&mut self.backbuffers[stream.index()], Frame::empty(stream));
        if !pending.is_empty() || pending.has_continuation() {
            debug!(
                archive = %core.id,
                stream = %stream,
                frame_number = pending.frame_number(),
                "Discarding unpublished frame"
            );
            core.discard(pending);
        }

        let reused = {
            let mut state = core.lock_state();
            let aged = state
                .freelist
                .evict_older_than(timestamp.saturating_sub(core.freelist_max_age));
            if aged > 0 {
                ArchiveCounters::add(&core.counters.buffers_aged_out, aged);
                for _ in 0..aged {
                    observability::record_buffer_discarded("age");
                }
            }
            let reused = if requires_allocation {
                None
            } else {
                state.freelist.take_matching(size)
            };
            observability::record_freelist_depth(state.freelist.len());
            reused
        };

        let data = match reused {
            Some(buffer) => {
                ArchiveCounters::bump(&core.counters.buffers_reused);
                observability::record_buffer_acquired(stream, true);
                buffer
            }
            None => {
                ArchiveCounters::bump(&core.counters.buffers_allocated);
                observability::record_buffer_acquired(stream, false);
                vec![0u8; size]
            }
        };

        let metadata = FrameMetadata::new(stream, timestamp, frame_number, system_time);
        let backbuffer = &mut self.backbuffers[stream.index()];
        *backbuffer = Frame::owned(metadata, data, core.id);
        Ok(backbuffer.data_mut())
    }

    /// Attach an action to run once the pending frame of `stream` is given back.
    pub fn attach_continuation(
        &mut self,
        stream: StreamKind,
        continuation: FrameContinuation,
    ) -> Result<()> {
        if !self.handle.is_stream_enabled(stream) {
            return Err(ArchiveError::StreamDisabled { stream });
        }
        let backbuffer = &mut self.backbuffers[stream.index()];
        if backbuffer.is_empty() {
            return Err(ArchiveError::EmptyBackbuffer { stream });
        }
        backbuffer.set_continuation(continuation);
        Ok(())
    }

    /// Pending frame of `stream`; empty when nothing was allocated
    pub fn backbuffer(&self, stream: StreamKind) -> &Frame {
        &self.backbuffers[stream.index()]
    }

    /// Publish the pending frame of `stream` and return its first reference.
    ///
    /// The backbuffer is left empty whether or not publication succeeds.
    pub fn track_frame(&mut self, stream: StreamKind) -> Result<FrameRef> {
        if !self.handle.is_stream_enabled(stream) {
            return Err(ArchiveError::StreamDisabled { stream });
        }
        if self.backbuffers[stream.index()].is_empty() {
            return Err(ArchiveError::EmptyBackbuffer { stream });
        }
        let frame = std::mem::replace(&mut self.backbuffers[stream.index()], Frame::empty(stream));
        self.publish_frame(frame)
    }

    /// Move a frame into the frame pool.
    ///
    /// The returned reference is the frame's only observer. On failure the
    /// frame is discarded: its storage goes to the freelist and its
    /// continuation runs.
    pub fn publish_frame(&mut self, frame: Frame) -> Result<FrameRef> {
        let core = &self.handle.core;
        let stream = frame.stream();

        if let Some(owner) = frame.owner() {
            if owner != core.id {
                let (_, _, continuation) = frame.into_parts();
                if let Some(continuation) = continuation {
                    continuation.run();
                }
                return Err(core.invalid_handle(
                    PoolKind::Frames,
                    HandleError::ForeignArchive {
                        expected: core.id,
                        found: owner,
                    },
                ));
            }
        }
        if !core.modes.is_enabled(stream) {
            core.discard(frame);
            return Err(ArchiveError::StreamDisabled { stream });
        }

        let allocated = core.lock_state().frames.allocate(PublishedFrame { stream });
        let handle = match allocated {
            Ok(handle) => handle,
            Err(rejected) => {
                let capacity = rejected.capacity();
                core.discard(frame);
                return Err(core.pool_exhausted(PoolKind::Frames, capacity));
            }
        };

        // Pool keys stay below USER_QUEUE_SIZE, the cell count
        let (data, metadata, continuation) = frame.into_parts();
        core.cells[handle.index()].install(handle.generation(), data, metadata, continuation);

        ArchiveCounters::bump(&core.counters.frames_published);
        observability::record_frame_published(stream);
        trace!(
            archive = %core.id,
            stream = %stream,
            frame_number = metadata.frame_number,
            slot = handle.index(),
            "Frame published"
        );

        Ok(FrameRef::adopt(Arc::clone(core), handle))
    }

    /// Release everything the archive holds.
    ///
    /// Runs the flush hook, releases every pooled frameset and reference,
    /// withdraws every frame still published, discards pending backbuffers
    /// and empties the freelist. References held elsewhere turn stale.
    #[instrument(skip_all, fields(archive = %self.handle.core.id))]
    pub fn flush(&mut self) {
        if let Some(hook) = self.flush_hook.clone() {
            hook.on_flush(&self.handle);
        }

        let core = &self.handle.core;
        let (framesets, refs) = {
            let mut state = core.lock_state();
            (state.framesets.drain(), state.refs.drain())
        };
        let released_framesets = framesets.len();
        let released_refs = refs.len();
        drop(framesets);
        drop(refs);

        // Whatever is still published is observed outside the archive
        let published: Vec<(FrameHandle, StreamKind)> = core
            .lock_state()
            .frames
            .iter()
            .map(|(handle, entry)| (handle, entry.stream))
            .collect();
        let mut unpublished = 0;
        for (handle, stream) in published {
            if core.unpublish(handle).is_ok() {
                debug!(stream = %stream, slot = handle.index(), "Withdrew observed frame");
                unpublished += 1;
            }
        }

        let mut pending = 0;
        for backbuffer in &mut self.backbuffers {
            let stream = backbuffer.stream();
            let frame = std::mem::replace(backbuffer, Frame::empty(stream));
            if !frame.is_empty() || frame.has_continuation() {
                pending += 1;
                let (_, _, continuation) = frame.into_parts();
                if let Some(continuation) = continuation {
                    continuation.run();
                }
            }
        }

        let discarded = core.lock_state().freelist.clear();
        observability::record_freelist_depth(0);

        info!(
            released_framesets,
            released_refs, unpublished, pending, discarded, "Archive flushed"
        );
    }
}

impl Deref for FrameArchive {
    type Target = ArchiveHandle;

    fn deref(&self) -> &ArchiveHandle {
        &self.handle
    }
}

impl Drop for FrameArchive {
    fn drop(&mut self) {
        self.flush();
    }
}

impl fmt::Debug for FrameArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameArchive")
            .field("id", &self.handle.core.id)
            .field("backbuffers", &self.backbuffers)
            .field("has_flush_hook", &self.flush_hook.is_some())
            .finish()
    }
}
