//! Shared references to published frames.
//!
//! A published frame lives in a [`FrameCell`] whose state word packs the
//! frame-pool generation (high half) with the observer count (low half).
//! Counting is lock-free; the archive lock is only taken once, when the
//! last observer goes away and the frame's storage is reclaimed.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use contracts::StreamKind;

use crate::archive::{ArchiveCore, ArchiveId, FrameHandle};
use crate::frame::{FrameContinuation, FrameMetadata};

#[inline]
fn pack(generation: u32, observers: u32) -> u64 {
    (u64::from(generation) << 32) | u64::from(observers)
}

#[inline]
fn generation_of(state: u64) -> u32 {
    (state >> 32) as u32
}

#[inline]
fn observers_of(state: u64) -> u32 {
    state as u32
}

/// Outcome of dropping one observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Release {
    /// Other observers remain
    Live,
    /// This was the last observer; the caller must reclaim the frame
    Last,
    /// The frame was already reclaimed or replaced
    Stale,
}

pub(crate) struct FrameSlot {
    generation: u32,
    data: Vec<u8>,
    metadata: FrameMetadata,
}

/// Storage taken out of a cell on reclaim
pub(crate) struct RetiredFrame {
    pub(crate) data: Vec<u8>,
    pub(crate) metadata: FrameMetadata,
    pub(crate) continuation: Option<FrameContinuation>,
}

/// Per-slot storage of the frame pool.
///
/// `install` and `take` only run while the matching pool slot is reserved,
/// so a cell never holds two generations at once.
pub(crate) struct FrameCell {
    state: AtomicU64,
    slot: RwLock<Option<FrameSlot>>,
    continuation: Mutex<Option<FrameContinuation>>,
}

impl FrameCell {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU64::new(pack(0, 0)),
            slot: RwLock::new(None),
            continuation: Mutex::new(None),
        }
    }

    /// Place a freshly published frame with one observer.
    pub(crate) fn install(
        &self,
        generation: u32,
        data: Vec<u8>,
        metadata: FrameMetadata,
        continuation: Option<FrameContinuation>,
    ) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(FrameSlot {
            generation,
            data,
            metadata,
        });
        *self
            .continuation
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = continuation;
        self.state.store(pack(generation, 1), Ordering::Release);
    }

    /// Add an observer if the frame is still live at `generation`.
    pub(crate) fn acquire(&self, generation: u32) -> bool {
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            let observers = observers_of(current);
            if generation_of(current) != generation || observers == 0 || observers == u32::MAX {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn release(&self, generation: u32) -> Release {
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            if generation_of(current) != generation || observers_of(current) == 0 {
                return Release::Stale;
            }
            match self.state.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) if observers_of(current) == 1 => {
                    fence(Ordering::Acquire);
                    return Release::Last;
                }
                Ok(_) => return Release::Live,
                Err(actual) => current = actual,
            }
        }
    }

    /// Drop every observer at once. Outstanding references turn stale.
    ///
    /// Fails if the frame is not live, including when its last observer is
    /// already reclaiming it.
    pub(crate) fn detach(&self, generation: u32) -> bool {
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            if generation_of(current) != generation || observers_of(current) == 0 {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                pack(generation, 0),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn observers(&self, generation: u32) -> u32 {
        let state = self.state.load(Ordering::Acquire);
        if generation_of(state) == generation {
            observers_of(state)
        } else {
            0
        }
    }

    /// Remove the frame's storage. Waits for readers of `data()` to finish.
    pub(crate) fn take(&self, generation: u32) -> Option<RetiredFrame> {
        let slot = {
            let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
            let current = guard
                .as_ref()
                .is_some_and(|slot| slot.generation == generation);
            if current {
                guard.take()
            } else {
                None
            }
        }?;
        let continuation = self
            .continuation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Some(RetiredFrame {
            data: slot.data,
            metadata: slot.metadata,
            continuation,
        })
    }

    fn read(&self, generation: u32) -> Option<RwLockReadGuard<'_, Option<FrameSlot>>> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        let current = guard
            .as_ref()
            .is_some_and(|slot| slot.generation == generation);
        current.then_some(guard)
    }
}

/// Borrowed pixel data of a published frame.
///
/// Holding it blocks reclaim of that one frame, so keep it short-lived and
/// never hold it across a call that unpublishes or flushes the same frame.
pub struct FrameData<'a> {
    guard: RwLockReadGuard<'a, Option<FrameSlot>>,
}

impl FrameData<'_> {
    pub fn metadata(&self) -> Option<&FrameMetadata> {
        self.guard.as_ref().map(|slot| &slot.metadata)
    }
}

impl Deref for FrameData<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.guard
            .as_ref()
            .map(|slot| slot.data.as_slice())
            .unwrap_or_default()
    }
}

impl fmt::Debug for FrameData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameData")
            .field("len", &self.len())
            .finish()
    }
}

struct Target {
    core: Arc<ArchiveCore>,
    handle: FrameHandle,
}

/// Counted reference to a published frame, or null.
///
/// Cloning adds an observer, dropping removes one. The frame's storage goes
/// back to the archive when its last observer drops. A reference whose frame
/// was unpublished or flushed reads as empty and its drop is a no-op.
#[derive(Default)]
pub struct FrameRef {
    target: Option<Target>,
}

impl FrameRef {
    /// Reference that points to nothing
    pub const fn null() -> Self {
        Self { target: None }
    }

    /// Wrap the observer created by publication
    pub(crate) fn adopt(core: Arc<ArchiveCore>, handle: FrameHandle) -> Self {
        Self {
            target: Some(Target { core, handle }),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.target.is_none()
    }

    /// True while the referenced frame is still published
    pub fn is_live(&self) -> bool {
        self.observers() > 0
    }

    /// Current observer count of the referenced frame, 0 for null or stale
    pub fn observers(&self) -> u32 {
        self.cell()
            .map_or(0, |(cell, generation)| cell.observers(generation))
    }

    /// Pixel data, `None` for null or stale references
    pub fn data(&self) -> Option<FrameData<'_>> {
        let (cell, generation) = self.cell()?;
        cell.read(generation).map(|guard| FrameData { guard })
    }

    pub fn metadata(&self) -> Option<FrameMetadata> {
        let (cell, generation) = self.cell()?;
        let guard = cell.read(generation)?;
        guard.as_ref().map(|slot| slot.metadata)
    }

    pub fn stream(&self) -> Option<StreamKind> {
        self.metadata().map(|m| m.stream)
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.metadata().map(|m| m.timestamp)
    }

    pub fn frame_number(&self) -> Option<u64> {
        self.metadata().map(|m| m.frame_number)
    }

    pub fn system_time(&self) -> Option<i64> {
        self.metadata().map(|m| m.system_time)
    }

    /// Archive that published the frame
    pub fn archive_id(&self) -> Option<ArchiveId> {
        self.target.as_ref().map(|t| t.core.id())
    }

    /// Release this observer now, leaving a null reference
    pub fn reset(&mut self) {
        *self = Self::null();
    }

    pub(crate) fn handle(&self) -> Option<FrameHandle> {
        self.target.as_ref().map(|t| t.handle)
    }

    fn cell(&self) -> Option<(&FrameCell, u32)> {
        let target = self.target.as_ref()?;
        let cell = target.core.cell(target.handle)?;
        Some((cell, target.handle.generation()))
    }
}

impl Clone for FrameRef {
    fn clone(&self) -> Self {
        let Some(target) = &self.target else {
            return Self::null();
        };
        match target.core.cell(target.handle) {
            Some(cell) if cell.acquire(target.handle.generation()) => Self {
                target: Some(Target {
                    core: Arc::clone(&target.core),
                    handle: target.handle,
                }),
            },
            _ => Self::null(),
        }
    }
}

impl Drop for FrameRef {
    fn drop(&mut self) {
        if let Some(Target { core, handle }) = self.target.take() {
            core.release_frame(handle);
        }
    }
}

impl fmt::Debug for FrameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            None => f.write_str("FrameRef(null)"),
            Some(target) => f
                .debug_struct("FrameRef")
                .field("archive", &target.core.id())
                .field("slot", &target.handle.index())
                .field("generation", &target.handle.generation())
                .field("observers", &self.observers())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> FrameMetadata {
        FrameMetadata::new(StreamKind::Color, 1, 1, 1)
    }

    #[test]
    fn test_cell_counting() {
        let cell = FrameCell::new();
        assert!(!cell.acquire(0));

        cell.install(3, vec![1, 2], metadata(), None);
        assert_eq!(cell.observers(3), 1);
        assert!(cell.acquire(3));
        assert!(!cell.acquire(2));
        assert_eq!(cell.observers(3), 2);

        assert_eq!(cell.release(3), Release::Live);
        assert_eq!(cell.release(3), Release::Last);
        assert_eq!(cell.release(3), Release::Stale);
        assert!(!cell.acquire(3));
    }

    #[test]
    fn test_cell_detach_makes_observers_stale() {
        let cell = FrameCell::new();
        cell.install(0, vec![7], metadata(), None);
        assert!(cell.acquire(0));

        assert!(cell.detach(0));
        assert!(!cell.detach(0));
        assert_eq!(cell.release(0), Release::Stale);

        let retired = cell.take(0).unwrap();
        assert_eq!(retired.data, vec![7]);
        assert!(cell.take(0).is_none());
    }

    #[test]
    fn test_cell_take_checks_generation() {
        let cell = FrameCell::new();
        cell.install(5, vec![1], metadata(), None);
        assert!(cell.take(4).is_none());
        assert!(cell.read(4).is_none());
        assert!(cell.read(5).is_some());
        assert!(cell.take(5).is_some());
    }

    #[test]
    fn test_null_ref() {
        let null = FrameRef::null();
        assert!(null.is_null());
        assert!(!null.is_live());
        assert_eq!(null.observers(), 0);
        assert!(null.data().is_none());
        assert!(null.clone().is_null());
        assert!(FrameRef::default().is_null());
    }
}
