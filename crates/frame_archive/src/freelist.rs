//! Retired buffer storage.
//!
//! A bounded FIFO of buffers whose frames have been released or discarded.
//! Oldest entries sit at the head, so eviction on overflow drops the buffer
//! least likely to be reused.

use ringbuf::{traits::*, HeapRb};

struct RetiredBuffer {
    data: Vec<u8>,

    /// Device timestamp of the frame that last used the buffer
    timestamp: i64,
}

pub(crate) struct Freelist {
    buffers: HeapRb<RetiredBuffer>,
}

impl Freelist {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buffers: HeapRb::new(capacity.max(1)),
        }
    }

    /// Store a buffer for reuse.
    ///
    /// Returns true if the oldest buffer was evicted to make room.
    pub(crate) fn push(&mut self, data: Vec<u8>, timestamp: i64) -> bool {
        let mut evicted = false;
        if self.buffers.is_full() {
            evicted = self.buffers.try_pop().is_some();
        }
        if self.buffers.try_push(RetiredBuffer { data, timestamp }).is_err() {
            return true;
        }
        evicted
    }

    /// Remove and return the oldest buffer of exactly `size` bytes.
    pub(crate) fn take_matching(&mut self, size: usize) -> Option<Vec<u8>> {
        let mut found = None;
        // Rotate once through the ring; order of the remaining entries is kept
        for _ in 0..self.buffers.occupied_len() {
            let Some(buffer) = self.buffers.try_pop() else {
                break;
            };
            if found.is_none() && buffer.data.len() == size {
                found = Some(buffer.data);
            } else {
                let _ = self.buffers.try_push(buffer);
            }
        }
        found
    }

    /// Drop buffers last used before `cutoff`. Returns how many were dropped.
    pub(crate) fn evict_older_than(&mut self, cutoff: i64) -> usize {
        let mut evicted = 0;
        for _ in 0..self.buffers.occupied_len() {
            let Some(buffer) = self.buffers.try_pop() else {
                break;
            };
            if buffer.timestamp < cutoff {
                evicted += 1;
            } else {
                let _ = self.buffers.try_push(buffer);
            }
        }
        evicted
    }

    /// Drop every buffer. Returns how many were dropped.
    pub(crate) fn clear(&mut self) -> usize {
        self.buffers.pop_iter().count()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.buffers.occupied_len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
