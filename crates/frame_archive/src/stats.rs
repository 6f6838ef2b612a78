//! Archive counters and their point-in-time snapshot.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters, updated without holding the archive lock
#[derive(Debug, Default)]
pub(crate) struct ArchiveCounters {
    pub(crate) frames_published: AtomicU64,
    pub(crate) frames_released: AtomicU64,
    pub(crate) frames_unpublished: AtomicU64,
    pub(crate) frames_dropped: AtomicU64,
    pub(crate) buffers_allocated: AtomicU64,
    pub(crate) buffers_reused: AtomicU64,
    pub(crate) buffers_aged_out: AtomicU64,
    pub(crate) buffers_evicted: AtomicU64,
    pub(crate) pool_exhausted: AtomicU64,
    pub(crate) invalid_handles: AtomicU64,
}

impl ArchiveCounters {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
}

/// Occupancy gauges, read under the archive lock
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Occupancy {
    pub(crate) live_frames: usize,
    pub(crate) live_framesets: usize,
    pub(crate) live_refs: usize,
    pub(crate) freelist_depth: usize,
}

/// Archive statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    /// Frames currently published
    pub live_frames: usize,

    /// Framesets held in the frameset pool
    pub live_framesets: usize,

    /// References held in the detached reference pool
    pub live_refs: usize,

    /// Buffers waiting for reuse
    pub freelist_depth: usize,

    pub frames_published: u64,

    /// Frames reclaimed after their last observer dropped
    pub frames_released: u64,

    /// Frames forcibly withdrawn by unpublish or flush
    pub frames_unpublished: u64,

    /// Frames discarded before publication
    pub frames_dropped: u64,

    pub buffers_allocated: u64,
    pub buffers_reused: u64,

    /// Freelist buffers discarded for age
    pub buffers_aged_out: u64,

    /// Freelist buffers discarded for capacity
    pub buffers_evicted: u64,

    pub pool_exhausted: u64,
    pub invalid_handles: u64,
}

impl ArchiveStats {
    pub(crate) fn snapshot(counters: &ArchiveCounters, occupancy: Occupancy) -> Self {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        Self {
            live_frames: occupancy.live_frames,
            live_framesets: occupancy.live_framesets,
            live_refs: occupancy.live_refs,
            freelist_depth: occupancy.freelist_depth,
            frames_published: load(&counters.frames_published),
            frames_released: load(&counters.frames_released),
            frames_unpublished: load(&counters.frames_unpublished),
            frames_dropped: load(&counters.frames_dropped),
            buffers_allocated: load(&counters.buffers_allocated),
            buffers_reused: load(&counters.buffers_reused),
            buffers_aged_out: load(&counters.buffers_aged_out),
            buffers_evicted: load(&counters.buffers_evicted),
            pool_exhausted: load(&counters.pool_exhausted),
            invalid_handles: load(&counters.invalid_handles),
        }
    }

    /// Share of backbuffer allocations served from the freelist, in percent
    pub fn reuse_rate(&self) -> f64 {
        let total = self.buffers_allocated + self.buffers_reused;
        if total == 0 {
            0.0
        } else {
            self.buffers_reused as f64 / total as f64 * 100.0
        }
    }
}

impl fmt::Display for ArchiveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Archive Stats ===")?;
        writeln!(
            f,
            "Live: frames={}, framesets={}, refs={}, freelist={}",
            self.live_frames, self.live_framesets, self.live_refs, self.freelist_depth
        )?;
        writeln!(
            f,
            "Frames: published={}, released={}, unpublished={}, dropped={}",
            self.frames_published,
            self.frames_released,
            self.frames_unpublished,
            self.frames_dropped
        )?;
        writeln!(
            f,
            "Buffers: allocated={}, reused={} ({:.2}%), aged_out={}, evicted={}",
            self.buffers_allocated,
            self.buffers_reused,
            self.reuse_rate(),
            self.buffers_aged_out,
            self.buffers_evicted
        )?;
        writeln!(
            f,
            "Errors: pool_exhausted={}, invalid_handles={}",
            self.pool_exhausted, self.invalid_handles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_reuse_rate() {
        let counters = ArchiveCounters::default();
        ArchiveCounters::add(&counters.buffers_allocated, 1);
        ArchiveCounters::add(&counters.buffers_reused, 3);
        ArchiveCounters::bump(&counters.frames_published);

        let stats = ArchiveStats::snapshot(
            &counters,
            Occupancy {
                live_frames: 2,
                ..Default::default()
            },
        );
        assert_eq!(stats.live_frames, 2);
        assert_eq!(stats.frames_published, 1);
        assert!((stats.reuse_rate() - 75.0).abs() < 1e-10);

        let output = stats.to_string();
        assert!(output.contains("reused=3 (75.00%)"));
    }
}
