//! Mock device
//!
//! Implements `DeviceSource`, producing every enabled stream from one
//! background thread. Pixel bytes are a deterministic function of stream,
//! frame number and offset, so consumers can verify what they received.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use contracts::{DeviceCallback, DevicePacket, DeviceSource, StreamKind, StreamModes};
use tracing::{debug, trace};

/// Mock device configuration
#[derive(Debug, Clone)]
pub struct MockDeviceConfig {
    /// Device name
    pub name: String,

    /// Streams to produce
    pub modes: StreamModes,

    /// Capture rate; defaults to the fastest enabled stream's fps
    pub frequency_hz: Option<f64>,

    /// Stop on its own after this many frames per stream
    pub frame_limit: Option<u64>,
}

impl MockDeviceConfig {
    pub fn new(modes: StreamModes) -> Self {
        Self {
            name: "mock_device".to_string(),
            modes,
            frequency_hz: None,
            frame_limit: None,
        }
    }

    fn interval(&self) -> Duration {
        let hz = self.frequency_hz.unwrap_or_else(|| {
            self.modes
                .enabled()
                .map(|(_, mode)| mode.fps)
                .max()
                .unwrap_or(30) as f64
        });
        Duration::from_secs_f64(1.0 / hz.max(1.0))
    }
}

/// Expected byte of the mock image at `offset`
pub fn pattern_byte(stream: StreamKind, frame_number: u64, offset: usize) -> u8 {
    (frame_number
        .wrapping_mul(31)
        .wrapping_add(stream.index() as u64 * 7)
        .wrapping_add(offset as u64)) as u8
}

fn pattern(stream: StreamKind, frame_number: u64, size: usize) -> Bytes {
    (0..size)
        .map(|offset| pattern_byte(stream, frame_number, offset))
        .collect::<Vec<u8>>()
        .into()
}

fn wall_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Mock device
pub struct MockDevice {
    config: MockDeviceConfig,
    listening: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MockDevice {
    pub fn new(config: MockDeviceConfig) -> Self {
        Self {
            config,
            listening: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Mock device with default rate and no frame limit
    pub fn with_modes(modes: StreamModes) -> Self {
        Self::new(MockDeviceConfig::new(modes))
    }
}

impl DeviceSource for MockDevice {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn listen(&self, mut callback: DeviceCallback) {
        // Idempotent: if already listening, don't start again
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let listening = self.listening.clone();
        let interval = config.interval();

        let worker = thread::spawn(move || {
            let start_time = Instant::now();
            let mut frame_number: u64 = 0;

            debug!(
                device = %config.name,
                streams = config.modes.enabled_count(),
                interval_ms = interval.as_millis() as u64,
                "mock device started"
            );

            while listening.load(Ordering::Relaxed) {
                frame_number += 1;
                let timestamp = start_time.elapsed().as_millis() as i64;

                for (stream, mode) in config.modes.enabled() {
                    callback(DevicePacket {
                        stream,
                        timestamp,
                        frame_number,
                        system_time: wall_clock_ms(),
                        data: pattern(stream, frame_number, mode.frame_size()),
                    });
                }

                trace!(device = %config.name, frame_number, timestamp, "mock frame sent");

                if config.frame_limit.is_some_and(|limit| frame_number >= limit) {
                    break;
                }
                thread::sleep(interval);
            }

            listening.store(false, Ordering::SeqCst);
            debug!(device = %config.name, frame_number, "mock device stopped");
        });

        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(worker);
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            // The callback may own the last session handle and stop from inside
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.stop();
    }
}
