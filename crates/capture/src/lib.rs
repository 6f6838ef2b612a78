//! # Capture
//!
//! Device-to-consumer plumbing on top of the frame archive.
//!
//! Responsibilities:
//! - Drive a `DeviceSource` and publish every packet into a `FrameArchive`
//! - Assemble framesets holding one frame of every enabled stream
//! - Deliver framesets through a bounded queue, dropping the newest when full
//! - Mock device producing deterministic images for tests and demos
//!
//! ## Usage Example
//!
//! ```ignore
//! use capture::{CaptureSession, MockDevice};
//!
//! let device = MockDevice::with_modes(blueprint.stream_modes());
//! let mut session = CaptureSession::new(&blueprint, Box::new(device));
//! session.start()?;
//! session.warm_up().await?;
//!
//! let set = session.wait_for_frames().await?;
//! if let Some(depth) = set.data(StreamKind::Depth) {
//!     process(&depth);
//! }
//! ```

mod config;
mod error;
mod mock;
mod session;
mod syncer;

pub use config::{CaptureMetrics, MetricsSnapshot};
pub use error::{CaptureError, Result};
pub use mock::{pattern_byte, MockDevice, MockDeviceConfig};
pub use session::CaptureSession;
pub use syncer::FrameSyncer;
