//! DeviceSource trait - camera data source abstraction
//!
//! Decouples the capture session from concrete device back-ends. The device
//! layer fills raw bytes; everything above it only sees `DevicePacket`.

use bytes::Bytes;

use crate::StreamKind;

/// One raw frame as delivered by the device layer.
#[derive(Debug, Clone)]
pub struct DevicePacket {
    /// Stream this packet belongs to
    pub stream: StreamKind,

    /// Device timestamp (milliseconds)
    pub timestamp: i64,

    /// Device frame counter
    pub frame_number: u64,

    /// Host wall-clock time at arrival (milliseconds)
    pub system_time: i64,

    /// Raw frame bytes
    pub data: Bytes,
}

/// Device data callback type
///
/// Invoked from the device's single capture thread, never concurrently.
pub type DeviceCallback = Box<dyn FnMut(DevicePacket) + Send + 'static>;

/// Device data source trait
///
/// Abstracts real and mock devices.
///
/// # Example
///
/// ```ignore
/// let device: Box<dyn DeviceSource> = open_device();
/// device.listen(Box::new(|packet| {
///     println!("frame {} on {}", packet.frame_number, packet.stream);
/// }));
/// // ... capture ...
/// device.stop();
/// ```
pub trait DeviceSource: Send + Sync {
    /// Device name (used for logging)
    fn name(&self) -> &str;

    /// Register the data callback and start streaming.
    ///
    /// Calling this while already listening is a no-op.
    fn listen(&self, callback: DeviceCallback);

    /// Stop streaming. Blocks until the capture thread has exited.
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
