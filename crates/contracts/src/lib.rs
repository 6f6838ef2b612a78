//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: stream
//! kinds and modes, the capture blueprint, the device packet interface and the
//! configuration error type.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `timestamp` is the device clock in milliseconds
//! - `frame_number` is the device frame counter, used for ordering/diagnostics
//! - `system_time` is host wall-clock time in milliseconds at arrival

mod blueprint;
mod device;
mod error;
mod stream;

pub use blueprint::*;
pub use device::{DeviceCallback, DevicePacket, DeviceSource};
pub use error::*;
pub use stream::*;
