//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations. The firmware crate provides
//! the real implementations; host tests provide fakes.

pub mod board;
pub mod frame;
pub mod http;
pub mod led;
pub mod radio;
pub mod storage;

pub use board::{AmbientSensor, AudioError, AudioOut, Backlight, NoSensor, SensorError, TouchInput};
pub use frame::{Frame, FrameError};
pub use http::{HttpClient, HttpError, HttpResponse};
pub use led::StatusLed;
pub use radio::{RadioError, WifiRadio};
pub use storage::{FileSink, Storage, StorageError};
