//! Miscellaneous board peripherals
//!
//! Backlight, speaker, touch and the ambient sensor are initialized
//! during bring-up and otherwise barely used; their traits stay
//! correspondingly small.

use super::storage::StorageError;

/// TFT backlight
pub trait Backlight {
    /// Set brightness as a percentage; implementations clamp to 0-100
    fn set_brightness(&mut self, percent: u8);
}

/// Errors playing audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioError {
    /// Not a playable WAV
    Unsupported,
    /// Could not read the sample data
    Storage(StorageError),
}

/// Speaker output
pub trait AudioOut {
    /// Enable or disable the speaker amplifier
    fn set_enabled(&mut self, on: bool);

    /// Play a WAV clip, blocking until it finishes
    fn play_wav(&mut self, data: &[u8]) -> Result<(), AudioError>;
}

/// Touch input
///
/// The dashboard never acts on touches; the controller is probed at
/// bring-up purely so a wiring fault shows up in the boot report.
pub trait TouchInput {
    /// Returns true if the touch controller answered
    fn probe(&mut self) -> bool;
}

/// Errors from the ambient sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Sensor missing or not initialized
    NotReady,
    /// Bus transaction failed
    Bus,
}

/// On-board temperature / light sensor
pub trait AmbientSensor {
    /// Temperature in tenths of a degree Celsius (234 = 23.4 C)
    fn temperature_dc(&mut self) -> Result<i16, SensorError>;

    /// Raw light level reading
    fn light_raw(&mut self) -> Result<u16, SensorError>;
}

/// Stand-in for boards without an ambient sensor
pub struct NoSensor;

impl AmbientSensor for NoSensor {
    fn temperature_dc(&mut self) -> Result<i16, SensorError> {
        Err(SensorError::NotReady)
    }

    fn light_raw(&mut self) -> Result<u16, SensorError> {
        Err(SensorError::NotReady)
    }
}
