//! Board peripheral implementations
//!
//! Concrete implementations of the core hardware traits for the
//! ESP32-S3 dashboard board: LEDC-driven status LED and backlight,
//! SPI TFT behind the scene renderer, SD card storage, and the I2C
//! ambient sensor / touch controller probes.

pub mod display;
pub mod led;
pub mod sensor;
pub mod storage;
