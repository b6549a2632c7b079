//! I2C peripherals, light sensor and speaker
//!
//! The ambient panel reads an ADT7410 temperature sensor and the
//! analog light sensor; the touch controller is an FT6206 probed once
//! at boot. All I2C devices share the bus through `embedded-hal-bus`.

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use esp_hal::analog::adc::{Adc, AdcPin};
use esp_hal::peripherals::ADC1;
use esp_hal::Blocking;

use tally_core::traits::board::{
    AmbientSensor, AudioError, AudioOut, SensorError, TouchInput,
};

/// ADT7410 I2C address
const ADT7410_ADDR: u8 = 0x48;
/// Temperature value register (two bytes, 13-bit two's complement)
const ADT7410_REG_TEMP: u8 = 0x00;

/// FT6206 I2C address
const FT6206_ADDR: u8 = 0x38;
/// Chip id register; any answer at all counts as present
const FT6206_REG_CHIP_ID: u8 = 0xA3;

/// ADT7410 plus the analog light sensor
pub struct AmbientBoard<'d, I, P> {
    i2c: I,
    adc: Adc<'d, ADC1<'d>, Blocking>,
    light_pin: AdcPin<P, ADC1<'d>>,
}

impl<'d, I, P> AmbientBoard<'d, I, P>
where
    I: I2c,
{
    pub fn new(i2c: I, adc: Adc<'d, ADC1<'d>, Blocking>, light_pin: AdcPin<P, ADC1<'d>>) -> Self {
        Self { i2c, adc, light_pin }
    }
}

impl<I, P> AmbientSensor for AmbientBoard<'_, I, P>
where
    I: I2c,
{
    fn temperature_dc(&mut self) -> Result<i16, SensorError> {
        let mut raw = [0u8; 2];
        self.i2c
            .write_read(ADT7410_ADDR, &[ADT7410_REG_TEMP], &mut raw)
            .map_err(|_| SensorError::Bus)?;

        // 13-bit mode: value in the top 13 bits, 0.0625 C per LSB
        let value = (i16::from_be_bytes(raw)) >> 3;
        Ok(((value as i32) * 5 / 8) as i16)
    }

    fn light_raw(&mut self) -> Result<u16, SensorError> {
        Ok(self.adc.read_blocking(&mut self.light_pin))
    }
}

/// FT6206 presence probe; touches themselves are never read
pub struct TouchProbe<I> {
    i2c: I,
}

impl<I: I2c> TouchProbe<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }
}

impl<I: I2c> TouchInput for TouchProbe<I> {
    fn probe(&mut self) -> bool {
        let mut id = [0u8; 1];
        self.i2c
            .write_read(FT6206_ADDR, &[FT6206_REG_CHIP_ID], &mut id)
            .is_ok()
    }
}

/// Speaker amplifier enable line.
///
/// This hardware revision has no DAC path wired, so playback is
/// unsupported; the amplifier is only ever muted.
pub struct SpeakerAmp<O> {
    enable: O,
}

impl<O: OutputPin> SpeakerAmp<O> {
    pub fn new(enable: O) -> Self {
        Self { enable }
    }
}

impl<O: OutputPin> AudioOut for SpeakerAmp<O> {
    fn set_enabled(&mut self, on: bool) {
        let _ = if on {
            self.enable.set_high()
        } else {
            self.enable.set_low()
        };
    }

    fn play_wav(&mut self, _data: &[u8]) -> Result<(), AudioError> {
        Err(AudioError::Unsupported)
    }
}
