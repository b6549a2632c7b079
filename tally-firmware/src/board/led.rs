//! Status LED and backlight over LEDC PWM
//!
//! The board carries a common-cathode RGB LED on three LEDC channels
//! and the TFT backlight on a fourth. Status colors use the 0-100
//! channel scale, which maps directly onto LEDC duty percent.

use esp_hal::ledc::channel::{Channel, ChannelIFace};
use esp_hal::ledc::LowSpeed;

use tally_core::status::StatusColor;
use tally_core::traits::board::Backlight;
use tally_core::traits::led::StatusLed;

/// RGB status LED on three PWM channels
pub struct RgbStatusLed<'d> {
    red: Channel<'d, LowSpeed>,
    green: Channel<'d, LowSpeed>,
    blue: Channel<'d, LowSpeed>,
}

impl<'d> RgbStatusLed<'d> {
    pub fn new(
        red: Channel<'d, LowSpeed>,
        green: Channel<'d, LowSpeed>,
        blue: Channel<'d, LowSpeed>,
    ) -> Self {
        Self { red, green, blue }
    }
}

impl StatusLed for RgbStatusLed<'_> {
    fn fill(&mut self, color: StatusColor) {
        // Duty updates cannot meaningfully fail once the channel is
        // configured; a missed heartbeat color is not worth a fault.
        let _ = self.red.set_duty(color.r.min(100));
        let _ = self.green.set_duty(color.g.min(100));
        let _ = self.blue.set_duty(color.b.min(100));
    }
}

/// TFT backlight on one PWM channel
pub struct PwmBacklight<'d> {
    channel: Channel<'d, LowSpeed>,
}

impl<'d> PwmBacklight<'d> {
    pub fn new(channel: Channel<'d, LowSpeed>) -> Self {
        Self { channel }
    }
}

impl Backlight for PwmBacklight<'_> {
    fn set_brightness(&mut self, percent: u8) {
        let _ = self.channel.set_duty(percent.min(100));
    }
}
