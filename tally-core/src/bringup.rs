//! Boot sequence
//!
//! One parameterized bring-up path for every board variant. The
//! `Capabilities` set says which optional peripherals exist; absent
//! ones are skipped, present-but-broken ones are recorded in the
//! report rather than halting the boot. Only an unresponsive radio is
//! fatal, since a dashboard that cannot fetch anything has nothing to
//! show.

use embedded_hal::delay::DelayNs;

use crate::config::{Capabilities, Secrets};
use crate::scene::{BackgroundSource, FontSize, Label, Scene};
use crate::status::StatusColor;
use crate::traits::board::{AmbientSensor, AudioOut, Backlight, TouchInput};
use crate::traits::frame::{Frame, FrameError};
use crate::traits::led::StatusLed;
use crate::traits::radio::WifiRadio;
use crate::traits::storage::Storage;

/// Radio probe attempts before the boot is declared dead
pub const RADIO_PROBE_ATTEMPTS: u32 = 3;

/// Delay between radio probe attempts
pub const RADIO_PROBE_DELAY_MS: u32 = 1_000;

/// Delay between network join attempts
pub const JOIN_RETRY_DELAY_MS: u32 = 3_000;

/// Where the boot progress label sits
pub const PROGRESS_POS: (u16, u16) = (30, 30);

/// Fatal bring-up failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringUpError {
    /// The radio never answered a probe
    RadioUnresponsive,
    /// The display rejected a refresh during boot
    Frame(FrameError),
}

impl From<FrameError> for BringUpError {
    fn from(e: FrameError) -> Self {
        BringUpError::Frame(e)
    }
}

/// What bring-up found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BringUpReport {
    /// Storage probed and answered
    pub sd_mounted: bool,
    /// Touch controller answered
    pub touch_ready: bool,
    /// Ambient sensor answered
    pub sensor_ready: bool,
    /// Join attempts it took to get on the network
    pub join_attempts: u32,
}

/// Run the boot sequence.
///
/// Stages, in order: backlight on, black background, progress label,
/// speaker muted, radio probe (fatal after [`RADIO_PROBE_ATTEMPTS`]),
/// network join (retries forever), storage / touch / sensor probes
/// (best effort), progress label removed.
#[allow(clippy::too_many_arguments)]
pub fn bring_up<R, F, L, B, St, D>(
    caps: Capabilities,
    secrets: &Secrets,
    radio: &mut R,
    scene: &mut Scene,
    surface: &mut F,
    led: &mut L,
    backlight: &mut B,
    delay: &mut D,
    mut audio: Option<&mut dyn AudioOut>,
    mut storage: Option<&mut St>,
    mut touch: Option<&mut dyn TouchInput>,
    mut sensor: Option<&mut dyn AmbientSensor>,
) -> Result<BringUpReport, BringUpError>
where
    R: WifiRadio,
    F: Frame,
    L: StatusLed,
    B: Backlight,
    St: Storage,
    D: DelayNs,
{
    let mut report = BringUpReport::default();

    backlight.set_brightness(100);
    scene.set_background(BackgroundSource::Fill(0x000000), surface)
        .map_err(|e| match e {
            crate::scene::SceneError::Frame(f) => BringUpError::Frame(f),
            // A color fill cannot be unsupported and the stack is empty
            _ => BringUpError::Frame(FrameError::Device),
        })?;

    let progress = scene
        .push_overlay(
            Label::new("booting", PROGRESS_POS.0, PROGRESS_POS.1).with_font(FontSize::Small),
        )
        .map_err(|_| BringUpError::Frame(FrameError::Device))?;
    surface.present(scene)?;

    if caps.has_audio {
        if let Some(audio) = audio.as_deref_mut() {
            audio.set_enabled(false);
        }
    }

    // Radio must answer before anything network-shaped is attempted
    scene.update_overlay(progress, "probing radio");
    surface.present(scene)?;
    let mut radio_alive = false;
    for attempt in 1..=RADIO_PROBE_ATTEMPTS {
        if radio.probe().is_ok() {
            radio_alive = true;
            break;
        }
        if attempt < RADIO_PROBE_ATTEMPTS {
            radio.reset();
            delay.delay_ms(RADIO_PROBE_DELAY_MS);
        }
    }
    if !radio_alive {
        return Err(BringUpError::RadioUnresponsive);
    }

    // Join retries forever; there is nothing useful to do offline
    scene.update_overlay(progress, "joining network");
    surface.present(scene)?;
    led.fill(StatusColor::LINK_CONNECTING);
    loop {
        report.join_attempts += 1;
        match radio.join(secrets.ssid.as_str(), secrets.password.as_str()) {
            Ok(()) => break,
            Err(_) => {
                led.fill(StatusColor::LINK_DOWN);
                delay.delay_ms(JOIN_RETRY_DELAY_MS);
            }
        }
    }
    led.fill(StatusColor::LINK_UP);

    if caps.has_sd {
        scene.update_overlay(progress, "mounting storage");
        surface.present(scene)?;
        if let Some(storage) = storage.as_deref_mut() {
            report.sd_mounted = storage.probe().is_ok();
        }
    }

    if caps.has_touch {
        if let Some(touch) = touch.as_deref_mut() {
            report.touch_ready = touch.probe();
        }
    }

    if caps.has_ambient_sensor {
        if let Some(sensor) = sensor.as_deref_mut() {
            report.sensor_ready = sensor.temperature_dc().is_ok();
        }
    }

    scene.truncate_overlays(progress);
    surface.present(scene)?;
    Ok(report)
}
