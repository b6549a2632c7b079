//! Panel rotation
//!
//! Round-robin over the configured panels, one cycle per call. A
//! panel that fails its cycle is skipped and the rotation moves on;
//! a single misbehaving service must never freeze the whole
//! dashboard. The skip is signalled on the status LED and handed
//! back to the caller for logging.

use embedded_hal::delay::DelayNs;

use crate::panel::{
    show_panel, show_sensor_panel, PanelError, PanelReading, PanelSpec, SensorPanelSpec,
};
use crate::scene::Scene;
use crate::status::StatusColor;
use crate::traits::board::AmbientSensor;
use crate::traits::frame::Frame;
use crate::traits::http::HttpClient;
use crate::traits::led::StatusLed;

/// Maximum panels in rotation
pub const MAX_PANELS: usize = 8;

/// One slot in the rotation
#[derive(Debug, Clone)]
pub enum PanelEntry {
    /// Network-backed metric panel
    Metric(PanelSpec),
    /// Local ambient-sensor panel
    Sensor(SensorPanelSpec),
}

impl PanelEntry {
    pub fn name(&self) -> &'static str {
        match self {
            PanelEntry::Metric(p) => p.name,
            PanelEntry::Sensor(p) => p.name,
        }
    }
}

/// What one cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Panel rendered and dwelled
    Shown {
        panel: &'static str,
        reading: PanelReading,
    },
    /// Panel failed and was skipped
    Skipped {
        panel: &'static str,
        error: PanelError,
    },
}

/// The rotation itself
#[derive(Debug, Default)]
pub struct Carousel {
    entries: heapless::Vec<PanelEntry, MAX_PANELS>,
    index: usize,
}

impl Carousel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a panel to the end of the rotation; full rotations reject it
    pub fn push(&mut self, entry: PanelEntry) -> Result<(), PanelEntry> {
        self.entries.push(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the panel the next cycle will show
    pub fn current(&self) -> Option<&'static str> {
        self.entries.get(self.index).map(PanelEntry::name)
    }

    /// Run one cycle and advance to the next panel.
    ///
    /// Returns `None` only for an empty rotation. A failing panel
    /// comes back as [`CycleOutcome::Skipped`] with the LED set to the
    /// failure color; the rotation still advances.
    pub fn run_cycle<C, S, F, L, D>(
        &mut self,
        http: &mut C,
        sensor: &mut S,
        scene: &mut Scene,
        surface: &mut F,
        led: &mut L,
        delay: &mut D,
    ) -> Option<CycleOutcome>
    where
        C: HttpClient,
        S: AmbientSensor,
        F: Frame,
        L: StatusLed,
        D: DelayNs,
    {
        let entry = self.entries.get(self.index)?;
        let name = entry.name();

        let result = match entry {
            PanelEntry::Metric(panel) => show_panel(panel, http, scene, surface, led, delay),
            PanelEntry::Sensor(panel) => show_sensor_panel(panel, sensor, scene, surface, delay),
        };

        self.index = (self.index + 1) % self.entries.len();

        Some(match result {
            Ok(reading) => CycleOutcome::Shown {
                panel: name,
                reading,
            },
            Err(error) => {
                led.fill(StatusColor::CYCLE_FAILED);
                CycleOutcome::Skipped { panel: name, error }
            }
        })
    }
}
