//! Status indicator palette
//!
//! The dashboard has no console once deployed; the single RGB status
//! LED on the back of the unit is the only liveness signal an operator
//! gets. Nothing else in the firmware consumes these values.

/// RGB color for the status LED.
///
/// Channel values are dim on purpose (max 100 of 255) so the LED is
/// readable without lighting up the room behind the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl StatusColor {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// LED off (idle between cycles, download finished)
    pub const OFF: Self = Self::rgb(0, 0, 0);
    /// Yellow: a fetch or a chunk write is in flight
    pub const FETCHING: Self = Self::rgb(100, 100, 0);
    /// Blue: response received, body being decoded
    pub const RECEIVED: Self = Self::rgb(0, 0, 100);
    /// Cyan: a download chunk landed on storage
    pub const CHUNK_RECEIVED: Self = Self::rgb(0, 100, 100);
    /// Blue: network association starting
    pub const LINK_CONNECTING: Self = Self::rgb(0, 0, 100);
    /// Red: not associated with an access point
    pub const LINK_DOWN: Self = Self::rgb(100, 0, 0);
    /// Green: associated
    pub const LINK_UP: Self = Self::rgb(0, 100, 0);
    /// Red: the current panel cycle was skipped after a failure
    pub const CYCLE_FAILED: Self = Self::LINK_DOWN;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_dim() {
        for color in [
            StatusColor::OFF,
            StatusColor::FETCHING,
            StatusColor::RECEIVED,
            StatusColor::CHUNK_RECEIVED,
            StatusColor::LINK_CONNECTING,
            StatusColor::LINK_DOWN,
            StatusColor::LINK_UP,
        ] {
            assert!(color.r <= 100 && color.g <= 100 && color.b <= 100);
        }
    }
}
