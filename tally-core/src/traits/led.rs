//! Status LED trait

use crate::status::StatusColor;

/// Single addressable RGB status LED
///
/// Fills are fire-and-forget; a failed LED update is never worth
/// aborting a fetch over.
pub trait StatusLed {
    fn fill(&mut self, color: StatusColor);
}
