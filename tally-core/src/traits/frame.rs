//! Display frame trait
//!
//! The display has a single-writer invariant: the background slot and
//! the overlay stack are mutated by exactly one caller at a time, and
//! every mutation becomes visible through one `present` call. On an
//! async runtime all display work must stay serialized behind this
//! seam.

use crate::scene::Scene;

/// Errors presenting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The display driver rejected the frame
    Device,
}

/// A surface that can render a scene
pub trait Frame {
    /// Render the scene and block until the refresh completes
    ///
    /// When this returns the caller may freely reuse or drop any
    /// buffers the scene borrowed.
    fn present(&mut self, scene: &Scene) -> Result<(), FrameError>;
}
