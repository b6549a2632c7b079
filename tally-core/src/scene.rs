//! Scene model and background compositor
//!
//! The display is two logical sublayers: a background slot holding the
//! single current full-screen image or color fill, and an overlay
//! stack holding transient text labels. The `Scene` owns both and is
//! passed explicitly to everything that draws - there are no ambient
//! display globals.
//!
//! Invariants:
//! - At most one background is live at a time. Installing a new one
//!   drops the previous one's backing bytes before `present` returns.
//! - Overlays are removed by whoever pushed them; the panel cycle
//!   truncates back to its starting depth every time, success or not,
//!   so the overlay stack cannot grow across cycles.

use alloc::vec::Vec;
use heapless::String;
use tinybmp::RawBmp;

use crate::traits::frame::{Frame, FrameError};

/// Display width in pixels
pub const SCREEN_WIDTH: u16 = 320;
/// Display height in pixels
pub const SCREEN_HEIGHT: u16 = 240;

/// Maximum overlay labels on screen at once
pub const MAX_OVERLAYS: usize = 8;
/// Maximum overlay text length
pub const MAX_LABEL_TEXT: usize = 32;

/// Overlay font selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FontSize {
    /// Large numerals for the metric itself
    #[default]
    Large,
    /// Small text for progress / captions
    Small,
}

/// A positioned, colored overlay text label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String<MAX_LABEL_TEXT>,
    pub x: u16,
    pub y: u16,
    /// 0xRRGGBB
    pub color_rgb: u32,
    pub font: FontSize,
}

impl Label {
    /// White label in the large font; text longer than the capacity is
    /// truncated.
    pub fn new(text: &str, x: u16, y: u16) -> Self {
        let mut owned = String::new();
        for c in text.chars() {
            if owned.push(c).is_err() {
                break;
            }
        }
        Self {
            text: owned,
            x,
            y,
            color_rgb: 0xFF_FF_FF,
            font: FontSize::Large,
        }
    }

    pub fn with_color(mut self, color_rgb: u32) -> Self {
        self.color_rgb = color_rgb;
        self
    }

    pub fn with_font(mut self, font: FontSize) -> Self {
        self.font = font;
        self
    }

    /// Replace the label text, truncating to capacity.
    pub fn set_text(&mut self, text: &str) {
        self.text.clear();
        for c in text.chars() {
            if self.text.push(c).is_err() {
                break;
            }
        }
    }
}

/// Backing bytes for a bitmap background
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageBytes {
    /// Asset compiled into the firmware
    Borrowed(&'static [u8]),
    /// Bytes read back from storage or a download
    Owned(Vec<u8>),
}

impl ImageBytes {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            ImageBytes::Borrowed(bytes) => bytes,
            ImageBytes::Owned(bytes) => bytes,
        }
    }
}

/// The installed background
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    /// Full-frame single color fill (0xRRGGBB)
    Fill(u32),
    /// Decodable BMP placed at `origin`
    Image { bytes: ImageBytes, origin: (u16, u16) },
}

/// What to install as the new background
#[derive(Debug, Clone)]
pub enum BackgroundSource {
    /// Full-frame color fill (0xRRGGBB)
    Fill(u32),
    /// BMP asset compiled into the firmware
    Data(&'static [u8]),
    /// BMP bytes read from storage or a download
    Bytes(Vec<u8>),
}

/// Scene errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SceneError {
    /// The source bytes are not a decodable BMP; the previous
    /// background is left unchanged
    UnsupportedBackground,
    /// Overlay stack is full
    TooManyOverlays,
    /// The display rejected the refresh
    Frame(FrameError),
}

impl From<FrameError> for SceneError {
    fn from(e: FrameError) -> Self {
        SceneError::Frame(e)
    }
}

/// Background slot + overlay stack for one display
#[derive(Debug, Default)]
pub struct Scene {
    background: Option<Background>,
    overlays: heapless::Vec<Label, MAX_OVERLAYS>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Number of live backgrounds; 0 before the first install, 1 after
    pub fn background_count(&self) -> usize {
        usize::from(self.background.is_some())
    }

    pub fn overlays(&self) -> &[Label] {
        &self.overlays
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Push an overlay label, returning its index
    pub fn push_overlay(&mut self, label: Label) -> Result<usize, SceneError> {
        self.overlays
            .push(label)
            .map_err(|_| SceneError::TooManyOverlays)?;
        Ok(self.overlays.len() - 1)
    }

    /// Replace the text of an existing overlay
    pub fn update_overlay(&mut self, index: usize, text: &str) {
        if let Some(label) = self.overlays.get_mut(index) {
            label.set_text(text);
        }
    }

    /// Drop overlays down to `len`, in LIFO order
    pub fn truncate_overlays(&mut self, len: usize) {
        self.overlays.truncate(len);
    }

    /// Install a new background at the top-left corner and present.
    pub fn set_background<F: Frame>(
        &mut self,
        source: BackgroundSource,
        surface: &mut F,
    ) -> Result<(), SceneError> {
        self.set_background_at(source, (0, 0), surface)
    }

    /// Install a new background at `origin` and present.
    ///
    /// Image sources are validated before the previous background is
    /// touched, so a bad source leaves the scene exactly as it was.
    /// On success the previous background's backing bytes are dropped,
    /// the new background is the only background child, and the frame
    /// has been presented (the refresh has completed) by the time this
    /// returns.
    pub fn set_background_at<F: Frame>(
        &mut self,
        source: BackgroundSource,
        origin: (u16, u16),
        surface: &mut F,
    ) -> Result<(), SceneError> {
        let next = match source {
            BackgroundSource::Fill(color) => Background::Fill(color),
            BackgroundSource::Data(bytes) => {
                RawBmp::from_slice(bytes).map_err(|_| SceneError::UnsupportedBackground)?;
                Background::Image {
                    bytes: ImageBytes::Borrowed(bytes),
                    origin,
                }
            }
            BackgroundSource::Bytes(bytes) => {
                RawBmp::from_slice(&bytes).map_err(|_| SceneError::UnsupportedBackground)?;
                Background::Image {
                    bytes: ImageBytes::Owned(bytes),
                    origin,
                }
            }
        };

        // Replacing the slot drops the previous background's bytes
        self.background = Some(next);
        surface.present(self)?;
        Ok(())
    }
}
