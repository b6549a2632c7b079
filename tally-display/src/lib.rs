//! Scene renderer
//!
//! Draws a [`Scene`] onto any `embedded-graphics` draw target and
//! wraps a flushable target as the [`Frame`] surface the core logic
//! presents to. The renderer is display-agnostic; the firmware picks
//! the concrete panel driver.

#![no_std]
#![deny(unsafe_code)]

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::image::Image;
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::{Rgb565, Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use tinybmp::Bmp;

use tally_core::scene::{Background, FontSize, Scene};
use tally_core::traits::frame::{Frame, FrameError};

/// Rendering failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderError<E> {
    /// The draw target rejected a drawing operation
    Draw(E),
    /// Background bytes stopped being a decodable BMP
    Image,
}

fn font_for(size: FontSize) -> &'static MonoFont<'static> {
    match size {
        FontSize::Large => &FONT_10X20,
        FontSize::Small => &FONT_6X10,
    }
}

fn color_from_rgb(rgb: u32) -> Rgb565 {
    Rgb888::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8).into()
}

/// Draw the whole scene: background first, then overlays in push order.
///
/// An absent background clears to black, matching what the panel shows
/// before anything is installed.
pub fn render<D>(scene: &Scene, target: &mut D) -> Result<(), RenderError<D::Error>>
where
    D: DrawTarget<Color = Rgb565>,
{
    match scene.background() {
        None => target.clear(Rgb565::BLACK).map_err(RenderError::Draw)?,
        Some(Background::Fill(rgb)) => target
            .clear(color_from_rgb(*rgb))
            .map_err(RenderError::Draw)?,
        Some(Background::Image { bytes, origin }) => {
            let bmp =
                Bmp::<Rgb565>::from_slice(bytes.as_slice()).map_err(|_| RenderError::Image)?;
            Image::new(&bmp, Point::new(origin.0 as i32, origin.1 as i32))
                .draw(target)
                .map_err(RenderError::Draw)?;
        }
    }

    for label in scene.overlays() {
        let style = MonoTextStyle::new(font_for(label.font), color_from_rgb(label.color_rgb));
        Text::new(
            label.text.as_str(),
            Point::new(label.x as i32, label.y as i32),
            style,
        )
        .draw(target)
        .map_err(RenderError::Draw)?;
    }
    Ok(())
}

/// A draw target the renderer can flush to the panel
pub trait FlushTarget: DrawTarget<Color = Rgb565> {
    type FlushError;

    /// Push the drawn frame to the glass, blocking until it is visible
    fn flush(&mut self) -> Result<(), Self::FlushError>;
}

/// [`Frame`] implementation over any flushable draw target
pub struct EgSurface<D> {
    target: D,
}

impl<D> EgSurface<D>
where
    D: FlushTarget,
{
    pub fn new(target: D) -> Self {
        Self { target }
    }

    pub fn into_inner(self) -> D {
        self.target
    }
}

impl<D> Frame for EgSurface<D>
where
    D: FlushTarget,
{
    fn present(&mut self, scene: &Scene) -> Result<(), FrameError> {
        render(scene, &mut self.target).map_err(|_| FrameError::Device)?;
        self.target.flush().map_err(|_| FrameError::Device)
    }
}
