//! TFT panel wrapper
//!
//! The mipidsi driver pushes pixels to the glass as they are drawn,
//! so the flush the renderer asks for is a no-op; by the time a draw
//! call returns the pixels are visible.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use tally_display::FlushTarget;

/// Wraps any RGB565 draw target as a flushable render surface
pub struct Tft<D> {
    panel: D,
}

impl<D> Tft<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(panel: D) -> Self {
        Self { panel }
    }
}

impl<D> Dimensions for Tft<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn bounding_box(&self) -> embedded_graphics::primitives::Rectangle {
        self.panel.bounding_box()
    }
}

impl<D> DrawTarget for Tft<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    type Color = Rgb565;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        self.panel.draw_iter(pixels)
    }

    fn fill_contiguous<I>(
        &mut self,
        area: &embedded_graphics::primitives::Rectangle,
        colors: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Rgb565>,
    {
        self.panel.fill_contiguous(area, colors)
    }

    fn fill_solid(
        &mut self,
        area: &embedded_graphics::primitives::Rectangle,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        self.panel.fill_solid(area, color)
    }

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        self.panel.clear(color)
    }
}

impl<D> FlushTarget for Tft<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    type FlushError = core::convert::Infallible;

    fn flush(&mut self) -> Result<(), Self::FlushError> {
        Ok(())
    }
}
