//! In-memory draw target, for the web canvas and for tests.

use std::convert::Infallible;

use embedded_graphics::{
    geometry::{OriginDimensions, Point, Size},
    pixelcolor::{Rgb888, RgbColor},
    prelude::DrawTarget,
    Pixel,
};

/// A plain row-major RGB buffer. Writes outside the bounds are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    size: Size,
    pixels: Vec<Rgb888>,
}

impl Framebuffer {
    pub fn new(size: Size) -> Self {
        Framebuffer {
            size,
            pixels: vec![Rgb888::BLACK; (size.width * size.height) as usize],
        }
    }

    fn index(&self, p: Point) -> Option<usize> {
        let x = u32::try_from(p.x).ok().filter(|x| *x < self.size.width)?;
        let y = u32::try_from(p.y).ok().filter(|y| *y < self.size.height)?;
        Some((y * self.size.width + x) as usize)
    }

    /// Color at `p`, if it is on the buffer.
    pub fn pixel(&self, p: Point) -> Option<Rgb888> {
        self.index(p).map(|i| self.pixels[i])
    }

    /// Pixels as RGBA bytes with full opacity, e.g. for `ImageData`.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|c| [c.r(), c.g(), c.b(), 0xff])
            .collect()
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if let Some(i) = self.index(p) {
                self.pixels[i] = color;
            }
        }
        Ok(())
    }
}
