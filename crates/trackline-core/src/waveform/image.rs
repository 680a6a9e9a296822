//! Fixed-size RGBA pixel grid

use crate::types::Color;

/// A `width x height` grid of colours, row-major, row 0 at the top
///
/// Dimensions are fixed at construction. Only the renderer writes pixels;
/// once handed out the image is read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformImage {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl WaveformImage {
    /// Create an image filled with `background`
    pub(crate) fn filled(width: u32, height: u32, background: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Colour at `(x, y)`, `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Set a pixel; writes outside the image are clipped
    pub(crate) fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// All pixels, row-major
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Raw RGBA bytes for texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Number of pixels in `color`
    pub fn count(&self, color: Color) -> usize {
        self.pixels.iter().filter(|p| **p == color).count()
    }

    /// Pixels of one column, top to bottom
    pub fn column(&self, x: u32) -> Vec<Color> {
        (0..self.height).filter_map(|y| self.pixel(x, y)).collect()
    }
}
