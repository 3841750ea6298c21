//! Interleaved RGBA image storage.
//!
//! [`ImageBuffer`] is the unit that travels between callers and the filter
//! host. Pixels are row-major, four bytes per pixel in R, G, B, A order,
//! straight (not premultiplied) alpha.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Row-major 8-bit RGBA image.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Interleaved RGBA bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl ImageBuffer {
    /// Wraps existing RGBA bytes, validating the length.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let image = Self { width, height, data };
        image.validate()?;
        Ok(image)
    }

    /// Creates a transparent black image.
    pub fn blank(width: u32, height: u32) -> Result<Self> {
        let len = byte_len(width, height)?;
        Ok(Self { width, height, data: vec![0; len] })
    }

    /// Creates an image where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let pixels = pixel_count(width, height)?;
        let mut data = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Ok(Self { width, height, data })
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Checks that `data` holds exactly `width * height * 4` bytes.
    ///
    /// Deserialized buffers skip the constructor, so anything that accepts
    /// one from the outside should call this first.
    pub fn validate(&self) -> Result<()> {
        let expected = byte_len(self.width, self.height)?;
        if self.data.len() != expected {
            return Err(Error::BufferLength {
                width: self.width,
                height: self.height,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Returns the RGBA quadruple at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl std::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_len", &self.data.len())
            .finish()
    }
}

fn pixel_count(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or(Error::InvalidDimensions { width, height })
}

fn byte_len(width: u32, height: u32) -> Result<usize> {
    pixel_count(width, height)?
        .checked_mul(4)
        .ok_or(Error::InvalidDimensions { width, height })
}
