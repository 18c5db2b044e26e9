//! Managed RGBA framebuffer.
//!
//! This module provides [`ManagedPixelBuffer`], a [`PixelSink`] that owns its
//! pixel data in a Vec.
//!
//! # Example
//!
//! ```
//! use rfb_pixelbuffer::{ManagedPixelBuffer, PixelSink};
//! use rfb_common::Rect;
//!
//! let mut buffer = ManagedPixelBuffer::new(100, 100);
//! buffer.fill_rect(Rect::new(10, 10, 50, 50), [255, 0, 0]).unwrap();
//!
//! assert_eq!(buffer.pixel(10, 10), Some([255, 0, 0, 255]));
//! assert_eq!(buffer.pixel(9, 10), Some([0, 0, 0, 0]));
//! ```

use crate::{PixelSink, RGBA_BYTES_PER_PIXEL};
use anyhow::{anyhow, Result};
use rfb_common::Rect;

/// An RGBA framebuffer that manages its own memory.
///
/// # Memory Layout
///
/// Row-major, 4 bytes per pixel, stride equal to the width:
///
/// ```text
/// Total size = W * H * 4 bytes
/// Pixel at (x, y) starts at offset: (y * W + x) * 4
/// ```
///
/// A new buffer is all zeros (transparent black).
#[derive(Debug, Clone)]
pub struct ManagedPixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ManagedPixelBuffer {
    /// Creates a zeroed buffer with the specified dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        let data = vec![0u8; width as usize * height as usize * RGBA_BYTES_PER_PIXEL];
        Self {
            width,
            height,
            data,
        }
    }

    /// Resizes the buffer. Existing pixel data is not preserved.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width as usize * height as usize * RGBA_BYTES_PER_PIXEL, 0);
    }

    /// Returns the dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the raw RGBA data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer and returns the raw RGBA data.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the RGBA value at (x, y), or `None` if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x as usize, y as usize);
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[offset..offset + RGBA_BYTES_PER_PIXEL]);
        Some(px)
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * RGBA_BYTES_PER_PIXEL
    }

    /// Validates that a rectangle is within buffer bounds.
    fn validate_rect(&self, rect: Rect) -> Result<()> {
        let in_bounds = rect.x >= 0
            && rect.y >= 0
            && rect.x as u64 + rect.width as u64 <= self.width as u64
            && rect.y as u64 + rect.height as u64 <= self.height as u64;
        if !in_bounds {
            return Err(anyhow!(
                "Rectangle out of bounds: {:?} (buffer size: {}x{})",
                rect,
                self.width,
                self.height
            ));
        }
        Ok(())
    }
}

impl PixelSink for ManagedPixelBuffer {
    fn blit_image(&mut self, dest: Rect, rgba: &[u8]) -> Result<()> {
        self.validate_rect(dest)?;

        let row_bytes = dest.width as usize * RGBA_BYTES_PER_PIXEL;
        let required = row_bytes * dest.height as usize;
        if rgba.len() < required {
            return Err(anyhow!(
                "Insufficient source data: got {} bytes, need at least {}",
                rgba.len(),
                required
            ));
        }

        for (row, src) in rgba[..required].chunks_exact(row_bytes.max(1)).enumerate() {
            let dst = self.offset(dest.x as usize, dest.y as usize + row);
            self.data[dst..dst + row_bytes].copy_from_slice(src);
        }

        Ok(())
    }

    fn fill_rect(&mut self, dest: Rect, rgb: [u8; 3]) -> Result<()> {
        self.validate_rect(dest)?;

        let pixel = [rgb[0], rgb[1], rgb[2], 0xFF];
        for y in 0..dest.height as usize {
            let row = self.offset(dest.x as usize, dest.y as usize + y);
            let row_bytes = dest.width as usize * RGBA_BYTES_PER_PIXEL;
            for px in self.data[row..row + row_bytes].chunks_exact_mut(RGBA_BYTES_PER_PIXEL) {
                px.copy_from_slice(&pixel);
            }
        }

        Ok(())
    }
}
