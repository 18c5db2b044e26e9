//! Pixel sink trait for decoded RFB rectangles.
//!
//! Decoders never own the destination surface. They hand each decoded tile to a
//! [`PixelSink`], which composites it wherever the host keeps its framebuffer
//! (an owned buffer, a GPU texture, a test recorder).
//!
//! # Pixel Layout
//!
//! All image data passed to a sink is tightly packed RGBA, 4 bytes per pixel,
//! row-major, with no padding between rows:
//!
//! ```text
//! byte_offset = (y * width + x) * 4
//! byte_length = width * height * 4
//! ```
//!
//! The borrowed slice is only valid for the duration of the call; sinks that
//! need the data later must copy it.

use anyhow::Result;
use rfb_common::Rect;

/// Bytes per pixel of the RGBA data handed to a [`PixelSink`].
pub const RGBA_BYTES_PER_PIXEL: usize = 4;

/// Destination for decoded pixels.
///
/// # Example
///
/// ```
/// use rfb_pixelbuffer::PixelSink;
/// use rfb_common::Rect;
///
/// #[derive(Default)]
/// struct CountingSink {
///     pixels: u64,
/// }
///
/// impl PixelSink for CountingSink {
///     fn blit_image(&mut self, dest: Rect, _rgba: &[u8]) -> anyhow::Result<()> {
///         self.pixels += dest.area();
///         Ok(())
///     }
///
///     fn fill_rect(&mut self, dest: Rect, _rgb: [u8; 3]) -> anyhow::Result<()> {
///         self.pixels += dest.area();
///         Ok(())
///     }
/// }
///
/// let mut sink = CountingSink::default();
/// sink.fill_rect(Rect::new(0, 0, 8, 8), [255, 0, 0]).unwrap();
/// assert_eq!(sink.pixels, 64);
/// ```
pub trait PixelSink {
    /// Copies `dest.width * dest.height * 4` bytes of RGBA data into `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dest` lies outside the surface or `rgba` is too short.
    fn blit_image(&mut self, dest: Rect, rgba: &[u8]) -> Result<()>;

    /// Fills `dest` with a single opaque color.
    ///
    /// # Errors
    ///
    /// Returns an error if `dest` lies outside the surface.
    fn fill_rect(&mut self, dest: Rect, rgb: [u8; 3]) -> Result<()>;
}

impl<T: PixelSink + ?Sized> PixelSink for &mut T {
    fn blit_image(&mut self, dest: Rect, rgba: &[u8]) -> Result<()> {
        (**self).blit_image(dest, rgba)
    }

    fn fill_rect(&mut self, dest: Rect, rgb: [u8; 3]) -> Result<()> {
        (**self).fill_rect(dest, rgb)
    }
}
