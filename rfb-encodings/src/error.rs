//! Error types for rectangle decoding.

use thiserror::Error;

/// Errors that abort the decode of the current rectangle.
///
/// Running out of *received* bytes is not an error: decoders report it by
/// returning `Ok(false)`. Every variant here is fatal for the rectangle in
/// flight and is never retried internally.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Tile selector byte outside the defined sub-encoding ranges.
    #[error("invalid ZRLE subencoding: {0}")]
    InvalidSubencoding(u8),

    /// A decoded palette index does not address a palette entry.
    #[error("palette index {index} out of range (palette size {palette_size})")]
    InvalidPaletteIndex { index: usize, palette_size: usize },

    /// A run would write past the end of the tile.
    #[error("RLE run length {run} exceeds remaining pixels {remaining}")]
    InvalidRunLength { run: usize, remaining: usize },

    /// The decompressed data ended in the middle of a tile.
    #[error("decompressed data exhausted: need {needed} bytes, have {available}")]
    StreamExhausted { needed: usize, available: usize },

    /// The deflate stream itself is corrupt.
    #[error("zlib inflate failed: {0}")]
    Inflate(#[from] flate2::DecompressError),

    /// The pixel sink rejected a tile (for example, outside the surface).
    #[error("pixel sink rejected tile: {0}")]
    Sink(#[source] anyhow::Error),
}

impl DecodeError {
    /// Returns true if the error was caused by malformed data on the wire,
    /// as opposed to the destination surface.
    #[must_use]
    pub fn is_stream_corruption(&self) -> bool {
        !matches!(self, Self::Sink(_))
    }
}
