//! ZRLE encoding decoder - Zlib-compressed RLE with 64x64 tiling.
//!
//! ZRLE (Zlib Run-Length Encoding, type 16) combines zlib compression with
//! run-length and palette encoding. Rectangles are divided into 64x64 tiles
//! (smaller at the right and bottom edges), each with its own sub-encoding;
//! see [`crate::tile`].
//!
//! # Wire Format
//!
//! ```text
//! +------------------+
//! | length           |  4 bytes (u32 big-endian) - length of zlib data
//! +------------------+
//! | zlib_data        |  'length' bytes, continuation of the connection's zlib stream
//! +------------------+
//! ```
//!
//! # Resumable Decoding
//!
//! Socket reads can split a rectangle anywhere. [`ZrleDecoder::decode`] never
//! blocks: when the queued bytes are not enough it returns `Ok(false)` and keeps
//! whatever framing it already consumed, so the host simply calls again once
//! more data arrives.
//!
//! ```text
//! Idle -> AwaitingLength -> AwaitingBody{length} -> (decode all tiles) -> Idle
//!              |                   |
//!           Ok(false)          Ok(false)
//! ```
//!
//! Once the body has been taken from the source, inflation and tile decoding
//! run to completion within the same call.
//!
//! # Example
//!
//! ```
//! use rfb_encodings::{RectDecoder, ZrleDecoder, ENCODING_ZRLE};
//! use rfb_pixelbuffer::ManagedPixelBuffer;
//! use rfb_protocol::{RfbInQueue, Rectangle};
//!
//! let mut decoder = ZrleDecoder::new();
//! let mut queue = RfbInQueue::new();
//! let mut framebuffer = ManagedPixelBuffer::new(64, 64);
//! let rect = Rectangle { x: 0, y: 0, width: 64, height: 64, encoding: ENCODING_ZRLE };
//!
//! queue.push(&[0, 0]); // half of the length prefix
//! let done = decoder.decode_rect(&rect, 24, &mut queue, &mut framebuffer).unwrap();
//! assert!(!done);
//! assert_eq!(queue.available(), 2); // nothing consumed
//! ```

use crate::config::DecoderConfig;
use crate::inflate::{Inflate, ZlibInflator};
use crate::tile::{
    decode_tile, Subencoding, TileCursor, TileOutput, TileScratch, CPIXEL_BYTES, TILE_SIZE,
};
use crate::{DecodeError, RectDecoder, ENCODING_ZRLE};
use rfb_common::Rect;
use rfb_pixelbuffer::PixelSink;
use rfb_protocol::{ByteSource, Rectangle};

/// Decompressed buffer capacity kept between rectangles (a full-HD update).
const RETAINED_BUFFER_BYTES: usize = 1920 * 1080 * CPIXEL_BYTES;

/// Framing progress of the rectangle in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeState {
    /// No rectangle in flight.
    #[default]
    Idle,
    /// Waiting for the 4-byte compressed length.
    AwaitingLength,
    /// Length consumed; waiting for `length` compressed bytes.
    AwaitingBody { length: u32 },
}

/// Counters accumulated over the decoder's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZrleStats {
    pub rectangles: u64,
    pub tiles: u64,
    pub solid_tiles: u64,
    pub compressed_bytes: u64,
    pub decompressed_bytes: u64,
}

/// Decoder for ZRLE encoding.
///
/// One instance serves one connection: the zlib stream, the decompressed
/// buffer and the tile/palette scratch buffers are reused for every rectangle.
/// Calls must be serialized; the decoder holds exactly one rectangle in flight.
pub struct ZrleDecoder<I: Inflate = ZlibInflator> {
    inflator: I,
    state: DecodeState,
    /// Decompressed tile data of the rectangle in flight; empty between rectangles.
    decompressed: Vec<u8>,
    scratch: TileScratch,
    config: DecoderConfig,
    stats: ZrleStats,
}

impl Default for ZrleDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ZrleDecoder {
    /// Create a new ZRLE decoder with a fresh zlib inflater.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder using `config`.
    pub fn with_config(config: DecoderConfig) -> Self {
        let inflator = ZlibInflator::new(config.inflate_chunk_size);
        Self::with_inflator(inflator, config)
    }
}

impl<I: Inflate> ZrleDecoder<I> {
    /// Create a decoder driving a caller-supplied inflate engine.
    pub fn with_inflator(inflator: I, config: DecoderConfig) -> Self {
        Self {
            inflator,
            state: DecodeState::Idle,
            decompressed: Vec::new(),
            scratch: TileScratch::default(),
            config,
            stats: ZrleStats::default(),
        }
    }

    /// Current framing state.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Lifetime counters.
    pub fn stats(&self) -> ZrleStats {
        self.stats
    }

    /// Drop any rectangle in flight and restart the zlib stream.
    ///
    /// Call this when the connection is re-established.
    pub fn reset(&mut self) {
        self.state = DecodeState::Idle;
        self.decompressed.clear();
        self.inflator.reset();
    }

    /// Decode the ZRLE rectangle covering `area`.
    ///
    /// Returns `Ok(false)` if `source` does not yet hold enough data (nothing
    /// is lost; call again later), `Ok(true)` once every tile has been handed to
    /// `sink`.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`] is fatal for this rectangle. The framing state is
    /// reset, but the shared zlib stream is likely out of sync and the
    /// connection should be closed.
    pub fn decode(
        &mut self,
        area: Rect,
        source: &mut dyn ByteSource,
        sink: &mut dyn PixelSink,
    ) -> Result<bool, DecodeError> {
        let length = match self.state {
            DecodeState::AwaitingBody { length } => length,
            DecodeState::Idle | DecodeState::AwaitingLength => {
                self.state = DecodeState::AwaitingLength;
                if !source.has_at_least(4) {
                    return Ok(false);
                }
                let length = source.take_u32_be();
                tracing::debug!(
                    "ZRLE: rect [{},{}+{}x{}] compressed_len={}",
                    area.x,
                    area.y,
                    area.width,
                    area.height,
                    length
                );
                self.state = DecodeState::AwaitingBody { length };
                length
            }
        };

        if !source.has_at_least(length as usize) {
            tracing::trace!("ZRLE: waiting for {} compressed bytes", length);
            return Ok(false);
        }
        let compressed = source.take_bytes(length as usize);

        let result = self.decode_body(area, compressed, sink);

        self.state = DecodeState::Idle;
        self.decompressed.clear();
        self.decompressed.shrink_to(RETAINED_BUFFER_BYTES);
        result.map(|()| true)
    }

    fn decode_body(
        &mut self,
        area: Rect,
        compressed: bytes::Bytes,
        sink: &mut dyn PixelSink,
    ) -> Result<(), DecodeError> {
        let (cols, rows) = area.tile_grid(TILE_SIZE);
        let tile_count = cols as usize * rows as usize;
        let size_hint =
            area.area() as usize * CPIXEL_BYTES + tile_count * self.config.tile_margin_bytes;

        self.stats.compressed_bytes += compressed.len() as u64;
        self.decompressed.clear();
        self.inflator.set_input(compressed);
        let inflated = self.inflator.inflate(size_hint, &mut self.decompressed)?;
        self.stats.decompressed_bytes += inflated as u64;

        tracing::debug!("ZRLE: decompressed {} bytes for {} tiles", inflated, tile_count);

        let mut cursor = TileCursor::new(&self.decompressed);
        for tile in area.tiles(TILE_SIZE) {
            let selector = cursor.read_u8()?;
            let subencoding = Subencoding::from_selector(selector)?;
            tracing::trace!(
                "ZRLE: tile ({}, {}) {}x{} {:?}",
                tile.x,
                tile.y,
                tile.width,
                tile.height,
                subencoding
            );

            match decode_tile(
                &mut cursor,
                subencoding,
                tile.width,
                tile.height,
                &mut self.scratch,
            )? {
                TileOutput::Fill(rgb) => {
                    sink.fill_rect(tile, rgb).map_err(DecodeError::Sink)?;
                    self.stats.solid_tiles += 1;
                }
                TileOutput::Image => {
                    let pixels = self.scratch.image(tile.width, tile.height);
                    sink.blit_image(tile, pixels).map_err(DecodeError::Sink)?;
                }
            }
            self.stats.tiles += 1;
        }

        let remaining = cursor.remaining();
        if remaining > 0 && self.config.warn_on_trailing_data {
            tracing::warn!("ZRLE: {} trailing bytes after decoding rectangle", remaining);
        }

        self.stats.rectangles += 1;
        Ok(())
    }
}

impl<I: Inflate> RectDecoder for ZrleDecoder<I> {
    fn encoding_type(&self) -> i32 {
        ENCODING_ZRLE
    }

    fn decode_rect(
        &mut self,
        rect: &Rectangle,
        _depth: u8,
        source: &mut dyn ByteSource,
        sink: &mut dyn PixelSink,
    ) -> Result<bool, DecodeError> {
        // Source pixels are always 3-byte RGB, whatever the negotiated depth.
        self.decode(rect.rect(), source, sink)
    }
}
