//! ZRLE tile decoding.
//!
//! After inflation a ZRLE rectangle is a sequence of tiles, each starting with
//! a sub-encoding selector byte:
//!
//! | selector  | sub-encoding                       |
//! |-----------|------------------------------------|
//! | 0         | raw pixels                         |
//! | 1         | solid color                        |
//! | 2..=16    | packed palette (1/2/4-bit indices) |
//! | 128       | plain RLE                          |
//! | 130..=255 | palette RLE (size = selector - 128)|
//!
//! Source pixels are always 3 bytes (R, G, B) and are expanded to opaque RGBA.
//!
//! # RLE Length Encoding
//!
//! ```text
//! Length = 1 + byte0 + byte1 + ... + byteN
//!   where byte0..byteN-1 are 255 and byteN < 255 terminates
//!
//!   [5]            -> 6
//!   [255, 255, 10] -> 521
//! ```
//!
//! # Packed Palette Bit Order
//!
//! Indices are packed MSB-first and every row starts on a fresh byte:
//!
//! ```text
//! 2-bit indices (4 colors), row of 5 pixels:
//!
//!   Byte 0: [idx0 idx1 idx2 idx3]
//!   Byte 1: [idx4 ---- ---- ----]  (6 bits discarded)
//! ```

use crate::DecodeError;

/// ZRLE tile edge length (tiles are smaller at rectangle edges).
pub const TILE_SIZE: u32 = 64;

/// Largest palette a tile can carry.
pub const MAX_PALETTE_SIZE: usize = 127;

/// Bytes per source pixel in the decompressed stream.
pub const CPIXEL_BYTES: usize = 3;

const RGBA_BYTES: usize = 4;
const MAX_TILE_PIXELS: usize = (TILE_SIZE * TILE_SIZE) as usize;

/// Per-tile encoding scheme, selected by the tile's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subencoding {
    Raw,
    Solid,
    Palette(u8),
    Rle,
    RlePalette(u8),
}

impl Subencoding {
    /// Map a selector byte to its sub-encoding.
    pub fn from_selector(selector: u8) -> Result<Self, DecodeError> {
        match selector {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Solid),
            2..=16 => Ok(Self::Palette(selector)),
            128 => Ok(Self::Rle),
            130..=255 => Ok(Self::RlePalette(selector - 128)),
            other => Err(DecodeError::InvalidSubencoding(other)),
        }
    }
}

/// Bits per packed palette index.
fn bits_per_index(palette_size: usize) -> u32 {
    if palette_size <= 2 {
        1
    } else if palette_size <= 4 {
        2
    } else {
        4
    }
}

/// Expand packed RGB triples into opaque RGBA.
///
/// `dst` must hold `src.len() / 3 * 4` bytes.
pub fn expand_pixels(src: &[u8], dst: &mut [u8]) {
    for (rgb, rgba) in src
        .chunks_exact(CPIXEL_BYTES)
        .zip(dst.chunks_exact_mut(RGBA_BYTES))
    {
        rgba[..3].copy_from_slice(rgb);
        rgba[3] = 0xFF;
    }
}

/// Byte cursor over one rectangle's decompressed data.
pub struct TileCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TileCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn exhausted(&self, needed: usize) -> DecodeError {
        DecodeError::StreamExhausted {
            needed,
            available: self.remaining(),
        }
    }

    /// Look at the current byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.data.get(self.pos).copied().ok_or_else(|| self.exhausted(1))
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_exact(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if count > self.remaining() {
            return Err(self.exhausted(count));
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub fn skip(&mut self, count: usize) -> Result<(), DecodeError> {
        self.read_exact(count).map(|_| ())
    }

    /// Read one 3-byte pixel as opaque RGBA.
    pub fn read_pixel(&mut self) -> Result<[u8; 4], DecodeError> {
        let rgb = self.read_exact(CPIXEL_BYTES)?;
        Ok([rgb[0], rgb[1], rgb[2], 0xFF])
    }

    /// Read a run length: the sum of bytes up to and including the first one
    /// below 255, plus one.
    pub fn read_run_length(&mut self) -> Result<usize, DecodeError> {
        let mut length = 1usize;
        loop {
            let byte = self.read_u8()?;
            length += byte as usize;
            if byte != 255 {
                return Ok(length);
            }
        }
    }
}

/// Reusable buffers for one tile: RGBA output and palette.
pub struct TileScratch {
    pixels: Vec<u8>,
    palette: Vec<[u8; 4]>,
}

impl Default for TileScratch {
    fn default() -> Self {
        Self {
            pixels: vec![0u8; MAX_TILE_PIXELS * RGBA_BYTES],
            palette: Vec::with_capacity(MAX_PALETTE_SIZE),
        }
    }
}

impl TileScratch {
    /// The decoded RGBA pixels of a `width` x `height` tile.
    pub fn image(&self, width: u32, height: u32) -> &[u8] {
        &self.pixels[..width as usize * height as usize * RGBA_BYTES]
    }

    fn load_palette(
        &mut self,
        cursor: &mut TileCursor<'_>,
        size: usize,
    ) -> Result<(), DecodeError> {
        self.palette.clear();
        for _ in 0..size {
            self.palette.push(cursor.read_pixel()?);
        }
        Ok(())
    }
}

/// Result of decoding a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutput {
    /// The whole tile is one color; the sink can fill instead of blitting.
    Fill([u8; 3]),
    /// The tile's RGBA pixels are in [`TileScratch::image`].
    Image,
}

/// Decode one `width` x `height` tile whose selector has already been read.
pub fn decode_tile(
    cursor: &mut TileCursor<'_>,
    subencoding: Subencoding,
    width: u32,
    height: u32,
    scratch: &mut TileScratch,
) -> Result<TileOutput, DecodeError> {
    let tile_pixels = width as usize * height as usize;
    debug_assert!(tile_pixels <= MAX_TILE_PIXELS);

    match subencoding {
        Subencoding::Raw => {
            let src = cursor.read_exact(tile_pixels * CPIXEL_BYTES)?;
            expand_pixels(src, &mut scratch.pixels[..tile_pixels * RGBA_BYTES]);
            Ok(TileOutput::Image)
        }
        Subencoding::Solid => {
            let [r, g, b, _] = cursor.read_pixel()?;
            Ok(TileOutput::Fill([r, g, b]))
        }
        Subencoding::Palette(size) => {
            scratch.load_palette(cursor, size as usize)?;
            unpack_palette_indices(
                cursor,
                &scratch.palette,
                width as usize,
                height as usize,
                &mut scratch.pixels,
            )?;
            Ok(TileOutput::Image)
        }
        Subencoding::Rle => {
            decode_plain_rle(cursor, tile_pixels, &mut scratch.pixels)?;
            Ok(TileOutput::Image)
        }
        Subencoding::RlePalette(size) => {
            scratch.load_palette(cursor, size as usize)?;
            decode_palette_rle(cursor, &scratch.palette, tile_pixels, &mut scratch.pixels)?;
            Ok(TileOutput::Image)
        }
    }
}

/// Unpack MSB-first palette indices, one byte-aligned row at a time.
fn unpack_palette_indices(
    cursor: &mut TileCursor<'_>,
    palette: &[[u8; 4]],
    width: usize,
    height: usize,
    out: &mut [u8],
) -> Result<(), DecodeError> {
    let bits = bits_per_index(palette.len()) as i32;
    let mask = (1u8 << bits) - 1;
    let initial_shift = 8 - bits;

    let mut offset = 0;
    for _ in 0..height {
        let mut shift = initial_shift;
        for _ in 0..width {
            let encoded = cursor.peek_u8()?;
            let index = ((encoded >> shift) & mask) as usize;
            let color = palette
                .get(index)
                .ok_or(DecodeError::InvalidPaletteIndex {
                    index,
                    palette_size: palette.len(),
                })?;
            out[offset..offset + RGBA_BYTES].copy_from_slice(color);
            offset += RGBA_BYTES;

            shift -= bits;
            if shift < 0 {
                shift = initial_shift;
                cursor.skip(1)?;
            }
        }
        // Partially used trailing byte: the next row starts on a fresh byte.
        if shift != initial_shift {
            cursor.skip(1)?;
        }
    }
    Ok(())
}

fn fill_run(out: &mut [u8], start: usize, run: usize, color: &[u8; 4]) {
    for px in out[start * RGBA_BYTES..(start + run) * RGBA_BYTES].chunks_exact_mut(RGBA_BYTES) {
        px.copy_from_slice(color);
    }
}

fn check_run(produced: usize, run: usize, tile_pixels: usize) -> Result<(), DecodeError> {
    if produced + run > tile_pixels {
        return Err(DecodeError::InvalidRunLength {
            run,
            remaining: tile_pixels - produced,
        });
    }
    Ok(())
}

fn decode_plain_rle(
    cursor: &mut TileCursor<'_>,
    tile_pixels: usize,
    out: &mut [u8],
) -> Result<(), DecodeError> {
    let mut produced = 0;
    while produced < tile_pixels {
        let color = cursor.read_pixel()?;
        let run = cursor.read_run_length()?;
        check_run(produced, run, tile_pixels)?;
        fill_run(out, produced, run, &color);
        produced += run;
    }
    Ok(())
}

fn decode_palette_rle(
    cursor: &mut TileCursor<'_>,
    palette: &[[u8; 4]],
    tile_pixels: usize,
    out: &mut [u8],
) -> Result<(), DecodeError> {
    let mut produced = 0;
    while produced < tile_pixels {
        let code = cursor.read_u8()?;
        let (index, run) = if code >= 128 {
            ((code - 128) as usize, cursor.read_run_length()?)
        } else {
            (code as usize, 1)
        };

        if index >= palette.len() {
            return Err(DecodeError::InvalidPaletteIndex {
                index,
                palette_size: palette.len(),
            });
        }
        check_run(produced, run, tile_pixels)?;

        fill_run(out, produced, run, &palette[index]);
        produced += run;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pixels(scratch: &TileScratch, w: u32, h: u32) -> Vec<[u8; 4]> {
        scratch
            .image(w, h)
            .chunks_exact(4)
            .map(|p| [p[0], p[1], p[2], p[3]])
            .collect()
    }

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn test_selector_ranges() {
        assert_eq!(Subencoding::from_selector(0).unwrap(), Subencoding::Raw);
        assert_eq!(Subencoding::from_selector(1).unwrap(), Subencoding::Solid);
        assert_eq!(Subencoding::from_selector(2).unwrap(), Subencoding::Palette(2));
        assert_eq!(Subencoding::from_selector(16).unwrap(), Subencoding::Palette(16));
        assert_eq!(Subencoding::from_selector(128).unwrap(), Subencoding::Rle);
        assert_eq!(Subencoding::from_selector(130).unwrap(), Subencoding::RlePalette(2));
        assert_eq!(Subencoding::from_selector(255).unwrap(), Subencoding::RlePalette(127));

        for invalid in [17u8, 64, 127, 129] {
            assert!(matches!(
                Subencoding::from_selector(invalid),
                Err(DecodeError::InvalidSubencoding(s)) if s == invalid
            ));
        }
    }

    #[test]
    fn test_run_length_varint() {
        let mut cursor = TileCursor::new(&[255, 255, 10]);
        assert_eq!(cursor.read_run_length().unwrap(), 521);
        assert_eq!(cursor.remaining(), 0);

        let mut cursor = TileCursor::new(&[5]);
        assert_eq!(cursor.read_run_length().unwrap(), 6);

        let mut cursor = TileCursor::new(&[0]);
        assert_eq!(cursor.read_run_length().unwrap(), 1);
    }

    #[test]
    fn test_run_length_truncated() {
        let mut cursor = TileCursor::new(&[255, 255]);
        assert!(matches!(
            cursor.read_run_length(),
            Err(DecodeError::StreamExhausted { needed: 1, available: 0 })
        ));
    }

    #[test]
    fn test_expand_pixels() {
        let mut out = [0u8; 8];
        expand_pixels(&[10, 20, 30, 40, 50, 60], &mut out);
        assert_eq!(out, [10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_raw_tile() {
        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&[10, 20, 30]);

        let output = decode_tile(&mut cursor, Subencoding::Raw, 1, 1, &mut scratch).unwrap();
        assert_eq!(output, TileOutput::Image);
        assert_eq!(scratch.image(1, 1), &[10, 20, 30, 255]);
    }

    #[test]
    fn test_solid_tile() {
        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&[1, 2, 3, 99]);

        let output = decode_tile(&mut cursor, Subencoding::Solid, 64, 64, &mut scratch).unwrap();
        assert_eq!(output, TileOutput::Fill([1, 2, 3]));
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_packed_palette_row_alignment() {
        // 4 colors -> 2 bits per index, 5 pixels per row -> 2 bytes per row
        let mut data = vec![];
        data.extend_from_slice(&[255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255]);
        data.push(0b00_01_10_11); // red green blue white
        data.push(0b10_00_00_00); // blue, 6 unused bits
        let palette_end = 12;

        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&data);
        decode_tile(&mut cursor, Subencoding::Palette(4), 5, 1, &mut scratch).unwrap();

        assert_eq!(cursor.position(), palette_end + 2);
        assert_eq!(pixels(&scratch, 5, 1), vec![RED, GREEN, BLUE, WHITE, BLUE]);
    }

    #[test]
    fn test_packed_palette_1bit_two_rows() {
        // 9 pixels per row -> 2 bytes per row, 7 bits dropped at each row end
        let mut data = vec![255, 0, 0, 0, 0, 255];
        data.extend_from_slice(&[0b1010_1010, 0b1000_0000]);
        data.extend_from_slice(&[0b0000_0000, 0b0111_1111]);

        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&data);
        decode_tile(&mut cursor, Subencoding::Palette(2), 9, 2, &mut scratch).unwrap();

        assert_eq!(cursor.remaining(), 0);
        let px = pixels(&scratch, 9, 2);
        assert_eq!(px[0], BLUE);
        assert_eq!(px[1], RED);
        assert_eq!(px[8], BLUE);
        // Trailing bits of row 0 must not leak into row 1
        assert!(px[9..].iter().all(|&p| p == RED));
    }

    #[test]
    fn test_packed_palette_4bit_two_rows() {
        // 16 colors -> 4 bits per index, 3 pixels per row -> 2 bytes per row
        let palette: Vec<[u8; 4]> = (0..16u8).map(|i| [i * 16, i, 255 - i, 255]).collect();
        let mut data: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
        data.extend_from_slice(&[0x1F, 0xA0]); // 1 15 10, low nibble unused
        data.extend_from_slice(&[0x23, 0x4F]); // 2 3 4, low nibble unused

        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&data);
        decode_tile(&mut cursor, Subencoding::Palette(16), 3, 2, &mut scratch).unwrap();

        assert_eq!(cursor.position(), 16 * 3 + 4);
        assert_eq!(cursor.remaining(), 0);
        let expected: Vec<[u8; 4]> = [1, 15, 10, 2, 3, 4].iter().map(|&i| palette[i]).collect();
        assert_eq!(pixels(&scratch, 3, 2), expected);
    }

    #[test]
    fn test_packed_palette_4bit_index_past_palette() {
        // 5 colors -> 4 bits; index 7 does not exist
        let mut data = vec![0u8; 5 * 3];
        data.push(0x70);

        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&data);
        assert!(matches!(
            decode_tile(&mut cursor, Subencoding::Palette(5), 1, 1, &mut scratch),
            Err(DecodeError::InvalidPaletteIndex { index: 7, palette_size: 5 })
        ));
    }

    #[test]
    fn test_plain_rle() {
        let data = [255, 0, 0, 4, 0, 0, 255, 3];

        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&data);
        decode_tile(&mut cursor, Subencoding::Rle, 3, 3, &mut scratch).unwrap();

        let px = pixels(&scratch, 3, 3);
        assert!(px[..5].iter().all(|&p| p == RED));
        assert!(px[5..].iter().all(|&p| p == BLUE));
    }

    #[test]
    fn test_plain_rle_overrun() {
        let data = [255, 0, 0, 4];

        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&data);
        assert!(matches!(
            decode_tile(&mut cursor, Subencoding::Rle, 1, 1, &mut scratch),
            Err(DecodeError::InvalidRunLength { run: 5, remaining: 1 })
        ));
    }

    #[test]
    fn test_palette_rle() {
        let data = [
            255, 0, 0, // red
            0, 0, 255, // blue
            0,   // red x1
            0x81, 3, // blue x4
            0,   // red x1
        ];

        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&data);
        decode_tile(&mut cursor, Subencoding::RlePalette(2), 6, 1, &mut scratch).unwrap();

        assert_eq!(
            pixels(&scratch, 6, 1),
            vec![RED, BLUE, BLUE, BLUE, BLUE, RED]
        );
    }

    #[test]
    fn test_palette_rle_index_equal_to_size_rejected() {
        let data = [255, 0, 0, 0, 0, 255, 2];

        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&data);
        assert!(matches!(
            decode_tile(&mut cursor, Subencoding::RlePalette(2), 1, 1, &mut scratch),
            Err(DecodeError::InvalidPaletteIndex { index: 2, palette_size: 2 })
        ));
    }

    #[test]
    fn test_palette_rle_run_overrun() {
        let data = [255, 0, 0, 0, 0, 255, 0x80, 9];

        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&data);
        assert!(matches!(
            decode_tile(&mut cursor, Subencoding::RlePalette(2), 2, 2, &mut scratch),
            Err(DecodeError::InvalidRunLength { run: 10, remaining: 4 })
        ));
    }

    #[test]
    fn test_truncated_raw_tile() {
        let mut scratch = TileScratch::default();
        let mut cursor = TileCursor::new(&[1, 2, 3, 4]);
        assert!(matches!(
            decode_tile(&mut cursor, Subencoding::Raw, 2, 1, &mut scratch),
            Err(DecodeError::StreamExhausted { needed: 6, available: 4 })
        ));
    }
}
