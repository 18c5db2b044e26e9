//! Core RFB types shared by framing and decoders.
//!
//! - [`Rectangle`] - Rectangle header with encoding type
//! - Encoding constants for the encodings this stack understands

use crate::io::ByteSource;
use bytes::{BufMut, BytesMut};
use rfb_common::Rect;

/// Rectangle header for framebuffer updates.
///
/// Describes a rectangular region of the screen along with the encoding
/// type used for its pixel data.
///
/// # Wire Format
///
/// Rectangle header is 12 bytes:
/// - 2 bytes: x position
/// - 2 bytes: y position
/// - 2 bytes: width
/// - 2 bytes: height
/// - 4 bytes: encoding type (signed i32)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub encoding: i32,
}

impl Rectangle {
    /// Size of the header on the wire.
    pub const WIRE_SIZE: usize = 12;

    /// Take a header from `source` if all 12 bytes are queued.
    ///
    /// Returns `None` and consumes nothing when the header is incomplete.
    pub fn try_take(source: &mut dyn ByteSource) -> Option<Self> {
        if !source.has_at_least(Self::WIRE_SIZE) {
            return None;
        }
        Some(Self {
            x: source.take_u16_be(),
            y: source.take_u16_be(),
            width: source.take_u16_be(),
            height: source.take_u16_be(),
            encoding: source.take_i32_be(),
        })
    }

    /// Append the 12-byte header to `out`.
    pub fn write_to(&self, out: &mut BytesMut) {
        out.put_u16(self.x);
        out.put_u16(self.y);
        out.put_u16(self.width);
        out.put_u16(self.height);
        out.put_i32(self.encoding);
    }

    /// The destination area covered by this rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.x as i32,
            self.y as i32,
            self.width as u32,
            self.height as u32,
        )
    }
}

//
// Encoding type constants
//

/// Raw encoding - uncompressed pixel data.
pub const ENCODING_RAW: i32 = 0;

/// ZRLE (Zlib Run-Length Encoding).
pub const ENCODING_ZRLE: i32 = 16;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RfbInQueue;

    #[test]
    fn test_rectangle_round_trip() {
        let original = Rectangle {
            x: 100,
            y: 200,
            width: 640,
            height: 480,
            encoding: ENCODING_ZRLE,
        };

        let mut wire = BytesMut::new();
        original.write_to(&mut wire);
        assert_eq!(wire.len(), Rectangle::WIRE_SIZE);

        let mut queue = RfbInQueue::new();
        queue.push(&wire);
        assert_eq!(Rectangle::try_take(&mut queue), Some(original));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_rectangle_partial_header_consumes_nothing() {
        let mut queue = RfbInQueue::new();
        queue.push(&[0, 1, 0, 2, 0, 3]);

        assert_eq!(Rectangle::try_take(&mut queue), None);
        assert_eq!(queue.available(), 6);

        queue.push(&[0, 4, 0xFF, 0xFF, 0xFF, 0xFF]);
        let rect = Rectangle::try_take(&mut queue).unwrap();
        assert_eq!(rect.encoding, -1);
        assert_eq!(rect.rect(), Rect::new(1, 2, 3, 4));
    }
}
