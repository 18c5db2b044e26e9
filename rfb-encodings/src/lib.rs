//! Core decoding interfaces for RFB (VNC) encodings.
//!
//! This crate defines the [`RectDecoder`] trait and its ZRLE implementation,
//! [`ZrleDecoder`]. A decoder reads a single framebuffer update rectangle from
//! a non-blocking [`ByteSource`], and hands the decoded pixels to a
//! [`PixelSink`].
//!
//! # Key Concepts
//!
//! - **Resumable decoding**: Decoders never block. If the source does not hold
//!   the whole rectangle yet they return `Ok(false)` and pick up where they left
//!   off on the next call
//! - **Rectangle-based**: Decoders operate on a single rectangle at a time
//! - **Fail-fast policy**: Malformed data is a [`DecodeError`]; there are no
//!   defensive fallbacks
//! - **Encoding types**: Each decoder handles one RFB encoding type (i32 identifier)
//!
//! # Example
//!
//! ```
//! use rfb_encodings::{ByteSource, DecodeError, PixelSink, RectDecoder, Rectangle, ENCODING_RAW};
//!
//! struct NoopDecoder;
//!
//! impl RectDecoder for NoopDecoder {
//!     fn encoding_type(&self) -> i32 {
//!         ENCODING_RAW
//!     }
//!
//!     fn decode_rect(
//!         &mut self,
//!         _rect: &Rectangle,
//!         _depth: u8,
//!         _source: &mut dyn ByteSource,
//!         _sink: &mut dyn PixelSink,
//!     ) -> Result<bool, DecodeError> {
//!         // A real implementation would read from source and write into sink
//!         Ok(true)
//!     }
//! }
//! ```

pub use rfb_common::Rect;
pub use rfb_pixelbuffer::PixelSink;
pub use rfb_protocol::{ByteSource, Rectangle, ENCODING_RAW, ENCODING_ZRLE};

pub mod config;
pub use config::DecoderConfig;

pub mod error;
pub use error::DecodeError;

pub mod inflate;
pub use inflate::{Inflate, ZlibInflator};

pub mod tile;

pub mod zrle;
pub use zrle::{DecodeState, ZrleDecoder, ZrleStats};

/// Core trait for RFB rectangle decoders.
///
/// # Contract
///
/// Implementors must:
/// - Consume exactly the bytes of the rectangle as defined by their encoding
/// - Return `Ok(false)` without losing data when the source runs short
/// - Deliver pixels only through the sink
/// - Fail fast with a [`DecodeError`] on malformed input
pub trait RectDecoder {
    /// Returns the RFB encoding type this decoder handles.
    fn encoding_type(&self) -> i32;

    /// Decode (or continue decoding) `rect` from `source` into `sink`.
    ///
    /// `depth` is the negotiated pixel depth; decoders with a fixed source
    /// pixel layout may ignore it.
    ///
    /// Returns `Ok(true)` once the rectangle is complete and `Ok(false)` if
    /// more input is needed, in which case the call must be repeated with the
    /// same `rect` after more bytes arrive.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoded data is malformed or the sink rejects
    /// the pixels. The rectangle is abandoned.
    fn decode_rect(
        &mut self,
        rect: &Rectangle,
        depth: u8,
        source: &mut dyn ByteSource,
        sink: &mut dyn PixelSink,
    ) -> Result<bool, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopDecoder;

    impl RectDecoder for NoopDecoder {
        fn encoding_type(&self) -> i32 {
            ENCODING_RAW
        }

        fn decode_rect(
            &mut self,
            _rect: &Rectangle,
            _depth: u8,
            _source: &mut dyn ByteSource,
            _sink: &mut dyn PixelSink,
        ) -> Result<bool, DecodeError> {
            Ok(true)
        }
    }

    #[test]
    fn test_trait_can_be_implemented() {
        let decoder = NoopDecoder;
        assert_eq!(decoder.encoding_type(), ENCODING_RAW);
    }

    #[test]
    fn test_encoding_constants() {
        assert_eq!(ENCODING_RAW, 0);
        assert_eq!(ENCODING_ZRLE, 16);
    }

    #[test]
    fn test_decoders_are_object_safe() {
        let mut decoders: Vec<Box<dyn RectDecoder>> = Vec::new();
        decoders.push(Box::new(NoopDecoder));
        decoders.push(Box::new(ZrleDecoder::new()));
        let types: Vec<i32> = decoders.iter().map(|d| d.encoding_type()).collect();
        assert_eq!(types, vec![ENCODING_RAW, ENCODING_ZRLE]);
    }
}
