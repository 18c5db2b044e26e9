//! RFB protocol message types.
//!
//! Only the parts of the server-to-client stream that frame encoded rectangles
//! live here. The encoding-specific payload that follows each rectangle header
//! is consumed by the decoders in `rfb-encodings`.
//!
//! # Wire Format Rules
//!
//! 1. **Big-endian byte order** - All multi-byte integers use network byte order
//! 2. **Non-blocking parsing** - Parsers consume nothing unless the whole item is queued

pub mod types;

pub use types::Rectangle;
