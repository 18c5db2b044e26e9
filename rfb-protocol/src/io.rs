//! Non-blocking receive queue for RFB protocol data.
//!
//! Socket reads never guarantee that a whole message (or a whole rectangle) has
//! arrived. [`RfbInQueue`] accumulates whatever fragments the transport delivers
//! and lets decoders check for availability before consuming, so a decoder can
//! report "need more data" and be re-invoked later without losing bytes.
//!
//! # Examples
//!
//! ```
//! use rfb_protocol::io::{ByteSource, RfbInQueue};
//!
//! let mut queue = RfbInQueue::new();
//! queue.push(&[0x00, 0x00]);
//! assert!(!queue.has_at_least(4)); // only half of a u32 so far
//!
//! queue.push(&[0x01, 0x00]);
//! assert!(queue.has_at_least(4));
//! assert_eq!(queue.take_u32_be(), 256);
//! ```

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// A source of bytes that may not yet hold everything a decoder needs.
///
/// Availability checks never consume. The `take_*` methods consume exactly the
/// requested number of bytes and must only be called after a successful
/// [`has_at_least`](Self::has_at_least) check; calling them without enough data
/// is a programming error and panics.
pub trait ByteSource {
    /// Returns true if at least `n` bytes can be taken right now.
    fn has_at_least(&self, n: usize) -> bool;

    /// Consume a single byte.
    fn take_u8(&mut self) -> u8;

    /// Consume a 16-bit unsigned integer in network byte order.
    fn take_u16_be(&mut self) -> u16;

    /// Consume a 32-bit unsigned integer in network byte order.
    fn take_u32_be(&mut self) -> u32;

    /// Consume a 32-bit signed integer in network byte order.
    fn take_i32_be(&mut self) -> i32;

    /// Consume exactly `n` bytes.
    fn take_bytes(&mut self, n: usize) -> Bytes;
}

/// Buffered receive queue fed by the transport and drained by decoders.
///
/// Data can be pushed directly ([`push`](Self::push)) by an event loop that
/// already owns the socket bytes, or read from any tokio [`AsyncRead`] with
/// [`fill_from`](Self::fill_from).
#[derive(Debug, Default)]
pub struct RfbInQueue {
    buffer: BytesMut,
}

impl RfbInQueue {
    /// Create an empty queue with default capacity (8KB).
    pub fn new() -> Self {
        Self::with_capacity(8192)
    }

    /// Create an empty queue with the given initial capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a received fragment.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Perform a single read from `reader` into the queue.
    ///
    /// Returns the number of bytes appended; zero means the reader hit EOF.
    /// At most `max` bytes are read, which lets callers control the fragment
    /// size the decoder observes.
    pub async fn fill_from<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
        max: usize,
    ) -> std::io::Result<usize> {
        let mut limited = reader.take(max as u64);
        limited.read_buf(&mut self.buffer).await
    }

    /// Number of bytes currently queued.
    pub fn available(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn expect_available(&self, n: usize) {
        assert!(
            self.buffer.len() >= n,
            "RfbInQueue: take of {} bytes with only {} queued",
            n,
            self.buffer.len()
        );
    }
}

impl ByteSource for RfbInQueue {
    fn has_at_least(&self, n: usize) -> bool {
        self.buffer.len() >= n
    }

    fn take_u8(&mut self) -> u8 {
        self.expect_available(1);
        self.buffer.get_u8()
    }

    fn take_u16_be(&mut self) -> u16 {
        self.expect_available(2);
        self.buffer.get_u16()
    }

    fn take_u32_be(&mut self) -> u32 {
        self.expect_available(4);
        self.buffer.get_u32()
    }

    fn take_i32_be(&mut self) -> i32 {
        self.expect_available(4);
        self.buffer.get_i32()
    }

    fn take_bytes(&mut self, n: usize) -> Bytes {
        self.expect_available(n);
        self.buffer.split_to(n).freeze()
    }
}
