//! Streaming zlib inflation for ZRLE payloads.
//!
//! ZRLE uses ONE continuous zlib stream for the whole connection. Only the
//! first rectangle carries the zlib header (0x78); every later rectangle is
//! deflate continuation data that the server ends with a sync flush. The
//! inflater state therefore lives as long as the connection and is only reset
//! when the connection is re-established.

use crate::DecodeError;
use bytes::Bytes;
use flate2::{Decompress, FlushDecompress, Status};

/// An inflate engine fed one compressed payload at a time.
pub trait Inflate {
    /// Queue the compressed payload of the next rectangle.
    fn set_input(&mut self, compressed: Bytes);

    /// Inflate all queued input, appending the output to `out`.
    ///
    /// `size_hint` is how much output the caller expects. It is neither a
    /// limit nor trusted for allocation: at most one growth chunk is reserved
    /// up front and the engine keeps producing until its input is exhausted.
    /// Returns the number of bytes appended.
    fn inflate(&mut self, size_hint: usize, out: &mut Vec<u8>) -> Result<usize, DecodeError>;

    /// Discard the stream state; the next input must start with a zlib header.
    fn reset(&mut self);
}

/// [`Inflate`] implementation backed by `flate2`.
pub struct ZlibInflator {
    inner: Decompress,
    input: Bytes,
    chunk_size: usize,
}

impl Default for ZlibInflator {
    fn default() -> Self {
        Self::new(64 * 1024)
    }
}

impl ZlibInflator {
    /// Create an inflater expecting a zlib header, growing its output by
    /// `chunk_size` bytes whenever the size hint turns out too small.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            inner: Decompress::new(true), // true = zlib wrapper
            input: Bytes::new(),
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Inflate for ZlibInflator {
    fn set_input(&mut self, compressed: Bytes) {
        if !self.input.is_empty() {
            tracing::warn!("ZRLE: discarding {} unconsumed compressed bytes", self.input.len());
        }
        self.input = compressed;
    }

    fn inflate(&mut self, size_hint: usize, out: &mut Vec<u8>) -> Result<usize, DecodeError> {
        let start = out.len();
        // The hint comes from wire-supplied dimensions; only the deflate
        // output itself may drive large allocations.
        out.reserve(size_hint.min(self.chunk_size));

        let mut in_pos = 0;
        loop {
            if out.len() == out.capacity() {
                out.reserve(self.chunk_size);
            }

            let before_in = self.inner.total_in();
            let before_out = self.inner.total_out();

            let status =
                self.inner
                    .decompress_vec(&self.input[in_pos..], out, FlushDecompress::Sync)?;

            let consumed = (self.inner.total_in() - before_in) as usize;
            let produced = (self.inner.total_out() - before_out) as usize;
            in_pos += consumed;

            if status == Status::StreamEnd {
                if in_pos < self.input.len() {
                    tracing::warn!(
                        "ZRLE: zlib stream ended early, consumed {}/{} bytes",
                        in_pos,
                        self.input.len()
                    );
                }
                break;
            }

            // A call that left spare output room has flushed everything it
            // could from the input seen so far.
            let has_room = out.len() < out.capacity();
            let input_done = in_pos >= self.input.len();
            if has_room && input_done {
                break;
            }
            if has_room && consumed == 0 && produced == 0 {
                tracing::warn!(
                    "ZRLE: inflater stalled with {} compressed bytes left",
                    self.input.len() - in_pos
                );
                break;
            }
        }

        self.input = Bytes::new();

        let appended = out.len() - start;
        tracing::trace!("ZRLE: inflated {} bytes (hint {})", appended, size_hint);
        Ok(appended)
    }

    fn reset(&mut self) {
        self.inner.reset(true);
        self.input = Bytes::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compress, Compression, FlushCompress};

    fn compress_sync(compressor: &mut Compress, data: &[u8]) -> Bytes {
        let mut out = Vec::with_capacity(data.len() + 128);
        let mut pos = 0;
        loop {
            let before = compressor.total_in();
            compressor
                .compress_vec(&data[pos..], &mut out, FlushCompress::Sync)
                .unwrap();
            pos += (compressor.total_in() - before) as usize;
            if pos == data.len() && out.len() < out.capacity() {
                break;
            }
            out.reserve(1024);
        }
        Bytes::from(out)
    }

    #[test]
    fn test_inflate_single_payload() {
        let mut compressor = Compress::new(Compression::default(), true);
        let payload = b"hello zrle".repeat(10);

        let mut inflator = ZlibInflator::default();
        inflator.set_input(compress_sync(&mut compressor, &payload));

        let mut out = Vec::new();
        let n = inflator.inflate(payload.len(), &mut out).unwrap();
        assert_eq!(n, payload.len());
        assert_eq!(out, payload);
    }

    #[test]
    fn test_stream_continues_across_payloads() {
        let mut compressor = Compress::new(Compression::default(), true);
        let mut inflator = ZlibInflator::default();

        for round in 0..3u8 {
            let payload = vec![round; 500];
            inflator.set_input(compress_sync(&mut compressor, &payload));

            let mut out = Vec::new();
            inflator.inflate(payload.len(), &mut out).unwrap();
            assert_eq!(out, payload, "round {}", round);
        }
    }

    #[test]
    fn test_output_grows_past_hint() {
        let mut compressor = Compress::new(Compression::default(), true);
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

        // Tiny chunk size forces many growth steps.
        let mut inflator = ZlibInflator::new(16);
        inflator.set_input(compress_sync(&mut compressor, &payload));

        let mut out = Vec::new();
        inflator.inflate(10, &mut out).unwrap();
        assert_eq!(out.len(), payload.len());
        assert_eq!(out, payload);
    }

    #[test]
    fn test_huge_hint_is_not_preallocated() {
        let mut compressor = Compress::new(Compression::default(), true);
        let mut inflator = ZlibInflator::new(1024);
        inflator.set_input(compress_sync(&mut compressor, &[17]));

        let mut out = Vec::new();
        assert_eq!(inflator.inflate(usize::MAX / 2, &mut out).unwrap(), 1);
        assert_eq!(out, [17]);
        assert!(out.capacity() <= 1024);
    }

    #[test]
    fn test_corrupt_stream_is_error() {
        let mut inflator = ZlibInflator::default();
        inflator.set_input(Bytes::from_static(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF]));

        let mut out = Vec::new();
        assert!(matches!(
            inflator.inflate(16, &mut out),
            Err(DecodeError::Inflate(_))
        ));
    }

    #[test]
    fn test_reset_expects_new_header() {
        let mut inflator = ZlibInflator::default();
        let mut out = Vec::new();

        let mut first = Compress::new(Compression::default(), true);
        inflator.set_input(compress_sync(&mut first, b"abc"));
        inflator.inflate(3, &mut out).unwrap();

        inflator.reset();
        assert_eq!(inflator.inner.total_in(), 0);

        let mut second = Compress::new(Compression::default(), true);
        out.clear();
        inflator.set_input(compress_sync(&mut second, b"xyz"));
        inflator.inflate(3, &mut out).unwrap();
        assert_eq!(out, b"xyz");
    }
}
