//! Socket-style replay loop.
//!
//! The capture is read in `fragment_size` pieces. After every piece the loop
//! parses as many rectangle headers and bodies as the queue allows, then goes
//! back to reading, the same way a network event loop drives the decoder.

use crate::config::ReplayConfig;
use anyhow::{bail, Context, Result};
use rfb_encodings::{RectDecoder, ZrleDecoder, ENCODING_ZRLE};
use rfb_pixelbuffer::PixelSink;
use rfb_protocol::{RfbInQueue, Rectangle};
use tokio::io::AsyncRead;
use tracing::{debug, info};

/// Totals reported after a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub bytes_read: u64,
    pub reads: u64,
    pub rectangles: u64,
    pub tiles: u64,
    pub solid_tiles: u64,
    pub compressed_bytes: u64,
    pub decompressed_bytes: u64,
}

/// Decode every rectangle in `reader` into `sink`.
pub async fn replay<R: AsyncRead + Unpin>(
    reader: &mut R,
    sink: &mut dyn PixelSink,
    config: &ReplayConfig,
) -> Result<ReplaySummary> {
    config.validate()?;

    let mut queue = RfbInQueue::with_capacity(config.queue_capacity);
    let mut decoder = ZrleDecoder::with_config(config.decoder.clone());
    let mut pending: Option<Rectangle> = None;
    let mut summary = ReplaySummary::default();

    loop {
        let n = queue
            .fill_from(reader, config.fragment_size)
            .await
            .context("Failed to read capture")?;
        if n == 0 {
            break;
        }
        summary.bytes_read += n as u64;
        summary.reads += 1;

        loop {
            if pending.is_none() {
                pending = Rectangle::try_take(&mut queue);
            }
            let Some(rect) = pending else {
                break;
            };
            if rect.encoding != ENCODING_ZRLE {
                bail!(
                    "Rectangle #{} uses encoding {}, only ZRLE ({}) captures are supported",
                    summary.rectangles,
                    rect.encoding,
                    ENCODING_ZRLE
                );
            }

            let done = decoder
                .decode_rect(&rect, 24, &mut queue, sink)
                .with_context(|| {
                    format!("Failed to decode rectangle #{} {:?}", summary.rectangles, rect)
                })?;
            if !done {
                break;
            }

            debug!(
                "Rectangle #{} done: {}x{} at ({}, {})",
                summary.rectangles, rect.width, rect.height, rect.x, rect.y
            );
            pending = None;
            summary.rectangles += 1;
        }
    }

    if let Some(rect) = pending {
        bail!(
            "Capture truncated inside rectangle #{} {:?} ({:?})",
            summary.rectangles,
            rect,
            decoder.state()
        );
    }
    if !queue.is_empty() {
        bail!(
            "Capture truncated: {} bytes of an incomplete rectangle header",
            queue.available()
        );
    }

    let stats = decoder.stats();
    summary.tiles = stats.tiles;
    summary.solid_tiles = stats.solid_tiles;
    summary.compressed_bytes = stats.compressed_bytes;
    summary.decompressed_bytes = stats.decompressed_bytes;

    info!(
        "Replayed {} rectangles ({} tiles, {} solid) from {} bytes in {} reads",
        summary.rectangles, summary.tiles, summary.solid_tiles, summary.bytes_read, summary.reads
    );
    Ok(summary)
}
