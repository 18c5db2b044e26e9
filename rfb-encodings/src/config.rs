//! Decoder tuning knobs.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a [`ZrleDecoder`](crate::ZrleDecoder).
///
/// Every field has a default, so a partial `[decoder]` table is enough.
///
/// ```
/// # use rfb_encodings::DecoderConfig;
/// let config = DecoderConfig {
///     inflate_chunk_size: 16 * 1024,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Bytes the decompressed buffer grows by when the size hint is exceeded.
    pub inflate_chunk_size: usize,
    /// Extra bytes per tile added to the `width * height * 3` size hint.
    pub tile_margin_bytes: usize,
    /// Log a warning when decompressed bytes remain after the last tile.
    pub warn_on_trailing_data: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            inflate_chunk_size: 64 * 1024,
            tile_margin_bytes: 1,
            warn_on_trailing_data: true,
        }
    }
}

impl DecoderConfig {
    /// Reject settings the decoder cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.inflate_chunk_size == 0 {
            bail!("inflate_chunk_size must be greater than zero");
        }
        Ok(())
    }
}
