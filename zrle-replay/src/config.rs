//! Configuration for the replay tool.

use anyhow::{bail, Context, Result};
use rfb_encodings::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Replay settings, loadable from TOML.
///
/// ```toml
/// fragment_size = 512
///
/// [decoder]
/// inflate_chunk_size = 32768
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Bytes handed to the decoder per simulated socket read.
    #[serde(default = "default_fragment_size")]
    pub fragment_size: usize,
    /// Initial capacity of the receive queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Decoder tuning.
    #[serde(default)]
    pub decoder: DecoderConfig,
}

fn default_fragment_size() -> usize {
    1460 // one Ethernet MSS
}

fn default_queue_capacity() -> usize {
    8192
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            fragment_size: default_fragment_size(),
            queue_capacity: default_queue_capacity(),
            decoder: DecoderConfig::default(),
        }
    }
}

impl ReplayConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Invalid replay configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("In config file {}", path.display()))
    }

    /// Reject settings the replay cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.fragment_size == 0 {
            bail!("fragment_size must be greater than zero");
        }
        self.decoder.validate()
    }
}
