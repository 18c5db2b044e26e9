//! Offline driver for the ZRLE decoder.
//!
//! Replays a capture of framebuffer-update rectangles through
//! [`rfb_encodings::ZrleDecoder`] in socket-sized fragments and collects the
//! result in a [`rfb_pixelbuffer::ManagedPixelBuffer`].

pub mod args;
pub mod config;
pub mod replay;

pub use config::ReplayConfig;
pub use replay::{replay, ReplaySummary};
