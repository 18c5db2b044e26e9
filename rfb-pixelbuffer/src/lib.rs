//! RFB pixel sinks.
//!
//! This crate defines where decoded pixels go: the [`PixelSink`] trait and an
//! owned RGBA framebuffer, [`ManagedPixelBuffer`], that implements it.

pub mod buffer;
pub mod managed;

pub use buffer::{PixelSink, RGBA_BYTES_PER_PIXEL};
pub use managed::ManagedPixelBuffer;
