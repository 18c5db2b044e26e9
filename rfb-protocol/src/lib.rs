//! RFB (Remote Framebuffer) protocol plumbing for the decoding stack.
//!
//! # Modules
//!
//! - [`io`] - Non-blocking receive queue ([`RfbInQueue`]) and the [`ByteSource`] trait
//! - [`messages`] - Rectangle headers and encoding constants
//!
//! # Examples
//!
//! ```
//! use rfb_protocol::{RfbInQueue, Rectangle};
//!
//! let mut queue = RfbInQueue::new();
//! queue.push(&[0, 0, 0, 0, 0, 64]); // first half of a header
//! assert!(Rectangle::try_take(&mut queue).is_none());
//! assert_eq!(queue.available(), 6);
//! ```

pub mod io;
pub mod messages;

// Re-export commonly used types
pub use io::{ByteSource, RfbInQueue};
pub use messages::types::{ENCODING_RAW, ENCODING_ZRLE};
pub use messages::Rectangle;
