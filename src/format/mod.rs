//! Container formats.

/// MPEG-2 Transport Stream
pub mod ts;

pub use self::ts::{TSMuxer, TSWriter};
