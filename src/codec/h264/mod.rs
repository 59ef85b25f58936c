//! # H.264/AVC framing
//!
//! Encoders hand over access units in AVCC form (each NAL unit prefixed with
//! its length) together with an `avcC` configuration record. MPEG-TS wants
//! Annex-B: start-code-prefixed NAL units, with the parameter sets repeated
//! in-band on every random-access point.
//!
//! ```rust
//! use tsmux::codec::h264::{to_annex_b, START_CODE};
//!
//! let avcc = [0x00, 0x00, 0x00, 0x02, 0x65, 0x88];
//! let annex_b = to_annex_b(&avcc, 4);
//! assert_eq!(&annex_b[..4], &START_CODE);
//! ```

/// `avcC` parsing and AVCC → Annex-B conversion
pub mod parser;
/// NAL unit and configuration record types
pub mod types;

#[doc(inline)]
pub use parser::*;
#[doc(inline)]
pub use types::*;
