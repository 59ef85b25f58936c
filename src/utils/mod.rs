//! # Utility Functions and Types
//!
//! Bit-level helpers and the MPEG-2 CRC32 used by the transport stream
//! writer.
//!
//! ## Bit Operations
//!
//! ```rust
//! use tsmux::utils::BitReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = vec![0b10110011u8];
//! let mut reader = BitReader::new(&data);
//!
//! // Read specific number of bits
//! let value = reader.read_bits(3)?; // Reads first 3 bits (101)
//! assert_eq!(value, 0b101);
//! # Ok(())
//! # }
//! ```
//!
//! ## CRC Calculation
//!
//! ```rust
//! use tsmux::utils::Crc32Mpeg2;
//!
//! # fn main() {
//! let crc = Crc32Mpeg2::new();
//! println!("CRC32: {:08x}", crc.calculate(b"Hello, world!"));
//! # }
//! ```

/// Bitstream reading and writing
pub mod bits;

/// CRC calculation implementations
pub mod crc;

pub use bits::{BitReader, BitWriter};
pub use crc::Crc32Mpeg2;
