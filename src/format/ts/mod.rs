//! # MPEG Transport Stream packetization
//!
//! Turns encoded access units into PES packets and splits those into
//! 188-byte transport packets:
//!
//! - PES optional header codec with 33-bit PTS/DTS
//! - PES packet construction for ADTS AAC and Annex-B H.264
//! - Segmentation into TS packets with adaptation-field stuffing and PCR
//! - PAT/PMT sections with CRC32
//! - A stateful [`TSWriter`] handling continuity counters and PCR/PSI timing
//! - An async [`TSMuxer`] writing into any `AsyncWrite`
//!
//! ## Example Usage
//!
//! ### Segmenting a PES packet
//!
//! ```rust
//! use std::time::Duration;
//! use tsmux::codec::AudioSpecificConfig;
//! use tsmux::format::ts::{PESPacket, TS_PACKET_SIZE};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AudioSpecificConfig::default();
//! let pes = PESPacket::from_audio(&[0u8; 400], &config, Some(Duration::ZERO), Duration::ZERO)?;
//!
//! let packets = pes.to_ts_packets(0x101, None);
//! assert_eq!(packets.len(), 3);
//! assert!(packets.iter().all(|p| p.to_bytes().len() == TS_PACKET_SIZE));
//! # Ok(())
//! # }
//! ```
//!
//! ### Writing a program
//!
//! ```rust
//! use std::time::Duration;
//! use tsmux::av::{AccessUnit, CodecConfig};
//! use tsmux::codec::AudioSpecificConfig;
//! use tsmux::config::{Config, ExpectedMedia};
//! use tsmux::format::ts::{TSWriter, TS_PACKET_SIZE};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = TSWriter::with_config(Config {
//!     expected_media: ExpectedMedia::Audio,
//!     ..Config::default()
//! });
//! writer.set_audio_config(AudioSpecificConfig::default());
//!
//! let unit = AccessUnit::audio(vec![0x21; 64]).with_pts(Duration::from_millis(40));
//! let out = writer.write_sample(unit)?;
//!
//! // PAT, PMT, then the audio packet
//! assert_eq!(out.len(), 3 * TS_PACKET_SIZE);
//! # Ok(())
//! # }
//! ```

/// Adaptation field codec
pub mod adaptation;

/// 90 kHz timestamps and PCR
pub mod clock;

/// PES reassembly from transport packets
pub mod demuxer;

/// Async muxer over [`TSWriter`]
pub mod muxer;

/// 188-byte transport packet
pub mod packet;

/// PES optional header and packet builder
pub mod pes;

/// PAT/PMT sections
pub mod psi;

/// PES to TS segmentation
pub mod segment;

/// Core TS types and constants
pub mod types;

/// Per-program packet writer
pub mod writer;

pub use adaptation::AdaptationField;
pub use clock::ProgramClockReference;
pub use demuxer::{demux, PESAssembler};
pub use muxer::TSMuxer;
pub use packet::{split_packets, TSPacket, MAX_FILL};
pub use pes::{has_optional_header, PESOptionalHeader, PESPacket, PTSDTSIndicator};
pub use segment::segment;
pub use types::{
    TSHeader, DEFAULT_AUDIO_PID, DEFAULT_PMT_PID, DEFAULT_VIDEO_PID, PID_PAT, STREAM_ID_AAC,
    STREAM_ID_H264, STREAM_TYPE_AAC, STREAM_TYPE_H264, TS_PACKET_SIZE,
};
pub use writer::TSWriter;

#[cfg(test)]
mod tests;
