#![doc(html_root_url = "https://docs.rs/tsmux/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::missing_crate_level_docs)]

//! # tsmux - MPEG-2 Transport Stream packetizer
//!
//! `tsmux` turns encoded H.264 and AAC access units into a live MPEG-2
//! Transport Stream: each unit becomes one PES packet, which is split into
//! 188-byte TS packets ready to be written to a byte-stream connection.
//!
//! ## Features
//!
//! ### Codec framing
//! - AAC: ADTS headers synthesized from the AudioSpecificConfig
//! - H.264: AVCC to Annex-B conversion, access unit delimiters, in-band
//!   SPS/PPS on random-access points
//!
//! ### Transport Stream
//! - PES optional header with 33-bit PTS/DTS
//! - Segmentation with adaptation-field stuffing and PCR
//! - PAT/PMT with CRC32, continuity counters per PID
//! - PES reassembly for verification
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tsmux::av::{AccessUnit, CodecConfig, Muxer};
//! use tsmux::codec::{h264::parse_avc_config, AudioSpecificConfig};
//! use tsmux::format::TSMuxer;
//! use tokio::net::TcpStream;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let socket = TcpStream::connect("127.0.0.1:8088").await?;
//!     let mut muxer = TSMuxer::new(socket);
//!
//!     let avcc = std::fs::read("avcC.bin")?;
//!     muxer
//!         .write_header(&[
//!             CodecConfig::Video(parse_avc_config(&avcc)?),
//!             CodecConfig::Audio(AudioSpecificConfig::default()),
//!         ])
//!         .await?;
//!
//!     let frame = std::fs::read("frame.h264")?;
//!     let unit = AccessUnit::video(frame)
//!         .with_pts(Duration::from_millis(40))
//!         .with_random_access(true);
//!     muxer.write_packet(unit).await?;
//!
//!     muxer.write_trailer().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - `av`: access units, codec configuration and the `Muxer` trait
//! - `codec`: AAC and H.264 framing helpers
//! - `format`: Transport Stream packetization, writer and muxer
//! - `config`: PIDs and timing intervals, from environment and file
//! - `error`: error type and `Result` alias
//! - `utils`: bit reader/writer and CRC32/MPEG-2
//!
/// Access units and the muxer interface
pub mod av;

/// AAC and H.264 framing
pub mod codec;

/// Error types and utilities
pub mod error;

/// Container formats
pub mod format;

/// Common utilities and helper functions
pub mod utils;

/// Configuration module
pub mod config;

pub use error::{Result, TsError};
