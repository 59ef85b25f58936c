//! # AAC framing
//!
//! AudioSpecificConfig parsing and ADTS header synthesis. Raw AAC access
//! units from an encoder carry no sync header; an ADTS header built from the
//! stream's AudioSpecificConfig is prepended before PES packetization.

/// ADTS and AudioSpecificConfig parsing
pub mod parser;
/// AAC configuration and header types
pub mod types;

pub use parser::{parse_adts_header, parse_audio_specific_config};
pub use types::{ADTSHeader, AudioSpecificConfig, ProfileType, ADTS_HEADER_SIZE, MAX_ADTS_FRAME_LENGTH};
