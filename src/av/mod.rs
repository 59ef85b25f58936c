use async_trait::async_trait;

use crate::codec::{AVCDecoderConfigurationRecord, AudioSpecificConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecType {
    H264,
    AAC,
}

/// Codec configuration attached to an access unit. The variant selects how
/// the unit is framed inside its PES packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecConfig {
    Audio(AudioSpecificConfig),
    Video(AVCDecoderConfigurationRecord),
}

impl CodecConfig {
    pub fn codec_type(&self) -> CodecType {
        match self {
            CodecConfig::Audio(_) => CodecType::AAC,
            CodecConfig::Video(_) => CodecType::H264,
        }
    }
}

impl From<AudioSpecificConfig> for CodecConfig {
    fn from(config: AudioSpecificConfig) -> Self {
        CodecConfig::Audio(config)
    }
}

impl From<AVCDecoderConfigurationRecord> for CodecConfig {
    fn from(config: AVCDecoderConfigurationRecord) -> Self {
        CodecConfig::Video(config)
    }
}

#[async_trait]
pub trait Muxer: Send {
    async fn write_header(&mut self, streams: &[CodecConfig]) -> crate::Result<()>;
    async fn write_packet(&mut self, packet: AccessUnit) -> crate::Result<()>;
    async fn write_trailer(&mut self) -> crate::Result<()>;
}

mod packet;
pub use packet::*;
