pub mod aac;
pub mod h264;

pub use aac::AudioSpecificConfig;
pub use h264::{AVCDecoderConfigurationRecord, NALUnit};
