use crate::error::{Result, TsError};
use crate::utils::BitWriter;

/// Size of an ADTS header without CRC.
pub const ADTS_HEADER_SIZE: usize = 7;

/// Largest value of the 13-bit `frame_length` field, header included.
pub const MAX_ADTS_FRAME_LENGTH: usize = 0x1FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileType {
    Main = 0,
    LC = 1,
    SSR = 2,
    LTP = 3,
}

impl From<u8> for ProfileType {
    fn from(value: u8) -> Self {
        match value {
            0 => ProfileType::Main,
            1 => ProfileType::LC,
            2 => ProfileType::SSR,
            3 => ProfileType::LTP,
            _ => ProfileType::LC, // Default to LC for unknown profiles
        }
    }
}

/// MPEG-4 AudioSpecificConfig, as delivered by the encoder alongside AAC
/// access units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    /// Audio object type (2 = AAC LC)
    pub object_type: u8,
    pub sample_rate_index: u8,
    pub channel_configuration: u8,
    /// 960-sample frames instead of 1024
    pub frame_length_flag: bool,
}

impl Default for AudioSpecificConfig {
    fn default() -> Self {
        Self {
            object_type: 2,
            sample_rate_index: 4,     // 44100 Hz
            channel_configuration: 2, // Stereo
            frame_length_flag: false,
        }
    }
}

impl AudioSpecificConfig {
    pub fn new(object_type: u8, sample_rate: u32, channel_configuration: u8) -> Option<Self> {
        Some(Self {
            object_type,
            sample_rate_index: sample_rate_index(sample_rate)?,
            channel_configuration,
            frame_length_flag: false,
        })
    }

    /// ADTS carries `object_type - 1` in two bits.
    pub fn profile(&self) -> ProfileType {
        ProfileType::from(self.object_type.saturating_sub(1))
    }

    pub fn sample_rate(&self) -> Option<u32> {
        sample_rate(self.sample_rate_index)
    }

    /// Builds the ADTS header that precedes a raw AAC frame of
    /// `payload_len` bytes.
    pub fn adts(&self, payload_len: usize) -> Result<[u8; ADTS_HEADER_SIZE]> {
        Ok(ADTSHeader::for_frame(self, payload_len)?.to_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ADTSHeader {
    pub sync_word: u16,            // 12 bits
    pub id: u8,                    // 1 bit, 0=MPEG-4, 1=MPEG-2
    pub layer: u8,                 // 2 bits
    pub protection_absent: bool,   // 1 bit
    pub profile: ProfileType,      // 2 bits
    pub sample_rate_index: u8,     // 4 bits
    pub private_bit: bool,         // 1 bit
    pub channel_configuration: u8, // 3 bits
    pub original_copy: bool,       // 1 bit
    pub home: bool,                // 1 bit
    pub copyright_id_bit: bool,    // 1 bit
    pub copyright_id_start: bool,  // 1 bit
    pub frame_length: u16,         // 13 bits, header included
    pub buffer_fullness: u16,      // 11 bits
    pub number_of_raw_blocks: u8,  // 2 bits
}

impl ADTSHeader {
    /// Header for a single raw block, MPEG-2 id, no CRC, VBR fullness.
    ///
    /// Fails when the frame does not fit the 13-bit length field.
    pub fn for_frame(config: &AudioSpecificConfig, payload_len: usize) -> Result<Self> {
        let frame_length = payload_len + ADTS_HEADER_SIZE;
        if frame_length > MAX_ADTS_FRAME_LENGTH {
            return Err(TsError::Codec(format!(
                "AAC frame of {} bytes exceeds the ADTS limit of {}",
                payload_len,
                MAX_ADTS_FRAME_LENGTH - ADTS_HEADER_SIZE
            )));
        }
        Ok(Self {
            sync_word: 0xFFF,
            id: 1,
            layer: 0,
            protection_absent: true,
            profile: config.profile(),
            sample_rate_index: config.sample_rate_index,
            private_bit: false,
            channel_configuration: config.channel_configuration,
            original_copy: false,
            home: false,
            copyright_id_bit: false,
            copyright_id_start: false,
            frame_length: frame_length as u16,
            buffer_fullness: 0x7FF,
            number_of_raw_blocks: 0,
        })
    }

    pub fn sync_word_valid(&self) -> bool {
        self.sync_word == 0xFFF
    }

    pub fn sample_rate(&self) -> Option<u32> {
        sample_rate(self.sample_rate_index)
    }

    pub fn to_bytes(&self) -> [u8; ADTS_HEADER_SIZE] {
        let mut writer = BitWriter::with_capacity(ADTS_HEADER_SIZE);
        writer.write_bits(self.sync_word as u32, 12);
        writer.write_bits(self.id as u32, 1);
        writer.write_bits(self.layer as u32, 2);
        writer.write_bit(self.protection_absent);
        writer.write_bits(self.profile as u32, 2);
        writer.write_bits(self.sample_rate_index as u32, 4);
        writer.write_bit(self.private_bit);
        writer.write_bits(self.channel_configuration as u32, 3);
        writer.write_bit(self.original_copy);
        writer.write_bit(self.home);
        writer.write_bit(self.copyright_id_bit);
        writer.write_bit(self.copyright_id_start);
        writer.write_bits(self.frame_length as u32, 13);
        writer.write_bits(self.buffer_fullness as u32, 11);
        writer.write_bits(self.number_of_raw_blocks as u32, 2);

        let mut out = [0u8; ADTS_HEADER_SIZE];
        out.copy_from_slice(&writer.into_bytes());
        out
    }
}

const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

pub fn sample_rate(index: u8) -> Option<u32> {
    SAMPLE_RATES.get(index as usize).copied()
}

pub fn sample_rate_index(rate: u32) -> Option<u8> {
    SAMPLE_RATES
        .iter()
        .position(|&r| r == rate)
        .map(|i| i as u8)
}
