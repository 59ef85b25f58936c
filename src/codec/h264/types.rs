use bytes::Bytes;

/// Annex-B start code placed before every NAL unit in a byte stream.
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Access unit delimiter preceding an IDR access unit (primary_pic_type 0).
pub const AUD_IDR: [u8; 6] = [0x00, 0x00, 0x00, 0x01, 0x09, 0x10];

/// Access unit delimiter preceding any other access unit (primary_pic_type 1).
pub const AUD_NON_IDR: [u8; 6] = [0x00, 0x00, 0x00, 0x01, 0x09, 0x30];

/// Encoder output prefixes each NAL unit with a 4-byte big-endian length.
pub const NAL_LENGTH_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct NALUnit {
    pub nal_type: u8,
    pub nal_ref_idc: u8,
    pub data: Bytes,
}

impl NALUnit {
    /// Returns `None` for an empty unit.
    pub fn new(data: Bytes) -> Option<Self> {
        let header = *data.first()?;
        Some(Self {
            nal_type: header & 0x1F,
            nal_ref_idc: (header >> 5) & 0x03,
            data,
        })
    }

    pub fn unit_type(&self) -> NALUnitType {
        NALUnitType::from(self.nal_type)
    }

    pub fn is_keyframe(&self) -> bool {
        self.nal_type == 5 || self.nal_type == 7 || self.nal_type == 8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitType {
    Unspecified = 0,
    CodedSliceNonIDR = 1,
    CodedSliceDataPartitionA = 2,
    CodedSliceDataPartitionB = 3,
    CodedSliceDataPartitionC = 4,
    CodedSliceIDR = 5,
    SEI = 6,
    SPS = 7,
    PPS = 8,
    AccessUnitDelimiter = 9,
    EndOfSequence = 10,
    EndOfStream = 11,
    FillerData = 12,
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        match value & 0x1F {
            1 => NALUnitType::CodedSliceNonIDR,
            2 => NALUnitType::CodedSliceDataPartitionA,
            3 => NALUnitType::CodedSliceDataPartitionB,
            4 => NALUnitType::CodedSliceDataPartitionC,
            5 => NALUnitType::CodedSliceIDR,
            6 => NALUnitType::SEI,
            7 => NALUnitType::SPS,
            8 => NALUnitType::PPS,
            9 => NALUnitType::AccessUnitDelimiter,
            10 => NALUnitType::EndOfSequence,
            11 => NALUnitType::EndOfStream,
            12 => NALUnitType::FillerData,
            _ => NALUnitType::Unspecified,
        }
    }
}

/// `avcC` box contents (ISO/IEC 14496-15 AVCDecoderConfigurationRecord).
///
/// Always holds at least one SPS and one PPS once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AVCDecoderConfigurationRecord {
    pub configuration_version: u8,
    pub profile_indication: u8,
    pub profile_compatibility: u8,
    pub level_indication: u8,
    pub length_size_minus_one: u8,
    pub sequence_parameter_sets: Vec<Bytes>,
    pub picture_parameter_sets: Vec<Bytes>,
}

impl AVCDecoderConfigurationRecord {
    pub fn nal_length_size(&self) -> usize {
        self.length_size_minus_one as usize + 1
    }

    pub fn first_sps(&self) -> Option<&Bytes> {
        self.sequence_parameter_sets.first()
    }

    pub fn first_pps(&self) -> Option<&Bytes> {
        self.picture_parameter_sets.first()
    }
}
