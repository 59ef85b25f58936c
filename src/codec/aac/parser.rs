use super::types::{ADTSHeader, AudioSpecificConfig, ProfileType, ADTS_HEADER_SIZE};
use crate::utils::BitReader;
use crate::{Result, TsError};

/// Parses the 2+ byte AudioSpecificConfig from an `esds`/encoder magic cookie.
pub fn parse_audio_specific_config(data: &[u8]) -> Result<AudioSpecificConfig> {
    if data.len() < 2 {
        return Err(TsError::MalformedInput(format!(
            "AudioSpecificConfig needs 2 bytes, got {}",
            data.len()
        )));
    }

    let mut reader = BitReader::new(data);

    let mut object_type = reader.read_bits(5)? as u8;
    if object_type == 31 {
        object_type = 32 + reader.read_bits(6)? as u8;
    }

    let sample_rate_index = reader.read_bits(4)? as u8;
    if sample_rate_index == 0x0F {
        // explicit 24-bit rate has no ADTS representation
        return Err(TsError::Codec(
            "explicit AAC sampling frequency is not supported".into(),
        ));
    }
    if sample_rate_index > 12 {
        return Err(TsError::Codec(format!(
            "reserved AAC sampling frequency index {}",
            sample_rate_index
        )));
    }

    let channel_configuration = reader.read_bits(4)? as u8;
    let frame_length_flag = reader.read_bit().unwrap_or(false);

    Ok(AudioSpecificConfig {
        object_type,
        sample_rate_index,
        channel_configuration,
        frame_length_flag,
    })
}

pub fn parse_adts_header(data: &[u8]) -> Result<ADTSHeader> {
    if data.len() < ADTS_HEADER_SIZE {
        return Err(TsError::Codec("ADTS header too short".into()));
    }

    let mut reader = BitReader::new(data);

    let sync_word = reader.read_bits(12)? as u16;
    if sync_word != 0xFFF {
        return Err(TsError::Codec("Invalid ADTS sync word".into()));
    }

    let id = reader.read_bits(1)? as u8;
    let layer = reader.read_bits(2)? as u8;
    let protection_absent = reader.read_bit()?;
    let profile = ProfileType::from(reader.read_bits(2)? as u8);
    let sample_rate_index = reader.read_bits(4)? as u8;
    let private_bit = reader.read_bit()?;
    let channel_configuration = reader.read_bits(3)? as u8;
    let original_copy = reader.read_bit()?;
    let home = reader.read_bit()?;
    let copyright_id_bit = reader.read_bit()?;
    let copyright_id_start = reader.read_bit()?;
    let frame_length = reader.read_bits(13)? as u16;
    let buffer_fullness = reader.read_bits(11)? as u16;
    let number_of_raw_blocks = reader.read_bits(2)? as u8;

    Ok(ADTSHeader {
        sync_word,
        id,
        layer,
        protection_absent,
        profile,
        sample_rate_index,
        private_bit,
        channel_configuration,
        original_copy,
        home,
        copyright_id_bit,
        copyright_id_start,
        frame_length,
        buffer_fullness,
        number_of_raw_blocks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::types::MAX_ADTS_FRAME_LENGTH;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_audio_specific_config() {
        // AAC LC, 44.1 kHz, stereo
        let config = parse_audio_specific_config(&[0x12, 0x10]).unwrap();
        assert_eq!(config.object_type, 2);
        assert_eq!(config.sample_rate_index, 4);
        assert_eq!(config.channel_configuration, 2);
        assert_eq!(config.sample_rate(), Some(44100));
        assert_eq!(config.profile(), ProfileType::LC);
    }

    #[test]
    fn test_parse_audio_specific_config_rejects_short_and_explicit_rate() {
        assert!(matches!(
            parse_audio_specific_config(&[0x12]),
            Err(TsError::MalformedInput(_))
        ));
        // object type 2, frequency index 15
        assert!(parse_audio_specific_config(&[0x17, 0x80, 0x00, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_adts_from_config() {
        let config = AudioSpecificConfig::new(2, 48000, 1).unwrap();
        let adts = config.adts(100).unwrap();

        // MPEG-2, layer 0, no CRC
        assert_eq!(&adts[..2], &[0xFF, 0xF9]);
        // LC profile (1), index 3, channel 1
        assert_eq!(adts[2], 0b01_0011_0_0);
        assert_eq!(adts[6] & 0x03, 0);

        let header = parse_adts_header(&adts).unwrap();
        assert!(header.sync_word_valid());
        assert_eq!(header.frame_length, 107);
        assert_eq!(header.buffer_fullness, 0x7FF);
        assert_eq!(header.channel_configuration, 1);
        assert_eq!(header.sample_rate(), Some(48000));
    }

    #[test]
    fn test_adts_frame_length_limit() {
        let config = AudioSpecificConfig::default();
        let largest = MAX_ADTS_FRAME_LENGTH - ADTS_HEADER_SIZE;

        let header = parse_adts_header(&config.adts(largest).unwrap()).unwrap();
        assert_eq!(header.frame_length as usize, MAX_ADTS_FRAME_LENGTH);
        assert!(matches!(config.adts(largest + 1), Err(TsError::Codec(_))));
    }

    #[test]
    fn test_invalid_sync_word() {
        let data = vec![0x00, 0x00, 0x50, 0x80, 0x43, 0x80, 0x00];
        assert!(parse_adts_header(&data).is_err());
    }
}
