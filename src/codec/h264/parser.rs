use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::types::{AVCDecoderConfigurationRecord, NALUnit, START_CODE};
use crate::{Result, TsError};

/// Parses an `avcC` record. At least one SPS and one PPS are required.
pub fn parse_avc_config(data: &[u8]) -> Result<AVCDecoderConfigurationRecord> {
    let mut buf = data;
    if buf.remaining() < 6 {
        return Err(TsError::MalformedInput(format!(
            "avcC record needs 6 bytes, got {}",
            buf.remaining()
        )));
    }

    let configuration_version = buf.get_u8();
    if configuration_version != 1 {
        return Err(TsError::Codec(format!(
            "unsupported avcC version {}",
            configuration_version
        )));
    }
    let profile_indication = buf.get_u8();
    let profile_compatibility = buf.get_u8();
    let level_indication = buf.get_u8();
    let length_size_minus_one = buf.get_u8() & 0x03;

    let sps_count = (buf.get_u8() & 0x1F) as usize;
    let sequence_parameter_sets = read_parameter_sets(&mut buf, sps_count, "SPS")?;

    if !buf.has_remaining() {
        return Err(TsError::MalformedInput("avcC record missing PPS count".into()));
    }
    let pps_count = buf.get_u8() as usize;
    let picture_parameter_sets = read_parameter_sets(&mut buf, pps_count, "PPS")?;

    if sequence_parameter_sets.is_empty() || picture_parameter_sets.is_empty() {
        return Err(TsError::Codec(
            "avcC record must carry at least one SPS and one PPS".into(),
        ));
    }

    Ok(AVCDecoderConfigurationRecord {
        configuration_version,
        profile_indication,
        profile_compatibility,
        level_indication,
        length_size_minus_one,
        sequence_parameter_sets,
        picture_parameter_sets,
    })
}

fn read_parameter_sets(buf: &mut &[u8], count: usize, kind: &str) -> Result<Vec<Bytes>> {
    let mut sets = Vec::with_capacity(count);
    for _ in 0..count {
        if buf.remaining() < 2 {
            return Err(TsError::MalformedInput(format!("{} length truncated", kind)));
        }
        let len = buf.get_u16() as usize;
        if buf.remaining() < len {
            return Err(TsError::MalformedInput(format!(
                "{} declares {} bytes, {} available",
                kind,
                len,
                buf.remaining()
            )));
        }
        sets.push(buf.copy_to_bytes(len));
    }
    Ok(sets)
}

/// Splits length-prefixed (AVCC) frame data into NAL units.
///
/// A truncated trailing unit is logged and dropped.
pub fn split_length_prefixed(data: &[u8], length_size: usize) -> Vec<NALUnit> {
    let mut units = Vec::new();
    let mut buf = data;

    while buf.has_remaining() {
        if buf.remaining() < length_size {
            log::error!(
                "dangling {} bytes after last NAL unit, expected a {}-byte length",
                buf.remaining(),
                length_size
            );
            break;
        }
        let len = buf.get_uint(length_size) as usize;
        if buf.remaining() < len {
            log::error!(
                "NAL unit declares {} bytes but only {} remain",
                len,
                buf.remaining()
            );
            break;
        }
        if let Some(unit) = NALUnit::new(buf.copy_to_bytes(len)) {
            units.push(unit);
        }
    }

    units
}

/// Rewrites length-prefixed frame data as an Annex-B byte stream.
pub fn to_annex_b(data: &[u8], length_size: usize) -> Bytes {
    let units = split_length_prefixed(data, length_size);
    let capacity = units.iter().map(|u| u.data.len() + START_CODE.len()).sum();
    let mut out = BytesMut::with_capacity(capacity);
    for unit in units {
        out.put_slice(&START_CODE);
        out.put_slice(&unit.data);
    }
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::h264::types::NALUnitType;
    use pretty_assertions::assert_eq;

    fn sample_avcc() -> Vec<u8> {
        vec![
            0x01, 0x42, 0xC0, 0x1E, 0xFF, // version, baseline, level 3.0, 4-byte lengths
            0xE1, 0x00, 0x04, 0x67, 0x42, 0xC0, 0x1E, // one SPS
            0x01, 0x00, 0x03, 0x68, 0xCE, 0x3C, // one PPS
        ]
    }

    #[test]
    fn test_parse_avc_config() {
        let config = parse_avc_config(&sample_avcc()).unwrap();
        assert_eq!(config.profile_indication, 0x42);
        assert_eq!(config.level_indication, 0x1E);
        assert_eq!(config.nal_length_size(), 4);
        assert_eq!(config.first_sps().unwrap().as_ref(), &[0x67, 0x42, 0xC0, 0x1E]);
        assert_eq!(config.first_pps().unwrap().as_ref(), &[0x68, 0xCE, 0x3C]);
    }

    #[test]
    fn test_parse_avc_config_rejects_truncated_and_empty() {
        let data = sample_avcc();
        assert!(parse_avc_config(&data[..9]).is_err());
        assert!(parse_avc_config(&data[..3]).is_err());

        // zero SPS, zero PPS
        assert!(parse_avc_config(&[0x01, 0x42, 0xC0, 0x1E, 0xFF, 0xE0, 0x00]).is_err());
    }

    #[test]
    fn test_to_annex_b() {
        let frame = [
            0x00, 0x00, 0x00, 0x02, 0x65, 0x88, // IDR slice
            0x00, 0x00, 0x00, 0x01, 0x06, // SEI
        ];
        let out = to_annex_b(&frame, 4);
        assert_eq!(
            out.as_ref(),
            &[0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x00, 0x00, 0x00, 0x01, 0x06]
        );

        let units = split_length_prefixed(&frame, 4);
        assert_eq!(units[0].unit_type(), NALUnitType::CodedSliceIDR);
        assert!(units[0].is_keyframe());
        assert_eq!(units[1].unit_type(), NALUnitType::SEI);
    }

    #[test]
    fn test_to_annex_b_drops_truncated_tail() {
        let frame = [0x00, 0x00, 0x00, 0x01, 0x41, 0x00, 0x00, 0x00, 0x09, 0x41];
        assert_eq!(to_annex_b(&frame, 4).as_ref(), &[0x00, 0x00, 0x00, 0x01, 0x41]);
        assert!(to_annex_b(&[0x00, 0x00], 4).is_empty());
    }
}
