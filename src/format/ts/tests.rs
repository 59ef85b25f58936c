use std::time::Duration;

use pretty_assertions::assert_eq;

use super::*;
use crate::av::{AccessUnit, CodecConfig};
use crate::codec::h264::{parse_avc_config, AUD_IDR, AUD_NON_IDR};
use crate::codec::AudioSpecificConfig;
use crate::config::Config;

fn avc_config() -> crate::codec::AVCDecoderConfigurationRecord {
    parse_avc_config(&[
        0x01, 0x4D, 0x40, 0x1F, 0xFF, 0xE1, 0x00, 0x04, 0x67, 0x4D, 0x40, 0x1F, 0x01, 0x00, 0x03,
        0x68, 0xEE, 0x3C,
    ])
    .unwrap()
}

fn frame(len: usize) -> Vec<u8> {
    let mut data = (len as u32).to_be_bytes().to_vec();
    data.extend((0..len).map(|i| (i % 200) as u8 + 1));
    data
}

#[test]
fn test_program_round_trip() {
    let mut writer = TSWriter::with_config(Config::default());
    writer.set_video_config(avc_config());
    writer.set_audio_config(AudioSpecificConfig::default());

    let mut out = Vec::new();
    for i in 0..8u64 {
        let video = AccessUnit::video(frame(2000 + i as usize * 97))
            .with_pts(Duration::from_millis(1000 + i * 33))
            .with_dts(Duration::from_millis(1000 + i * 33))
            .with_random_access(i == 0);
        out.extend_from_slice(&writer.write_sample(video).unwrap());

        let audio = AccessUnit::audio(vec![0x42; 300]).with_pts(Duration::from_millis(1000 + i * 23));
        out.extend_from_slice(&writer.write_sample(audio).unwrap());
    }
    assert_eq!(out.len() % TS_PACKET_SIZE, 0);

    let video = demux(&out, DEFAULT_VIDEO_PID).unwrap();
    assert_eq!(video.len(), 8);
    assert!(video[0].data().starts_with(&AUD_IDR));
    assert!(video[1].data().starts_with(&AUD_NON_IDR));
    for (i, pes) in video.iter().enumerate() {
        let header = pes.optional_header().unwrap();
        assert_eq!(header.pts(), Some(i as u64 * 33 * 90));
        assert_eq!(header.dts(), header.pts());
        assert_eq!(pes.stream_id(), STREAM_ID_H264);
    }

    let audio = demux(&out, DEFAULT_AUDIO_PID).unwrap();
    assert_eq!(audio.len(), 8);
    for (i, pes) in audio.iter().enumerate() {
        let header = pes.optional_header().unwrap();
        assert_eq!(header.pts_dts_indicator(), PTSDTSIndicator::PtsOnly);
        assert_eq!(header.pts(), Some(i as u64 * 23 * 90));
        assert_eq!(&pes.data()[7..], &[0x42; 300][..]);
    }
}

#[test]
fn test_video_payload_survives_segmentation() {
    let config = avc_config();
    let data = frame(5000);
    let pes = PESPacket::from_video(&data, Some(&config), Some(Duration::ZERO), None, Duration::ZERO)
        .unwrap();

    let mut stream = Vec::new();
    for (i, mut packet) in pes.to_ts_packets(DEFAULT_VIDEO_PID, None).into_iter().enumerate() {
        packet.header.continuity_counter = (i & 0x0F) as u8;
        stream.extend_from_slice(&packet.to_bytes());
    }

    let decoded = demux(&stream, DEFAULT_VIDEO_PID).unwrap();
    assert_eq!(decoded, vec![pes]);
}

#[test]
fn test_codec_config_dispatch_through_writer() {
    let mut writer = TSWriter::with_config(Config::default());
    let unit = AccessUnit::video(frame(10))
        .with_pts(Duration::ZERO)
        .with_random_access(true)
        .with_config(CodecConfig::Video(avc_config()));

    // audio is still missing
    assert!(writer.write_sample(unit.clone()).unwrap().is_empty());

    writer.set_audio_config(AudioSpecificConfig::default());
    assert!(!writer.write_sample(unit).unwrap().is_empty());
}
