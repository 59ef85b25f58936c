use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::time::Duration;

use super::clock::{ticks_since, ProgramClockReference};
use super::packet::TSPacket;
use super::pes::PESPacket;
use super::psi::{pat_section, pmt_section, section_packet};
use super::types::{PAT, PID_PAT, PMT, STREAM_TYPE_AAC, STREAM_TYPE_H264, TS_PACKET_SIZE};
use crate::av::{AccessUnit, CodecConfig, CodecType};
use crate::codec::{AVCDecoderConfigurationRecord, AudioSpecificConfig};
use crate::config::{self, Config, ExpectedMedia};
use crate::error::Result;

/// Turns access units of one program into transport packets.
///
/// Keeps per-PID continuity counters, the reference timestamp of each
/// medium and the PCR/PSI schedule. Callers serialize access.
#[derive(Debug)]
pub struct TSWriter {
    config: Config,
    audio_config: Option<AudioSpecificConfig>,
    video_config: Option<AVCDecoderConfigurationRecord>,
    audio_reference: Option<Duration>,
    video_reference: Option<Duration>,
    continuity_counters: HashMap<u16, u8>,
    last_pcr: Option<Duration>,
    last_psi: Option<Duration>,
    program_sent: bool,
    discontinuity: bool,
}

impl Default for TSWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TSWriter {
    /// A writer using the process-wide configuration.
    pub fn new() -> Self {
        Self::with_config(config::current())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            audio_config: None,
            video_config: None,
            audio_reference: None,
            video_reference: None,
            continuity_counters: HashMap::new(),
            last_pcr: None,
            last_psi: None,
            program_sent: false,
            discontinuity: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn expected_media(&self) -> ExpectedMedia {
        self.config.expected_media
    }

    pub fn set_audio_config(&mut self, config: AudioSpecificConfig) {
        self.audio_config = Some(config);
    }

    pub fn set_video_config(&mut self, config: AVCDecoderConfigurationRecord) {
        self.video_config = Some(config);
    }

    pub fn set_config(&mut self, config: CodecConfig) {
        match config {
            CodecConfig::Audio(config) => self.set_audio_config(config),
            CodecConfig::Video(config) => self.set_video_config(config),
        }
    }

    /// True once every expected medium has its codec configuration.
    pub fn can_write(&self) -> bool {
        let expected = self.config.expected_media;
        (!expected.video() || self.video_config.is_some())
            && (!expected.audio() || self.audio_config.is_some())
    }

    pub fn pid(&self, codec: CodecType) -> u16 {
        match codec {
            CodecType::H264 => self.config.video_pid,
            CodecType::AAC => self.config.audio_pid,
        }
    }

    /// Video carries the PCR whenever it is part of the program.
    pub fn pcr_pid(&self) -> u16 {
        if self.config.expected_media.video() {
            self.config.video_pid
        } else {
            self.config.audio_pid
        }
    }

    /// Clears timing state; the next unit re-anchors references and
    /// re-sends PAT/PMT. Codec configurations are kept.
    pub fn reset(&mut self) {
        self.audio_reference = None;
        self.video_reference = None;
        self.last_pcr = None;
        self.last_psi = None;
        self.program_sent = false;
        self.discontinuity = true;
    }

    fn next_continuity_counter(&mut self, pid: u16) -> u8 {
        let counter = self.continuity_counters.entry(pid).or_insert(0);
        let current = *counter;
        *counter = (current + 1) & 0x0F;
        current
    }

    fn stamp(&mut self, packets: Vec<TSPacket>, out: &mut BytesMut) -> Result<()> {
        for mut packet in packets {
            packet.header.continuity_counter = self.next_continuity_counter(packet.header.pid);
            out.extend_from_slice(&packet.try_to_bytes()?);
        }
        Ok(())
    }

    fn program_map(&self) -> PMT {
        let mut pmt = PMT::new();
        pmt.pcr_pid = self.pcr_pid();
        let expected = self.config.expected_media;
        if expected.video() {
            pmt.add_stream(STREAM_TYPE_H264, self.config.video_pid);
        }
        if expected.audio() {
            pmt.add_stream(STREAM_TYPE_AAC, self.config.audio_pid);
        }
        pmt
    }

    /// PAT followed by PMT, two packets. Sending them ahead of the first
    /// unit keeps that unit from repeating them.
    pub fn write_program(&mut self) -> Result<Bytes> {
        let pat = section_packet(PID_PAT, &pat_section(&PAT::single_program(self.config.pmt_pid)))?;
        let pmt = section_packet(self.config.pmt_pid, &pmt_section(&self.program_map()))?;

        let mut out = BytesMut::with_capacity(2 * TS_PACKET_SIZE);
        self.stamp(vec![pat, pmt], &mut out)?;
        self.program_sent = true;
        Ok(out.freeze())
    }

    fn psi_due(&self, time: Duration, is_pcr_pid: bool, random_access: bool) -> bool {
        match self.last_psi {
            None => !self.program_sent,
            Some(last) => {
                is_pcr_pid
                    && random_access
                    && time.saturating_sub(last) >= self.config.psi_interval
            }
        }
    }

    /// Decides whether a PCR goes out with this unit. A clock going
    /// backwards forces one and flags a discontinuity.
    fn pcr_due(&mut self, time: Duration) -> bool {
        match self.last_pcr {
            None => true,
            Some(last) if time < last => {
                log::warn!("PCR regression from {:?} to {:?}", last, time);
                self.discontinuity = true;
                true
            }
            Some(last) => time - last >= self.config.pcr_interval,
        }
    }

    /// Packetizes one access unit.
    ///
    /// Returns the 188-byte packets for it, preceded by PAT/PMT when due.
    /// Output is empty until [`can_write`](Self::can_write) holds, and for
    /// units whose PES packet cannot be built; such units leave the writer
    /// state untouched.
    pub fn write_sample(&mut self, mut unit: AccessUnit) -> Result<Bytes> {
        if let Some(config) = unit.config.take() {
            self.set_config(config);
        }
        // every AAC frame decodes on its own
        if unit.codec == CodecType::AAC {
            unit.random_access = true;
        }
        let expected = match unit.codec {
            CodecType::AAC => self.config.expected_media.audio(),
            CodecType::H264 => self.config.expected_media.video(),
        };
        if !expected {
            log::debug!("dropping {:?} unit, not part of the program", unit.codec);
            return Ok(Bytes::new());
        }
        if !self.can_write() {
            log::debug!("dropping {:?} unit, waiting for codec configuration", unit.codec);
            return Ok(Bytes::new());
        }

        unit.config = match unit.codec {
            CodecType::AAC => self.audio_config.clone().map(CodecConfig::Audio),
            CodecType::H264 => self.video_config.clone().map(CodecConfig::Video),
        };

        // audio packets only carry a PTS, so audio is anchored on it
        let time = match unit.codec {
            CodecType::AAC => unit.pts,
            CodecType::H264 => unit.decode_time(),
        }
        .unwrap_or(unit.timestamp);
        let reference = match unit.codec {
            CodecType::AAC => self.audio_reference.unwrap_or(time),
            CodecType::H264 => self.video_reference.unwrap_or(time),
        };
        unit.timestamp = reference;

        let pes = match PESPacket::create(&unit) {
            Ok(pes) => pes,
            Err(e) => {
                log::error!("dropping {:?} unit of {} bytes: {}", unit.codec, unit.data.len(), e);
                return Ok(Bytes::new());
            }
        };

        match unit.codec {
            CodecType::AAC => self.audio_reference = Some(reference),
            CodecType::H264 => self.video_reference = Some(reference),
        }

        let pid = self.pid(unit.codec);
        let is_pcr_pid = pid == self.pcr_pid();
        let mut out = BytesMut::with_capacity(pes.encoded_len() + 3 * TS_PACKET_SIZE);

        let psi_due = self.psi_due(time, is_pcr_pid, unit.random_access);
        if psi_due {
            out.extend_from_slice(&self.write_program()?);
        }
        if psi_due || self.last_psi.is_none() {
            self.last_psi = Some(time);
        }

        let pcr = if is_pcr_pid && self.pcr_due(time) {
            self.last_pcr = Some(time);
            Some(ProgramClockReference::from_ticks(ticks_since(time, reference)))
        } else {
            None
        };

        let mut packets = pes.to_ts_packets(pid, pcr);
        if let Some(field) = packets.first_mut().and_then(|p| p.adaptation_field.as_mut()) {
            field.random_access = unit.random_access;
            if pcr.is_some() && self.discontinuity {
                field.discontinuity = true;
                self.discontinuity = false;
            }
        }
        self.stamp(packets, &mut out)?;

        Ok(out.freeze())
    }
}
