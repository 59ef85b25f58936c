use bytes::{BufMut, Bytes, BytesMut};
use std::time::Duration;

use super::clock::{
    decode_timestamp, encode_timestamp, ticks_since, ProgramClockReference, DTS_PREFIX,
};
use super::packet::TSPacket;
use super::segment::segment;
use super::types::{PES_START_CODE, STREAM_ID_AAC, STREAM_ID_H264};
use crate::av::{AccessUnit, CodecConfig};
use crate::codec::aac::AudioSpecificConfig;
use crate::codec::h264::{to_annex_b, AVCDecoderConfigurationRecord, AUD_IDR, AUD_NON_IDR, NAL_LENGTH_SIZE, START_CODE};
use crate::error::{Result, TsError};

/// The two-bit `PTS_DTS_flags` field. Bit 1 announces a PTS, bit 0 a DTS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PTSDTSIndicator {
    None = 0b00,
    /// DTS without PTS; not allowed by ISO/IEC 13818-1
    Forbidden = 0b01,
    PtsOnly = 0b10,
    PtsAndDts = 0b11,
}

impl PTSDTSIndicator {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => PTSDTSIndicator::None,
            0b01 => PTSDTSIndicator::Forbidden,
            0b10 => PTSDTSIndicator::PtsOnly,
            _ => PTSDTSIndicator::PtsAndDts,
        }
    }

    pub fn has_pts(self) -> bool {
        (self as u8) & 0b10 != 0
    }

    pub fn has_dts(self) -> bool {
        (self as u8) & 0b01 != 0
    }
}

/// The optional PES header that follows the packet length for every stream
/// id except the few listed in [`has_optional_header`].
///
/// Values are assembled once through the `with_*` builders and never
/// mutated afterwards; encoding is a pure function of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PESOptionalHeader {
    marker_bits: u8,
    scrambling_control: u8,
    priority: bool,
    data_alignment: bool,
    copyright: bool,
    original_or_copy: bool,
    pts_dts_indicator: u8,
    escr_flag: bool,
    es_rate_flag: bool,
    dsm_trick_mode_flag: bool,
    additional_copy_info_flag: bool,
    crc_flag: bool,
    extension_flag: bool,
    header_length: u8,
    optional_fields: Vec<u8>,
    stuffing_bytes: Vec<u8>,
}

impl Default for PESOptionalHeader {
    fn default() -> Self {
        Self {
            marker_bits: Self::DEFAULT_MARKER_BITS,
            scrambling_control: 0,
            priority: false,
            data_alignment: false,
            copyright: false,
            original_or_copy: false,
            pts_dts_indicator: PTSDTSIndicator::None as u8,
            escr_flag: false,
            es_rate_flag: false,
            dsm_trick_mode_flag: false,
            additional_copy_info_flag: false,
            crc_flag: false,
            extension_flag: false,
            header_length: 0,
            optional_fields: Vec::new(),
            stuffing_bytes: Vec::new(),
        }
    }
}

impl PESOptionalHeader {
    /// Two flag bytes plus the header length byte.
    pub const FIXED_SECTION_SIZE: usize = 3;
    pub const DEFAULT_MARKER_BITS: u8 = 0b10;
    /// Stuffing bytes allowed in one PES header.
    pub const MAX_STUFFING: usize = 32;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scrambling_control(mut self, scrambling_control: u8) -> Self {
        self.scrambling_control = scrambling_control & 0b11;
        self
    }

    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_data_alignment(mut self, data_alignment: bool) -> Self {
        self.data_alignment = data_alignment;
        self
    }

    pub fn with_copyright(mut self, copyright: bool) -> Self {
        self.copyright = copyright;
        self
    }

    pub fn with_original(mut self, original: bool) -> Self {
        self.original_or_copy = original;
        self
    }

    /// Sets the PTS/DTS fields relative to `reference`.
    ///
    /// Each present timestamp becomes `round((t - reference) * 90 kHz)`;
    /// a timestamp earlier than the reference clamps to zero. Replaces any
    /// timestamps set before.
    pub fn with_timestamps(
        mut self,
        reference: Duration,
        pts: Option<Duration>,
        dts: Option<Duration>,
    ) -> Self {
        let mut indicator = 0u8;
        if pts.is_some() {
            indicator |= 0b10;
        }
        if dts.is_some() {
            indicator |= 0b01;
        }

        self.pts_dts_indicator = indicator;
        self.optional_fields.clear();
        if let Some(pts) = pts {
            self.optional_fields
                .extend_from_slice(&encode_timestamp(ticks_since(pts, reference), indicator << 4));
        }
        if let Some(dts) = dts {
            self.optional_fields
                .extend_from_slice(&encode_timestamp(ticks_since(dts, reference), DTS_PREFIX));
        }
        self.header_length = (self.optional_fields.len() + self.stuffing_bytes.len()) as u8;
        self
    }

    /// Appends `count` 0xFF stuffing bytes after the optional fields.
    ///
    /// At most [`MAX_STUFFING`](Self::MAX_STUFFING) bytes are taken, fewer
    /// when the optional fields leave less room in the 8-bit header length.
    pub fn with_stuffing(mut self, count: usize) -> Self {
        let room = (u8::MAX as usize).saturating_sub(self.optional_fields.len());
        let allowed = Self::MAX_STUFFING.min(room);
        if count > allowed {
            log::warn!("PES header stuffing capped at {} bytes, {} requested", allowed, count);
        }
        self.stuffing_bytes = vec![0xFF; count.min(allowed)];
        self.header_length = (self.optional_fields.len() + self.stuffing_bytes.len()) as u8;
        self
    }

    pub fn scrambling_control(&self) -> u8 {
        self.scrambling_control
    }

    pub fn priority(&self) -> bool {
        self.priority
    }

    pub fn data_alignment(&self) -> bool {
        self.data_alignment
    }

    pub fn copyright(&self) -> bool {
        self.copyright
    }

    pub fn original_or_copy(&self) -> bool {
        self.original_or_copy
    }

    pub fn pts_dts_indicator(&self) -> PTSDTSIndicator {
        PTSDTSIndicator::from_bits(self.pts_dts_indicator)
    }

    pub fn escr_flag(&self) -> bool {
        self.escr_flag
    }

    pub fn es_rate_flag(&self) -> bool {
        self.es_rate_flag
    }

    pub fn dsm_trick_mode_flag(&self) -> bool {
        self.dsm_trick_mode_flag
    }

    pub fn additional_copy_info_flag(&self) -> bool {
        self.additional_copy_info_flag
    }

    pub fn crc_flag(&self) -> bool {
        self.crc_flag
    }

    pub fn extension_flag(&self) -> bool {
        self.extension_flag
    }

    pub fn header_length(&self) -> u8 {
        self.header_length
    }

    pub fn optional_fields(&self) -> &[u8] {
        &self.optional_fields
    }

    pub fn stuffing_bytes(&self) -> &[u8] {
        &self.stuffing_bytes
    }

    /// 33-bit PTS in 90 kHz ticks, when flagged.
    pub fn pts(&self) -> Option<u64> {
        if !self.pts_dts_indicator().has_pts() {
            return None;
        }
        decode_timestamp(&self.optional_fields)
    }

    /// 33-bit DTS in 90 kHz ticks, when flagged together with a PTS.
    pub fn dts(&self) -> Option<u64> {
        if self.pts_dts_indicator() != PTSDTSIndicator::PtsAndDts {
            return None;
        }
        decode_timestamp(self.optional_fields.get(5..)?)
    }

    pub fn encoded_len(&self) -> usize {
        Self::FIXED_SECTION_SIZE + self.optional_fields.len() + self.stuffing_bytes.len()
    }

    pub fn write_to(&self, buf: &mut impl BufMut) {
        let mut flags = 0u8;
        flags |= (self.marker_bits & 0b11) << 6;
        flags |= (self.scrambling_control & 0b11) << 4;
        flags |= (self.priority as u8) << 3;
        flags |= (self.data_alignment as u8) << 2;
        flags |= (self.copyright as u8) << 1;
        flags |= self.original_or_copy as u8;
        buf.put_u8(flags);

        let mut flags2 = 0u8;
        flags2 |= (self.pts_dts_indicator & 0b11) << 6;
        flags2 |= (self.escr_flag as u8) << 5;
        flags2 |= (self.es_rate_flag as u8) << 4;
        flags2 |= (self.dsm_trick_mode_flag as u8) << 3;
        flags2 |= (self.additional_copy_info_flag as u8) << 2;
        flags2 |= (self.crc_flag as u8) << 1;
        flags2 |= self.extension_flag as u8;
        buf.put_u8(flags2);

        buf.put_u8(self.header_length);
        buf.put_slice(&self.optional_fields);
        buf.put_slice(&self.stuffing_bytes);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf.freeze()
    }

    /// Parses the header; every declared header byte, stuffing included,
    /// lands in `optional_fields`.
    pub fn try_decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::FIXED_SECTION_SIZE {
            return Err(TsError::MalformedInput(format!(
                "PES optional header needs {} bytes, got {}",
                Self::FIXED_SECTION_SIZE,
                data.len()
            )));
        }

        let header_length = data[2];
        let end = Self::FIXED_SECTION_SIZE + header_length as usize;
        let Some(optional_fields) = data.get(Self::FIXED_SECTION_SIZE..end) else {
            return Err(TsError::MalformedInput(format!(
                "PES header declares {} bytes of fields, {} available",
                header_length,
                data.len() - Self::FIXED_SECTION_SIZE
            )));
        };

        let b0 = data[0];
        let b1 = data[1];
        Ok(Self {
            marker_bits: (b0 & 0b1100_0000) >> 6,
            scrambling_control: (b0 & 0b0011_0000) >> 4,
            priority: b0 & 0b0000_1000 != 0,
            data_alignment: b0 & 0b0000_0100 != 0,
            copyright: b0 & 0b0000_0010 != 0,
            original_or_copy: b0 & 0b0000_0001 != 0,
            pts_dts_indicator: (b1 & 0b1100_0000) >> 6,
            escr_flag: b1 & 0b0010_0000 != 0,
            es_rate_flag: b1 & 0b0001_0000 != 0,
            dsm_trick_mode_flag: b1 & 0b0000_1000 != 0,
            additional_copy_info_flag: b1 & 0b0000_0100 != 0,
            crc_flag: b1 & 0b0000_0010 != 0,
            extension_flag: b1 & 0b0000_0001 != 0,
            header_length,
            optional_fields: optional_fields.to_vec(),
            stuffing_bytes: Vec::new(),
        })
    }

    /// Like [`try_decode`](Self::try_decode), but a short buffer is logged
    /// and yields the default header. Callers validate lengths themselves.
    pub fn decode(data: &[u8]) -> Self {
        match Self::try_decode(data) {
            Ok(header) => header,
            Err(e) => {
                log::error!("{}: {:02x?}", e, data);
                Self::default()
            }
        }
    }
}

/// Whether PES packets with this stream id carry the optional header.
pub fn has_optional_header(stream_id: u8) -> bool {
    !matches!(
        stream_id,
        0xBC // program_stream_map
            | 0xBE // padding_stream
            | 0xBF // private_stream_2
            | 0xF0 // ECM
            | 0xF1 // EMM
            | 0xF2 // DSMCC_stream
            | 0xF8 // ITU-T H.222.1 type E
            | 0xFF // program_stream_directory
    )
}

/// A complete Packetized Elementary Stream packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PESPacket {
    start_code: [u8; 3],
    stream_id: u8,
    packet_length: u16,
    optional_header: Option<PESOptionalHeader>,
    data: Bytes,
}

impl PESPacket {
    /// Start code, stream id and packet length.
    pub const PREFIX_SIZE: usize = 6;

    /// Assembles a packet and fills in the length field.
    ///
    /// Fails with [`TsError::UnrepresentableLength`] when the header and
    /// data exceed the 16-bit length field.
    pub fn new(
        stream_id: u8,
        optional_header: Option<PESOptionalHeader>,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        let data = data.into();
        let length =
            data.len() + optional_header.as_ref().map_or(0, PESOptionalHeader::encoded_len);
        let packet_length =
            u16::try_from(length).map_err(|_| TsError::UnrepresentableLength(length))?;

        Ok(Self {
            start_code: PES_START_CODE,
            stream_id,
            packet_length,
            optional_header,
            data,
        })
    }

    /// Builds the packet for one access unit, framed according to the kind
    /// of codec configuration it carries.
    ///
    /// Video configuration is only used when the unit is a random-access
    /// point; other video units get the non-IDR delimiter instead.
    pub fn create(unit: &AccessUnit) -> Result<Self> {
        match &unit.config {
            Some(CodecConfig::Audio(config)) => {
                Self::from_audio(&unit.data, config, unit.pts, unit.timestamp)
            }
            Some(CodecConfig::Video(config)) => Self::from_video(
                &unit.data,
                unit.random_access.then_some(config),
                unit.pts,
                unit.dts,
                unit.timestamp,
            ),
            None => Err(TsError::MissingConfiguration),
        }
    }

    /// ADTS-framed AAC. Audio never carries a DTS.
    pub fn from_audio(
        data: &[u8],
        config: &AudioSpecificConfig,
        pts: Option<Duration>,
        timestamp: Duration,
    ) -> Result<Self> {
        let mut payload = BytesMut::with_capacity(data.len() + 7);
        payload.put_slice(&config.adts(data.len())?);
        payload.put_slice(data);

        let header = PESOptionalHeader::new()
            .with_data_alignment(true)
            .with_timestamps(timestamp, pts, None);

        Self::new(STREAM_ID_AAC, Some(header), payload.freeze())
    }

    /// Annex-B H.264 preceded by an access unit delimiter, plus SPS/PPS
    /// when `config` is given.
    pub fn from_video(
        data: &[u8],
        config: Option<&AVCDecoderConfigurationRecord>,
        pts: Option<Duration>,
        dts: Option<Duration>,
        timestamp: Duration,
    ) -> Result<Self> {
        let mut payload = BytesMut::with_capacity(data.len() + 64);
        match config {
            Some(config) => {
                payload.put_slice(&AUD_IDR);
                if let Some(sps) = config.first_sps() {
                    payload.put_slice(&START_CODE);
                    payload.put_slice(sps);
                }
                if let Some(pps) = config.first_pps() {
                    payload.put_slice(&START_CODE);
                    payload.put_slice(pps);
                }
            }
            None => payload.put_slice(&AUD_NON_IDR),
        }
        payload.put_slice(&to_annex_b(data, NAL_LENGTH_SIZE));

        let header = PESOptionalHeader::new()
            .with_data_alignment(true)
            .with_timestamps(timestamp, pts, dts);

        Self::new(STREAM_ID_H264, Some(header), payload.freeze())
    }

    pub fn with_stream_id(mut self, stream_id: u8) -> Self {
        self.stream_id = stream_id;
        self
    }

    pub fn start_code(&self) -> [u8; 3] {
        self.start_code
    }

    pub fn stream_id(&self) -> u8 {
        self.stream_id
    }

    pub fn packet_length(&self) -> u16 {
        self.packet_length
    }

    pub fn optional_header(&self) -> Option<&PESOptionalHeader> {
        self.optional_header.as_ref()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn encoded_len(&self) -> usize {
        Self::PREFIX_SIZE
            + self
                .optional_header
                .as_ref()
                .map_or(0, PESOptionalHeader::encoded_len)
            + self.data.len()
    }

    pub fn write_to(&self, buf: &mut impl BufMut) {
        buf.put_slice(&self.start_code);
        buf.put_u8(self.stream_id);
        buf.put_u16(self.packet_length);
        if let Some(header) = &self.optional_header {
            header.write_to(buf);
        }
        buf.put_slice(&self.data);
    }

    /// The serialized packet.
    pub fn payload(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf.freeze()
    }

    /// Parses a serialized packet.
    ///
    /// A wrong start code is an error. A packet cut short after the start
    /// code is logged and keeps default values for the missing fields.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut start_code = [0u8; 3];
        let n = payload.len().min(3);
        start_code[..n].copy_from_slice(&payload[..n]);
        if n < 3 || start_code != PES_START_CODE {
            return Err(TsError::InvalidStartCode(start_code));
        }

        let mut packet = Self {
            start_code,
            stream_id: 0,
            packet_length: 0,
            optional_header: None,
            data: Bytes::new(),
        };

        if payload.len() < Self::PREFIX_SIZE {
            log::error!("PES packet truncated after start code: {:02x?}", payload);
            return Ok(packet);
        }
        packet.stream_id = payload[3];
        packet.packet_length = u16::from_be_bytes([payload[4], payload[5]]);

        // a zero length means "unbounded" for video
        let end = match packet.packet_length {
            0 => payload.len(),
            len => payload.len().min(Self::PREFIX_SIZE + len as usize),
        };
        let body = &payload[Self::PREFIX_SIZE..end];

        let data_start = if has_optional_header(packet.stream_id) {
            let header = PESOptionalHeader::decode(body);
            let start = PESOptionalHeader::FIXED_SECTION_SIZE + header.header_length() as usize;
            packet.optional_header = Some(header);
            start
        } else {
            0
        };
        packet.data = Bytes::copy_from_slice(body.get(data_start..).unwrap_or_default());

        Ok(packet)
    }

    /// Splits the serialized packet into transport packets on `pid`.
    pub fn to_ts_packets(&self, pid: u16, pcr: Option<ProgramClockReference>) -> Vec<TSPacket> {
        segment(&self.payload(), pid, pcr)
    }
}
