use crate::error::{Result, TsError};
use bytes::BufMut;

// Stream IDs
pub const STREAM_ID_H264: u8 = 0xe0;
pub const STREAM_ID_AAC: u8 = 0xc0;

// PIDs
pub const PID_PAT: u16 = 0x0000;
pub const PID_NULL: u16 = 0x1fff;
pub const DEFAULT_PMT_PID: u16 = 0x0fff;
pub const DEFAULT_VIDEO_PID: u16 = 0x0100;
pub const DEFAULT_AUDIO_PID: u16 = 0x0101;
pub const MAX_PID: u16 = 0x1fff;

// Table IDs
pub const TABLE_ID_PAT: u8 = 0x00;
pub const TABLE_ID_PMT: u8 = 0x02;
pub const TRANSPORT_STREAM_ID: u16 = 1;
pub const PROGRAM_NUMBER: u16 = 1;

// Elementary Stream Types
pub const STREAM_TYPE_H264: u8 = 0x1b;
pub const STREAM_TYPE_AAC: u8 = 0x0f;

// Constants
pub const SYNC_BYTE: u8 = 0x47;
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_HEADER_SIZE: usize = 4;
pub const TS_PAYLOAD_SIZE: usize = TS_PACKET_SIZE - TS_HEADER_SIZE;
pub const PES_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];
pub const PTS_HZ: u64 = 90_000;
pub const PCR_HZ: u64 = 27_000_000;

#[derive(Debug, Clone)]
pub struct PATEntry {
    pub program_number: u16,
    pub network_pid: u16,
    pub program_map_pid: u16,
}

#[derive(Debug, Clone, Default)]
pub struct PAT {
    pub entries: Vec<PATEntry>,
}

impl PAT {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A PAT announcing a single program.
    pub fn single_program(program_map_pid: u16) -> Self {
        Self {
            entries: vec![PATEntry {
                program_number: PROGRAM_NUMBER,
                network_pid: 0,
                program_map_pid,
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len() * 4
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_to(&self, buf: &mut impl BufMut) {
        for entry in &self.entries {
            buf.put_u16(entry.program_number);
            if entry.program_number == 0 {
                buf.put_u16(entry.network_pid & 0x1fff | 7 << 13);
            } else {
                buf.put_u16(entry.program_map_pid & 0x1fff | 7 << 13);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Descriptor {
    pub tag: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ElementaryStreamInfo {
    pub stream_type: u8,
    pub elementary_pid: u16,
    pub descriptors: Vec<Descriptor>,
}

#[derive(Debug, Clone, Default)]
pub struct PMT {
    pub pcr_pid: u16,
    pub program_descriptors: Vec<Descriptor>,
    pub elementary_stream_infos: Vec<ElementaryStreamInfo>,
}

impl PMT {
    pub fn new() -> Self {
        Self {
            pcr_pid: PID_NULL,
            program_descriptors: Vec::new(),
            elementary_stream_infos: Vec::new(),
        }
    }

    pub fn add_stream(&mut self, stream_type: u8, elementary_pid: u16) {
        self.elementary_stream_infos.push(ElementaryStreamInfo {
            stream_type,
            elementary_pid,
            descriptors: Vec::new(),
        });
    }

    pub fn len(&self) -> usize {
        let mut n = 4; // PCR PID + program info length

        for desc in &self.program_descriptors {
            n += 2 + desc.data.len();
        }

        for info in &self.elementary_stream_infos {
            n += 5; // stream_type + elementary_pid + ES info length
            for desc in &info.descriptors {
                n += 2 + desc.data.len();
            }
        }

        n
    }

    pub fn is_empty(&self) -> bool {
        self.elementary_stream_infos.is_empty()
    }

    pub fn write_to(&self, buf: &mut impl BufMut) {
        buf.put_u16(self.pcr_pid & 0x1fff | 7 << 13);

        let prog_desc_len = descriptors_len(&self.program_descriptors);
        buf.put_u16((prog_desc_len as u16) & 0x3ff | 0xf << 12);
        write_descriptors(buf, &self.program_descriptors);

        for info in &self.elementary_stream_infos {
            buf.put_u8(info.stream_type);
            buf.put_u16(info.elementary_pid & 0x1fff | 7 << 13);

            let es_desc_len = descriptors_len(&info.descriptors);
            buf.put_u16((es_desc_len as u16) & 0x3ff | 0xf << 12);
            write_descriptors(buf, &info.descriptors);
        }
    }
}

fn descriptors_len(descriptors: &[Descriptor]) -> usize {
    descriptors.iter().map(|d| 2 + d.data.len()).sum()
}

fn write_descriptors(buf: &mut impl BufMut, descriptors: &[Descriptor]) {
    for desc in descriptors {
        buf.put_u8(desc.tag);
        buf.put_u8(desc.data.len() as u8);
        buf.put_slice(&desc.data);
    }
}

/// The fixed 4-byte transport packet header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TSHeader {
    pub sync_byte: u8, // Always 0x47
    pub transport_error: bool,
    pub payload_unit_start: bool,
    pub transport_priority: bool,
    pub pid: u16,
    pub scrambling_control: u8,
    pub adaptation_field_exists: bool,
    pub contains_payload: bool,
    pub continuity_counter: u8,
}

impl Default for TSHeader {
    fn default() -> Self {
        Self {
            sync_byte: SYNC_BYTE,
            transport_error: false,
            payload_unit_start: false,
            transport_priority: false,
            pid: 0,
            scrambling_control: 0,
            adaptation_field_exists: false,
            contains_payload: false,
            continuity_counter: 0,
        }
    }
}

impl TSHeader {
    pub fn new(pid: u16) -> Self {
        Self {
            pid: pid & MAX_PID,
            ..Default::default()
        }
    }

    pub fn write_to(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.sync_byte);

        let mut b1 = 0u8;
        if self.transport_error {
            b1 |= 0x80;
        }
        if self.payload_unit_start {
            b1 |= 0x40;
        }
        if self.transport_priority {
            b1 |= 0x20;
        }
        b1 |= ((self.pid >> 8) & 0x1f) as u8;
        buf.put_u8(b1);

        buf.put_u8((self.pid & 0xff) as u8);

        let mut b3 = (self.scrambling_control & 0x03) << 6;
        if self.adaptation_field_exists {
            b3 |= 0x20;
        }
        if self.contains_payload {
            b3 |= 0x10;
        }
        b3 |= self.continuity_counter & 0x0f;
        buf.put_u8(b3);
    }

    pub fn parse(data: &[u8]) -> Result<TSHeader> {
        if data.len() < TS_HEADER_SIZE {
            return Err(TsError::MalformedInput("TS packet too short".into()));
        }

        if data[0] != SYNC_BYTE {
            return Err(TsError::InvalidData(format!(
                "Invalid sync byte 0x{:02x}",
                data[0]
            )));
        }

        Ok(TSHeader {
            sync_byte: data[0],
            transport_error: (data[1] & 0x80) != 0,
            payload_unit_start: (data[1] & 0x40) != 0,
            transport_priority: (data[1] & 0x20) != 0,
            pid: (((data[1] & 0x1F) as u16) << 8) | data[2] as u16,
            scrambling_control: (data[3] >> 6) & 0x03,
            adaptation_field_exists: (data[3] & 0x20) != 0,
            contains_payload: (data[3] & 0x10) != 0,
            continuity_counter: data[3] & 0x0F,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_header_bit_layout() {
        let header = TSHeader {
            payload_unit_start: true,
            pid: 0x1234 & MAX_PID,
            adaptation_field_exists: true,
            contains_payload: true,
            continuity_counter: 0x0b,
            ..Default::default()
        };
        let mut buf = BytesMut::new();
        header.write_to(&mut buf);

        assert_eq!(buf.as_ref(), &[0x47, 0x52, 0x34, 0x3b]);
        assert_eq!(TSHeader::parse(&buf).unwrap(), header);
    }

    #[test]
    fn test_header_parse_rejects_bad_sync_and_short_input() {
        assert!(matches!(
            TSHeader::parse(&[0x47, 0x00]),
            Err(TsError::MalformedInput(_))
        ));
        assert!(matches!(
            TSHeader::parse(&[0x48, 0x00, 0x00, 0x10]),
            Err(TsError::InvalidData(_))
        ));
    }

    #[test]
    fn test_pmt_layout() {
        let mut pmt = PMT::new();
        pmt.pcr_pid = DEFAULT_VIDEO_PID;
        pmt.add_stream(STREAM_TYPE_H264, DEFAULT_VIDEO_PID);

        let mut buf = BytesMut::new();
        pmt.write_to(&mut buf);
        assert_eq!(buf.len(), pmt.len());
        assert_eq!(
            buf.as_ref(),
            &[0xE1, 0x00, 0xF0, 0x00, 0x1B, 0xE1, 0x00, 0xF0, 0x00]
        );
    }
}
