//! Program Specific Information sections and their transport packets.

use bytes::{BufMut, Bytes, BytesMut};
use lazy_static::lazy_static;

use super::packet::TSPacket;
use super::types::{PAT, PMT, PROGRAM_NUMBER, TABLE_ID_PAT, TABLE_ID_PMT, TRANSPORT_STREAM_ID, TS_PAYLOAD_SIZE};
use crate::error::{Result, TsError};
use crate::utils::Crc32Mpeg2;

lazy_static! {
    static ref CRC: Crc32Mpeg2 = Crc32Mpeg2::new();
}

/// Table id extension through last section number.
const SYNTAX_HEADER_SIZE: usize = 5;
const CRC_SIZE: usize = 4;

/// Version 0, current_next_indicator set.
const VERSION_CURRENT: u8 = 0xC1;

fn build_section(table_id: u8, table_id_extension: u16, body: &[u8]) -> Bytes {
    let section_length = SYNTAX_HEADER_SIZE + body.len() + CRC_SIZE;

    let mut buf = BytesMut::with_capacity(3 + section_length);
    buf.put_u8(table_id);
    // section_syntax_indicator, '0', reserved
    buf.put_u16(0xB000 | (section_length as u16 & 0x3FF));
    buf.put_u16(table_id_extension);
    buf.put_u8(VERSION_CURRENT);
    buf.put_u8(0); // section_number
    buf.put_u8(0); // last_section_number
    buf.put_slice(body);

    let crc = CRC.calculate(&buf);
    buf.put_u32(crc);
    buf.freeze()
}

pub fn pat_section(pat: &PAT) -> Bytes {
    let mut body = BytesMut::with_capacity(pat.len());
    pat.write_to(&mut body);
    build_section(TABLE_ID_PAT, TRANSPORT_STREAM_ID, &body)
}

pub fn pmt_section(pmt: &PMT) -> Bytes {
    let mut body = BytesMut::with_capacity(pmt.len());
    pmt.write_to(&mut body);
    build_section(TABLE_ID_PMT, PROGRAM_NUMBER, &body)
}

/// Whether a complete section's trailing CRC matches.
pub fn verify_section(section: &[u8]) -> bool {
    CRC.verify(section)
}

/// Wraps one section in a single transport packet: pointer field, section,
/// `0xFF` padding.
pub fn section_packet(pid: u16, section: &[u8]) -> Result<TSPacket> {
    if section.len() + 1 > TS_PAYLOAD_SIZE {
        return Err(TsError::InvalidData(format!(
            "PSI section of {} bytes does not fit in one packet",
            section.len()
        )));
    }

    let mut packet = TSPacket::new(pid);
    packet.header.payload_unit_start = true;
    packet.header.contains_payload = true;
    packet.payload.reserve(TS_PAYLOAD_SIZE);
    packet.payload.push(0); // pointer_field
    packet.payload.extend_from_slice(section);
    packet.payload.resize(TS_PAYLOAD_SIZE, 0xFF);
    Ok(packet)
}
