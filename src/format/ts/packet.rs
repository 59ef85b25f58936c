use bytes::{BufMut, Bytes, BytesMut};

use super::adaptation::AdaptationField;
use super::types::{TSHeader, TS_HEADER_SIZE, TS_PACKET_SIZE, TS_PAYLOAD_SIZE};
use crate::error::{Result, TsError};

/// Upper bound on payload bytes taken by a single [`TSPacket::fill`].
///
/// Leaves room for the smallest adaptation field carrying a flags byte, so
/// any shortfall can always be absorbed as stuffing.
pub const MAX_FILL: usize = TS_PAYLOAD_SIZE - 2;

/// One 188-byte transport packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TSPacket {
    pub header: TSHeader,
    pub adaptation_field: Option<AdaptationField>,
    pub payload: Vec<u8>,
}

impl TSPacket {
    pub fn new(pid: u16) -> Self {
        Self {
            header: TSHeader::new(pid),
            adaptation_field: None,
            payload: Vec::new(),
        }
    }

    /// Attaches an adaptation field and sets the matching header flag.
    pub fn set_adaptation_field(&mut self, field: AdaptationField) {
        self.header.adaptation_field_exists = true;
        self.adaptation_field = Some(field);
    }

    /// Bytes still free after the header, adaptation field and payload.
    pub fn remain(&self) -> usize {
        let used = self
            .adaptation_field
            .as_ref()
            .map_or(0, AdaptationField::encoded_len)
            + self.payload.len();
        TS_PAYLOAD_SIZE.saturating_sub(used)
    }

    /// Copies as much of `data` as fits, at most [`MAX_FILL`] bytes, and
    /// returns the count taken.
    ///
    /// The free space left over is padded: as adaptation-field stuffing when
    /// `use_adaptation_field` is set, otherwise as `0xFF` payload bytes.
    pub fn fill(&mut self, data: &[u8], use_adaptation_field: bool) -> usize {
        self.header.contains_payload = true;
        let length = data.len().min(self.remain()).min(MAX_FILL);
        self.payload.extend_from_slice(&data[..length]);

        if self.remain() == 0 {
            return length;
        }

        if use_adaptation_field {
            if self.adaptation_field.is_none() {
                self.set_adaptation_field(AdaptationField::new());
            }
            let remain = self.remain();
            if let Some(field) = self.adaptation_field.as_mut() {
                field.stuffing(remain);
            }
        } else {
            let remain = self.remain();
            self.payload.resize(self.payload.len() + remain, 0xFF);
        }

        length
    }

    pub fn encoded_len(&self) -> usize {
        TS_HEADER_SIZE
            + self
                .adaptation_field
                .as_ref()
                .map_or(0, AdaptationField::encoded_len)
            + self.payload.len()
    }

    pub fn write_to(&self, buf: &mut impl BufMut) {
        self.header.write_to(buf);
        if let Some(field) = &self.adaptation_field {
            field.write_to(buf);
        }
        buf.put_slice(&self.payload);
    }

    /// Serializes the packet, padding a short one with 0xFF to 188 bytes.
    ///
    /// Fails when the header, adaptation field and payload together
    /// exceed 188 bytes.
    pub fn try_to_bytes(&self) -> Result<Bytes> {
        let length = self.encoded_len();
        if length > TS_PACKET_SIZE {
            return Err(TsError::InvalidData(format!(
                "TS packet on PID 0x{:04x} is {} bytes",
                self.header.pid, length
            )));
        }
        let mut buf = BytesMut::with_capacity(TS_PACKET_SIZE);
        self.write_to(&mut buf);
        buf.resize(TS_PACKET_SIZE, 0xFF);
        Ok(buf.freeze())
    }

    /// Serializes a packet known to fit, as every packet from
    /// [`segment`](super::segment::segment) does.
    pub fn to_bytes(&self) -> Bytes {
        debug_assert!(
            self.encoded_len() <= TS_PACKET_SIZE,
            "TS packet overflows 188 bytes"
        );
        match self.try_to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("{}, truncating", e);
                let mut buf = BytesMut::with_capacity(self.encoded_len());
                self.write_to(&mut buf);
                buf.truncate(TS_PACKET_SIZE);
                buf.freeze()
            }
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != TS_PACKET_SIZE {
            return Err(TsError::MalformedInput(format!(
                "TS packet must be {} bytes, got {}",
                TS_PACKET_SIZE,
                data.len()
            )));
        }

        let header = TSHeader::parse(data)?;
        let mut offset = TS_HEADER_SIZE;

        let adaptation_field = if header.adaptation_field_exists {
            let field = AdaptationField::parse(&data[offset..])?;
            offset += field.encoded_len();
            Some(field)
        } else {
            None
        };

        let payload = if header.contains_payload {
            data.get(offset..).unwrap_or_default().to_vec()
        } else {
            Vec::new()
        };

        Ok(Self {
            header,
            adaptation_field,
            payload,
        })
    }
}

/// Splits a byte stream into 188-byte packets, dropping any trailing
/// partial packet.
pub fn split_packets(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.chunks_exact(TS_PACKET_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ts::clock::ProgramClockReference;
    use crate::format::ts::types::SYNC_BYTE;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_fill_leaves_two_byte_field() {
        let mut packet = TSPacket::new(0x100);
        let taken = packet.fill(&[0xAA; 300], true);
        assert_eq!(taken, MAX_FILL);

        let field = packet.adaptation_field.as_ref().unwrap();
        assert_eq!(field.length, 1);
        assert_eq!(field.stuffing_bytes, 0);
        assert_eq!(packet.to_bytes().len(), TS_PACKET_SIZE);
    }

    #[test]
    fn test_short_fill_stuffs_adaptation_field() {
        let mut packet = TSPacket::new(0x100);
        assert_eq!(packet.fill(&[1, 2, 3], true), 3);

        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), TS_PACKET_SIZE);
        assert_eq!(bytes[0], SYNC_BYTE);
        assert_eq!(bytes[3] & 0x30, 0x30);
        // length byte covers everything between header and payload
        assert_eq!(bytes[4] as usize, TS_PAYLOAD_SIZE - 3 - 1);
        assert_eq!(&bytes[185..], &[1, 2, 3]);
    }

    #[test]
    fn test_fill_without_adaptation_field_pads_payload() {
        let mut packet = TSPacket::new(0x100);
        assert_eq!(packet.fill(&[7; 10], false), 10);
        assert!(packet.adaptation_field.is_none());
        assert_eq!(packet.payload.len(), TS_PAYLOAD_SIZE);
        assert_eq!(&packet.payload[10..], &[0xFF; TS_PAYLOAD_SIZE - 10][..]);
    }

    #[test]
    fn test_fill_after_pcr_field() {
        let mut packet = TSPacket::new(0x100);
        packet.set_adaptation_field(AdaptationField::with_pcr(ProgramClockReference::from_ticks(42)));
        assert_eq!(packet.fill(&[0; 500], true), TS_PAYLOAD_SIZE - 8);
        assert_eq!(packet.remain(), 0);
    }

    #[test]
    fn test_parse_round_trip() {
        let mut packet = TSPacket::new(0x101);
        packet.header.payload_unit_start = true;
        packet.header.continuity_counter = 9;
        packet.set_adaptation_field(AdaptationField::with_pcr(ProgramClockReference::new(123_456, 7)));
        packet.fill(&[0x5A; 40], true);

        let parsed = TSPacket::parse(&packet.to_bytes()).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn test_parse_rejects_wrong_size() {
        assert!(matches!(
            TSPacket::parse(&[0x47; 100]),
            Err(TsError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_oversized_packet_is_rejected() {
        let mut packet = TSPacket::new(0x100);
        packet.header.contains_payload = true;
        packet.payload = vec![0; 200];
        assert!(matches!(
            packet.try_to_bytes(),
            Err(TsError::InvalidData(_))
        ));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "overflows")]
    fn test_oversized_packet_panics_in_debug() {
        let mut packet = TSPacket::new(0x100);
        packet.payload = vec![0; 200];
        let _ = packet.to_bytes();
    }

    #[test]
    fn test_short_packet_is_padded() {
        let packet = TSPacket::new(0x100);
        let bytes = packet.try_to_bytes().unwrap();
        assert_eq!(bytes.len(), TS_PACKET_SIZE);
        assert!(bytes[TS_HEADER_SIZE..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_split_packets_drops_partial_tail() {
        let data = vec![0x47; TS_PACKET_SIZE * 2 + 10];
        assert_eq!(split_packets(&data).count(), 2);
    }
}
