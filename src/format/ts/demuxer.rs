use super::packet::{split_packets, TSPacket};
use super::pes::PESPacket;
use crate::error::Result;

/// Accumulates the payload of one PES packet.
#[derive(Debug, Default)]
struct PESBuilder {
    /// Total size when the PES length field is non-zero.
    size: Option<usize>,
    data: Vec<u8>,
}

impl PESBuilder {
    fn start(payload: &[u8]) -> Self {
        let size = match payload.get(4..6) {
            Some(&[hi, lo]) => match u16::from_be_bytes([hi, lo]) {
                0 => None,
                len => Some(PESPacket::PREFIX_SIZE + len as usize),
            },
            _ => None,
        };
        Self {
            size,
            data: Vec::with_capacity(size.unwrap_or(0)),
        }
    }

    fn is_complete(&self) -> bool {
        self.size.is_some_and(|size| self.data.len() >= size)
    }

    fn finish(mut self) -> Option<PESPacket> {
        if let Some(size) = self.size {
            self.data.truncate(size);
        }
        match PESPacket::decode(&self.data) {
            Ok(packet) => Some(packet),
            Err(e) => {
                log::error!("discarding reassembled PES packet: {}", e);
                None
            }
        }
    }
}

/// Reassembles PES packets from the transport packets of a single PID.
///
/// A unit starts at `payload_unit_start` and ends when its declared length
/// is reached, or at the next unit start when the length is zero. A
/// continuity counter gap discards the unit in progress.
#[derive(Debug)]
pub struct PESAssembler {
    pid: u16,
    pending: Option<PESBuilder>,
    last_counter: Option<u8>,
}

impl PESAssembler {
    pub fn new(pid: u16) -> Self {
        Self {
            pid,
            pending: None,
            last_counter: None,
        }
    }

    pub fn pid(&self) -> u16 {
        self.pid
    }

    /// Feeds one transport packet; packets of other PIDs are ignored.
    pub fn push(&mut self, packet: &TSPacket) -> Vec<PESPacket> {
        let header = &packet.header;
        let mut completed = Vec::new();
        if header.pid != self.pid || !header.contains_payload {
            return completed;
        }
        if header.transport_error {
            log::warn!("transport error on PID 0x{:04x}, skipping packet", self.pid);
            return completed;
        }

        if let Some(last) = self.last_counter {
            let expected = (last + 1) & 0x0F;
            if header.continuity_counter != expected && self.pending.take().is_some() {
                log::warn!(
                    "continuity gap on PID 0x{:04x}: expected {}, got {}",
                    self.pid,
                    expected,
                    header.continuity_counter
                );
            }
        }
        self.last_counter = Some(header.continuity_counter);

        if header.payload_unit_start {
            if let Some(done) = self.pending.take().and_then(PESBuilder::finish) {
                completed.push(done);
            }
            self.pending = Some(PESBuilder::start(&packet.payload));
        }

        let Some(builder) = self.pending.as_mut() else {
            log::debug!("PID 0x{:04x}: payload before first unit start", self.pid);
            return completed;
        };
        builder.data.extend_from_slice(&packet.payload);

        if builder.is_complete() {
            if let Some(done) = self.pending.take().and_then(PESBuilder::finish) {
                completed.push(done);
            }
        }
        completed
    }

    /// Parses and feeds one 188-byte packet.
    pub fn push_bytes(&mut self, data: &[u8]) -> Result<Vec<PESPacket>> {
        let packet = TSPacket::parse(data)?;
        Ok(self.push(&packet))
    }

    /// Completes a unit of unbounded length still in progress.
    pub fn flush(&mut self) -> Option<PESPacket> {
        self.pending.take().and_then(PESBuilder::finish)
    }
}

/// Extracts every PES packet carried on `pid` in a transport stream.
pub fn demux(data: &[u8], pid: u16) -> Result<Vec<PESPacket>> {
    let mut assembler = PESAssembler::new(pid);
    let mut packets = Vec::new();
    for chunk in split_packets(data) {
        packets.extend(assembler.push_bytes(chunk)?);
    }
    packets.extend(assembler.flush());
    Ok(packets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ts::pes::PESOptionalHeader;
    use crate::format::ts::segment::segment;
    use bytes::BytesMut;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn stream(packets: &[PESPacket], pid: u16) -> Vec<u8> {
        let mut out = BytesMut::new();
        let mut counter = 0u8;
        for pes in packets {
            for mut packet in pes.to_ts_packets(pid, None) {
                packet.header.continuity_counter = counter;
                counter = (counter + 1) & 0x0F;
                out.extend_from_slice(&packet.to_bytes());
            }
        }
        out.to_vec()
    }

    fn pes(len: usize, ms: u64) -> PESPacket {
        let header = PESOptionalHeader::new().with_timestamps(
            Duration::ZERO,
            Some(Duration::from_millis(ms)),
            None,
        );
        let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
        PESPacket::new(0xC0, Some(header), data).unwrap()
    }

    #[test]
    fn test_reassembles_consecutive_packets() {
        let packets = vec![pes(10, 0), pes(1000, 23), pes(365, 46)];
        let data = stream(&packets, 0x101);
        assert_eq!(demux(&data, 0x101).unwrap(), packets);
    }

    #[test]
    fn test_ignores_other_pids() {
        let data = stream(&[pes(50, 0)], 0x101);
        assert!(demux(&data, 0x100).unwrap().is_empty());
    }

    #[test]
    fn test_unbounded_length_completes_on_next_start() {
        let mut first = BytesMut::new();
        PESPacket::new(0xE0, Some(PESOptionalHeader::new()), vec![1u8; 300])
            .unwrap()
            .write_to(&mut first);
        // length zero: unbounded video
        first[4] = 0;
        first[5] = 0;

        let mut assembler = PESAssembler::new(0x100);
        let mut counter = 0u8;
        let mut feed = |assembler: &mut PESAssembler, payload: &[u8]| {
            let mut out = Vec::new();
            for mut packet in segment(payload, 0x100, None) {
                packet.header.continuity_counter = counter;
                counter = (counter + 1) & 0x0F;
                out.extend(assembler.push(&packet));
            }
            out
        };

        assert!(feed(&mut assembler, &first[..]).is_empty());
        let second = pes(5, 0).payload();
        let done = feed(&mut assembler, &second[..]);
        assert_eq!(done.len(), 2);
        assert_eq!(done[0].packet_length(), 0);
        assert_eq!(done[0].data().as_ref(), &[1u8; 300][..]);
        assert!(assembler.flush().is_none());
    }

    #[test]
    fn test_continuity_gap_drops_partial_unit() {
        let packets = vec![pes(400, 0), pes(20, 23)];
        let mut data = stream(&packets, 0x101);
        // corrupt the counter of the second packet of the first unit
        data[188 + 3] = (data[188 + 3] & 0xF0) | 0x0A;

        let reassembled = demux(&data, 0x101).unwrap();
        assert_eq!(reassembled, vec![packets[1].clone()]);
    }

    #[test]
    fn test_push_bytes_rejects_bad_sync() {
        let mut assembler = PESAssembler::new(0x100);
        let mut packet = vec![0xFFu8; 188];
        packet[0] = 0x46;
        assert!(assembler.push_bytes(&packet).is_err());
    }
}
