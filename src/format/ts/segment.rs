use super::adaptation::AdaptationField;
use super::clock::ProgramClockReference;
use super::packet::{TSPacket, MAX_FILL};
use super::types::TS_PAYLOAD_SIZE;

/// Splits a serialized PES packet into transport packets on `pid`.
///
/// The first packet carries the unit-start indicator and, when given, the
/// PCR. Middle packets are full 184-byte payloads. The tail is padded with
/// adaptation-field stuffing so every packet is exactly 188 bytes.
pub fn segment(payload: &[u8], pid: u16, pcr: Option<ProgramClockReference>) -> Vec<TSPacket> {
    let mut packets = Vec::with_capacity(payload.len() / TS_PAYLOAD_SIZE + 2);

    let mut first = TSPacket::new(pid);
    first.header.payload_unit_start = true;
    if let Some(pcr) = pcr {
        first.set_adaptation_field(AdaptationField::with_pcr(pcr));
    }
    let position = first.fill(payload, true);
    packets.push(first);

    let rest = &payload[position..];
    let r = rest.len() % TS_PAYLOAD_SIZE;
    let (middle, tail) = rest.split_at(rest.len() - r);

    for chunk in middle.chunks_exact(TS_PAYLOAD_SIZE) {
        let mut packet = TSPacket::new(pid);
        packet.header.contains_payload = true;
        packet.payload = chunk.to_vec();
        packets.push(packet);
    }

    match r {
        0 => {}
        // 183 bytes plus a 2-byte adaptation field overflow one packet
        183 => {
            let (head, last) = tail.split_at(MAX_FILL);
            packets.push(stuffed(pid, head));
            packets.push(stuffed(pid, last));
        }
        _ => packets.push(stuffed(pid, tail)),
    }

    packets
}

fn stuffed(pid: u16, data: &[u8]) -> TSPacket {
    let mut packet = TSPacket::new(pid);
    packet.set_adaptation_field(AdaptationField::new());
    packet.fill(data, true);
    packet
}
