//! 90 kHz timestamps and the 27 MHz program clock reference.

use std::time::Duration;

use super::types::{PCR_HZ, PTS_HZ};

/// PTS/DTS are 33-bit counters.
pub const TIMESTAMP_MASK: u64 = 0x1_FFFF_FFFF;

/// Prefix nibble for a PTS when no DTS follows.
pub const PTS_ONLY_PREFIX: u8 = 0x20;
/// Prefix nibble for a PTS followed by a DTS.
pub const PTS_WITH_DTS_PREFIX: u8 = 0x30;
/// Prefix nibble for a DTS.
pub const DTS_PREFIX: u8 = 0x10;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Rounds a duration to the nearest 90 kHz tick.
pub fn duration_to_ticks(duration: Duration) -> u64 {
    let nanos = duration.as_nanos();
    ((nanos * PTS_HZ as u128 + NANOS_PER_SEC / 2) / NANOS_PER_SEC) as u64
}

pub fn ticks_to_duration(ticks: u64) -> Duration {
    Duration::from_nanos(((ticks as u128 * NANOS_PER_SEC) / PTS_HZ as u128) as u64)
}

/// 90 kHz ticks elapsed from `reference` to `time`, saturating at zero and
/// wrapped to 33 bits.
pub fn ticks_since(time: Duration, reference: Duration) -> u64 {
    duration_to_ticks(time.saturating_sub(reference)) & TIMESTAMP_MASK
}

/// Packs a 33-bit timestamp into the 5-byte PES layout:
/// `pppp vvv1 | vvvvvvvv | vvvvvvv1 | vvvvvvvv | vvvvvvv1`.
pub fn encode_timestamp(ts: u64, prefix: u8) -> [u8; 5] {
    let ts = ts & TIMESTAMP_MASK;
    let high = (((ts >> 14) & 0xFFFE) | 0x01) as u16;
    let low = (((ts << 1) & 0xFFFE) | 0x01) as u16;
    let [h0, h1] = high.to_be_bytes();
    let [l0, l1] = low.to_be_bytes();
    [
        (prefix & 0xF0) | ((ts >> 29) & 0x0E) as u8 | 0x01,
        h0,
        h1,
        l0,
        l1,
    ]
}

pub fn decode_timestamp(data: &[u8]) -> Option<u64> {
    let b = data.get(..5)?;
    Some(
        ((b[0] as u64 & 0x0E) << 29)
            | ((b[1] as u64) << 22)
            | ((b[2] as u64 & 0xFE) << 14)
            | ((b[3] as u64) << 7)
            | ((b[4] as u64) >> 1),
    )
}

/// Program Clock Reference: 33-bit base at 90 kHz plus a 9-bit extension
/// at 27 MHz, serialized with six reserved `1` bits between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgramClockReference {
    pub base: u64,
    pub extension: u16,
}

impl ProgramClockReference {
    pub const SIZE: usize = 6;

    pub fn new(base: u64, extension: u16) -> Self {
        Self {
            base: base & TIMESTAMP_MASK,
            extension: extension & 0x1FF,
        }
    }

    /// A PCR on the 90 kHz grid, extension zero.
    pub fn from_ticks(ticks: u64) -> Self {
        Self::new(ticks, 0)
    }

    pub fn from_duration(duration: Duration) -> Self {
        let clock = (duration.as_nanos() * PCR_HZ as u128 / NANOS_PER_SEC) as u64;
        Self::new(clock / 300, (clock % 300) as u16)
    }

    /// Full value at 27 MHz.
    pub fn as_27mhz(&self) -> u64 {
        self.base * 300 + self.extension as u64
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_nanos(((self.as_27mhz() as u128 * NANOS_PER_SEC) / PCR_HZ as u128) as u64)
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let base = self.base & TIMESTAMP_MASK;
        let ext = self.extension & 0x1FF;
        [
            (base >> 25) as u8,
            (base >> 17) as u8,
            (base >> 9) as u8,
            (base >> 1) as u8,
            (((base & 0x01) as u8) << 7) | 0x7E | (ext >> 8) as u8,
            ext as u8,
        ]
    }

    pub fn decode(data: &[u8]) -> Option<Self> {
        let b = data.get(..Self::SIZE)?;
        let base = ((b[0] as u64) << 25)
            | ((b[1] as u64) << 17)
            | ((b[2] as u64) << 9)
            | ((b[3] as u64) << 1)
            | ((b[4] as u64) >> 7);
        let extension = (((b[4] & 0x01) as u16) << 8) | b[5] as u16;
        Some(Self { base, extension })
    }
}
