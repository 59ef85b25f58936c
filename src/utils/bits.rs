use crate::error::{Result, TsError};

/// A bit-level reader for parsing binary data streams.
///
/// Bits are consumed most-significant first, which is how every MPEG
/// bit-field (ADTS, AudioSpecificConfig, TS/PES headers) is laid out.
///
/// Example:
/// ```
/// use tsmux::utils::BitReader;
///
/// let data = [0b10110011];
/// let mut reader = BitReader::new(&data);
///
/// assert_eq!(reader.read_bit().unwrap(), true);   // 1
/// assert_eq!(reader.read_bits(3).unwrap(), 0b011); // 011
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_offset: usize,
    bit_offset: u8,
}

impl<'a> BitReader<'a> {
    /// Creates a new BitReader from a byte slice
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Reads a single bit from the stream.
    /// Returns true for 1, false for 0.
    ///
    /// Returns error if end of data is reached.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.byte_offset >= self.data.len() {
            return Err(TsError::Codec("Reached end of data".into()));
        }

        let bit = (self.data[self.byte_offset] >> (7 - self.bit_offset)) & 1;
        self.bit_offset += 1;

        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }

        Ok(bit == 1)
    }

    /// Reads n bits and returns them as a number.
    /// The bits are interpreted as big-endian.
    ///
    /// Returns error if n > 32 or end of data is reached.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if n > 32 {
            return Err(TsError::Codec("Too many bits requested".into()));
        }

        let mut value = 0u32;
        let n = n as usize;

        for i in 0..n {
            let bit = self.read_bit()?;
            if bit {
                value |= 1 << (n - 1 - i);
            }
        }

        Ok(value)
    }

    /// Skips n bits in the stream.
    pub fn skip_bits(&mut self, n: u32) -> Result<()> {
        for _ in 0..n {
            self.read_bit()?;
        }
        Ok(())
    }

    /// Aligns reader to next byte boundary by skipping remaining bits in current byte.
    pub fn align_byte(&mut self) {
        if self.bit_offset != 0 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
    }

    /// Returns number of bits available to read.
    pub fn available_bits(&self) -> usize {
        (self.data.len().saturating_sub(self.byte_offset)) * 8 - self.bit_offset as usize
    }
}

/// Bit-level writer, the inverse of [`BitReader`].
///
/// ```
/// use tsmux::utils::BitWriter;
///
/// let mut writer = BitWriter::new();
/// writer.write_bits(0b101, 3);
/// writer.write_bits(0b00001, 5);
/// assert_eq!(writer.into_bytes(), vec![0b1010_0001]);
/// ```
#[derive(Debug, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    bit_offset: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            bit_offset: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        if self.bit_offset == 0 {
            self.data.push(0);
        }
        if bit {
            if let Some(last) = self.data.last_mut() {
                *last |= 1 << (7 - self.bit_offset);
            }
        }
        self.bit_offset = (self.bit_offset + 1) % 8;
    }

    /// Writes the low `n` bits of `value`, most significant first.
    /// Bits above 32 are ignored.
    pub fn write_bits(&mut self, value: u32, n: u32) {
        let n = n.min(32);
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> usize {
        if self.bit_offset == 0 {
            self.data.len() * 8
        } else {
            (self.data.len() - 1) * 8 + self.bit_offset as usize
        }
    }

    /// Returns the written bytes; a trailing partial byte is zero padded.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_read_bits() {
        // Simple pattern within a byte
        let data = [0b10110011];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(5).unwrap(), 0b10011);

        // Cross-byte boundary
        let data = [0b10110011, 0b01011010];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(8).unwrap(), 0b10011010);

        // Reading zero bits
        let data = [0b10101010];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(0).unwrap(), 0);

        // Error on too many bits
        let data = [0xFF];
        let mut reader = BitReader::new(&data);
        assert!(reader.read_bits(33).is_err());
    }

    #[test]
    fn test_error_cases() {
        let data = [0xFF];
        let mut reader = BitReader::new(&data);
        reader.read_bits(8).unwrap();
        assert!(reader.read_bit().is_err());

        let data = [0xFF, 0x00];
        let mut reader = BitReader::new(&data);
        reader.read_bits(3).unwrap();
        assert_eq!(reader.bit_offset, 3);
        reader.align_byte();
        assert_eq!(reader.bit_offset, 0);
        assert_eq!(reader.byte_offset, 1);
        assert_eq!(reader.available_bits(), 8);
    }

    #[test]
    fn test_write_bits_across_bytes() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xFFF, 12);
        writer.write_bits(0b1001, 4);
        writer.write_bits(0b1, 1);
        assert_eq!(writer.bit_len(), 17);
        assert_eq!(writer.into_bytes(), vec![0xFF, 0xF9, 0x80]);
    }

    #[quickcheck]
    fn prop_writer_reader_agree(fields: Vec<(u32, u8)>) -> bool {
        let fields: Vec<(u32, u32)> = fields
            .into_iter()
            .map(|(v, n)| {
                let n = (n % 32) as u32 + 1;
                (v & (u32::MAX >> (32 - n)), n)
            })
            .collect();

        let mut writer = BitWriter::new();
        for &(value, n) in &fields {
            writer.write_bits(value, n);
        }
        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);

        fields
            .iter()
            .all(|&(value, n)| reader.read_bits(n).map(|v| v == value).unwrap_or(false))
    }
}
