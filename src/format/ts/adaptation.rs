use bytes::BufMut;

use super::clock::ProgramClockReference;
use crate::error::{Result, TsError};

const FLAG_DISCONTINUITY: u8 = 0x80;
const FLAG_RANDOM_ACCESS: u8 = 0x40;
const FLAG_ES_PRIORITY: u8 = 0x20;
const FLAG_PCR: u8 = 0x10;
const FLAG_OPCR: u8 = 0x08;
const FLAG_SPLICING_POINT: u8 = 0x04;
const FLAG_PRIVATE_DATA: u8 = 0x02;
const FLAG_EXTENSION: u8 = 0x01;

/// The adaptation field between the TS header and the payload.
///
/// `length` is the declared `adaptation_field_length` and must be refreshed
/// with [`compute`](Self::compute) after any content change. A zero length
/// is a single length byte used to pad one byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdaptationField {
    pub length: u8,
    pub discontinuity: bool,
    pub random_access: bool,
    pub es_priority: bool,
    pub pcr: Option<ProgramClockReference>,
    pub opcr: Option<ProgramClockReference>,
    pub splice_countdown: Option<i8>,
    pub private_data: Option<Vec<u8>>,
    /// Raw adaptation field extension, without its length byte.
    pub extension: Option<Vec<u8>>,
    pub stuffing_bytes: usize,
}

impl AdaptationField {
    /// An empty field carrying only its flags byte.
    pub fn new() -> Self {
        let mut field = Self::default();
        field.compute();
        field
    }

    pub fn with_pcr(pcr: ProgramClockReference) -> Self {
        let mut field = Self {
            pcr: Some(pcr),
            ..Default::default()
        };
        field.compute();
        field
    }

    /// Recalculates `length` from the flagged fields and the stuffing.
    pub fn compute(&mut self) {
        let mut length = 1;
        if self.pcr.is_some() {
            length += ProgramClockReference::SIZE;
        }
        if self.opcr.is_some() {
            length += ProgramClockReference::SIZE;
        }
        if self.splice_countdown.is_some() {
            length += 1;
        }
        if let Some(data) = &self.private_data {
            length += 1 + data.len();
        }
        if let Some(ext) = &self.extension {
            length += 1 + ext.len();
        }
        length += self.stuffing_bytes;

        if length > u8::MAX as usize {
            log::warn!("adaptation field length {} truncated", length);
        }
        self.length = length.min(u8::MAX as usize) as u8;
    }

    /// Adds `count` stuffing bytes and recomputes the length.
    pub fn stuffing(&mut self, count: usize) {
        self.stuffing_bytes += count;
        self.compute();
    }

    /// Bytes on the wire, length byte included.
    pub fn encoded_len(&self) -> usize {
        1 + self.length as usize
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.discontinuity {
            flags |= FLAG_DISCONTINUITY;
        }
        if self.random_access {
            flags |= FLAG_RANDOM_ACCESS;
        }
        if self.es_priority {
            flags |= FLAG_ES_PRIORITY;
        }
        if self.pcr.is_some() {
            flags |= FLAG_PCR;
        }
        if self.opcr.is_some() {
            flags |= FLAG_OPCR;
        }
        if self.splice_countdown.is_some() {
            flags |= FLAG_SPLICING_POINT;
        }
        if self.private_data.is_some() {
            flags |= FLAG_PRIVATE_DATA;
        }
        if self.extension.is_some() {
            flags |= FLAG_EXTENSION;
        }
        flags
    }

    pub fn write_to(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.length);
        if self.length == 0 {
            return;
        }

        buf.put_u8(self.flags());
        if let Some(pcr) = &self.pcr {
            buf.put_slice(&pcr.encode());
        }
        if let Some(opcr) = &self.opcr {
            buf.put_slice(&opcr.encode());
        }
        if let Some(countdown) = self.splice_countdown {
            buf.put_i8(countdown);
        }
        if let Some(data) = &self.private_data {
            buf.put_u8(data.len() as u8);
            buf.put_slice(data);
        }
        if let Some(ext) = &self.extension {
            buf.put_u8(ext.len() as u8);
            buf.put_slice(ext);
        }
        buf.put_bytes(0xFF, self.stuffing_bytes);
    }

    /// Parses a field starting at its length byte. Whatever follows the
    /// flagged fields inside the declared length counts as stuffing.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let Some(&length) = data.first() else {
            return Err(TsError::MalformedInput("empty adaptation field".into()));
        };
        if length == 0 {
            return Ok(Self::default());
        }

        let body = data.get(1..1 + length as usize).ok_or_else(|| {
            TsError::MalformedInput(format!(
                "adaptation field declares {} bytes, {} available",
                length,
                data.len() - 1
            ))
        })?;

        let flags = body[0];
        let mut reader = FieldReader { data: body, pos: 1 };

        let mut field = Self {
            length,
            discontinuity: flags & FLAG_DISCONTINUITY != 0,
            random_access: flags & FLAG_RANDOM_ACCESS != 0,
            es_priority: flags & FLAG_ES_PRIORITY != 0,
            ..Default::default()
        };

        if flags & FLAG_PCR != 0 {
            field.pcr = ProgramClockReference::decode(reader.take(ProgramClockReference::SIZE, "PCR")?);
        }
        if flags & FLAG_OPCR != 0 {
            field.opcr = ProgramClockReference::decode(reader.take(ProgramClockReference::SIZE, "OPCR")?);
        }
        if flags & FLAG_SPLICING_POINT != 0 {
            field.splice_countdown = Some(reader.take(1, "splice countdown")?[0] as i8);
        }
        if flags & FLAG_PRIVATE_DATA != 0 {
            let len = reader.take(1, "private data length")?[0] as usize;
            field.private_data = Some(reader.take(len, "private data")?.to_vec());
        }
        if flags & FLAG_EXTENSION != 0 {
            let len = reader.take(1, "extension length")?[0] as usize;
            field.extension = Some(reader.take(len, "extension")?.to_vec());
        }
        field.stuffing_bytes = body.len() - reader.pos;

        Ok(field)
    }
}

struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let slice = self.data.get(self.pos..self.pos + n).ok_or_else(|| {
            TsError::MalformedInput(format!("adaptation field truncated in {}", what))
        })?;
        self.pos += n;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use pretty_assertions::assert_eq;

    fn encode(field: &AdaptationField) -> Vec<u8> {
        let mut buf = BytesMut::new();
        field.write_to(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn test_empty_field() {
        let field = AdaptationField::new();
        assert_eq!(field.length, 1);
        assert_eq!(encode(&field), vec![0x01, 0x00]);
    }

    #[test]
    fn test_zero_length_field_is_one_byte() {
        let field = AdaptationField::default();
        assert_eq!(field.encoded_len(), 1);
        assert_eq!(encode(&field), vec![0x00]);
        assert_eq!(AdaptationField::parse(&[0x00]).unwrap(), field);
    }

    #[test]
    fn test_pcr_field() {
        let mut field = AdaptationField::with_pcr(ProgramClockReference::from_ticks(90_000));
        field.random_access = true;
        assert_eq!(field.length, 7);

        let bytes = encode(&field);
        assert_eq!(bytes.len(), 8);
        assert_eq!(bytes[1], FLAG_RANDOM_ACCESS | FLAG_PCR);
        assert_eq!(AdaptationField::parse(&bytes).unwrap(), field);
    }

    #[test]
    fn test_compute_counts_every_field() {
        let mut field = AdaptationField {
            pcr: Some(ProgramClockReference::default()),
            opcr: Some(ProgramClockReference::default()),
            splice_countdown: Some(-3),
            private_data: Some(vec![1, 2, 3]),
            extension: Some(vec![0x00]),
            ..Default::default()
        };
        field.stuffing(4);
        // flags + pcr + opcr + splice + (1 + 3) + (1 + 1) + stuffing
        assert_eq!(field.length, 1 + 6 + 6 + 1 + 4 + 2 + 4);

        let bytes = encode(&field);
        assert_eq!(bytes.len(), field.encoded_len());
        assert_eq!(&bytes[bytes.len() - 4..], &[0xFF; 4]);
        assert_eq!(AdaptationField::parse(&bytes).unwrap(), field);
    }

    #[test]
    fn test_parse_truncated() {
        assert!(AdaptationField::parse(&[]).is_err());
        assert!(matches!(
            AdaptationField::parse(&[0x07, 0x10, 0x00]),
            Err(TsError::MalformedInput(_))
        ));
        // PCR flagged but only two bytes declared
        assert!(AdaptationField::parse(&[0x02, 0x10, 0x00]).is_err());
    }
}
