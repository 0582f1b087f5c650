/*
    Byte-level writer and reader for the transaction wire format.
*/

use crate::transaction::TxError;

/// Append-only byte writer with the integer, varint and push-data
/// encodings the wire format uses.
#[derive(Debug, Default)]
pub struct TxWriter {
    buf: Vec<u8>,
}

impl TxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_i32_le(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64_le(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// CompactSize: <0xFD inline, then 0xFD/0xFE/0xFF prefixed LE
    /// 16/32/64-bit.
    pub fn write_varint(&mut self, value: u64) {
        if value < 0xFD {
            self.buf.push(value as u8);
        } else if value <= 0xFFFF {
            self.buf.push(0xFD);
            self.buf.extend_from_slice(&(value as u16).to_le_bytes());
        } else if value <= 0xFFFF_FFFF {
            self.buf.push(0xFE);
            self.buf.extend_from_slice(&(value as u32).to_le_bytes());
        } else {
            self.buf.push(0xFF);
            self.buf.extend_from_slice(&value.to_le_bytes());
        }
    }

    /// Script push-data: raw length byte below OP_PUSHDATA1, then the
    /// 1-byte and 2-byte LE length forms.
    pub fn write_pushdata(&mut self, data: &[u8]) {
        if data.len() < 0x4C {
            self.buf.push(data.len() as u8);
        } else if data.len() < 0xFF {
            self.buf.push(0x4C);
            self.buf.push(data.len() as u8);
        } else {
            self.buf.push(0x4D);
            self.buf.extend_from_slice(&(data.len() as u16).to_le_bytes());
        }
        self.buf.extend_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over transaction wire bytes. Every read fails with
/// `Truncated` instead of panicking when the input runs out.
#[derive(Debug)]
pub struct TxReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> TxReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], TxError> {
        if self.remaining() < count {
            return Err(TxError::Truncated {
                wanted: count,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, TxError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i32_le(&mut self) -> Result<i32, TxError> {
        let bytes: [u8; 4] = self.read_bytes(4)?.try_into().expect("read 4 bytes");
        Ok(i32::from_le_bytes(bytes))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, TxError> {
        let bytes: [u8; 4] = self.read_bytes(4)?.try_into().expect("read 4 bytes");
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_i64_le(&mut self) -> Result<i64, TxError> {
        let bytes: [u8; 8] = self.read_bytes(8)?.try_into().expect("read 8 bytes");
        Ok(i64::from_le_bytes(bytes))
    }

    pub fn read_varint(&mut self) -> Result<u64, TxError> {
        match self.read_u8()? {
            0xFD => {
                let bytes: [u8; 2] = self.read_bytes(2)?.try_into().expect("read 2 bytes");
                Ok(u16::from_le_bytes(bytes) as u64)
            }
            0xFE => Ok(self.read_u32_le()? as u64),
            0xFF => {
                let bytes: [u8; 8] = self.read_bytes(8)?.try_into().expect("read 8 bytes");
                Ok(u64::from_le_bytes(bytes))
            }
            small => Ok(small as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_boundaries() {
        let cases: [(u64, &str); 6] = [
            (0, "00"),
            (0xFC, "fc"),
            (0xFD, "fdfd00"),
            (0xFFFF, "fdffff"),
            (0x1_0000, "fe00000100"),
            (0x1_0000_0000, "ff0000000001000000"),
        ];
        for (value, expected) in cases {
            let mut writer = TxWriter::new();
            writer.write_varint(value);
            assert_eq!(hex::encode(writer.as_bytes()), expected, "varint {value}");

            let mut reader = TxReader::new(writer.as_bytes());
            assert_eq!(reader.read_varint().unwrap(), value);
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn pushdata_forms() {
        let mut writer = TxWriter::new();
        writer.write_pushdata(&[0xAB; 3]);
        assert_eq!(hex::encode(writer.as_bytes()), "03ababab");

        let mut writer = TxWriter::new();
        writer.write_pushdata(&[0x01; 0x4C]);
        assert_eq!(writer.as_bytes()[0], 0x4C);
        assert_eq!(writer.as_bytes()[1], 0x4C);
        assert_eq!(writer.len(), 2 + 0x4C);

        let mut writer = TxWriter::new();
        writer.write_pushdata(&[0x02; 0x1FF]);
        assert_eq!(writer.as_bytes()[0], 0x4D);
        assert_eq!(&writer.as_bytes()[1..3], &0x1FFu16.to_le_bytes());
        assert_eq!(writer.len(), 3 + 0x1FF);
    }

    #[test]
    fn little_endian_integers() {
        let mut writer = TxWriter::new();
        writer.write_i32_le(2);
        writer.write_u32_le(0xFFFF_FFFF);
        writer.write_i64_le(50_000_000);
        assert_eq!(
            hex::encode(writer.as_bytes()),
            "02000000ffffffff80f0fa0200000000"
        );

        let mut reader = TxReader::new(writer.as_bytes());
        assert_eq!(reader.read_i32_le().unwrap(), 2);
        assert_eq!(reader.read_u32_le().unwrap(), 0xFFFF_FFFF);
        assert_eq!(reader.read_i64_le().unwrap(), 50_000_000);
    }

    #[test]
    fn truncated_reads_fail() {
        let mut reader = TxReader::new(&[0x01, 0x02]);
        assert_eq!(
            reader.read_u32_le(),
            Err(TxError::Truncated {
                wanted: 4,
                remaining: 2
            })
        );
        // Failed read consumes nothing.
        assert_eq!(reader.read_u8().unwrap(), 0x01);
    }
}
