//! Byte-level encoding of snapshots.
//!
//! Snapshots are written field by field with no framing beyond what the
//! command layout itself prescribes. All multi-byte integers are
//! little-endian; strings are UTF-8 with a `u32` byte-length prefix. The
//! reader fails loudly on truncation rather than guessing.

use anyhow::{Context, Result, bail};

/// Appends snapshot fields to a growable buffer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_str(&mut self, value: &str) {
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a snapshot blob.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            bail!(
                "snapshot truncated: wanted {} more bytes, {} left",
                len,
                self.remaining()
            );
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn take_bool(&mut self) -> Result<bool> {
        Ok(self.take_u8()? != 0)
    }

    pub fn take_u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn take_i32(&mut self) -> Result<i32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(i32::from_le_bytes(bytes))
    }

    pub fn take_i64(&mut self) -> Result<i64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(i64::from_le_bytes(bytes))
    }

    pub fn take_str(&mut self) -> Result<String> {
        let len = self.take_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).context("snapshot string is not valid UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_round_trip() {
        let mut writer = ByteWriter::new();
        writer.put_u8(7);
        writer.put_i32(-42);
        writer.put_u32(1_000_000);
        writer.put_i64(i64::MIN);
        writer.put_bool(true);
        let bytes = writer.into_bytes();

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.take_u8().unwrap(), 7);
        assert_eq!(reader.take_i32().unwrap(), -42);
        assert_eq!(reader.take_u32().unwrap(), 1_000_000);
        assert_eq!(reader.take_i64().unwrap(), i64::MIN);
        assert!(reader.take_bool().unwrap());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_integers_are_little_endian() {
        let mut writer = ByteWriter::new();
        writer.put_u32(0x0102_0304);
        assert_eq!(writer.into_bytes(), vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_strings_are_length_prefixed() {
        let mut writer = ByteWriter::new();
        writer.put_str("hi");
        writer.put_str("");
        let bytes = writer.into_bytes();

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.take_str().unwrap(), "hi");
        assert_eq!(reader.take_str().unwrap(), "");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_truncated_input_fails() {
        let mut reader = ByteReader::new(&[1, 2]);
        let err = reader.take_i32().unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let mut writer = ByteWriter::new();
        writer.put_u32(2);
        writer.put_u8(0xff);
        writer.put_u8(0xfe);
        let bytes = writer.into_bytes();

        assert!(ByteReader::new(&bytes).take_str().is_err());
    }
}
