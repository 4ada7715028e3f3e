/// Binary resource header and little-endian codec helpers
///
/// Every binary payload starts with a 16-byte header:
///
/// | offset | size | field          |
/// |--------|------|----------------|
/// | 0      | 4    | type code      |
/// | 4      | 4    | format version |
/// | 8      | 4    | payload size   |
/// | 12     | 4    | flags          |
///
/// followed by exactly `payload size` bytes.

use crate::error::{Error, Result};
use crate::resource::ResourceTypeCode;

/// Current binary layout version
pub const FORMAT_VERSION: u32 = 1;

/// Parsed binary header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceHeader {
    pub code: ResourceTypeCode,
    pub version: u32,
    pub payload_size: u32,
    pub flags: u32,
}

impl ResourceHeader {
    /// Encoded header size in bytes
    pub const SIZE: usize = 16;

    pub fn new(code: ResourceTypeCode, payload_size: u32, flags: u32) -> Self {
        Self { code, version: FORMAT_VERSION, payload_size, flags }
    }

    /// Validate `data` against `expected` and split off the payload
    ///
    /// Rejects short buffers, foreign tags, unknown versions and payloads
    /// whose length disagrees with the header.
    pub fn parse(data: &[u8], expected: ResourceTypeCode) -> Result<(Self, &[u8])> {
        if data.len() < Self::SIZE {
            return Err(Error::InvalidResource(format!(
                "{} bytes is shorter than the {}-byte header", data.len(), Self::SIZE)));
        }

        let mut reader = BinaryReader::new(&data[..Self::SIZE]);
        let code = ResourceTypeCode(reader.read_array::<4>()?);
        let header = Self {
            code,
            version: reader.read_u32()?,
            payload_size: reader.read_u32()?,
            flags: reader.read_u32()?,
        };

        if header.code != expected {
            return Err(Error::InvalidResource(format!(
                "type code '{}' does not match '{}'", header.code, expected)));
        }
        if header.version != FORMAT_VERSION {
            return Err(Error::InvalidResource(format!(
                "unsupported format version {}", header.version)));
        }

        let payload = &data[Self::SIZE..];
        if payload.len() != header.payload_size as usize {
            return Err(Error::InvalidResource(format!(
                "payload is {} bytes, header declares {}", payload.len(), header.payload_size)));
        }

        Ok((header, payload))
    }

    /// Header followed by `payload`
    pub fn encode(code: ResourceTypeCode, flags: u32, payload: &[u8]) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(Self::SIZE + payload.len());
        writer.write_bytes(code.as_bytes());
        writer.write_u32(FORMAT_VERSION);
        writer.write_u32(payload.len() as u32);
        writer.write_u32(flags);
        writer.write_bytes(payload);
        writer.into_bytes()
    }
}

// ===== READER =====

/// Bounds-checked little-endian cursor
pub struct BinaryReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::InvalidResource(format!(
                "truncated payload: need {} bytes at offset {}, {} left",
                len, self.offset, self.remaining())));
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Length-prefixed UTF-8 string
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::InvalidResource("string is not valid UTF-8".to_string()))
    }

    /// Length-prefixed byte blob
    pub fn read_blob(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }

    /// Fail unless every byte was consumed
    pub fn finish(self) -> Result<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(Error::InvalidResource(format!("{} trailing bytes", self.remaining())))
        }
    }
}

// ===== WRITER =====

/// Little-endian byte sink mirroring `BinaryReader`
#[derive(Default)]
pub struct BinaryWriter {
    bytes: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { bytes: Vec::with_capacity(capacity) }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_blob(value.as_bytes());
    }

    pub fn write_blob(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.write_bytes(bytes);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
#[path = "header_tests.rs"]
mod tests;
