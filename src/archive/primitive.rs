//! Fixed-width integer and byte-slice access over an in-memory archive.

use binrw::BinReaderExt;
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{Cursor, Write};

use crate::archive::header::{ChunkHeader, Tag};
use crate::error::{BwresError, Result};

/// Bounds-checked read position over a borrowed buffer.
///
/// Offsets reported in errors are relative to `base`, so a cursor over a
/// section payload still points into the original archive.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, base: 0 }
    }

    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Position within the outermost buffer.
    pub fn absolute_position(&self) -> usize {
        self.base + self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(BwresError::TruncatedInput {
                offset: self.absolute_position(),
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn peek(&self, n: usize) -> Option<&'a [u8]> {
        self.data.get(self.pos..self.pos + n)
    }

    pub fn read_tag(&mut self) -> Result<Tag> {
        let b = self.take(4)?;
        Ok(Tag([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_chunk_header(&mut self) -> Result<ChunkHeader> {
        let raw = self.take(ChunkHeader::SIZE)?;
        Ok(Cursor::new(raw).read_le::<ChunkHeader>()?)
    }

    /// Reads a u32 length followed by that many name bytes.
    pub fn read_prefixed_bytes(&mut self) -> Result<&'a [u8]> {
        let len = read_u32_le(self)? as usize;
        self.take(len)
    }
}

pub fn read_u32_le(cursor: &mut ByteCursor<'_>) -> Result<u32> {
    Ok(LittleEndian::read_u32(cursor.take(4)?))
}

pub fn read_u32_be(cursor: &mut ByteCursor<'_>) -> Result<u32> {
    Ok(BigEndian::read_u32(cursor.take(4)?))
}

pub fn write_u32_le<W: Write>(sink: &mut W, v: u32) -> Result<()> {
    sink.write_u32::<LittleEndian>(v)?;
    Ok(())
}

/// Writes `bytes` behind a u32 length prefix.
pub fn write_prefixed_bytes<W: Write>(sink: &mut W, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| BwresError::NameTooLong {
        name: name_from_bytes(&bytes[..bytes.len().min(64)]),
        len: bytes.len(),
        max: u32::MAX as usize,
    })?;
    write_u32_le(sink, len)?;
    sink.write_all(bytes)?;
    Ok(())
}

/// Maps each byte to the char of the same value so any name round-trips.
pub fn name_from_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub fn name_to_bytes(name: &str) -> Result<Vec<u8>> {
    name.chars()
        .map(|c| u8::try_from(c).map_err(|_| BwresError::InvalidName(name.to_string())))
        .collect()
}

/// Name stored in a fixed-width field, cut at the first NUL.
pub fn trimmed_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    name_from_bytes(&field[..end])
}

/// Left-justifies `name` in a NUL-padded field of `width` bytes.
pub fn padded_field(name: &str, width: usize) -> Result<Vec<u8>> {
    let mut bytes = name_to_bytes(name)?;
    if bytes.len() > width {
        return Err(BwresError::NameTooLong {
            name: name.to_string(),
            len: bytes.len(),
            max: width,
        });
    }
    bytes.resize(width, 0);
    Ok(bytes)
}
