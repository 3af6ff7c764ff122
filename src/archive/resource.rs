use binrw::BinWriterExt;
use std::io::{Cursor, Seek, SeekFrom, Write};

use crate::archive::header::{ChunkHeader, Tag};
use crate::archive::primitive::{write_prefixed_bytes, write_u32_le, ByteCursor};
use crate::error::{BwresError, Result};

/// Tag plus opaque payload. The length field is derived from the payload
/// and only materialises when the resource is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub tag: Tag,
    pub payload: Vec<u8>,
}

impl Resource {
    pub fn new(tag: Tag, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }

    /// Size on disk including tag and length field.
    pub fn framed_len(&self) -> usize {
        ChunkHeader::SIZE + self.payload.len()
    }

    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        let length = u32::try_from(self.payload.len()).map_err(|_| BwresError::SectionTooLarge {
            tag: self.tag,
            length: self.payload.len(),
        })?;
        writer.write_le(&ChunkHeader { tag: self.tag, length })?;
        writer.write_all(&self.payload)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(self.framed_len()));
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Reads one resource; the payload is sliced out but not interpreted.
pub fn read_resource(cursor: &mut ByteCursor<'_>) -> Result<Resource> {
    let header = cursor.read_chunk_header()?;
    let payload = cursor.take(header.length as usize)?;
    Ok(Resource::new(header.tag, payload.to_vec()))
}

/// Reads back-to-back resources until the cursor sits exactly on `end`.
///
/// `end` is a cursor-relative offset. A resource that would cross it, or a
/// start position already past it, fails with `MisalignedSection`.
pub fn read_resource_sequence(
    cursor: &mut ByteCursor<'_>,
    end: usize,
    section: Tag,
) -> Result<Vec<Resource>> {
    let base = cursor.absolute_position() - cursor.position();
    let mut resources = Vec::new();
    while cursor.position() < end {
        let misaligned = BwresError::MisalignedSection {
            tag: section,
            expected_end: base + end,
            actual: cursor.absolute_position(),
        };
        let length = match cursor.peek(ChunkHeader::SIZE) {
            Some(head) => u32::from_le_bytes([head[4], head[5], head[6], head[7]]) as usize,
            None => return Err(misaligned),
        };
        if cursor.position() + ChunkHeader::SIZE + length > end {
            return Err(misaligned);
        }
        resources.push(read_resource(cursor)?);
    }
    if cursor.position() != end {
        return Err(BwresError::MisalignedSection {
            tag: section,
            expected_end: base + end,
            actual: cursor.absolute_position(),
        });
    }
    Ok(resources)
}

/// Reserved length field of a section whose size is not yet known.
#[must_use = "an open section must be closed with ArchiveWriter::end_section"]
#[derive(Debug)]
pub struct OpenSection {
    tag: Tag,
    length_offset: u64,
}

/// Growable in-memory archive sink with length patch-back.
///
/// `begin_section` writes the tag and a placeholder length, `end_section`
/// measures what was written since and overwrites the placeholder.
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    inner: Cursor<Vec<u8>>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    pub fn begin_section(&mut self, tag: Tag) -> Result<OpenSection> {
        self.inner.write_all(tag.as_bytes())?;
        let length_offset = self.inner.stream_position()?;
        write_u32_le(&mut self.inner, 0)?;
        Ok(OpenSection { tag, length_offset })
    }

    pub fn end_section(&mut self, section: OpenSection) -> Result<u32> {
        let end = self.inner.stream_position()?;
        let length = (end - section.length_offset - 4) as usize;
        let length = u32::try_from(length).map_err(|_| BwresError::SectionTooLarge {
            tag: section.tag,
            length,
        })?;

        self.inner.seek(SeekFrom::Start(section.length_offset))?;
        write_u32_le(&mut self.inner, length)?;
        self.inner.seek(SeekFrom::Start(end))?;
        Ok(length)
    }

    pub fn write_resource(&mut self, resource: &Resource) -> Result<()> {
        resource.write_to(&mut self.inner)
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        write_u32_le(&mut self.inner, v)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub fn write_prefixed(&mut self, bytes: &[u8]) -> Result<()> {
        write_prefixed_bytes(&mut self.inner, bytes)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}
