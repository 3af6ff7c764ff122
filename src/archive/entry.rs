//! Typed views over the resource kinds an archive carries.

use crate::archive::header::{ChunkHeader, GameVariant, MODEL_DATA};
use crate::archive::kind::{FieldOrder, ResourceKind, SOUND_NAME_WIDTH};
use crate::archive::primitive::{
    name_from_bytes, name_to_bytes, padded_field, read_u32_be, read_u32_le, trimmed_name,
    write_prefixed_bytes, ByteCursor,
};
use crate::archive::resource::{read_resource, Resource};
use crate::error::{BwresError, Result};

/// A resource kind with a fixed payload interpretation.
pub trait Entry: Sized {
    const KIND: ResourceKind;

    /// Parses the payload. Trailing bytes are rejected by `from_resource`.
    fn decode(payload: &mut ByteCursor<'_>, variant: GameVariant) -> Result<Self>;

    fn encode_payload(&self, variant: GameVariant) -> Result<Vec<u8>>;

    /// `offset` is where the resource's tag starts in the archive.
    fn from_resource(resource: &Resource, offset: usize, variant: GameVariant) -> Result<Self> {
        let mut cursor = ByteCursor::with_base(&resource.payload, offset + ChunkHeader::SIZE);
        let entry = Self::decode(&mut cursor, variant)?;
        if !cursor.is_empty() {
            return Err(BwresError::MisalignedSection {
                tag: resource.tag,
                expected_end: offset + resource.framed_len(),
                actual: cursor.absolute_position(),
            });
        }
        Ok(entry)
    }

    fn to_resource(&self, variant: GameVariant) -> Result<Resource> {
        Ok(Resource::new(Self::KIND.tag(variant), self.encode_payload(variant)?))
    }
}

/// Texture payload: NUL-padded name field of variant-dependent width, then
/// the texture bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    name_field: Vec<u8>,
    pub data: Vec<u8>,
}

impl Texture {
    pub fn new(variant: GameVariant, name: &str, data: Vec<u8>) -> Result<Self> {
        Ok(Self {
            name_field: padded_field(name, variant.texture_name_width())?,
            data,
        })
    }

    /// Splits a whole texture payload, as stored in a `.texture` file.
    pub fn from_payload(variant: GameVariant, payload: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(payload);
        Self::decode(&mut cursor, variant)
    }

    pub fn name(&self) -> String {
        trimmed_name(&self.name_field)
    }

    pub fn name_field(&self) -> &[u8] {
        &self.name_field
    }

    pub fn payload(&self, variant: GameVariant) -> Result<Vec<u8>> {
        self.encode_payload(variant)
    }

    /// Width and height from the header words that follow the name field.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let mut cursor = ByteCursor::new(&self.data);
        let read: fn(&mut ByteCursor<'_>) -> Result<u32> = match Self::KIND.field_order() {
            FieldOrder::Big => read_u32_be,
            FieldOrder::Little => read_u32_le,
        };
        let width = read(&mut cursor).ok()?;
        let height = read(&mut cursor).ok()?;
        Some((width, height))
    }
}

impl Entry for Texture {
    const KIND: ResourceKind = ResourceKind::Texture;

    fn decode(payload: &mut ByteCursor<'_>, variant: GameVariant) -> Result<Self> {
        let name_field = payload.take(variant.texture_name_width())?.to_vec();
        let data = payload.take(payload.remaining())?.to_vec();
        Ok(Self { name_field, data })
    }

    fn encode_payload(&self, variant: GameVariant) -> Result<Vec<u8>> {
        let width = variant.texture_name_width();
        // Re-pad when the texture came from the other variant.
        let mut payload = if self.name_field.len() == width {
            self.name_field.clone()
        } else {
            padded_field(&self.name(), width)?
        };
        payload.extend_from_slice(&self.data);
        Ok(payload)
    }
}

/// Model payload: prefixed name, then a nested model-data resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub name: String,
    pub data: Vec<u8>,
}

impl Model {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self { name: name.into(), data }
    }
}

impl Entry for Model {
    const KIND: ResourceKind = ResourceKind::Model;

    fn decode(payload: &mut ByteCursor<'_>, _variant: GameVariant) -> Result<Self> {
        let name = name_from_bytes(payload.read_prefixed_bytes()?);
        let inner_offset = payload.absolute_position();
        let inner = read_resource(payload)?;
        if inner.tag != MODEL_DATA {
            return Err(BwresError::UnexpectedTag {
                offset: inner_offset,
                expected: MODEL_DATA,
                found: inner.tag,
            });
        }
        Ok(Self { name, data: inner.payload })
    }

    fn encode_payload(&self, _variant: GameVariant) -> Result<Vec<u8>> {
        let name = name_to_bytes(&self.name)?;
        let mut payload = Vec::with_capacity(4 + name.len() + ChunkHeader::SIZE + self.data.len());
        write_prefixed_bytes(&mut payload, &name)?;
        // The nested length is known before the outer one is computed.
        let inner = Resource::new(MODEL_DATA, self.data.clone());
        payload.extend_from_slice(&inner.to_bytes()?);
        Ok(payload)
    }
}

macro_rules! named_entry {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub name: String,
            pub data: Vec<u8>,
        }

        impl $name {
            pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
                Self { name: name.into(), data }
            }
        }

        impl Entry for $name {
            const KIND: ResourceKind = $kind;

            fn decode(payload: &mut ByteCursor<'_>, _variant: GameVariant) -> Result<Self> {
                let name = name_from_bytes(payload.read_prefixed_bytes()?);
                let data = payload.take(payload.remaining())?.to_vec();
                Ok(Self { name, data })
            }

            fn encode_payload(&self, _variant: GameVariant) -> Result<Vec<u8>> {
                let name = name_to_bytes(&self.name)?;
                let mut payload = Vec::with_capacity(4 + name.len() + self.data.len());
                write_prefixed_bytes(&mut payload, &name)?;
                payload.extend_from_slice(&self.data);
                Ok(payload)
            }
        }
    };
}

named_entry!(
    /// Prefixed name with the animation bytes appended in the same payload.
    Animation,
    ResourceKind::Animation
);
named_entry!(
    /// Prefixed name with the particle definition text appended.
    Effect,
    ResourceKind::Effect
);
named_entry!(
    /// Prefixed name with compiled script bytes appended.
    Script,
    ResourceKind::Script
);

/// 32-byte NUL-padded name announcing the sound data that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundHeader {
    name_field: [u8; SOUND_NAME_WIDTH],
}

impl SoundHeader {
    pub fn new(name: &str) -> Result<Self> {
        let field = padded_field(name, SOUND_NAME_WIDTH)?;
        let mut name_field = [0u8; SOUND_NAME_WIDTH];
        name_field.copy_from_slice(&field);
        Ok(Self { name_field })
    }

    pub fn name(&self) -> String {
        trimmed_name(&self.name_field)
    }

    pub fn name_field(&self) -> &[u8; SOUND_NAME_WIDTH] {
        &self.name_field
    }
}

impl Entry for SoundHeader {
    const KIND: ResourceKind = ResourceKind::SoundHeader;

    fn decode(payload: &mut ByteCursor<'_>, _variant: GameVariant) -> Result<Self> {
        let mut name_field = [0u8; SOUND_NAME_WIDTH];
        name_field.copy_from_slice(payload.take(SOUND_NAME_WIDTH)?);
        Ok(Self { name_field })
    }

    fn encode_payload(&self, _variant: GameVariant) -> Result<Vec<u8>> {
        Ok(self.name_field.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundData {
    pub data: Vec<u8>,
}

impl Entry for SoundData {
    const KIND: ResourceKind = ResourceKind::SoundData;

    fn decode(payload: &mut ByteCursor<'_>, _variant: GameVariant) -> Result<Self> {
        Ok(Self { data: payload.take(payload.remaining())?.to_vec() })
    }

    fn encode_payload(&self, _variant: GameVariant) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}

/// One element of the flat sound collection. Valid collections alternate
/// header, data, header, data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundEntry {
    Header(SoundHeader),
    Data(SoundData),
}

impl SoundEntry {
    pub fn to_resource(&self, variant: GameVariant) -> Result<Resource> {
        match self {
            SoundEntry::Header(header) => header.to_resource(variant),
            SoundEntry::Data(data) => data.to_resource(variant),
        }
    }
}
