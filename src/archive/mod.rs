pub mod entry;
pub mod header;
pub mod kind;
pub mod primitive;
pub mod resource;

use log::{debug, info, warn};

use entry::{Animation, Effect, Entry, Model, Script, SoundData, SoundEntry, SoundHeader, Texture};
use header::{ChunkHeader, GameVariant, Tag, ROOT, SOUND_GROUP, SOUND_SECTION};
use kind::ResourceKind;
use primitive::{name_from_bytes, name_to_bytes, read_u32_le, ByteCursor};
use resource::{read_resource, read_resource_sequence, ArchiveWriter, Resource};

use crate::error::{BwresError, Result};

/// A decoded resource archive.
///
/// The typed collections keep stream order. `stream_layout` remembers how the
/// trailing stream interleaved models, animations, effects, scripts and
/// opaque resources so a re-encode reproduces the original bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub variant: GameVariant,
    pub level_name: String,
    /// Name carried by the sound section; the packer always writes the level name here.
    pub sound_bank_name: String,
    pub textures: Vec<Texture>,
    pub models: Vec<Model>,
    pub sounds: Vec<SoundEntry>,
    pub animations: Vec<Animation>,
    pub effects: Vec<Effect>,
    pub scripts: Vec<Script>,
    pub unknown: Vec<Resource>,
    pub stream_layout: Option<Vec<ResourceKind>>,
}

impl Archive {
    pub fn new(variant: GameVariant, level_name: impl Into<String>) -> Self {
        let level_name = level_name.into();
        Self {
            variant,
            sound_bank_name: level_name.clone(),
            level_name,
            textures: Vec::new(),
            models: Vec::new(),
            sounds: Vec::new(),
            animations: Vec::new(),
            effects: Vec::new(),
            scripts: Vec::new(),
            unknown: Vec::new(),
            stream_layout: None,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        decode(data)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self, self.variant)
    }

    /// Appends a header/data pair to the sound collection.
    pub fn push_sound(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let header = SoundHeader::new(name)?;
        self.sounds.push(SoundEntry::Header(header));
        self.sounds.push(SoundEntry::Data(SoundData { data }));
        Ok(())
    }

    /// Header/data pairs in collection order. Stops at the first element
    /// that breaks the alternation.
    pub fn sound_pairs(&self) -> impl Iterator<Item = (&SoundHeader, &SoundData)> + '_ {
        self.sounds.chunks(2).map_while(|pair| match pair {
            [SoundEntry::Header(h), SoundEntry::Data(d)] => Some((h, d)),
            _ => None,
        })
    }

    /// Textures whose name appears somewhere in the model's bytes.
    ///
    /// Models reference textures by name inside their own data, so a plain
    /// substring search finds most of them. It can over-match short names.
    pub fn textures_for_model(&self, model: &Model) -> Vec<&Texture> {
        self.textures
            .iter()
            .filter(|tex| {
                let name = tex.name();
                !name.is_empty()
                    && name_to_bytes(&name)
                        .map(|needle| contains_bytes(&model.data, &needle))
                        .unwrap_or(false)
            })
            .collect()
    }

    fn stream_resources(&self, variant: GameVariant) -> Result<Vec<Resource>> {
        let mut out = Vec::with_capacity(
            self.models.len()
                + self.animations.len()
                + self.effects.len()
                + self.scripts.len()
                + self.unknown.len(),
        );

        if let Some(layout) = self.stream_layout.as_ref().filter(|l| self.layout_matches(l)) {
            let mut models = self.models.iter();
            let mut animations = self.animations.iter();
            let mut effects = self.effects.iter();
            let mut scripts = self.scripts.iter();
            let mut unknown = self.unknown.iter();
            for kind in layout {
                // Counts were checked by layout_matches, so every iterator has an item.
                let resource = match kind {
                    ResourceKind::Model => models.next().map(|m| m.to_resource(variant)),
                    ResourceKind::Animation => animations.next().map(|a| a.to_resource(variant)),
                    ResourceKind::Effect => effects.next().map(|e| e.to_resource(variant)),
                    ResourceKind::Script => scripts.next().map(|s| s.to_resource(variant)),
                    _ => unknown.next().cloned().map(Ok),
                };
                if let Some(resource) = resource {
                    out.push(resource?);
                }
            }
            return Ok(out);
        }

        if self.stream_layout.is_some() {
            warn!("Recorded stream layout no longer matches the collections, using canonical order");
        }
        for m in &self.models {
            out.push(m.to_resource(variant)?);
        }
        for a in &self.animations {
            out.push(a.to_resource(variant)?);
        }
        for e in &self.effects {
            out.push(e.to_resource(variant)?);
        }
        for s in &self.scripts {
            out.push(s.to_resource(variant)?);
        }
        out.extend(self.unknown.iter().cloned());
        Ok(out)
    }

    fn layout_matches(&self, layout: &[ResourceKind]) -> bool {
        let count = |pred: fn(&ResourceKind) -> bool| layout.iter().filter(|k| pred(k)).count();
        count(|k| *k == ResourceKind::Model) == self.models.len()
            && count(|k| *k == ResourceKind::Animation) == self.animations.len()
            && count(|k| *k == ResourceKind::Effect) == self.effects.len()
            && count(|k| *k == ResourceKind::Script) == self.scripts.len()
            && count(|k| matches!(k, ResourceKind::Unknown(_))) == self.unknown.len()
            && layout.len()
                == self.models.len()
                    + self.animations.len()
                    + self.effects.len()
                    + self.scripts.len()
                    + self.unknown.len()
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

fn expect_tag(found: Tag, expected: Tag, offset: usize) -> Result<()> {
    if found != expected {
        return Err(BwresError::UnexpectedTag { offset, expected, found });
    }
    Ok(())
}

/// Determines the game variant from the root and texture-section tags.
pub fn detect_variant(data: &[u8]) -> Result<GameVariant> {
    let mut cursor = ByteCursor::new(data);
    let root = cursor.read_chunk_header()?;
    if root.tag != ROOT {
        return Err(BwresError::UnknownVariant { root: root.tag, section: None });
    }
    cursor.read_prefixed_bytes()?;
    let section = cursor.read_tag()?;
    GameVariant::from_texture_section_tag(section).ok_or(BwresError::UnknownVariant {
        root: root.tag,
        section: Some(section),
    })
}

/// Splits the archive into its top-level resources without interpreting them.
pub fn read_top_level(data: &[u8]) -> Result<Vec<Resource>> {
    let mut cursor = ByteCursor::new(data);
    let mut resources = Vec::new();
    while !cursor.is_empty() {
        resources.push(read_resource(&mut cursor)?);
    }
    Ok(resources)
}

pub fn decode(data: &[u8]) -> Result<Archive> {
    let variant = detect_variant(data)?;
    let mut cursor = ByteCursor::new(data);

    // Root: level name, then the texture section.
    let root = cursor.read_chunk_header()?;
    let root_payload = cursor.take(root.length as usize)?;
    let mut root_cursor = ByteCursor::with_base(root_payload, ChunkHeader::SIZE);
    let level_name = name_from_bytes(root_cursor.read_prefixed_bytes()?);

    let section_offset = root_cursor.absolute_position();
    let section = read_resource(&mut root_cursor)?;
    if !root_cursor.is_empty() {
        return Err(BwresError::MisalignedSection {
            tag: root.tag,
            expected_end: ChunkHeader::SIZE + root_cursor.len(),
            actual: root_cursor.absolute_position(),
        });
    }
    let textures = decode_textures(&section, section_offset, variant)?;

    // Sound section
    let sound_offset = cursor.absolute_position();
    let sound = read_resource(&mut cursor)?;
    expect_tag(sound.tag, SOUND_SECTION, sound_offset)?;
    let (sound_bank_name, sounds) = decode_sounds(&sound, sound_offset, variant)?;
    if sound_bank_name != level_name {
        warn!("Sound section name {:?} differs from level name {:?}", sound_bank_name, level_name);
    }

    let mut archive = Archive {
        variant,
        level_name,
        sound_bank_name,
        textures,
        sounds,
        ..Archive::new(variant, String::new())
    };

    // Everything after the sound section is a flat stream up to end of file.
    let mut layout = Vec::new();
    while !cursor.is_empty() {
        let offset = cursor.absolute_position();
        let resource = read_resource(&mut cursor)?;
        let kind = match ResourceKind::classify(resource.tag) {
            k if k.is_stream_kind() => k,
            _ => ResourceKind::Unknown(resource.tag),
        };
        match kind {
            ResourceKind::Model => archive.models.push(Model::from_resource(&resource, offset, variant)?),
            ResourceKind::Animation => {
                archive.animations.push(Animation::from_resource(&resource, offset, variant)?)
            }
            ResourceKind::Effect => archive.effects.push(Effect::from_resource(&resource, offset, variant)?),
            ResourceKind::Script => archive.scripts.push(Script::from_resource(&resource, offset, variant)?),
            _ => {
                debug!("Keeping opaque resource {} at 0x{:08X}", resource.tag, offset);
                archive.unknown.push(resource);
            }
        }
        layout.push(kind);
    }
    archive.stream_layout = Some(layout);

    info!(
        "Decoded {} archive {:?}: {} textures, {} models, {} sounds, {} animations, {} effects, {} scripts",
        variant,
        archive.level_name,
        archive.textures.len(),
        archive.models.len(),
        archive.sounds.len() / 2,
        archive.animations.len(),
        archive.effects.len(),
        archive.scripts.len()
    );
    if !archive.unknown.is_empty() {
        info!("{} unrecognised resources kept as-is", archive.unknown.len());
    }

    Ok(archive)
}

fn decode_textures(section: &Resource, offset: usize, variant: GameVariant) -> Result<Vec<Texture>> {
    let mut cursor = ByteCursor::with_base(&section.payload, offset + ChunkHeader::SIZE);
    let count = read_u32_le(&mut cursor)? as usize;
    let texture_tag = variant.texture_tag();

    let mut textures = Vec::with_capacity(count.min(section.payload.len() / ChunkHeader::SIZE));
    for _ in 0..count {
        let tex_offset = cursor.absolute_position();
        let resource = read_resource(&mut cursor)?;
        expect_tag(resource.tag, texture_tag, tex_offset)?;
        textures.push(Texture::from_resource(&resource, tex_offset, variant)?);
    }

    if !cursor.is_empty() {
        return Err(BwresError::MisalignedSection {
            tag: section.tag,
            expected_end: offset + section.framed_len(),
            actual: cursor.absolute_position(),
        });
    }
    debug!("Texture section {} holds {} textures", section.tag, textures.len());
    Ok(textures)
}

fn decode_sounds(section: &Resource, offset: usize, variant: GameVariant) -> Result<(String, Vec<SoundEntry>)> {
    let mut cursor = ByteCursor::with_base(&section.payload, offset + ChunkHeader::SIZE);
    let bank_name = name_from_bytes(cursor.read_prefixed_bytes()?);

    let group_offset = cursor.absolute_position();
    let group = read_resource(&mut cursor)?;
    expect_tag(group.tag, SOUND_GROUP, group_offset)?;
    let mut group_cursor = ByteCursor::with_base(&group.payload, group_offset + ChunkHeader::SIZE);
    let pair_count = read_u32_le(&mut group_cursor)? as usize;
    if !group_cursor.is_empty() {
        return Err(BwresError::MisalignedSection {
            tag: group.tag,
            expected_end: group_offset + group.framed_len(),
            actual: group_cursor.absolute_position(),
        });
    }

    let mut entry_offset = cursor.absolute_position();
    let end = cursor.len();
    let resources = read_resource_sequence(&mut cursor, end, section.tag)?;
    if resources.len() != pair_count * 2 {
        return Err(BwresError::InvalidSoundPairing {
            index: resources.len(),
            reason: "entry count does not match the declared pair count",
        });
    }

    let mut sounds = Vec::with_capacity(resources.len());
    for (index, resource) in resources.iter().enumerate() {
        let entry = match (index % 2, ResourceKind::classify(resource.tag)) {
            (0, ResourceKind::SoundHeader) => {
                SoundEntry::Header(SoundHeader::from_resource(resource, entry_offset, variant)?)
            }
            (1, ResourceKind::SoundData) => {
                SoundEntry::Data(SoundData::from_resource(resource, entry_offset, variant)?)
            }
            (0, _) => {
                return Err(BwresError::InvalidSoundPairing {
                    index,
                    reason: "expected a sound header",
                })
            }
            _ => {
                return Err(BwresError::InvalidSoundPairing {
                    index,
                    reason: "sound header is not followed by its data",
                })
            }
        };
        entry_offset += resource.framed_len();
        sounds.push(entry);
    }
    debug!("Sound section {:?} holds {} pairs", bank_name, pair_count);
    Ok((bank_name, sounds))
}

/// Checks that sounds alternate header, data with nothing left over.
pub fn validate_sound_pairs(sounds: &[SoundEntry]) -> Result<()> {
    if sounds.len() % 2 != 0 {
        return Err(BwresError::InvalidSoundPairing {
            index: sounds.len() - 1,
            reason: "odd number of sound entries",
        });
    }
    for (index, entry) in sounds.iter().enumerate() {
        match (index % 2, entry) {
            (0, SoundEntry::Header(_)) | (1, SoundEntry::Data(_)) => {}
            (0, SoundEntry::Data(_)) => {
                return Err(BwresError::InvalidSoundPairing {
                    index,
                    reason: "sound data without a preceding header",
                })
            }
            _ => {
                return Err(BwresError::InvalidSoundPairing {
                    index,
                    reason: "sound header is not followed by its data",
                })
            }
        }
    }
    Ok(())
}

/// Lays out every section in the fixed order with back-patched lengths.
pub fn encode(archive: &Archive, variant: GameVariant) -> Result<Vec<u8>> {
    validate_sound_pairs(&archive.sounds)?;
    let mut writer = ArchiveWriter::new();

    let root = writer.begin_section(ROOT)?;
    writer.write_prefixed(&name_to_bytes(&archive.level_name)?)?;
    let texture_section = writer.begin_section(variant.texture_section_tag())?;
    writer.write_u32(count_u32(archive.textures.len(), variant.texture_section_tag())?)?;
    for texture in &archive.textures {
        writer.write_resource(&texture.to_resource(variant)?)?;
    }
    writer.end_section(texture_section)?;
    writer.end_section(root)?;

    let sound_section = writer.begin_section(SOUND_SECTION)?;
    writer.write_prefixed(&name_to_bytes(&archive.sound_bank_name)?)?;
    let group = writer.begin_section(SOUND_GROUP)?;
    writer.write_u32(count_u32(archive.sounds.len() / 2, SOUND_GROUP)?)?;
    writer.end_section(group)?;
    for sound in &archive.sounds {
        writer.write_resource(&sound.to_resource(variant)?)?;
    }
    writer.end_section(sound_section)?;

    for resource in archive.stream_resources(variant)? {
        writer.write_resource(&resource)?;
    }

    debug!("Encoded {} archive, {} bytes", variant, writer.position());
    Ok(writer.into_inner())
}

fn count_u32(count: usize, tag: Tag) -> Result<u32> {
    u32::try_from(count).map_err(|_| BwresError::SectionTooLarge { tag, length: count })
}
