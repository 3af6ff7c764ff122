use crate::archive::header::{self, GameVariant, Tag};

/// Semantic class of a resource, looked up from its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Model,
    SoundHeader,
    SoundData,
    Animation,
    Effect,
    Script,
    Unknown(Tag),
}

/// Byte order of the header words inside a kind's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    Little,
    Big,
}

pub const SOUND_NAME_WIDTH: usize = 32;

/// Tag to kind mapping. Both texture tags map to `Texture`; which one is
/// valid in a given archive depends on the game variant.
pub const CLASSIFICATION: &[(Tag, ResourceKind)] = &[
    (header::TEXTURE_BW, ResourceKind::Texture),
    (header::TEXTURE_BW2, ResourceKind::Texture),
    (header::MODEL, ResourceKind::Model),
    (header::SOUND_HEADER, ResourceKind::SoundHeader),
    (header::SOUND_DATA, ResourceKind::SoundData),
    (header::ANIMATION, ResourceKind::Animation),
    (header::EFFECT, ResourceKind::Effect),
    (header::SCRIPT, ResourceKind::Script),
];

impl ResourceKind {
    pub fn classify(tag: Tag) -> Self {
        CLASSIFICATION
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, kind)| *kind)
            .unwrap_or(ResourceKind::Unknown(tag))
    }

    pub fn tag(self, variant: GameVariant) -> Tag {
        match self {
            ResourceKind::Texture => variant.texture_tag(),
            ResourceKind::Model => header::MODEL,
            ResourceKind::SoundHeader => header::SOUND_HEADER,
            ResourceKind::SoundData => header::SOUND_DATA,
            ResourceKind::Animation => header::ANIMATION,
            ResourceKind::Effect => header::EFFECT,
            ResourceKind::Script => header::SCRIPT,
            ResourceKind::Unknown(tag) => tag,
        }
    }

    /// Texture headers come from the big-endian consoles and keep that order.
    pub fn field_order(self) -> FieldOrder {
        match self {
            ResourceKind::Texture => FieldOrder::Big,
            _ => FieldOrder::Little,
        }
    }

    /// Kinds that live in the free-form stream after the sound section.
    pub fn is_stream_kind(self) -> bool {
        matches!(
            self,
            ResourceKind::Model
                | ResourceKind::Animation
                | ResourceKind::Effect
                | ResourceKind::Script
                | ResourceKind::Unknown(_)
        )
    }
}
