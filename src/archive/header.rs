use binrw::binrw;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Four-byte resource tag, kept in on-disk byte order.
///
/// The archive stores every tag reversed relative to its mnemonic, so the
/// texture tag `TEXT` appears in the file as `TXET`.
#[binrw]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const fn from_mnemonic(m: [u8; 4]) -> Self {
        Tag([m[3], m[2], m[1], m[0]])
    }

    pub const fn mnemonic(&self) -> [u8; 4] {
        let b = self.0;
        [b[3], b[2], b[1], b[0]]
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.mnemonic() {
            let c = if b.is_ascii_graphic() { b as char } else { '.' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(\"{}\")", self)
    }
}

pub const ROOT: Tag = Tag::from_mnemonic(*b"TEXR");
pub const TEXTURE_SECTION_BW: Tag = Tag::from_mnemonic(*b"XBTF");
pub const TEXTURE_SECTION_BW2: Tag = Tag::from_mnemonic(*b"GBTF");
pub const TEXTURE_BW: Tag = Tag::from_mnemonic(*b"TEXT");
pub const TEXTURE_BW2: Tag = Tag::from_mnemonic(*b"GTXD");
pub const SOUND_SECTION: Tag = Tag::from_mnemonic(*b"SOND");
pub const SOUND_GROUP: Tag = Tag::from_mnemonic(*b"BSFH");
pub const SOUND_HEADER: Tag = Tag::from_mnemonic(*b"DSPH");
pub const SOUND_DATA: Tag = Tag::from_mnemonic(*b"DSPD");
pub const MODEL: Tag = Tag::from_mnemonic(*b"MODL");
pub const MODEL_DATA: Tag = MODEL;
pub const ANIMATION: Tag = Tag::from_mnemonic(*b"ANIM");
pub const EFFECT: Tag = Tag::from_mnemonic(*b"TQEF");
pub const SCRIPT: Tag = Tag::from_mnemonic(*b"SCRP");

/// Tag plus payload length, the framing in front of every resource.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[br(little)]
#[bw(little)]
pub struct ChunkHeader {
    pub tag: Tag,
    pub length: u32,
}

impl ChunkHeader {
    pub const SIZE: usize = 8;
}

/// The two archive dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameVariant {
    #[serde(rename = "Battalion Wars")]
    BattalionWars,
    #[serde(rename = "Battalion Wars 2")]
    BattalionWars2,
}

impl GameVariant {
    pub fn from_texture_section_tag(tag: Tag) -> Option<Self> {
        match tag {
            TEXTURE_SECTION_BW => Some(GameVariant::BattalionWars),
            TEXTURE_SECTION_BW2 => Some(GameVariant::BattalionWars2),
            _ => None,
        }
    }

    pub fn texture_section_tag(self) -> Tag {
        match self {
            GameVariant::BattalionWars => TEXTURE_SECTION_BW,
            GameVariant::BattalionWars2 => TEXTURE_SECTION_BW2,
        }
    }

    pub fn texture_tag(self) -> Tag {
        match self {
            GameVariant::BattalionWars => TEXTURE_BW,
            GameVariant::BattalionWars2 => TEXTURE_BW2,
        }
    }

    /// Width of the NUL-padded name field at the start of a texture payload.
    pub fn texture_name_width(self) -> usize {
        match self {
            GameVariant::BattalionWars => 0x10,
            GameVariant::BattalionWars2 => 0x20,
        }
    }

    /// Whether archives of this game ship gzip-compressed.
    pub fn compressed_by_default(self) -> bool {
        matches!(self, GameVariant::BattalionWars2)
    }

    pub fn archive_extension(self) -> &'static str {
        if self.compressed_by_default() {
            "res.gz"
        } else {
            "res"
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            GameVariant::BattalionWars => "Battalion Wars",
            GameVariant::BattalionWars2 => "Battalion Wars 2",
        }
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
