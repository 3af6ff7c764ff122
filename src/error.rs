//! Error type shared by the archive codec.

use thiserror::Error;

use crate::archive::header::Tag;

pub type Result<T> = std::result::Result<T, BwresError>;

#[derive(Debug, Error)]
pub enum BwresError {
    /// A length field promises more bytes than remain
    #[error("truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A nested sequence did not end exactly on its section boundary
    #[error("misaligned section {tag}: expected end at {expected_end}, got {actual}")]
    MisalignedSection {
        tag: Tag,
        expected_end: usize,
        actual: usize,
    },

    #[error("unknown game variant: root tag {root}, texture section tag {section:?}")]
    UnknownVariant { root: Tag, section: Option<Tag> },

    #[error("invalid sound pairing at entry {index}: {reason}")]
    InvalidSoundPairing { index: usize, reason: &'static str },

    #[error("name {name:?} is {len} bytes, field holds at most {max}")]
    NameTooLong { name: String, len: usize, max: usize },

    #[error("name {0:?} contains characters outside the single-byte range")]
    InvalidName(String),

    #[error("unexpected tag at offset {offset}: expected {expected}, found {found}")]
    UnexpectedTag {
        offset: usize,
        expected: Tag,
        found: Tag,
    },

    #[error("section {tag} is {length} bytes, too large for a u32 length field")]
    SectionTooLarge { tag: Tag, length: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}
