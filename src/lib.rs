pub mod archive;
pub mod error;
pub mod folder;
pub mod io;

pub use archive::entry::{Animation, Effect, Entry, Model, Script, SoundData, SoundEntry, SoundHeader, Texture};
pub use archive::header::{ChunkHeader, GameVariant, Tag};
pub use archive::kind::ResourceKind;
pub use archive::resource::{read_resource, read_resource_sequence, ArchiveWriter, Resource};
pub use archive::{decode, detect_variant, encode, Archive};
pub use error::{BwresError, Result};
pub use folder::{pack_folder, unpack_to_folder, ResourceInfo};
