//! Loose-file layout of an unpacked archive and the `resinfo.txt` sidecar.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::archive::entry::{Animation, Effect, Model, Script, Texture};
use crate::archive::header::{GameVariant, Tag};
use crate::archive::resource::Resource;
use crate::archive::Archive;
use crate::io::has_gz_suffix;

pub const RESINFO_FILE: &str = "resinfo.txt";
pub const TEXTURE_DIR: &str = "Textures";
pub const SOUND_DIR: &str = "Sounds";
pub const MODEL_DIR: &str = "Models";
pub const ANIMATION_DIR: &str = "Animations";
pub const EFFECT_DIR: &str = "SpecialEffects";
pub const SCRIPT_DIR: &str = "Scripts";
pub const UNKNOWN_DIR: &str = "Unknown";

/// Metadata needed to rebuild an archive from its loose files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    #[serde(rename = "Game")]
    pub game: GameVariant,
    #[serde(rename = "Level name")]
    pub level_name: String,
}

impl ResourceInfo {
    pub fn load(folder: &Path) -> Result<Self> {
        let path = folder.join(RESINFO_FILE);
        let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))
    }

    pub fn save(&self, folder: &Path) -> Result<()> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        fs::write(folder.join(RESINFO_FILE), out).context("Failed to write resinfo.txt")?;
        Ok(())
    }
}

/// Where `pack` writes when no output is named, and whether that output is
/// gzipped. A trailing `_Folder` is stripped; otherwise the game's extension
/// is appended. Battalion Wars 2 output is compressed even when the derived
/// name has no `.gz`.
pub fn default_pack_output(folder: &Path, info: &ResourceInfo) -> (PathBuf, bool) {
    let name = folder.as_os_str().to_string_lossy();
    let name = name.trim_end_matches(['/', '\\']);
    let output = match name.strip_suffix("_Folder") {
        Some(stripped) => PathBuf::from(stripped),
        None => PathBuf::from(format!("{}.{}", name, info.game.archive_extension())),
    };
    let compress = info.game.compressed_by_default() || has_gz_suffix(&output);
    (output, compress)
}

/// Splits at the last `.`, so `.modl` is an empty name with extension `modl`.
fn split_file_name(file_name: &str) -> Option<(&str, &str)> {
    file_name.rsplit_once('.')
}

/// Names go straight into file names; keep them inside their directory.
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}

fn write_file(dir: &Path, name: &str, ext: &str, data: &[u8]) -> Result<()> {
    let path = dir.join(format!("{}.{}", file_safe(name), ext));
    fs::write(&path, data).with_context(|| format!("Failed to write {:?}", path))
}

pub fn unpack_to_folder(archive: &Archive, output: &Path) -> Result<()> {
    let variant = archive.variant;
    info!("Unpacking {:?} ({}) into {:?}", archive.level_name, variant, output);

    for dir in [TEXTURE_DIR, SOUND_DIR, MODEL_DIR, ANIMATION_DIR, EFFECT_DIR, SCRIPT_DIR] {
        fs::create_dir_all(output.join(dir)).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    ResourceInfo {
        game: variant,
        level_name: archive.level_name.clone(),
    }
    .save(output)?;

    for script in &archive.scripts {
        write_file(&output.join(SCRIPT_DIR), &script.name, "luap", &script.data)?;
    }
    for animation in &archive.animations {
        write_file(&output.join(ANIMATION_DIR), &animation.name, "anim", &animation.data)?;
    }
    for effect in &archive.effects {
        write_file(&output.join(EFFECT_DIR), &effect.name, "txt", &effect.data)?;
    }
    for (header, data) in archive.sound_pairs() {
        write_file(&output.join(SOUND_DIR), &header.name(), "adp", &data.data)?;
    }
    debug!("Dumped scripts, animations, effects and sounds");

    // Textures referenced by a model live next to it; the rest go to Textures/.
    let mut used = HashSet::new();
    for model in &archive.models {
        let model_dir = output.join(MODEL_DIR).join(file_safe(&model.name));
        fs::create_dir_all(&model_dir)?;
        write_file(&model_dir, &model.name, "modl", &model.data)?;

        let textures = archive.textures_for_model(model);
        debug!("Model {:?} uses {} textures", model.name, textures.len());
        for texture in textures {
            let name = texture.name();
            write_file(&model_dir, &name, "texture", &texture.payload(variant)?)?;
            used.insert(name);
        }
    }
    for texture in &archive.textures {
        let name = texture.name();
        if !used.contains(&name) {
            write_file(&output.join(TEXTURE_DIR), &name, "texture", &texture.payload(variant)?)?;
        }
    }

    if !archive.unknown.is_empty() {
        let dir = output.join(UNKNOWN_DIR);
        fs::create_dir_all(&dir)?;
        for (index, resource) in archive.unknown.iter().enumerate() {
            let name = format!("{:04}.{}", index, hex_tag(resource.tag));
            write_file(&dir, &name, "chunk", &resource.payload)?;
        }
    }

    info!("Unpacked {} textures, {} models", archive.textures.len(), archive.models.len());
    Ok(())
}

fn hex_tag(tag: Tag) -> String {
    tag.as_bytes().iter().map(|b| format!("{:02X}", b)).collect()
}

/// Parses the `NNNN.TTTTTTTT` stem of an opaque chunk file.
fn parse_chunk_stem(stem: &str) -> Option<Tag> {
    let hex = stem.rsplit('.').next()?;
    if hex.len() != 8 || !hex.is_ascii() {
        return None;
    }
    let mut tag = [0u8; 4];
    for (i, byte) in tag.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(Tag(tag))
}

/// Collects the loose files under `folder` into an archive.
pub fn pack_folder(folder: &Path) -> Result<Archive> {
    let info = ResourceInfo::load(folder)?;
    let variant = info.game;
    let mut archive = Archive::new(variant, info.level_name);
    let mut seen_textures = HashSet::new();
    let resinfo = folder.join(RESINFO_FILE);

    info!("Searching {:?} for files to pack", folder);
    let walker = WalkDir::new(folder).sort_by_file_name();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || path == resinfo {
            continue;
        }
        let Some((stem, ext)) = entry.file_name().to_str().and_then(split_file_name) else {
            continue;
        };
        let read = || fs::read(path).with_context(|| format!("Failed to read {:?}", path));

        match ext {
            "texture" => {
                if seen_textures.insert(stem.to_string()) {
                    let texture = Texture::from_payload(variant, &read()?)
                        .with_context(|| format!("Bad texture file {:?}", path))?;
                    archive.textures.push(texture);
                }
            }
            "modl" => archive.models.push(Model::new(stem, read()?)),
            "adp" => archive
                .push_sound(stem, read()?)
                .with_context(|| format!("Bad sound name {:?}", stem))?,
            "anim" => archive.animations.push(Animation::new(stem, read()?)),
            "txt" => archive.effects.push(Effect::new(stem, read()?)),
            "luap" => archive.scripts.push(Script::new(stem, read()?)),
            "chunk" => match parse_chunk_stem(stem) {
                Some(tag) => archive.unknown.push(Resource::new(tag, read()?)),
                None => warn!("Skipping chunk file with unreadable tag: {:?}", path),
            },
            _ => {}
        }
    }

    info!(
        "{} textures, {} models, {} sounds, {} animations, {} effects, {} scripts",
        archive.textures.len(),
        archive.models.len(),
        archive.sounds.len() / 2,
        archive.animations.len(),
        archive.effects.len(),
        archive.scripts.len()
    );
    Ok(archive)
}
