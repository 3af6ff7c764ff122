//! Whole-file archive reading and writing, with optional gzip transport.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::archive::Archive;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

pub fn has_gz_suffix(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("gz"))
}

/// Reads an archive file into memory, gunzipping it when needed.
pub fn read_archive_bytes(path: &Path) -> Result<Vec<u8>> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    if has_gz_suffix(path) || raw.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(&raw[..]);
        let mut data = Vec::with_capacity(raw.len() * 4);
        decoder
            .read_to_end(&mut data)
            .with_context(|| format!("Failed to decompress {:?}", path))?;
        debug!("Decompressed {} -> {} bytes", raw.len(), data.len());
        return Ok(data);
    }
    Ok(raw)
}

pub fn read_archive_file(path: &Path) -> Result<Archive> {
    let data = read_archive_bytes(path)?;
    Archive::from_bytes(&data).with_context(|| format!("Failed to decode archive {:?}", path))
}

/// Encodes `archive` and writes it to `path` in one step.
///
/// `compress` forces gzip on or off; `None` follows the `.gz` suffix. The
/// file only appears once the whole archive has been encoded and written.
pub fn write_archive_file(path: &Path, archive: &Archive, compress: Option<bool>) -> Result<()> {
    let encoded = archive.to_bytes().context("Failed to encode archive")?;
    let compress = compress.unwrap_or_else(|| has_gz_suffix(path));

    let data = if compress {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&encoded)?;
        encoder.finish().context("Failed to compress archive")?
    } else {
        encoded
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
    tmp.write_all(&data)?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {:?}", path))?;

    info!(
        "Wrote {:?} ({} bytes{})",
        path,
        data.len(),
        if compress { ", gzip" } else { "" }
    );
    Ok(())
}
