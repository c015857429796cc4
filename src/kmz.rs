use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Geojson2WpmlError;

type Result<T> = std::result::Result<T, Geojson2WpmlError>;

/// KMZ entry name suffixes locating the two target documents. DJI Pilot 2
/// exports place them under a wpmz/ directory, but only the filename is
/// load-bearing, so matching is by case-insensitive suffix.
pub const WAYLINES_SUFFIX: &str = "waylines.wpml";
pub const TEMPLATE_SUFFIX: &str = "template.kml";

/// One archive entry, in original order. Directory entries keep their
/// trailing slash and empty payload.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
    pub is_dir: bool,
}

/// A seed mission archive: the two extracted documents plus every entry
/// in original order (documents included, still holding their seed bytes).
#[derive(Debug)]
pub struct SeedArchive {
    pub waylines_path: String,
    pub waylines_text: String,
    pub template_path: String,
    pub template_text: String,
    pub entries: Vec<ArchiveEntry>,
}

/// Open a seed KMZ and extract both target documents.
pub fn read_seed(bytes: &[u8]) -> Result<SeedArchive> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_string();
        let is_dir = file.is_dir();
        let mut bytes = Vec::new();
        if !is_dir {
            file.read_to_end(&mut bytes)?;
        }
        entries.push(ArchiveEntry {
            name,
            bytes,
            is_dir,
        });
    }

    let (waylines_path, waylines_text) = extract_document(&entries, WAYLINES_SUFFIX)?;
    let (template_path, template_text) = extract_document(&entries, TEMPLATE_SUFFIX)?;

    Ok(SeedArchive {
        waylines_path,
        waylines_text,
        template_path,
        template_text,
        entries,
    })
}

fn extract_document(entries: &[ArchiveEntry], suffix: &'static str) -> Result<(String, String)> {
    let entry = entries
        .iter()
        .find(|e| !e.is_dir && e.name.to_lowercase().ends_with(suffix))
        .ok_or(Geojson2WpmlError::MissingEntry { suffix })?;
    let text = std::str::from_utf8(&entry.bytes).map_err(|source| Geojson2WpmlError::Utf8 {
        entry: entry.name.clone(),
        source,
    })?;
    Ok((entry.name.clone(), text.to_string()))
}

/// Rebuild the archive: both documents replaced at their original paths,
/// every other entry copied byte-for-byte, entry order preserved.
pub fn write_kmz(seed: &SeedArchive, waylines: &str, template: &str) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in &seed.entries {
        if entry.is_dir {
            writer.add_directory(entry.name.as_str(), options)?;
            continue;
        }
        writer.start_file(entry.name.as_str(), options)?;
        if entry.name == seed.waylines_path {
            writer.write_all(waylines.as_bytes())?;
        } else if entry.name == seed.template_path {
            writer.write_all(template.as_bytes())?;
        } else {
            writer.write_all(&entry.bytes)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}
