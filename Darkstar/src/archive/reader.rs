//! PVOL directory parsing and entry access

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use super::{CompressionMethod, DIRECTORY_IDENT, ENTRY_SIZE, MAGIC, STRINGS_IDENT, VolumeEntry};
use crate::binary::{BLOCK_HEADER_SIZE, Block, ByteCursor, fourcc, ident_name};
use crate::error::{Error, Result};

/// Parses PVOL volumes into a [`VolumeDirectory`]
pub struct ArchiveReader;

impl ArchiveReader {
    /// Parse an in-memory volume.
    ///
    /// Either every entry validates or nothing is returned; there is no
    /// partially usable directory.
    pub fn open(bytes: Vec<u8>) -> Result<VolumeDirectory> {
        let entries = parse_directory(&bytes).map_err(|err| match err {
            Error::TruncatedData {
                offset,
                needed,
                available,
            } => Error::corrupt_archive(format!(
                "directory truncated at offset {offset} (needed {needed}, {available} available)"
            )),
            Error::CorruptData { message } => Error::CorruptArchive { message },
            other => other,
        })?;

        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            // First occurrence wins within a volume
            index.entry(entry.name.to_ascii_lowercase()).or_insert(i);
        }

        tracing::debug!(
            "Opened volume: {} entries, {} bytes",
            entries.len(),
            bytes.len()
        );

        Ok(VolumeDirectory {
            bytes,
            entries,
            index,
        })
    }

    /// Read a volume file from disk and parse it.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<VolumeDirectory> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::open(bytes)
    }
}

fn parse_directory(bytes: &[u8]) -> Result<Vec<VolumeEntry>> {
    let mut cursor = ByteCursor::new(bytes);
    let header = Block::read(&mut cursor)?;
    if header.ident != MAGIC {
        return Err(Error::corrupt(format!(
            "missing PVOL signature (found '{}')",
            ident_name(header.ident)
        )));
    }

    // The header size field is the absolute offset of the string table
    cursor.seek(header.raw_size as usize)?;
    let strings = read_section(&mut cursor, STRINGS_IDENT)?;
    let mut directory = read_section(&mut cursor, DIRECTORY_IDENT)?;

    let count = directory.len() / ENTRY_SIZE;
    let mut entries = Vec::with_capacity(count);

    for _ in 0..count {
        let id = directory.read_u32()?;
        let name_offset = directory.read_i32()?;
        let block_offset = directory.read_i32()?;
        let size = directory.read_u32()? as usize;
        let code = directory.read_u8()?;

        // Unnamed records cannot be looked up
        if name_offset < 0 {
            continue;
        }
        let name = strings.c_str_at(name_offset as usize).ok_or_else(|| {
            Error::corrupt(format!("entry {id}: name offset {name_offset} outside string table"))
        })?;

        let compression = CompressionMethod::from_code(code).ok_or_else(|| {
            Error::corrupt(format!("entry {name}: unknown compression code {code}"))
        })?;

        let entry = validate_entry(bytes, id, name, block_offset, size, compression)?;
        entries.push(entry);
    }

    Ok(entries)
}

fn read_section<'a>(cursor: &mut ByteCursor<'a>, ident: u32) -> Result<ByteCursor<'a>> {
    let block = Block::read(cursor)?;
    if block.ident != ident {
        return Err(Error::corrupt(format!(
            "expected '{}' block, found '{}'",
            ident_name(ident),
            ident_name(block.ident)
        )));
    }
    let section = cursor.sub_cursor(block.payload_size())?;
    let padding = block.padded_size() - block.payload_size();
    cursor.skip(padding.min(cursor.remaining()))?;
    Ok(section)
}

fn validate_entry(
    bytes: &[u8],
    id: u32,
    name: String,
    block_offset: i32,
    size: usize,
    compression: CompressionMethod,
) -> Result<VolumeEntry> {
    let block_offset = usize::try_from(block_offset)
        .map_err(|_| Error::corrupt(format!("entry {name}: negative offset {block_offset}")))?;

    let mut cursor = ByteCursor::new(bytes);
    cursor.seek(block_offset)?;
    let block = Block::read(&mut cursor).map_err(|_| {
        Error::corrupt(format!(
            "entry {name}: offset {block_offset} exceeds volume size {}",
            bytes.len()
        ))
    })?;
    if block.ident != fourcc(b"VBLK") {
        return Err(Error::corrupt(format!(
            "entry {name}: expected VBLK at {block_offset}, found '{}'",
            ident_name(block.ident)
        )));
    }

    let data_offset = block_offset + BLOCK_HEADER_SIZE;
    let stored_size = if compression == CompressionMethod::None {
        size
    } else {
        block.payload_size()
    };

    let end = data_offset.checked_add(stored_size);
    if end.is_none_or(|end| end > bytes.len()) {
        return Err(Error::corrupt(format!(
            "entry {name}: range {data_offset}+{stored_size} exceeds volume size {}",
            bytes.len()
        )));
    }

    Ok(VolumeEntry {
        name,
        id,
        data_offset,
        stored_size,
        size,
        compression,
        expanded: OnceLock::new(),
    })
}

/// An opened volume: its bytes plus the validated entry list
#[derive(Debug)]
pub struct VolumeDirectory {
    bytes: Vec<u8>,
    entries: Vec<VolumeEntry>,
    /// Lower-cased name -> entry index
    index: HashMap<String, usize>,
}

impl VolumeDirectory {
    pub fn entries(&self) -> &[VolumeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of the volume in bytes
    pub fn volume_size(&self) -> usize {
        self.bytes.len()
    }

    /// Case-insensitive lookup of an entry by file name.
    pub fn find(&self, name: &str) -> Option<&VolumeEntry> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// Entry contents, expanding compressed entries on first access.
    pub fn read<'a>(&'a self, entry: &'a VolumeEntry) -> Result<&'a [u8]> {
        match entry.compression {
            CompressionMethod::None => self.stored(entry),
            CompressionMethod::Lzh => {
                if let Some(data) = entry.expanded.get() {
                    return Ok(data);
                }
                let data = super::lzh::decompress(self.stored(entry)?, entry.size);
                tracing::debug!(
                    "Expanded {} ({} -> {} bytes)",
                    entry.name,
                    entry.stored_size,
                    data.len()
                );
                Ok(entry.expanded.get_or_init(|| data))
            }
            CompressionMethod::Rle | CompressionMethod::Lzss => Err(Error::UnsupportedCompression {
                method: entry.compression.code(),
            }),
        }
    }

    /// Entry contents looked up by name.
    pub fn read_named(&self, name: &str) -> Result<&[u8]> {
        let entry = self.find(name).ok_or_else(|| Error::AssetNotFound {
            name: name.to_string(),
        })?;
        self.read(entry)
    }

    fn stored(&self, entry: &VolumeEntry) -> Result<&[u8]> {
        self.bytes
            .get(entry.data_offset..entry.data_offset + entry.stored_size)
            .ok_or_else(|| Error::corrupt_archive(format!("entry {} out of range", entry.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_volume;

    #[test]
    fn test_open_and_read() {
        let bytes = build_volume(&[("Larmor.dts", b"shape", 0), ("ice.day.ppl", b"pal!", 0)]);
        let dir = ArchiveReader::open(bytes).unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.read_named("LARMOR.DTS").unwrap(), b"shape");
        assert_eq!(dir.read_named("ice.day.ppl").unwrap(), b"pal!");
        assert!(matches!(
            dir.read_named("missing.dts"),
            Err(Error::AssetNotFound { .. })
        ));
    }

    #[test]
    fn test_bad_signature() {
        let mut bytes = build_volume(&[("a.dts", b"x", 0)]);
        bytes[0] = b'X';
        assert!(matches!(
            ArchiveReader::open(bytes),
            Err(Error::CorruptArchive { .. })
        ));
    }

    #[test]
    fn test_entry_past_end_rejected() {
        let mut bytes = build_volume(&[("a.dts", b"abcd", 0)]);
        // Patch the size field of the only record (last 5 bytes are size + code)
        let size_pos = bytes.len() - 5;
        bytes[size_pos..size_pos + 4].copy_from_slice(&10_000u32.to_le_bytes());
        assert!(matches!(
            ArchiveReader::open(bytes),
            Err(Error::CorruptArchive { .. })
        ));
    }

    #[test]
    fn test_truncated_directory_rejected() {
        let mut bytes = build_volume(&[("a.dts", b"abcd", 0)]);
        bytes.truncate(bytes.len() - 20);
        assert!(matches!(
            ArchiveReader::open(bytes),
            Err(Error::CorruptArchive { .. })
        ));
    }

    #[test]
    fn test_unknown_compression_rejected() {
        let bytes = build_volume(&[("a.dts", b"abcd", 9)]);
        assert!(matches!(
            ArchiveReader::open(bytes),
            Err(Error::CorruptArchive { .. })
        ));
    }

    #[test]
    fn test_rle_reported_on_read() {
        let bytes = build_volume(&[("a.bmp", b"abcd", 1)]);
        let dir = ArchiveReader::open(bytes).unwrap();
        assert!(matches!(
            dir.read_named("a.bmp"),
            Err(Error::UnsupportedCompression { method: 1 })
        ));
    }

    #[test]
    fn test_lzh_entry_is_cached() {
        let bytes = build_volume(&[("a.dat", &[0u8; 32], 3)]);
        let dir = ArchiveReader::open(bytes).unwrap();
        let entry = dir.find("a.dat").unwrap();
        assert!(entry.expanded.get().is_none());
        let first = dir.read(entry).unwrap().to_vec();
        assert_eq!(first.len(), 32);
        assert!(entry.expanded.get().is_some());
        assert_eq!(dir.read(entry).unwrap(), first.as_slice());
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let bytes = build_volume(&[("dup.txt", b"one", 0), ("DUP.TXT", b"two", 0)]);
        let dir = ArchiveReader::open(bytes).unwrap();
        assert_eq!(dir.read_named("dup.txt").unwrap(), b"one");
    }
}
