//! Mountable asset containers

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::archive::{ArchiveReader, VolumeDirectory};
use crate::error::Result;

/// A loose directory indexed at mount time.
///
/// Only regular files directly inside the root are visible, matching the
/// flat namespace the engine's own search paths expose.
#[derive(Debug)]
pub struct DirectoryVolume {
    root: PathBuf,
    /// Lower-cased file name -> full path
    files: HashMap<String, PathBuf>,
}

impl DirectoryVolume {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut files = HashMap::new();

        for entry in WalkDir::new(&root).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let key = entry.file_name().to_string_lossy().to_ascii_lowercase();
            files.entry(key).or_insert_with(|| entry.path().to_path_buf());
        }

        tracing::debug!("Indexed directory {}: {} files", root.display(), files.len());
        Ok(Self { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// A PVOL archive loaded into memory.
#[derive(Debug)]
pub struct ArchiveVolume {
    path: PathBuf,
    directory: VolumeDirectory,
}

impl ArchiveVolume {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let directory = ArchiveReader::open_path(&path)?;
        Ok(Self { path, directory })
    }

    /// Wrap an already parsed directory under a display label.
    pub fn from_directory(label: impl Into<PathBuf>, directory: VolumeDirectory) -> Self {
        Self {
            path: label.into(),
            directory,
        }
    }

    pub fn directory(&self) -> &VolumeDirectory {
        &self.directory
    }
}

/// One mounted search root
#[derive(Debug)]
pub enum Volume {
    Directory(DirectoryVolume),
    Archive(ArchiveVolume),
}

impl Volume {
    /// Mount a path, treating directories as loose roots and files as volumes.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Ok(Self::Directory(DirectoryVolume::open(path)?))
        } else {
            Ok(Self::Archive(ArchiveVolume::open(path)?))
        }
    }

    /// Path the volume was mounted from
    pub fn label(&self) -> &Path {
        match self {
            Self::Directory(dir) => &dir.root,
            Self::Archive(archive) => &archive.path,
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Directory(dir) => dir.files.len(),
            Self::Archive(archive) => archive.directory.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `key` must already be a lower-cased base name.
    pub(crate) fn contains_key(&self, key: &str) -> bool {
        match self {
            Self::Directory(dir) => dir.files.contains_key(key),
            Self::Archive(archive) => archive.directory.find(key).is_some(),
        }
    }

    /// Read an entry by lower-cased base name; `None` if absent.
    pub(crate) fn read_key(&self, key: &str) -> Result<Option<Cow<'_, [u8]>>> {
        match self {
            Self::Directory(dir) => match dir.files.get(key) {
                Some(path) => Ok(Some(Cow::Owned(std::fs::read(path)?))),
                None => Ok(None),
            },
            Self::Archive(archive) => match archive.directory.find(key) {
                Some(entry) => Ok(Some(Cow::Borrowed(archive.directory.read(entry)?))),
                None => Ok(None),
            },
        }
    }

    /// Entry names in their stored case.
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::Directory(dir) => dir
                .files
                .values()
                .filter_map(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .collect(),
            Self::Archive(archive) => archive
                .directory
                .entries()
                .iter()
                .map(|entry| entry.name.clone())
                .collect(),
        }
    }
}
