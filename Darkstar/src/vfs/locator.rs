//! Overlaid name lookup across every mounted volume

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use super::Volume;
use crate::error::{Error, Result};

/// Strip any directory part from a requested name.
///
/// Shape and material files store bare file names, so both `/` and `\`
/// separated prefixes are ignored.
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// A name visible through the locator and the mount that serves it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub name: String,
    pub mount: usize,
}

/// Ordered stack of volumes presenting one case-insensitive namespace.
///
/// Mount order is priority order: the first volume holding a name wins, and
/// later mounts never shadow earlier ones. Volumes are read-only once
/// mounted, so a shared `&AssetLocator` can serve concurrent loads.
#[derive(Debug, Default)]
pub struct AssetLocator {
    volumes: Vec<Volume>,
}

impl AssetLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount each root in order. Fails on the first root that cannot be opened.
    pub fn from_roots<I, P>(roots: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut locator = Self::new();
        for root in roots {
            locator.mount(root)?;
        }
        Ok(locator)
    }

    /// Mount a directory or volume file at the lowest priority. Returns its mount index.
    pub fn mount<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let volume = Volume::open(path)?;
        Ok(self.mount_volume(volume))
    }

    pub fn mount_volume(&mut self, volume: Volume) -> usize {
        tracing::debug!(
            "Mounted {} ({} entries) at priority {}",
            volume.label().display(),
            volume.len(),
            self.volumes.len()
        );
        self.volumes.push(volume);
        self.volumes.len() - 1
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    /// Mount index that would serve `name`.
    pub fn locate(&self, name: &str) -> Option<usize> {
        let key = base_name(name).to_ascii_lowercase();
        self.volumes.iter().position(|v| v.contains_key(&key))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }

    /// Bytes of `name` from the highest-priority volume that holds it.
    pub fn resolve(&self, name: &str) -> Result<Cow<'_, [u8]>> {
        let key = base_name(name).to_ascii_lowercase();
        for volume in &self.volumes {
            if let Some(bytes) = volume.read_key(&key)? {
                return Ok(bytes);
            }
        }
        Err(Error::AssetNotFound {
            name: name.to_string(),
        })
    }

    /// Bytes of `name` from one specific mount, ignoring priority.
    pub fn resolve_in(&self, mount: usize, name: &str) -> Result<Cow<'_, [u8]>> {
        let not_found = || Error::AssetNotFound {
            name: name.to_string(),
        };
        let volume = self.volumes.get(mount).ok_or_else(not_found)?;
        volume
            .read_key(&base_name(name).to_ascii_lowercase())?
            .ok_or_else(not_found)
    }

    /// Every visible name, optionally filtered by extension (with or
    /// without the leading dot), sorted case-insensitively.
    pub fn enumerate(&self, extension: Option<&str>) -> Vec<AssetEntry> {
        let suffix = extension.map(|ext| format!(".{}", ext.trim_start_matches('.').to_ascii_lowercase()));
        let mut visible: BTreeMap<String, AssetEntry> = BTreeMap::new();

        for (mount, volume) in self.volumes.iter().enumerate() {
            for name in volume.names() {
                let key = name.to_ascii_lowercase();
                if suffix.as_ref().is_some_and(|s| !key.ends_with(s.as_str())) {
                    continue;
                }
                visible.entry(key).or_insert(AssetEntry { name, mount });
            }
        }

        visible.into_values().collect()
    }
}
