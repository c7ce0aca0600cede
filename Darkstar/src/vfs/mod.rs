//! Virtual filesystem over loose directories and PVOL volumes

mod locator;
mod volume;

pub use locator::{AssetEntry, AssetLocator, base_name};
pub use volume::{ArchiveVolume, DirectoryVolume, Volume};
