//! PVOL archive volume reader
//!
//! A volume is a `PVOL` header block whose size field points at a `vols`
//! string table, followed by a `voli` directory of packed 17-byte entries.
//! Each entry's payload sits behind its own `VBLK` block header.
//!
//! Opening a volume validates every entry range up front; compressed entries
//! are only expanded the first time they are read.

mod lzh;
mod reader;
mod types;

pub use lzh::decompress as lzh_decompress;
pub use reader::{ArchiveReader, VolumeDirectory};
pub use types::{CompressionMethod, VolumeEntry};

use crate::binary::fourcc;

/// `PVOL` header ident.
pub const MAGIC: u32 = fourcc(b"PVOL");

/// `vols` string table ident.
pub const STRINGS_IDENT: u32 = fourcc(b"vols");

/// `voli` directory ident.
pub const DIRECTORY_IDENT: u32 = fourcc(b"voli");

/// Size of one packed `voli` record.
pub const ENTRY_SIZE: usize = 17;
