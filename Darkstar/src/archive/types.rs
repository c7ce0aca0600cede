//! Types for PVOL volume handling

use std::sync::OnceLock;

/// Compression applied to a volume entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    None,
    Rle,
    Lzss,
    Lzh,
}

impl CompressionMethod {
    /// Parse the compression byte from a `voli` record
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Rle),
            2 => Some(Self::Lzss),
            3 => Some(Self::Lzh),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Rle => 1,
            Self::Lzss => 2,
            Self::Lzh => 3,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rle => "rle",
            Self::Lzss => "lzss",
            Self::Lzh => "lzh",
        }
    }
}

/// A validated entry in a volume directory
#[derive(Debug)]
pub struct VolumeEntry {
    /// Entry name as stored (original case)
    pub name: String,
    /// Entry id from the directory record
    pub id: u32,
    /// Absolute offset of the entry payload (after its `VBLK` header)
    pub data_offset: usize,
    /// Bytes occupied in the volume
    pub stored_size: usize,
    /// Size after decompression
    pub size: usize,
    pub compression: CompressionMethod,
    /// Expanded payload, filled on first read of a compressed entry
    pub(crate) expanded: OnceLock<Vec<u8>>,
}

impl VolumeEntry {
    pub fn is_compressed(&self) -> bool {
        self.compression != CompressionMethod::None
    }
}
