//! Error types for `Darkstar`

use thiserror::Error;

/// The error type for `Darkstar` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Asset Lookup Errors ====================
    /// The requested name is not present in any mounted volume.
    #[error("asset not found: {name}")]
    AssetNotFound {
        /// The name as requested by the caller.
        name: String,
    },

    // ==================== Volume Errors ====================
    /// The volume header, directory, or an entry range failed validation.
    #[error("corrupt archive: {message}")]
    CorruptArchive {
        /// Description of the failed check.
        message: String,
    },

    /// The entry uses a compression scheme this reader cannot expand.
    #[error("unsupported volume compression method: {method}")]
    UnsupportedCompression {
        /// Raw compression code from the volume directory.
        method: u8,
    },

    // ==================== Decode Errors ====================
    /// Structural validation failed while decoding a file.
    #[error("corrupt data: {message}")]
    CorruptData {
        /// Description of the failed check.
        message: String,
    },

    /// A read or declared size ran past the end of the buffer.
    #[error("truncated data: needed {needed} bytes at offset {offset}, {available} available")]
    TruncatedData {
        /// Offset of the read that failed.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes remaining at that offset.
        available: usize,
    },

    /// The container was recognized but its revision is not handled.
    #[error("unsupported {format} version: {version}")]
    UnsupportedVersion {
        /// Which container the version belongs to.
        format: &'static str,
        /// The offending version number.
        version: u32,
    },

    /// An indexed bitmap was converted without any palette to resolve it.
    #[error("bitmap {name} is indexed but no palette is available")]
    MissingPalette {
        /// Bitmap name, or an empty string for anonymous buffers.
        name: String,
    },

    // ==================== Shape Query Errors ====================
    /// The shape has no sequence with the requested name.
    #[error("sequence not found: {name}")]
    SequenceNotFound {
        /// The requested sequence name.
        name: String,
    },

    /// Pose evaluation was requested on a shape without nodes.
    #[error("shape has no nodes")]
    EmptyShape,

    /// Detail selection was requested on a shape without detail levels.
    #[error("shape has no detail levels")]
    NoGeometry,
}

impl Error {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptData {
            message: message.into(),
        }
    }

    pub(crate) fn corrupt_archive(message: impl Into<String>) -> Self {
        Self::CorruptArchive {
            message: message.into(),
        }
    }

    /// True for the failures that mean a file's bytes are unusable.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::CorruptArchive { .. }
                | Self::CorruptData { .. }
                | Self::TruncatedData { .. }
                | Self::UnsupportedVersion { .. }
        )
    }
}

/// Result type alias for `Darkstar` operations.
pub type Result<T> = std::result::Result<T, Error>;
