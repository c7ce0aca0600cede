//! Bounds-checked readers shared by every Darkstar decoder
//!
//! All multi-byte values are little-endian. Nothing here reads past the
//! slice it was given; a short buffer is reported as
//! [`Error::TruncatedData`](crate::Error::TruncatedData).

mod block;
mod cursor;

pub use block::{Block, PersistHeader, fourcc, ident_name, read_persist};
pub use cursor::ByteCursor;

/// Size of a block header (ident + size).
pub const BLOCK_HEADER_SIZE: usize = 8;

/// Block size flag requesting 4-byte payload alignment.
pub const ALIGN_DWORD: u32 = 0x8000_0000;

/// `PERS` - persistent object container.
pub const IDENT_PERS: u32 = fourcc(b"PERS");
