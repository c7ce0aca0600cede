use super::{ALIGN_DWORD, BLOCK_HEADER_SIZE, ByteCursor, IDENT_PERS};
use crate::error::{Error, Result};

/// Pack a four-character tag the way the engine stores it on disk.
pub const fn fourcc(tag: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*tag)
}

/// Printable form of a block ident for diagnostics.
pub fn ident_name(ident: u32) -> String {
    ident
        .to_le_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}

/// IFF-style block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub ident: u32,
    pub raw_size: u32,
}

impl Block {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            ident: cursor.read_u32()?,
            raw_size: cursor.read_u32()?,
        })
    }

    /// Declared payload length with the alignment flag stripped.
    pub fn payload_size(&self) -> usize {
        (self.raw_size & !ALIGN_DWORD) as usize
    }

    /// Payload length including padding to the next block.
    pub fn padded_size(&self) -> usize {
        let size = self.payload_size();
        if self.raw_size & ALIGN_DWORD != 0 {
            (size + 3) & !3
        } else {
            (size + 1) & !1
        }
    }

    pub fn is(&self, tag: &[u8; 4]) -> bool {
        self.ident == fourcc(tag)
    }
}

/// A decoded `PERS` header and a cursor confined to the object's payload.
#[derive(Debug)]
pub struct PersistHeader<'a> {
    pub class_name: String,
    pub version: u32,
    pub body: ByteCursor<'a>,
}

/// Read one persistent object header and step `cursor` past the whole block.
///
/// The returned body covers the payload after the class name and version,
/// so the per-class reader can never stray into the next object.
pub fn read_persist<'a>(cursor: &mut ByteCursor<'a>) -> Result<PersistHeader<'a>> {
    let block_start = cursor.position();
    let block = Block::read(cursor)?;
    if block.ident != IDENT_PERS {
        return Err(Error::corrupt(format!(
            "expected PERS block at offset {block_start}, found '{}'",
            ident_name(block.ident)
        )));
    }

    // The declared size must fit; the trailing pad byte may be missing at EOF
    cursor.ensure(block.payload_size())?;
    let mut payload = cursor.sub_cursor(block.payload_size())?;
    let padding = block.padded_size() - block.payload_size();
    cursor.skip(padding.min(cursor.remaining()))?;

    let name_len = payload.read_u16()? as usize;
    let class_name = payload.read_fixed_str(name_len)?;
    if name_len % 2 == 1 {
        payload.skip(1)?;
    }
    let version = payload.read_u32()?;

    let body_start = payload.position();
    let body = payload.sub_cursor(payload.remaining())?;

    tracing::debug!(
        "PERS {class_name} v{version} at {block_start} ({} body bytes from {})",
        body.len(),
        block_start + BLOCK_HEADER_SIZE + body_start
    );

    Ok(PersistHeader {
        class_name,
        version,
        body,
    })
}
