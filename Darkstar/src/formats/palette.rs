//! Palette decoding (`PL98`, `PPAL` and Microsoft RIFF `PAL `)
//!
//! Every encoding decodes to one or more 256-entry RGBA tables. Multi-table
//! `PL98` files tag each table with an index that bitmaps refer to; lookups
//! for an unknown index fall back to the first table.

use crate::binary::{Block, ByteCursor, fourcc, ident_name};
use crate::error::{Error, Result};

/// Entries per palette table.
pub const PALETTE_SIZE: usize = 256;

const IDENT_PL98: u32 = fourcc(b"PL98");
const IDENT_PPAL: u32 = fourcc(b"PPAL");
const IDENT_RIFF: u32 = fourcc(b"RIFF");
const IDENT_PAL: u32 = fourcc(b"PAL ");
const IDENT_HEAD: u32 = fourcc(b"head");
const IDENT_INFO: u32 = fourcc(b"info");
const IDENT_DATA: u32 = fourcc(b"data");

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack the engine's packed form: red in the low byte, alpha in the high byte.
    pub const fn from_packed(value: u32) -> Self {
        let [r, g, b, a] = value.to_le_bytes();
        Self { r, g, b, a }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Remap behaviour attached to a `PL98` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapKind {
    NoRemap,
    ShadeHaze,
    Translucent,
    ColorQuant,
    AlphaQuant,
    AdditiveQuant,
    Additive,
    SubtractiveQuant,
    Subtractive,
    Unknown(u32),
}

impl From<u32> for RemapKind {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::NoRemap,
            1 => Self::ShadeHaze,
            2 => Self::Translucent,
            3 => Self::ColorQuant,
            4 => Self::AlphaQuant,
            5 => Self::AdditiveQuant,
            6 => Self::Additive,
            7 => Self::SubtractiveQuant,
            8 => Self::Subtractive,
            other => Self::Unknown(other),
        }
    }
}

/// One 256-color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteTable {
    /// Index bitmaps use to select this table (`-1` when untagged)
    pub index: i32,
    pub kind: RemapKind,
    pub colors: [Rgba; PALETTE_SIZE],
}

impl PaletteTable {
    fn untagged(colors: [Rgba; PALETTE_SIZE]) -> Self {
        Self {
            index: -1,
            kind: RemapKind::NoRemap,
            colors,
        }
    }

    pub fn color(&self, index: u8) -> Rgba {
        self.colors[usize::from(index)]
    }
}

/// A decoded palette file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    tables: Vec<PaletteTable>,
    pub shade_shift: i32,
    pub haze_levels: i32,
    pub haze_color: i32,
}

impl Palette {
    /// Wrap a single table, as found in bitmaps that carry their own colors.
    pub fn from_colors(colors: [Rgba; PALETTE_SIZE]) -> Self {
        Self {
            tables: vec![PaletteTable::untagged(colors)],
            shade_shift: 0,
            haze_levels: 0,
            haze_color: 0,
        }
    }

    /// Decode any supported palette encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);
        let block = Block::read(&mut cursor)?;

        let palette = match block.ident {
            IDENT_RIFF => Self::from_colors(read_riff_colors(&mut ByteCursor::new(bytes))?),
            IDENT_PPAL => read_ppal(&mut cursor)?,
            IDENT_PL98 => read_pl98(&mut cursor, block.raw_size)?,
            other => {
                return Err(Error::corrupt(format!(
                    "unrecognized palette signature '{}'",
                    ident_name(other)
                )));
            }
        };

        tracing::debug!("Decoded palette: {} table(s)", palette.tables.len());
        Ok(palette)
    }

    pub fn tables(&self) -> &[PaletteTable] {
        &self.tables
    }

    /// The primary (first) table.
    pub fn colors(&self) -> &[Rgba; PALETTE_SIZE] {
        &self.primary().colors
    }

    pub fn primary(&self) -> &PaletteTable {
        // Construction guarantees at least one table
        &self.tables[0]
    }

    /// Table tagged with `index`, or the primary table if none matches.
    pub fn table_for_index(&self, index: i32) -> &PaletteTable {
        self.tables
            .iter()
            .find(|table| table.index == index)
            .unwrap_or_else(|| self.primary())
    }
}

fn read_packed_colors(cursor: &mut ByteCursor<'_>) -> Result<[Rgba; PALETTE_SIZE]> {
    cursor.ensure(PALETTE_SIZE * 4)?;
    let mut colors = [Rgba::default(); PALETTE_SIZE];
    for color in &mut colors {
        *color = Rgba::from_packed(cursor.read_u32()?);
    }
    Ok(colors)
}

/// Microsoft RIFF palette, positioned at its `RIFF` header.
///
/// Shorter palettes leave the remaining entries black; entries past 256 are ignored.
pub(crate) fn read_riff_colors(cursor: &mut ByteCursor<'_>) -> Result<[Rgba; PALETTE_SIZE]> {
    let riff = Block::read(cursor)?;
    if riff.ident != IDENT_RIFF {
        return Err(Error::corrupt("expected RIFF header"));
    }
    let mut form = cursor.sub_cursor(riff.payload_size().min(cursor.remaining()))?;
    if form.read_u32()? != IDENT_PAL {
        return Err(Error::corrupt("RIFF form is not a palette"));
    }

    loop {
        let chunk = Block::read(&mut form)?;
        let mut body = form.sub_cursor(chunk.payload_size())?;
        if chunk.ident != IDENT_DATA {
            form.skip((chunk.padded_size() - chunk.payload_size()).min(form.remaining()))?;
            continue;
        }

        let _version = body.read_u16()?;
        let count = usize::from(body.read_u16()?);
        body.ensure(count * 4)?;

        let mut colors = [Rgba::default(); PALETTE_SIZE];
        for color in colors.iter_mut().take(count) {
            let raw = body.take(4)?;
            *color = Rgba::new(raw[0], raw[1], raw[2], 255);
        }
        return Ok(colors);
    }
}

fn read_ppal(cursor: &mut ByteCursor<'_>) -> Result<Palette> {
    let head_start = cursor.position();
    let head = Block::read(cursor)?;
    if head.ident != IDENT_HEAD {
        return Err(Error::corrupt(format!(
            "PPAL: expected head chunk, found '{}'",
            ident_name(head.ident)
        )));
    }
    let version = cursor.read_u8()?;
    if version != 3 && version != 7 {
        return Err(Error::UnsupportedVersion {
            format: "PPAL palette",
            version: u32::from(version),
        });
    }
    let _reserved = cursor.read_u16()?;
    let shade_shift = i32::from(cursor.read_u8()?);
    cursor.seek(head_start + 8 + head.padded_size())?;

    let mut chunk_start = cursor.position();
    let mut chunk = Block::read(cursor)?;
    if chunk.ident == IDENT_INFO {
        cursor.seek(chunk_start + 8 + chunk.padded_size())?;
        chunk_start = cursor.position();
        chunk = Block::read(cursor)?;
    }
    if chunk.ident != IDENT_DATA {
        return Err(Error::corrupt(format!(
            "PPAL: expected data chunk at {chunk_start}, found '{}'",
            ident_name(chunk.ident)
        )));
    }

    let colors = read_packed_colors(cursor)?;
    Ok(Palette {
        shade_shift,
        ..Palette::from_colors(colors)
    })
}

fn read_pl98(cursor: &mut ByteCursor<'_>, count: u32) -> Result<Palette> {
    if count == 0 {
        return Err(Error::corrupt("PL98 palette declares no tables"));
    }

    let shade_shift = cursor.read_i32()?;
    let haze_levels = cursor.read_i32()?;
    let haze_color = cursor.read_i32()?;
    let _allowed_matches = cursor.take(32)?;

    // 1024 color bytes + index + remap kind per table
    cursor.ensure_u64(u64::from(count) * (PALETTE_SIZE as u64 * 4 + 8))?;

    let mut tables = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let colors = read_packed_colors(cursor)?;
        let index = cursor.read_i32()?;
        let kind = RemapKind::from(cursor.read_u32()?);
        tables.push(PaletteTable {
            index,
            kind,
            colors,
        });
    }

    Ok(Palette {
        tables,
        shade_shift,
        haze_levels,
        haze_color,
    })
}
