//! Bitmap decoding (`PBMP` and Microsoft `BM`)
//!
//! Only the top mip level is converted to RGBA; indexed bitmaps resolve
//! through their embedded palette when present, otherwise through a
//! caller-supplied palette.

use super::palette::{PALETTE_SIZE, Palette, Rgba, read_riff_colors};
use crate::binary::{Block, ByteCursor, fourcc, ident_name};
use crate::error::{Error, Result};

const IDENT_PBMP: u32 = fourcc(b"PBMP");
const IDENT_HEAD: u32 = fourcc(b"head");
const IDENT_DETL: u32 = fourcc(b"DETL");
const IDENT_PIDX: u32 = fourcc(b"piDX");
const IDENT_DATA: u32 = fourcc(b"data");
const IDENT_RIFF: u32 = fourcc(b"RIFF");
const IDENT_BM: u16 = u16::from_le_bytes(*b"BM");

/// Reserved-word marker in BMP files that carry a palette index
const BMP_PALETTE_MARKER: u16 = 0xf5f7;

/// Bitmap blending flags stored in the `PBMP` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitmapFlags(pub u32);

impl BitmapFlags {
    pub const TRANSPARENT: u32 = 0x1;
    pub const FUZZY: u32 = 0x2;
    pub const TRANSLUCENT: u32 = 0x4;
    pub const ADDITIVE: u32 = 0x10;
    pub const SUBTRACTIVE: u32 = 0x20;
    pub const ALPHA8: u32 = 0x40;

    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn is_transparent(self) -> bool {
        self.contains(Self::TRANSPARENT)
    }

    pub fn is_translucent(self) -> bool {
        self.contains(Self::TRANSLUCENT)
    }

    pub fn is_additive(self) -> bool {
        self.contains(Self::ADDITIVE)
    }

    pub fn is_subtractive(self) -> bool {
        self.contains(Self::SUBTRACTIVE)
    }
}

/// Row stride in bytes, padded to 32 bits.
pub fn row_stride(width: u32, bit_depth: u32) -> usize {
    4 * ((width as usize * bit_depth as usize).div_ceil(32))
}

/// A decoded bitmap, top row first.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u32,
    pub flags: BitmapFlags,
    /// Palette table this bitmap expects, if tagged
    pub palette_index: Option<i32>,
    pub mip_levels: u32,
    pub stride: usize,
    /// Top mip level, `stride * height` bytes
    pub pixels: Vec<u8>,
    pub palette: Option<Palette>,
    /// 24-bit data is stored blue first
    pub bgr: bool,
}

/// RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexturePixels {
    pub width: u32,
    pub height: u32,
    pub flags: BitmapFlags,
    pub rgba: Vec<u8>,
}

impl TexturePixels {
    /// A 1x1 texture of one color, used for untextured materials.
    pub fn solid(color: Rgba) -> Self {
        Self {
            width: 1,
            height: 1,
            flags: BitmapFlags::default(),
            rgba: color.to_array().to_vec(),
        }
    }
}

impl Bitmap {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() >= 2 && u16::from_le_bytes([bytes[0], bytes[1]]) == IDENT_BM {
            return decode_bmp(bytes);
        }

        let mut cursor = ByteCursor::new(bytes);
        let block = Block::read(&mut cursor)?;
        if block.ident != IDENT_PBMP {
            return Err(Error::corrupt(format!(
                "unrecognized bitmap signature '{}'",
                ident_name(block.ident)
            )));
        }
        decode_pbmp(&mut cursor)
    }

    /// Convert the top mip level to RGBA8.
    ///
    /// `fallback` is consulted for 8-bit data when the bitmap carries no
    /// palette of its own.
    pub fn to_rgba(&self, fallback: Option<&Palette>) -> Result<TexturePixels> {
        let (width, height) = (self.width as usize, self.height as usize);
        let mut rgba = Vec::with_capacity(width * height * 4);

        match self.bit_depth {
            8 => {
                let palette = self
                    .palette
                    .as_ref()
                    .or(fallback)
                    .ok_or_else(|| Error::MissingPalette {
                        name: String::new(),
                    })?;
                let table = palette.table_for_index(self.palette_index.unwrap_or(-1));
                for row in self.pixels.chunks(self.stride.max(1)).take(height) {
                    for &index in row.iter().take(width) {
                        let color = table.color(index);
                        let alpha = self.alpha_for(color.a);
                        rgba.extend_from_slice(&[color.r, color.g, color.b, alpha]);
                    }
                }
            }
            24 => {
                for row in self.pixels.chunks(self.stride.max(1)).take(height) {
                    for px in row.chunks_exact(3).take(width) {
                        if self.bgr {
                            rgba.extend_from_slice(&[px[2], px[1], px[0], 255]);
                        } else {
                            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
                        }
                    }
                }
            }
            other => {
                return Err(Error::corrupt(format!("unsupported bitmap depth: {other} bits")));
            }
        }

        Ok(TexturePixels {
            width: self.width,
            height: self.height,
            flags: self.flags,
            rgba,
        })
    }

    fn alpha_for(&self, palette_alpha: u8) -> u8 {
        if self.flags.is_transparent() {
            if palette_alpha > 0 { 255 } else { 0 }
        } else if self.flags.is_translucent() {
            palette_alpha
        } else {
            255
        }
    }
}

fn decode_pbmp(cursor: &mut ByteCursor<'_>) -> Result<Bitmap> {
    let mut width = 0;
    let mut height = 0;
    let mut bit_depth = 0;
    let mut flags = BitmapFlags::default();
    let mut mip_levels = 1;
    let mut palette_index = None;
    let mut data: Option<&[u8]> = None;
    let mut palette = None;
    let mut saw_header = false;
    let mut expected_chunks = u32::MAX;

    while !cursor.is_at_end() && expected_chunks != 0 {
        let start = cursor.position();
        let block = Block::read(cursor)?;
        expected_chunks -= 1;
        let mut body = ByteCursor::new(cursor.take(block.payload_size())?);
        cursor.skip((block.padded_size() - block.payload_size()).min(cursor.remaining()))?;

        match block.ident {
            IDENT_HEAD => {
                let version = body.read_u32()?;
                if version >> 24 != 0 {
                    return Err(Error::UnsupportedVersion {
                        format: "PBMP bitmap",
                        version: version >> 24,
                    });
                }
                width = body.read_u32()?;
                height = body.read_u32()?;
                bit_depth = body.read_u32()?;
                flags = BitmapFlags(body.read_u32()?);
                // Counted after the header itself
                expected_chunks = version & 0x00FF_FFFF;
                saw_header = true;
            }
            IDENT_DETL => mip_levels = body.read_u32()?,
            IDENT_PIDX => palette_index = Some(body.read_i32()?),
            IDENT_DATA => data = Some(body.take(body.len())?),
            IDENT_RIFF => {
                let mut riff = ByteCursor::new(cursor_slice(cursor, start, block)?);
                palette = Some(Palette::from_colors(read_riff_colors(&mut riff)?));
            }
            other => {
                tracing::debug!("Skipping bitmap chunk '{}'", ident_name(other));
            }
        }
    }

    if !saw_header {
        return Err(Error::corrupt("PBMP bitmap has no head chunk"));
    }
    if width == 0 || height == 0 {
        return Err(Error::corrupt("bitmap has no pixels"));
    }

    let stride = row_stride(width, bit_depth);
    let top_level = stride
        .checked_mul(height as usize)
        .ok_or_else(|| Error::corrupt("bitmap dimensions overflow"))?;
    let data = data.ok_or_else(|| Error::corrupt("PBMP bitmap has no data chunk"))?;
    if data.len() < top_level {
        return Err(Error::TruncatedData {
            offset: 0,
            needed: top_level,
            available: data.len(),
        });
    }

    Ok(Bitmap {
        width,
        height,
        bit_depth,
        flags,
        palette_index,
        mip_levels,
        stride,
        pixels: data[..top_level].to_vec(),
        palette,
        bgr: false,
    })
}

/// Re-borrow a whole block (header included) that `cursor` has already passed.
fn cursor_slice<'a>(cursor: &ByteCursor<'a>, start: usize, block: Block) -> Result<&'a [u8]> {
    let mut whole = cursor.clone();
    whole.seek(start)?;
    whole.take(8 + block.payload_size())
}

fn decode_bmp(bytes: &[u8]) -> Result<Bitmap> {
    let mut cursor = ByteCursor::new(bytes);

    // BITMAPFILEHEADER
    let _signature = cursor.read_u16()?;
    let _file_size = cursor.read_u32()?;
    let reserved1 = cursor.read_u16()?;
    let reserved2 = cursor.read_u16()?;
    let pixel_offset = cursor.read_u32()? as usize;

    // BITMAPINFOHEADER
    let header_size = cursor.read_u32()? as usize;
    let width = cursor.read_i32()?;
    let raw_height = cursor.read_i32()?;
    let _planes = cursor.read_u16()?;
    let bit_depth = u32::from(cursor.read_u16()?);
    let compression = cursor.read_u32()?;
    cursor.skip(12)?;
    let colors_used = cursor.read_u32()? as usize;
    let _colors_important = cursor.read_u32()?;
    cursor.seek(14 + header_size)?;

    if compression != 0 {
        return Err(Error::corrupt(format!("compressed BMP (method {compression})")));
    }
    let width = u32::try_from(width).map_err(|_| Error::corrupt("negative BMP width"))?;
    let height = raw_height.unsigned_abs();
    if width == 0 || height == 0 {
        return Err(Error::corrupt("bitmap has no pixels"));
    }
    let palette_index = (reserved1 == BMP_PALETTE_MARKER && reserved2 != 0xffff).then_some(i32::from(reserved2));

    let palette = if bit_depth == 8 {
        let count = if colors_used == 0 { PALETTE_SIZE } else { colors_used };
        cursor.ensure(count * 4)?;
        let mut colors = [Rgba::default(); PALETTE_SIZE];
        for i in 0..count {
            let quad = cursor.take(4)?;
            if let Some(color) = colors.get_mut(i) {
                *color = Rgba::new(quad[2], quad[1], quad[0], 255);
            }
        }
        Some(Palette::from_colors(colors))
    } else {
        None
    };

    if pixel_offset != 0 {
        cursor.seek(pixel_offset)?;
    }

    let stride = row_stride(width, bit_depth);
    let top_level = stride
        .checked_mul(height as usize)
        .ok_or_else(|| Error::corrupt("bitmap dimensions overflow"))?;
    let rows = cursor.take(top_level)?;

    // Bottom-up unless the height is negative
    let pixels = if raw_height > 0 {
        rows.chunks(stride).rev().flatten().copied().collect()
    } else {
        rows.to_vec()
    };

    Ok(Bitmap {
        width,
        height,
        bit_depth,
        flags: BitmapFlags::default(),
        palette_index,
        mip_levels: 1,
        stride,
        pixels,
        palette,
        bgr: true,
    })
}
