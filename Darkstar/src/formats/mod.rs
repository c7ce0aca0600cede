//! Image asset formats: palettes and bitmaps

pub mod bitmap;
pub mod palette;

pub use bitmap::{Bitmap, BitmapFlags, TexturePixels, row_stride};
pub use palette::{PALETTE_SIZE, Palette, PaletteTable, RemapKind, Rgba};
