//! Texture cache and PNG export

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use darkstar::formats::{Palette, TexturePixels};
use darkstar::shape::{MaterialSource, Shape};
use darkstar::texture::load_material_texture;
use darkstar::vfs::AssetLocator;

use crate::error::Result;

/// Texture state of one material in a shape's list
#[derive(Debug)]
pub struct MaterialTexture {
    pub material: usize,
    /// Bitmap name, or empty for flat materials
    pub name: String,
    /// `Ok(None)` for materials that draw nothing
    pub pixels: darkstar::Result<Option<Arc<TexturePixels>>>,
}

/// Converted bitmaps keyed by lower-cased name.
///
/// Flat-colored materials are cheap and never cached.
#[derive(Debug, Default)]
pub struct TextureCache {
    bitmaps: HashMap<String, Arc<TexturePixels>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }

    pub fn clear(&mut self) {
        self.bitmaps.clear();
    }

    /// Resolve every material of `shape`. Failures are reported per
    /// material and never abort the others.
    pub fn resolve_shape(
        &mut self,
        locator: &AssetLocator,
        shape: &Shape,
        palette: Option<&Palette>,
    ) -> Vec<MaterialTexture> {
        shape
            .materials()
            .iter()
            .enumerate()
            .map(|(index, material)| {
                let name = match material.source() {
                    MaterialSource::Bitmap(name) => name.to_string(),
                    _ => String::new(),
                };
                let key = name.to_ascii_lowercase();

                let pixels = if let Some(hit) = self.bitmaps.get(&key).filter(|_| !key.is_empty()) {
                    Ok(Some(Arc::clone(hit)))
                } else {
                    load_material_texture(locator, material, palette).map(|pixels| {
                        pixels.map(|pixels| {
                            let pixels = Arc::new(pixels);
                            if !key.is_empty() {
                                self.bitmaps.insert(key.clone(), Arc::clone(&pixels));
                            }
                            pixels
                        })
                    })
                };

                if let Err(err) = &pixels {
                    tracing::warn!("Material {index} ({name}): {err}");
                }
                MaterialTexture {
                    material: index,
                    name,
                    pixels,
                }
            })
            .collect()
    }
}

/// Write RGBA pixels to `path` as PNG.
pub fn save_png(pixels: &TexturePixels, path: &Path) -> Result<()> {
    image::save_buffer(
        path,
        &pixels.rgba,
        pixels.width,
        pixels.height,
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(())
}
