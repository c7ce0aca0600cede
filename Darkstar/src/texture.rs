//! Resolving shape materials to RGBA pixels

use crate::error::{Error, Result};
use crate::formats::{Bitmap, Palette, Rgba, TexturePixels};
use crate::shape::{Material, MaterialSource};
use crate::vfs::AssetLocator;

/// Pixels for one material, or `None` for materials that draw nothing.
///
/// Bitmap materials are looked up through `locator` and converted with the
/// bitmap's own palette if it has one, otherwise with `palette` (the table
/// matching the bitmap's palette index). Flat palette and RGB materials
/// become 1x1 textures.
///
/// # Errors
/// Returns [`Error::AssetNotFound`] when the bitmap is not mounted,
/// decode errors for a malformed bitmap and [`Error::MissingPalette`] for
/// indexed data with no palette to resolve it.
pub fn load_material_texture(
    locator: &AssetLocator,
    material: &Material,
    palette: Option<&Palette>,
) -> Result<Option<TexturePixels>> {
    match material.source() {
        MaterialSource::Bitmap(name) => {
            let bytes = locator.resolve(name)?;
            let bitmap = Bitmap::decode(&bytes)?;
            let pixels = bitmap.to_rgba(palette).map_err(|err| match err {
                Error::MissingPalette { .. } => Error::MissingPalette { name: name.to_string() },
                other => other,
            })?;
            tracing::debug!("Texture {name}: {}x{}", pixels.width, pixels.height);
            Ok(Some(pixels))
        }
        MaterialSource::PaletteColor(index) => {
            let palette = palette.ok_or_else(|| Error::MissingPalette {
                name: format!("palette color {index}"),
            })?;
            let color = palette.primary().color(index);
            Ok(Some(TexturePixels::solid(Rgba { a: 255, ..color })))
        }
        MaterialSource::Rgb([r, g, b]) => Ok(Some(TexturePixels::solid(Rgba::new(r, g, b, 255)))),
        MaterialSource::None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveReader;
    use crate::test_support::{build_pbmp, build_ppal, build_volume};
    use crate::vfs::{ArchiveVolume, Volume};

    fn locator_with(files: &[(&str, &[u8], u8)]) -> AssetLocator {
        let mut locator = AssetLocator::new();
        let directory = ArchiveReader::open(build_volume(files)).unwrap();
        locator.mount_volume(Volume::Archive(ArchiveVolume::from_directory("test.vol", directory)));
        locator
    }

    #[test]
    fn test_bitmap_uses_session_palette() {
        let bmp = build_pbmp(2, 1, 0, &[1, 2], None);
        let locator = locator_with(&[("skin.bmp", &bmp, 0)]);
        let palette = Palette::decode(&build_ppal(3, false)).unwrap();

        let pixels = load_material_texture(&locator, &Material::textured("SKIN.BMP"), Some(&palette))
            .unwrap()
            .unwrap();
        assert_eq!((pixels.width, pixels.height), (2, 1));
        assert_eq!(pixels.rgba, vec![1, 2, 3, 255, 2, 4, 6, 255]);
    }

    #[test]
    fn test_indexed_bitmap_without_palette_names_bitmap() {
        let bmp = build_pbmp(1, 1, 0, &[0], None);
        let locator = locator_with(&[("skin.bmp", &bmp, 0)]);
        let err = load_material_texture(&locator, &Material::textured("skin.bmp"), None).unwrap_err();
        assert!(matches!(err, Error::MissingPalette { name } if name == "skin.bmp"));
    }

    #[test]
    fn test_missing_bitmap() {
        let locator = AssetLocator::new();
        assert!(matches!(
            load_material_texture(&locator, &Material::textured("gone.bmp"), None),
            Err(Error::AssetNotFound { .. })
        ));
    }

    #[test]
    fn test_flat_materials() {
        let locator = AssetLocator::new();
        let rgb = Material {
            flags: 2,
            rgb: [9, 8, 7],
            ..Material::default()
        };
        let pixels = load_material_texture(&locator, &rgb, None).unwrap().unwrap();
        assert_eq!(pixels.rgba, vec![9, 8, 7, 255]);

        let null = Material::default();
        assert!(load_material_texture(&locator, &null, None).unwrap().is_none());
    }
}
