//! `TS::MaterialList` reader

use crate::binary::ByteCursor;
use crate::error::{Error, Result};
use crate::shape::material::{Material, MaterialList};

pub(crate) const MATERIAL_LIST_CLASS: &str = "TS::MaterialList";

const NAME_SIZE_V1: usize = 16;
const NAME_SIZE: usize = 32;

fn name_size(version: u32) -> usize {
    if version < 2 { NAME_SIZE_V1 } else { NAME_SIZE }
}

fn has_surface_props(version: u32) -> bool {
    version == 1 || version > 2
}

fn has_default_props_flag(version: u32) -> bool {
    version != 2 && version != 3
}

/// Bytes in one material record of `version`.
fn material_size(version: u32) -> u64 {
    let name = name_size(version) as u64;
    let surface = if has_surface_props(version) { 12 } else { 0 };
    let default_props = if has_default_props_flag(version) { 4 } else { 0 };
    16 + name + surface + default_props
}

fn read_material(c: &mut ByteCursor<'_>, version: u32) -> Result<Material> {
    let flags = c.read_u32()?;
    let alpha = c.read_f32()?;
    let palette_index = c.read_u32()?;
    let rgb = c.take(4)?;
    let rgb = [rgb[0], rgb[1], rgb[2]];
    let bitmap = c.read_fixed_str(name_size(version))?;

    let mut material = Material {
        flags,
        alpha,
        palette_index,
        rgb,
        bitmap,
        ..Material::default()
    };
    if has_surface_props(version) {
        material.surface_type = c.read_u32()?;
        material.elasticity = c.read_f32()?;
        material.friction = c.read_f32()?;
    }
    if has_default_props_flag(version) {
        material.use_default_props = c.read_u32()? != 0;
    }
    Ok(material)
}

/// Decode a material list body of revision 1 through 4.
///
/// The list holds `count` materials for each of `detail_count` material
/// detail sets, stored one set after another.
pub(crate) fn read_material_list(c: &mut ByteCursor<'_>, version: u32) -> Result<MaterialList> {
    if !(1..=4).contains(&version) {
        return Err(Error::UnsupportedVersion {
            format: "material list",
            version,
        });
    }

    let detail_count = c.read_u32()?;
    let count = c.read_u32()?;
    let total = u64::from(detail_count) * u64::from(count);
    c.ensure_u64(total.saturating_mul(material_size(version)))?;

    let materials = (0..total)
        .map(|_| read_material(c, version))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!("Material list v{version}: {count} materials x {detail_count} sets");

    Ok(MaterialList {
        detail_count,
        materials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::material::MaterialKind;
    use crate::test_support::{MaterialSpec, write_material_list_body};

    #[test]
    fn test_versions_share_common_fields() {
        let specs = [
            MaterialSpec::texture("skin.bmp"),
            MaterialSpec::rgb([10, 20, 30]),
        ];
        for version in 1..=4 {
            let body = write_material_list_body(&specs, version);
            let mut cursor = ByteCursor::new(&body);
            let list = read_material_list(&mut cursor, version).unwrap();
            assert!(cursor.is_at_end(), "version {version}");
            assert_eq!(list.len(), 2);
            assert_eq!(list.materials[0].bitmap, "skin.bmp");
            assert_eq!(list.materials[0].kind(), MaterialKind::Texture);
            assert_eq!(list.materials[1].rgb, [10, 20, 30]);
        }
    }

    #[test]
    fn test_default_props_only_where_stored() {
        let specs = [MaterialSpec::texture("a.bmp")];
        let body = write_material_list_body(&specs, 4);
        let list = read_material_list(&mut ByteCursor::new(&body), 4).unwrap();
        // The fixture stores 0 for the flag
        assert!(!list.materials[0].use_default_props);

        let body = write_material_list_body(&specs, 3);
        let list = read_material_list(&mut ByteCursor::new(&body), 3).unwrap();
        assert!(list.materials[0].use_default_props);
    }

    #[test]
    fn test_material_count_checked_against_buffer() {
        let mut body = write_material_list_body(&[MaterialSpec::texture("a.bmp")], 2);
        body[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            read_material_list(&mut ByteCursor::new(&body), 2),
            Err(Error::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_unknown_version() {
        assert!(matches!(
            read_material_list(&mut ByteCursor::new(&[]), 5),
            Err(Error::UnsupportedVersion { version: 5, .. })
        ));
    }
}
