//! `TS::CelAnimMesh` reader

use crate::binary::ByteCursor;
use crate::error::{Error, Result};
use crate::shape::mesh::{Face, FaceCorner, Mesh, MeshFrame, PackedVertex};

pub(crate) const MESH_CLASS: &str = "TS::CelAnimMesh";

const PACKED_VERTEX_SIZE: u64 = 4;
const TEX_VERT_SIZE: u64 = 8;
const FACE_SIZE: u64 = 28;
const FRAME_SIZE: u64 = 28;
const FRAME_INDEX_SIZE: u64 = 4;

fn count(value: i32, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::corrupt(format!("mesh {what} count is negative ({value})")))
}

fn index(value: i32, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::corrupt(format!("mesh {what} index is negative ({value})")))
}

fn corner(c: &mut ByteCursor<'_>) -> Result<FaceCorner> {
    Ok(FaceCorner {
        vertex: index(c.read_i32()?, "vertex")?,
        tex_coord: index(c.read_i32()?, "texture vertex")?,
    })
}

/// Decode a mesh body of revision 1 through 3.
///
/// Before revision 3 every frame shares one scale and origin stored in the
/// header, and a mesh without frames gets a single frame at vertex 0.
pub(crate) fn read_cel_anim_mesh(c: &mut ByteCursor<'_>, version: u32) -> Result<Mesh> {
    if !(1..=3).contains(&version) {
        return Err(Error::UnsupportedVersion {
            format: "mesh",
            version,
        });
    }

    let vertex_count = count(c.read_i32()?, "vertex")?;
    let verts_per_frame = count(c.read_i32()?, "vertices per frame")?;
    let tex_vert_count = count(c.read_i32()?, "texture vertex")?;
    let face_count = count(c.read_i32()?, "face")?;
    let frame_count = count(c.read_i32()?, "frame")?;
    let tex_verts_per_frame = if version >= 2 {
        count(c.read_i32()?, "texture vertices per frame")?
    } else {
        tex_vert_count
    };

    let shared = if version < 3 {
        Some((c.read_vec3()?, c.read_vec3()?))
    } else {
        None
    };
    let radius = c.read_f32()?;

    let frame_size = if shared.is_some() { FRAME_INDEX_SIZE } else { FRAME_SIZE };
    c.ensure_u64(
        u64::from(vertex_count) * PACKED_VERTEX_SIZE
            + u64::from(tex_vert_count) * TEX_VERT_SIZE
            + u64::from(face_count) * FACE_SIZE
            + u64::from(frame_count) * frame_size,
    )?;

    let vertices = (0..vertex_count)
        .map(|_| -> Result<PackedVertex> {
            let b = c.take(4)?;
            Ok(PackedVertex {
                x: b[0],
                y: b[1],
                z: b[2],
                normal: b[3],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let tex_coords = (0..tex_vert_count)
        .map(|_| c.read_vec2())
        .collect::<Result<Vec<_>>>()?;

    let faces = (0..face_count)
        .map(|_| -> Result<Face> {
            Ok(Face {
                corners: [corner(c)?, corner(c)?, corner(c)?],
                material: c.read_i32()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let frames = match shared {
        Some((scale, origin)) if frame_count == 0 => vec![MeshFrame {
            first_vert: 0,
            scale,
            origin,
        }],
        Some((scale, origin)) => (0..frame_count)
            .map(|_| -> Result<MeshFrame> {
                Ok(MeshFrame {
                    first_vert: index(c.read_i32()?, "frame vertex")?,
                    scale,
                    origin,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        None => (0..frame_count)
            .map(|_| -> Result<MeshFrame> {
                Ok(MeshFrame {
                    first_vert: index(c.read_i32()?, "frame vertex")?,
                    scale: c.read_vec3()?,
                    origin: c.read_vec3()?,
                })
            })
            .collect::<Result<Vec<_>>>()?,
    };

    tracing::debug!(
        "Mesh v{version}: {vertex_count} verts ({verts_per_frame}/frame), {tex_vert_count} tex verts, {face_count} faces, {} frames",
        frames.len()
    );

    Ok(Mesh {
        verts_per_frame,
        tex_verts_per_frame,
        radius,
        vertices,
        tex_coords,
        faces,
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MeshSpec, write_mesh_body};

    #[test]
    fn test_v3_frames_carry_own_scale() {
        let spec = MeshSpec::triangle();
        let body = write_mesh_body(&spec, 3);
        let mesh = read_cel_anim_mesh(&mut ByteCursor::new(&body), 3).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces.len(), 1);
        assert_eq!(mesh.frames.len(), 1);
        assert_eq!(mesh.frames[0].scale, spec.scale);
        mesh.validate().unwrap();
    }

    #[test]
    fn test_v1_without_frames_synthesizes_one() {
        let spec = MeshSpec {
            frames: 0,
            ..MeshSpec::triangle()
        };
        let body = write_mesh_body(&spec, 1);
        let mesh = read_cel_anim_mesh(&mut ByteCursor::new(&body), 1).unwrap();
        assert_eq!(mesh.frames.len(), 1);
        assert_eq!(mesh.frames[0].origin, spec.origin);
        assert_eq!(mesh.tex_verts_per_frame, 3);
    }

    #[test]
    fn test_oversized_counts_fail_before_reading() {
        let mut body = write_mesh_body(&MeshSpec::triangle(), 3);
        // Claim a million faces
        body[12..16].copy_from_slice(&1_000_000i32.to_le_bytes());
        assert!(matches!(
            read_cel_anim_mesh(&mut ByteCursor::new(&body), 3),
            Err(Error::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_unknown_mesh_version() {
        assert!(matches!(
            read_cel_anim_mesh(&mut ByteCursor::new(&[]), 4),
            Err(Error::UnsupportedVersion { format: "mesh", version: 4 })
        ));
    }

    #[test]
    fn test_negative_count_is_corrupt() {
        let mut body = write_mesh_body(&MeshSpec::triangle(), 3);
        body[0..4].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(
            read_cel_anim_mesh(&mut ByteCursor::new(&body), 3),
            Err(Error::CorruptData { .. })
        ));
    }
}
