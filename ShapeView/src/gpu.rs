//! GPU-facing data: interleaved vertex buffers, batches and blend modes
//!
//! Nothing here talks to a graphics API. A renderer uploads
//! [`GpuMesh::vertex_bytes`] and [`GpuMesh::indices`] as-is and issues one
//! draw per [`Batch`] with the batch's blend mode.

use darkstar::formats::{BitmapFlags, TexturePixels};
use darkstar::render::DrawItem;
use darkstar::shape::{Material, MaterialList, MeshGeometry, Shape};

/// Floats per vertex: position (3), normal (3), uv (2)
pub const VERTEX_STRIDE: usize = 8;

pub type GpuVertex = [f32; VERTEX_STRIDE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Binary alpha: discard texels below half coverage
    AlphaTest,
    Translucent,
    Additive,
    Subtractive,
}

impl BlendMode {
    /// Pick a mode from the material and, when known, its bitmap's flags.
    pub fn for_material(material: &Material, bitmap: Option<&TexturePixels>) -> Self {
        let flags = bitmap.map_or(BitmapFlags::default(), |pixels| pixels.flags);
        if flags.is_additive() {
            Self::Additive
        } else if flags.is_subtractive() {
            Self::Subtractive
        } else if material.is_translucent() || flags.is_translucent() || material.alpha < 1.0 {
            Self::Translucent
        } else if flags.is_transparent() {
            Self::AlphaTest
        } else {
            Self::Opaque
        }
    }

    /// Drawn after opaque geometry
    pub fn is_blended(self) -> bool {
        matches!(self, Self::Translucent | Self::Additive | Self::Subtractive)
    }
}

/// A run of indices sharing one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// Index into the shape's material list; `None` draws untextured
    pub material: Option<usize>,
    pub first_index: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuMesh {
    pub vertices: Vec<GpuVertex>,
    pub indices: Vec<u32>,
    pub batches: Vec<Batch>,
}

impl GpuMesh {
    /// Interleave `geometry`, resolving primitive materials against `materials`.
    ///
    /// Primitives whose material is negative are not drawn.
    pub fn from_geometry(geometry: &MeshGeometry, materials: &MaterialList) -> Self {
        let vertices = geometry
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let n = geometry.normals.get(i).copied().unwrap_or_default();
                let uv = geometry.uvs.get(i).copied().unwrap_or_default();
                [p.x, p.y, p.z, n.x, n.y, n.z, uv.x, uv.y]
            })
            .collect();

        let batches = geometry
            .primitives
            .iter()
            .filter(|prim| prim.material >= 0)
            .map(|prim| Batch {
                material: materials.resolve(prim.material),
                first_index: prim.first_index,
                index_count: prim.index_count,
            })
            .collect();

        Self {
            vertices,
            indices: geometry.indices.clone(),
            batches,
        }
    }

    /// Geometry for one draw item at its current frames.
    pub fn for_item(shape: &Shape, item: &DrawItem) -> Option<Self> {
        let mesh = shape.mesh(item.mesh)?;
        let geometry = mesh.geometry(item.frame, item.material_frame);
        Some(Self::from_geometry(&geometry, shape.materials()))
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Column-major model matrix of a draw item, ready for a uniform buffer.
pub fn model_matrix(item: &DrawItem) -> [f32; 16] {
    item.transform.to_cols_array()
}
