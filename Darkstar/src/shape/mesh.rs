//! Cel-animated mesh geometry
//!
//! Vertices are quantized to bytes and rescaled per frame. A mesh may hold
//! several vertex frames and several texture-coordinate frames; faces index
//! into one frame of each.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::error::{Error, Result};

/// A quantized vertex; `normal` indexes the engine's fixed normal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedVertex {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub normal: u8,
}

/// Dequantization parameters for one vertex frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshFrame {
    pub first_vert: u32,
    pub scale: Vec3,
    pub origin: Vec3,
}

impl MeshFrame {
    pub fn position(&self, vertex: PackedVertex) -> Vec3 {
        Vec3::new(
            f32::from(vertex.x),
            f32::from(vertex.y),
            f32::from(vertex.z),
        ) * self.scale
            + self.origin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceCorner {
    /// Index within a vertex frame
    pub vertex: u32,
    /// Index within a texture-coordinate frame
    pub tex_coord: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub corners: [FaceCorner; 3],
    /// Index into the shape's material list; negative faces are not drawn
    pub material: i32,
}

/// A run of triangles sharing one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    pub material: i32,
    pub first_index: u32,
    pub index_count: u32,
}

/// Unpacked, indexed triangle geometry for one (frame, texture frame) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub primitives: Vec<Primitive>,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub verts_per_frame: u32,
    /// Zero when every frame shares one texture-coordinate set
    pub tex_verts_per_frame: u32,
    pub radius: f32,
    pub vertices: Vec<PackedVertex>,
    pub tex_coords: Vec<Vec2>,
    pub faces: Vec<Face>,
    pub frames: Vec<MeshFrame>,
}

impl Mesh {
    /// Check every face and frame against the vertex and texture arrays.
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertices.len() as u64;
        for (i, frame) in self.frames.iter().enumerate() {
            if u64::from(frame.first_vert) + u64::from(self.verts_per_frame) > vertex_count {
                return Err(Error::corrupt(format!(
                    "mesh frame {i} spans vertices {}..{} of {vertex_count}",
                    frame.first_vert,
                    u64::from(frame.first_vert) + u64::from(self.verts_per_frame)
                )));
            }
        }

        let tex_limit = if self.tex_verts_per_frame == 0 {
            self.tex_coords.len()
        } else {
            self.tex_verts_per_frame as usize
        };

        for (i, face) in self.faces.iter().enumerate() {
            for corner in &face.corners {
                if corner.vertex >= self.verts_per_frame {
                    return Err(Error::corrupt(format!(
                        "mesh face {i} references vertex {} of {}",
                        corner.vertex, self.verts_per_frame
                    )));
                }
                // Meshes without texture coordinates draw with zero UVs
                if !self.tex_coords.is_empty() && corner.tex_coord as usize >= tex_limit {
                    return Err(Error::corrupt(format!(
                        "mesh face {i} references texture vertex {} of {tex_limit}",
                        corner.tex_coord
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn texture_frame_count(&self) -> usize {
        if self.tex_verts_per_frame == 0 {
            1
        } else {
            (self.tex_coords.len() / self.tex_verts_per_frame as usize).max(1)
        }
    }

    /// Dequantized positions of one vertex frame.
    pub fn frame_positions(&self, frame: usize) -> Vec<Vec3> {
        let Some(frame) = self.frames.get(frame).or(self.frames.first()) else {
            return Vec::new();
        };
        let start = frame.first_vert as usize;
        self.vertices
            .iter()
            .skip(start)
            .take(self.verts_per_frame as usize)
            .map(|&v| frame.position(v))
            .collect()
    }

    /// Unpack faces into indexed triangles.
    ///
    /// Out-of-range frames fall back to frame 0. Each (vertex, texture
    /// coordinate) pair becomes one output vertex per primitive, and
    /// consecutive faces with the same material share a primitive.
    pub fn geometry(&self, frame: usize, tex_frame: usize) -> MeshGeometry {
        let mut out = MeshGeometry::default();
        let Some(frame) = self.frames.get(frame).or(self.frames.first()) else {
            return out;
        };
        let tex_base = if tex_frame < self.texture_frame_count() {
            tex_frame * self.tex_verts_per_frame as usize
        } else {
            0
        };

        let mut remap: HashMap<FaceCorner, u32> = HashMap::new();
        for face in &self.faces {
            let starts_primitive = out
                .primitives
                .last()
                .is_none_or(|prim| prim.material != face.material);
            if starts_primitive {
                remap.clear();
                out.primitives.push(Primitive {
                    material: face.material,
                    first_index: out.indices.len() as u32,
                    index_count: 0,
                });
            }

            for corner in face.corners {
                let index = *remap.entry(corner).or_insert_with(|| {
                    let packed = self
                        .vertices
                        .get(frame.first_vert as usize + corner.vertex as usize)
                        .copied()
                        .unwrap_or_default();
                    out.positions.push(frame.position(packed));
                    out.uvs.push(
                        self.tex_coords
                            .get(tex_base + corner.tex_coord as usize)
                            .copied()
                            .unwrap_or(Vec2::ZERO),
                    );
                    out.positions.len() as u32 - 1
                });
                out.indices.push(index);
            }
            if let Some(prim) = out.primitives.last_mut() {
                prim.index_count += 3;
            }
        }

        out.normals = face_normals(&out.positions, &out.indices);
        out
    }
}

/// Area-weighted vertex normals.
fn face_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let weighted = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += weighted;
        normals[b] += weighted;
        normals[c] += weighted;
    }
    for normal in &mut normals {
        let unit = normal.normalize_or_zero();
        *normal = if unit == Vec3::ZERO { Vec3::Z } else { unit };
    }
    normals
}
