//! Fixtures shared by the unit tests

use darkstar::shape::{
    DetailLevel, Face, FaceCorner, Material, MaterialList, Mesh, MeshFrame, Node, Object,
    PackedVertex, Shape, ShapeParts, Transform,
};
use glam::{Vec2, Vec3};

/// One node carrying one textured triangle, one detail level.
pub fn tiny_shape() -> Shape {
    let corner = |i: u32| FaceCorner { vertex: i, tex_coord: i };
    let mesh = Mesh {
        verts_per_frame: 3,
        tex_verts_per_frame: 3,
        radius: 1.0,
        vertices: vec![
            PackedVertex { x: 0, y: 0, z: 0, normal: 0 },
            PackedVertex { x: 2, y: 0, z: 0, normal: 0 },
            PackedVertex { x: 0, y: 2, z: 0, normal: 0 },
        ],
        tex_coords: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
        faces: vec![Face {
            corners: [corner(0), corner(1), corner(2)],
            material: 0,
        }],
        frames: vec![MeshFrame {
            first_vert: 0,
            scale: Vec3::ONE,
            origin: Vec3::ZERO,
        }],
    };
    Shape::from_parts(ShapeParts {
        version: 8,
        nodes: vec![Node {
            name: "root".into(),
            parent: None,
            default_transform: Transform::IDENTITY,
        }],
        objects: vec![Object {
            name: "body".into(),
            node: Some(0),
            mesh: Some(0),
            offset: Vec3::ZERO,
            hidden_by_default: false,
        }],
        meshes: vec![mesh],
        materials: MaterialList::new(vec![Material::textured("body.bmp")]),
        details: vec![DetailLevel::new(10.0, Some(0))],
        radius: 1.5,
        ..ShapeParts::default()
    })
    .unwrap()
}

#[derive(Default)]
struct Writer(Vec<u8>);

impl Writer {
    fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i16(&mut self, v: i16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i32(&mut self, v: i32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn f32(&mut self, v: f32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.0.extend_from_slice(v);
        self
    }

    fn fixed_str(&mut self, s: &str, width: usize) -> &mut Self {
        let mut field = s.as_bytes().to_vec();
        field.resize(width, 0);
        self.bytes(&field)
    }
}

fn chunk(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

fn persist(class: &str, version: u32, body: &[u8]) -> Vec<u8> {
    let mut payload = Writer::default();
    payload.u16(class.len() as u16).bytes(class.as_bytes());
    if class.len() % 2 == 1 {
        payload.bytes(&[0]);
    }
    payload.u32(version).bytes(body);
    let mut out = Vec::new();
    chunk(&mut out, b"PERS", &payload.0);
    out
}

/// Revision 3 `TS::CelAnimMesh` body for one triangle.
fn triangle_mesh_body() -> Vec<u8> {
    let mut w = Writer::default();
    // vertices, per frame, texture vertices, faces, frames, texture vertices per frame
    w.i32(3).i32(3).i32(3).i32(1).i32(1).i32(3);
    w.f32(1.5);
    w.bytes(&[0, 0, 0, 0, 2, 0, 0, 0, 0, 2, 0, 0]);
    for (u, v) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
        w.f32(u).f32(v);
    }
    for i in 0..3 {
        w.i32(i).i32(i);
    }
    w.i32(0);
    w.i32(0).f32(0.5).f32(0.5).f32(0.5).f32(0.0).f32(0.0).f32(0.0);
    w.0
}

/// A revision 8 shape file with one node, one object and no sequences.
pub fn minimal_dts() -> Vec<u8> {
    let mut w = Writer::default();
    // nodes, sequences, subsequences, keyframes, transforms, names, objects,
    // details, meshes, transitions, triggers
    for count in [1, 0, 0, 0, 1, 2, 1, 1, 1, 0, 0] {
        w.u32(count);
    }
    w.f32(1.5).f32(0.0).f32(0.0).f32(0.0);
    w.f32(-1.0).f32(-1.0).f32(-1.0).f32(1.0).f32(1.0).f32(1.0);

    // name, parent, subsequence count, first subsequence, default transform
    w.i16(0).i16(-1).i16(0).i16(0).i16(0);
    w.i16(0).i16(0).i16(0).i16(32767).f32(0.0).f32(0.0).f32(0.0);
    w.fixed_str("root", 24).fixed_str("body", 24);

    w.i16(1).u16(0).i32(0).i16(0).i16(0);
    w.f32(0.0).f32(0.0).f32(0.0).i16(0).i16(0);

    w.i32(0).f32(10.0);
    // default material set, always node
    w.i32(0).i32(-1);

    w.bytes(&persist("TS::CelAnimMesh", 3, &triangle_mesh_body()));
    w.u32(0);
    persist("TS::Shape", 8, &w.0)
}

/// A small Microsoft RIFF palette.
pub fn riff_palette() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&0x300u16.to_le_bytes());
    data.extend_from_slice(&4u16.to_le_bytes());
    for color in [[0u8, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 255]] {
        data.extend_from_slice(&[color[0], color[1], color[2], 0]);
    }
    let mut form = b"PAL ".to_vec();
    chunk(&mut form, b"data", &data);
    let mut out = Vec::new();
    chunk(&mut out, b"RIFF", &form);
    out
}
