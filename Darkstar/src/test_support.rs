//! Byte-level fixture writers shared by unit tests

use glam::{Vec2, Vec3};

use crate::shape::{
    DetailLevel, Face, FaceCorner, Keyframe, KeyframeTrack, Material, MaterialList, Mesh,
    MeshFrame, Node, NodeKey, Object, PackedVertex, Sequence, Shape, ShapeParts, Transform,
};

/// Minimal PVOL writer for tests: (name, payload, compression code)
pub fn build_volume(files: &[(&str, &[u8], u8)]) -> Vec<u8> {
    let mut out = vec![0u8; 8];
    let mut records = Vec::new();
    let mut strings = Vec::new();

    for (i, (name, payload, code)) in files.iter().enumerate() {
        let offset = out.len() as i32;
        out.extend_from_slice(b"VBLK");
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if out.len() % 2 == 1 {
            out.push(0);
        }
        let name_offset = strings.len() as i32;
        strings.extend_from_slice(name.as_bytes());
        strings.push(0);

        records.extend_from_slice(&(i as u32).to_le_bytes());
        records.extend_from_slice(&name_offset.to_le_bytes());
        records.extend_from_slice(&offset.to_le_bytes());
        records.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        records.push(*code);
    }

    let strings_offset = out.len() as u32;
    out[0..4].copy_from_slice(b"PVOL");
    out[4..8].copy_from_slice(&strings_offset.to_le_bytes());

    out.extend_from_slice(b"vols");
    out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    out.extend_from_slice(&strings);
    if strings.len() % 2 == 1 {
        out.push(0);
    }
    out.extend_from_slice(b"voli");
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    out.extend_from_slice(&records);
    out
}


fn chunk(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

fn packed(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    [r, g, b, a]
}

/// `PPAL` with color `i` = (i, 2i, 3i, 255) and a shade shift of 4
pub fn build_ppal(version: u8, with_info: bool) -> Vec<u8> {
    let mut body = Vec::new();
    chunk(&mut body, b"head", &[version, 0, 0, 4]);
    if with_info {
        chunk(&mut body, b"info", b"made by hand");
    }
    let mut colors = Vec::new();
    for i in 0..=255u8 {
        colors.extend_from_slice(&packed(i, i.wrapping_mul(2), i.wrapping_mul(3), 255));
    }
    chunk(&mut body, b"data", &colors);

    let mut out = Vec::new();
    chunk(&mut out, b"PPAL", &body);
    out
}

/// `PL98` with one table per (index, red fill) pair
pub fn build_pl98(tables: &[(i32, u8)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"PL98");
    out.extend_from_slice(&(tables.len() as u32).to_le_bytes());
    out.extend_from_slice(&3i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&[0u8; 32]);
    for (kind, (index, fill)) in tables.iter().enumerate() {
        for _ in 0..256 {
            out.extend_from_slice(&packed(*fill, 0, 0, 255));
        }
        out.extend_from_slice(&index.to_le_bytes());
        out.extend_from_slice(&(kind as u32 * 2).to_le_bytes());
    }
    out
}

/// Microsoft RIFF palette with the given entries
pub fn build_riff_palette(colors: &[[u8; 3]]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&0x300u16.to_le_bytes());
    data.extend_from_slice(&(colors.len() as u16).to_le_bytes());
    for [r, g, b] in colors {
        data.extend_from_slice(&[*r, *g, *b, 0]);
    }
    let mut form = b"PAL ".to_vec();
    chunk(&mut form, b"data", &data);
    let mut out = Vec::new();
    chunk(&mut out, b"RIFF", &form);
    out
}

/// `PBMP` with unpadded 8-bit `pixels` (top row first)
pub fn build_pbmp(width: u32, height: u32, flags: u32, pixels: &[u8], palette_index: Option<i32>) -> Vec<u8> {
    let stride = 4 * ((width as usize * 8).div_ceil(32));
    let mut data = Vec::new();
    for row in pixels.chunks(width as usize) {
        data.extend_from_slice(row);
        data.resize(data.len() + stride - row.len(), 0);
    }

    let chunk_count = 1 + u32::from(palette_index.is_some());
    let mut head = Vec::new();
    for value in [chunk_count, width, height, 8, flags] {
        head.extend_from_slice(&value.to_le_bytes());
    }

    let mut body = Vec::new();
    chunk(&mut body, b"head", &head);
    if let Some(index) = palette_index {
        chunk(&mut body, b"piDX", &index.to_le_bytes());
    }
    chunk(&mut body, b"data", &data);

    let mut out = Vec::new();
    chunk(&mut out, b"PBMP", &body);
    out
}

/// 8-bit `BM` file; `pixels` are unpadded rows in file order (bottom row
/// first). Color table entry `i` is pure red of intensity `i`.
pub fn build_bmp8(width: u32, height: u32, pixels: &[u8], palette_index: Option<u16>) -> Vec<u8> {
    let stride = 4 * ((width as usize * 8).div_ceil(32));
    let mut rows = Vec::new();
    for row in pixels.chunks(width as usize) {
        rows.extend_from_slice(row);
        rows.resize(rows.len() + stride - row.len(), 0);
    }

    let pixel_offset = 14 + 40 + 256 * 4;
    let mut out = Vec::new();
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&((pixel_offset + rows.len()) as u32).to_le_bytes());
    match palette_index {
        Some(index) => {
            out.extend_from_slice(&0xf5f7u16.to_le_bytes());
            out.extend_from_slice(&index.to_le_bytes());
        }
        None => out.extend_from_slice(&[0; 4]),
    }
    out.extend_from_slice(&(pixel_offset as u32).to_le_bytes());

    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(&[0; 4 * 4]);
    out.extend_from_slice(&256u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    for i in 0..=255u8 {
        out.extend_from_slice(&[0, 0, i, 0]);
    }
    out.extend_from_slice(&rows);
    out
}

// ============================================================================
// Shapes
// ============================================================================

/// Little-endian byte sink for fixture records.
#[derive(Default)]
pub struct Writer(pub Vec<u8>);

impl Writer {
    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn vec3(&mut self, v: Vec3) -> &mut Self {
        self.f32(v.x).f32(v.y).f32(v.z)
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.0.extend_from_slice(v);
        self
    }

    pub fn fixed_str(&mut self, s: &str, width: usize) -> &mut Self {
        let mut field = s.as_bytes().to_vec();
        field.resize(width, 0);
        self.bytes(&field)
    }
}

/// Wrap `body` in a `PERS` block for `class`.
pub fn persist(class: &str, version: u32, body: &[u8]) -> Vec<u8> {
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

/// A one-frame mesh of `frames` identical frames over three vertices.
pub struct MeshSpec {
    pub scale: Vec3,
    pub origin: Vec3,
    pub frames: u32,
}

impl MeshSpec {
    pub fn triangle() -> Self {
        Self {
            scale: Vec3::splat(0.5),
            origin: Vec3::new(0.0, 0.0, -1.0),
            frames: 1,
        }
    }
}

pub fn write_mesh_body(spec: &MeshSpec, version: u32) -> Vec<u8> {
    let mut w = Writer::default();
    w.i32(3).i32(3).i32(3).i32(1).i32(spec.frames as i32);
    if version >= 2 {
        w.i32(3);
    }
    if version < 3 {
        w.vec3(spec.scale).vec3(spec.origin);
    }
    w.f32(1.5);
    w.bytes(&[0, 0, 0, 0, 2, 0, 0, 0, 0, 2, 0, 0]);
    for (u, v) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
        w.f32(u).f32(v);
    }
    for i in 0..3 {
        w.i32(i).i32(i);
    }
    w.i32(0);
    for _ in 0..spec.frames {
        w.i32(0);
        if version >= 3 {
            w.vec3(spec.scale).vec3(spec.origin);
        }
    }
    w.0
}

pub struct MaterialSpec {
    pub flags: u32,
    pub rgb: [u8; 3],
    pub bitmap: &'static str,
}

impl MaterialSpec {
    pub fn texture(bitmap: &'static str) -> Self {
        Self { flags: 3, rgb: [0; 3], bitmap }
    }

    pub fn rgb(rgb: [u8; 3]) -> Self {
        Self { flags: 2, rgb, bitmap: "" }
    }
}

/// One material set; the default-properties flag is stored as 0.
pub fn write_material_list_body(specs: &[MaterialSpec], version: u32) -> Vec<u8> {
    let mut w = Writer::default();
    w.u32(1).u32(specs.len() as u32);
    for spec in specs {
        w.u32(spec.flags).f32(1.0).u32(0).bytes(&spec.rgb).bytes(&[0]);
        w.fixed_str(spec.bitmap, if version < 2 { 16 } else { 32 });
        if version == 1 || version > 2 {
            w.u32(0).f32(0.5).f32(0.5);
        }
        if version != 2 && version != 3 {
            w.u32(0);
        }
    }
    w.0
}

/// A root node with a looping "walk" track and a child carrying one
/// object; the root moves from the origin to +10 X over the sequence.
pub struct ShapeFixture {
    pub object_mesh: i32,
    pub duration: f32,
    pub cyclic: bool,
    /// Normalized positions of the root's two keys
    pub key_positions: [f32; 2],
    pub detail_size: f32,
}

impl ShapeFixture {
    pub fn two_nodes() -> Self {
        Self {
            object_mesh: 0,
            duration: 1.0,
            cyclic: true,
            key_positions: [0.0, 1.0],
            detail_size: 50.0,
        }
    }
}

fn write_transform(w: &mut Writer, translation: Vec3, version: u32) {
    if version < 7 {
        w.f32(0.0).f32(0.0).f32(0.0).f32(1.0);
    } else {
        w.i16(0).i16(0).i16(0).i16(32767);
    }
    w.vec3(translation);
    if version < 8 {
        w.vec3(Vec3::ONE);
    }
}

pub fn write_shape(fixture: &ShapeFixture, version: u32) -> Vec<u8> {
    let compact = version >= 8;
    let mut w = Writer::default();

    // nodes, sequences, subsequences, keyframes, transforms, names, objects, details, meshes
    for count in [2, 1, 1, 2, 2, 4, 1, 1, 1] {
        w.u32(count);
    }
    if version >= 2 {
        w.u32(1);
    }
    if version >= 4 {
        w.u32(1);
    }
    w.f32(2.0).vec3(Vec3::ZERO);
    if compact {
        w.vec3(Vec3::splat(-2.0)).vec3(Vec3::splat(2.0));
    }

    // name, parent, subsequence count, first subsequence, default transform
    for node in [[0, -1, 1, 0, 0], [1, 0, 0, 0, 0]] {
        for field in node {
            if compact {
                w.i16(field as i16);
            } else {
                w.i32(field);
            }
        }
    }

    w.i32(3).i32(i32::from(fixture.cyclic)).f32(fixture.duration).i32(0);
    if version >= 4 {
        w.i32(0).i32(1);
    }
    if version >= 5 {
        w.i32(0).i32(0);
    }

    for field in [0, 2, 0] {
        if compact {
            w.i16(field as i16);
        } else {
            w.i32(field);
        }
    }

    for (key, position) in fixture.key_positions.iter().enumerate() {
        w.f32(*position);
        match version {
            1..=2 => {
                w.u32(key as u32 | 1 << 30);
            }
            3..=7 => {
                w.u32(key as u32).u32(0);
            }
            _ => {
                w.u16(key as u16).u16(0);
            }
        }
    }

    write_transform(&mut w, Vec3::ZERO, version);
    write_transform(&mut w, Vec3::new(10.0, 0.0, 0.0), version);

    for name in ["root", "child", "body", "walk"] {
        w.fixed_str(name, 24);
    }

    if compact {
        w.i16(2).u16(0).i32(fixture.object_mesh).i16(1).i16(0);
        w.vec3(Vec3::ZERO).i16(0).i16(0);
    } else {
        w.i16(2).u16(0).i32(fixture.object_mesh).i32(1).bytes(&[0; 40]);
        w.vec3(Vec3::ZERO).i32(0).i32(0);
    }

    w.i32(0).f32(fixture.detail_size);

    if version >= 2 {
        w.i32(0).i32(0).f32(0.0).f32(1.0).f32(0.25);
        write_transform(&mut w, Vec3::ZERO, version);
    }
    if version >= 4 {
        w.f32(0.5).i32(7);
    }
    if version >= 5 {
        w.i32(0);
    }
    if version >= 6 {
        w.i32(-1);
    }

    w.bytes(&persist("TS::CelAnimMesh", 3, &write_mesh_body(&MeshSpec::triangle(), 3)));
    w.u32(1);
    w.bytes(&persist(
        "TS::MaterialList",
        2,
        &write_material_list_body(&[MaterialSpec::texture("body.bmp")], 2),
    ));

    persist("TS::Shape", version, &w.0)
}

/// Root keyed from the origin at t=0 to +10 X at t=1 in sequence 0
/// ("walk"); the child has no track and one object ("body") with mesh 0.
pub fn two_node_parts(looping: bool) -> ShapeParts {
    let key = |time: f32, x: f32| Keyframe {
        time,
        value: NodeKey::new(Transform::from_translation(Vec3::new(x, 0.0, 0.0))),
    };
    let mut walk = Sequence::new("walk", 1.0, looping, 2, 1);
    walk.node_tracks[0] = KeyframeTrack::new(vec![key(0.0, 0.0), key(1.0, 10.0)]).ok();

    ShapeParts {
        version: 8,
        nodes: vec![
            Node {
                name: "root".into(),
                parent: None,
                default_transform: Transform::IDENTITY,
            },
            Node {
                name: "child".into(),
                parent: Some(0),
                default_transform: Transform::IDENTITY,
            },
        ],
        objects: vec![Object {
            name: "body".into(),
            node: Some(1),
            mesh: Some(0),
            offset: Vec3::ZERO,
            hidden_by_default: false,
        }],
        meshes: vec![triangle_mesh()],
        materials: MaterialList::new(vec![Material::textured("body.bmp")]),
        details: vec![DetailLevel::new(50.0, Some(0)), DetailLevel::new(10.0, Some(0))],
        sequences: vec![walk],
        radius: 2.0,
        ..ShapeParts::default()
    }
}

pub fn two_node_shape(looping: bool) -> Shape {
    Shape::from_parts(two_node_parts(looping)).unwrap()
}

/// One triangle, one frame.
pub fn triangle_mesh() -> Mesh {
    let corner = |i: u32| FaceCorner { vertex: i, tex_coord: i };
    Mesh {
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
    }
}
