//! `TS::Shape` decoding
//!
//! A shape file is one `PERS` block. Its body holds a header of table
//! counts followed by the tables themselves in a fixed order, then the
//! embedded meshes and material list as nested `PERS` blocks. Record
//! layouts vary by revision and come from the layout registry; the tables
//! are read in full before the linking pass resolves cross-references.

mod layout;
mod link;
mod material;
mod mesh;
mod records;

use glam::Vec3;

use self::layout::{NAME_SIZE, ShapeLayout};
use self::material::{MATERIAL_LIST_CLASS, read_material_list};
use self::mesh::{MESH_CLASS, read_cel_anim_mesh};
use self::records::{
    RawDetail, RawKeyframe, RawNode, RawObject, RawSequence, RawSubSequence, RawTransition,
    RawTrigger,
};
use super::Shape;
use super::material::MaterialList;
use super::mesh::Mesh;
use super::types::Transform;
use crate::binary::{BLOCK_HEADER_SIZE, ByteCursor, PersistHeader, read_persist};
use crate::error::{Error, Result};

pub use self::layout::SUPPORTED_VERSIONS;

/// Class name of a shape's persistent object.
pub const SHAPE_CLASS: &str = "TS::Shape";

/// Every table of a shape as stored, before linking.
#[derive(Debug, Default)]
pub(crate) struct RawShape {
    pub version: u32,
    pub radius: f32,
    pub center: Vec3,
    pub bounds: Option<(Vec3, Vec3)>,
    pub nodes: Vec<RawNode>,
    pub sequences: Vec<RawSequence>,
    pub subsequences: Vec<RawSubSequence>,
    pub keyframes: Vec<RawKeyframe>,
    pub transforms: Vec<Transform>,
    pub names: Vec<String>,
    pub objects: Vec<RawObject>,
    pub details: Vec<RawDetail>,
    pub transitions: Vec<RawTransition>,
    pub triggers: Vec<RawTrigger>,
    pub default_material_set: i32,
    pub always_node: i32,
    pub meshes: Vec<Mesh>,
    pub materials: Option<MaterialList>,
}

/// Table counts from the shape header.
struct Counts {
    nodes: u32,
    sequences: u32,
    subsequences: u32,
    keyframes: u32,
    transforms: u32,
    names: u32,
    objects: u32,
    details: u32,
    meshes: u32,
    transitions: u32,
    triggers: u32,
}

/// Decoder for `TS::Shape` files.
pub struct ShapeDecoder;

impl ShapeDecoder {
    /// Decode a complete shape file.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedVersion`] for revisions outside
    /// [`SUPPORTED_VERSIONS`], [`Error::TruncatedData`] when a table or block
    /// runs past the buffer, and [`Error::CorruptData`] for anything that
    /// parses but does not link.
    pub fn decode(bytes: &[u8]) -> Result<Shape> {
        let raw = Self::read_raw(bytes)?;
        link::link(raw)
    }

    /// Read the class and revision of a shape file without decoding it.
    pub fn peek_version(bytes: &[u8]) -> Result<u32> {
        let header = Self::shape_header(&mut ByteCursor::new(bytes))?;
        Ok(header.version)
    }

    fn shape_header<'a>(cursor: &mut ByteCursor<'a>) -> Result<PersistHeader<'a>> {
        let header = read_persist(cursor)?;
        if header.class_name != SHAPE_CLASS {
            return Err(Error::corrupt(format!(
                "expected {SHAPE_CLASS}, found {}",
                header.class_name
            )));
        }
        Ok(header)
    }

    pub(crate) fn read_raw(bytes: &[u8]) -> Result<RawShape> {
        let mut cursor = ByteCursor::new(bytes);
        let header = Self::shape_header(&mut cursor)?;
        let layout = ShapeLayout::for_version(header.version)?;
        let mut body = header.body;
        tracing::debug!("Decoding {SHAPE_CLASS} v{}", header.version);

        let counts = read_counts(&mut body, &layout)?;
        let mut raw = RawShape {
            version: header.version,
            radius: body.read_f32()?,
            center: body.read_vec3()?,
            ..RawShape::default()
        };
        if layout.has_bounds() {
            raw.bounds = Some((body.read_vec3()?, body.read_vec3()?));
        }

        raw.nodes = layout.node.read_table(&mut body, counts.nodes)?;
        raw.sequences = layout.sequence.read_table(&mut body, counts.sequences)?;
        raw.subsequences = layout.subsequence.read_table(&mut body, counts.subsequences)?;
        raw.keyframes = layout.keyframe.read_table(&mut body, counts.keyframes)?;
        raw.transforms = layout.transform.read_table(&mut body, counts.transforms)?;

        body.ensure_u64(u64::from(counts.names) * NAME_SIZE as u64)?;
        raw.names = (0..counts.names)
            .map(|_| body.read_fixed_str(NAME_SIZE))
            .collect::<Result<Vec<_>>>()?;

        raw.objects = layout.object.read_table(&mut body, counts.objects)?;
        raw.details = layout.detail.read_table(&mut body, counts.details)?;
        if let Some(format) = layout.transition {
            raw.transitions = format.read_table(&mut body, counts.transitions)?;
        }
        if let Some(format) = layout.trigger {
            raw.triggers = format.read_table(&mut body, counts.triggers)?;
        }

        raw.default_material_set = if layout.has_default_materials() {
            body.read_i32()?
        } else {
            0
        };
        raw.always_node = if layout.has_always_node() {
            body.read_i32()?
        } else {
            -1
        };

        // Every mesh is at least a block header
        body.ensure_u64(u64::from(counts.meshes) * BLOCK_HEADER_SIZE as u64)?;
        raw.meshes = (0..counts.meshes)
            .map(|_| -> Result<Mesh> {
                let mut mesh = expect_class(read_persist(&mut body)?, MESH_CLASS)?;
                read_cel_anim_mesh(&mut mesh.body, mesh.version)
            })
            .collect::<Result<Vec<_>>>()?;

        if body.read_u32()? != 0 {
            let mut list = expect_class(read_persist(&mut body)?, MATERIAL_LIST_CLASS)?;
            raw.materials = Some(read_material_list(&mut list.body, list.version)?);
        }

        tracing::debug!(
            "Read {} nodes, {} objects, {} details, {} meshes, {} sequences, {} keyframes",
            raw.nodes.len(),
            raw.objects.len(),
            raw.details.len(),
            raw.meshes.len(),
            raw.sequences.len(),
            raw.keyframes.len()
        );
        Ok(raw)
    }
}

fn read_counts(c: &mut ByteCursor<'_>, layout: &ShapeLayout) -> Result<Counts> {
    let mut counts = Counts {
        nodes: c.read_u32()?,
        sequences: c.read_u32()?,
        subsequences: c.read_u32()?,
        keyframes: c.read_u32()?,
        transforms: c.read_u32()?,
        names: c.read_u32()?,
        objects: c.read_u32()?,
        details: c.read_u32()?,
        meshes: c.read_u32()?,
        transitions: 0,
        triggers: 0,
    };
    if layout.has_transitions() {
        counts.transitions = c.read_u32()?;
    }
    if layout.has_triggers() {
        counts.triggers = c.read_u32()?;
    }
    Ok(counts)
}

fn expect_class<'a>(header: PersistHeader<'a>, class: &str) -> Result<PersistHeader<'a>> {
    if header.class_name == class {
        Ok(header)
    } else {
        Err(Error::corrupt(format!(
            "expected {class}, found {}",
            header.class_name
        )))
    }
}
