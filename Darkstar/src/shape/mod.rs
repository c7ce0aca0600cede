//! DTS shapes: the decoded model and its decoder
//!
//! A [`Shape`] is built once, either by [`ShapeDecoder`] from file bytes or
//! by [`Shape::from_parts`] from hand-assembled tables, and never changes
//! afterwards. Playback state lives in [`crate::anim`].

pub mod decoder;
mod hierarchy;
pub mod material;
pub mod mesh;
mod model;
pub mod track;
pub mod types;

pub use decoder::{SHAPE_CLASS, SUPPORTED_VERSIONS, ShapeDecoder};
pub use material::{Material, MaterialKind, MaterialList, MaterialSource, Shading};
pub use mesh::{Face, FaceCorner, Mesh, MeshFrame, MeshGeometry, PackedVertex, Primitive};
pub use model::{NEAR_PROJECTED_SIZE, Shape, ShapeParts, projected_size};
pub use track::{Bracket, Keyframe, KeyframeTrack};
pub use types::{
    DetailLevel, MeshBinding, Node, NodeKey, Object, ObjectKey, Sequence, Transform, Transition,
    Trigger,
};
