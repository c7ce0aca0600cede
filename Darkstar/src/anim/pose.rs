//! Per-node pose evaluation
//!
//! Nodes are stored parent-first, so world transforms come out of a single
//! forward pass over the node list.

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};
use crate::shape::{KeyframeTrack, Sequence, Shape, Transform};

/// Node transforms of a shape at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// Local transform of each node relative to its parent
    pub local: Vec<Transform>,
    /// Accumulated model-space transform of each node
    pub world: Vec<Mat4>,
    /// A node hidden by its track hides its whole subtree
    pub visible: Vec<bool>,
    /// Root motion sampled from the sequence's ground track, if it has one
    pub ground: Option<Transform>,
}

impl Pose {
    pub fn node_count(&self) -> usize {
        self.local.len()
    }

    /// Model-space origin of `node`.
    pub fn world_translation(&self, node: usize) -> Option<Vec3> {
        self.world.get(node).map(|m| m.w_axis.truncate())
    }

    pub fn is_visible(&self, node: usize) -> bool {
        self.visible.get(node).copied().unwrap_or(false)
    }
}

/// Cel-animation state of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectState {
    pub visible: bool,
    /// Mesh vertex frame
    pub frame: usize,
    /// Texture coordinate set
    pub material_frame: usize,
}

/// Samples sequences into [`Pose`]s. Stateless; playback lives in
/// [`ShapeInstance`](super::ShapeInstance).
pub struct PoseEvaluator;

impl PoseEvaluator {
    /// Every node at its default transform.
    ///
    /// # Errors
    /// Returns [`Error::EmptyShape`] when the shape has no nodes.
    pub fn default_pose(shape: &Shape) -> Result<Pose> {
        if shape.nodes().is_empty() {
            return Err(Error::EmptyShape);
        }
        let local = shape.nodes().iter().map(|node| node.default_transform).collect();
        let own = vec![None; shape.nodes().len()];
        Ok(flatten(shape, local, &own, None))
    }

    /// Sample sequence `sequence` at `time` seconds.
    ///
    /// Time is wrapped into the clip for looping sequences and clamped
    /// otherwise. Nodes without a track keep their default transform.
    ///
    /// # Errors
    /// Returns [`Error::EmptyShape`] for a shape without nodes and
    /// [`Error::SequenceNotFound`] for an index past the sequence table.
    pub fn evaluate(shape: &Shape, sequence: usize, time: f32) -> Result<Pose> {
        if shape.nodes().is_empty() {
            return Err(Error::EmptyShape);
        }
        let seq = shape.sequence(sequence).ok_or_else(|| Error::SequenceNotFound {
            name: format!("#{sequence}"),
        })?;
        let time = seq.normalize_time(time);

        let mut local = Vec::with_capacity(shape.nodes().len());
        let mut own = Vec::with_capacity(shape.nodes().len());
        for (index, node) in shape.nodes().iter().enumerate() {
            match seq.node_track(index) {
                Some(track) => {
                    let bracket = track.bracket(time, seq.duration, seq.looping);
                    let keys = track.keys();
                    let (from, to) = (&keys[bracket.from].value, &keys[bracket.to].value);
                    local.push(from.transform.interpolate(&to.transform, bracket.factor));
                    own.push(from.visible);
                }
                None => {
                    local.push(node.default_transform);
                    own.push(None);
                }
            }
        }

        let ground = seq.ground.as_ref().map(|track| sample(track, seq, time));
        Ok(flatten(shape, local, &own, ground))
    }

    /// Look a sequence up by name, then [`evaluate`](Self::evaluate) it.
    pub fn evaluate_named(shape: &Shape, name: &str, time: f32) -> Result<Pose> {
        let index = shape.sequence_index(name)?;
        Self::evaluate(shape, index, time)
    }

    /// Frame, texture frame and visibility of every object.
    ///
    /// For each aspect the latest key at or before `time` that sets it
    /// wins. Objects on hidden nodes are hidden.
    pub fn object_states(
        shape: &Shape,
        sequence: Option<usize>,
        time: f32,
        pose: &Pose,
    ) -> Vec<ObjectState> {
        let seq = sequence.and_then(|index| shape.sequence(index));
        let time = seq.map_or(time, |seq| seq.normalize_time(time));

        shape
            .objects()
            .iter()
            .enumerate()
            .map(|(index, object)| {
                let mut state = ObjectState {
                    visible: !object.hidden_by_default,
                    frame: 0,
                    material_frame: 0,
                };
                if let Some(track) = seq.and_then(|seq| seq.object_track(index)) {
                    let keys = track.keys_until(time);
                    if let Some(frame) = keys.iter().rev().find_map(|key| key.value.frame) {
                        state.frame = frame as usize;
                    }
                    if let Some(frame) = keys.iter().rev().find_map(|key| key.value.material_frame) {
                        state.material_frame = frame as usize;
                    }
                    if let Some(visible) = keys.iter().rev().find_map(|key| key.value.visible) {
                        state.visible = visible;
                    }
                }
                if let Some(node) = object.node {
                    state.visible &= pose.is_visible(node);
                }
                state
            })
            .collect()
    }
}

fn sample(track: &KeyframeTrack<Transform>, seq: &Sequence, time: f32) -> Transform {
    let bracket = track.bracket(time, seq.duration, seq.looping);
    let keys = track.keys();
    keys[bracket.from]
        .value
        .interpolate(&keys[bracket.to].value, bracket.factor)
}

/// Accumulate world transforms and visibility parent-first.
fn flatten(shape: &Shape, local: Vec<Transform>, own: &[Option<bool>], ground: Option<Transform>) -> Pose {
    let ground_matrix = ground.map(|g| g.to_matrix());
    let mut world: Vec<Mat4> = Vec::with_capacity(local.len());
    let mut visible: Vec<bool> = Vec::with_capacity(local.len());

    for (index, node) in shape.nodes().iter().enumerate() {
        let matrix = local[index].to_matrix();
        let own_visible = own[index].unwrap_or(true);
        match node.parent {
            Some(parent) => {
                world.push(world[parent] * matrix);
                visible.push(visible[parent] && own_visible);
            }
            None => {
                world.push(ground_matrix.map_or(matrix, |g| g * matrix));
                visible.push(own_visible);
            }
        }
    }

    Pose {
        local,
        world,
        visible,
        ground,
    }
}
