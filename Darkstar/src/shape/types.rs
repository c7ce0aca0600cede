//! Core shape data types

use glam::{Mat4, Quat, Vec3};

use super::track::KeyframeTrack;

/// Local transform of a node: translation, rotation and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Blend towards `other`: linear for translation and scale, shortest-arc
    /// slerp for rotation.
    pub fn interpolate(&self, other: &Self, t: f32) -> Self {
        let target = if self.rotation.dot(other.rotation) < 0.0 {
            -other.rotation
        } else {
            other.rotation
        };
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(target, t).normalize(),
            scale: self.scale.lerp(other.scale, t),
        }
    }

    /// Component-wise comparison; rotations equal up to sign.
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        let rotation_matches = self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
            || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff);
        rotation_matches
            && self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
    }
}

/// A point in the skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    /// Always a smaller index than the node itself once inside a [`Shape`](super::Shape)
    pub parent: Option<usize>,
    pub default_transform: Transform,
}

/// Renderable attachment of a mesh to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: String,
    pub node: Option<usize>,
    /// `None` when the stored index does not name a mesh; the object then draws nothing
    pub mesh: Option<usize>,
    /// Offset of the mesh from the node origin
    pub offset: Vec3,
    pub hidden_by_default: bool,
}

/// An (object, mesh) pair drawn at a detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBinding {
    pub object: usize,
    pub mesh: Option<usize>,
}

/// One level-of-detail tier.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailLevel {
    /// Smallest projected size, in pixels, at which this level is used
    pub size: f32,
    /// Objects attached under this node make up the level
    pub root_node: Option<usize>,
    pub bindings: Vec<MeshBinding>,
}

impl DetailLevel {
    /// A level whose bindings are derived when the shape is assembled.
    pub fn new(size: f32, root_node: Option<usize>) -> Self {
        Self {
            size,
            root_node,
            bindings: Vec::new(),
        }
    }
}

/// Keyframe value on a node track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeKey {
    pub transform: Transform,
    /// `Some` when the key drives node visibility
    pub visible: Option<bool>,
}

impl NodeKey {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            visible: None,
        }
    }
}

/// Keyframe value on an object (cel animation) track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectKey {
    pub frame: Option<u32>,
    pub material_frame: Option<u32>,
    pub visible: Option<bool>,
}

/// Event fired when playback crosses `time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub time: f32,
    pub value: i32,
}

/// A named animation clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub name: String,
    /// Length in seconds
    pub duration: f32,
    pub looping: bool,
    pub priority: i32,
    /// One slot per node; `None` leaves the node at its default transform
    pub node_tracks: Vec<Option<KeyframeTrack<NodeKey>>>,
    /// One slot per object
    pub object_tracks: Vec<Option<KeyframeTrack<ObjectKey>>>,
    /// Root motion, if the clip carries any
    pub ground: Option<KeyframeTrack<Transform>>,
    pub triggers: Vec<Trigger>,
}

impl Sequence {
    /// An empty clip sized for a shape with the given node and object counts.
    pub fn new(name: impl Into<String>, duration: f32, looping: bool, nodes: usize, objects: usize) -> Self {
        Self {
            name: name.into(),
            duration,
            looping,
            priority: 0,
            node_tracks: vec![None; nodes],
            object_tracks: vec![None; objects],
            ground: None,
            triggers: Vec::new(),
        }
    }

    /// Map an arbitrary time into the clip: wrapped when looping, clamped otherwise.
    pub fn normalize_time(&self, time: f32) -> f32 {
        if self.duration <= 0.0 {
            0.0
        } else if self.looping {
            time.rem_euclid(self.duration)
        } else {
            time.clamp(0.0, self.duration)
        }
    }

    pub fn node_track(&self, node: usize) -> Option<&KeyframeTrack<NodeKey>> {
        self.node_tracks.get(node).and_then(Option::as_ref)
    }

    pub fn object_track(&self, object: usize) -> Option<&KeyframeTrack<ObjectKey>> {
        self.object_tracks.get(object).and_then(Option::as_ref)
    }

    /// Triggers with `from < time <= to`, in clip time.
    pub fn triggers_between(&self, from: f32, to: f32) -> impl Iterator<Item = &Trigger> {
        self.triggers
            .iter()
            .filter(move |trigger| trigger.time > from && trigger.time <= to)
    }
}

/// Blend record between two sequences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub from_position: f32,
    pub to_position: f32,
    pub duration: f32,
    pub transform: Transform,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_takes_short_arc() {
        let a = Transform::from_rotation_translation(Quat::from_rotation_z(0.1), Vec3::ZERO);
        // Same orientation as 0.3 rad, but expressed with the opposite sign
        let b = Transform::from_rotation_translation(-Quat::from_rotation_z(0.3), Vec3::X * 2.0);
        let mid = a.interpolate(&b, 0.5);
        let expected = Quat::from_rotation_z(0.2);
        assert!(mid.rotation.abs_diff_eq(expected, 1e-5) || mid.rotation.abs_diff_eq(-expected, 1e-5));
        assert!(mid.translation.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_normalize_time() {
        let mut seq = Sequence::new("run", 2.0, true, 0, 0);
        assert!((seq.normalize_time(5.0) - 1.0).abs() < 1e-6);
        assert!((seq.normalize_time(-0.5) - 1.5).abs() < 1e-6);
        seq.looping = false;
        assert_eq!(seq.normalize_time(5.0), 2.0);
        assert_eq!(seq.normalize_time(-1.0), 0.0);
    }

    #[test]
    fn test_triggers_between() {
        let mut seq = Sequence::new("fire", 1.0, false, 0, 0);
        seq.triggers = vec![Trigger { time: 0.25, value: 1 }, Trigger { time: 0.75, value: 2 }];
        let values: Vec<i32> = seq.triggers_between(0.25, 1.0).map(|t| t.value).collect();
        assert_eq!(values, vec![2]);
    }
}
