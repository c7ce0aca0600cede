//! Linking pass: resolves the index-based tables into a [`Shape`]
//!
//! Every table is fully read before this runs, so references may point
//! forwards or backwards in the stream.

use std::ops::Range;

use super::RawShape;
use super::records::{RawKeyframe, RawSubSequence};
use crate::error::{Error, Result};
use crate::shape::track::{Keyframe, KeyframeTrack};
use crate::shape::types::{
    DetailLevel, Node, NodeKey, Object, ObjectKey, Sequence, Transform, Transition, Trigger,
};
use crate::shape::{Shape, ShapeParts};

const OBJECT_HIDDEN_BY_DEFAULT: u16 = 0x1;

/// `first..first + count` if it lies inside a table of `len` entries.
///
/// Empty ranges are accepted wherever they start.
fn table_range(first: i32, count: i32, len: usize, what: &str) -> Result<Range<usize>> {
    if count == 0 {
        return Ok(0..0);
    }
    let (Ok(first), Ok(count)) = (usize::try_from(first), usize::try_from(count)) else {
        return Err(Error::corrupt(format!(
            "{what} range {first}+{count} is negative"
        )));
    };
    match first.checked_add(count) {
        Some(end) if end <= len => Ok(first..end),
        _ => Err(Error::corrupt(format!(
            "{what} range {first}+{count} exceeds {len} entries"
        ))),
    }
}

/// Negative indices mean "none".
fn optional_index(index: i32) -> Option<usize> {
    usize::try_from(index).ok()
}

struct Linker<'a> {
    raw: &'a RawShape,
}

impl Linker<'_> {
    fn name(&self, index: i32) -> Result<String> {
        let Some(index) = optional_index(index) else {
            return Ok(String::new());
        };
        self.raw.names.get(index).cloned().ok_or_else(|| {
            Error::corrupt(format!(
                "name {index} referenced but only {} names exist",
                self.raw.names.len()
            ))
        })
    }

    fn transform(&self, index: u32) -> Result<Transform> {
        self.raw
            .transforms
            .get(index as usize)
            .copied()
            .ok_or_else(|| {
                Error::corrupt(format!(
                    "transform {index} referenced but only {} transforms exist",
                    self.raw.transforms.len()
                ))
            })
    }

    fn subsequences(&self, first: i32, count: i32, owner: &str) -> Result<&[RawSubSequence]> {
        let range = table_range(first, count, self.raw.subsequences.len(), owner)?;
        Ok(&self.raw.subsequences[range])
    }

    fn keyframes(&self, sub: &RawSubSequence) -> Result<&[RawKeyframe]> {
        let range = table_range(sub.first_key, sub.key_count, self.raw.keyframes.len(), "keyframe")?;
        Ok(&self.raw.keyframes[range])
    }

    /// Turn normalized key positions into times and order them.
    fn track<T>(
        &self,
        keys: &[RawKeyframe],
        duration: f32,
        mut value: impl FnMut(&RawKeyframe) -> Result<T>,
    ) -> Result<Option<KeyframeTrack<T>>> {
        if keys.is_empty() {
            return Ok(None);
        }
        let mut frames = keys
            .iter()
            .map(|key| -> Result<Keyframe<T>> {
                Ok(Keyframe {
                    time: key.position * duration,
                    value: value(key)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        frames.sort_by(|a, b| a.time.total_cmp(&b.time));
        KeyframeTrack::new(frames).map(Some)
    }

    fn node_key(&self, key: &RawKeyframe) -> Result<NodeKey> {
        Ok(NodeKey {
            transform: self.transform(key.key)?,
            visible: key.visibility_matters.then_some(key.visible),
        })
    }

    fn object_key(key: &RawKeyframe) -> ObjectKey {
        ObjectKey {
            frame: key.frame_matters.then_some(key.key),
            material_frame: key.material_matters.then_some(key.material),
            visible: key.visibility_matters.then_some(key.visible),
        }
    }

    fn nodes(&self) -> Result<Vec<Node>> {
        self.raw
            .nodes
            .iter()
            .map(|node| -> Result<Node> {
                let default_transform = u32::try_from(node.default_transform)
                    .map_err(|_| Error::corrupt("node has a negative default transform"))
                    .and_then(|index| self.transform(index))?;
                Ok(Node {
                    name: self.name(node.name)?,
                    parent: optional_index(node.parent),
                    default_transform,
                })
            })
            .collect()
    }

    fn objects(&self) -> Result<Vec<Object>> {
        self.raw
            .objects
            .iter()
            .map(|object| -> Result<Object> {
                Ok(Object {
                    name: self.name(object.name)?,
                    node: optional_index(object.node),
                    mesh: optional_index(object.mesh),
                    offset: object.offset,
                    hidden_by_default: object.flags & OBJECT_HIDDEN_BY_DEFAULT != 0,
                })
            })
            .collect()
    }

    fn sequences(&self) -> Result<Vec<Sequence>> {
        let node_count = self.raw.nodes.len();
        let object_count = self.raw.objects.len();

        let mut sequences = self
            .raw
            .sequences
            .iter()
            .map(|raw| -> Result<Sequence> {
                let mut sequence = Sequence::new(
                    self.name(raw.name)?,
                    raw.duration,
                    raw.cyclic,
                    node_count,
                    object_count,
                );
                sequence.priority = raw.priority;
                if raw.trigger_count > 0 {
                    let range = table_range(
                        raw.first_trigger,
                        raw.trigger_count,
                        self.raw.triggers.len(),
                        "trigger",
                    )?;
                    sequence.triggers = self.raw.triggers[range]
                        .iter()
                        .map(|trigger| Trigger {
                            time: trigger.position * raw.duration,
                            value: trigger.value,
                        })
                        .collect();
                }
                Ok(sequence)
            })
            .collect::<Result<Vec<_>>>()?;

        // The first subsequence naming a sequence supplies the track
        for (index, node) in self.raw.nodes.iter().enumerate() {
            for sub in self.subsequences(node.first_subsequence, node.subsequence_count, "node subsequence")? {
                let Some(sequence) = optional_index(sub.sequence).and_then(|s| sequences.get_mut(s)) else {
                    continue;
                };
                if sequence.node_tracks[index].is_none() {
                    let duration = sequence.duration;
                    sequence.node_tracks[index] =
                        self.track(self.keyframes(sub)?, duration, |key| self.node_key(key))?;
                }
            }
        }
        for (index, object) in self.raw.objects.iter().enumerate() {
            for sub in self.subsequences(object.first_subsequence, object.subsequence_count, "object subsequence")? {
                let Some(sequence) = optional_index(sub.sequence).and_then(|s| sequences.get_mut(s)) else {
                    continue;
                };
                if sequence.object_tracks[index].is_none() {
                    let duration = sequence.duration;
                    sequence.object_tracks[index] =
                        self.track(self.keyframes(sub)?, duration, |key| Ok(Self::object_key(key)))?;
                }
            }
        }
        Ok(sequences)
    }

    fn transitions(&self) -> Result<Vec<Transition>> {
        self.raw
            .transitions
            .iter()
            .map(|raw| -> Result<Transition> {
                let (Some(from), Some(to)) = (optional_index(raw.from), optional_index(raw.to)) else {
                    return Err(Error::corrupt(format!(
                        "transition links sequences {} -> {}",
                        raw.from, raw.to
                    )));
                };
                Ok(Transition {
                    from,
                    to,
                    from_position: raw.from_position,
                    to_position: raw.to_position,
                    duration: raw.duration,
                    transform: raw.transform,
                })
            })
            .collect()
    }
}

/// Resolve every cross-reference and hand the tables to [`Shape::from_parts`].
pub(crate) fn link(raw: RawShape) -> Result<Shape> {
    let linker = Linker { raw: &raw };
    let nodes = linker.nodes()?;
    let objects = linker.objects()?;
    let sequences = linker.sequences()?;
    let transitions = linker.transitions()?;

    let details = raw
        .details
        .iter()
        .map(|detail| DetailLevel::new(detail.size, optional_index(detail.root_node)))
        .collect();

    // Out-of-range always nodes are ignored rather than rejected
    let always_node = optional_index(raw.always_node).filter(|&node| node < nodes.len());

    let RawShape {
        version,
        radius,
        center,
        bounds,
        meshes,
        materials,
        default_material_set,
        ..
    } = raw;

    Shape::from_parts(ShapeParts {
        version,
        nodes,
        objects,
        meshes,
        materials: materials.unwrap_or_default(),
        details,
        sequences,
        transitions,
        always_node,
        default_material_set: u32::try_from(default_material_set).unwrap_or(0),
        radius,
        center,
        bounds,
    })
}
