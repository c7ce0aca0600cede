//! On-disk shape records, widened to one in-memory form per table
//!
//! Each reader consumes exactly one record of a given layout. The layout
//! registry pairs every reader with its byte size so table lengths can be
//! checked before any record is read.

use glam::{Quat, Vec3};

use crate::binary::ByteCursor;
use crate::error::Result;
use crate::shape::types::Transform;

const QUAT16_SCALE: f32 = 32767.0;

// Keyframe flags, pre-v3 packed word
const PACKED_KEY_MASK: u32 = 0x3FFF_FFFF;
const PACKED_VALID: u32 = 1 << 30;
const PACKED_VISIBLE: u32 = 1 << 31;

// Keyframe flags, v3 to v7 material word
const WIDE_MATERIAL_MASK: u32 = 0x0FFF_FFFF;
const WIDE_VISIBLE: u32 = 1 << 31;
const WIDE_VISIBILITY_MATTERS: u32 = 1 << 30;
const WIDE_MATERIAL_MATTERS: u32 = 1 << 29;
const WIDE_FRAME_MATTERS: u32 = 1 << 28;

// Keyframe flags, v8 material half-word
const COMPACT_FRAME_MATTERS: u16 = 1 << 12;
const COMPACT_MATERIAL_MATTERS: u16 = 1 << 13;
const COMPACT_VISIBILITY_MATTERS: u16 = 1 << 14;
const COMPACT_VISIBLE: u16 = 1 << 15;
const COMPACT_MATERIAL_MASK: u16 = 0x0FFF;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawNode {
    pub name: i32,
    pub parent: i32,
    pub subsequence_count: i32,
    pub first_subsequence: i32,
    pub default_transform: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawSequence {
    pub name: i32,
    pub cyclic: bool,
    pub duration: f32,
    pub priority: i32,
    pub first_trigger: i32,
    pub trigger_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawSubSequence {
    pub sequence: i32,
    pub key_count: i32,
    pub first_key: i32,
}

/// Keyframe with its flags unpacked; `position` is normalized to 0..1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawKeyframe {
    pub position: f32,
    /// Transform index on node tracks, mesh frame on object tracks
    pub key: u32,
    pub material: u32,
    pub frame_matters: bool,
    pub material_matters: bool,
    pub visibility_matters: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawObject {
    pub name: i32,
    pub flags: u16,
    pub mesh: i32,
    pub node: i32,
    pub offset: Vec3,
    pub subsequence_count: i32,
    pub first_subsequence: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawDetail {
    pub root_node: i32,
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawTransition {
    pub from: i32,
    pub to: i32,
    pub from_position: f32,
    pub to_position: f32,
    pub duration: f32,
    pub transform: Transform,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawTrigger {
    pub position: f32,
    pub value: i32,
}

// ============================================================================
// Nodes
// ============================================================================

pub(crate) fn node_wide(c: &mut ByteCursor<'_>) -> Result<RawNode> {
    Ok(RawNode {
        name: c.read_i32()?,
        parent: c.read_i32()?,
        subsequence_count: c.read_i32()?,
        first_subsequence: c.read_i32()?,
        default_transform: c.read_i32()?,
    })
}

pub(crate) fn node_compact(c: &mut ByteCursor<'_>) -> Result<RawNode> {
    Ok(RawNode {
        name: i32::from(c.read_i16()?),
        parent: i32::from(c.read_i16()?),
        subsequence_count: i32::from(c.read_i16()?),
        first_subsequence: i32::from(c.read_i16()?),
        default_transform: i32::from(c.read_i16()?),
    })
}

// ============================================================================
// Sequences
// ============================================================================

pub(crate) fn sequence_basic(c: &mut ByteCursor<'_>) -> Result<RawSequence> {
    Ok(RawSequence {
        name: c.read_i32()?,
        cyclic: c.read_i32()? != 0,
        duration: c.read_f32()?,
        priority: c.read_i32()?,
        first_trigger: 0,
        trigger_count: 0,
    })
}

pub(crate) fn sequence_with_triggers(c: &mut ByteCursor<'_>) -> Result<RawSequence> {
    let basic = sequence_basic(c)?;
    Ok(RawSequence {
        first_trigger: c.read_i32()?,
        trigger_count: c.read_i32()?,
        ..basic
    })
}

/// Image-file-list ranges follow the trigger range; nothing consumes them.
pub(crate) fn sequence_with_ifl(c: &mut ByteCursor<'_>) -> Result<RawSequence> {
    let sequence = sequence_with_triggers(c)?;
    c.skip(8)?;
    Ok(sequence)
}

// ============================================================================
// Subsequences
// ============================================================================

pub(crate) fn subsequence_wide(c: &mut ByteCursor<'_>) -> Result<RawSubSequence> {
    Ok(RawSubSequence {
        sequence: c.read_i32()?,
        key_count: c.read_i32()?,
        first_key: c.read_i32()?,
    })
}

pub(crate) fn subsequence_compact(c: &mut ByteCursor<'_>) -> Result<RawSubSequence> {
    Ok(RawSubSequence {
        sequence: i32::from(c.read_i16()?),
        key_count: i32::from(c.read_i16()?),
        first_key: i32::from(c.read_i16()?),
    })
}

// ============================================================================
// Keyframes
// ============================================================================

/// Position and one packed word: key index, validity and visibility.
///
/// These keys always drive the mesh frame; visibility is only meaningful
/// when the valid bit is clear.
pub(crate) fn keyframe_packed(c: &mut ByteCursor<'_>) -> Result<RawKeyframe> {
    let position = c.read_f32()?;
    let word = c.read_u32()?;
    Ok(RawKeyframe {
        position,
        key: word & PACKED_KEY_MASK,
        material: 0,
        frame_matters: true,
        material_matters: false,
        visibility_matters: word & PACKED_VALID == 0,
        visible: word & PACKED_VISIBLE != 0,
    })
}

pub(crate) fn keyframe_wide(c: &mut ByteCursor<'_>) -> Result<RawKeyframe> {
    let position = c.read_f32()?;
    let key = c.read_u32()?;
    let word = c.read_u32()?;
    Ok(RawKeyframe {
        position,
        key,
        material: word & WIDE_MATERIAL_MASK,
        frame_matters: word & WIDE_FRAME_MATTERS != 0,
        material_matters: word & WIDE_MATERIAL_MATTERS != 0,
        visibility_matters: word & WIDE_VISIBILITY_MATTERS != 0,
        visible: word & WIDE_VISIBLE != 0,
    })
}

pub(crate) fn keyframe_compact(c: &mut ByteCursor<'_>) -> Result<RawKeyframe> {
    let position = c.read_f32()?;
    let key = c.read_u16()?;
    let word = c.read_u16()?;
    Ok(RawKeyframe {
        position,
        key: u32::from(key),
        material: u32::from(word & COMPACT_MATERIAL_MASK),
        frame_matters: word & COMPACT_FRAME_MATTERS != 0,
        material_matters: word & COMPACT_MATERIAL_MATTERS != 0,
        visibility_matters: word & COMPACT_VISIBILITY_MATTERS != 0,
        visible: word & COMPACT_VISIBLE != 0,
    })
}

// ============================================================================
// Transforms
// ============================================================================

/// Convert a stored rotation to a unit quaternion.
///
/// Files hold the inverse rotation; a vector part of zero length is the
/// identity regardless of `w`.
fn stored_rotation(x: f32, y: f32, z: f32, w: f32) -> Quat {
    if x * x + y * y + z * z < 1e-20 {
        return Quat::IDENTITY;
    }
    Quat::from_xyzw(-x, -y, -z, w).normalize()
}

fn quat_float(c: &mut ByteCursor<'_>) -> Result<Quat> {
    let (x, y, z, w) = (c.read_f32()?, c.read_f32()?, c.read_f32()?, c.read_f32()?);
    Ok(stored_rotation(x, y, z, w))
}

fn quat16(c: &mut ByteCursor<'_>) -> Result<Quat> {
    let mut parts = [0.0f32; 4];
    for part in &mut parts {
        *part = f32::from(c.read_i16()?) / QUAT16_SCALE;
    }
    let [x, y, z, w] = parts;
    Ok(stored_rotation(x, y, z, w))
}

/// Float quaternion, translation and an unused scale.
pub(crate) fn transform_float(c: &mut ByteCursor<'_>) -> Result<Transform> {
    let rotation = quat_float(c)?;
    let translation = c.read_vec3()?;
    c.skip(12)?;
    Ok(Transform::from_rotation_translation(rotation, translation))
}

/// 16-bit quaternion, translation and an unused scale.
pub(crate) fn transform_quat16_scaled(c: &mut ByteCursor<'_>) -> Result<Transform> {
    let rotation = quat16(c)?;
    let translation = c.read_vec3()?;
    c.skip(12)?;
    Ok(Transform::from_rotation_translation(rotation, translation))
}

pub(crate) fn transform_quat16(c: &mut ByteCursor<'_>) -> Result<Transform> {
    let rotation = quat16(c)?;
    let translation = c.read_vec3()?;
    Ok(Transform::from_rotation_translation(rotation, translation))
}

// ============================================================================
// Objects
// ============================================================================

/// Wide objects carry a flag word and a rotation matrix that the engine
/// never applies.
pub(crate) fn object_wide(c: &mut ByteCursor<'_>) -> Result<RawObject> {
    let name = i32::from(c.read_i16()?);
    let flags = c.read_u16()?;
    let mesh = c.read_i32()?;
    let node = c.read_i32()?;
    c.skip(4 + 9 * 4)?;
    Ok(RawObject {
        name,
        flags,
        mesh,
        node,
        offset: c.read_vec3()?,
        subsequence_count: c.read_i32()?,
        first_subsequence: c.read_i32()?,
    })
}

pub(crate) fn object_compact(c: &mut ByteCursor<'_>) -> Result<RawObject> {
    let name = i32::from(c.read_i16()?);
    let flags = c.read_u16()?;
    let mesh = c.read_i32()?;
    let node = i32::from(c.read_i16()?);
    c.skip(2)?;
    Ok(RawObject {
        name,
        flags,
        mesh,
        node,
        offset: c.read_vec3()?,
        subsequence_count: i32::from(c.read_i16()?),
        first_subsequence: i32::from(c.read_i16()?),
    })
}

// ============================================================================
// Fixed-layout records
// ============================================================================

pub(crate) fn detail(c: &mut ByteCursor<'_>) -> Result<RawDetail> {
    Ok(RawDetail {
        root_node: c.read_i32()?,
        size: c.read_f32()?,
    })
}

pub(crate) fn trigger(c: &mut ByteCursor<'_>) -> Result<RawTrigger> {
    Ok(RawTrigger {
        position: c.read_f32()?,
        value: c.read_i32()?,
    })
}

fn transition_with(
    c: &mut ByteCursor<'_>,
    read_transform: fn(&mut ByteCursor<'_>) -> Result<Transform>,
) -> Result<RawTransition> {
    Ok(RawTransition {
        from: c.read_i32()?,
        to: c.read_i32()?,
        from_position: c.read_f32()?,
        to_position: c.read_f32()?,
        duration: c.read_f32()?,
        transform: read_transform(c)?,
    })
}

pub(crate) fn transition_float(c: &mut ByteCursor<'_>) -> Result<RawTransition> {
    transition_with(c, transform_float)
}

pub(crate) fn transition_quat16_scaled(c: &mut ByteCursor<'_>) -> Result<RawTransition> {
    transition_with(c, transform_quat16_scaled)
}

pub(crate) fn transition_quat16(c: &mut ByteCursor<'_>) -> Result<RawTransition> {
    transition_with(c, transform_quat16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_keyframe_flags() {
        let mut bytes = 0.5f32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(7 | PACKED_VISIBLE).to_le_bytes());
        let key = keyframe_packed(&mut ByteCursor::new(&bytes)).unwrap();
        assert_eq!(key.key, 7);
        assert!(key.frame_matters);
        assert!(key.visibility_matters);
        assert!(key.visible);
    }

    #[test]
    fn test_compact_keyframe_flags() {
        let mut bytes = 1.0f32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(&(COMPACT_MATERIAL_MATTERS | 5).to_le_bytes());
        let key = keyframe_compact(&mut ByteCursor::new(&bytes)).unwrap();
        assert_eq!((key.key, key.material), (3, 5));
        assert!(key.material_matters);
        assert!(!key.frame_matters);
        assert!(!key.visibility_matters);
    }

    #[test]
    fn test_stored_rotation_is_inverted() {
        let q = Quat::from_rotation_z(0.5);
        let decoded = stored_rotation(q.x, q.y, q.z, q.w);
        assert!(decoded.abs_diff_eq(q.inverse(), 1e-6));
        assert_eq!(stored_rotation(0.0, 0.0, 0.0, 0.0), Quat::IDENTITY);
    }

    #[test]
    fn test_quat16_transform() {
        let mut bytes = Vec::new();
        for v in [0i16, 0, 0, 32767] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for v in [1.0f32, 2.0, 3.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = ByteCursor::new(&bytes);
        let transform = transform_quat16(&mut cursor).unwrap();
        assert!(cursor.is_at_end());
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_object_layouts_consume_their_size() {
        let bytes = vec![0u8; 72];
        let mut cursor = ByteCursor::new(&bytes);
        object_wide(&mut cursor).unwrap();
        assert!(cursor.is_at_end());

        let bytes = vec![0u8; 28];
        let mut cursor = ByteCursor::new(&bytes);
        object_compact(&mut cursor).unwrap();
        assert!(cursor.is_at_end());
    }
}
