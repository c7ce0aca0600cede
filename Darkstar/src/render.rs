//! Per-frame draw data handed to a renderer

use glam::{Mat4, Vec3};

use crate::anim::{ObjectState, Pose};
use crate::shape::Shape;

/// One object to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub object: usize,
    pub mesh: usize,
    /// Vertex frame, already clamped to the mesh
    pub frame: usize,
    /// Texture coordinate set, already clamped to the mesh
    pub material_frame: usize,
    /// Model-space transform: the node's world transform then the object offset
    pub transform: Mat4,
}

/// Visible, mesh-bearing objects of `detail` plus the always-drawn objects.
///
/// `states` is indexed by object, as returned by
/// [`PoseEvaluator::object_states`](crate::anim::PoseEvaluator::object_states).
pub fn build_draw_list(shape: &Shape, detail: usize, pose: &Pose, states: &[ObjectState]) -> Vec<DrawItem> {
    shape
        .draw_bindings(detail)
        .filter_map(|binding| {
            let state = states.get(binding.object)?;
            if !state.visible {
                return None;
            }
            let mesh_index = binding.mesh?;
            let mesh = shape.mesh(mesh_index)?;
            let object = shape.objects().get(binding.object)?;

            let node_world = object
                .node
                .and_then(|node| pose.world.get(node).copied())
                .unwrap_or(Mat4::IDENTITY);
            let offset = if object.offset == Vec3::ZERO {
                Mat4::IDENTITY
            } else {
                Mat4::from_translation(object.offset)
            };

            Some(DrawItem {
                object: binding.object,
                mesh: mesh_index,
                frame: state.frame.min(mesh.frame_count().saturating_sub(1)),
                material_frame: state.material_frame.min(mesh.texture_frame_count() - 1),
                transform: node_world * offset,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::PoseEvaluator;
    use crate::test_support::{two_node_parts, two_node_shape};

    #[test]
    fn test_draw_list_follows_pose() {
        let shape = two_node_shape(false);
        let pose = PoseEvaluator::evaluate(&shape, 0, 0.5).unwrap();
        let states = PoseEvaluator::object_states(&shape, Some(0), 0.5, &pose);
        let items = build_draw_list(&shape, 0, &pose, &states);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].mesh, 0);
        assert!(items[0].transform.w_axis.truncate().abs_diff_eq(Vec3::X * 5.0, 1e-5));
    }

    #[test]
    fn test_frames_clamped_and_hidden_skipped() {
        let shape = two_node_shape(false);
        let pose = PoseEvaluator::default_pose(&shape).unwrap();
        let mut states = vec![ObjectState {
            visible: true,
            frame: 9,
            material_frame: 4,
        }];
        let items = build_draw_list(&shape, 0, &pose, &states);
        assert_eq!((items[0].frame, items[0].material_frame), (0, 0));

        states[0].visible = false;
        assert!(build_draw_list(&shape, 0, &pose, &states).is_empty());
    }

    #[test]
    fn test_object_offset_applied_after_node() {
        let mut parts = two_node_parts(false);
        parts.objects[0].offset = Vec3::Z;
        let shape = Shape::from_parts(parts).unwrap();
        let pose = PoseEvaluator::evaluate(&shape, 0, 1.0).unwrap();
        let states = PoseEvaluator::object_states(&shape, Some(0), 1.0, &pose);
        let items = build_draw_list(&shape, 1, &pose, &states);
        assert!(items[0].transform.w_axis.truncate().abs_diff_eq(Vec3::new(10.0, 0.0, 1.0), 1e-5));
    }
}
