//! The assembled, immutable shape

use glam::Vec3;

use super::hierarchy::{in_subtree, parent_first_order};
use super::material::MaterialList;
use super::mesh::Mesh;
use super::types::{DetailLevel, MeshBinding, Node, Object, Sequence, Transition};
use crate::error::{Error, Result};

/// Projected size reported for a camera at or behind the shape's center.
pub const NEAR_PROJECTED_SIZE: f32 = 1000.0;

/// Loose tables a [`Shape`] is assembled from.
///
/// Indices may reference any entry of the sibling tables; nodes need not be
/// stored parent-first. [`Shape::from_parts`] validates and links them.
#[derive(Debug, Clone, Default)]
pub struct ShapeParts {
    pub version: u32,
    pub nodes: Vec<Node>,
    pub objects: Vec<Object>,
    pub meshes: Vec<Mesh>,
    pub materials: MaterialList,
    pub details: Vec<DetailLevel>,
    pub sequences: Vec<Sequence>,
    pub transitions: Vec<Transition>,
    pub always_node: Option<usize>,
    pub default_material_set: u32,
    pub radius: f32,
    pub center: Vec3,
    /// Axis-aligned bounds; derived from center and radius when absent
    pub bounds: Option<(Vec3, Vec3)>,
}

/// A decoded model. Immutable once built and safe to share across threads.
#[derive(Debug, Clone)]
pub struct Shape {
    version: u32,
    nodes: Vec<Node>,
    objects: Vec<Object>,
    meshes: Vec<Mesh>,
    materials: MaterialList,
    details: Vec<DetailLevel>,
    sequences: Vec<Sequence>,
    transitions: Vec<Transition>,
    always_node: Option<usize>,
    always_bindings: Vec<MeshBinding>,
    default_material_set: u32,
    radius: f32,
    center: Vec3,
    bounds: (Vec3, Vec3),
}

impl Shape {
    /// Validate and link loose tables into a shape.
    ///
    /// Nodes are reordered parent-first when needed and every node index is
    /// remapped to match. Object meshes that do not exist become `None`.
    /// Detail levels are sorted from highest to lowest fidelity and their
    /// object bindings derived from each level's root node.
    ///
    /// # Errors
    /// Returns [`Error::CorruptData`] for dangling indices, cyclic
    /// hierarchies, invalid meshes or mismatched track tables.
    pub fn from_parts(parts: ShapeParts) -> Result<Self> {
        let ShapeParts {
            version,
            mut nodes,
            mut objects,
            meshes,
            materials,
            mut details,
            mut sequences,
            transitions,
            mut always_node,
            default_material_set,
            radius,
            center,
            bounds,
        } = parts;

        let node_count = nodes.len();
        let check_node = |index: usize, what: &str| -> Result<()> {
            if index < node_count {
                Ok(())
            } else {
                Err(Error::corrupt(format!(
                    "{what} references node {index} of {node_count}"
                )))
            }
        };

        for (i, object) in objects.iter().enumerate() {
            if let Some(node) = object.node {
                check_node(node, &format!("object {i}"))?;
            }
        }
        for (i, detail) in details.iter().enumerate() {
            if let Some(root) = detail.root_node {
                check_node(root, &format!("detail level {i}"))?;
            }
            if detail.size.is_nan() {
                return Err(Error::corrupt(format!("detail level {i} has no size")));
            }
        }
        if let Some(node) = always_node {
            check_node(node, "always node")?;
        }
        for sequence in &sequences {
            if sequence.node_tracks.len() != node_count || sequence.object_tracks.len() != objects.len() {
                return Err(Error::corrupt(format!(
                    "sequence {} has {} node and {} object tracks for {} nodes and {} objects",
                    sequence.name,
                    sequence.node_tracks.len(),
                    sequence.object_tracks.len(),
                    node_count,
                    objects.len()
                )));
            }
            if !sequence.duration.is_finite() || sequence.duration < 0.0 {
                return Err(Error::corrupt(format!(
                    "sequence {} has invalid duration {}",
                    sequence.name, sequence.duration
                )));
            }
        }
        for (i, transition) in transitions.iter().enumerate() {
            if transition.from >= sequences.len() || transition.to >= sequences.len() {
                return Err(Error::corrupt(format!(
                    "transition {i} links sequences {} -> {} of {}",
                    transition.from,
                    transition.to,
                    sequences.len()
                )));
            }
        }

        let parents: Vec<Option<usize>> = nodes.iter().map(|node| node.parent).collect();
        if let Some(order) = parent_first_order(&parents)? {
            tracing::debug!("Reordering {} nodes parent-first", order.len());
            let mut new_index = vec![0usize; node_count];
            for (new, &old) in order.iter().enumerate() {
                new_index[old] = new;
            }
            let remap = |index: Option<usize>| index.map(|old| new_index[old]);

            let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
            nodes = order
                .iter()
                .filter_map(|&old| slots[old].take())
                .map(|node| Node {
                    parent: remap(node.parent),
                    ..node
                })
                .collect();
            for object in &mut objects {
                object.node = remap(object.node);
            }
            for detail in &mut details {
                detail.root_node = remap(detail.root_node);
            }
            always_node = remap(always_node);
            for sequence in &mut sequences {
                let mut tracks: Vec<_> = std::mem::take(&mut sequence.node_tracks)
                    .into_iter()
                    .map(Some)
                    .collect();
                sequence.node_tracks = order
                    .iter()
                    .map(|&old| tracks[old].take().flatten())
                    .collect();
            }
        }

        for (i, object) in objects.iter_mut().enumerate() {
            if object.mesh.is_some_and(|mesh| mesh >= meshes.len()) {
                tracing::debug!(
                    "Object {i} ({}) references missing mesh {:?}",
                    object.name,
                    object.mesh
                );
                object.mesh = None;
            }
        }
        for mesh in &meshes {
            mesh.validate()?;
        }

        let parents: Vec<Option<usize>> = nodes.iter().map(|node| node.parent).collect();
        let bindings_under = |root: Option<usize>| -> Vec<MeshBinding> {
            objects
                .iter()
                .enumerate()
                .filter(|(_, object)| match (root, object.node) {
                    (Some(root), Some(node)) => in_subtree(&parents, root, node),
                    // A detail without a root node draws nothing
                    _ => false,
                })
                .map(|(object, o)| MeshBinding {
                    object,
                    mesh: o.mesh,
                })
                .collect()
        };

        for detail in &mut details {
            if detail.bindings.is_empty() {
                detail.bindings = bindings_under(detail.root_node);
            }
        }
        // Highest fidelity (largest threshold) first; ties keep stored order
        details.sort_by(|a, b| b.size.total_cmp(&a.size));

        let always_bindings = always_node
            .map(|node| bindings_under(Some(node)))
            .unwrap_or_default();

        let bounds = bounds.unwrap_or((center - Vec3::splat(radius), center + Vec3::splat(radius)));

        Ok(Self {
            version,
            nodes,
            objects,
            meshes,
            materials,
            details,
            sequences,
            transitions,
            always_node,
            always_bindings,
            default_material_set,
            radius,
            center,
            bounds,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Case-insensitive node lookup.
    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.name.eq_ignore_ascii_case(name))
    }

    /// Direct children of `node`, in index order.
    pub fn children(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.parent == Some(node))
            .map(|(i, _)| i)
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, index: usize) -> Option<&Mesh> {
        self.meshes.get(index)
    }

    pub fn materials(&self) -> &MaterialList {
        &self.materials
    }

    /// Detail levels, highest fidelity first.
    pub fn detail_levels(&self) -> &[DetailLevel] {
        &self.details
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn sequence(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    /// Index of the sequence called `name`, ignoring ASCII case.
    ///
    /// # Errors
    /// Returns [`Error::SequenceNotFound`] if no sequence matches.
    pub fn sequence_index(&self, name: &str) -> Result<usize> {
        self.sequences
            .iter()
            .position(|seq| seq.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::SequenceNotFound {
                name: name.to_string(),
            })
    }

    /// # Errors
    /// Returns [`Error::SequenceNotFound`] if no sequence matches.
    pub fn find_sequence(&self, name: &str) -> Result<&Sequence> {
        self.sequence_index(name).map(|index| &self.sequences[index])
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn always_node(&self) -> Option<usize> {
        self.always_node
    }

    /// Objects drawn at every detail level.
    pub fn always_bindings(&self) -> &[MeshBinding] {
        &self.always_bindings
    }

    pub fn default_material_set(&self) -> u32 {
        self.default_material_set
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.bounds
    }

    /// Pick the detail level for an on-screen size in pixels.
    ///
    /// The first level whose threshold does not exceed `screen_size` wins;
    /// anything smaller than every threshold gets the lowest level.
    ///
    /// # Errors
    /// Returns [`Error::NoGeometry`] when the shape has no detail levels.
    pub fn select_detail_level(&self, screen_size: f32) -> Result<usize> {
        if self.details.is_empty() {
            return Err(Error::NoGeometry);
        }
        Ok(self
            .details
            .iter()
            .position(|detail| detail.size <= screen_size)
            .unwrap_or(self.details.len() - 1))
    }

    /// Bindings drawn at `detail`, including the always-drawn objects.
    pub fn draw_bindings(&self, detail: usize) -> impl Iterator<Item = &MeshBinding> {
        self.details
            .get(detail)
            .map(|level| level.bindings.as_slice())
            .unwrap_or_default()
            .iter()
            .chain(self.always_bindings.iter())
    }
}

/// Approximate on-screen size in pixels of a sphere of `radius` seen from
/// `distance`, for a viewport of `width` by `height` pixels.
pub fn projected_size(radius: f32, distance: f32, width: u32, height: u32) -> f32 {
    if distance <= 0.0 {
        return NEAR_PROJECTED_SIZE;
    }
    let extent = width.max(height) as f32;
    (radius / distance).atan() * extent / std::f32::consts::FRAC_PI_2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::types::Transform;

    fn node(name: &str, parent: Option<usize>) -> Node {
        Node {
            name: name.into(),
            parent,
            default_transform: Transform::IDENTITY,
        }
    }

    fn object(name: &str, node: usize, mesh: Option<usize>) -> Object {
        Object {
            name: name.into(),
            node: Some(node),
            mesh,
            offset: Vec3::ZERO,
            hidden_by_default: false,
        }
    }

    #[test]
    fn test_forward_parents_are_reordered() {
        let sequence = Sequence::new("idle", 1.0, true, 3, 1);
        let parts = ShapeParts {
            nodes: vec![node("leaf", Some(1)), node("mid", Some(2)), node("root", None)],
            objects: vec![object("body", 0, Some(4))],
            details: vec![DetailLevel::new(10.0, Some(2))],
            sequences: vec![sequence],
            ..ShapeParts::default()
        };
        let shape = Shape::from_parts(parts).unwrap();

        let names: Vec<&str> = shape.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["root", "mid", "leaf"]);
        for (i, node) in shape.nodes().iter().enumerate() {
            assert!(node.parent.is_none_or(|p| p < i));
        }
        assert_eq!(shape.objects()[0].node, Some(2));
        // Mesh 4 does not exist
        assert_eq!(shape.objects()[0].mesh, None);
        assert_eq!(shape.detail_levels()[0].root_node, Some(0));
        assert_eq!(shape.detail_levels()[0].bindings.len(), 1);
    }

    #[test]
    fn test_details_bind_their_subtrees() {
        let parts = ShapeParts {
            nodes: vec![
                node("root", None),
                node("hi", Some(0)),
                node("lo", Some(0)),
                node("always", None),
            ],
            objects: vec![object("hi", 1, None), object("lo", 2, None), object("shadow", 3, None)],
            details: vec![DetailLevel::new(20.0, Some(2)), DetailLevel::new(80.0, Some(1))],
            always_node: Some(3),
            ..ShapeParts::default()
        };
        let shape = Shape::from_parts(parts).unwrap();

        // Sorted by descending size
        assert_eq!(shape.detail_levels()[0].size, 80.0);
        assert_eq!(shape.detail_levels()[0].bindings[0].object, 0);
        assert_eq!(shape.detail_levels()[1].bindings[0].object, 1);
        let drawn: Vec<usize> = shape.draw_bindings(1).map(|b| b.object).collect();
        assert_eq!(drawn, vec![1, 2]);
    }

    #[test]
    fn test_rootless_detail_draws_nothing() {
        let parts = ShapeParts {
            nodes: vec![node("root", None), node("hi", Some(0)), node("lo", Some(0))],
            objects: vec![object("hi", 1, None), object("lo", 2, None)],
            details: vec![DetailLevel::new(80.0, Some(1)), DetailLevel::new(20.0, None)],
            ..ShapeParts::default()
        };
        let shape = Shape::from_parts(parts).unwrap();
        assert_eq!(shape.draw_bindings(0).count(), 1);
        assert_eq!(shape.draw_bindings(1).count(), 0);
        assert!(shape.detail_levels()[1].bindings.is_empty());
    }

    #[test]
    fn test_select_detail_level() {
        let parts = ShapeParts {
            nodes: vec![node("root", None)],
            details: vec![
                DetailLevel::new(100.0, None),
                DetailLevel::new(50.0, None),
                DetailLevel::new(10.0, None),
            ],
            ..ShapeParts::default()
        };
        let shape = Shape::from_parts(parts).unwrap();
        assert_eq!(shape.select_detail_level(500.0).unwrap(), 0);
        assert_eq!(shape.select_detail_level(50.0).unwrap(), 1);
        assert_eq!(shape.select_detail_level(20.0).unwrap(), 2);
        assert_eq!(shape.select_detail_level(1.0).unwrap(), 2);
    }

    #[test]
    fn test_no_details_is_no_geometry() {
        let shape = Shape::from_parts(ShapeParts::default()).unwrap();
        assert!(matches!(shape.select_detail_level(10.0), Err(Error::NoGeometry)));
    }

    #[test]
    fn test_dangling_indices_rejected() {
        let parts = ShapeParts {
            nodes: vec![node("root", None)],
            objects: vec![object("body", 3, None)],
            ..ShapeParts::default()
        };
        assert!(matches!(Shape::from_parts(parts), Err(Error::CorruptData { .. })));

        let parts = ShapeParts {
            nodes: vec![node("root", None)],
            sequences: vec![Sequence::new("bad", 1.0, false, 2, 0)],
            ..ShapeParts::default()
        };
        assert!(Shape::from_parts(parts).is_err());
    }

    #[test]
    fn test_sequence_lookup() {
        let parts = ShapeParts {
            nodes: vec![node("root", None)],
            sequences: vec![Sequence::new("Run", 1.0, true, 1, 0)],
            ..ShapeParts::default()
        };
        let shape = Shape::from_parts(parts).unwrap();
        assert_eq!(shape.sequence_index("run").unwrap(), 0);
        assert!(matches!(shape.find_sequence("walk"), Err(Error::SequenceNotFound { .. })));
    }

    #[test]
    fn test_projected_size() {
        assert_eq!(projected_size(1.0, 0.0, 640, 480), NEAR_PROJECTED_SIZE);
        let size = projected_size(1.0, 1.0, 640, 480);
        // atan(1) = pi/4, half the viewport
        assert!((size - 320.0).abs() < 1e-3);
    }
}
