//! Hierarchical transforms
//!
//! Local-to-parent is `T * R * S`; parent-to-local is its exact algebraic
//! inverse with zero scale components mapping to zero. World transforms compose
//! these along parent links, which the graph builder guarantees to be acyclic.

use crate::foundation::collections::{NodeArena, NodeId, NodeMap};
use crate::foundation::math::{utils::safe_recip, Mat3, Mat4, Vec3};
use crate::scene::entities::Node;
use crate::scene::graph::SceneGraph;

impl Node {
    /// `Translate(position) * Rotate(rotation) * Scale(scale)`
    pub fn local_to_parent(&self) -> Mat4 {
        let r = self.rotation.to_rotation_matrix();
        let r = r.matrix();
        let s = self.scale;
        let p = self.position;

        #[rustfmt::skip]
        let m = Mat4::new(
            r[(0, 0)] * s.x, r[(0, 1)] * s.y, r[(0, 2)] * s.z, p.x,
            r[(1, 0)] * s.x, r[(1, 1)] * s.y, r[(1, 2)] * s.z, p.y,
            r[(2, 0)] * s.x, r[(2, 1)] * s.y, r[(2, 2)] * s.z, p.z,
            0.0,             0.0,             0.0,             1.0,
        );
        m
    }

    /// `Scale(1/scale) * Rotate(rotation)^-1 * Translate(-position)`
    pub fn parent_to_local(&self) -> Mat4 {
        let r = self.rotation.to_rotation_matrix();
        let r = r.matrix();
        let inv = Vec3::new(
            safe_recip(self.scale.x),
            safe_recip(self.scale.y),
            safe_recip(self.scale.z),
        );

        // Rows of R^T pre-scaled by the inverse scale
        #[rustfmt::skip]
        let m3 = Mat3::new(
            inv.x * r[(0, 0)], inv.x * r[(1, 0)], inv.x * r[(2, 0)],
            inv.y * r[(0, 1)], inv.y * r[(1, 1)], inv.y * r[(2, 1)],
            inv.z * r[(0, 2)], inv.z * r[(1, 2)], inv.z * r[(2, 2)],
        );
        let t = m3 * -self.position;

        let mut m = m3.to_homogeneous();
        m[(0, 3)] = t.x;
        m[(1, 3)] = t.y;
        m[(2, 3)] = t.z;
        m
    }
}

/// Compose local-to-parent matrices up the parent chain
pub fn local_to_world(nodes: &NodeArena<Node>, id: NodeId) -> Mat4 {
    let mut matrix = nodes[id].local_to_parent();
    let mut current = nodes[id].parent;
    while let Some(parent) = current {
        matrix = nodes[parent].local_to_parent() * matrix;
        current = nodes[parent].parent;
    }
    matrix
}

/// Compose parent-to-local matrices from the root down to `id`
pub fn world_to_local(nodes: &NodeArena<Node>, id: NodeId) -> Mat4 {
    let mut matrix = nodes[id].parent_to_local();
    let mut current = nodes[id].parent;
    while let Some(parent) = current {
        matrix *= nodes[parent].parent_to_local();
        current = nodes[parent].parent;
    }
    matrix
}

/// Local-to-world of the last node of a root-first path
pub fn path_local_to_world(nodes: &NodeArena<Node>, path: &[NodeId]) -> Mat4 {
    path.iter()
        .fold(Mat4::identity(), |acc, &id| acc * nodes[id].local_to_parent())
}

/// World-to-local of the last node of a root-first path
pub fn path_world_to_local(nodes: &NodeArena<Node>, path: &[NodeId]) -> Mat4 {
    path.iter()
        .fold(Mat4::identity(), |acc, &id| nodes[id].parent_to_local() * acc)
}

/// World matrix of every reachable node, computed in one pass over the
/// traversal order so each parent is ready before its children
pub fn compute_world_transforms(nodes: &NodeArena<Node>, graph: &SceneGraph, cache: &mut NodeMap<Mat4>) {
    cache.clear();
    for &id in &graph.traversal {
        let local = nodes[id].local_to_parent();
        let world = match nodes[id].parent.and_then(|parent| cache.get(parent)) {
            Some(parent_world) => parent_world * local,
            None => local,
        };
        cache.insert(id, world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    fn node(position: Vec3, rotation: Quat, scale: Vec3) -> Node {
        Node {
            position,
            rotation,
            scale,
            ..Node::default()
        }
    }

    /// root -> mid -> leaf with mixed rotations and non-uniform scale
    fn chain() -> (NodeArena<Node>, [NodeId; 3]) {
        let mut nodes = NodeArena::new();
        let root = nodes.push(node(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.5),
            Vec3::new(2.0, 2.0, 2.0),
        ));
        let mid = nodes.push(node(
            Vec3::new(-4.0, 0.5, 0.0),
            Quat::from_axis_angle(&Vec3::x_axis(), -1.2),
            Vec3::new(1.0, 3.0, 0.5),
        ));
        let leaf = nodes.push(node(
            Vec3::new(0.0, 0.0, 7.0),
            Quat::from_axis_angle(&Vec3::z_axis(), 2.0),
            Vec3::new(0.25, 1.0, 1.0),
        ));
        nodes[mid].parent = Some(root);
        nodes[leaf].parent = Some(mid);
        (nodes, [root, mid, leaf])
    }

    #[test]
    fn test_local_to_parent_matches_trs_product() {
        let (nodes, ids) = chain();
        for id in ids {
            let n = &nodes[id];
            let expected = Mat4::new_translation(&n.position)
                * n.rotation.to_homogeneous()
                * Mat4::new_nonuniform_scaling(&n.scale);
            assert_relative_eq!(n.local_to_parent(), expected, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_parent_to_local_is_inverse() {
        let (nodes, ids) = chain();
        for id in ids {
            let n = &nodes[id];
            assert_relative_eq!(
                n.local_to_parent() * n.parent_to_local(),
                Mat4::identity(),
                epsilon = EPSILON
            );
        }
    }

    #[test]
    fn test_world_to_local_is_inverse_of_local_to_world() {
        let (nodes, ids) = chain();
        for id in ids {
            let world = local_to_world(&nodes, id);
            let inverse = world.try_inverse().unwrap();
            assert_relative_eq!(world_to_local(&nodes, id), inverse, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_path_composition_matches_parent_chain() {
        let (nodes, ids) = chain();
        assert_relative_eq!(
            path_local_to_world(&nodes, &ids),
            local_to_world(&nodes, ids[2]),
            epsilon = EPSILON
        );
        assert_relative_eq!(
            path_world_to_local(&nodes, &ids),
            world_to_local(&nodes, ids[2]),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_root_world_is_local() {
        let (nodes, ids) = chain();
        assert_eq!(local_to_world(&nodes, ids[0]), nodes[ids[0]].local_to_parent());
    }

    #[test]
    fn test_zero_scale_stays_finite() {
        let flat = node(Vec3::new(1.0, 1.0, 1.0), Quat::identity(), Vec3::new(0.0, 1.0, 1.0));
        let inverse = flat.parent_to_local();
        assert!(inverse.iter().all(|v| v.is_finite()));
        assert_eq!(inverse[(0, 0)], 0.0);
        assert_eq!(inverse[(0, 3)], 0.0);
        assert_eq!(inverse[(1, 3)], -1.0);
    }
}
