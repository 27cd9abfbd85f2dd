//! Coordinate-space queries
//!
//! `local_to_world`/`world_to_local` read the cached world matrix as-is;
//! call a propagation pass first if the hierarchy moved. The `world_*`
//! getters refresh the ancestor chain and the node itself before reading.

use crate::foundation::collections::NodeKey;
use crate::foundation::math::{self, Point3, Quat, Transform, Vec3};

use super::error::SceneError;
use super::graph::SceneGraph;

impl SceneGraph {
    /// Map a point from `key`'s local space to world space
    pub fn local_to_world(&self, key: NodeKey, point: &Vec3) -> Result<Vec3, SceneError> {
        let world = &self.node(key)?.matrix_world;
        Ok(world.transform_point(&Point3::from(*point)).coords)
    }

    /// Map a world-space point into `key`'s local space
    pub fn world_to_local(&self, key: NodeKey, point: &Vec3) -> Result<Vec3, SceneError> {
        let inverse = self
            .node(key)?
            .matrix_world
            .try_inverse()
            .ok_or(SceneError::SingularMatrix(key))?;
        Ok(inverse.transform_point(&Point3::from(*point)).coords)
    }

    /// World-space TRS of `key`, refreshing ancestors first
    pub fn world_transform(&mut self, key: NodeKey) -> Result<Transform, SceneError> {
        self.update_world_matrix(key, true, false)?;
        Ok(Transform::from_matrix(self.nodes[key].matrix_world))
    }

    /// World-space position
    pub fn world_position(&mut self, key: NodeKey) -> Result<Vec3, SceneError> {
        self.update_world_matrix(key, true, false)?;
        let world = &self.nodes[key].matrix_world;
        Ok(Vec3::new(world.m14, world.m24, world.m34))
    }

    /// World-space orientation
    pub fn world_quaternion(&mut self, key: NodeKey) -> Result<Quat, SceneError> {
        Ok(self.world_transform(key)?.rotation)
    }

    /// World-space scale
    pub fn world_scale(&mut self, key: NodeKey) -> Result<Vec3, SceneError> {
        Ok(self.world_transform(key)?.scale)
    }

    /// Unit vector along the node's local -Z axis, in world space
    ///
    /// Only the world orientation is used; translation and scale are
    /// discarded by the decomposition.
    pub fn world_direction(&mut self, key: NodeKey) -> Result<Vec3, SceneError> {
        let rotation = self.world_quaternion(key)?;
        Ok((rotation * Vec3::new(0.0, 0.0, -1.0)).normalize())
    }

    /// Rotate `key` so it faces a world-space target
    ///
    /// Cameras and lights aim their -Z axis at the target, other nodes their
    /// +Z axis. The node's `up` vector resolves the roll. Parent rotation is
    /// compensated so the result holds in world space.
    pub fn look_at(&mut self, key: NodeKey, target: &Vec3) -> Result<(), SceneError> {
        self.update_world_matrix(key, true, false)?;

        let node = &self.nodes[key];
        let world = &node.matrix_world;
        let position = Vec3::new(world.m14, world.m24, world.m34);

        let mut rotation = if node.kind.aims_negative_z() {
            math::look_rotation(&position, target, &node.up)
        } else {
            math::look_rotation(target, &position, &node.up)
        };

        if let Some(parent) = node.parent {
            let parent_rotation = Transform::from_matrix(self.nodes[parent].matrix_world).rotation;
            rotation = parent_rotation.inverse() * rotation;
        }

        self.nodes[key].quaternion = rotation;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;
    use crate::foundation::math::Mat4;
    use crate::scene::node::NodeKind;
    use approx::assert_relative_eq;

    #[test]
    fn test_world_getters_refresh_ancestors() {
        let mut graph = SceneGraph::new();
        let parent = graph.create(NodeKind::Group);
        let child = graph.create(NodeKind::Object3D);
        graph.add(parent, child).unwrap();

        graph[parent].position = Vec3::new(0.0, 10.0, 0.0);
        graph[parent].scale = Vec3::new(2.0, 2.0, 2.0);
        graph[parent].set_rotation_from_axis_angle(&Vec3::y_axis(), HALF_PI);
        graph[child].position = Vec3::new(1.0, 0.0, 0.0);

        let position = graph.world_position(child).unwrap();
        let scale = graph.world_scale(child).unwrap();
        let quaternion = graph.world_quaternion(child).unwrap();

        assert_relative_eq!(position, Vec3::new(0.0, 10.0, -2.0), epsilon = 1e-5);
        assert_relative_eq!(scale, Vec3::new(2.0, 2.0, 2.0), epsilon = 1e-5);
        assert_relative_eq!(quaternion.angle(), HALF_PI, epsilon = 1e-5);
    }

    #[test]
    fn test_world_direction_is_rotated_minus_z() {
        let mut graph = SceneGraph::new();
        let node = graph.create(NodeKind::Object3D);
        graph[node].position = Vec3::new(5.0, 5.0, 5.0);
        graph[node].scale = Vec3::new(3.0, 3.0, 3.0);
        graph[node].set_rotation_from_axis_angle(&Vec3::y_axis(), HALF_PI);

        let direction = graph.world_direction(node).unwrap();
        assert_relative_eq!(direction, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_local_world_round_trip_uses_cached_matrix() {
        let mut graph = SceneGraph::new();
        let node = graph.create(NodeKind::Object3D);
        graph[node].position = Vec3::new(1.0, 0.0, 0.0);

        // not propagated yet: cached world is identity
        let before = graph.local_to_world(node, &Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(before, Vec3::new(0.0, 1.0, 0.0));

        graph.update_matrix_world(node, false).unwrap();
        let world = graph.local_to_world(node, &Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(world, Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-6);

        let local = graph.world_to_local(node, &world).unwrap();
        assert_relative_eq!(local, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_world_to_local_rejects_singular_world() {
        let mut graph = SceneGraph::new();
        let node = graph.create(NodeKind::Object3D);
        graph[node].matrix_world = Mat4::new_nonuniform_scaling(&Vec3::new(0.0, 1.0, 1.0));

        assert!(matches!(
            graph.world_to_local(node, &Vec3::zeros()),
            Err(SceneError::SingularMatrix(k)) if k == node
        ));
    }

    #[test]
    fn test_look_at_camera_aims_minus_z() {
        let mut graph = SceneGraph::new();
        let camera = graph.create(NodeKind::Camera);
        graph[camera].position = Vec3::new(0.0, 0.0, 10.0);

        graph.look_at(camera, &Vec3::new(10.0, 0.0, 10.0)).unwrap();
        let direction = graph.world_direction(camera).unwrap();

        assert_relative_eq!(direction, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_look_at_object_aims_plus_z_under_rotated_parent() {
        let mut graph = SceneGraph::new();
        let parent = graph.create(NodeKind::Group);
        let object = graph.create(NodeKind::Object3D);
        graph.add(parent, object).unwrap();
        graph[parent].set_rotation_from_axis_angle(&Vec3::y_axis(), HALF_PI);

        let target = Vec3::new(0.0, 0.0, -5.0);
        graph.look_at(object, &target).unwrap();
        graph.update_matrix_world(parent, false).unwrap();

        let world_rotation = graph.world_quaternion(object).unwrap();
        let plus_z = world_rotation * Vec3::z();
        assert_relative_eq!(plus_z, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }
}
