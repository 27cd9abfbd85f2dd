//! Ray picking against mesh nodes
//!
//! Uses the cached world matrices, so propagate before casting if anything
//! moved since the last pass.

use crate::foundation::collections::NodeKey;
use crate::foundation::math::{Point3, Vec3};
use crate::spatial::Ray;

use super::error::SceneError;
use super::graph::SceneGraph;
use super::node::{Layers, Node};

/// A world-space ray plus the filters applied while casting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Raycaster {
    /// World-space ray
    pub ray: Ray,
    /// Only nodes sharing a channel with this mask are tested
    pub layers: Layers,
    /// Hits closer than this are dropped
    pub near: f32,
    /// Hits farther than this are dropped
    pub far: f32,
}

impl Raycaster {
    /// Caster on layer 0 with an unbounded range
    pub fn new(ray: Ray) -> Self {
        Self {
            ray,
            layers: Layers::default(),
            near: 0.0,
            far: f32::INFINITY,
        }
    }

    /// Builder: set the layer mask
    pub fn with_layers(mut self, layers: Layers) -> Self {
        self.layers = layers;
        self
    }

    /// Builder: set the accepted distance range
    pub fn with_range(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }
}

/// One ray hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// World-space distance from the ray origin
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Node that was hit
    pub object: NodeKey,
}

impl SceneGraph {
    /// Cast a ray at `root` (and its descendants when `recursive`)
    ///
    /// Invisible nodes are skipped together with their subtrees. A node whose
    /// layers miss the caster's mask is not tested but its children still
    /// are. Results are sorted nearest first.
    pub fn raycast(
        &self,
        root: NodeKey,
        raycaster: &Raycaster,
        recursive: bool,
    ) -> Result<Vec<Intersection>, SceneError> {
        self.node(root)?;

        let mut hits = Vec::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            if !node.visible {
                continue;
            }
            if node.layers.test(&raycaster.layers) {
                intersect_node(key, node, raycaster, &mut hits);
            }
            if recursive {
                stack.extend(node.children.iter().rev());
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }
}

fn intersect_node(key: NodeKey, node: &Node, raycaster: &Raycaster, hits: &mut Vec<Intersection>) {
    let Some(parts) = node.kind.as_mesh() else { return };
    let geometry = &parts.geometry;
    let world = &node.matrix_world;

    if let Some(sphere) = geometry.bounding_sphere() {
        if !sphere.transformed(world).intersects_ray(&raycaster.ray) {
            return;
        }
    }

    let Some(inverse) = world.try_inverse() else { return };
    let local_ray = raycaster.ray.transformed(&inverse);

    if let Some(bounds) = geometry.bounding_box() {
        if bounds.intersect_ray(&local_ray).is_none() {
            return;
        }
    }

    for local_point in geometry.intersect_ray(&local_ray) {
        let point = world.transform_point(&Point3::from(local_point)).coords;
        let distance = (point - raycaster.ray.origin).norm();
        if distance < raycaster.near || distance > raycaster.far {
            continue;
        }
        hits.push(Intersection {
            distance,
            point,
            object: key,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::node::{MeshParts, NodeKind};
    use crate::scene::resources::{BoxGeometry, Geometry};
    use approx::assert_relative_eq;
    use std::rc::Rc;

    fn cube(graph: &mut SceneGraph, geometry: &Rc<dyn Geometry>, z: f32) -> NodeKey {
        let mesh = graph.create(NodeKind::Mesh(MeshParts::new(Rc::clone(geometry), None)));
        graph[mesh].position = Vec3::new(0.0, 0.0, z);
        mesh
    }

    fn scene() -> (SceneGraph, NodeKey, NodeKey, NodeKey) {
        let mut graph = SceneGraph::new();
        let geometry: Rc<dyn Geometry> = Rc::new(BoxGeometry::new(2.0, 2.0, 2.0));
        let root = graph.create(NodeKind::Group);
        let near = cube(&mut graph, &geometry, -5.0);
        let far = cube(&mut graph, &geometry, -10.0);
        // far first so sorting is exercised
        graph.add_all(root, &[far, near]).unwrap();
        graph.update_matrix_world(root, false).unwrap();
        (graph, root, near, far)
    }

    fn down_minus_z() -> Raycaster {
        Raycaster::new(Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0)))
    }

    #[test]
    fn test_hits_sorted_by_distance_in_world_space() {
        let (graph, root, near, far) = scene();

        let hits = graph.raycast(root, &down_minus_z(), true).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].object, near);
        assert_eq!(hits[1].object, far);
        assert_relative_eq!(hits[0].distance, 4.0, epsilon = 1e-5);
        assert_relative_eq!(hits[1].point, Vec3::new(0.0, 0.0, -9.0), epsilon = 1e-5);
    }

    #[test]
    fn test_non_recursive_tests_only_root() {
        let (graph, root, near, _) = scene();

        assert!(graph.raycast(root, &down_minus_z(), false).unwrap().is_empty());
        assert_eq!(graph.raycast(near, &down_minus_z(), false).unwrap().len(), 1);
    }

    #[test]
    fn test_invisible_and_layer_filtered_nodes_are_skipped() {
        let (mut graph, root, near, far) = scene();
        graph[near].visible = false;
        graph[far].layers.set(2);

        assert!(graph.raycast(root, &down_minus_z(), true).unwrap().is_empty());

        let mut layers = Layers::default();
        layers.enable(2);
        let hits = graph.raycast(root, &down_minus_z().with_layers(layers), true).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object, far);
    }

    #[test]
    fn test_range_and_misses() {
        let (graph, root, near, _) = scene();

        let hits = graph.raycast(root, &down_minus_z().with_range(0.0, 6.0), true).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object, near);

        let sideways = Raycaster::new(Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0)));
        assert!(graph.raycast(root, &sideways, true).unwrap().is_empty());
    }

    #[test]
    fn test_scaled_mesh_uses_world_distance() {
        let mut graph = SceneGraph::new();
        let geometry: Rc<dyn Geometry> = Rc::new(BoxGeometry::new(2.0, 2.0, 2.0));
        let mesh = cube(&mut graph, &geometry, -10.0);
        graph[mesh].scale = Vec3::new(3.0, 3.0, 3.0);
        graph.update_matrix_world(mesh, false).unwrap();

        let hits = graph.raycast(mesh, &down_minus_z(), false).unwrap();
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0].distance, 7.0, epsilon = 1e-4);
    }
}
