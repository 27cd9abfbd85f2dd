//! Structural copies
//!
//! Clones get a fresh id and uuid. Geometry, materials and clips are shared
//! by reference between the original and the copy.

use crate::foundation::collections::NodeKey;

use super::error::SceneError;
use super::graph::SceneGraph;

impl SceneGraph {
    /// Copy `key` into a new root, optionally with clones of its descendants
    ///
    /// Cloned children are attached in the source's child order.
    pub fn clone_node(&mut self, key: NodeKey, recursive: bool) -> Result<NodeKey, SceneError> {
        let copy = self.node(key)?.duplicate();
        let root = self.insert(copy);

        if recursive {
            self.clone_children_into(key, root)?;
        }
        Ok(root)
    }

    /// Overwrite `target`'s state with `source`'s, keeping `target`'s identity
    ///
    /// With `recursive`, `target`'s existing children are detached first and
    /// replaced with clones of `source`'s children. Copying a node onto
    /// itself does nothing.
    pub fn copy_node(
        &mut self,
        target: NodeKey,
        source: NodeKey,
        recursive: bool,
    ) -> Result<(), SceneError> {
        self.node(target)?;
        self.node(source)?;
        if target == source {
            return Ok(());
        }

        if let Some([target_node, source_node]) = self.nodes.get_disjoint_mut([target, source]) {
            target_node.copy_from(source_node);
        }

        if recursive {
            // a target above source would otherwise see its own clones
            let sources = self.nodes[source].children.clone();
            self.clear(target)?;
            for child in sources {
                let cloned = self.clone_node(child, true)?;
                self.add(target, cloned)?;
            }
        }
        Ok(())
    }

    fn clone_children_into(&mut self, source: NodeKey, target: NodeKey) -> Result<(), SceneError> {
        let mut stack = vec![(source, target)];
        while let Some((from, to)) = stack.pop() {
            let children = self.nodes[from].children.clone();
            for child in children {
                let copy = self.nodes[child].duplicate();
                let cloned = self.insert(copy);
                self.add(to, cloned)?;
                stack.push((child, cloned));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::node::{MeshParts, NodeKind};
    use crate::scene::resources::{BoxGeometry, Geometry};
    use std::rc::Rc;

    #[test]
    fn test_clone_gets_fresh_identity() {
        let mut graph = SceneGraph::new();
        let source = graph.create(NodeKind::Object3D);
        graph[source].name = "source".into();
        graph[source].position = Vec3::new(1.0, 2.0, 3.0);

        let copy = graph.clone_node(source, false).unwrap();

        assert_ne!(graph[copy].uuid, graph[source].uuid);
        assert_ne!(graph[copy].id(), graph[source].id());
        assert_eq!(graph[copy].name, "source");
        assert_eq!(graph[copy].position, graph[source].position);
        assert!(graph[copy].parent().is_none());
    }

    #[test]
    fn test_recursive_clone_shares_geometry() {
        let mut graph = SceneGraph::new();
        let geometry: Rc<dyn Geometry> = Rc::new(BoxGeometry::new(1.0, 1.0, 1.0));
        let root = graph.create(NodeKind::Group);
        let mesh = graph.create(NodeKind::Mesh(MeshParts::new(Rc::clone(&geometry), None)));
        let leaf = graph.create(NodeKind::Object3D);
        graph.add(root, mesh).unwrap();
        graph.add(mesh, leaf).unwrap();

        let copy = graph.clone_node(root, true).unwrap();

        let copied_mesh = graph[copy].children()[0];
        assert_ne!(copied_mesh, mesh);
        assert_eq!(graph[copied_mesh].children().len(), 1);
        let parts = graph[copied_mesh].kind.as_mesh().unwrap();
        assert!(Rc::ptr_eq(&parts.geometry, &geometry));
        assert_eq!(graph.subtree(copy).len(), 3);
    }

    #[test]
    fn test_shallow_clone_has_no_children() {
        let mut graph = SceneGraph::new();
        let root = graph.create(NodeKind::Group);
        let child = graph.create(NodeKind::Object3D);
        graph.add(root, child).unwrap();

        let copy = graph.clone_node(root, false).unwrap();
        assert!(graph[copy].children().is_empty());
    }

    #[test]
    fn test_copy_keeps_identity_and_replaces_children() {
        let mut graph = SceneGraph::new();
        let target = graph.create(NodeKind::Object3D);
        let old_child = graph.create(NodeKind::Object3D);
        graph.add(target, old_child).unwrap();

        let source = graph.create(NodeKind::Object3D);
        let source_child = graph.create(NodeKind::Object3D);
        graph[source].scale = Vec3::new(2.0, 2.0, 2.0);
        graph[source].visible = false;
        graph[source_child].name = "from source".into();
        graph.add(source, source_child).unwrap();

        let uuid = graph[target].uuid;
        let id = graph[target].id();
        graph.copy_node(target, source, true).unwrap();

        assert_eq!(graph[target].uuid, uuid);
        assert_eq!(graph[target].id(), id);
        assert_eq!(graph[target].scale, Vec3::new(2.0, 2.0, 2.0));
        assert!(!graph[target].visible);

        assert!(graph[old_child].parent().is_none());
        let children = graph[target].children().to_vec();
        assert_eq!(children.len(), 1);
        assert_ne!(children[0], source_child);
        assert_eq!(graph[children[0]].name, "from source");
        assert_eq!(graph[source].children(), &[source_child]);
    }

    #[test]
    fn test_copy_onto_self_is_noop() {
        let mut graph = SceneGraph::new();
        let node = graph.create(NodeKind::Object3D);
        let child = graph.create(NodeKind::Object3D);
        graph.add(node, child).unwrap();

        graph.copy_node(node, node, true).unwrap();
        assert_eq!(graph[node].children(), &[child]);
    }
}
