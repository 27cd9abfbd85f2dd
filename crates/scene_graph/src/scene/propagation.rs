//! World matrix propagation
//!
//! Two entry points, both iterative so deep hierarchies cannot overflow the
//! stack:
//!
//! - [`SceneGraph::update_matrix_world`] walks a subtree pre-order. Each node
//!   recomposes its local matrix when `matrix_auto_update` is set, rebuilds
//!   its world matrix when dirty or forced, and forces every descendant once
//!   it has rebuilt. Children with `matrix_world_auto_update == false` are
//!   skipped along with their whole subtree.
//! - [`SceneGraph::update_world_matrix`] is the targeted variant used by the
//!   coordinate queries: optionally refresh the ancestor chain, always
//!   refresh the receiver, optionally refresh descendants.
//!
//! An ancestor with `matrix_auto_update == false` contributes its stored
//! local matrix as-is: freezing a local transform never stops world
//! propagation through it. An ancestor with `matrix_world_auto_update ==
//! false` stops the upward refresh and contributes its cached world matrix.

use crate::foundation::collections::NodeKey;
use crate::foundation::math::Mat4;

use super::error::SceneError;
use super::graph::SceneGraph;

impl SceneGraph {
    /// Recompose one node's local matrix from its TRS
    pub fn update_matrix(&mut self, key: NodeKey) -> Result<(), SceneError> {
        self.node_mut(key)?.update_matrix();
        Ok(())
    }

    /// Propagate world matrices through the subtree rooted at `key`
    ///
    /// `force` rebuilds world matrices even where nothing is dirty.
    pub fn update_matrix_world(&mut self, key: NodeKey, force: bool) -> Result<(), SceneError> {
        self.node(key)?;

        let mut stack = vec![(key, force)];
        while let Some((current, force)) = stack.pop() {
            let parent_world = self.parent_world(current);
            let node = &mut self.nodes[current];

            if node.matrix_auto_update {
                node.update_matrix();
            }

            let mut force_children = force;
            if node.matrix_world_needs_update || force {
                node.matrix_world = match parent_world {
                    Some(parent_world) => parent_world * node.matrix,
                    None => node.matrix,
                };
                node.matrix_world_needs_update = false;
                force_children = true;
            }

            // reversed so children pop in list order
            for index in (0..self.nodes[current].children.len()).rev() {
                let child = self.nodes[current].children[index];
                if self.nodes[child].matrix_world_auto_update {
                    stack.push((child, force_children));
                }
            }
        }
        Ok(())
    }

    /// Refresh `key`'s world matrix, optionally with ancestors and descendants
    ///
    /// The receiver itself is always refreshed, whatever its flags say; only
    /// the local recompose still honours its `matrix_auto_update`.
    pub fn update_world_matrix(
        &mut self,
        key: NodeKey,
        update_parents: bool,
        update_children: bool,
    ) -> Result<(), SceneError> {
        self.node(key)?;

        if update_parents {
            let mut chain = Vec::new();
            let mut current = self.nodes[key].parent;
            while let Some(ancestor) = current {
                if !self.nodes[ancestor].matrix_world_auto_update {
                    break;
                }
                chain.push(ancestor);
                current = self.nodes[ancestor].parent;
            }
            for &ancestor in chain.iter().rev() {
                self.refresh_world(ancestor);
            }
        }

        self.refresh_world(key);

        if update_children {
            let mut stack: Vec<NodeKey> = self.auto_updating_children(key);
            stack.reverse();
            while let Some(current) = stack.pop() {
                self.refresh_world(current);
                let mut children = self.auto_updating_children(current);
                children.reverse();
                stack.extend(children);
            }
        }
        Ok(())
    }

    fn parent_world(&self, key: NodeKey) -> Option<Mat4> {
        self.nodes[key].parent.map(|parent| self.nodes[parent].matrix_world)
    }

    fn refresh_world(&mut self, key: NodeKey) {
        let parent_world = self.parent_world(key);
        let node = &mut self.nodes[key];

        if node.matrix_auto_update {
            node.update_matrix();
        }
        node.matrix_world = match parent_world {
            Some(parent_world) => parent_world * node.matrix,
            None => node.matrix,
        };
    }

    fn auto_updating_children(&self, key: NodeKey) -> Vec<NodeKey> {
        self.nodes[key]
            .children
            .iter()
            .copied()
            .filter(|&child| self.nodes[child].matrix_world_auto_update)
            .collect()
    }
}
