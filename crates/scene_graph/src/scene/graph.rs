//! Arena-backed node hierarchy
//!
//! Every node lives in one [`SceneGraph`] and is addressed by a [`NodeKey`].
//! Parent and child links are handles, so there are no owning cycles; a node
//! removed from its parent simply becomes another root in the arena until it
//! is explicitly destroyed.
//!
//! The graph is single-threaded (`!Send`, collaborators are `Rc`). Readers on
//! other threads would need an external lock; [`SceneGraph::hierarchy_generation`]
//! lets consumers detect topology changes between frames.

use std::ops::{Index, IndexMut};
use std::rc::Rc;

use log::{debug, trace, warn};

use crate::config::{GraphConfig, NodeDefaults};
use crate::events::{EventSystem, EventType, GraphEvent};
use crate::foundation::collections::{NodeArena, NodeKey};

use super::error::SceneError;
use super::node::{Node, NodeKind};

/// Owner of a node hierarchy
#[derive(Debug)]
pub struct SceneGraph {
    pub(crate) nodes: NodeArena<Node>,
    config: GraphConfig,
    events: EventSystem,
    generation: u64,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create an empty graph with default configuration
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create an empty graph with the given configuration
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            nodes: NodeArena::with_key(),
            config,
            events: EventSystem::new(),
            generation: 0,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Construction defaults handed to new nodes
    pub fn node_defaults(&self) -> &NodeDefaults {
        &self.config.node_defaults
    }

    /// Hierarchy event registration
    pub fn events(&self) -> &EventSystem {
        &self.events
    }

    /// Counter bumped on every structural change
    pub fn hierarchy_generation(&self) -> u64 {
        self.generation
    }

    /// Create a root node of the given kind using the configured defaults
    pub fn create(&mut self, kind: NodeKind) -> NodeKey {
        let node = Node::new(kind, &self.config.node_defaults);
        self.insert(node)
    }

    /// Move a detached node into the arena as a root
    pub fn insert(&mut self, node: Node) -> NodeKey {
        debug_assert!(node.parent.is_none() && node.children.is_empty());
        self.nodes.insert(node)
    }

    /// Node for a handle
    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Mutable node for a handle
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Whether the handle resolves
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All live nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }

    /// Nodes without a parent
    pub fn roots(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(key, _)| key)
    }

    pub(crate) fn node(&self, key: NodeKey) -> Result<&Node, SceneError> {
        self.nodes.get(key).ok_or(SceneError::NodeNotFound(key))
    }

    pub(crate) fn node_mut(&mut self, key: NodeKey) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(key).ok_or(SceneError::NodeNotFound(key))
    }

    /// Whether `ancestor` lies on the parent chain of `node`
    pub fn is_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.nodes.get(key).and_then(|n| n.parent);
        }
        false
    }

    /// Append `child` to `parent`'s children
    ///
    /// A child that already has a parent is detached from it first. Adding a
    /// node to itself is ignored. Adding an ancestor of `parent` fails with
    /// [`SceneError::HierarchyCycle`] and leaves the graph untouched.
    pub fn add(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), SceneError> {
        self.node(parent)?;
        self.node(child)?;

        if parent == child {
            warn!("Ignoring attempt to add node {:?} as a child of itself", child);
            return Ok(());
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::HierarchyCycle { parent, child });
        }

        if let Some(previous) = self.nodes[child].parent {
            self.detach(previous, child);
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        self.generation += 1;
        trace!("Added {:?} under {:?}", child, parent);

        self.events.dispatch(&GraphEvent::new(EventType::Added, child, parent));
        self.events.dispatch(&GraphEvent::new(EventType::ChildAdded, parent, child));
        Ok(())
    }

    /// Add several children in order, stopping at the first error
    pub fn add_all(&mut self, parent: NodeKey, children: &[NodeKey]) -> Result<(), SceneError> {
        children.iter().try_for_each(|&child| self.add(parent, child))
    }

    /// Detach `child` from `parent`; a no-op if it is not one of its children
    pub fn remove(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), SceneError> {
        let is_child = self.node(parent)?.children.contains(&child);
        if is_child {
            self.detach(parent, child);
        }
        Ok(())
    }

    /// Detach several children
    pub fn remove_all(&mut self, parent: NodeKey, children: &[NodeKey]) -> Result<(), SceneError> {
        children.iter().try_for_each(|&child| self.remove(parent, child))
    }

    /// Detach every child of `parent`
    pub fn clear(&mut self, parent: NodeKey) -> Result<(), SceneError> {
        while let Some(&child) = self.node(parent)?.children.first() {
            self.detach(parent, child);
        }
        Ok(())
    }

    /// Detach `key` from its parent; a no-op for roots
    pub fn remove_from_parent(&mut self, key: NodeKey) -> Result<(), SceneError> {
        if let Some(parent) = self.node(key)?.parent {
            self.detach(parent, key);
        }
        Ok(())
    }

    fn detach(&mut self, parent: NodeKey, child: NodeKey) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
        self.generation += 1;
        trace!("Removed {:?} from {:?}", child, parent);

        self.events.dispatch(&GraphEvent::new(EventType::Removed, child, parent));
        self.events.dispatch(&GraphEvent::new(EventType::ChildRemoved, parent, child));
    }

    /// Re-parent `object` under `parent` keeping its world transform
    ///
    /// Both ancestor chains are propagated first, then `object`'s local
    /// transform is rewritten so that `parent.world * local` equals its old
    /// world matrix. Fails with [`SceneError::SingularMatrix`] (without
    /// changing anything) if `parent`'s world matrix cannot be inverted.
    pub fn attach(&mut self, parent: NodeKey, object: NodeKey) -> Result<(), SceneError> {
        self.node(parent)?;
        self.node(object)?;

        if parent == object {
            warn!("Ignoring attempt to attach node {:?} to itself", object);
            return Ok(());
        }
        if self.is_ancestor(object, parent) {
            return Err(SceneError::HierarchyCycle { parent, child: object });
        }

        self.update_world_matrix(parent, true, false)?;
        let mut relative = self.nodes[parent]
            .matrix_world
            .try_inverse()
            .ok_or(SceneError::SingularMatrix(parent))?;

        if let Some(old_parent) = self.nodes[object].parent {
            self.update_world_matrix(old_parent, true, false)?;
            relative *= self.nodes[old_parent].matrix_world;
        }

        self.nodes[object].apply_matrix4(&relative);
        self.add(parent, object)?;
        self.update_world_matrix(object, false, true)
    }

    /// Remove a subtree from the arena, invalidating its handles
    ///
    /// Geometry and materials whose last reference was held by a destroyed
    /// node are disposed. Returns the number of nodes freed.
    pub fn destroy(&mut self, key: NodeKey) -> Result<usize, SceneError> {
        self.remove_from_parent(key)?;

        let doomed = self.subtree(key);
        for &doomed_key in &doomed {
            let Some(node) = self.nodes.remove(doomed_key) else { continue };
            if let NodeKind::Mesh(parts) = node.kind {
                if Rc::strong_count(&parts.geometry) == 1 {
                    parts.geometry.dispose();
                }
                if let Some(material) = parts.material {
                    if Rc::strong_count(&material) == 1 {
                        material.dispose();
                    }
                }
            }
        }

        self.generation += 1;
        debug!("Destroyed {} node(s) rooted at {:?}", doomed.len(), key);
        Ok(doomed.len())
    }
}

impl Index<NodeKey> for SceneGraph {
    type Output = Node;

    fn index(&self, key: NodeKey) -> &Node {
        &self.nodes[key]
    }
}

impl IndexMut<NodeKey> for SceneGraph {
    fn index_mut(&mut self, key: NodeKey) -> &mut Node {
        &mut self.nodes[key]
    }
}
