//! Pre-order traversal and first-match lookups
//!
//! All walks use an explicit stack and visit children in child-list order.

use serde_json::Value;

use crate::foundation::collections::NodeKey;

use super::error::SceneError;
use super::graph::SceneGraph;
use super::node::Node;

impl SceneGraph {
    /// Keys of `root` and all its descendants, pre-order
    ///
    /// Empty if `root` is not a live handle.
    pub fn subtree(&self, root: NodeKey) -> Vec<NodeKey> {
        let mut order = Vec::new();
        self.walk(root, false, |key, _| order.push(key));
        order
    }

    /// Visit every node of the subtree rooted at `root`
    pub fn traverse<F>(&self, root: NodeKey, visit: F) -> Result<(), SceneError>
    where
        F: FnMut(NodeKey, &Node),
    {
        self.node(root)?;
        self.walk(root, false, visit);
        Ok(())
    }

    /// Visit every node of the subtree with mutable access
    ///
    /// The visit order is fixed before the first callback runs.
    pub fn traverse_mut<F>(&mut self, root: NodeKey, mut visit: F) -> Result<(), SceneError>
    where
        F: FnMut(NodeKey, &mut Node),
    {
        self.node(root)?;
        for key in self.subtree(root) {
            if let Some(node) = self.nodes.get_mut(key) {
                visit(key, node);
            }
        }
        Ok(())
    }

    /// Visit the subtree, pruning at every invisible node
    ///
    /// An invisible node is skipped together with all its descendants,
    /// including `root` itself.
    pub fn traverse_visible<F>(&self, root: NodeKey, visit: F) -> Result<(), SceneError>
    where
        F: FnMut(NodeKey, &Node),
    {
        self.node(root)?;
        self.walk(root, true, visit);
        Ok(())
    }

    /// Visit each ancestor of `key`, nearest first
    pub fn traverse_ancestors<F>(&self, key: NodeKey, mut visit: F) -> Result<(), SceneError>
    where
        F: FnMut(NodeKey, &Node),
    {
        let mut current = self.node(key)?.parent;
        while let Some(ancestor) = current {
            let node = &self.nodes[ancestor];
            visit(ancestor, node);
            current = node.parent;
        }
        Ok(())
    }

    /// Ancestors of `key`, nearest first
    ///
    /// A stale handle has no ancestors.
    pub fn ancestors(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(key).and_then(|node| node.parent);
        while let Some(ancestor) = current {
            chain.push(ancestor);
            current = self.nodes[ancestor].parent;
        }
        chain
    }

    /// First node in the subtree with the given process-wide id
    pub fn object_by_id(&self, root: NodeKey, id: u64) -> Option<NodeKey> {
        self.find(root, |node| node.id() == id)
    }

    /// First node in the subtree with the given name
    pub fn object_by_name(&self, root: NodeKey, name: &str) -> Option<NodeKey> {
        self.find(root, |node| node.name == name)
    }

    /// First node in the subtree whose property `name` equals `value`
    ///
    /// See [`Node::property`] for the names that resolve.
    pub fn object_by_property(&self, root: NodeKey, name: &str, value: &Value) -> Option<NodeKey> {
        self.find(root, |node| node.property(name).as_ref() == Some(value))
    }

    /// Every node in the subtree whose property `name` equals `value`
    pub fn objects_by_property(&self, root: NodeKey, name: &str, value: &Value) -> Vec<NodeKey> {
        let mut matches = Vec::new();
        self.walk(root, false, |key, node| {
            if node.property(name).as_ref() == Some(value) {
                matches.push(key);
            }
        });
        matches
    }

    fn find<P>(&self, root: NodeKey, mut predicate: P) -> Option<NodeKey>
    where
        P: FnMut(&Node) -> bool,
    {
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else { continue };
            if predicate(node) {
                return Some(key);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    fn walk<F>(&self, root: NodeKey, visible_only: bool, mut visit: F)
    where
        F: FnMut(NodeKey, &Node),
    {
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else { continue };
            if visible_only && !node.visible {
                continue;
            }
            visit(key, node);
            stack.extend(node.children.iter().rev());
        }
    }
}
