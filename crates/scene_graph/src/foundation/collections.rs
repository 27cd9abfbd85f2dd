//! Handle-based storage for scene nodes

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Stable handle to a node stored in a [`crate::scene::SceneGraph`]
    ///
    /// Handles are generational: once a node is destroyed its handle never
    /// resolves again, even if the slot is reused.
    pub struct NodeKey;
}

/// Arena holding every node of a graph
pub type NodeArena<T> = SlotMap<NodeKey, T>;
