//! Transform hierarchy
//!
//! Nodes live in a [`SceneGraph`] arena and are addressed by
//! [`NodeKey`](crate::foundation::collections::NodeKey). Each node keeps a
//! local TRS, the local matrix composed from it and a cached world matrix.
//!
//! ## Layout
//!
//! ```text
//! node           local transform state and per-node operations
//! graph          ownership, hierarchy mutation, attach, destroy
//! propagation    world matrix passes (full subtree and targeted)
//! queries        local/world conversions, world TRS, look_at
//! traversal      pre-order walks and lookups
//! cloning        clone/copy of subtrees
//! serialization  JSON documents
//! raycast        ray picking through the geometry collaborator
//! resources      geometry/material/clip traits and stock implementations
//! ```

mod cloning;
mod error;
mod graph;
mod node;
mod propagation;
mod queries;
mod raycast;
mod serialization;
mod traversal;

pub mod resources;

#[cfg(test)]
mod tests;

pub use error::SceneError;
pub use graph::SceneGraph;
pub use node::{Layers, MeshParts, Node, NodeKind};
pub use raycast::{Intersection, Raycaster};
pub use serialization::{Metadata, NodeRecord, SceneDocument, FORMAT_VERSION};
