//! Scene graph errors

use thiserror::Error;
use uuid::Uuid;

use crate::foundation::collections::NodeKey;

/// Errors raised by graph operations
///
/// Ordinary hierarchy no-ops (removing a node that is not a child, adding a
/// node to itself) are not errors; these variants cover stale handles,
/// rejected cycles and failures that would otherwise corrupt state.
#[derive(Error, Debug)]
pub enum SceneError {
    /// Handle does not resolve (never inserted or already destroyed)
    #[error("Node {0:?} does not exist in this graph")]
    NodeNotFound(NodeKey),

    /// Parenting would make a node its own ancestor
    #[error("Adding {child:?} under {parent:?} would create a cycle")]
    HierarchyCycle {
        /// Requested parent
        parent: NodeKey,
        /// Requested child (an ancestor of `parent`)
        child: NodeKey,
    },

    /// A world matrix that must be inverted is singular
    #[error("World matrix of {0:?} is not invertible")]
    SingularMatrix(NodeKey),

    /// Serialized `type` tag has no matching node kind
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Serialized node references a resource the resolver does not know
    #[error("Missing {kind} resource {uuid}")]
    MissingResource {
        /// Resource table name (`geometry`, `material`, `animation`)
        kind: &'static str,
        /// Referenced uuid
        uuid: Uuid,
    },

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
