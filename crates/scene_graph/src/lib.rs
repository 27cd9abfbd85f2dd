//! # Scene Graph
//!
//! A hierarchical transform graph: every node owns a local translation,
//! rotation and scale and derives a cached world matrix from its ancestors.
//!
//! ## Features
//!
//! - **Arena ownership**: nodes live in a [`scene::SceneGraph`] and are addressed by handles
//! - **Lazy propagation**: world matrices are rebuilt only where something changed,
//!   with per-node opt-outs for local and world updates
//! - **Exact re-parenting**: `attach` moves a node while keeping its world transform
//! - **Queries**: local/world conversion, world TRS, `look_at`, ray picking
//! - **Documents**: JSON serialization with shared resource side tables
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_graph::prelude::*;
//!
//! let mut graph = SceneGraph::new();
//! let parent = graph.create(NodeKind::Group);
//! let child = graph.create(NodeKind::Object3D);
//! graph.add(parent, child)?;
//!
//! graph[parent].position = Vec3::new(1.0, 2.0, 3.0);
//! graph[child].position = Vec3::new(4.0, 5.0, 6.0);
//! graph.update_matrix_world(parent, false)?;
//!
//! let world = graph.local_to_world(child, &Vec3::zeros())?;
//! assert_eq!(world, Vec3::new(5.0, 7.0, 9.0));
//! # Ok::<(), SceneError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod events;
pub mod foundation;
pub mod scene;
pub mod spatial;

/// Common imports for graph users
pub mod prelude {
    pub use crate::{
        config::{Config, GraphConfig, NodeDefaults, SerializationConfig},
        events::{EventSystem, EventType, GraphEvent, HandlerId},
        foundation::{
            collections::NodeKey,
            euler::{Euler, EulerOrder},
            math::{Mat4, Quat, Transform, Vec3},
        },
        scene::{
            resources::{
                AnimationClip, BasicMaterial, BoxGeometry, Geometry, Material, NamedClip,
                ResourceLibrary, ResourceResolver,
            },
            Intersection, Layers, MeshParts, Node, NodeKind, Raycaster, SceneDocument,
            SceneError, SceneGraph,
        },
        spatial::{BoundingSphere, Ray, AABB},
    };
}
