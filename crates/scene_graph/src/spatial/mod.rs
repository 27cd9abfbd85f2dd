//! Spatial primitives used for picking and bounds queries

pub mod primitives;

pub use primitives::{Ray, BoundingSphere, AABB};
