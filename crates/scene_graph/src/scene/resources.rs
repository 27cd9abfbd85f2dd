//! Externally owned collaborators referenced by nodes
//!
//! Geometry, materials and animation clips are shared through `Rc` and never
//! deep-copied by the graph. Geometry is only consulted for bounds and ray
//! hits; materials and clips are opaque apart from their uuid and JSON form.

use std::cell::{Cell, OnceCell};
use std::collections::HashMap;
use std::fmt::Debug;
use std::rc::Rc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::foundation::collections::NodeKey;
use crate::foundation::math::Vec3;
use crate::spatial::{BoundingSphere, Ray, AABB};

use super::graph::SceneGraph;

/// Shape data a mesh node renders
pub trait Geometry: Debug {
    /// Stable identity used for JSON side tables
    fn uuid(&self) -> Uuid;

    /// Bounding sphere in local space, if one can be computed
    fn bounding_sphere(&self) -> Option<BoundingSphere>;

    /// Bounding box in local space, if one can be computed
    fn bounding_box(&self) -> Option<AABB> {
        None
    }

    /// Hit points (local space) of a local-space ray
    fn intersect_ray(&self, ray: &Ray) -> Vec<Vec3>;

    /// JSON record for the `geometries` side table; must include `uuid`
    fn to_json(&self) -> Value;

    /// Release backing resources
    fn dispose(&self) {}
}

/// Surface description a mesh node renders with
pub trait Material: Debug {
    /// Stable identity used for JSON side tables
    fn uuid(&self) -> Uuid;

    /// JSON record for the `materials` side table; must include `uuid`
    fn to_json(&self) -> Value;

    /// Release backing resources
    fn dispose(&self) {}
}

/// Animation data attached to a node
pub trait AnimationClip: Debug {
    /// Stable identity used for JSON side tables
    fn uuid(&self) -> Uuid;

    /// JSON record for the `animations` side table; must include `uuid`
    fn to_json(&self) -> Value;
}

/// Looks up shared resources by uuid while loading a document
pub trait ResourceResolver {
    /// Geometry with the given uuid
    fn geometry(&self, uuid: &Uuid) -> Option<Rc<dyn Geometry>>;
    /// Material with the given uuid
    fn material(&self, uuid: &Uuid) -> Option<Rc<dyn Material>>;
    /// Animation clip with the given uuid
    fn animation(&self, uuid: &Uuid) -> Option<Rc<dyn AnimationClip>>;
}

/// In-memory [`ResourceResolver`]
#[derive(Debug, Default)]
pub struct ResourceLibrary {
    geometries: HashMap<Uuid, Rc<dyn Geometry>>,
    materials: HashMap<Uuid, Rc<dyn Material>>,
    animations: HashMap<Uuid, Rc<dyn AnimationClip>>,
}

impl ResourceLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Gather every resource referenced inside a subtree
    pub fn collect(graph: &SceneGraph, root: NodeKey) -> Self {
        let mut library = Self::new();
        for key in graph.subtree(root) {
            let Some(node) = graph.get(key) else { continue };
            if let Some(mesh) = node.kind.as_mesh() {
                library.register_geometry(Rc::clone(&mesh.geometry));
                if let Some(material) = &mesh.material {
                    library.register_material(Rc::clone(material));
                }
            }
            for clip in &node.animations {
                library.register_animation(Rc::clone(clip));
            }
        }
        library
    }

    /// Add a geometry
    pub fn register_geometry(&mut self, geometry: Rc<dyn Geometry>) {
        self.geometries.insert(geometry.uuid(), geometry);
    }

    /// Add a material
    pub fn register_material(&mut self, material: Rc<dyn Material>) {
        self.materials.insert(material.uuid(), material);
    }

    /// Add an animation clip
    pub fn register_animation(&mut self, clip: Rc<dyn AnimationClip>) {
        self.animations.insert(clip.uuid(), clip);
    }
}

impl ResourceResolver for ResourceLibrary {
    fn geometry(&self, uuid: &Uuid) -> Option<Rc<dyn Geometry>> {
        self.geometries.get(uuid).cloned()
    }

    fn material(&self, uuid: &Uuid) -> Option<Rc<dyn Material>> {
        self.materials.get(uuid).cloned()
    }

    fn animation(&self, uuid: &Uuid) -> Option<Rc<dyn AnimationClip>> {
        self.animations.get(uuid).cloned()
    }
}

/// Axis-aligned box centered on the origin
#[derive(Debug)]
pub struct BoxGeometry {
    uuid: Uuid,
    width: f32,
    height: f32,
    depth: f32,
    bounding_sphere: OnceCell<BoundingSphere>,
    disposed: Cell<bool>,
}

impl BoxGeometry {
    /// Create a box with the given dimensions
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            width,
            height,
            depth,
            bounding_sphere: OnceCell::new(),
            disposed: Cell::new(false),
        }
    }

    /// Local-space bounds of the box
    pub fn aabb(&self) -> AABB {
        AABB::from_center_extents(
            Vec3::zeros(),
            Vec3::new(self.width, self.height, self.depth) * 0.5,
        )
    }

    /// Whether `dispose` has been called
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl Geometry for BoxGeometry {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn bounding_sphere(&self) -> Option<BoundingSphere> {
        Some(*self.bounding_sphere.get_or_init(|| self.aabb().bounding_sphere()))
    }

    fn bounding_box(&self) -> Option<AABB> {
        Some(self.aabb())
    }

    fn intersect_ray(&self, ray: &Ray) -> Vec<Vec3> {
        self.aabb()
            .intersect_ray(ray)
            .map(|t| vec![ray.point_at(t)])
            .unwrap_or_default()
    }

    fn to_json(&self) -> Value {
        json!({
            "uuid": self.uuid,
            "type": "BoxGeometry",
            "width": self.width,
            "height": self.height,
            "depth": self.depth,
        })
    }

    fn dispose(&self) {
        self.disposed.set(true);
    }
}

/// Flat-colored material
#[derive(Debug)]
pub struct BasicMaterial {
    uuid: Uuid,
    /// Display name
    pub name: String,
    /// Linear RGB color
    pub color: [f32; 3],
    disposed: Cell<bool>,
}

impl BasicMaterial {
    /// Create a material with the given color
    pub fn new(name: impl Into<String>, color: [f32; 3]) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            color,
            disposed: Cell::new(false),
        }
    }

    /// Whether `dispose` has been called
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl Material for BasicMaterial {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn to_json(&self) -> Value {
        json!({
            "uuid": self.uuid,
            "type": "BasicMaterial",
            "name": self.name,
            "color": self.color,
        })
    }

    fn dispose(&self) {
        self.disposed.set(true);
    }
}

/// Named clip with a duration; keyframe data lives elsewhere
#[derive(Debug)]
pub struct NamedClip {
    uuid: Uuid,
    /// Clip name
    pub name: String,
    /// Length in seconds
    pub duration: f32,
}

impl NamedClip {
    /// Create a clip
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            duration,
        }
    }
}

impl AnimationClip for NamedClip {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn to_json(&self) -> Value {
        json!({
            "uuid": self.uuid,
            "name": self.name,
            "duration": self.duration,
        })
    }
}
