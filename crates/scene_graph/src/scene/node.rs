//! Scene node data and local transform operations
//!
//! A [`Node`] owns its local TRS, the local matrix composed from it and the
//! cached world matrix written by propagation. The local matrix is *not*
//! kept in sync with the TRS fields: it only changes when [`Node::update_matrix`]
//! runs, either explicitly or from a propagation pass.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::NodeDefaults;
use crate::foundation::collections::NodeKey;
use crate::foundation::euler::{Euler, EulerOrder};
use crate::foundation::math::{self, Mat4, Quat, Transform, Unit, Vec3};

use super::resources::{AnimationClip, Geometry, Material};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

fn next_node_id() -> u64 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Shared collaborators of a mesh node
#[derive(Clone)]
pub struct MeshParts {
    /// Shape, shared by reference
    pub geometry: Rc<dyn Geometry>,
    /// Surface, shared by reference
    pub material: Option<Rc<dyn Material>>,
}

impl MeshParts {
    /// Mesh parts from a geometry and optional material
    pub fn new(geometry: Rc<dyn Geometry>, material: Option<Rc<dyn Material>>) -> Self {
        Self { geometry, material }
    }
}

impl fmt::Debug for MeshParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshParts")
            .field("geometry", &self.geometry.uuid())
            .field("material", &self.material.as_ref().map(|m| m.uuid()))
            .finish()
    }
}

/// Concrete kind of a node
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Plain transform node
    Object3D,
    /// Grouping node with no content of its own
    Group,
    /// Skeleton joint
    Bone,
    /// Viewpoint; looks down its local -Z axis
    Camera,
    /// Light source; points down its local -Z axis
    Light,
    /// Renderable geometry
    Mesh(MeshParts),
}

impl NodeKind {
    /// Type tag written to JSON
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Object3D => "Object3D",
            Self::Group => "Group",
            Self::Bone => "Bone",
            Self::Camera => "Camera",
            Self::Light => "Light",
            Self::Mesh(_) => "Mesh",
        }
    }

    /// Kind for a JSON type tag; meshes need their resources and return `None`
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Object3D" => Some(Self::Object3D),
            "Group" => Some(Self::Group),
            "Bone" => Some(Self::Bone),
            "Camera" => Some(Self::Camera),
            "Light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Whether this is a mesh
    pub fn is_mesh(&self) -> bool {
        matches!(self, Self::Mesh(_))
    }

    /// Whether this is a camera
    pub fn is_camera(&self) -> bool {
        matches!(self, Self::Camera)
    }

    /// Whether this is a light
    pub fn is_light(&self) -> bool {
        matches!(self, Self::Light)
    }

    /// Mesh parts, if this is a mesh
    pub fn as_mesh(&self) -> Option<&MeshParts> {
        match self {
            Self::Mesh(parts) => Some(parts),
            _ => None,
        }
    }

    /// Mutable mesh parts, if this is a mesh
    pub fn as_mesh_mut(&mut self) -> Option<&mut MeshParts> {
        match self {
            Self::Mesh(parts) => Some(parts),
            _ => None,
        }
    }

    /// Cameras and lights aim their -Z axis; everything else aims +Z
    pub fn aims_negative_z(&self) -> bool {
        self.is_camera() || self.is_light()
    }
}

/// 32-channel membership mask
///
/// A node is considered by a consumer when its mask shares at least one
/// channel with the consumer's mask. Channel 0 is enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layers {
    mask: u32,
}

impl Default for Layers {
    fn default() -> Self {
        Self { mask: 1 }
    }
}

impl Layers {
    /// All channels enabled
    pub const ALL: u32 = 0xFFFF_FFFF;

    /// Layers with an explicit mask
    pub fn from_mask(mask: u32) -> Self {
        Self { mask }
    }

    /// Raw mask
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Membership of exactly one channel
    pub fn set(&mut self, channel: u32) {
        self.mask = 1u32.wrapping_shl(channel);
    }

    /// Add a channel
    pub fn enable(&mut self, channel: u32) {
        self.mask |= 1u32.wrapping_shl(channel);
    }

    /// Add every channel
    pub fn enable_all(&mut self) {
        self.mask = Self::ALL;
    }

    /// Flip a channel
    pub fn toggle(&mut self, channel: u32) {
        self.mask ^= 1u32.wrapping_shl(channel);
    }

    /// Remove a channel
    pub fn disable(&mut self, channel: u32) {
        self.mask &= !1u32.wrapping_shl(channel);
    }

    /// Remove every channel
    pub fn disable_all(&mut self) {
        self.mask = 0;
    }

    /// Whether a channel is enabled
    pub fn is_enabled(&self, channel: u32) -> bool {
        self.mask & 1u32.wrapping_shl(channel) != 0
    }

    /// Whether the two masks share a channel
    pub fn test(&self, other: &Layers) -> bool {
        self.mask & other.mask != 0
    }
}

/// A node in the transform hierarchy
///
/// Hierarchy links (`parent`, `children`) are handles into the owning
/// [`crate::scene::SceneGraph`] and can only be changed through it.
#[derive(Debug)]
pub struct Node {
    id: u64,
    /// Globally unique identity; never copied implicitly
    pub uuid: Uuid,
    /// Display name, used by name lookup
    pub name: String,
    /// Concrete kind and its shared collaborators
    pub kind: NodeKind,
    /// Up direction used by `look_at`
    pub up: Vec3,

    /// Local translation
    pub position: Vec3,
    /// Local orientation
    pub quaternion: Quat,
    /// Local scale
    pub scale: Vec3,

    /// Local matrix; stale until `update_matrix` runs
    pub matrix: Mat4,
    /// World matrix; valid after propagation reaches this node
    pub matrix_world: Mat4,

    /// Recompose `matrix` from TRS during propagation
    pub matrix_auto_update: bool,
    /// Include this node (and its subtree) in propagation passes
    pub matrix_world_auto_update: bool,
    /// Set whenever `matrix` changes; cleared when the world matrix is rebuilt
    pub matrix_world_needs_update: bool,

    /// Rendered and visited by visible-only traversal
    pub visible: bool,
    /// Casts shadows
    pub cast_shadow: bool,
    /// Receives shadows
    pub receive_shadow: bool,
    /// Subject to frustum culling
    pub frustum_culled: bool,
    /// Draw ordering hint
    pub render_order: i32,
    /// Channel membership
    pub layers: Layers,
    /// Free-form application data
    pub user_data: Map<String, Value>,
    /// Attached animation clips, shared by reference
    pub animations: Vec<Rc<dyn AnimationClip>>,

    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new(NodeKind::Object3D, &NodeDefaults::default())
    }
}

impl Node {
    /// Create a detached node with a fresh id and uuid
    pub fn new(kind: NodeKind, defaults: &NodeDefaults) -> Self {
        Self {
            id: next_node_id(),
            uuid: Uuid::new_v4(),
            name: String::new(),
            kind,
            up: defaults.default_up,
            position: Vec3::zeros(),
            quaternion: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            matrix: Mat4::identity(),
            matrix_world: Mat4::identity(),
            matrix_auto_update: defaults.matrix_auto_update,
            matrix_world_auto_update: defaults.matrix_world_auto_update,
            matrix_world_needs_update: false,
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            frustum_culled: true,
            render_order: 0,
            layers: Layers::default(),
            user_data: Map::new(),
            animations: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Builder: set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: set the local position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder: set the local orientation
    pub fn with_quaternion(mut self, quaternion: Quat) -> Self {
        self.quaternion = quaternion;
        self
    }

    /// Builder: set the local scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Process-wide construction-order id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Parent handle, `None` for roots
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Child handles in traversal order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Serialized type tag
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Local TRS as a value
    pub fn local_transform(&self) -> Transform {
        Transform::new(self.position, self.quaternion, self.scale)
    }

    /// Recompose the local matrix from TRS and flag the world matrix dirty
    pub fn update_matrix(&mut self) {
        self.matrix = math::compose(&self.position, &self.quaternion, &self.scale);
        self.matrix_world_needs_update = true;
    }

    /// Orientation from an axis (normalized) and angle in radians
    pub fn set_rotation_from_axis_angle(&mut self, axis: &Unit<Vec3>, angle: f32) {
        self.quaternion = Quat::from_axis_angle(axis, angle);
    }

    /// Orientation from Euler angles
    pub fn set_rotation_from_euler(&mut self, euler: &Euler) {
        self.quaternion = euler.to_quaternion();
    }

    /// Orientation from the upper 3x3 of an unscaled rotation matrix
    pub fn set_rotation_from_matrix(&mut self, matrix: &Mat4) {
        self.quaternion = math::rotation_from_matrix(matrix);
    }

    /// Orientation copied from a quaternion
    pub fn set_rotation_from_quaternion(&mut self, quaternion: &Quat) {
        self.quaternion = *quaternion;
    }

    /// Current orientation as Euler angles
    pub fn rotation_euler(&self, order: EulerOrder) -> Euler {
        Euler::from_quaternion(&self.quaternion, order)
    }

    /// Premultiply the local transform by `matrix` and re-derive TRS
    pub fn apply_matrix4(&mut self, matrix: &Mat4) {
        if self.matrix_auto_update {
            self.update_matrix();
        }
        self.matrix = matrix * self.matrix;

        let decomposed = Transform::from_matrix(self.matrix);
        self.position = decomposed.position;
        self.quaternion = decomposed.rotation;
        self.scale = decomposed.scale;
    }

    /// Premultiply the orientation
    pub fn apply_quaternion(&mut self, quaternion: &Quat) {
        self.quaternion = quaternion * self.quaternion;
    }

    /// Rotate around an axis in local space
    pub fn rotate_on_axis(&mut self, axis: &Unit<Vec3>, angle: f32) {
        self.quaternion *= Quat::from_axis_angle(axis, angle);
    }

    /// Rotate around an axis in parent space
    ///
    /// Matches world space only when no ancestor is rotated.
    pub fn rotate_on_world_axis(&mut self, axis: &Unit<Vec3>, angle: f32) {
        self.quaternion = Quat::from_axis_angle(axis, angle) * self.quaternion;
    }

    /// Rotate around local X
    pub fn rotate_x(&mut self, angle: f32) {
        self.rotate_on_axis(&Vec3::x_axis(), angle);
    }

    /// Rotate around local Y
    pub fn rotate_y(&mut self, angle: f32) {
        self.rotate_on_axis(&Vec3::y_axis(), angle);
    }

    /// Rotate around local Z
    pub fn rotate_z(&mut self, angle: f32) {
        self.rotate_on_axis(&Vec3::z_axis(), angle);
    }

    /// Move along an axis expressed in local space
    pub fn translate_on_axis(&mut self, axis: &Unit<Vec3>, distance: f32) {
        self.position += self.quaternion * axis.into_inner() * distance;
    }

    /// Move along local X
    pub fn translate_x(&mut self, distance: f32) {
        self.translate_on_axis(&Vec3::x_axis(), distance);
    }

    /// Move along local Y
    pub fn translate_y(&mut self, distance: f32) {
        self.translate_on_axis(&Vec3::y_axis(), distance);
    }

    /// Move along local Z
    pub fn translate_z(&mut self, distance: f32) {
        self.translate_on_axis(&Vec3::z_axis(), distance);
    }

    /// Named property value for property lookups
    ///
    /// Known scalar fields are matched first (`id`, `uuid`, `name`, `type`,
    /// `visible`, `castShadow`, `receiveShadow`, `frustumCulled`,
    /// `renderOrder`); any other name is looked up in `user_data`.
    pub fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id)),
            "uuid" => Some(Value::from(self.uuid.to_string())),
            "name" => Some(Value::from(self.name.clone())),
            "type" => Some(Value::from(self.type_name())),
            "visible" => Some(Value::from(self.visible)),
            "castShadow" => Some(Value::from(self.cast_shadow)),
            "receiveShadow" => Some(Value::from(self.receive_shadow)),
            "frustumCulled" => Some(Value::from(self.frustum_culled)),
            "renderOrder" => Some(Value::from(self.render_order)),
            other => self.user_data.get(other).cloned(),
        }
    }

    /// Copy everything except identity, kind and hierarchy links from `source`
    ///
    /// The receiver keeps its kind; mesh parts are taken over only when both
    /// nodes are meshes. Shared collaborators are shared, not duplicated.
    pub fn copy_from(&mut self, source: &Node) {
        self.name.clone_from(&source.name);
        if let (NodeKind::Mesh(parts), NodeKind::Mesh(source_parts)) = (&mut self.kind, &source.kind) {
            parts.clone_from(source_parts);
        }
        self.up = source.up;

        self.position = source.position;
        self.quaternion = source.quaternion;
        self.scale = source.scale;

        self.matrix = source.matrix;
        self.matrix_world = source.matrix_world;

        self.matrix_auto_update = source.matrix_auto_update;
        self.matrix_world_auto_update = source.matrix_world_auto_update;
        self.matrix_world_needs_update = source.matrix_world_needs_update;

        self.visible = source.visible;
        self.cast_shadow = source.cast_shadow;
        self.receive_shadow = source.receive_shadow;
        self.frustum_culled = source.frustum_culled;
        self.render_order = source.render_order;
        self.layers = source.layers;
        self.user_data.clone_from(&source.user_data);
        self.animations.clone_from(&source.animations);
    }

    /// Detached copy with a fresh id and uuid
    pub fn duplicate(&self) -> Self {
        let mut copy = Self::new(self.kind.clone(), &NodeDefaults::default());
        copy.copy_from(self);
        copy
    }
}
