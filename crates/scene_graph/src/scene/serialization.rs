//! JSON scene documents
//!
//! A document is a tree literal: children are nested inline under `object`.
//! Shared resources are written once into the `geometries`, `materials` and
//! `animations` side tables and referenced from node records by uuid.
//!
//! ```json
//! {
//!   "metadata": { "version": 4.6, "type": "Object", "generator": "Object3D.toJSON" },
//!   "geometries": [ { "uuid": "…", "type": "BoxGeometry", … } ],
//!   "object": {
//!     "uuid": "…", "type": "Mesh", "matrix": [1, 0, 0, 0, …], "up": [0, 1, 0],
//!     "geometry": "…", "children": []
//!   }
//! }
//! ```
//!
//! Fields at their default value are omitted from node records.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::foundation::collections::NodeKey;
use crate::foundation::math::{Mat4, Transform, Vec3};

use super::error::SceneError;
use super::graph::SceneGraph;
use super::node::{Layers, MeshParts, Node, NodeKind};
use super::resources::ResourceResolver;

/// Document format version written to `metadata.version`
pub const FORMAT_VERSION: f32 = 4.6;

/// Document header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Format version
    pub version: f32,
    /// Document kind; always `"Object"` for node trees
    #[serde(rename = "type")]
    pub kind: String,
    /// Producer tag
    pub generator: String,
}

/// Serialized subtree plus the resources it references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Header
    pub metadata: Metadata,
    /// Geometry records, one per distinct uuid
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometries: Vec<Value>,
    /// Material records, one per distinct uuid
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Value>,
    /// Animation clip records, one per distinct uuid
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<Value>,
    /// Root node record
    pub object: NodeRecord,
}

/// One node and its nested children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Node uuid
    pub uuid: Uuid,
    /// Kind tag, see [`NodeKind::type_name`]
    #[serde(rename = "type")]
    pub kind: String,
    /// Display name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Visibility flag
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub visible: bool,
    /// Shadow casting flag
    #[serde(default, skip_serializing_if = "is_false")]
    pub cast_shadow: bool,
    /// Shadow receiving flag
    #[serde(default, skip_serializing_if = "is_false")]
    pub receive_shadow: bool,
    /// Frustum culling flag
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub frustum_culled: bool,
    /// Draw ordering hint
    #[serde(default, skip_serializing_if = "is_zero")]
    pub render_order: i32,
    /// Channel mask
    #[serde(default, skip_serializing_if = "is_default_layers")]
    pub layers: Layers,
    /// Free-form application data
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub user_data: Map<String, Value>,
    /// Local matrix, column-major
    pub matrix: [f32; 16],
    /// Up vector
    pub up: [f32; 3],
    /// Recompose the local matrix during propagation
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub matrix_auto_update: bool,
    /// Include the node in propagation passes
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub matrix_world_auto_update: bool,
    /// Geometry uuid for mesh nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Uuid>,
    /// Material uuid for mesh nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Uuid>,
    /// Animation clip uuids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<Uuid>,
    /// Nested child records in child order
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

fn is_default_layers(layers: &Layers) -> bool {
    *layers == Layers::default()
}

impl NodeRecord {
    fn from_node(node: &Node) -> Self {
        let mut matrix = [0.0; 16];
        matrix.copy_from_slice(node.matrix.as_slice());
        let mesh = node.kind.as_mesh();

        Self {
            uuid: node.uuid,
            kind: node.type_name().to_string(),
            name: node.name.clone(),
            visible: node.visible,
            cast_shadow: node.cast_shadow,
            receive_shadow: node.receive_shadow,
            frustum_culled: node.frustum_culled,
            render_order: node.render_order,
            layers: node.layers,
            user_data: node.user_data.clone(),
            matrix,
            up: [node.up.x, node.up.y, node.up.z],
            matrix_auto_update: node.matrix_auto_update,
            matrix_world_auto_update: node.matrix_world_auto_update,
            geometry: mesh.map(|parts| parts.geometry.uuid()),
            material: mesh.and_then(|parts| parts.material.as_ref()).map(|m| m.uuid()),
            animations: node.animations.iter().map(|clip| clip.uuid()).collect(),
            children: Vec::new(),
        }
    }
}

/// Side-table writer keeping first-seen order
#[derive(Default)]
struct SideTable {
    seen: HashSet<Uuid>,
    records: Vec<Value>,
}

impl SideTable {
    fn push(&mut self, uuid: Uuid, record: impl FnOnce() -> Value) {
        if self.seen.insert(uuid) {
            self.records.push(record());
        }
    }
}

impl SceneGraph {
    /// Serialize the subtree rooted at `root`
    ///
    /// The stored local matrix is written as-is, so a node whose TRS changed
    /// since its last `update_matrix` serializes its previous transform.
    pub fn to_json(&self, root: NodeKey) -> Result<SceneDocument, SceneError> {
        self.node(root)?;

        let mut geometries = SideTable::default();
        let mut materials = SideTable::default();
        let mut animations = SideTable::default();

        // children are finished before their parent when walking backwards
        let order = self.subtree(root);
        let mut built: HashMap<NodeKey, NodeRecord> = HashMap::with_capacity(order.len());
        for &key in &order {
            let node = &self.nodes[key];
            if let Some(parts) = node.kind.as_mesh() {
                geometries.push(parts.geometry.uuid(), || parts.geometry.to_json());
                if let Some(material) = &parts.material {
                    materials.push(material.uuid(), || material.to_json());
                }
            }
            for clip in &node.animations {
                animations.push(clip.uuid(), || clip.to_json());
            }
        }
        for &key in order.iter().rev() {
            let node = &self.nodes[key];
            let mut record = NodeRecord::from_node(node);
            record.children = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(key, record);
        }

        let object = built.remove(&root).ok_or(SceneError::NodeNotFound(root))?;
        Ok(SceneDocument {
            metadata: Metadata {
                version: FORMAT_VERSION,
                kind: "Object".to_string(),
                generator: self.config().serialization.generator.clone(),
            },
            geometries: geometries.records,
            materials: materials.records,
            animations: animations.records,
            object,
        })
    }

    /// Serialize the subtree rooted at `root` to a JSON string
    ///
    /// Pretty-printed when the graph's serialization config asks for it.
    pub fn to_json_string(&self, root: NodeKey) -> Result<String, SceneError> {
        let document = self.to_json(root)?;
        let text = if self.config().serialization.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(text)
    }

    /// Rebuild a subtree from a document and return its new root
    ///
    /// Uuids are preserved, each local matrix is decomposed back into TRS,
    /// and mesh and clip references are resolved through `resources`. On
    /// failure nothing from the document is left in the graph.
    pub fn load_json(
        &mut self,
        document: &SceneDocument,
        resources: &dyn ResourceResolver,
    ) -> Result<NodeKey, SceneError> {
        let mut root = None;
        match self.load_records(&document.object, resources, &mut root) {
            Ok(key) => {
                debug!("Loaded {} node(s) from document", self.subtree(key).len());
                Ok(key)
            }
            Err(err) => {
                if let Some(partial) = root {
                    self.destroy(partial)?;
                }
                Err(err)
            }
        }
    }

    /// Parse a JSON string and load it with [`SceneGraph::load_json`]
    pub fn load_json_str(
        &mut self,
        text: &str,
        resources: &dyn ResourceResolver,
    ) -> Result<NodeKey, SceneError> {
        let document: SceneDocument = serde_json::from_str(text)?;
        self.load_json(&document, resources)
    }

    fn load_records(
        &mut self,
        object: &NodeRecord,
        resources: &dyn ResourceResolver,
        root: &mut Option<NodeKey>,
    ) -> Result<NodeKey, SceneError> {
        let mut stack: Vec<(&NodeRecord, Option<NodeKey>)> = vec![(object, None)];
        while let Some((record, parent)) = stack.pop() {
            let node = self.node_from_record(record, resources)?;
            let key = self.insert(node);
            match parent {
                Some(parent) => self.add(parent, key)?,
                None => *root = Some(key),
            }
            stack.extend(record.children.iter().rev().map(|child| (child, Some(key))));
        }
        root.ok_or(SceneError::UnknownNodeType(object.kind.clone()))
    }

    fn node_from_record(
        &self,
        record: &NodeRecord,
        resources: &dyn ResourceResolver,
    ) -> Result<Node, SceneError> {
        let kind = match record.kind.as_str() {
            "Mesh" => {
                let uuid = record.geometry.unwrap_or_else(Uuid::nil);
                let geometry = resources
                    .geometry(&uuid)
                    .ok_or(SceneError::MissingResource { kind: "geometry", uuid })?;
                let material = match record.material {
                    Some(uuid) => Some(
                        resources
                            .material(&uuid)
                            .ok_or(SceneError::MissingResource { kind: "material", uuid })?,
                    ),
                    None => None,
                };
                NodeKind::Mesh(MeshParts::new(geometry, material))
            }
            other => NodeKind::from_type_name(other)
                .ok_or_else(|| SceneError::UnknownNodeType(other.to_string()))?,
        };

        let mut node = Node::new(kind, self.node_defaults());
        node.uuid = record.uuid;
        node.name.clone_from(&record.name);
        node.visible = record.visible;
        node.cast_shadow = record.cast_shadow;
        node.receive_shadow = record.receive_shadow;
        node.frustum_culled = record.frustum_culled;
        node.render_order = record.render_order;
        node.layers = record.layers;
        node.user_data.clone_from(&record.user_data);
        node.up = Vec3::from(record.up);
        node.matrix_auto_update = record.matrix_auto_update;
        node.matrix_world_auto_update = record.matrix_world_auto_update;

        node.matrix = Mat4::from_column_slice(&record.matrix);
        let decomposed = Transform::from_matrix(node.matrix);
        node.position = decomposed.position;
        node.quaternion = decomposed.rotation;
        node.scale = decomposed.scale;

        for uuid in &record.animations {
            let clip = resources
                .animation(uuid)
                .ok_or(SceneError::MissingResource { kind: "animation", uuid: *uuid })?;
            node.animations.push(clip);
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::foundation::math::constants::HALF_PI;
    use crate::scene::resources::{BasicMaterial, BoxGeometry, Geometry, Material, ResourceLibrary};
    use approx::assert_relative_eq;
    use serde_json::json;
    use std::rc::Rc;

    fn mesh_scene(graph: &mut SceneGraph) -> (NodeKey, Rc<dyn Geometry>) {
        let geometry: Rc<dyn Geometry> = Rc::new(BoxGeometry::new(1.0, 2.0, 3.0));
        let material: Rc<dyn Material> = Rc::new(BasicMaterial::new("red", [1.0, 0.0, 0.0]));

        let root = graph.create(NodeKind::Group);
        graph[root].name = "root".into();
        for offset in [1.0, -1.0] {
            let parts = MeshParts::new(Rc::clone(&geometry), Some(Rc::clone(&material)));
            let mesh = graph.create(NodeKind::Mesh(parts));
            graph[mesh].position = Vec3::new(offset, 0.0, 0.0);
            graph[mesh].update_matrix();
            graph.add(root, mesh).unwrap();
        }
        (root, geometry)
    }

    #[test]
    fn test_document_header_and_deduplicated_tables() {
        let mut graph = SceneGraph::new();
        let (root, geometry) = mesh_scene(&mut graph);

        let document = graph.to_json(root).unwrap();

        assert_relative_eq!(document.metadata.version, 4.6);
        assert_eq!(document.metadata.kind, "Object");
        assert_eq!(document.metadata.generator, "Object3D.toJSON");
        assert_eq!(document.geometries.len(), 1);
        assert_eq!(document.materials.len(), 1);
        assert_eq!(document.object.children.len(), 2);
        assert_eq!(document.object.children[0].geometry, Some(geometry.uuid()));
        assert_eq!(document.object.children[0].matrix[12], 1.0);
        assert_eq!(document.object.children[1].matrix[12], -1.0);
    }

    #[test]
    fn test_default_fields_are_omitted() {
        let mut graph = SceneGraph::new();
        let node = graph.create(NodeKind::Object3D);
        let value = serde_json::to_value(graph.to_json(node).unwrap()).unwrap();
        let object = &value["object"];

        assert!(object.get("uuid").is_some());
        assert_eq!(object["type"], json!("Object3D"));
        assert_eq!(object["matrix"].as_array().unwrap().len(), 16);
        assert_eq!(object["up"], json!([0.0, 1.0, 0.0]));
        assert_eq!(object["children"], json!([]));
        for omitted in ["visible", "castShadow", "receiveShadow", "userData", "layers", "name"] {
            assert!(object.get(omitted).is_none(), "{omitted} should be omitted");
        }

        graph[node].visible = false;
        graph[node].cast_shadow = true;
        graph[node].layers.enable(3);
        let value = serde_json::to_value(graph.to_json(node).unwrap()).unwrap();
        assert_eq!(value["object"]["visible"], json!(false));
        assert_eq!(value["object"]["castShadow"], json!(true));
        assert_eq!(value["object"]["layers"], json!(9));
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let mut graph = SceneGraph::new();
        let (root, _) = mesh_scene(&mut graph);
        let child = graph[root].children()[0];
        graph[child].user_data.insert("hp".into(), json!(10));
        graph[child].set_rotation_from_axis_angle(&Vec3::z_axis(), HALF_PI);
        graph[child].update_matrix();

        let library = ResourceLibrary::collect(&graph, root);
        let text = graph.to_json_string(root).unwrap();
        let loaded = graph.load_json_str(&text, &library).unwrap();

        assert_ne!(loaded, root);
        assert_eq!(graph[loaded].uuid, graph[root].uuid);
        assert_eq!(graph.to_json(loaded).unwrap(), graph.to_json(root).unwrap());

        let loaded_child = graph[loaded].children()[0];
        assert_relative_eq!(graph[loaded_child].position, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(graph[loaded_child].quaternion.angle(), HALF_PI, epsilon = 1e-5);
    }

    #[test]
    fn test_missing_resource_leaves_graph_untouched() {
        let mut graph = SceneGraph::new();
        let (root, _) = mesh_scene(&mut graph);
        let document = graph.to_json(root).unwrap();
        let before = graph.len();

        let result = graph.load_json(&document, &ResourceLibrary::new());

        assert!(matches!(result, Err(SceneError::MissingResource { kind: "geometry", .. })));
        assert_eq!(graph.len(), before);
    }

    #[test]
    fn test_unknown_type_and_bad_json() {
        let mut graph = SceneGraph::new();
        let node = graph.create(NodeKind::Object3D);
        let mut document = graph.to_json(node).unwrap();
        document.object.kind = "Teapot".into();

        let library = ResourceLibrary::new();
        assert!(matches!(
            graph.load_json(&document, &library),
            Err(SceneError::UnknownNodeType(name)) if name == "Teapot"
        ));
        assert!(matches!(graph.load_json_str("{", &library), Err(SceneError::Json(_))));
    }

    #[test]
    fn test_pretty_flag_and_generator_follow_config() {
        let mut config = GraphConfig::default();
        config.serialization.pretty = true;
        config.serialization.generator = "graph_demo".into();
        let mut graph = SceneGraph::with_config(config);
        let node = graph.create(NodeKind::Object3D);

        let text = graph.to_json_string(node).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("\"generator\": \"graph_demo\""));
    }
}
