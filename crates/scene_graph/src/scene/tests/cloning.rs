//! Clones and copies compared through their serialized form

use std::rc::Rc;

use serde_json::json;

use crate::foundation::collections::NodeKey;
use crate::foundation::math::Vec3;
use crate::scene::resources::{BasicMaterial, BoxGeometry, Geometry, Material, NamedClip};
use crate::scene::{MeshParts, NodeKind, SceneGraph};

fn build_ship(graph: &mut SceneGraph) -> NodeKey {
    let hull: Rc<dyn Geometry> = Rc::new(BoxGeometry::new(4.0, 1.0, 8.0));
    let paint: Rc<dyn Material> = Rc::new(BasicMaterial::new("paint", [0.2, 0.3, 0.9]));

    let ship = graph.create(NodeKind::Group);
    graph[ship].name = "ship".into();
    graph[ship].animations.push(Rc::new(NamedClip::new("bob", 2.0)));

    let body = graph.create(NodeKind::Mesh(MeshParts::new(Rc::clone(&hull), Some(Rc::clone(&paint)))));
    graph[body].cast_shadow = true;
    graph[body].user_data.insert("armor".into(), json!(40));

    let light = graph.create(NodeKind::Light);
    graph[light].position = Vec3::new(0.0, 2.0, 3.0);
    graph[light].layers.enable(4);

    graph.add(ship, body).unwrap();
    graph.add(body, light).unwrap();
    graph.update_matrix_world(ship, false).unwrap();
    ship
}

#[test]
fn test_recursive_clone_serializes_identically_apart_from_uuids() {
    let mut graph = SceneGraph::new();
    let ship = build_ship(&mut graph);

    let copy = graph.clone_node(ship, true).unwrap();

    let originals = graph.subtree(ship);
    let clones = graph.subtree(copy);
    assert_eq!(originals.len(), clones.len());
    for (&original, &clone) in originals.iter().zip(&clones) {
        assert_ne!(graph[clone].uuid, graph[original].uuid);
        graph[clone].uuid = graph[original].uuid;
    }

    let expected = graph.to_json(ship).unwrap();
    let actual = graph.to_json(copy).unwrap();
    assert_eq!(actual.object, expected.object);
    assert_eq!(actual.geometries, expected.geometries);
    assert_eq!(actual.animations, expected.animations);
}

#[test]
fn test_original_and_clone_share_side_table_entries() {
    let mut graph = SceneGraph::new();
    let ship = build_ship(&mut graph);
    let fleet = graph.create(NodeKind::Group);
    let copy = graph.clone_node(ship, true).unwrap();
    graph.add_all(fleet, &[ship, copy]).unwrap();

    let document = graph.to_json(fleet).unwrap();

    assert_eq!(document.geometries.len(), 1);
    assert_eq!(document.materials.len(), 1);
    assert_eq!(document.animations.len(), 1);
    assert_eq!(document.object.children.len(), 2);
}

#[test]
fn test_copy_into_existing_node_keeps_its_place() {
    let mut graph = SceneGraph::new();
    let ship = build_ship(&mut graph);
    let hangar = graph.create(NodeKind::Group);
    let slot = graph.create(NodeKind::Group);
    graph.add(hangar, slot).unwrap();
    let slot_uuid = graph[slot].uuid;

    graph.copy_node(slot, ship, true).unwrap();

    assert_eq!(graph[slot].parent(), Some(hangar));
    assert_eq!(graph[slot].uuid, slot_uuid);
    assert_eq!(graph[slot].name, "ship");

    let mut copied = graph.to_json(slot).unwrap().object;
    let original = graph.to_json(ship).unwrap().object;
    assert_eq!(copied.children.len(), 1);
    assert_eq!(copied.children[0].user_data, original.children[0].user_data);
    assert_eq!(copied.children[0].children[0].layers, original.children[0].children[0].layers);

    copied.uuid = original.uuid;
    copied.children = original.children.clone();
    assert_eq!(copied, original);
}

#[test]
fn test_copy_across_kinds_keeps_receiver_type() {
    let mut graph = SceneGraph::new();
    let ship = build_ship(&mut graph);
    let body = graph[ship].children()[0];
    let camera = graph.create(NodeKind::Camera);

    graph.copy_node(camera, body, false).unwrap();

    assert_eq!(graph[camera].type_name(), "Camera");
    assert!(graph[camera].cast_shadow);
    assert_eq!(graph[camera].user_data, graph[body].user_data);
    assert!(graph[camera].children().is_empty());
}
