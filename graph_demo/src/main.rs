//! Scene graph demo
//!
//! Builds a small turret rig, propagates it, moves the camera between
//! parents with `attach`, picks with a ray and prints the rig as JSON.
//!
//! Usage: `graph_demo [config.toml|config.ron]`

use std::rc::Rc;

use scene_graph::config::ConfigError;
use scene_graph::foundation::logging;
use scene_graph::foundation::math::constants::HALF_PI;
use scene_graph::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

struct Rig {
    root: NodeKey,
    turret: NodeKey,
    barrel: NodeKey,
    camera: NodeKey,
    target: NodeKey,
}

fn load_config() -> Result<GraphConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading graph config from {}", path);
            Ok(GraphConfig::load_from_file(&path)?)
        }
        None => Ok(GraphConfig::default()),
    }
}

fn build_rig(graph: &mut SceneGraph) -> Result<Rig, DemoError> {
    let hull: Rc<dyn Geometry> = Rc::new(BoxGeometry::new(2.0, 1.0, 3.0));
    let crate_box: Rc<dyn Geometry> = Rc::new(BoxGeometry::new(1.0, 1.0, 1.0));
    let steel: Rc<dyn Material> = Rc::new(BasicMaterial::new("steel", [0.6, 0.6, 0.65]));

    let root = graph.create(NodeKind::Group);
    graph[root].name = "world".into();

    let turret = graph.create(NodeKind::Mesh(MeshParts::new(hull, Some(Rc::clone(&steel)))));
    graph[turret].name = "turret".into();
    graph[turret].position = Vec3::new(0.0, 0.5, 0.0);

    let barrel = graph.create(NodeKind::Object3D);
    graph[barrel].name = "barrel".into();
    graph[barrel].position = Vec3::new(0.0, 0.25, -2.0);

    let camera = graph.create(NodeKind::Camera);
    graph[camera].name = "camera".into();
    graph[camera].position = Vec3::new(0.0, 3.0, 8.0);

    let target = graph.create(NodeKind::Mesh(MeshParts::new(crate_box, Some(steel))));
    graph[target].name = "target".into();
    graph[target].position = Vec3::new(6.0, 0.5, -6.0);

    graph.add_all(root, &[turret, camera, target])?;
    graph.add(turret, barrel)?;

    Ok(Rig { root, turret, barrel, camera, target })
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    let mut graph = SceneGraph::with_config(config);

    graph.events().register_handler(EventType::ChildAdded, |event| {
        log::debug!("{:?} gained child {:?}", event.target, event.related);
    });

    let rig = build_rig(&mut graph)?;
    graph.update_matrix_world(rig.root, false)?;
    log::info!("Built rig with {} nodes", graph.subtree(rig.root).len());

    // swing the turret toward the target
    graph[rig.turret].rotate_y(-HALF_PI / 2.0);
    graph.update_matrix_world(rig.root, false)?;
    let muzzle = graph.world_position(rig.barrel)?;
    let aim = graph.world_direction(rig.barrel)?;
    log::info!("Muzzle at {:?} aiming {:?}", muzzle, aim);

    // ride along: keep the camera where it is but parent it to the turret
    let before = graph.world_position(rig.camera)?;
    graph.attach(rig.turret, rig.camera)?;
    let after = graph.world_position(rig.camera)?;
    log::info!("Camera attached to turret; world position {:?} -> {:?}", before, after);

    let target_position = graph.world_position(rig.target)?;
    graph.look_at(rig.camera, &target_position)?;
    graph.update_matrix_world(rig.root, false)?;

    let raycaster = Raycaster::new(Ray::new(muzzle, aim));
    for hit in graph.raycast(rig.root, &raycaster, true)? {
        log::info!(
            "Ray hit '{}' at {:?} (distance {:.3})",
            graph[hit.object].name,
            hit.point,
            hit.distance
        );
    }

    println!("{}", graph.to_json_string(rig.root)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    log::info!("Starting scene graph demo");

    match run() {
        Ok(()) => {
            log::info!("Scene graph demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Scene graph demo failed: {:?}", e);
            Err(e.into())
        }
    }
}
