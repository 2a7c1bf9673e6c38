use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use critters::asset::GltfSource;
use critters::transport::{ChannelTransport, Transport, TransportEvent};
use critters::{CreatureDescriptor, Environment, ResourceLedger, RotationStyle, SimulationParams};

// One mesh "Body" with two morph targets named through extras
const BLOB_GLTF: &str = r#"{
    "asset": {"version": "2.0"},
    "buffers": [{"byteLength": 36, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"}],
    "bufferViews": [{"buffer": 0, "byteLength": 36}],
    "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [0, 0, 0]}],
    "meshes": [{
        "primitives": [{"attributes": {"POSITION": 0}, "targets": [{"POSITION": 0}, {"POSITION": 0}]}],
        "extras": {"targetNames": ["spiky", "round"]}
    }],
    "nodes": [{"name": "Body", "mesh": 0}],
    "scenes": [{"nodes": [0]}],
    "scene": 0
}"#;

fn asset_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/blob.gltf"), BLOB_GLTF).unwrap();
    dir
}

fn run_until<F>(env: &mut Environment<ResourceLedger>, mut done: F)
where
    F: FnMut(&Environment<ResourceLedger>) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(env) && Instant::now() < deadline {
        env.frame(1.0 / 60.0, Instant::now());
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn descriptor_from_the_panel_becomes_a_flocking_creature() {
    let root = asset_root();
    let mut env = Environment::with_seed(
        SimulationParams::default(),
        Arc::new(GltfSource::new(root.path())),
        ResourceLedger::new(),
        42,
    );
    let mut transport = ChannelTransport::new();

    let descriptor = CreatureDescriptor::new("/assets/blob.gltf")
        .with_color(120.0)
        .with_size(1.2)
        .with_morph("Body", &["spiky", "round"], &[0.9, 0.3]);
    transport.publish(&descriptor).unwrap();

    env.pump_transport(&mut transport, Instant::now());
    run_until(&mut env, |env| env.stats().population == 1);

    let creature = &env.entities()[0];
    assert_eq!(creature.dominant_shape, "spiky");
    assert_eq!(creature.rotation_style, RotationStyle::Spin);
    assert_eq!(creature.meshes[0].influences, vec![0.9, 0.3]);
    assert_eq!(creature.hue, Some(120.0));
    assert_eq!(env.backend().live_materials(), 1);

    // Same path again comes from the cache
    transport.publish(&descriptor).unwrap();
    env.pump_transport(&mut transport, Instant::now());
    env.frame(1.0 / 60.0, Instant::now());
    assert_eq!(env.stats().population, 2);
    assert_eq!(env.stats().cached_assets, 1);
}

#[test]
fn missing_and_malformed_assets_are_reported_not_spawned() {
    let root = asset_root();
    std::fs::write(root.path().join("assets/garbage.glb"), b"not a model").unwrap();
    let mut env = Environment::with_seed(
        SimulationParams::default(),
        Arc::new(GltfSource::new(root.path())),
        ResourceLedger::new(),
        7,
    );

    let now = Instant::now();
    env.handle_event(TransportEvent::Spawn(CreatureDescriptor::new("/assets/missing.glb")), now);
    env.handle_event(TransportEvent::Spawn(CreatureDescriptor::new("/assets/garbage.glb")), now);
    run_until(&mut env, |env| env.stats().failed_total == 2);

    let stats = env.stats();
    assert_eq!(stats.failed_total, 2);
    assert_eq!(stats.population, 0);
    assert_eq!(stats.cached_assets, 0);
}

#[test]
fn short_lived_creatures_expire_and_release_resources() {
    let root = asset_root();
    let params = SimulationParams {
        max_lifespan: 0.5,
        ..SimulationParams::default()
    };
    let mut env = Environment::with_seed(
        params,
        Arc::new(GltfSource::new(root.path())),
        ResourceLedger::new(),
        3,
    );

    env.request_spawn(CreatureDescriptor::new("/assets/blob.gltf"), Instant::now());
    run_until(&mut env, |env| env.stats().spawned_total == 1);
    assert_eq!(env.stats().population, 1);

    for _ in 0..6 {
        env.frame(0.1, Instant::now());
    }
    let stats = env.stats();
    assert_eq!(stats.population, 0);
    assert_eq!(stats.expired_total, 1);
    assert_eq!(env.backend().live_geometry(), 0);
    assert_eq!(env.backend().released().len(), 1);
}

#[test]
fn clear_all_drops_loads_still_in_flight() {
    let root = asset_root();
    let mut env = Environment::with_seed(
        SimulationParams::default(),
        Arc::new(GltfSource::new(root.path())),
        ResourceLedger::new(),
        5,
    );

    env.request_spawn(CreatureDescriptor::new("/assets/blob.gltf"), Instant::now());
    env.clear_all();

    for _ in 0..50 {
        env.frame(1.0 / 60.0, Instant::now());
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(env.stats().population, 0);
    assert_eq!(env.stats().pending_loads, 0);
}
