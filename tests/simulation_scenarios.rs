use critters::entity::{Entity, EntityId};
use critters::interaction::resolve_collisions;
use critters::population::{PopulationStore, ResourceLedger};
use critters::{SimulationLoop, SimulationParams};
use nannou::prelude::{vec3, Vec3};

fn creature(n: u32, position: Vec3, hue: Option<f32>) -> Entity {
    let id = EntityId {
        created_ms: 1_000 + n as u64,
        salt: n,
    };
    let mut entity = Entity::new(id, position, 1.0, 180.0);
    entity.hue = hue;
    entity
}

fn calm_params() -> SimulationParams {
    SimulationParams {
        wander_strength: 0.0,
        min_speed: 0.0,
        ..SimulationParams::default()
    }
}

#[test]
fn twenty_five_admissions_keep_the_newest_twenty() {
    let mut store = PopulationStore::new(20);
    let mut ledger = ResourceLedger::new();

    for n in 0..25 {
        store.admit(creature(n, Vec3::ZERO, None), &mut ledger);
        assert!(store.len() <= 20);
    }

    let kept: Vec<u32> = store.ids().iter().map(|id| id.salt).collect();
    assert_eq!(kept, (5..25).collect::<Vec<u32>>());
    let released: Vec<u32> = ledger.released().iter().map(|id| id.salt).collect();
    assert_eq!(released, vec![0, 1, 2, 3, 4]);
}

#[test]
fn similar_hues_drift_together_contrasting_hues_do_not() {
    for (hue_b, should_close) in [(20.0, true), (200.0, false)] {
        let mut sim = SimulationLoop::with_seed(calm_params(), 1);
        let mut store = PopulationStore::new(20);
        let mut ledger = ResourceLedger::new();

        let mut a = creature(1, vec3(0.0, 2.0, 0.0), Some(10.0));
        let mut b = creature(2, vec3(2.0, 2.0, 0.0), Some(hue_b));
        a.scale = 0.5;
        b.scale = 0.5;
        store.admit(a, &mut ledger);
        store.admit(b, &mut ledger);

        for _ in 0..10 {
            sim.step(&mut store, &mut ledger, 1.0 / 60.0);
        }

        let entities = store.as_slice();
        let distance = entities[0].position.distance(entities[1].position);
        if should_close {
            assert!(distance < 2.0, "hue {} stayed at {}", hue_b, distance);
        } else {
            assert!((distance - 2.0).abs() < 1e-5, "hue {} moved to {}", hue_b, distance);
        }
    }
}

#[test]
fn contact_at_distance_one_separates_swaps_and_feeds() {
    let params = SimulationParams::default();
    let mut entities = vec![
        creature(1, vec3(0.0, 2.0, 0.0), None),
        creature(2, vec3(1.0, 2.0, 0.0), None),
    ];
    entities[0].velocity = vec3(1.0, 0.0, 0.0);
    entities[1].velocity = vec3(-0.5, 0.0, 0.0);
    entities[0].lifespan = 30.0;
    entities[1].lifespan = 90.0;

    let contacts = resolve_collisions(&mut entities, &params, &[]);
    assert_eq!(contacts.len(), 1);

    assert!((entities[0].position.x + 0.4).abs() < 1e-5);
    assert!((entities[1].position.x - 1.4).abs() < 1e-5);
    assert!((entities[0].velocity.x + 0.5).abs() < 1e-6);
    assert!((entities[1].velocity.x - 1.0).abs() < 1e-6);
    assert_eq!(entities[0].lifespan, 180.0);
    assert_eq!(entities[1].lifespan, 180.0);
}

#[test]
fn lifespan_only_falls_until_a_contact() {
    let mut sim = SimulationLoop::with_seed(calm_params(), 2);
    let mut store = PopulationStore::new(20);
    let mut ledger = ResourceLedger::new();

    let mut a = creature(1, vec3(-3.0, 2.0, 0.0), None);
    let mut b = creature(2, vec3(3.0, 2.0, 0.0), None);
    a.velocity = vec3(1.5, 0.0, 0.0);
    b.velocity = vec3(-1.5, 0.0, 0.0);
    store.admit(a, &mut ledger);
    store.admit(b, &mut ledger);

    let mut previous = 180.0;
    let mut fed = false;
    for _ in 0..240 {
        let report = sim.step(&mut store, &mut ledger, 1.0 / 60.0);
        let lifespan = store.as_slice()[0].lifespan;
        if report.collisions > 0 {
            assert_eq!(lifespan, 180.0);
            fed = true;
        } else {
            assert!(lifespan < previous);
        }
        previous = lifespan;
    }
    assert!(fed, "the pair never met");
}

#[test]
fn nearly_spent_creature_is_gone_after_one_frame() {
    let mut sim = SimulationLoop::with_seed(SimulationParams::default(), 3);
    let mut store = PopulationStore::new(20);
    let mut ledger = ResourceLedger::new();

    let mut dying = creature(1, vec3(0.0, 2.0, 0.0), None);
    dying.lifespan = 0.001;
    let id = dying.id;
    store.admit(dying, &mut ledger);

    let report = sim.step(&mut store, &mut ledger, 0.1);
    assert_eq!(report.expired, vec![id]);
    assert!(!store.contains(id));
    assert_eq!(ledger.released(), &[id]);
}

#[test]
fn isolated_pair_conserves_normal_momentum() {
    let params = SimulationParams::default();
    let mut entities = vec![
        creature(1, vec3(0.0, 2.0, 0.0), None),
        creature(2, vec3(0.6, 2.8, 0.0), None),
    ];
    entities[0].velocity = vec3(0.9, 0.7, 0.1);
    entities[1].velocity = vec3(-0.2, -0.4, 0.3);
    let before = entities[0].velocity + entities[1].velocity;

    resolve_collisions(&mut entities, &params, &[]);
    let after = entities[0].velocity + entities[1].velocity;
    assert!((before - after).length() < 1e-5);
}
