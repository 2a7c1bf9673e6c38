/*
 * Spatial Interaction Module
 *
 * Pairwise interaction between creatures, run once per frame over the whole
 * live set. The population is capped (20 by default) so the O(n^2) scans are
 * cheap; these functions must not be fed an unbounded set.
 *
 * Steering (before integration):
 * - Cohesion: move toward the centroid of nearby creatures of similar hue
 * - Separation: push away from creatures that are too close, 1/d^2 weighted
 * - Containment: soft push back into the bounds, double strength at the floor
 * - Wander: a little random jitter
 *
 * Collisions (after integration): overlapping pairs are pushed apart, exchange
 * their velocity along the contact normal when approaching, and feed.
 */

use nannou::prelude::{vec3, Vec3};
use rand::Rng;

use crate::entity::Entity;
use crate::params::{Bounds, SimulationParams};

// Steer toward the centroid of nearby, similarly colored creatures
pub fn cohesion(entities: &[Entity], index: usize, params: &SimulationParams) -> Vec3 {
    let entity = &entities[index];
    let radius_sq = params.perception_radius * params.perception_radius;
    let mut centroid = Vec3::ZERO;
    let mut count = 0;

    for (other_index, other) in entities.iter().enumerate() {
        if other_index == index {
            continue;
        }

        let d_squared = entity.position.distance_squared(other.position);
        if d_squared > radius_sq {
            continue;
        }

        // Only creatures of a similar color flock together
        match entity.hue_distance(other) {
            Some(distance) if distance < params.color_affinity_threshold => {
                centroid += other.position;
                count += 1;
            }
            _ => {}
        }
    }

    if count == 0 {
        return Vec3::ZERO;
    }

    centroid /= count as f32;
    (centroid - entity.position) * params.cohesion_force
}

// Push away from neighbors closer than the separation distance
pub fn separation(entities: &[Entity], index: usize, params: &SimulationParams) -> Vec3 {
    let entity = &entities[index];
    let mut steering = Vec3::ZERO;

    for (other_index, other) in entities.iter().enumerate() {
        if other_index == index {
            continue;
        }

        let diff = entity.position - other.position;
        let d = diff.length();

        // Coincident creatures are left to the collision pass
        if d > 0.0 && d < params.separation_distance {
            // Unit vector away from the neighbor, weighted by 1/d^2
            steering += diff / (d * d * d);
        }
    }

    steering * params.separation_force
}

// Soft push back into the bounds; stronger at the floor
pub fn containment(position: Vec3, bounds: &Bounds, strength: f32) -> Vec3 {
    let mut push = Vec3::ZERO;

    if position.x > bounds.x {
        push.x -= (position.x - bounds.x) * strength;
    } else if position.x < -bounds.x {
        push.x += (-bounds.x - position.x) * strength;
    }

    if position.y > bounds.y {
        push.y -= (position.y - bounds.y) * strength;
    } else if position.y < bounds.floor {
        push.y += (bounds.floor - position.y) * strength * 2.0;
    }

    if position.z > bounds.z {
        push.z -= (position.z - bounds.z) * strength;
    } else if position.z < -bounds.z {
        push.z += (-bounds.z - position.z) * strength;
    }

    push
}

pub fn wander<R: Rng + ?Sized>(rng: &mut R, strength: f32) -> Vec3 {
    if strength <= 0.0 {
        return Vec3::ZERO;
    }
    vec3(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    ) * strength
}

// Combined acceleration for every creature, computed from one snapshot
pub fn steering_forces<R: Rng + ?Sized>(
    entities: &[Entity],
    params: &SimulationParams,
    rng: &mut R,
) -> Vec<Vec3> {
    (0..entities.len())
        .map(|index| {
            let entity = &entities[index];
            if entity.is_tickled {
                return Vec3::ZERO;
            }

            cohesion(entities, index, params)
                + separation(entities, index, params)
                + containment(entity.position, &params.bounds, params.containment_force)
                + wander(rng, params.wander_strength)
        })
        .collect()
}

// Outcome of one contact, in pair order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub first: usize,
    pub second: usize,
    pub overlap: f32,
    pub exchanged: bool,
}

fn pair_mut(entities: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    debug_assert!(i < j);
    let (head, tail) = entities.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

// Separate overlapping pairs and exchange their normal velocities.
// Creatures flagged in `skip` (already expired this frame) take no part.
pub fn resolve_collisions(
    entities: &mut [Entity],
    params: &SimulationParams,
    skip: &[bool],
) -> Vec<Contact> {
    let mut contacts = Vec::new();
    let factor = params.collision_radius_factor;
    let skipped = |index: usize| skip.get(index).copied().unwrap_or(false);

    for i in 0..entities.len() {
        if skipped(i) {
            continue;
        }
        for j in (i + 1)..entities.len() {
            if skipped(j) {
                continue;
            }

            let (a, b) = pair_mut(entities, i, j);
            let reach = a.radius(factor) + b.radius(factor);
            let offset = b.position - a.position;
            let distance = offset.length();

            if distance >= reach {
                continue;
            }

            // Normal from a to b; coincident pairs split along x
            let normal = if distance > f32::EPSILON {
                offset / distance
            } else {
                vec3(1.0, 0.0, 0.0)
            };

            // Push both apart by half the overlap
            let overlap = reach - distance;
            a.position -= normal * (overlap / 2.0);
            b.position += normal * (overlap / 2.0);

            // Exchange normal components only while approaching
            let approaching = (a.velocity - b.velocity).dot(normal) >= 0.0;
            if approaching {
                let a_normal = normal * a.velocity.dot(normal);
                let b_normal = normal * b.velocity.dot(normal);
                a.velocity = a.velocity - a_normal + b_normal;
                b.velocity = b.velocity - b_normal + a_normal;
            }

            if params.feeding_enabled {
                a.feed();
                b.feed();
            }

            contacts.push(Contact {
                first: i,
                second: j,
                overlap,
                exchanged: approaching,
            });
        }
    }

    contacts
}
