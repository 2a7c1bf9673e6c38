/*
 * Lifecycle Module
 *
 * Creatures age every frame: the lifespan counts down, the scale shrinks in
 * proportion, and a creature at zero lifespan is marked for removal. Removal
 * itself is batched after the frame so the collision pass never sees a
 * half-removed population.
 */

use crate::entity::{Entity, EntityId};

#[derive(Debug, Default, Clone, Copy)]
pub struct LifecycleClock;

impl LifecycleClock {
    // Age every creature by dt; the mask marks the expired ones
    pub fn age_all(entities: &mut [Entity], dt: f32) -> Vec<bool> {
        entities.iter_mut().map(|entity| entity.age(dt)).collect()
    }

    // Ids of the creatures flagged in `expired`, in population order
    pub fn expired_ids(entities: &[Entity], expired: &[bool]) -> Vec<EntityId> {
        entities
            .iter()
            .zip(expired)
            .filter(|(_, &gone)| gone)
            .map(|(entity, _)| entity.id)
            .collect()
    }
}
