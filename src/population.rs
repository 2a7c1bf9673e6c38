/*
 * Population Module
 *
 * The PopulationStore is the bounded, insertion-ordered set of live
 * creatures. Admitting into a full store evicts the oldest creature first.
 * Whatever leaves the store (eviction, expiry, clear) is moved into the
 * render backend's `release`, so resources are released exactly once.
 */

use log::{debug, info};

use crate::entity::{Entity, EntityId, GeometryHandle, MaterialHandle};

// The renderer side of a creature: attach when admitted, release on exit
pub trait RenderBackend {
    fn attach(&mut self, entity: &Entity);
    fn release(&mut self, entity: Entity);
}

// Backend without a display: tracks which resources are live
#[derive(Debug, Default)]
pub struct ResourceLedger {
    live_geometry: Vec<GeometryHandle>,
    live_materials: Vec<MaterialHandle>,
    released: Vec<EntityId>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_geometry(&self) -> usize {
        self.live_geometry.len()
    }

    pub fn live_materials(&self) -> usize {
        self.live_materials.len()
    }

    // Release order, oldest first
    pub fn released(&self) -> &[EntityId] {
        &self.released
    }
}

impl RenderBackend for ResourceLedger {
    fn attach(&mut self, entity: &Entity) {
        self.live_geometry.extend(entity.meshes.iter().map(|mesh| mesh.geometry));
        self.live_materials.push(entity.material.handle);
    }

    fn release(&mut self, entity: Entity) {
        for mesh in &entity.meshes {
            if let Some(index) = self.live_geometry.iter().position(|g| *g == mesh.geometry) {
                self.live_geometry.swap_remove(index);
            }
        }
        if let Some(index) = self
            .live_materials
            .iter()
            .position(|m| *m == entity.material.handle)
        {
            self.live_materials.swap_remove(index);
        }
        self.released.push(entity.id);
    }
}

pub struct PopulationStore {
    entities: Vec<Entity>,
    capacity: usize,
}

impl PopulationStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entities: Vec::with_capacity(capacity),
            capacity,
        }
    }

    // Append a creature, evicting the oldest first when full; returns the evicted id
    pub fn admit<B: RenderBackend + ?Sized>(&mut self, entity: Entity, backend: &mut B) -> Option<EntityId> {
        let evicted = if self.entities.len() >= self.capacity {
            let oldest = self.entities.remove(0);
            let id = oldest.id;
            info!("Population full, evicting oldest creature {}", id);
            backend.release(oldest);
            Some(id)
        } else {
            None
        };

        backend.attach(&entity);
        debug!("Admitted creature {} ({} live)", entity.id, self.entities.len() + 1);
        self.entities.push(entity);
        evicted
    }

    // Remove a specific creature; false if it is not here
    pub fn remove<B: RenderBackend + ?Sized>(&mut self, id: EntityId, backend: &mut B) -> bool {
        match self.entities.iter().position(|entity| entity.id == id) {
            Some(index) => {
                let entity = self.entities.remove(index);
                backend.release(entity);
                true
            }
            None => false,
        }
    }

    // Evict everything; returns how many creatures were released
    pub fn clear<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let count = self.entities.len();
        for entity in self.entities.drain(..) {
            backend.release(entity);
        }
        count
    }

    // Change capacity, evicting oldest creatures that no longer fit
    pub fn set_capacity<B: RenderBackend + ?Sized>(&mut self, capacity: usize, backend: &mut B) -> usize {
        self.capacity = capacity.max(1);
        let excess = self.entities.len().saturating_sub(self.capacity);
        for entity in self.entities.drain(..excess) {
            backend.release(entity);
        }
        excess
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.iter().any(|entity| entity.id == id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|entity| entity.id).collect()
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub fn as_mut_slice(&mut self) -> &mut [Entity] {
        &mut self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Material, MeshBinding};
    use nannou::prelude::Vec3;

    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
    }

    impl RenderBackend for EventLog {
        fn attach(&mut self, entity: &Entity) {
            self.events.push(format!("attach {}", entity.id.salt));
        }

        fn release(&mut self, entity: Entity) {
            self.events.push(format!("release {}", entity.id.salt));
        }
    }

    fn creature(n: u32) -> Entity {
        let id = EntityId {
            created_ms: n as u64,
            salt: n,
        };
        let mut entity = Entity::new(id, Vec3::ZERO, 1.0, 180.0);
        entity.meshes.push(MeshBinding {
            name: "Body".into(),
            geometry: GeometryHandle(n as u64),
            target_names: vec![],
            influences: vec![],
        });
        entity.material = Material {
            handle: MaterialHandle(n as u64),
            matcap: String::new(),
            tint: None,
        };
        entity
    }

    #[test]
    fn admission_never_exceeds_capacity() {
        let mut store = PopulationStore::new(3);
        let mut ledger = ResourceLedger::new();
        for n in 0..10 {
            store.admit(creature(n), &mut ledger);
            assert!(store.len() <= 3);
        }
        assert_eq!(ledger.live_materials(), 3);
        assert_eq!(ledger.live_geometry(), 3);
    }

    #[test]
    fn eviction_releases_before_attaching() {
        let mut store = PopulationStore::new(2);
        let mut log = EventLog::default();
        store.admit(creature(1), &mut log);
        store.admit(creature(2), &mut log);
        let evicted = store.admit(creature(3), &mut log);

        assert_eq!(evicted.map(|id| id.salt), Some(1));
        assert_eq!(
            log.events,
            vec!["attach 1", "attach 2", "release 1", "attach 3"]
        );
    }

    #[test]
    fn remove_is_a_noop_for_unknown_ids() {
        let mut store = PopulationStore::new(4);
        let mut ledger = ResourceLedger::new();
        store.admit(creature(1), &mut ledger);

        assert!(!store.remove(creature(9).id, &mut ledger));
        assert!(store.remove(creature(1).id, &mut ledger));
        assert!(!store.remove(creature(1).id, &mut ledger));
        assert_eq!(ledger.released().len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn clear_releases_everything_once() {
        let mut store = PopulationStore::new(5);
        let mut ledger = ResourceLedger::new();
        for n in 0..4 {
            store.admit(creature(n), &mut ledger);
        }
        assert_eq!(store.clear(&mut ledger), 4);
        assert_eq!(store.clear(&mut ledger), 0);
        assert_eq!(ledger.released().len(), 4);
        assert_eq!(ledger.live_materials(), 0);
    }

    #[test]
    fn shrinking_capacity_evicts_oldest() {
        let mut store = PopulationStore::new(5);
        let mut ledger = ResourceLedger::new();
        for n in 0..5 {
            store.admit(creature(n), &mut ledger);
        }
        assert_eq!(store.set_capacity(2, &mut ledger), 3);
        let remaining: Vec<u32> = store.ids().iter().map(|id| id.salt).collect();
        assert_eq!(remaining, vec![3, 4]);
    }
}
