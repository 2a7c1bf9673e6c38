/*
 * Simulation Loop Module
 *
 * One frame of the shared environment, in a fixed order:
 * 1. Steering forces from one snapshot of the live set
 * 2. Integration with the speed clamp (tickled creatures shiver instead)
 * 3. Rotation style for each creature's dominant shape
 * 4. Aging, collecting the expired
 * 5. Collisions between the survivors
 * 6. Batch removal of the expired from the population
 */

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::entity::EntityId;
use crate::interaction::{resolve_collisions, steering_forces};
use crate::lifecycle::LifecycleClock;
use crate::params::SimulationParams;
use crate::population::{PopulationStore, RenderBackend};

// What happened during one step
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StepReport {
    pub expired: Vec<EntityId>,
    pub collisions: usize,
}

pub struct SimulationLoop {
    params: SimulationParams,
    elapsed: f32,
    paused: bool,
    rng: StdRng,
}

impl SimulationLoop {
    pub fn new(params: SimulationParams) -> Self {
        Self::with_rng(params, StdRng::from_entropy())
    }

    // Deterministic loop for tests and benchmarks
    pub fn with_seed(params: SimulationParams, seed: u64) -> Self {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    fn with_rng(params: SimulationParams, rng: StdRng) -> Self {
        Self {
            params,
            elapsed: 0.0,
            paused: false,
            rng,
        }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn set_params(&mut self, params: SimulationParams) {
        self.params = params;
    }

    // Seconds of simulated time, paused frames excluded
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    // Advance the whole population by dt seconds
    pub fn step<B: RenderBackend + ?Sized>(
        &mut self,
        population: &mut PopulationStore,
        backend: &mut B,
        dt: f32,
    ) -> StepReport {
        if self.paused || dt <= 0.0 {
            return StepReport::default();
        }

        self.elapsed += dt;
        if population.is_empty() {
            return StepReport::default();
        }

        let params = &self.params;
        let rng = &mut self.rng;
        let entities = population.as_mut_slice();

        // Forces
        let forces = steering_forces(entities, params, rng);

        // Integration
        for (entity, force) in entities.iter_mut().zip(forces) {
            if entity.is_tickled {
                entity.shiver(dt, params.tickle_jitter, rng);
                continue;
            }
            entity.apply_force(force);
            entity.integrate(dt, params.min_speed, params.max_speed, rng);
        }

        // Rotation
        for entity in entities.iter_mut() {
            entity.advance_rotation(self.elapsed);
        }

        // Aging
        let expired_mask = LifecycleClock::age_all(entities, dt);

        // Collisions
        let contacts = resolve_collisions(entities, params, &expired_mask);

        // Removal
        let expired = LifecycleClock::expired_ids(entities, &expired_mask);
        for id in &expired {
            if population.remove(*id, backend) {
                info!("Creature {} reached the end of its lifespan", id);
            }
        }

        StepReport {
            expired,
            collisions: contacts.len(),
        }
    }
}
