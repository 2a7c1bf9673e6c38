/*
 * Environment Module
 *
 * The admission boundary of the shared environment. It ties together:
 * - transport events (spawn requests, connection changes)
 * - the asset loader and the entity factory
 * - the population store and the render backend
 * - the simulation loop
 *
 * Descriptors are turned into creatures between frames. Load and asset
 * errors end up in the notification sink and the log; they never stop the
 * frame loop.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::asset::AssetSource;
use crate::descriptor::CreatureDescriptor;
use crate::entity::{Entity, EntityId};
use crate::error::ConfigError;
use crate::factory::EntityFactory;
use crate::loader::{AssetLoader, LoadTicket};
use crate::notify::Notifications;
use crate::params::SimulationParams;
use crate::population::{PopulationStore, RenderBackend};
use crate::simulation::{SimulationLoop, StepReport};
use crate::transport::{Transport, TransportEvent};

// Snapshot for the stats panel
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnvironmentStats {
    pub population: usize,
    pub capacity: usize,
    pub cached_assets: usize,
    pub pending_loads: usize,
    pub paused: bool,
    pub elapsed: f32,
    pub spawned_total: u64,
    pub failed_total: u64,
    pub expired_total: u64,
    pub connected: Option<bool>,
}

pub struct Environment<B: RenderBackend> {
    population: PopulationStore,
    simulation: SimulationLoop,
    loader: AssetLoader,
    factory: EntityFactory,
    backend: B,
    notifications: Notifications,
    spawned_total: u64,
    failed_total: u64,
    expired_total: u64,
    connected: Option<bool>,
}

impl<B: RenderBackend> Environment<B> {
    pub fn new(params: SimulationParams, source: Arc<dyn AssetSource>, backend: B) -> Self {
        let factory = EntityFactory::new();
        let simulation = SimulationLoop::new(params);
        Self::assemble(simulation, factory, source, backend)
    }

    // Reproducible environment: placement, wander and ids all come from the seed
    pub fn with_seed(params: SimulationParams, source: Arc<dyn AssetSource>, backend: B, seed: u64) -> Self {
        let factory = EntityFactory::with_seed(seed);
        let simulation = SimulationLoop::with_seed(params, seed.wrapping_add(1));
        Self::assemble(simulation, factory, source, backend)
    }

    fn assemble(simulation: SimulationLoop, factory: EntityFactory, source: Arc<dyn AssetSource>, backend: B) -> Self {
        let params = simulation.params();
        let loader = AssetLoader::new(source, params.asset_cache_capacity, params.load_timeout());
        let population = PopulationStore::new(params.max_models);
        Self {
            population,
            simulation,
            loader,
            factory,
            backend,
            notifications: Notifications::new(),
            spawned_total: 0,
            failed_total: 0,
            expired_total: 0,
            connected: None,
        }
    }

    // React to one transport event
    pub fn handle_event(&mut self, event: TransportEvent, now: Instant) {
        match event {
            TransportEvent::Spawn(descriptor) => {
                self.request_spawn(descriptor, now);
            }
            TransportEvent::Connected => {
                self.connected = Some(true);
                self.notifications.info("Connected to relay");
            }
            TransportEvent::Disconnected => {
                self.connected = Some(false);
                self.notifications.warning("Disconnected from relay");
            }
            TransportEvent::Error(message) => {
                warn!("Transport error: {}", message);
                self.notifications.error(format!("Transport error: {}", message));
            }
        }
    }

    // Handle every event the transport has queued; returns how many there were
    pub fn pump_transport(&mut self, transport: &mut dyn Transport, now: Instant) -> usize {
        let events = transport.poll();
        let count = events.len();
        for event in events {
            self.handle_event(event, now);
        }
        count
    }

    pub fn request_spawn(&mut self, descriptor: CreatureDescriptor, now: Instant) -> LoadTicket {
        info!("Spawn requested for {}", descriptor.model_path);
        self.loader.request(descriptor, now)
    }

    // Turn finished loads into creatures; returns the ids admitted
    pub fn admit_ready(&mut self, now: Instant) -> Vec<EntityId> {
        let mut admitted = Vec::new();

        for outcome in self.loader.poll(now) {
            let asset = match outcome.result {
                Ok(asset) => asset,
                Err(err) => {
                    error!("Could not spawn {}: {}", outcome.descriptor.model_path, err);
                    self.failed_total += 1;
                    self.notifications.error(format!("Could not load {}", err.path()));
                    continue;
                }
            };

            let occupied: Vec<_> = self.population.iter().map(|entity| entity.position).collect();
            let entity = self
                .factory
                .build(&outcome.descriptor, &asset, &occupied, self.simulation.params());
            let id = entity.id;

            if let Some(evicted) = self.population.admit(entity, &mut self.backend) {
                self.notifications.info(format!("Oldest creature {} left to make room", evicted));
            }
            info!("Creature {} spawned from {}", id, outcome.descriptor.model_path);
            self.notifications.success("New creature spawned");
            self.spawned_total += 1;
            admitted.push(id);
        }

        admitted
    }

    // One frame: admit what finished loading, then advance the simulation
    pub fn frame(&mut self, dt: f32, now: Instant) -> StepReport {
        self.admit_ready(now);
        let report = self.simulation.step(&mut self.population, &mut self.backend, dt);
        self.expired_total += report.expired.len() as u64;
        self.notifications.tick(Duration::from_secs_f32(dt.max(0.0)));
        report
    }

    // Release every creature; loads already in flight will not spawn
    pub fn clear_all(&mut self) -> usize {
        let released = self.population.clear(&mut self.backend);
        self.loader.discard_pending();
        info!("Cleared {} creatures", released);
        self.notifications.info(format!("Cleared {} creatures", released));
        released
    }

    pub fn toggle_pause(&mut self) -> bool {
        let paused = self.simulation.toggle_pause();
        info!("Simulation {}", if paused { "paused" } else { "resumed" });
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.simulation.is_paused()
    }

    // Make a creature shiver; false if it is gone
    pub fn tickle(&mut self, id: EntityId) -> bool {
        let duration = self.simulation.params().tickle_duration;
        match self.population.get_mut(id) {
            Some(entity) => {
                entity.tickle(duration);
                true
            }
            None => false,
        }
    }

    pub fn params(&self) -> &SimulationParams {
        self.simulation.params()
    }

    // Apply new parameters everywhere they matter
    pub fn set_params(&mut self, params: SimulationParams) -> Result<(), ConfigError> {
        params.validate()?;

        let evicted = self.population.set_capacity(params.max_models, &mut self.backend);
        if evicted > 0 {
            info!("Capacity lowered to {}, evicted {} creatures", params.max_models, evicted);
        }
        self.loader.set_timeout(params.load_timeout());
        self.loader.set_cache_capacity(params.asset_cache_capacity);
        self.simulation.set_params(params);
        Ok(())
    }

    pub fn stats(&self) -> EnvironmentStats {
        EnvironmentStats {
            population: self.population.len(),
            capacity: self.population.capacity(),
            cached_assets: self.loader.cached_assets(),
            pending_loads: self.loader.pending_loads(),
            paused: self.simulation.is_paused(),
            elapsed: self.simulation.elapsed(),
            spawned_total: self.spawned_total,
            failed_total: self.failed_total,
            expired_total: self.expired_total,
            connected: self.connected,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        self.population.as_slice()
    }

    pub fn population(&self) -> &PopulationStore {
        &self.population
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }
}
