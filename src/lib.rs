/*
 * Critters - Module Definitions
 *
 * This file defines the module structure of the shared creature environment.
 * The simulation core (descriptor to live creature, population, interaction,
 * lifecycle, frame loop) does not depend on a window; the viewer modules
 * (app, camera, input, renderer, ui) drive it through nannou.
 */

// Re-export key components for easier access
pub use descriptor::CreatureDescriptor;
pub use entity::{Entity, EntityId, RotationStyle};
pub use environment::{Environment, EnvironmentStats};
pub use error::{AssetMalformedError, ConfigError, LoadError, SpawnError, TransportError};
pub use params::SimulationParams;
pub use population::{PopulationStore, RenderBackend, ResourceLedger};
pub use simulation::{SimulationLoop, StepReport};

// Simulation core
pub mod asset;
pub mod descriptor;
pub mod entity;
pub mod environment;
pub mod error;
pub mod factory;
pub mod interaction;
pub mod lifecycle;
pub mod loader;
pub mod notify;
pub mod params;
pub mod population;
pub mod simulation;
pub mod transport;

// Viewer
pub mod app;
pub mod camera;
pub mod debug;
pub mod input;
pub mod renderer;
pub mod ui;
