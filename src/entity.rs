/*
 * Entity Module
 *
 * This module defines the Entity struct: one live creature in the shared
 * environment. It carries its motion state (position, velocity,
 * acceleration, rotation), its render bindings (one geometry per mesh, one
 * material of its own), its morph blend and the rotation style derived from
 * it, and its lifecycle state (lifespan countdown, tickle response).
 */

use std::time::{SystemTime, UNIX_EPOCH};

use nannou::color::Hsl;
use nannou::prelude::{vec3, Vec3};
use rand::Rng;

use crate::params::SimulationParams;

// Creation timestamp plus a random tie-break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub created_ms: u64,
    pub salt: u32,
}

impl EntityId {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let created_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            created_ms,
            salt: rng.gen(),
        }
    }

    // Per-entity offset for periodic motion so identical shapes drift apart
    pub fn phase(&self) -> f32 {
        let seconds = (self.created_ms % 3_600_000) as f32 / 1000.0;
        seconds + self.salt as f32 / u32::MAX as f32 * std::f32::consts::TAU
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:08x}", self.created_ms, self.salt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

// Per-entity material: a clone of the shared matcap base, optionally tinted
#[derive(Debug, Clone)]
pub struct Material {
    pub handle: MaterialHandle,
    pub matcap: String,
    pub tint: Option<Hsl>,
}

// One mesh of the creature with its applied morph blend
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBinding {
    pub name: String,
    pub geometry: GeometryHandle,
    pub target_names: Vec<String>,
    pub influences: Vec<f32>,
}

// Rotation pattern picked from the dominant morph target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStyle {
    Spin,
    Wobble,
    Sway,
    Tumble,
    Corkscrew,
    Pulse,
    Drift,
}

impl RotationStyle {
    pub const DEFAULT_SHAPE: &'static str = "default";

    pub fn for_shape(shape: &str) -> Self {
        match shape.to_ascii_lowercase().as_str() {
            "spiky" => RotationStyle::Spin,
            "round" => RotationStyle::Wobble,
            "tall" => RotationStyle::Sway,
            "flat" => RotationStyle::Tumble,
            "twisted" => RotationStyle::Corkscrew,
            "lumpy" => RotationStyle::Pulse,
            _ => RotationStyle::Drift,
        }
    }

    // Rotation applied this frame; `t` is elapsed simulation time
    pub fn advance(self, rotation: &mut Vec3, t: f32, phase: f32) {
        let beat = (t + phase).sin();
        match self {
            RotationStyle::Spin => {
                rotation.y += 0.02 * (1.0 + 0.3 * beat);
            }
            RotationStyle::Wobble => {
                rotation.x += (t * 2.0 + phase).sin() * 0.01;
                rotation.z += (t * 2.0 + phase).cos() * 0.01;
            }
            RotationStyle::Sway => {
                rotation.z = beat * 0.3;
                rotation.y += 0.003 * (1.0 + 0.5 * (t * 0.5 + phase).cos());
            }
            RotationStyle::Tumble => {
                rotation.x += 0.01 * (1.0 + 0.4 * (t * 0.7 + phase).cos());
                rotation.z += beat * 0.007;
            }
            RotationStyle::Corkscrew => {
                rotation.y += 0.015 * (1.0 + 0.3 * beat);
                rotation.x = (t * 0.5 + phase).cos() * 0.25;
            }
            RotationStyle::Pulse => {
                rotation.y += 0.005 * (1.0 + (t * 3.0 + phase).sin());
            }
            RotationStyle::Drift => {
                rotation.y += 0.005 * (1.0 + 0.5 * beat);
                rotation.x += beat * 0.002;
                rotation.z += (t + phase).cos() * 0.002;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    pub original_size: f32,
    pub hue: Option<f32>,
    pub model_path: String,
    pub meshes: Vec<MeshBinding>,
    pub material: Material,
    pub dominant_shape: String,
    pub rotation_style: RotationStyle,
    pub lifespan: f32,
    pub max_lifespan: f32,
    pub is_tickled: bool,
    pub tickle_time: f32,
}

impl Entity {
    // Bare entity at a position; the factory fills in meshes and material
    pub fn new(id: EntityId, position: Vec3, size: f32, max_lifespan: f32) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: size,
            original_size: size,
            hue: None,
            model_path: String::new(),
            meshes: Vec::new(),
            material: Material {
                handle: MaterialHandle(0),
                matcap: String::new(),
                tint: None,
            },
            dominant_shape: RotationStyle::DEFAULT_SHAPE.to_string(),
            rotation_style: RotationStyle::Drift,
            lifespan: max_lifespan,
            max_lifespan,
            is_tickled: false,
            tickle_time: 0.0,
        }
    }

    // Apply a force to the entity
    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force;
    }

    // Update the entity's velocity and position
    pub fn integrate<R: Rng + ?Sized>(&mut self, dt: f32, min_speed: f32, max_speed: f32, rng: &mut R) {
        // Update velocity
        self.velocity += self.acceleration;

        // Keep speed inside the band
        let speed = self.velocity.length();
        if speed > max_speed {
            self.velocity = self.velocity * (max_speed / speed);
        } else if speed < min_speed {
            if speed > f32::EPSILON {
                self.velocity = self.velocity * (min_speed / speed);
            } else {
                // Nothing to scale; pick a heading
                self.velocity = random_unit(rng) * min_speed;
            }
        }

        // Update position
        self.position += self.velocity * dt;

        // Reset acceleration
        self.acceleration = Vec3::ZERO;
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn radius(&self, factor: f32) -> f32 {
        self.scale * factor
    }

    pub fn tickle(&mut self, duration: f32) {
        self.is_tickled = true;
        self.tickle_time = duration;
    }

    // Jitter in place while tickled; returns true once the tickle wears off
    pub fn shiver<R: Rng + ?Sized>(&mut self, dt: f32, jitter: f32, rng: &mut R) -> bool {
        if !self.is_tickled {
            return false;
        }

        let jitter = jitter.abs();
        self.position += vec3(
            rng.gen_range(-jitter..=jitter),
            rng.gen_range(-jitter..=jitter),
            rng.gen_range(-jitter..=jitter),
        );
        self.acceleration = Vec3::ZERO;

        self.tickle_time -= dt;
        if self.tickle_time <= 0.0 {
            self.tickle_time = 0.0;
            self.is_tickled = false;
            return true;
        }
        false
    }

    // Count down the lifespan and shrink with it; true when expired
    pub fn age(&mut self, dt: f32) -> bool {
        self.lifespan = (self.lifespan - dt).max(0.0);
        let remaining = (self.lifespan / self.max_lifespan).max(0.0);
        self.scale = self.original_size * remaining;
        self.lifespan <= 0.0
    }

    // Contact with another creature restores the full lifespan
    pub fn feed(&mut self) {
        self.lifespan = self.max_lifespan;
        self.scale = self.original_size;
    }

    pub fn advance_rotation(&mut self, elapsed: f32) {
        self.rotation_style.advance(&mut self.rotation, elapsed, self.id.phase());
    }

    pub fn is_expired(&self) -> bool {
        self.lifespan <= 0.0
    }

    // Distance on the hue wheel, None when either side is untinted
    pub fn hue_distance(&self, other: &Entity) -> Option<f32> {
        match (self.hue, other.hue) {
            (Some(a), Some(b)) => Some(hue_distance(a, b)),
            _ => None,
        }
    }

    pub fn speed_in_band(&self, params: &SimulationParams) -> bool {
        let speed = self.speed();
        speed >= params.min_speed - 1e-4 && speed <= params.max_speed + 1e-4
    }
}

// Circular distance between two hues in degrees, in 0..=180
pub fn hue_distance(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

pub fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let candidate = vec3(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let length_squared = candidate.length_squared();
        if length_squared > 1e-6 && length_squared <= 1.0 {
            return candidate / length_squared.sqrt();
        }
    }
}
