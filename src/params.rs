/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that contains all the
 * tuned constants of the creature environment: population capacity, flocking
 * radii and forces, containment bounds, speed limits, lifespan and asset
 * loading limits. They can be loaded from a RON file and adjusted through
 * the control panel.
 */

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Soft box the creatures are kept inside
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub floor: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            x: 10.0,
            y: 6.0,
            z: 10.0,
            floor: 0.5,
        }
    }
}

// Parameters for the simulation that can be adjusted via config or UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    // Population
    pub max_models: usize,

    // Flocking
    pub perception_radius: f32,
    pub color_affinity_threshold: f32,
    pub cohesion_force: f32,
    pub separation_distance: f32,
    pub separation_force: f32,
    pub wander_strength: f32,

    // Containment
    pub bounds: Bounds,
    pub containment_force: f32,

    // Integration
    pub min_speed: f32,
    pub max_speed: f32,

    // Collisions
    pub collision_radius_factor: f32,
    pub feeding_enabled: bool,

    // Lifecycle
    pub max_lifespan: f32,
    pub tickle_duration: f32,
    pub tickle_jitter: f32,

    // Spawning
    pub dominant_shape_threshold: f32,
    pub spawn_attempts: usize,
    pub spawn_min_distance: f32,

    // Assets
    pub load_timeout_secs: f32,
    pub asset_cache_capacity: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            max_models: 20,
            perception_radius: 5.0,
            color_affinity_threshold: 45.0,
            cohesion_force: 0.0005,
            separation_distance: 1.5,
            separation_force: 0.005,
            wander_strength: 0.0002,
            bounds: Bounds::default(),
            containment_force: 0.002,
            min_speed: 0.2,
            max_speed: 1.5,
            collision_radius_factor: 0.9,
            feeding_enabled: true,
            max_lifespan: 180.0,
            tickle_duration: 1.0,
            tickle_jitter: 0.05,
            dominant_shape_threshold: 0.1,
            spawn_attempts: 10,
            spawn_min_distance: 3.0,
            load_timeout_secs: 10.0,
            asset_cache_capacity: 8,
        }
    }
}

impl SimulationParams {
    // Load parameters from a RON file; fields left out keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let params: Self = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        params.validate()?;
        Ok(params)
    }

    // Reject combinations the simulation cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_models == 0 {
            return Err(ConfigError::Invalid {
                name: "max_models",
                reason: "population capacity must be at least 1".into(),
            });
        }
        if !(self.min_speed >= 0.0 && self.min_speed <= self.max_speed) {
            return Err(ConfigError::Invalid {
                name: "min_speed",
                reason: format!(
                    "expected 0 <= min_speed ({}) <= max_speed ({})",
                    self.min_speed, self.max_speed
                ),
            });
        }
        if !(self.max_lifespan > 0.0) {
            return Err(ConfigError::Invalid {
                name: "max_lifespan",
                reason: "must be positive".into(),
            });
        }
        if !(self.load_timeout_secs > 0.0) {
            return Err(ConfigError::Invalid {
                name: "load_timeout_secs",
                reason: "must be positive".into(),
            });
        }
        if self.asset_cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "asset_cache_capacity",
                reason: "the cache must hold at least one asset".into(),
            });
        }
        Ok(())
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs_f32(self.load_timeout_secs)
    }

    // Get parameter ranges for UI sliders
    pub fn get_max_models_range() -> std::ops::RangeInclusive<usize> {
        1..=60
    }

    pub fn get_speed_range() -> std::ops::RangeInclusive<f32> {
        0.0..=5.0
    }

    pub fn get_radius_range() -> std::ops::RangeInclusive<f32> {
        0.1..=15.0
    }

    pub fn get_force_range() -> std::ops::RangeInclusive<f32> {
        0.0..=0.05
    }

    pub fn get_affinity_range() -> std::ops::RangeInclusive<f32> {
        0.0..=180.0
    }

    pub fn get_lifespan_range() -> std::ops::RangeInclusive<f32> {
        5.0..=600.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_tuned_constants() {
        let params = SimulationParams::default();
        assert_eq!(params.max_models, 20);
        assert_eq!(params.perception_radius, 5.0);
        assert_eq!(params.color_affinity_threshold, 45.0);
        assert_eq!(params.min_speed, 0.2);
        assert_eq!(params.max_speed, 1.5);
        assert_eq!(params.max_lifespan, 180.0);
        assert_eq!(params.bounds.floor, 0.5);
        assert_eq!(params.load_timeout(), Duration::from_secs(10));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn partial_ron_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(max_models: 5, bounds: (x: 4.0))").unwrap();

        let params = SimulationParams::from_file(file.path()).unwrap();
        assert_eq!(params.max_models, 5);
        assert_eq!(params.bounds.x, 4.0);
        assert_eq!(params.bounds.y, 6.0);
        assert_eq!(params.cohesion_force, 0.0005);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(max_models: 0)").unwrap();

        let err = SimulationParams::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "max_models", .. }));

        let params = SimulationParams {
            min_speed: 2.0,
            max_speed: 1.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn missing_file_reports_read_error() {
        let err = SimulationParams::from_file("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
