/*
 * Entity Factory Module
 *
 * Turns a creature descriptor and its loaded scene asset into a live Entity:
 * - one geometry handle per mesh, with the descriptor's morph blend applied
 * - a per-creature clone of the shared matcap material, tinted by hue
 * - the dominant shape, which picks the rotation style
 * - a spawn position away from the existing creatures and a gentle velocity
 */

use log::{debug, warn};
use nannou::color::hsl;
use nannou::prelude::{vec3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::asset::{MeshTemplate, SceneAsset};
use crate::descriptor::{CreatureDescriptor, MorphBinding};
use crate::entity::{
    Entity, EntityId, GeometryHandle, Material, MaterialHandle, MeshBinding, RotationStyle,
};
use crate::params::SimulationParams;

pub const DEFAULT_MATCAP: &str = "/assets/matcap_iridescent.png";

const TINT_SATURATION: f32 = 0.7;
const TINT_LIGHTNESS: f32 = 0.5;

pub struct EntityFactory {
    base_material: Material,
    next_handle: u64,
    rng: StdRng,
}

impl EntityFactory {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            base_material: Material {
                handle: MaterialHandle(0),
                matcap: DEFAULT_MATCAP.to_string(),
                tint: None,
            },
            next_handle: 1,
            rng,
        }
    }

    pub fn base_material(&self) -> &Material {
        &self.base_material
    }

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    // Build a creature; `occupied` holds the positions of the live population
    pub fn build(
        &mut self,
        descriptor: &CreatureDescriptor,
        asset: &SceneAsset,
        occupied: &[Vec3],
        params: &SimulationParams,
    ) -> Entity {
        let size = match descriptor.valid_size() {
            Some(size) => size,
            None => {
                warn!(
                    "Creature {} has no usable size ({:?}), using 1.0",
                    descriptor.model_path, descriptor.size
                );
                1.0
            }
        };

        let id = EntityId::generate(&mut self.rng);
        let position = self.spawn_position(occupied, params);
        let mut entity = Entity::new(id, position, size, params.max_lifespan);

        entity.model_path = descriptor.model_path.clone();
        entity.velocity = vec3(
            (self.rng.gen::<f32>() - 0.5) * 0.8,
            (self.rng.gen::<f32>() - 0.5) * 0.3,
            (self.rng.gen::<f32>() - 0.5) * 0.8,
        );
        entity.rotation = vec3(
            descriptor.rotation.x,
            descriptor.rotation.y,
            descriptor.rotation.z,
        );

        // Geometry and morph blend per mesh
        for mesh in &asset.meshes {
            let geometry = GeometryHandle(self.next_handle());
            let mut binding = MeshBinding {
                name: mesh.name.clone(),
                geometry,
                target_names: mesh.target_names.clone(),
                influences: mesh.default_weights.clone(),
            };
            if let Some(morph) = descriptor.morph_targets.get(&mesh.name) {
                apply_morph(&mut binding, mesh, morph);
            }
            entity.meshes.push(binding);
        }

        for mesh_name in descriptor.morph_targets.keys() {
            if asset.mesh(mesh_name).is_none() {
                debug!("Skipping morph targets for unknown mesh {}", mesh_name);
            }
        }

        // Own material, tinted when a hue was sent
        entity.hue = descriptor.hue();
        entity.material = Material {
            handle: MaterialHandle(self.next_handle()),
            matcap: self.base_material.matcap.clone(),
            tint: entity
                .hue
                .map(|hue| hsl(hue / 360.0, TINT_SATURATION, TINT_LIGHTNESS)),
        };

        entity.dominant_shape = dominant_shape(&entity.meshes, params.dominant_shape_threshold);
        entity.rotation_style = RotationStyle::for_shape(&entity.dominant_shape);

        entity
    }

    // A spot clear of the others if one turns up quickly, else anywhere
    fn spawn_position(&mut self, occupied: &[Vec3], params: &SimulationParams) -> Vec3 {
        let min_distance_sq = params.spawn_min_distance * params.spawn_min_distance;

        for _ in 0..params.spawn_attempts {
            let candidate = vec3(
                self.rng.gen_range(-8.0..=8.0),
                self.rng.gen_range(0.0..=2.0),
                self.rng.gen_range(-8.0..=8.0),
            );
            if occupied
                .iter()
                .all(|other| other.distance_squared(candidate) >= min_distance_sq)
            {
                return candidate;
            }
        }

        vec3(
            self.rng.gen_range(-10.0..=10.0),
            self.rng.gen_range(0.0..=3.0),
            self.rng.gen_range(-10.0..=10.0),
        )
    }
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self::new()
    }
}

// Copy influences onto the mesh slots by target name. Only when no name
// matches the mesh at all do the descriptor slots map straight onto mesh slots.
fn apply_morph(binding: &mut MeshBinding, mesh: &MeshTemplate, morph: &MorphBinding) {
    let names = morph.names_in_slot_order();
    let by_slot = !names.iter().any(|&(name, _)| mesh.slot_of(name).is_some());

    for (name, slot) in names {
        let Some(value) = morph.influences.get(slot).copied() else {
            debug!("Morph target {} on {} has no influence value", name, mesh.name);
            continue;
        };

        let target = if by_slot {
            (slot < mesh.target_count()).then_some(slot)
        } else {
            mesh.slot_of(name)
        };

        match target.and_then(|index| binding.influences.get_mut(index)) {
            Some(influence) if value.is_finite() => *influence = value.clamp(0.0, 1.0),
            Some(_) => debug!("Ignoring non-finite influence for {} on {}", name, mesh.name),
            None => debug!("Mesh {} has no morph target {}", mesh.name, name),
        }
    }
}

// Strongest target of the first mesh that has any, above the threshold
pub fn dominant_shape(meshes: &[MeshBinding], threshold: f32) -> String {
    let Some(mesh) = meshes.iter().find(|mesh| !mesh.influences.is_empty()) else {
        return RotationStyle::DEFAULT_SHAPE.to_string();
    };

    let mut best = threshold;
    let mut shape: &str = RotationStyle::DEFAULT_SHAPE;
    for (name, &influence) in mesh.target_names.iter().zip(&mesh.influences) {
        if influence > best {
            best = influence;
            shape = name.as_str();
        }
    }
    shape.to_string()
}
