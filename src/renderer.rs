/*
 * Renderer Module
 *
 * This module handles the rendering of the creature environment.
 * Each creature is drawn as a camera-facing silhouette per mesh whose outline
 * is shaped by the mesh's morph blend, tinted with the creature's material,
 * and sorted back to front. The floor grid and the bounds give the scene
 * depth.
 *
 * SceneBackend is the viewer's RenderBackend: it builds a silhouette for every
 * geometry handle when a creature is attached and drops it on release.
 */

use std::collections::HashMap;
use std::f32::consts::TAU;

use log::error;
use nannou::color::{lin_srgba, IntoLinSrgba, LinSrgba};
use nannou::prelude::*;

use crate::app::Model;
use crate::entity::{Entity, GeometryHandle, MeshBinding};
use crate::population::RenderBackend;
use crate::ui;

const OUTLINE_POINTS: usize = 48;

// Outline of one mesh in unit space, before rotation and scale
#[derive(Debug, Clone)]
pub struct Silhouette {
    pub points: Vec<Vec2>,
}

impl Silhouette {
    // Morph targets bend a circle; unknown names add a gentle ripple
    pub fn from_mesh(mesh: &MeshBinding) -> Self {
        let points = (0..OUTLINE_POINTS)
            .map(|i| {
                let theta = i as f32 / OUTLINE_POINTS as f32 * TAU;
                let mut radius = 1.0;
                let mut stretch = vec2(1.0, 1.0);
                let mut twist = 0.0;

                for (slot, (name, &w)) in mesh.target_names.iter().zip(&mesh.influences).enumerate() {
                    match name.to_ascii_lowercase().as_str() {
                        "spiky" => radius += w * 0.35 * (theta * 8.0).sin().max(0.0),
                        "round" => radius += w * 0.15,
                        "tall" => stretch.y += w * 0.6,
                        "flat" => stretch.y -= w * 0.45,
                        "twisted" => twist += w * 0.6 * (theta * 2.0).sin(),
                        "lumpy" => radius += w * 0.12 * (theta * 5.0).sin(),
                        _ => radius += w * 0.08 * (theta * (slot + 3) as f32).sin(),
                    }
                }

                let angle = theta + twist;
                vec2(angle.cos() * stretch.x, angle.sin() * stretch.y) * radius * 0.5
            })
            .collect();
        Self { points }
    }
}

#[derive(Default)]
pub struct SceneBackend {
    silhouettes: HashMap<GeometryHandle, Silhouette>,
}

impl SceneBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn silhouette(&self, geometry: GeometryHandle) -> Option<&Silhouette> {
        self.silhouettes.get(&geometry)
    }

    pub fn live_silhouettes(&self) -> usize {
        self.silhouettes.len()
    }
}

impl RenderBackend for SceneBackend {
    fn attach(&mut self, entity: &Entity) {
        for mesh in &entity.meshes {
            self.silhouettes.insert(mesh.geometry, Silhouette::from_mesh(mesh));
        }
    }

    fn release(&mut self, entity: Entity) {
        for mesh in &entity.meshes {
            self.silhouettes.remove(&mesh.geometry);
        }
    }
}

fn creature_color(entity: &Entity) -> LinSrgba {
    let alpha = if entity.is_tickled { 1.0 } else { 0.9 };
    match entity.material.tint {
        Some(tint) => {
            let linear: LinSrgba = tint.into_lin_srgba();
            lin_srgba(linear.red, linear.green, linear.blue, alpha)
        }
        None => lin_srgba(0.7, 0.7, 0.85, alpha),
    }
}

// Floor grid and bounds box
fn draw_floor(draw: &Draw, model: &Model, window_rect: Rect) {
    let bounds = model.env.params().bounds;
    let grid_color = lin_srgba(0.35, 0.35, 0.45, 0.5);

    let mut x = -bounds.x;
    while x <= bounds.x + 1e-3 {
        draw_segment(draw, model, window_rect, vec3(x, 0.0, -bounds.z), vec3(x, 0.0, bounds.z), grid_color);
        x += 2.0;
    }
    let mut z = -bounds.z;
    while z <= bounds.z + 1e-3 {
        draw_segment(draw, model, window_rect, vec3(-bounds.x, 0.0, z), vec3(bounds.x, 0.0, z), grid_color);
        z += 2.0;
    }

    let edge_color = lin_srgba(0.5, 0.4, 0.7, 0.35);
    for &(cx, cz) in &[(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)] {
        let base = vec3(cx * bounds.x, 0.0, cz * bounds.z);
        draw_segment(draw, model, window_rect, base, base + vec3(0.0, bounds.y, 0.0), edge_color);
    }
}

fn draw_segment(draw: &Draw, model: &Model, window_rect: Rect, a: Vec3, b: Vec3, color: LinSrgba) {
    if let (Some(pa), Some(pb)) = (
        model.camera.project(a, window_rect),
        model.camera.project(b, window_rect),
    ) {
        draw.line().start(pa.screen).end(pb.screen).weight(1.0).color(color);
    }
}

// Render the model
pub fn view(app: &App, model: &Model, frame: Frame) {
    // Begin drawing
    let draw = app.draw();
    draw.background().color(rgb(0.04, 0.03, 0.08));

    let window_rect = app.window_rect();
    draw_floor(&draw, model, window_rect);

    // Back to front so nearer creatures cover farther ones
    let mut visible: Vec<_> = model
        .env
        .entities()
        .iter()
        .filter_map(|entity| {
            model
                .camera
                .project(entity.position, window_rect)
                .map(|projected| (entity, projected))
        })
        .collect();
    visible.sort_by(|a, b| b.1.depth.total_cmp(&a.1.depth));

    let backend = model.env.backend();
    for (entity, projected) in &visible {
        let size = entity.scale * projected.scale;
        if size < 0.5 {
            continue;
        }

        let color = creature_color(entity);
        let squash = vec2(entity.rotation.y.cos().abs().max(0.35), entity.rotation.x.cos().abs().max(0.35));
        let (sin, cos) = entity.rotation.z.sin_cos();

        for (layer, mesh) in entity.meshes.iter().enumerate() {
            let Some(silhouette) = backend.silhouette(mesh.geometry) else {
                continue;
            };
            let layer_scale = 1.0 - layer as f32 * 0.25;
            let points = silhouette.points.iter().map(|p| {
                let local = *p * squash * layer_scale;
                let turned = vec2(local.x * cos - local.y * sin, local.x * sin + local.y * cos);
                projected.screen + turned * size
            });
            draw.polygon().color(color).points(points);
        }

        if entity.is_tickled {
            draw.ellipse()
                .xy(projected.screen)
                .radius(size * 0.65)
                .no_fill()
                .stroke(WHITE)
                .stroke_weight(2.0);
        }
    }

    if model.show_debug {
        ui::draw_debug_info(&draw, &model.debug_info, &model.env.stats(), window_rect);
    }

    // Finish drawing
    if let Err(err) = draw.to_frame(app, &frame) {
        error!("Failed to render frame: {:?}", err);
    }

    // Draw the egui UI
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        error!("Failed to render the control panel: {:?}", err);
    }
}
