/*
 * Camera Module
 *
 * This module defines the orbit Camera used by the viewer. It circles a
 * target point, never dips below the floor, zooms between a minimum and
 * maximum distance and can slowly rotate on its own. It also provides the
 * perspective projection from world space to screen space and picking of
 * the creature under the cursor.
 */

use nannou::prelude::*;

use crate::entity::{Entity, EntityId};

// Where a world point lands on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub screen: Vec2,
    pub depth: f32,
    // Screen pixels per world unit at this depth
    pub scale: f32,
}

pub struct Camera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_pitch: f32,
    pub fov_y: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub is_dragging: bool,
    pub last_cursor_pos: Vec2,
}

impl Camera {
    const NEAR: f32 = 0.1;
    const ORBIT_SPEED: f32 = 0.005;

    // Eye position the camera starts from and resets to
    pub fn default_eye() -> Vec3 {
        vec3(8.0, 6.0, 8.0)
    }

    pub fn new() -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance: 1.0,
            min_distance: 3.0,
            max_distance: 30.0,
            max_pitch: 1.45,
            fov_y: 75.0_f32.to_radians(),
            auto_rotate: true,
            auto_rotate_speed: 0.1,
            is_dragging: false,
            last_cursor_pos: Vec2::ZERO,
        };
        camera.look_from(Self::default_eye());
        camera
    }

    // Place the eye at a world position, looking at the target
    pub fn look_from(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        self.distance = offset.length().clamp(self.min_distance, self.max_distance);
        self.yaw = offset.x.atan2(offset.z);
        self.pitch = (offset.y / offset.length().max(f32::EPSILON))
            .asin()
            .clamp(0.0, self.max_pitch);
    }

    pub fn reset(&mut self) {
        self.target = Vec3::ZERO;
        self.look_from(Self::default_eye());
    }

    pub fn eye(&self) -> Vec3 {
        self.target
            + vec3(
                self.pitch.cos() * self.yaw.sin(),
                self.pitch.sin(),
                self.pitch.cos() * self.yaw.cos(),
            ) * self.distance
    }

    // Right, up and forward axes of the view
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.target - self.eye()).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        (right, up, forward)
    }

    // Perspective projection; None for points behind the near plane
    pub fn project(&self, point: Vec3, window_rect: Rect) -> Option<Projected> {
        let (right, up, forward) = self.basis();
        let relative = point - self.eye();
        let depth = relative.dot(forward);
        if depth < Self::NEAR {
            return None;
        }

        let focal = (window_rect.h() / 2.0) / (self.fov_y / 2.0).tan();
        let scale = focal / depth;
        let screen = window_rect.xy() + vec2(relative.dot(right), relative.dot(up)) * scale;
        Some(Projected { screen, depth, scale })
    }

    // Handle mouse wheel events for zooming
    pub fn zoom(&mut self, scroll_delta: f32) {
        let zoom_factor = 1.0 - scroll_delta * 0.1;
        self.distance = (self.distance * zoom_factor).clamp(self.min_distance, self.max_distance);
    }

    // Start dragging the camera
    pub fn start_drag(&mut self, position: Vec2) {
        self.last_cursor_pos = position;
        self.is_dragging = true;
    }

    // Orbit while dragging
    pub fn drag(&mut self, position: Vec2) {
        if !self.is_dragging {
            return;
        }
        let delta = position - self.last_cursor_pos;
        if delta.length_squared() > 0.0 {
            self.yaw -= delta.x * Self::ORBIT_SPEED;
            self.pitch = (self.pitch + delta.y * Self::ORBIT_SPEED).clamp(0.0, self.max_pitch);
            self.last_cursor_pos = position;
        }
    }

    // End dragging
    pub fn end_drag(&mut self) {
        self.is_dragging = false;
    }

    pub fn update(&mut self, dt: f32) {
        if self.auto_rotate && !self.is_dragging {
            self.yaw += self.auto_rotate_speed * dt;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

// The creature under the cursor, nearest to the camera when several overlap
pub fn pick_entity(
    camera: &Camera,
    entities: &[Entity],
    cursor: Vec2,
    window_rect: Rect,
    radius_factor: f32,
) -> Option<EntityId> {
    entities
        .iter()
        .filter_map(|entity| {
            let projected = camera.project(entity.position, window_rect)?;
            let radius = (entity.radius(radius_factor) * projected.scale).max(12.0);
            (projected.screen.distance(cursor) <= radius).then_some((entity.id, projected.depth))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Rect {
        Rect::from_w_h(800.0, 600.0)
    }

    #[test]
    fn default_eye_matches_placement() {
        let camera = Camera::new();
        let eye = camera.eye();
        assert!((eye - Camera::default_eye()).length() < 1e-3);
    }

    #[test]
    fn target_projects_to_window_center() {
        let camera = Camera::new();
        let projected = camera.project(Vec3::ZERO, window()).unwrap();
        assert!(projected.screen.length() < 1e-3);
        assert!(projected.depth > 0.0);
    }

    #[test]
    fn points_behind_the_eye_are_not_projected() {
        let camera = Camera::new();
        let behind = camera.eye() * 2.0;
        assert!(camera.project(behind, window()).is_none());
    }

    #[test]
    fn zoom_and_pitch_are_clamped() {
        let mut camera = Camera::new();
        for _ in 0..100 {
            camera.zoom(5.0);
        }
        assert_eq!(camera.distance, camera.min_distance);
        for _ in 0..100 {
            camera.zoom(-5.0);
        }
        assert_eq!(camera.distance, camera.max_distance);

        camera.start_drag(Vec2::ZERO);
        camera.drag(vec2(0.0, -10_000.0));
        assert_eq!(camera.pitch, 0.0);
        camera.drag(vec2(0.0, 10_000.0));
        assert_eq!(camera.pitch, camera.max_pitch);
        camera.end_drag();
    }

    #[test]
    fn auto_rotate_pauses_while_dragging() {
        let mut camera = Camera::new();
        let yaw = camera.yaw;
        camera.update(1.0);
        assert!(camera.yaw > yaw);

        let yaw = camera.yaw;
        camera.start_drag(Vec2::ZERO);
        camera.update(1.0);
        assert_eq!(camera.yaw, yaw);
    }

    #[test]
    fn picks_the_nearest_creature_under_the_cursor() {
        let camera = Camera::new();
        let near = Entity::new(EntityId { created_ms: 0, salt: 1 }, vec3(2.0, 1.5, 2.0), 1.0, 180.0);
        let far = Entity::new(EntityId { created_ms: 0, salt: 2 }, Vec3::ZERO, 1.0, 180.0);
        let entities = vec![far, near];

        let cursor = camera.project(vec3(2.0, 1.5, 2.0), window()).unwrap().screen;
        assert_eq!(pick_entity(&camera, &entities, cursor, window(), 0.9).map(|id| id.salt), Some(1));

        let nowhere = vec2(390.0, 290.0);
        assert_eq!(pick_entity(&camera, &entities, nowhere, window(), 0.9), None);
    }
}
