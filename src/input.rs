/*
 * Input Module
 *
 * This module handles user input events for the creature viewer.
 * It processes mouse movements, clicks, wheel and keyboard events.
 *
 * Features:
 * - Orbiting the camera with mouse drag
 * - Zooming with the mouse wheel
 * - Clicking a creature to tickle it
 * - Keys: Space pauses, R toggles auto-rotate, C clears every creature
 * - Leaving input that egui claims to egui
 */

use nannou::prelude::*;
use nannou::winit::event::{MouseButton, MouseScrollDelta, TouchPhase};

use crate::app::Model;
use crate::camera::pick_entity;

// A press that moves less than this is a click, not a drag
const CLICK_SLOP: f32 = 4.0;

// Mouse moved event handler
pub fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    let new_pos = Vec2::new(pos.x, pos.y);

    // Update camera orbit if we're dragging
    if model.camera.is_dragging {
        model.camera.drag(new_pos);
    }

    // Always update the stored mouse position
    model.mouse_position = new_pos;
}

// Mouse pressed event handler
pub fn mouse_pressed(_app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left {
        return;
    }

    // Check if the click is on the UI before handling it
    if model.egui.ctx().is_pointer_over_area() {
        return;
    }

    model.press_position = Some(model.mouse_position);
    model.camera.start_drag(model.mouse_position);
}

// Mouse released event handler; a click without dragging tickles a creature
pub fn mouse_released(app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left {
        return;
    }
    model.camera.end_drag();

    let Some(pressed_at) = model.press_position.take() else {
        return;
    };
    if pressed_at.distance(model.mouse_position) > CLICK_SLOP {
        return;
    }

    let radius_factor = model.env.params().collision_radius_factor;
    let picked = pick_entity(
        &model.camera,
        model.env.entities(),
        model.mouse_position,
        app.window_rect(),
        radius_factor,
    );
    if let Some(id) = picked {
        model.env.tickle(id);
    }
}

// Mouse wheel event handler for zooming
pub fn mouse_wheel(_app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    if model.egui.ctx().is_pointer_over_area() {
        return;
    }
    match delta {
        MouseScrollDelta::LineDelta(_, y) => model.camera.zoom(y),
        MouseScrollDelta::PixelDelta(pos) => model.camera.zoom(pos.y as f32 * 0.01),
    }
}

// Keyboard shortcuts, unless a text field has focus
pub fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    if model.egui.ctx().wants_keyboard_input() {
        return;
    }
    match key {
        Key::Space => {
            model.env.toggle_pause();
        }
        Key::R => {
            model.camera.auto_rotate = !model.camera.auto_rotate;
        }
        Key::C => {
            model.env.clear_all();
        }
        _ => {}
    }
}

// Handle raw window events for egui
pub fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    // Pass events to egui
    model.egui.handle_raw_event(event);
}
