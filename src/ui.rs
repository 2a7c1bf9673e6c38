/*
 * UI Module
 *
 * This module contains functions for creating and updating the user interface
 * using nannou_egui:
 * - Creature panel: compose a descriptor (model, size, hue, morph blend) and send it
 * - Simulation parameters, applied when they change
 * - Environment stats and controls (pause, clear, camera)
 * - Toasts for notifications
 */

use nannou_egui::egui;

use crate::debug::DebugInfo;
use crate::descriptor::CreatureDescriptor;
use crate::environment::EnvironmentStats;
use crate::notify::{NoticeLevel, Notifications};
use crate::params::SimulationParams;

pub const DEFAULT_TARGETS: [&str; 6] = ["spiky", "round", "tall", "flat", "twisted", "lumpy"];

// What the control panel is currently composing
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub model_path: String,
    pub mesh_name: String,
    pub size: f32,
    pub hue: f32,
    pub tinted: bool,
    pub morph: Vec<(String, f32)>,
}

impl PanelState {
    pub fn new(model_path: impl Into<String>, mesh_name: impl Into<String>, targets: &[String]) -> Self {
        Self {
            model_path: model_path.into(),
            mesh_name: mesh_name.into(),
            size: 1.0,
            hue: 200.0,
            tinted: true,
            morph: targets.iter().map(|name| (name.clone(), 0.0)).collect(),
        }
    }

    // The descriptor a press on "Send" broadcasts
    pub fn descriptor(&self) -> CreatureDescriptor {
        let names: Vec<&str> = self.morph.iter().map(|(name, _)| name.as_str()).collect();
        let influences: Vec<f32> = self.morph.iter().map(|(_, value)| *value).collect();

        let mut descriptor = CreatureDescriptor::new(self.model_path.trim()).with_size(self.size);
        if self.tinted {
            descriptor = descriptor.with_color(self.hue);
        }
        if !names.is_empty() {
            descriptor = descriptor.with_morph(self.mesh_name.clone(), &names, &influences);
        }
        descriptor
    }
}

// What the user asked for this frame
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UiActions {
    pub send: Option<CreatureDescriptor>,
    pub clear_all: bool,
    pub toggle_pause: bool,
    pub reset_camera: bool,
    pub params_changed: bool,
}

// Update the UI and report what the user asked for
pub fn update_ui(
    ctx: &egui::CtxRef,
    panel: &mut PanelState,
    params: &mut SimulationParams,
    stats: &EnvironmentStats,
    debug_info: &DebugInfo,
    auto_rotate: &mut bool,
    show_debug: &mut bool,
) -> UiActions {
    let mut actions = UiActions::default();
    let before = params.clone();

    egui::Window::new("Creature")
        .default_pos([10.0, 10.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Model");
                ui.text_edit_singleline(&mut panel.model_path);
            });
            ui.add(egui::Slider::new(&mut panel.size, 0.2..=3.0).text("Size"));
            ui.horizontal(|ui| {
                ui.checkbox(&mut panel.tinted, "Tint");
                ui.add_enabled(panel.tinted, egui::Slider::new(&mut panel.hue, 0.0..=360.0).text("Hue"));
            });

            ui.collapsing(format!("Morph targets ({})", panel.mesh_name), |ui| {
                for (name, value) in panel.morph.iter_mut() {
                    ui.add(egui::Slider::new(value, 0.0..=1.0).text(name.as_str()));
                }
            });

            if ui.button("Send creature").clicked() {
                actions.send = Some(panel.descriptor());
            }
        });

    egui::Window::new("Environment")
        .default_pos([10.0, 360.0])
        .show(ctx, |ui| {
            ui.collapsing("Flocking", |ui| {
                ui.add(egui::Slider::new(&mut params.perception_radius, SimulationParams::get_radius_range()).text("Perception Radius"));
                ui.add(egui::Slider::new(&mut params.color_affinity_threshold, SimulationParams::get_affinity_range()).text("Color Affinity"));
                ui.add(egui::Slider::new(&mut params.cohesion_force, SimulationParams::get_force_range()).text("Cohesion Force"));
                ui.add(egui::Slider::new(&mut params.separation_distance, SimulationParams::get_radius_range()).text("Separation Distance"));
                ui.add(egui::Slider::new(&mut params.separation_force, SimulationParams::get_force_range()).text("Separation Force"));
                ui.add(egui::Slider::new(&mut params.containment_force, SimulationParams::get_force_range()).text("Containment Force"));
            });

            ui.collapsing("Population", |ui| {
                ui.add(egui::Slider::new(&mut params.max_models, SimulationParams::get_max_models_range()).text("Max Creatures"));
                ui.add(egui::Slider::new(&mut params.min_speed, SimulationParams::get_speed_range()).text("Min Speed"));
                ui.add(egui::Slider::new(&mut params.max_speed, SimulationParams::get_speed_range()).text("Max Speed"));
                ui.add(egui::Slider::new(&mut params.max_lifespan, SimulationParams::get_lifespan_range()).text("Lifespan (s)"));
                ui.checkbox(&mut params.feeding_enabled, "Feed on contact");
            });

            ui.collapsing("Stats", |ui| {
                ui.label(format!("Creatures: {} / {}", stats.population, stats.capacity));
                ui.label(format!("Cached assets: {}", stats.cached_assets));
                ui.label(format!("Pending loads: {}", stats.pending_loads));
                ui.label(format!(
                    "Spawned {} / failed {} / expired {}",
                    stats.spawned_total, stats.failed_total, stats.expired_total
                ));
                ui.label(format!("Elapsed: {:.1} s", stats.elapsed));
                ui.label(match stats.connected {
                    Some(true) => "Relay: connected",
                    Some(false) => "Relay: disconnected",
                    None => "Relay: local",
                });
                ui.separator();
                ui.label(format!("FPS: {:.1}", debug_info.fps));
                ui.label(format!("Frame time: {:.2} ms", debug_info.frame_time_ms()));
            });

            ui.horizontal(|ui| {
                let pause_label = if stats.paused { "Resume" } else { "Pause" };
                if ui.button(pause_label).clicked() {
                    actions.toggle_pause = true;
                }
                if ui.button("Clear all").clicked() {
                    actions.clear_all = true;
                }
                if ui.button("Reset camera").clicked() {
                    actions.reset_camera = true;
                }
            });
            ui.checkbox(auto_rotate, "Auto-rotate camera");
            ui.checkbox(show_debug, "Show Debug Info");
        });

    actions.params_changed = *params != before;
    actions
}

fn notice_color(level: NoticeLevel) -> egui::Color32 {
    match level {
        NoticeLevel::Success => egui::Color32::from_rgb(120, 220, 140),
        NoticeLevel::Info => egui::Color32::from_rgb(150, 190, 255),
        NoticeLevel::Warning => egui::Color32::from_rgb(250, 200, 90),
        NoticeLevel::Error => egui::Color32::from_rgb(255, 110, 110),
    }
}

// Newest notification at the bottom right
pub fn draw_toasts(ctx: &egui::CtxRef, notifications: &Notifications) {
    if notifications.is_empty() {
        return;
    }

    egui::Area::new("toasts")
        .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
        .show(ctx, |ui| {
            for notice in notifications.iter() {
                let alpha = (notifications.opacity(notice) * 255.0) as u8;
                let base = notice_color(notice.level);
                let color = egui::Color32::from_rgba_unmultiplied(base.r(), base.g(), base.b(), alpha.max(60));
                ui.colored_label(color, &notice.message);
            }
        });
}

// Draw debug information on the screen
pub fn draw_debug_info(
    draw: &nannou::Draw,
    debug_info: &DebugInfo,
    stats: &EnvironmentStats,
    window_rect: nannou::geom::Rect,
) {
    // Create a background panel in the top-right corner
    let margin = 20.0;
    let line_height = 20.0;
    let panel_width = 220.0;
    let panel_height = line_height * 5.0 + margin;
    let panel_x = window_rect.right() - panel_width / 2.0;
    let panel_y = window_rect.top() - panel_height / 2.0;

    draw.rect()
        .x_y(panel_x, panel_y)
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.7));

    let text_x = window_rect.right() - panel_width + margin;
    let text_y = window_rect.top() - margin;

    let debug_texts = [
        format!("FPS: {:.1}", debug_info.fps),
        format!("Frame time: {:.2} ms", debug_info.frame_time_ms()),
        format!("Creatures: {}", stats.population),
        format!("Collisions: {}", debug_info.collisions_last_frame),
        format!("Frames: {}", debug_info.frames),
    ];

    for (i, text) in debug_texts.iter().enumerate() {
        let y = text_y - (i as f32 * line_height);
        draw.text(text)
            .x_y(text_x + 70.0, y)
            .color(nannou::color::WHITE)
            .font_size(14);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> Vec<String> {
        DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn panel_composes_a_descriptor() {
        let mut panel = PanelState::new(" /assets/modelo.glb ", "Body", &targets());
        panel.size = 1.5;
        panel.hue = 30.0;
        panel.morph[1].1 = 0.7;

        let descriptor = panel.descriptor();
        assert_eq!(descriptor.model_path, "/assets/modelo.glb");
        assert_eq!(descriptor.size, Some(1.5));
        assert_eq!(descriptor.color, Some(30.0));
        assert_eq!(descriptor.morph_targets["Body"].influence_of("round"), Some(0.7));
        assert_eq!(descriptor.morph_targets["Body"].dictionary["lumpy"], 5);
    }

    #[test]
    fn untinted_panel_sends_no_color() {
        let mut panel = PanelState::new("a.glb", "Body", &[]);
        panel.tinted = false;
        let descriptor = panel.descriptor();
        assert_eq!(descriptor.color, None);
        assert!(descriptor.morph_targets.is_empty());
    }

    #[test]
    fn panels_and_toasts_lay_out_without_a_window() {
        let mut ctx = egui::CtxRef::default();
        ctx.begin_frame(egui::RawInput::default());

        let mut panel = PanelState::new("a.glb", "Body", &targets());
        let mut params = SimulationParams::default();
        let mut notes = Notifications::new();
        notes.error("Failed to load a.glb");
        notes.success("Creature spawned");
        let mut auto_rotate = true;
        let mut show_debug = false;

        let actions = update_ui(
            &ctx,
            &mut panel,
            &mut params,
            &EnvironmentStats::default(),
            &DebugInfo::default(),
            &mut auto_rotate,
            &mut show_debug,
        );
        draw_toasts(&ctx, &notes);
        let _ = ctx.end_frame();

        assert_eq!(actions, UiActions::default());
        assert!(auto_rotate);
    }
}
