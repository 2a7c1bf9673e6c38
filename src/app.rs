/*
 * Application Module
 *
 * This module defines the viewer's model and its update loop:
 * - Window, egui and orbit camera setup
 * - Transport selection: a TCP relay when one is configured, else local
 * - Per frame: UI actions, transport events, admission and one simulation step
 *
 * nannou builds the model from a plain function, so the command line
 * settings are handed over through a process-wide cell before the app starts.
 */

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use log::{error, info, warn};
use nannou::prelude::*;
use nannou_egui::Egui;

use crate::asset::GltfSource;
use crate::camera::Camera;
use crate::debug::DebugInfo;
use crate::environment::Environment;
use crate::input::{key_pressed, mouse_moved, mouse_pressed, mouse_released, mouse_wheel, raw_window_event};
use crate::params::SimulationParams;
use crate::renderer::{view, SceneBackend};
use crate::transport::{ChannelTransport, JsonLinesTransport, Transport};
use crate::ui::{self, PanelState, DEFAULT_TARGETS};

// Longest step the simulation takes, however long the frame was
pub const MAX_FRAME_DT: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct ViewerSettings {
    pub params: SimulationParams,
    pub asset_root: PathBuf,
    pub relay: Option<String>,
    pub seed: Option<u64>,
    pub model_path: String,
    pub mesh_name: String,
    pub targets: Vec<String>,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            params: SimulationParams::default(),
            asset_root: PathBuf::from("."),
            relay: None,
            seed: None,
            model_path: "/assets/modelo.glb".into(),
            mesh_name: "Body".into(),
            targets: DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

static SETTINGS: OnceLock<ViewerSettings> = OnceLock::new();

// Main model for the application
pub struct Model {
    pub env: Environment<SceneBackend>,
    pub transport: Box<dyn Transport>,
    pub egui: Egui,
    pub camera: Camera,
    pub panel: PanelState,
    pub params_draft: SimulationParams,
    pub debug_info: DebugInfo,
    pub show_debug: bool,
    pub mouse_position: Vec2,
    pub press_position: Option<Vec2>,
}

// Start the viewer; returns when the window closes
pub fn run(settings: ViewerSettings) {
    if SETTINGS.set(settings).is_err() {
        warn!("Viewer settings were already set; keeping the first ones");
    }
    nannou::app(model).update(update).run();
}

fn connect_transport(relay: Option<&str>) -> (Box<dyn Transport>, Option<String>) {
    match relay {
        Some(addr) => match JsonLinesTransport::connect(addr) {
            Ok(transport) => (Box::new(transport), None),
            Err(err) => {
                error!("{}; continuing without a relay", err);
                (Box::new(ChannelTransport::new()), Some(err.to_string()))
            }
        },
        None => (Box::new(ChannelTransport::new()), None),
    }
}

// Initialize the model
pub fn model(app: &App) -> Model {
    let settings = SETTINGS.get().cloned().unwrap_or_default();

    // 80% of the primary monitor, or a fixed size when it is unknown
    let (window_width, window_height) = match app.primary_monitor() {
        Some(monitor) => {
            let size = monitor.size();
            (size.width as f32 * 0.8, size.height as f32 * 0.8)
        }
        None => (1280.0, 800.0),
    };

    // Create the main window
    let window_id = app
        .new_window()
        .title("Critters")
        .size(window_width as u32, window_height as u32)
        .view(view)
        .mouse_moved(mouse_moved)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_wheel(mouse_wheel)
        .key_pressed(key_pressed)
        .raw_event(raw_window_event)
        .build()
        .expect("failed to create the viewer window");

    let window = app
        .window(window_id)
        .expect("viewer window closed during startup");

    // Create the UI
    let egui = Egui::from_window(&window);

    let source = Arc::new(GltfSource::new(&settings.asset_root));
    let backend = SceneBackend::new();
    let mut env = match settings.seed {
        Some(seed) => Environment::with_seed(settings.params.clone(), source, backend, seed),
        None => Environment::new(settings.params.clone(), source, backend),
    };

    let (transport, connect_error) = connect_transport(settings.relay.as_deref());
    if let Some(message) = connect_error {
        env.notifications_mut().error(message);
    }

    info!(
        "Viewer ready: assets below {}, capacity {}",
        settings.asset_root.display(),
        settings.params.max_models
    );

    Model {
        env,
        transport,
        egui,
        camera: Camera::new(),
        panel: PanelState::new(settings.model_path.clone(), settings.mesh_name.clone(), &settings.targets),
        params_draft: settings.params.clone(),
        debug_info: DebugInfo::default(),
        show_debug: false,
        mouse_position: Vec2::ZERO,
        press_position: None,
    }
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    let now = Instant::now();
    let dt = update.since_last.as_secs_f32().min(MAX_FRAME_DT);

    model.egui.set_elapsed_time(update.since_start);
    let stats = model.env.stats();
    let actions = {
        let ctx = model.egui.begin_frame();
        let actions = ui::update_ui(
            &ctx,
            &mut model.panel,
            &mut model.params_draft,
            &stats,
            &model.debug_info,
            &mut model.camera.auto_rotate,
            &mut model.show_debug,
        );
        ui::draw_toasts(&ctx, model.env.notifications());
        actions
    };

    if actions.params_changed {
        if let Err(err) = model.env.set_params(model.params_draft.clone()) {
            warn!("Rejected parameter change: {}", err);
            model.env.notifications_mut().warning(err.to_string());
            model.params_draft = model.env.params().clone();
        }
    }
    if let Some(descriptor) = actions.send {
        if let Err(err) = model.transport.publish(&descriptor) {
            error!("Could not send creature: {}", err);
            model.env.notifications_mut().error(format!("Could not send: {}", err));
        }
    }
    if actions.toggle_pause {
        model.env.toggle_pause();
    }
    if actions.clear_all {
        model.env.clear_all();
    }
    if actions.reset_camera {
        model.camera.reset();
    }

    model.camera.update(dt);
    model.env.pump_transport(model.transport.as_mut(), now);
    let report = model.env.frame(dt, now);
    model.debug_info.record_frame(app.fps(), update.since_last, &report);
}
