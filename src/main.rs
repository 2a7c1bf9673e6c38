/*
 * Critters Viewer
 *
 * Opens a window onto the shared creature environment. Creatures arrive from
 * the control panel (locally, or through a relay every viewer connects to),
 * then flock with creatures of a similar color, bump into each other, feed on
 * contact and shrink away when they go hungry for too long.
 */

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use critters::app::{self, ViewerSettings};
use critters::params::SimulationParams;

#[derive(Debug, Parser)]
#[command(name = "critters", version, about = "Shared creature environment viewer")]
struct Args {
    /// RON file with simulation parameters; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that model paths such as /assets/modelo.glb resolve below
    #[arg(long, default_value = ".")]
    asset_root: PathBuf,

    /// Relay address (host:port) speaking JSON lines; local only when omitted
    #[arg(long)]
    relay: Option<String>,

    /// Seed for placement and wander, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Model the control panel starts with
    #[arg(long, default_value = "/assets/modelo.glb")]
    model: String,

    /// Mesh the panel's morph sliders drive
    #[arg(long, default_value = "Body")]
    mesh: String,

    /// Morph target names offered by the panel (repeat for several)
    #[arg(long = "target")]
    targets: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let params = match &args.config {
        Some(path) => SimulationParams::from_file(path)
            .with_context(|| format!("loading simulation parameters from {}", path.display()))?,
        None => SimulationParams::default(),
    };
    info!("Population capacity {}, lifespan {} s", params.max_models, params.max_lifespan);

    let mut settings = ViewerSettings {
        params,
        asset_root: args.asset_root,
        relay: args.relay,
        seed: args.seed,
        model_path: args.model,
        mesh_name: args.mesh,
        ..ViewerSettings::default()
    };
    if !args.targets.is_empty() {
        settings.targets = args.targets;
    }

    app::run(settings);
    Ok(())
}
