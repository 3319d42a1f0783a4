// Headless gravity gun bench: builds a scene, plays a scripted operator against it at a fixed
// physics rate, then prints every tool action, the controller ledger and the world digest.

mod scene;
mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use riftgrab_tool::GravityGunConfig;
use scene::{default_scene, SceneDescriptor};

#[derive(Parser, Debug)]
#[command(name = "riftgrab-bench", version, about = "Scripted gravity gun run against the reference world")]
struct Opts {
    /// Scene descriptor JSON (default: built-in demo room)
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Gravity gun tuning JSON (default: built-in tuning). RIFTGRAB_* env vars override either.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many update ticks
    #[arg(long)]
    ticks: Option<u32>,

    /// Override the scene's update/physics dt
    #[arg(long)]
    dt: Option<f32>,

    /// World debug output every N physics steps (0 = off)
    #[arg(long, default_value_t = 0)]
    print_every: u32,

    /// Print the built-in scene as JSON and exit
    #[arg(long, action = ArgAction::SetTrue)]
    dump_scene: bool,
}

fn hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes { use std::fmt::Write; let _ = write!(s, "{:02x}", b); }
    s
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let opts = Opts::parse();

    if opts.dump_scene {
        println!("{}", serde_json::to_string_pretty(&default_scene())?);
        return Ok(());
    }

    let mut sd = match &opts.scene {
        Some(p) => SceneDescriptor::load(p)?,
        None => default_scene(),
    };
    if let Some(dt) = opts.dt { sd.dt = dt; }
    sd.validate().context("scene after overrides")?;

    let cfg = match &opts.config {
        Some(p) => GravityGunConfig::load(p)?,
        None => GravityGunConfig::default(),
    }
    .with_env_overrides()?;

    let built = sd.build()?;
    let out = script::run(built, &sd.script, cfg, sd.dt, opts.ticks, opts.print_every)?;

    println!("ticks {}  physics steps {}", out.ticks, out.physics_steps);
    for (tick, act) in &out.actions {
        println!("  [{tick:>5}] {act:?}");
    }
    println!("ledger ({} events):", out.gun.ledger().len());
    for ev in out.gun.ledger().iter() {
        println!("  {ev:?}");
    }
    let w = &out.scene.world;
    println!("holding {:?}", out.gun.held_entity().and_then(|e| w.entity_name(e)));
    println!("kinetic energy {:.3}", w.kinetic_energy());
    println!("final hash = {}", hex(&w.state_hash()));
    Ok(())
}
