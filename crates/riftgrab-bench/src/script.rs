use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use riftgrab_core::{ControllerId, Entities, EntityId, RigidBodies, Vec3, ViewerId};
use riftgrab_tool::{Action, ButtonLatch, Eye, GravityGun, GravityGunConfig};
use riftgrab_viz::DebugSettings;
use riftgrab_world::FixedStepper;

use crate::scene::BuiltScene;

/// Buttons held down for the whole step. Edges come from the latch.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Buttons { None, Primary, Secondary }

/// Hold `buttons` for `ticks` update ticks. `aim` re-aims at a named entity every tick of the
/// step; without it the previous aim is kept.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScriptStep {
    pub ticks: u32,
    #[serde(default)]
    pub aim: Option<String>,
    pub buttons: Buttons,
}

pub struct RunOutcome {
    pub ticks: u32,
    pub physics_steps: u64,
    /// Every tick that did something besides idle or holding.
    pub actions: Vec<(u32, Action)>,
    pub gun: GravityGun,
    pub scene: BuiltScene,
}

pub fn run(mut scene: BuiltScene, script: &[ScriptStep], cfg: GravityGunConfig, dt: f32, max_ticks: Option<u32>, print_every: u32) -> Result<RunOutcome> {
    scene.world.set_debug(DebugSettings {
        print_every,
        show_bodies: true,
        show_owners: true,
        show_energy: true,
        max_lines: 8,
    });

    let mut gun = GravityGun::new(ControllerId(1), cfg)?;
    gun.equip(scene.operator.entity, Some(ViewerId(1)));
    gun.active_start();

    let mut stepper = FixedStepper::new(dt);
    let mut latch = ButtonLatch::default();
    let mut aim_dir = Vec3::X;
    let mut actions = Vec::new();
    let mut tick = 0u32;
    let limit = max_ticks.unwrap_or(u32::MAX);

    'script: for step in script {
        let target: Option<EntityId> = step.aim.as_deref().and_then(|n| scene.world.find_entity(n));
        for _ in 0..step.ticks {
            if tick >= limit { break 'script; }
            let w = &mut scene.world;
            let eye_pos = w.body_pose(scene.operator.root).pos + Vec3::Y * scene.eye_height;
            if let Some(e) = target {
                let d = w.entity_position(e) - eye_pos;
                if d.length_squared() > 1.0e-6 { aim_dir = d; }
            }
            let eye = Eye::looking(eye_pos, aim_dir);
            let input = latch.sample(step.buttons == Buttons::Primary, step.buttons == Buttons::Secondary);

            let act = gun.simulate(w, &input, &eye, dt);
            if !matches!(act, Action::None | Action::Holding) {
                info!(target: "riftgrab::bench", tick, ?act, "action");
                actions.push((tick, act));
            }
            stepper.advance(w, dt, |w, ctx| { gun.on_pre_physics_step(w, ctx); });
            tick += 1;
        }
    }

    Ok(RunOutcome { ticks: tick, physics_steps: scene.world.tick_index(), actions, gun, scene })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::default_scene;

    #[test] fn demo_script_grabs_throws_and_pushes() {
        let sd = default_scene();
        let out = run(sd.build().unwrap(), &sd.script, GravityGunConfig::default(), sd.dt, None, 0).unwrap();
        let total: u32 = sd.script.iter().map(|s| s.ticks).sum();
        assert_eq!(out.ticks, total);

        let crate_e = out.scene.world.find_entity("crate").unwrap();
        assert!(out.actions.iter().any(|(_, a)| *a == Action::Grabbed(crate_e)));
        assert!(out.actions.iter().any(|(_, a)| matches!(a, Action::Thrown(r) if r.entity == crate_e)));
        assert!(out.actions.iter().any(|(_, a)| matches!(a, Action::Pushed { .. })));
        assert!(!out.gun.ledger().is_empty());
    }

    #[test] fn same_script_same_digest() {
        let sd = default_scene();
        let a = run(sd.build().unwrap(), &sd.script, GravityGunConfig::default(), sd.dt, Some(200), 0).unwrap();
        let b = run(sd.build().unwrap(), &sd.script, GravityGunConfig::default(), sd.dt, Some(200), 0).unwrap();
        assert_eq!(a.ticks, 200);
        assert_eq!(a.scene.world.state_hash(), b.scene.world.state_hash());
        assert_eq!(a.actions, b.actions);
    }
}
