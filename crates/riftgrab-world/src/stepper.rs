use riftgrab_core::{Scalar, StepCtx, StepStats};

use crate::World;

/// Minimal per-step report used for provenance and checks.
#[derive(Copy, Clone, Debug, Default)]
pub struct StepReport {
    pub tick: u64,
    pub dt: Scalar,
    pub stats: StepStats,
}

/// Fixed-rate driver. Frame time accumulates; each whole `fixed_dt` runs the pre-step hook
/// and then `World::step`, so tools steer bodies at the physics rate, not the frame rate.
pub struct FixedStepper {
    fixed_dt: Scalar,
    max_substeps: u32,
    acc: Scalar,
}

impl FixedStepper {
    pub fn new(fixed_dt: Scalar) -> Self {
        Self { fixed_dt: fixed_dt.max(1.0e-4), max_substeps: 8, acc: 0.0 }
    }
    pub fn with_max_substeps(mut self, n: u32) -> Self { self.max_substeps = n.max(1); self }

    #[inline] pub fn fixed_dt(&self) -> Scalar { self.fixed_dt }
    /// Unconsumed time carried to the next frame.
    #[inline] pub fn pending(&self) -> Scalar { self.acc }

    pub fn advance<F>(&mut self, world: &mut World, frame_dt: Scalar, mut pre_step: F) -> Vec<StepReport>
    where
        F: FnMut(&mut World, StepCtx),
    {
        if frame_dt > 0.0 { self.acc += frame_dt; }
        let mut out = Vec::new();
        while self.acc >= self.fixed_dt {
            if out.len() as u32 == self.max_substeps {
                tracing::warn!(target: "riftgrab::world", dropped = self.acc, "substep budget exhausted");
                self.acc = 0.0;
                break;
            }
            let ctx = StepCtx { dt: self.fixed_dt, tick: world.tick_index() };
            pre_step(world, ctx);
            let mut stats = world.step(self.fixed_dt);
            stats.pre_step_hooks = 1;
            out.push(StepReport { tick: world.tick_index(), dt: self.fixed_dt, stats });
            self.acc -= self.fixed_dt;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorldBuilder;

    #[test] fn runs_one_hook_per_fixed_step() {
        let mut w = WorldBuilder::new().build();
        let mut s = FixedStepper::new(0.01);
        let mut calls = Vec::new();
        let reports = s.advance(&mut w, 0.035, |_, ctx| calls.push(ctx.tick));
        assert_eq!(reports.len(), 3);
        assert_eq!(calls, vec![0, 1, 2]);
        assert!(s.pending() > 0.004 && s.pending() < 0.006);
        assert_eq!(w.tick_index(), 3);
    }

    #[test] fn caps_substeps_and_drops_backlog() {
        let mut w = WorldBuilder::new().build();
        let mut s = FixedStepper::new(0.01).with_max_substeps(2);
        let reports = s.advance(&mut w, 1.0, |_, _| {});
        assert_eq!(reports.len(), 2);
        assert_eq!(s.pending(), 0.0);
    }
}
