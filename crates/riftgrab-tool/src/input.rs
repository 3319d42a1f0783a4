use riftgrab_core::{Quat, Vec3};

/// One logical button for one update tick. `pressed` is the down edge, `down` the level.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub pressed: bool,
    pub down: bool,
}

impl ButtonState {
    pub const UP: ButtonState = ButtonState { pressed: false, down: false };
    /// First tick of a press.
    pub const TAP: ButtonState = ButtonState { pressed: true, down: true };
    /// Still held after the first tick.
    pub const HELD: ButtonState = ButtonState { pressed: false, down: true };
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub primary: ButtonState,
    pub secondary: ButtonState,
}

impl InputFrame {
    pub fn none() -> Self { Self::default() }
    pub fn primary(s: ButtonState) -> Self { Self { primary: s, ..Self::default() } }
    pub fn secondary(s: ButtonState) -> Self { Self { secondary: s, ..Self::default() } }
}

/// Derives edges from raw levels sampled once per update tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct ButtonLatch { prev_primary: bool, prev_secondary: bool }

impl ButtonLatch {
    pub fn sample(&mut self, primary_down: bool, secondary_down: bool) -> InputFrame {
        let f = InputFrame {
            primary: ButtonState { pressed: primary_down && !self.prev_primary, down: primary_down },
            secondary: ButtonState { pressed: secondary_down && !self.prev_secondary, down: secondary_down },
        };
        self.prev_primary = primary_down;
        self.prev_secondary = secondary_down;
        f
    }
}

/// Operator view: eye position and orientation. Forward is local +X.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Eye {
    pub origin: Vec3,
    pub rotation: Quat,
}

impl Eye {
    pub fn new(origin: Vec3, rotation: Quat) -> Self { Self { origin, rotation } }

    /// Eye at `origin` looking along `dir` (no roll about the aim axis beyond the shortest arc).
    pub fn looking(origin: Vec3, dir: Vec3) -> Self {
        let d = dir.normalize_or_zero();
        let rotation = if d == Vec3::ZERO { Quat::IDENTITY } else { Quat::from_rotation_arc(glam::Vec3::X, d.into()) };
        Self { origin, rotation }
    }

    #[inline] pub fn forward(&self) -> Vec3 { self.rotation * Vec3::X }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn latch_reports_edges_once() {
        let mut l = ButtonLatch::default();
        assert_eq!(l.sample(true, false).primary, ButtonState::TAP);
        assert_eq!(l.sample(true, false).primary, ButtonState::HELD);
        assert_eq!(l.sample(false, true).primary, ButtonState::UP);
        assert!(l.sample(false, true).secondary.down);
    }

    #[test] fn looking_points_forward_along_dir() {
        let e = Eye::looking(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0));
        assert!((e.forward() - Vec3::Z).length() < 1e-5);
        assert_eq!(Eye::looking(Vec3::ZERO, Vec3::ZERO).forward(), Vec3::X);
    }
}
