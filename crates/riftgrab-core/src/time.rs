use crate::Scalar;

#[derive(Copy, Clone, Debug, Default)]
pub struct StepStats {
    pub bodies_integrated: u32,
    pub ground_contacts: u32,
    pub sleeping: u32,
    pub pre_step_hooks: u32,
}

/// Seconds elapsed since the last `reset`. Advanced explicitly by the owner's clock,
/// so two instances fed the same ticks always agree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeSince(Scalar);

impl TimeSince {
    /// A timer that has never been reset; compares greater than any window.
    pub const NEVER: TimeSince = TimeSince(Scalar::INFINITY);

    #[inline] pub fn zero() -> Self { Self(0.0) }
    #[inline] pub fn reset(&mut self) { self.0 = 0.0; }
    #[inline] pub fn seconds(&self) -> Scalar { self.0 }
    #[inline] pub fn advance(&mut self, dt: Scalar) { if dt > 0.0 { self.0 += dt; } }
    #[inline] pub fn within(&self, window: Scalar) -> bool { self.0 < window }
}

impl Default for TimeSince {
    fn default() -> Self { Self::NEVER }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn never_is_outside_every_window() {
        let t = TimeSince::default();
        assert!(!t.within(1.0e9));
    }

    #[test] fn reset_then_advance() {
        let mut t = TimeSince::NEVER;
        t.reset();
        t.advance(0.1);
        t.advance(-5.0);
        assert!(t.within(0.3));
        t.advance(0.25);
        assert!(!t.within(0.3));
    }
}
