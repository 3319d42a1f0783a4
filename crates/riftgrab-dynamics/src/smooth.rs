//! Critically damped smoothing ("smooth damp").
//!
//! The velocity argument is both input and output: callers feed the body's current velocity
//! and write the returned value back, so contacts that slowed the body feed into the next step.

use riftgrab_core::{Quat, Scalar, Vec3};

/// One step of a critically damped spring from `current` toward `target`.
/// Returns the smoothed position and updates `velocity` in place. Never overshoots.
pub fn smooth_damp(current: Vec3, target: Vec3, velocity: &mut Vec3, smooth_time: Scalar, dt: Scalar) -> Vec3 {
    if dt <= 0.0 { return current; }
    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * exp;
    let out = target + (change + temp) * exp;

    if (target - current).dot(out - target) > 0.0 {
        *velocity = Vec3::ZERO;
        return target;
    }
    out
}

/// Rotational counterpart: smooths along the shortest arc from `current` to `target`,
/// treating `ang_vel` (world space, rad/s) as the spring velocity.
pub fn smooth_damp_rotation(current: Quat, target: Quat, ang_vel: &mut Vec3, smooth_time: Scalar, dt: Scalar) -> Quat {
    if dt <= 0.0 { return current; }
    let mut delta = target * current.inverse();
    if delta.w < 0.0 { delta = -delta; }
    let gap = Vec3::from(delta.to_scaled_axis());
    let step = smooth_damp(Vec3::ZERO, gap, ang_vel, smooth_time, dt);
    (Quat::from_scaled_axis(step.into()) * current).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftgrab_core::vec3;

    #[test] fn converges_without_overshoot() {
        for dt in [1.0 / 30.0, 1.0 / 60.0, 1.0 / 120.0] {
            let target = vec3(10.0, 0.0, 0.0);
            let mut p = Vec3::ZERO;
            let mut v = Vec3::ZERO;
            for _ in 0..120 {
                smooth_damp(p, target, &mut v, 0.05, dt);
                p += v * dt;
                assert!(p.x <= target.x + 1e-3);
            }
            assert!((p - target).length() < 1e-2);
        }
    }

    #[test] fn zero_dt_is_a_no_op() {
        let mut v = vec3(1.0, 2.0, 3.0);
        let p = smooth_damp(Vec3::ZERO, vec3(5.0, 0.0, 0.0), &mut v, 0.05, 0.0);
        assert_eq!(p, Vec3::ZERO);
        assert_eq!(v, vec3(1.0, 2.0, 3.0));
    }

    #[test] fn angular_velocity_turns_toward_target() {
        let target = Quat::from_rotation_y(1.0);
        let mut q = Quat::IDENTITY;
        let mut w = Vec3::ZERO;
        let dt = 1.0 / 60.0;
        for _ in 0..120 {
            smooth_damp_rotation(q, target, &mut w, 0.05, dt);
            q = (Quat::from_scaled_axis((w * dt).into()) * q).normalize();
        }
        assert!(q.angle_between(target) < 1e-2);
    }
}
