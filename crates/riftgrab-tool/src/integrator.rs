//! Fixed-step steering of the held body toward its hold target.

use riftgrab_core::{PhysicsHost, Scalar, Velocity};
use riftgrab_dynamics::{smooth_damp, smooth_damp_rotation};

use crate::session::GrabSession;

/// Outcome of one pre-step pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HoldStep {
    Idle,
    /// Held body is driven by an actor; left alone.
    Actor,
    Driven,
    /// Held body or entity vanished; the session was reset.
    Reset,
}

/// Steers the held body toward the hold target by rewriting its velocities once per
/// fixed physics step. The body stays a normal dynamic body, so contacts still act on it.
#[derive(Copy, Clone, Debug)]
pub struct HoldIntegrator {
    pub smooth_time: Scalar,
}

impl HoldIntegrator {
    pub fn new(smooth_time: Scalar) -> Self { Self { smooth_time } }

    pub fn pre_step<H: PhysicsHost>(&self, session: &mut GrabSession, host: &mut H, dt: Scalar) -> HoldStep {
        let Some(h) = session.held().copied() else { return HoldStep::Idle };
        if session.is_stale(host) {
            session.force_reset(host);
            return HoldStep::Reset;
        }
        if host.actor_controlled(h.body) { return HoldStep::Actor; }

        let pose = host.body_pose(h.body);
        let Velocity { mut lin, mut ang } = host.body_vel(h.body);
        smooth_damp(pose.pos, h.hold_target.pos, &mut lin, self.smooth_time, dt);
        smooth_damp_rotation(pose.rot, h.hold_target.rot, &mut ang, self.smooth_time, dt);
        host.set_body_vel(h.body, Velocity { lin, ang });
        HoldStep::Driven
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftgrab_core::{iso, quat_identity, vec3, ControllerId, Isometry, Quat, RigidBodies, Vec3};
    use riftgrab_geom::Shape;
    use riftgrab_world::{FixedStepper, WorldBuilder};

    #[test] fn held_body_settles_on_target_without_teleporting() {
        let mut w = WorldBuilder::new().ground(None).build();
        let p = w.spawn_prop("p", iso(vec3(5.0, 0.0, 0.0), quat_identity()), Shape::Box { hx: 0.5, hy: 0.5, hz: 0.5 }, 10.0);
        let mut s = GrabSession::new(ControllerId(1), 0.5);
        s.start(&mut w, p.entity, p.root, Isometry::default(), None).unwrap();
        let eye_rot = Quat::from_rotation_y(0.5);
        assert!(s.move_target(&w, Vec3::ZERO, Vec3::Z, eye_rot, 3.0));
        let target = s.hold_target().unwrap();

        let integ = HoldIntegrator::new(0.05);
        let mut stepper = FixedStepper::new(1.0 / 60.0);
        let mut prev = w.body_pose(p.root).pos;
        for _ in 0..120 {
            stepper.advance(&mut w, 1.0 / 60.0, |w, ctx| {
                assert_eq!(integ.pre_step(&mut s, w, ctx.dt), HoldStep::Driven);
            });
            let now = w.body_pose(p.root).pos;
            assert!(now.distance(prev) < 2.0, "jumped {}", now.distance(prev));
            prev = now;
        }
        let pose = w.body_pose(p.root);
        assert!(pose.pos.distance(target.pos) < 0.05, "off by {}", pose.pos.distance(target.pos));
        assert!(pose.rot.angle_between(target.rot) < 0.05);
    }

    #[test] fn actor_bodies_are_left_alone() {
        let mut w = WorldBuilder::new().ground(None).gravity(Vec3::ZERO).build();
        let a = w.spawn_actor("player2", iso(vec3(3.0, 0.0, 0.0), quat_identity()), Shape::Capsule { r: 0.4, hh: 0.6 }, 80.0);
        let mut s = GrabSession::new(ControllerId(1), 0.5);
        s.start(&mut w, a.entity, a.root, Isometry::default(), None).unwrap();
        s.move_target(&w, Vec3::ZERO, Vec3::X, Quat::IDENTITY, 3.0);
        let integ = HoldIntegrator::new(0.05);
        assert_eq!(integ.pre_step(&mut s, &mut w, 1.0 / 60.0), HoldStep::Actor);
        assert_eq!(w.body_vel(a.root).lin, Vec3::ZERO);
    }

    #[test] fn vanished_body_resets_session() {
        let mut w = WorldBuilder::new().build();
        let p = w.spawn_prop("p", Isometry::default(), Shape::Sphere { r: 0.5 }, 10.0);
        let mut s = GrabSession::new(ControllerId(1), 0.5);
        let integ = HoldIntegrator::new(0.05);
        assert_eq!(integ.pre_step(&mut s, &mut w, 1.0 / 60.0), HoldStep::Idle);
        s.start(&mut w, p.entity, p.root, Isometry::default(), None).unwrap();
        w.remove_entity(p.entity);
        assert_eq!(integ.pre_step(&mut s, &mut w, 1.0 / 60.0), HoldStep::Reset);
        assert!(!s.is_holding());
    }
}
