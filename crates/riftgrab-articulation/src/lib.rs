use riftgrab_core::{Scalar, BodyId, JointId, Vec3, Velocity};
use riftgrab_dynamics::Bodies;

/// XPBD distance joint between body centers.
/// Rest length L, compliance a (0 = rigid).
#[derive(Copy, Clone, Debug)]
pub struct DistanceJoint {
    pub a: BodyId,
    pub b: BodyId,
    pub rest: Scalar,
    pub compliance: Scalar,
}

#[derive(Default)]
pub struct Joints {
    distance: Vec<DistanceJoint>,
}

impl Joints {
    pub fn new() -> Self { Self { distance: Vec::new() } }
    pub fn len(&self) -> usize { self.distance.len() }
    pub fn is_empty(&self) -> bool { self.distance.is_empty() }

    pub fn add_distance_joint(&mut self, a: BodyId, b: BodyId, rest: Scalar, compliance: Scalar) -> JointId {
        self.distance.push(DistanceJoint { a, b, rest, compliance });
        JointId((self.distance.len() as u32) - 1)
    }

    /// Join consecutive bodies at their current separation (ragdoll spine / chain).
    pub fn chain(&mut self, bodies: &Bodies, members: &[BodyId], compliance: Scalar) {
        for pair in members.windows(2) {
            let rest = (bodies.pose(pair[1].0).pos - bodies.pose(pair[0].0).pos).length();
            self.add_distance_joint(pair[0], pair[1], rest, compliance);
        }
    }

    /// XPBD positional solve, followed by a velocity fix-up so projected motion is not lost
    /// on the next integration. Joints touching an invalid body are skipped.
    pub fn solve(&self, bodies: &mut Bodies, dt: Scalar, iterations: u32) {
        if self.distance.is_empty() || dt <= 0.0 { return; }
        let alpha_dt2 = |c: Scalar| if c <= 0.0 { 0.0 } else { c / (dt * dt) };

        for _ in 0..iterations {
            for j in &self.distance {
                let (ia, ib) = (j.a.0, j.b.0);
                if !bodies.is_valid(ia) || !bodies.is_valid(ib) { continue; }

                let wa = bodies.inv_mass_of(ia);
                let wb = bodies.inv_mass_of(ib);
                let w_sum = wa + wb;
                if w_sum == 0.0 { continue; }

                let pa = bodies.pose(ia).pos;
                let pb = bodies.pose(ib).pos;
                let d  = pb - pa;
                let len = d.length();
                if len <= 1.0e-6 { continue; }

                let n = d / len;
                let c_val = len - j.rest;
                if c_val.abs() <= 1.0e-6 { continue; }

                let lambda = -c_val / (w_sum + alpha_dt2(j.compliance));
                let dp_a = -n * (lambda * wa);
                let dp_b =  n * (lambda * wb);

                bodies.apply_position_delta(ia, dp_a);
                bodies.apply_position_delta(ib, dp_b);
                add_linear(bodies, ia, dp_a / dt);
                add_linear(bodies, ib, dp_b / dt);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DistanceJoint> + '_ { self.distance.iter() }
}

#[inline]
fn add_linear(bodies: &mut Bodies, id: u32, dv: Vec3) {
    if dv == Vec3::ZERO { return; }
    let v = bodies.vel(id);
    bodies.set_vel(id, Velocity { lin: v.lin + dv, ang: v.ang });
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftgrab_core::{iso, vec3, Quat};
    use riftgrab_dynamics::BodyDesc;

    #[test] fn stretched_joint_pulls_bodies_back() {
        let mut bodies = Bodies::default();
        let a = BodyId(bodies.add(BodyDesc { pose: iso(vec3(0.0, 0.0, 0.0), Quat::IDENTITY), ..Default::default() }));
        let b = BodyId(bodies.add(BodyDesc { pose: iso(vec3(1.0, 0.0, 0.0), Quat::IDENTITY), ..Default::default() }));
        let mut joints = Joints::new();
        joints.chain(&bodies, &[a, b], 0.0);
        bodies.apply_position_delta(b.0, vec3(1.0, 0.0, 0.0));
        joints.solve(&mut bodies, 1.0 / 60.0, 8);
        let len = (bodies.pose(b.0).pos - bodies.pose(a.0).pos).length();
        assert!((len - 1.0).abs() < 1e-3);
    }

    #[test] fn invalid_members_are_skipped() {
        let mut bodies = Bodies::default();
        let a = BodyId(bodies.add(BodyDesc::default()));
        let b = BodyId(bodies.add(BodyDesc { pose: iso(vec3(3.0, 0.0, 0.0), Quat::IDENTITY), ..Default::default() }));
        let mut joints = Joints::new();
        joints.add_distance_joint(a, b, 1.0, 0.0);
        bodies.remove(b.0);
        joints.solve(&mut bodies, 1.0 / 60.0, 4);
        assert_eq!(bodies.pose(a.0).pos, Vec3::ZERO);
    }
}
