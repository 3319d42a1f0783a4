use riftgrab_core::{BodyId, GroupId, Vec3};
use crate::Bodies;

/// Articulated sets of bodies (ragdolls) that move and receive impulses as one.
#[derive(Default)]
pub struct Groups {
    members: Vec<Vec<BodyId>>,
}

impl Groups {
    pub fn new() -> Self { Self { members: Vec::new() } }

    /// Create a group and stamp membership on each body. A body joins at most one group;
    /// joining a second time moves it.
    pub fn add(&mut self, bodies: &mut Bodies, members: &[BodyId]) -> GroupId {
        let g = GroupId(self.members.len() as u32);
        for m in members {
            if let Some(old) = bodies.group_of(m.0) {
                if let Some(list) = self.members.get_mut(old.0 as usize) { list.retain(|b| b != m); }
            }
            bodies.set_group(m.0, g);
        }
        self.members.push(members.to_vec());
        g
    }

    pub fn members(&self, g: GroupId) -> &[BodyId] {
        self.members.get(g.0 as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of members that are still valid.
    pub fn body_count(&self, bodies: &Bodies, g: GroupId) -> usize {
        self.members(g).iter().filter(|b| bodies.is_valid(b.0)).count()
    }

    pub fn len(&self) -> usize { self.members.len() }
    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    /// `with_mass` turns `j` into a per-member velocity change (j * mass_i).
    pub fn apply_impulse(&self, bodies: &mut Bodies, g: GroupId, j: Vec3, with_mass: bool) {
        for b in self.members(g) {
            if !bodies.is_valid(b.0) { continue; }
            let scaled = if with_mass { j * bodies.mass_of(b.0) } else { j };
            bodies.apply_impulse(b.0, scaled);
        }
    }

    pub fn apply_angular_impulse(&self, bodies: &mut Bodies, g: GroupId, j: Vec3, with_mass: bool) {
        for b in self.members(g) {
            if !bodies.is_valid(b.0) { continue; }
            let scaled = if with_mass { j * bodies.mass_of(b.0) } else { j };
            bodies.apply_angular_impulse(b.0, scaled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BodyDesc;
    use riftgrab_core::vec3;
    use riftgrab_geom::MassProps;

    #[test] fn mass_scaled_group_impulse_is_a_velocity_change() {
        let mut bodies = Bodies::default();
        let light = bodies.add(BodyDesc { mass: MassProps::from_sphere(0.5, 1000.0).with_mass(2.0), ..Default::default() });
        let heavy = bodies.add(BodyDesc { mass: MassProps::from_sphere(0.5, 1000.0).with_mass(8.0), ..Default::default() });
        let mut groups = Groups::new();
        let g = groups.add(&mut bodies, &[BodyId(light), BodyId(heavy)]);
        groups.apply_impulse(&mut bodies, g, vec3(0.0, 0.0, 5.0), true);
        assert!((bodies.vel(light).lin.z - 5.0).abs() < 1e-4);
        assert!((bodies.vel(heavy).lin.z - 5.0).abs() < 1e-4);
        assert_eq!(groups.body_count(&bodies, g), 2);
        bodies.remove(heavy);
        assert_eq!(groups.body_count(&bodies, g), 1);
    }

    #[test] fn rejoining_moves_membership() {
        let mut bodies = Bodies::default();
        let a = BodyId(bodies.add(BodyDesc::default()));
        let mut groups = Groups::new();
        let g0 = groups.add(&mut bodies, &[a]);
        let g1 = groups.add(&mut bodies, &[a]);
        assert_eq!(bodies.group_of(a.0), Some(g1));
        assert!(groups.members(g0).is_empty());
    }
}
