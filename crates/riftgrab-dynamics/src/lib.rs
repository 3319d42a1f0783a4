pub mod groups;
pub mod smooth;

pub use groups::Groups;
pub use smooth::{smooth_damp, smooth_damp_rotation};

use std::sync::atomic::{AtomicU32, Ordering};

use riftgrab_core::types::{Isometry, Velocity, Vec3, Mat3};
use riftgrab_core::{BodyKind, ControllerId, GroupId, Quat, Scalar};
use riftgrab_geom::MassProps;

const NO_OWNER: u32 = 0;

/// Input descriptor when creating a body.
#[derive(Copy, Clone, Debug)]
pub struct BodyDesc {
    pub pose: Isometry,
    pub vel: Velocity,
    pub mass: MassProps,
    pub kind: BodyKind,
    pub actor_controlled: bool,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            pose: Isometry::default(),
            vel: Velocity::default(),
            mass: MassProps::from_box(Vec3::splat(0.5), 1000.0),
            kind: BodyKind::Dynamic,
            actor_controlled: false,
        }
    }
}

/// SoA body storage with ID = index semantics. Removed bodies keep their slot and
/// report `is_valid == false`, so stale ids are always detectable.
pub struct Bodies {
    pos: Vec<Vec3>,
    rot: Vec<Quat>,
    linvel: Vec<Vec3>,
    angvel: Vec<Vec3>,
    mass: Vec<Scalar>,
    inv_mass: Vec<Scalar>,
    local_com: Vec<Vec3>,
    inv_inertia_local: Vec<Mat3>,
    kind: Vec<BodyKind>,
    alive: Vec<bool>,
    sleeping: Vec<bool>,
    auto_sleep: Vec<bool>,
    still_time: Vec<Scalar>,
    group: Vec<Option<GroupId>>,
    actor: Vec<bool>,
    owner: Vec<AtomicU32>,
}

impl Bodies {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            pos:     Vec::with_capacity(cap),
            rot:     Vec::with_capacity(cap),
            linvel:  Vec::with_capacity(cap),
            angvel:  Vec::with_capacity(cap),
            mass:    Vec::with_capacity(cap),
            inv_mass: Vec::with_capacity(cap),
            local_com: Vec::with_capacity(cap),
            inv_inertia_local: Vec::with_capacity(cap),
            kind:    Vec::with_capacity(cap),
            alive:   Vec::with_capacity(cap),
            sleeping: Vec::with_capacity(cap),
            auto_sleep: Vec::with_capacity(cap),
            still_time: Vec::with_capacity(cap),
            group:   Vec::with_capacity(cap),
            actor:   Vec::with_capacity(cap),
            owner:   Vec::with_capacity(cap),
        }
    }

    pub fn add(&mut self, desc: BodyDesc) -> u32 {
        let (mass, inv_mass) = match desc.kind {
            BodyKind::Dynamic => (desc.mass.mass, desc.mass.inv_mass),
            // kinematic/static bodies never respond to impulses
            BodyKind::Kinematic | BodyKind::Static => (desc.mass.mass, 0.0),
        };
        self.pos.push(desc.pose.pos);
        self.rot.push(desc.pose.rot);
        self.linvel.push(desc.vel.lin);
        self.angvel.push(desc.vel.ang);
        self.mass.push(mass);
        self.inv_mass.push(inv_mass);
        self.local_com.push(desc.mass.local_com);

        let inv_i = if inv_mass > 0.0 {
            let i = desc.mass.inertia;
            if i.determinant().abs() > 1.0e-12 { i.inverse() } else { Mat3::from_diagonal(glam::Vec3::splat(inv_mass)) }
        } else {
            Mat3::ZERO
        };
        self.inv_inertia_local.push(inv_i);

        self.kind.push(desc.kind);
        self.alive.push(true);
        self.sleeping.push(false);
        self.auto_sleep.push(true);
        self.still_time.push(0.0);
        self.group.push(None);
        self.actor.push(desc.actor_controlled);
        self.owner.push(AtomicU32::new(NO_OWNER));

        (self.pos.len() as u32) - 1
    }

    #[inline] pub fn len(&self) -> usize { self.pos.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.pos.is_empty() }
    #[inline] pub fn is_valid(&self, id: u32) -> bool { self.alive.get(id as usize).copied().unwrap_or(false) }

    /// Invalidate a body. Its slot stays allocated; its claim is dropped.
    pub fn remove(&mut self, id: u32) {
        let i = id as usize;
        if i >= self.len() { return; }
        self.alive[i] = false;
        self.linvel[i] = Vec3::ZERO;
        self.angvel[i] = Vec3::ZERO;
        self.owner[i].store(NO_OWNER, Ordering::Release);
    }

    /// Semi-implicit Euler for awake dynamic bodies (with gravity) and kinematic bodies (without).
    pub fn integrate_all(&mut self, gravity: Vec3, dt: Scalar) -> u32 {
        let mut n = 0u32;
        for i in 0..self.len() {
            if !self.alive[i] || self.sleeping[i] { continue; }
            match self.kind[i] {
                BodyKind::Static => continue,
                BodyKind::Dynamic => {
                    if self.inv_mass[i] == 0.0 { continue; }
                    self.linvel[i] += gravity * dt;
                }
                BodyKind::Kinematic => {}
            }
            self.pos[i] += self.linvel[i] * dt;
            let w = self.angvel[i];
            if w.length_squared() > 0.0 {
                let dq = Quat::from_scaled_axis((w * dt).into());
                self.rot[i] = (dq * self.rot[i]).normalize();
            }
            n += 1;
        }
        n
    }

    /// Put auto-sleeping dynamic bodies to sleep once they stayed below `speed` for `time` seconds.
    pub fn update_sleep(&mut self, speed: Scalar, time: Scalar, dt: Scalar) -> u32 {
        let mut asleep = 0u32;
        for i in 0..self.len() {
            if !self.alive[i] || self.kind[i] != BodyKind::Dynamic { continue; }
            if self.sleeping[i] { asleep += 1; continue; }
            if !self.auto_sleep[i] { self.still_time[i] = 0.0; continue; }
            let v2 = self.linvel[i].length_squared() + self.angvel[i].length_squared();
            if v2 < speed * speed {
                self.still_time[i] += dt;
                if self.still_time[i] >= time {
                    self.sleeping[i] = true;
                    self.linvel[i] = Vec3::ZERO;
                    self.angvel[i] = Vec3::ZERO;
                    asleep += 1;
                }
            } else {
                self.still_time[i] = 0.0;
            }
        }
        asleep
    }

    // -------- Accessors --------
    #[inline] pub fn pose(&self, id: u32) -> Isometry {
        let i = id as usize;
        Isometry { pos: self.pos[i], rot: self.rot[i] }
    }
    #[inline] pub fn set_pose(&mut self, id: u32, iso: Isometry) {
        let i = id as usize;
        self.pos[i] = iso.pos;
        self.rot[i] = iso.rot;
    }

    #[inline] pub fn vel(&self, id: u32) -> Velocity {
        let i = id as usize;
        Velocity { lin: self.linvel[i], ang: self.angvel[i] }
    }
    /// Writing a non-zero velocity wakes the body.
    #[inline] pub fn set_vel(&mut self, id: u32, v: Velocity) {
        let i = id as usize;
        self.linvel[i] = v.lin;
        self.angvel[i] = v.ang;
        if v.lin != Vec3::ZERO || v.ang != Vec3::ZERO { self.wake(id); }
    }

    #[inline] pub fn mass_of(&self, id: u32) -> Scalar { self.mass[id as usize] }
    #[inline] pub fn inv_mass_of(&self, id: u32) -> Scalar { self.inv_mass[id as usize] }
    #[inline] pub fn local_com(&self, id: u32) -> Vec3 { self.local_com[id as usize] }
    #[inline] pub fn world_com(&self, id: u32) -> Vec3 { self.pose(id).transform_point(self.local_com(id)) }
    #[inline] pub fn kind(&self, id: u32) -> BodyKind { self.kind[id as usize] }
    #[inline] pub fn is_dynamic(&self, id: u32) -> bool { self.kind[id as usize] == BodyKind::Dynamic }
    #[inline] pub fn is_actor(&self, id: u32) -> bool { self.actor[id as usize] }

    // -------- Sleep --------
    #[inline] pub fn is_sleeping(&self, id: u32) -> bool { self.sleeping[id as usize] }
    pub fn set_sleeping(&mut self, id: u32, sleeping: bool) {
        let i = id as usize;
        self.sleeping[i] = sleeping;
        self.still_time[i] = 0.0;
        if sleeping {
            self.linvel[i] = Vec3::ZERO;
            self.angvel[i] = Vec3::ZERO;
        }
    }
    #[inline] pub fn wake(&mut self, id: u32) { self.set_sleeping(id, false); }
    #[inline] pub fn auto_sleep(&self, id: u32) -> bool { self.auto_sleep[id as usize] }
    #[inline] pub fn set_auto_sleep(&mut self, id: u32, enabled: bool) {
        let i = id as usize;
        self.auto_sleep[i] = enabled;
        self.still_time[i] = 0.0;
    }

    // -------- Groups --------
    #[inline] pub fn group_of(&self, id: u32) -> Option<GroupId> { self.group[id as usize] }
    #[inline] pub(crate) fn set_group(&mut self, id: u32, g: GroupId) { self.group[id as usize] = Some(g); }

    // -------- Ownership tokens --------
    /// Single compare-and-set: succeeds when unowned, or already owned by `owner`.
    pub fn try_claim(&self, id: u32, owner: ControllerId) -> bool {
        if owner.0 == NO_OWNER || !self.is_valid(id) { return false; }
        match self.owner[id as usize].compare_exchange(NO_OWNER, owner.0, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => true,
            Err(current) => current == owner.0,
        }
    }
    pub fn release_claim(&self, id: u32, owner: ControllerId) -> bool {
        match self.owner.get(id as usize) {
            Some(slot) => slot.compare_exchange(owner.0, NO_OWNER, Ordering::AcqRel, Ordering::Acquire).is_ok(),
            None => false,
        }
    }
    pub fn owner_of(&self, id: u32) -> Option<ControllerId> {
        let v = self.owner.get(id as usize)?.load(Ordering::Acquire);
        if v == NO_OWNER { None } else { Some(ControllerId(v)) }
    }

    // -------- Inertia --------
    #[inline] pub fn inertia_inv_local(&self, id: u32) -> Mat3 {
        self.inv_inertia_local[id as usize]
    }
    /// World-space inverse inertia: R * I^-1_local * R^T.
    pub fn inv_inertia_world(&self, id: u32) -> Mat3 {
        if self.inv_mass_of(id) == 0.0 { return Mat3::ZERO; }
        let r = Mat3::from_quat(self.rot[id as usize]);
        r * self.inv_inertia_local[id as usize] * r.transpose()
    }

    // -------- Impulses (all wake the body) --------
    pub fn apply_impulse(&mut self, id: u32, j: Vec3) {
        let i = id as usize;
        let im = self.inv_mass[i];
        if im == 0.0 || !self.alive[i] { return; }
        self.linvel[i] += j * im;
        self.wake(id);
    }

    /// Impulse at a world point: linear part plus the torque about the center of mass.
    pub fn apply_impulse_at(&mut self, id: u32, point: Vec3, j: Vec3) {
        if self.inv_mass_of(id) == 0.0 || !self.is_valid(id) { return; }
        let r = point - self.world_com(id);
        self.apply_impulse(id, j);
        self.apply_angular_impulse(id, r.cross(j));
    }

    /// Apply an angular impulse (world space): dw = I^-1_world * tau.
    pub fn apply_angular_impulse(&mut self, id: u32, tau_impulse: Vec3) {
        let i = id as usize;
        if self.inv_mass[i] == 0.0 || !self.alive[i] { return; }
        let inv_i_w = self.inv_inertia_world(id);
        self.angvel[i] += inv_i_w * tau_impulse;
        self.wake(id);
    }

    /// Position delta (already scaled for this body); used by joint projection.
    #[inline] pub fn apply_position_delta(&mut self, id: u32, dp: Vec3) {
        let i = id as usize;
        self.pos[i] += dp;
    }

    pub fn indices(&self) -> impl ExactSizeIterator<Item=u32> + '_ {
        0..(self.len() as u32)
    }
}

impl Default for Bodies {
    fn default() -> Self { Self::with_capacity(0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftgrab_core::vec3;

    fn one_kg_box() -> BodyDesc {
        BodyDesc { mass: MassProps::from_box(Vec3::splat(0.5), 1.0), ..Default::default() }
    }

    #[test] fn claim_is_exclusive_and_reentrant() {
        let mut b = Bodies::default();
        let id = b.add(one_kg_box());
        assert!(b.try_claim(id, ControllerId(1)));
        assert!(b.try_claim(id, ControllerId(1)));
        assert!(!b.try_claim(id, ControllerId(2)));
        assert!(!b.release_claim(id, ControllerId(2)));
        assert!(b.release_claim(id, ControllerId(1)));
        assert_eq!(b.owner_of(id), None);
        assert!(b.try_claim(id, ControllerId(2)));
    }

    #[test] fn removed_body_is_invalid_and_unclaimable() {
        let mut b = Bodies::default();
        let id = b.add(one_kg_box());
        assert!(b.try_claim(id, ControllerId(7)));
        b.remove(id);
        assert!(!b.is_valid(id));
        assert_eq!(b.owner_of(id), None);
        assert!(!b.try_claim(id, ControllerId(7)));
        assert!(!b.is_valid(99));
    }

    #[test] fn impulse_scales_by_inverse_mass_and_wakes() {
        let mut b = Bodies::default();
        let id = b.add(one_kg_box());
        b.set_sleeping(id, true);
        b.apply_impulse(id, vec3(3.0, 0.0, 0.0));
        assert!(!b.is_sleeping(id));
        assert!((b.vel(id).lin.x - 3.0).abs() < 1e-5);
    }

    #[test] fn static_bodies_ignore_impulses() {
        let mut b = Bodies::default();
        let id = b.add(BodyDesc { kind: BodyKind::Static, ..one_kg_box() });
        b.apply_impulse(id, vec3(3.0, 0.0, 0.0));
        assert_eq!(b.vel(id).lin, Vec3::ZERO);
    }

    #[test] fn off_center_impulse_spins() {
        let mut b = Bodies::default();
        let id = b.add(one_kg_box());
        b.apply_impulse_at(id, vec3(0.0, 0.5, 0.0), vec3(1.0, 0.0, 0.0));
        assert!(b.vel(id).ang.z < 0.0);
    }

    #[test] fn auto_sleep_after_still_time() {
        let mut b = Bodies::default();
        let id = b.add(one_kg_box());
        let held = b.add(one_kg_box());
        b.set_auto_sleep(held, false);
        for _ in 0..10 { b.update_sleep(0.1, 0.1, 0.02); }
        assert!(b.is_sleeping(id));
        assert!(!b.is_sleeping(held));
    }
}
