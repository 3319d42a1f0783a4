//! Idle / Holding state of one controller: claiming a body, releasing it, throwing it, and
//! tracking where the held body should be.

use riftgrab_core::{
    BodyId, BodyKind, ControllerId, EntityId, Isometry, PhysicsHost, Quat, Scalar, TimeSince, Vec3, ViewerId,
    XorShift64, GRABBED_TAG,
};
use riftgrab_viz::RejectKind;
use thiserror::Error;

use crate::selector::TargetMemory;

/// Why `GrabSession::start` left the session unchanged.
#[derive(Copy, Clone, Debug, PartialEq, Error)]
pub enum GrabReject {
    #[error("{0} is not valid")]
    InvalidBody(BodyId),
    #[error("{0} is not valid")]
    InvalidEntity(EntityId),
    #[error("{0} is not part of a physics group")]
    NoGroup(BodyId),
    #[error("{0} is not dynamic")]
    NotDynamic(BodyId),
    #[error("{0} is held by another controller")]
    ClaimedElsewhere(BodyId),
    #[error("re-grab cooldown, {remaining:.3}s left")]
    Cooldown { remaining: Scalar },
}

impl GrabReject {
    pub fn kind(&self) -> RejectKind {
        match self {
            GrabReject::InvalidBody(_) | GrabReject::InvalidEntity(_) => RejectKind::InvalidBody,
            GrabReject::NoGroup(_) => RejectKind::NoGroup,
            GrabReject::NotDynamic(_) => RejectKind::NotDynamic,
            GrabReject::ClaimedElsewhere(_) => RejectKind::ClaimedElsewhere,
            GrabReject::Cooldown { .. } => RejectKind::Cooldown,
        }
    }
}

/// Everything captured about the held body. Exists exactly while Holding.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Held {
    pub entity: EntityId,
    pub body: BodyId,
    /// Center of mass in the body's frame.
    pub local_com_offset: Vec3,
    /// Body rotation relative to the grab rotation.
    pub rotation_offset: Quat,
    /// Pose the integrator drives the body toward.
    pub hold_target: Isometry,
    viewer: Option<ViewerId>,
    prior_auto_sleep: bool,
}

#[derive(Copy, Clone, Debug)]
pub struct ThrowParams {
    pub force: Scalar,
    /// Linear scale for multi-body groups.
    pub group_scale: Scalar,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ThrowReport {
    pub entity: EntityId,
    pub body: BodyId,
    pub members: u32,
    /// Linear velocity change given to each thrown body.
    pub linear: Scalar,
}

/// Idle / Holding state machine of one controller.
pub struct GrabSession {
    controller: ControllerId,
    drop_cooldown: Scalar,
    held: Option<Held>,
    memory: TargetMemory,
    time_since_released: TimeSince,
}

impl GrabSession {
    pub fn new(controller: ControllerId, drop_cooldown: Scalar) -> Self {
        Self {
            controller,
            drop_cooldown: drop_cooldown.max(0.0),
            held: None,
            memory: TargetMemory::default(),
            time_since_released: TimeSince::NEVER,
        }
    }

    #[inline] pub fn controller(&self) -> ControllerId { self.controller }
    #[inline] pub fn is_holding(&self) -> bool { self.held.is_some() }
    #[inline] pub fn held(&self) -> Option<&Held> { self.held.as_ref() }
    #[inline] pub fn held_entity(&self) -> Option<EntityId> { self.held.map(|h| h.entity) }
    #[inline] pub fn held_body(&self) -> Option<BodyId> { self.held.map(|h| h.body) }
    #[inline] pub fn hold_target(&self) -> Option<Isometry> { self.held.map(|h| h.hold_target) }
    #[inline] pub fn memory(&self) -> &TargetMemory { &self.memory }
    #[inline] pub fn memory_mut(&mut self) -> &mut TargetMemory { &mut self.memory }
    #[inline] pub fn time_since_released(&self) -> Scalar { self.time_since_released.seconds() }

    pub fn remaining_cooldown(&self) -> Scalar {
        (self.drop_cooldown - self.time_since_released.seconds()).max(0.0)
    }

    /// Advance the session clocks by one update tick.
    pub fn tick(&mut self, dt: Scalar) {
        self.time_since_released.advance(dt);
        self.memory.advance(dt);
    }

    /// Held body or entity went away underneath us.
    pub fn is_stale<H: PhysicsHost>(&self, host: &H) -> bool {
        self.held.is_some_and(|h| !host.body_valid(h.body) || !host.entity_valid(h.entity))
    }

    /// Take hold of `body`. Switching from another body claims the new one before letting go
    /// of the old, so a failed claim leaves the current hold untouched.
    pub fn start<H: PhysicsHost>(
        &mut self,
        host: &mut H,
        entity: EntityId,
        body: BodyId,
        grab: Isometry,
        viewer: Option<ViewerId>,
    ) -> Result<(), GrabReject> {
        let remaining = self.remaining_cooldown();
        if remaining > 0.0 { return Err(GrabReject::Cooldown { remaining }); }
        if !host.body_valid(body) { return Err(GrabReject::InvalidBody(body)); }
        if !host.entity_valid(entity) { return Err(GrabReject::InvalidEntity(entity)); }
        if host.body_group(body).is_none() { return Err(GrabReject::NoGroup(body)); }
        if host.body_kind(body) != BodyKind::Dynamic { return Err(GrabReject::NotDynamic(body)); }

        if self.held_body() == Some(body) { self.end(host); }
        if !host.try_claim(body, self.controller) { return Err(GrabReject::ClaimedElsewhere(body)); }
        if self.is_holding() { self.end(host); }

        let pose = host.body_pose(body);
        let prior_auto_sleep = host.auto_sleep(body);
        host.set_sleeping(body, false);
        host.set_auto_sleep(body, false);
        host.add_tag(entity, GRABBED_TAG);
        host.set_collisions_enabled(entity, false);
        if let Some(v) = viewer { host.visibility_add(v, entity); }

        self.held = Some(Held {
            entity,
            body,
            local_com_offset: host.body_local_com(body),
            rotation_offset: (grab.rot.inverse() * pose.rot).normalize(),
            hold_target: pose,
            viewer,
            prior_auto_sleep,
        });
        tracing::debug!(target: "riftgrab::tool", controller = self.controller.0, entity = entity.0, body = body.0,
            gx = grab.pos.x, gy = grab.pos.y, gz = grab.pos.z, "grab start");
        Ok(())
    }

    /// Let go. Idle sessions are left untouched. Returns the released entity.
    pub fn end<H: PhysicsHost>(&mut self, host: &mut H) -> Option<EntityId> {
        let h = self.held.take()?;
        self.time_since_released.reset();

        if host.body_valid(h.body) { host.set_auto_sleep(h.body, h.prior_auto_sleep); }
        if let Some(v) = h.viewer { host.visibility_remove(v, h.entity); }
        if host.entity_valid(h.entity) {
            host.set_collisions_enabled(h.entity, true);
            host.remove_tag(h.entity, GRABBED_TAG);
        }
        host.release_claim(h.body, self.controller);

        tracing::debug!(target: "riftgrab::tool", controller = self.controller.0, entity = h.entity.0, "grab end");
        Some(h.entity)
    }

    /// `end` for a hold whose body or entity became invalid.
    pub fn force_reset<H: PhysicsHost>(&mut self, host: &mut H) -> Option<EntityId> {
        let e = self.end(host)?;
        tracing::warn!(target: "riftgrab::tool", controller = self.controller.0, entity = e.0, "held body went stale, hold reset");
        Some(e)
    }

    /// Fling the held body along `dir` with a random spin, then end the hold.
    pub fn throw<H: PhysicsHost>(&mut self, host: &mut H, dir: Vec3, rng: &mut XorShift64, p: ThrowParams) -> Option<ThrowReport> {
        let h = *self.held.as_ref()?;
        if !host.body_valid(h.body) {
            self.force_reset(host);
            return None;
        }

        let spin = rng.in_unit_sphere();
        let group = host.body_group(h.body);
        let members = group.map_or(1, |g| host.group_body_count(g)) as u32;
        let linear = match group {
            Some(g) if members > 1 => {
                let linear = p.force * p.group_scale;
                host.apply_group_impulse(g, dir * linear, true);
                host.apply_group_angular_impulse(g, spin * p.force, true);
                linear
            }
            _ => {
                let m = host.body_mass(h.body);
                host.apply_impulse(h.body, dir * (m * p.force));
                host.apply_angular_impulse(h.body, spin * (m * p.force));
                p.force
            }
        };
        self.end(host);
        tracing::debug!(target: "riftgrab::tool", controller = self.controller.0, entity = h.entity.0, members, linear, "throw");
        Some(ThrowReport { entity: h.entity, body: h.body, members, linear })
    }

    /// Recompute the hold target from the operator's eye. Never moves the body itself.
    pub fn move_target<H: PhysicsHost>(
        &mut self,
        host: &H,
        eye_origin: Vec3,
        eye_dir: Vec3,
        eye_rotation: Quat,
        base_hold_distance: Scalar,
    ) -> bool {
        let Some(h) = self.held.as_mut() else { return false };
        if !host.body_valid(h.body) { return false; }

        let pose = host.body_pose(h.body);
        let attach = host.closest_point(h.body, eye_origin);
        let hold_distance = base_hold_distance + attach.distance(host.body_world_com(h.body));
        h.hold_target = Isometry {
            pos: eye_origin - pose.rot * h.local_com_offset + eye_dir * hold_distance,
            rot: (eye_rotation * h.rotation_offset).normalize(),
        };
        true
    }
}
