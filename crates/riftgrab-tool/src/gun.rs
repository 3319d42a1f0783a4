//! The gravity gun: button mapping, activation lifecycle and the two per-tick entry points.

use anyhow::{Context, Result};
use riftgrab_core::{
    BodyId, BodyKind, ControllerId, EntityId, Isometry, PhysicsHost, Scalar, StepCtx, ViewerId, XorShift64,
};
use riftgrab_viz::{Ledger, LedgerEvent};

use crate::input::{Eye, InputFrame};
use crate::integrator::{HoldIntegrator, HoldStep};
use crate::selector::{Target, TargetSelector};
use crate::session::{GrabReject, GrabSession, ThrowParams, ThrowReport};
use crate::GravityGunConfig;

/// Which instance runs the tool's logic. Only the authoritative one touches bodies.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    Authoritative,
    Predicted,
}

/// What one update tick did.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Action {
    None,
    /// Still holding; the hold target was refreshed.
    Holding,
    Grabbed(EntityId),
    Released(EntityId),
    Thrown(ThrowReport),
    Pushed { entity: EntityId, body: BodyId, impulse: Scalar },
    Tugged(EntityId),
    Rejected(GrabReject),
    Reset(EntityId),
}

/// Push falloff: 1 at the muzzle, 0 at `max_distance`.
#[inline]
pub fn push_scale(distance: Scalar, max_distance: Scalar) -> Scalar {
    if !(max_distance > 0.0) { return 0.0; }
    1.0 - (distance / max_distance).clamp(0.0, 1.0)
}

pub struct GravityGun {
    id: ControllerId,
    cfg: GravityGunConfig,
    role: Role,
    active: bool,
    owner: Option<EntityId>,
    viewer: Option<ViewerId>,
    selector: TargetSelector,
    session: GrabSession,
    integrator: HoldIntegrator,
    rng: XorShift64,
    ledger: Ledger,
}

impl GravityGun {
    /// Fails when `cfg` does not pass `GravityGunConfig::validate`.
    pub fn new(id: ControllerId, cfg: GravityGunConfig) -> Result<Self> {
        cfg.validate().with_context(|| format!("gravity gun {id}"))?;
        Ok(Self {
            id,
            selector: TargetSelector::from_config(&cfg),
            session: GrabSession::new(id, cfg.drop_cooldown),
            integrator: HoldIntegrator::new(cfg.hold_smooth_time),
            rng: XorShift64::new(0x9E37_79B9_7F4A_7C15 ^ id.0 as u64),
            cfg,
            role: Role::Authoritative,
            active: false,
            owner: None,
            viewer: None,
            ledger: Ledger::default(),
        })
    }
    pub fn with_role(mut self, role: Role) -> Self { self.role = role; self }
    pub fn with_seed(mut self, seed: u64) -> Self { self.rng = XorShift64::new(seed); self }

    #[inline] pub fn id(&self) -> ControllerId { self.id }
    #[inline] pub fn config(&self) -> &GravityGunConfig { &self.cfg }
    #[inline] pub fn role(&self) -> Role { self.role }
    #[inline] pub fn is_active(&self) -> bool { self.active }
    #[inline] pub fn owner(&self) -> Option<EntityId> { self.owner }
    #[inline] pub fn session(&self) -> &GrabSession { &self.session }
    #[inline] pub fn ledger(&self) -> &Ledger { &self.ledger }
    #[inline] pub fn is_holding(&self) -> bool { self.session.is_holding() }
    #[inline] pub fn held_entity(&self) -> Option<EntityId> { self.session.held_entity() }
    #[inline] fn authoritative(&self) -> bool { self.role == Role::Authoritative }

    /// Someone may pick the tool up: it lies unowned, or it is mid-hold.
    pub fn is_usable(&self) -> bool { self.owner.is_none() || self.is_holding() }

    /// Hand the tool to an operator. Its entity is ignored by traces; `viewer` receives
    /// visibility of whatever it holds.
    pub fn equip(&mut self, owner: EntityId, viewer: Option<ViewerId>) {
        self.owner = Some(owner);
        self.viewer = viewer;
    }

    /* ---------- lifecycle ---------- */
    pub fn activate(&mut self) { self.active = true; }

    pub fn deactivate<H: PhysicsHost>(&mut self, host: &mut H) {
        self.active = false;
        self.release(host);
    }

    pub fn active_start(&mut self) {
        if self.authoritative() { self.activate(); }
    }

    /// Tool put away; `dropped` also clears the owner.
    pub fn active_end<H: PhysicsHost>(&mut self, host: &mut H, dropped: bool) {
        if self.authoritative() { self.deactivate(host); }
        if dropped {
            self.owner = None;
            self.viewer = None;
        }
    }

    pub fn destroyed<H: PhysicsHost>(&mut self, host: &mut H) {
        if self.authoritative() { self.deactivate(host); }
    }

    fn release<H: PhysicsHost>(&mut self, host: &mut H) -> Option<EntityId> {
        let e = self.session.end(host);
        if e.is_some() { self.ledger.push(LedgerEvent::GrabEnd { controller: self.id, entity: e }); }
        e
    }

    fn reset<H: PhysicsHost>(&mut self, host: &mut H) -> Option<EntityId> {
        let e = self.session.force_reset(host);
        if e.is_some() { self.ledger.push(LedgerEvent::ForcedReset { controller: self.id }); }
        e
    }

    /* ---------- update tick ---------- */
    /// Clocks advance on every call, holstered or not; everything else needs an active,
    /// owned, authoritative tool.
    pub fn simulate<H: PhysicsHost>(&mut self, host: &mut H, input: &InputFrame, eye: &Eye, dt: Scalar) -> Action {
        if !self.authoritative() { return Action::None; }
        self.session.tick(dt);
        if !self.active || self.owner.is_none() { return Action::None; }
        let dir = eye.forward();

        if self.session.is_holding() {
            if self.session.is_stale(host) {
                return self.reset(host).map_or(Action::None, Action::Reset);
            }
            if input.primary.pressed {
                let p = ThrowParams { force: self.cfg.throw_force, group_scale: self.cfg.group_throw_scale };
                return match self.session.throw(host, dir, &mut self.rng, p) {
                    Some(r) => {
                        self.ledger.push(LedgerEvent::Throw { controller: self.id, body: r.body, members: r.members, linear: r.linear });
                        self.ledger.push(LedgerEvent::GrabEnd { controller: self.id, entity: Some(r.entity) });
                        Action::Thrown(r)
                    }
                    None => {
                        self.ledger.push(LedgerEvent::ForcedReset { controller: self.id });
                        Action::None
                    }
                };
            }
            if input.secondary.pressed {
                return self.release(host).map_or(Action::None, Action::Released);
            }
            self.session.move_target(host, eye.origin, dir, eye.rotation, self.cfg.hold_distance);
            return Action::Holding;
        }

        if !(input.primary.pressed || input.secondary.down) { return Action::None; }
        if self.session.remaining_cooldown() > 0.0 { return Action::None; }

        let Some(t) = self.selector.find(host, eye.origin, dir, self.owner, self.session.memory(), self.id) else {
            return Action::None;
        };
        if host.body_kind(t.body) != BodyKind::Dynamic {
            tracing::trace!(target: "riftgrab::tool", controller = self.id.0, body = t.body.0, "target not dynamic");
            return Action::None;
        }

        if input.primary.pressed {
            self.push(host, &t, eye)
        } else {
            self.pull_or_grab(host, &t, eye)
        }
    }

    fn push<H: PhysicsHost>(&mut self, host: &mut H, t: &Target, eye: &Eye) -> Action {
        if t.distance >= self.cfg.max_push_distance { return Action::None; }
        let scale = push_scale(t.distance, self.cfg.max_push_distance);
        let impulse = host.body_mass(t.body) * self.cfg.push_force * scale;
        host.apply_impulse_at(t.body, t.end_position, eye.forward() * impulse);

        self.ledger.push(LedgerEvent::Push { controller: self.id, body: t.body, impulse });
        tracing::debug!(target: "riftgrab::tool", controller = self.id.0, entity = t.entity.0, impulse, "push");
        Action::Pushed { entity: t.entity, body: t.body, impulse }
    }

    fn pull_or_grab<H: PhysicsHost>(&mut self, host: &mut H, t: &Target, eye: &Eye) -> Action {
        let Some(group) = host.entity_group(t.entity) else { return Action::None };
        let mut body = t.body;
        if host.group_body_count(group) > 1 {
            match host.entity_body(t.entity) {
                Some(root) if host.body_valid(root) => body = root,
                _ => return Action::None,
            }
        }

        let dir = eye.forward();
        let attach = host.closest_point(body, eye.origin);
        let action = if eye.origin.distance(attach) <= self.cfg.attach_distance {
            let hold_distance = self.cfg.hold_distance + attach.distance(host.body_world_com(body));
            let grab = Isometry { pos: eye.origin + dir * hold_distance, rot: eye.rotation };
            match self.session.start(host, t.entity, body, grab, self.viewer) {
                Ok(()) => {
                    self.ledger.push(LedgerEvent::GrabStart { controller: self.id, entity: t.entity, body });
                    Action::Grabbed(t.entity)
                }
                Err(r) => {
                    self.ledger.push(LedgerEvent::Rejected { controller: self.id, kind: r.kind() });
                    tracing::trace!(target: "riftgrab::tool", controller = self.id.0, reason = %r, "grab rejected");
                    Action::Rejected(r)
                }
            }
        } else {
            host.apply_group_impulse(group, dir * -self.cfg.pull_force, true);
            self.ledger.push(LedgerEvent::Tug { controller: self.id, entity: t.entity });
            Action::Tugged(t.entity)
        };

        self.session.memory_mut().remember(t.entity);
        action
    }

    /* ---------- fixed physics step ---------- */
    pub fn on_pre_physics_step<H: PhysicsHost>(&mut self, host: &mut H, ctx: StepCtx) -> HoldStep {
        if !self.authoritative() { return HoldStep::Idle; }
        let r = self.integrator.pre_step(&mut self.session, host, ctx.dt);
        if r == HoldStep::Reset { self.ledger.push(LedgerEvent::ForcedReset { controller: self.id }); }
        r
    }
}
