//! Picks the one body the operator most plausibly means, given a noisy aim ray.
//!
//! Two queries run against the host: a thin "direct" ray that only fires while an entity
//! still has priority, and a fat scan that collects every candidate near the aim segment.
//! Candidates are ranked by perpendicular distance of the entity's position to the segment;
//! a recently pulled entity wins outright while its priority lasts.

use riftgrab_core::{
    BodyId, ControllerId, EntityId, PhysicsHost, Scalar, TimeSince, TraceQuery, TraceResult, Vec3,
    GRABBED_TAG, SOLID_TAG,
};
use riftgrab_trace::distance_to_segment;

use crate::GravityGunConfig;

/// Last entity the operator pulled, and how long ago.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TargetMemory {
    entity: Option<EntityId>,
    since: TimeSince,
}

impl TargetMemory {
    /// Memory of `entity` targeted `age` seconds ago.
    pub fn aged(entity: EntityId, age: Scalar) -> Self {
        let mut since = TimeSince::zero();
        since.advance(age);
        Self { entity: Some(entity), since }
    }

    pub fn remember(&mut self, e: EntityId) {
        self.entity = Some(e);
        self.since.reset();
    }
    pub fn forget(&mut self) { *self = Self::default(); }
    #[inline] pub fn advance(&mut self, dt: Scalar) { self.since.advance(dt); }

    #[inline] pub fn entity(&self) -> Option<EntityId> { self.entity }
    #[inline] pub fn age(&self) -> Scalar { self.since.seconds() }
    #[inline] pub fn is_fresh(&self, cutoff: Scalar) -> bool { self.since.within(cutoff) }
    #[inline] pub fn has_priority(&self, e: EntityId, cutoff: Scalar) -> bool {
        self.entity == Some(e) && self.is_fresh(cutoff)
    }
}

/// A manipulable hit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Target {
    pub entity: EntityId,
    pub body: BodyId,
    /// Distance along the aim ray to the hit.
    pub distance: Scalar,
    pub end_position: Vec3,
}

impl Target {
    fn from_hit(tr: &TraceResult) -> Option<Self> {
        Some(Self { entity: tr.entity?, body: tr.body?, distance: tr.distance, end_position: tr.end_position })
    }
}

#[derive(Copy, Clone, Debug)]
pub struct TargetSelector {
    pub max_distance: Scalar,
    pub pull_radius: Scalar,
    pub direct_radius: Scalar,
    pub priority_cutoff: Scalar,
}

impl TargetSelector {
    pub fn from_config(cfg: &GravityGunConfig) -> Self {
        Self {
            max_distance: cfg.max_pull_distance,
            pull_radius: cfg.pull_radius,
            direct_radius: cfg.direct_trace_radius,
            priority_cutoff: cfg.target_priority_cutoff,
        }
    }

    /// Hitbox-aware, "solid"-tagged, entities-only query along the aim segment.
    pub fn query(&self, origin: Vec3, dir: Vec3, radius: Scalar, ignore: Option<EntityId>) -> TraceQuery {
        TraceQuery::ray(origin, origin + dir * self.max_distance)
            .use_hitboxes()
            .with_any_tags(&[SOLID_TAG])
            .ignore(ignore)
            .entities_only()
            .radius(radius)
    }

    pub fn find<H: PhysicsHost>(
        &self,
        host: &H,
        origin: Vec3,
        dir: Vec3,
        ignore: Option<EntityId>,
        memory: &TargetMemory,
        holder: ControllerId,
    ) -> Option<Target> {
        if memory.is_fresh(self.priority_cutoff) {
            let direct = host.trace(&self.query(origin, dir, self.direct_radius, ignore));
            if can_be_manipulated(host, &direct, holder) {
                return Target::from_hit(&direct);
            }
        }

        let q = self.query(origin, dir, self.pull_radius, ignore);
        let mut best: Option<(Scalar, TraceResult)> = None;
        for r in host.trace_all(&q) {
            if !can_be_manipulated(host, &r, holder) { continue; }
            let Some(e) = r.entity else { continue };
            if memory.has_priority(e, self.priority_cutoff) {
                return Target::from_hit(&r);
            }
            let d = distance_to_segment(q.from, q.to, host.entity_position(e));
            if best.as_ref().map_or(true, |(bd, _)| d < *bd) {
                best = Some((d, r));
            }
        }
        best.and_then(|(_, r)| Target::from_hit(&r))
    }
}

/// A hit this controller may push, pull or grab. Body kind is checked by the caller.
pub fn can_be_manipulated<H: PhysicsHost>(host: &H, tr: &TraceResult, holder: ControllerId) -> bool {
    if !tr.hit { return false; }
    let (Some(b), Some(e)) = (tr.body, tr.entity) else { return false };
    if !host.body_valid(b) || !host.entity_valid(e) || host.entity_is_world(e) { return false; }
    if host.entity_group(e).is_none() { return false; }

    let root = host.entity_body(e);
    let mut held_by_holder = false;
    for body in [Some(b), root].into_iter().flatten() {
        match host.owner_of(body) {
            Some(o) if o == holder => held_by_holder = true,
            Some(_) => return false,
            None => {}
        }
    }
    if host.has_tag(e, GRABBED_TAG) && !held_by_holder { return false; }

    host.entity_physics_enabled(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftgrab_core::{iso, quat_identity, vec3, Entities, RayQuery, RigidBodies};
    use riftgrab_geom::Shape;
    use riftgrab_world::{World, WorldBuilder, EntityDesc};

    const ME: ControllerId = ControllerId(1);

    fn world() -> World { WorldBuilder::new().ground(None).gravity(Vec3::ZERO).build() }
    fn ball(w: &mut World, name: &str, p: Vec3) -> EntityId {
        w.spawn_prop(name, iso(p, quat_identity()), Shape::Sphere { r: 0.25 }, 10.0).entity
    }
    fn selector() -> TargetSelector {
        TargetSelector::from_config(&GravityGunConfig { direct_trace_radius: 1.0, ..GravityGunConfig::default() })
    }

    #[test] fn closest_to_aim_line_wins() {
        let mut w = world();
        let _a = ball(&mut w, "a", vec3(100.0, 5.0, 0.0));
        let b = ball(&mut w, "b", vec3(100.0, 2.0, 0.0));
        let t = selector().find(&w, Vec3::ZERO, Vec3::X, None, &TargetMemory::default(), ME).expect("target");
        assert_eq!(t.entity, b);
    }

    #[test] fn recent_target_keeps_priority() {
        let mut w = world();
        let a = ball(&mut w, "a", vec3(100.0, 5.0, 0.0));
        let _b = ball(&mut w, "b", vec3(100.0, 2.0, 0.0));
        let mem = TargetMemory::aged(a, 0.1);
        let t = selector().find(&w, Vec3::ZERO, Vec3::X, None, &mem, ME).expect("target");
        assert_eq!(t.entity, a);

        let stale = TargetMemory::aged(a, 0.5);
        let t = selector().find(&w, Vec3::ZERO, Vec3::X, None, &stale, ME).expect("target");
        assert_ne!(t.entity, a);
    }

    #[test] fn direct_ray_wins_while_priority_is_fresh() {
        let mut w = world();
        let a = ball(&mut w, "a", vec3(100.0, 5.0, 0.0));
        let on_axis = ball(&mut w, "axis", vec3(50.0, 0.0, 0.0));
        let mem = TargetMemory::aged(a, 0.1);
        let t = selector().find(&w, Vec3::ZERO, Vec3::X, None, &mem, ME).expect("target");
        assert_eq!(t.entity, on_axis);
        assert!((t.distance - 48.75).abs() < 1e-3);
    }

    #[test] fn ineligible_candidates_are_skipped() {
        let mut w = world();
        let grabbed = ball(&mut w, "grabbed", vec3(100.0, 0.0, 0.0));
        w.add_tag(grabbed, GRABBED_TAG);
        let frozen = ball(&mut w, "frozen", vec3(100.0, 1.0, 0.0));
        w.set_physics_enabled(frozen, false);
        let owned = w.spawn_prop("owned", iso(vec3(100.0, 2.0, 0.0), quat_identity()), Shape::Sphere { r: 0.25 }, 10.0);
        assert!(w.try_claim(owned.root, ControllerId(9)));
        w.spawn_static("wall", iso(vec3(100.0, -1.0, 0.0), quat_identity()), Shape::Box { hx: 1.0, hy: 0.25, hz: 1.0 });

        let loose = w.add_entity(EntityDesc::named("loose"));
        let body = w.add_body(Default::default());
        w.set_body_pose(body, iso(vec3(100.0, -2.0, 0.0), quat_identity()));
        w.attach_body(loose, body);
        w.add_collider(body, Shape::Sphere { r: 0.25 });

        let fine = ball(&mut w, "fine", vec3(100.0, 20.0, 0.0));
        let t = selector().find(&w, Vec3::ZERO, Vec3::X, None, &TargetMemory::default(), ME).expect("target");
        assert_eq!(t.entity, fine);
    }

    #[test] fn own_claim_stays_manipulable() {
        let mut w = world();
        let p = w.spawn_prop("p", iso(vec3(10.0, 0.0, 0.0), quat_identity()), Shape::Sphere { r: 0.5 }, 10.0);
        assert!(w.try_claim(p.root, ME));
        w.add_tag(p.entity, GRABBED_TAG);
        let tr = w.trace(&selector().query(Vec3::ZERO, Vec3::X, 0.0, None));
        assert!(can_be_manipulated(&w, &tr, ME));
        assert!(!can_be_manipulated(&w, &tr, ControllerId(2)));
    }

    #[test] fn nothing_in_range() {
        let mut w = world();
        ball(&mut w, "far", vec3(2000.0, 0.0, 0.0));
        let me = ball(&mut w, "me", Vec3::ZERO);
        assert!(selector().find(&w, Vec3::ZERO, Vec3::X, Some(me), &TargetMemory::default(), ME).is_none());
    }
}
