use riftgrab_core::{
    BodyId, BodyKind, ControllerId, EntityId, GroupId, Isometry, Scalar, Vec3, Velocity, ViewerId,
    RigidBodies, Entities, RayQuery, TraceQuery, TraceResult,
};
use riftgrab_geom::closest_point_on_shape;
use riftgrab_trace::{sweep_sphere_vs_shape, pick_better, sort_hits, SweepHit};

use crate::{Collider, World};

impl World {
    #[inline] fn in_range(&self, b: BodyId) -> bool { (b.0 as usize) < self.bodies.len() }

    fn slot_alive(&self, e: EntityId) -> bool {
        self.entities.get(e.0 as usize).is_some_and(|s| s.alive)
    }

    fn collider_passes(&self, c: &Collider, q: &TraceQuery) -> bool {
        if c.hitbox && !q.use_hitboxes { return false; }
        if !self.bodies.is_valid(c.body.0) { return false; }
        match c.entity {
            Some(e) => {
                if !self.slot_alive(e) || q.ignore == Some(e) { return false; }
                q.any_tags.is_empty() || self.entities[e.0 as usize].tags.has_any(&q.any_tags)
            }
            None => !q.entities_only && q.any_tags.is_empty(),
        }
    }

    fn sweep_all(&self, q: &TraceQuery) -> Vec<SweepHit> {
        let mut hits = Vec::new();
        for (i, c) in self.colliders.iter().enumerate() {
            if !self.collider_passes(c, q) { continue; }
            let pose = self.bodies.pose(c.body.0);
            if let Some((toi, normal)) = sweep_sphere_vs_shape(q.from, q.to, q.radius, &c.shape, &pose) {
                hits.push(SweepHit { toi, normal, target_index: i });
            }
        }
        hits
    }

    fn result_for(&self, q: &TraceQuery, hit: &SweepHit) -> TraceResult {
        let c = &self.colliders[hit.target_index];
        TraceResult::at_fraction(q, hit.toi, c.body, c.entity)
    }
}

/* ---------------- Rigid bodies ---------------- */
impl RigidBodies for World {
    fn body_valid(&self, b: BodyId) -> bool { self.bodies.is_valid(b.0) }

    fn body_kind(&self, b: BodyId) -> BodyKind {
        if self.in_range(b) { self.bodies.kind(b.0) } else { BodyKind::Static }
    }
    fn body_pose(&self, b: BodyId) -> Isometry {
        if self.in_range(b) { self.bodies.pose(b.0) } else { Isometry::default() }
    }
    fn body_vel(&self, b: BodyId) -> Velocity {
        if self.in_range(b) { self.bodies.vel(b.0) } else { Velocity::default() }
    }
    fn set_body_vel(&mut self, b: BodyId, v: Velocity) {
        if self.bodies.is_valid(b.0) && self.bodies.is_dynamic(b.0) { self.bodies.set_vel(b.0, v); }
    }
    fn body_mass(&self, b: BodyId) -> Scalar {
        if self.in_range(b) { self.bodies.mass_of(b.0) } else { 0.0 }
    }
    fn body_local_com(&self, b: BodyId) -> Vec3 {
        if self.in_range(b) { self.bodies.local_com(b.0) } else { Vec3::ZERO }
    }

    fn is_sleeping(&self, b: BodyId) -> bool { self.in_range(b) && self.bodies.is_sleeping(b.0) }
    fn set_sleeping(&mut self, b: BodyId, sleeping: bool) {
        if self.bodies.is_valid(b.0) { self.bodies.set_sleeping(b.0, sleeping); }
    }
    fn auto_sleep(&self, b: BodyId) -> bool { self.in_range(b) && self.bodies.auto_sleep(b.0) }
    fn set_auto_sleep(&mut self, b: BodyId, enabled: bool) {
        if self.bodies.is_valid(b.0) { self.bodies.set_auto_sleep(b.0, enabled); }
    }

    /// Uses the body's first solid collider; a body without one reports its center of mass.
    fn closest_point(&self, b: BodyId, p: Vec3) -> Vec3 {
        if !self.in_range(b) { return p; }
        let pose = self.bodies.pose(b.0);
        let shape = self.colliders.iter().filter(|c| c.body == b).min_by_key(|c| c.hitbox).map(|c| c.shape);
        match shape {
            Some(s) => closest_point_on_shape(&s, &pose, p),
            None => self.bodies.world_com(b.0),
        }
    }

    fn apply_impulse(&mut self, b: BodyId, j: Vec3) {
        if self.bodies.is_valid(b.0) { self.bodies.apply_impulse(b.0, j); }
    }
    fn apply_impulse_at(&mut self, b: BodyId, point: Vec3, j: Vec3) {
        if self.bodies.is_valid(b.0) { self.bodies.apply_impulse_at(b.0, point, j); }
    }
    fn apply_angular_impulse(&mut self, b: BodyId, j: Vec3) {
        if self.bodies.is_valid(b.0) { self.bodies.apply_angular_impulse(b.0, j); }
    }

    fn body_group(&self, b: BodyId) -> Option<GroupId> {
        if self.in_range(b) { self.bodies.group_of(b.0) } else { None }
    }
    fn group_body_count(&self, g: GroupId) -> usize { self.groups.body_count(&self.bodies, g) }
    fn apply_group_impulse(&mut self, g: GroupId, j: Vec3, with_mass: bool) {
        self.groups.apply_impulse(&mut self.bodies, g, j, with_mass);
    }
    fn apply_group_angular_impulse(&mut self, g: GroupId, j: Vec3, with_mass: bool) {
        self.groups.apply_angular_impulse(&mut self.bodies, g, j, with_mass);
    }

    fn actor_controlled(&self, b: BodyId) -> bool { self.in_range(b) && self.bodies.is_actor(b.0) }

    fn try_claim(&self, b: BodyId, owner: ControllerId) -> bool { self.bodies.try_claim(b.0, owner) }
    fn release_claim(&self, b: BodyId, owner: ControllerId) -> bool { self.bodies.release_claim(b.0, owner) }
    fn owner_of(&self, b: BodyId) -> Option<ControllerId> { self.bodies.owner_of(b.0) }
}

/* ---------------- Entities ---------------- */
impl Entities for World {
    fn entity_valid(&self, e: EntityId) -> bool { self.slot_alive(e) }

    fn entity_is_world(&self, e: EntityId) -> bool {
        self.entities.get(e.0 as usize).is_some_and(|s| s.is_world)
    }
    fn entity_physics_enabled(&self, e: EntityId) -> bool {
        self.entities.get(e.0 as usize).is_some_and(|s| s.physics_enabled)
    }
    fn entity_group(&self, e: EntityId) -> Option<GroupId> {
        self.entity_body(e).and_then(|b| self.body_group(b))
    }
    fn entity_body(&self, e: EntityId) -> Option<BodyId> {
        self.entities.get(e.0 as usize).and_then(|s| s.root)
    }
    fn entity_position(&self, e: EntityId) -> Vec3 {
        self.entity_body(e).map_or(Vec3::ZERO, |b| self.body_pose(b).pos)
    }

    fn has_tag(&self, e: EntityId, tag: &str) -> bool {
        self.entities.get(e.0 as usize).is_some_and(|s| s.tags.has(tag))
    }
    fn add_tag(&mut self, e: EntityId, tag: &str) {
        if let Some(s) = self.entities.get_mut(e.0 as usize) { s.tags.add(tag); }
    }
    fn remove_tag(&mut self, e: EntityId, tag: &str) {
        if let Some(s) = self.entities.get_mut(e.0 as usize) { s.tags.remove(tag); }
    }

    fn collisions_enabled(&self, e: EntityId) -> bool {
        self.entities.get(e.0 as usize).is_some_and(|s| s.collisions)
    }
    fn set_collisions_enabled(&mut self, e: EntityId, enabled: bool) {
        if let Some(s) = self.entities.get_mut(e.0 as usize) { s.collisions = enabled; }
    }

    fn visibility_add(&mut self, viewer: ViewerId, e: EntityId) {
        if self.slot_alive(e) { self.visibility.entry(viewer).or_default().insert(e); }
    }
    fn visibility_remove(&mut self, viewer: ViewerId, e: EntityId) {
        if let Some(set) = self.visibility.get_mut(&viewer) {
            set.remove(&e);
            if set.is_empty() { self.visibility.remove(&viewer); }
        }
    }
    fn is_visible_to(&self, viewer: ViewerId, e: EntityId) -> bool {
        self.visibility.get(&viewer).is_some_and(|s| s.contains(&e))
    }
}

/* ---------------- Ray queries ---------------- */
impl RayQuery for World {
    fn trace(&self, q: &TraceQuery) -> TraceResult {
        let best = self.sweep_all(q).into_iter().fold(None, pick_better);
        match best {
            Some(h) => self.result_for(q, &h),
            None => TraceResult::miss(q),
        }
    }

    fn trace_all(&self, q: &TraceQuery) -> Vec<TraceResult> {
        let mut hits = self.sweep_all(q);
        sort_hits(&mut hits);
        hits.iter().map(|h| self.result_for(q, h)).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{WorldBuilder, Link};
    use riftgrab_core::*;
    use riftgrab_geom::Shape;
    use approx::assert_relative_eq;

    fn cube() -> Shape { Shape::Box { hx: 0.5, hy: 0.5, hz: 0.5 } }

    #[test] fn trace_hits_nearest_and_honours_ignore() {
        let mut w = WorldBuilder::new().ground(None).build();
        let near = w.spawn_prop("near", iso(vec3(5.0, 0.0, 0.0), quat_identity()), cube(), 10.0);
        let far = w.spawn_prop("far", iso(vec3(10.0, 0.0, 0.0), quat_identity()), cube(), 10.0);

        let q = TraceQuery::ray(Vec3::ZERO, vec3(20.0, 0.0, 0.0));
        let r = w.trace(&q);
        assert!(r.hit);
        assert_eq!(r.entity, Some(near.entity));
        assert_relative_eq!(r.distance, 4.5, epsilon = 1e-4);

        let r = w.trace(&q.clone().ignore(Some(near.entity)));
        assert_eq!(r.entity, Some(far.entity));

        let all = w.trace_all(&q);
        assert_eq!(all.len(), 2);
        assert!(all[0].distance <= all[1].distance);
    }

    #[test] fn tag_filter_and_radius() {
        let mut w = WorldBuilder::new().ground(None).build();
        let p = w.spawn_prop("crate", iso(vec3(5.0, 1.2, 0.0), quat_identity()), cube(), 10.0);
        let ray = TraceQuery::ray(Vec3::ZERO, vec3(20.0, 0.0, 0.0));
        assert!(!w.trace(&ray).hit);
        assert!(w.trace(&ray.clone().radius(1.0)).hit);

        let tagged = ray.clone().radius(1.0).with_any_tags(&["ragdoll"]);
        assert!(!w.trace(&tagged).hit);
        w.add_tag(p.entity, "ragdoll");
        assert!(w.trace(&tagged).hit);
    }

    #[test] fn hitboxes_only_when_requested() {
        let mut w = WorldBuilder::new().ground(None).build();
        let links = [Link { offset: Vec3::ZERO, shape: Shape::Sphere { r: 0.1 }, mass: 5.0 }];
        let d = w.spawn_ragdoll("doll", vec3(5.0, 0.0, 0.0), &links, 0.0).expect("doll");
        w.add_hitbox(d.root, Shape::Sphere { r: 0.6 });
        let q = TraceQuery::ray(vec3(0.0, 0.4, 0.0), vec3(10.0, 0.4, 0.0));
        assert!(!w.trace(&q).hit);
        let r = w.trace(&q.use_hitboxes());
        assert_eq!(r.entity, Some(d.entity));
    }

    #[test] fn traces_see_entities_with_collisions_disabled() {
        let mut w = WorldBuilder::new().ground(None).build();
        let p = w.spawn_prop("crate", iso(vec3(5.0, 0.0, 0.0), quat_identity()), cube(), 10.0);
        w.set_collisions_enabled(p.entity, false);
        assert!(w.trace(&TraceQuery::ray(Vec3::ZERO, vec3(20.0, 0.0, 0.0))).hit);
    }

    #[test] fn closest_point_and_group_impulse_with_mass() {
        let mut w = WorldBuilder::new().ground(None).gravity(Vec3::ZERO).build();
        let p = w.spawn_prop("crate", Isometry::default(), cube(), 4.0);
        let cp = w.closest_point(p.root, vec3(3.0, 0.0, 0.0));
        assert_relative_eq!(cp.x, 0.5, epsilon = 1e-5);

        let g = w.entity_group(p.entity).expect("group");
        assert_eq!(w.group_body_count(g), 1);
        w.apply_group_impulse(g, vec3(0.0, 0.0, 2.0), true);
        assert_relative_eq!(w.body_vel(p.root).lin.z, 2.0, epsilon = 1e-5);
    }

    #[test] fn ownership_tokens_are_exclusive() {
        let mut w = WorldBuilder::new().build();
        let p = w.spawn_prop("crate", Isometry::default(), cube(), 4.0);
        assert!(w.try_claim(p.root, ControllerId(1)));
        assert!(!w.try_claim(p.root, ControllerId(2)));
        assert!(!w.release_claim(p.root, ControllerId(2)));
        assert!(w.release_claim(p.root, ControllerId(1)));
        assert_eq!(w.owner_of(p.root), None);
    }

    #[test] fn stale_ids_are_harmless() {
        let mut w = WorldBuilder::new().build();
        let ghost = BodyId(99);
        assert!(!w.body_valid(ghost));
        assert_eq!(w.body_group(ghost), None);
        w.apply_impulse(ghost, Vec3::ONE);
        assert!(!w.entity_valid(EntityId(7)));
        assert_eq!(w.entity_position(EntityId(7)), Vec3::ZERO);
    }

    #[test] fn visibility_sets() {
        let mut w = WorldBuilder::new().build();
        let p = w.spawn_prop("crate", Isometry::default(), cube(), 4.0);
        let v = ViewerId(3);
        w.visibility_add(v, p.entity);
        assert!(w.is_visible_to(v, p.entity));
        w.visibility_remove(v, p.entity);
        assert!(!w.is_visible_to(v, p.entity));
    }
}
