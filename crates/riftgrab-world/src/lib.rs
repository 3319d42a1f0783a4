mod host;
mod stepper;

pub use stepper::{FixedStepper, StepReport};

use std::collections::{BTreeMap, BTreeSet};

use riftgrab_core::{
    Scalar, Vec3, Isometry, Velocity, BodyId, EntityId, GroupId, ViewerId, BodyKind, StepStats,
    StepHasher, hash_vec3, hash_quat, TagSet, SOLID_TAG,
};
use riftgrab_geom::{Shape, MassProps, aabb_of};
use riftgrab_dynamics::{Bodies, BodyDesc, Groups};
use riftgrab_articulation::Joints;
use riftgrab_viz::DebugSettings;

const SLEEP_SPEED: Scalar = 0.05;     // m/s (and rad/s) below which a body counts as still
const SLEEP_TIME: Scalar = 0.5;       // seconds still before auto-sleep
const GROUND_FRICTION: Scalar = 0.92; // tangential velocity kept per ground contact
const GROUND_SPIN_DAMP: Scalar = 0.95;
const JOINT_ITERATIONS: u32 = 8;
const DEFAULT_DENSITY: Scalar = 1000.0;

/* ---------------- Collider ---------------- */
#[derive(Copy, Clone, Debug)]
pub struct Collider {
    pub body: BodyId,
    pub entity: Option<EntityId>,
    pub shape: Shape,
    /// Only visible to traces that ask for hitboxes; never touches the ground.
    pub hitbox: bool,
}

/* ---------------- Entities ---------------- */
#[derive(Clone, Debug)]
pub struct EntityDesc {
    pub name: String,
    pub tags: TagSet,
    pub is_world: bool,
    pub physics_enabled: bool,
}

impl Default for EntityDesc {
    fn default() -> Self {
        Self { name: String::new(), tags: TagSet::from_slice(&[SOLID_TAG]), is_world: false, physics_enabled: true }
    }
}

impl EntityDesc {
    pub fn named(name: &str) -> Self { Self { name: name.to_string(), ..Self::default() } }
    pub fn with_tags(mut self, tags: &[&str]) -> Self { self.tags = TagSet::from_slice(tags); self }
    pub fn world(mut self) -> Self { self.is_world = true; self }
    pub fn without_physics(mut self) -> Self { self.physics_enabled = false; self }
}

#[derive(Clone, Debug)]
struct EntitySlot {
    name: String,
    tags: TagSet,
    is_world: bool,
    physics_enabled: bool,
    collisions: bool,
    alive: bool,
    root: Option<BodyId>,
    bodies: Vec<BodyId>,
}

/// Handles returned by the spawn helpers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Spawned {
    pub entity: EntityId,
    pub root: BodyId,
    pub group: Option<GroupId>,
}

/// One ragdoll link: offset from the spawn origin, shape and mass in kg.
#[derive(Copy, Clone, Debug)]
pub struct Link {
    pub offset: Vec3,
    pub shape: Shape,
    pub mass: Scalar,
}

/* ---------------- Builder ---------------- */
pub struct WorldBuilder {
    pub bodies: usize,
    pub colliders: usize,
    pub gravity: Vec3,
    pub ground: Option<Scalar>,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self { bodies: 128, colliders: 128, gravity: Vec3::new(0.0, -9.81, 0.0), ground: Some(0.0) }
    }

    pub fn with_capacity(mut self, bodies: usize, colliders: usize) -> Self {
        self.bodies = bodies;
        self.colliders = colliders;
        self
    }
    pub fn gravity(mut self, g: Vec3) -> Self { self.gravity = g; self }
    /// Height of the infinite ground plane; `None` removes it.
    pub fn ground(mut self, y: Option<Scalar>) -> Self { self.ground = y; self }

    pub fn build(self) -> World {
        let mut w = World::with_capacity(self.bodies, self.colliders);
        w.gravity = self.gravity;
        w.ground = self.ground;
        w
    }
}

impl Default for WorldBuilder {
    fn default() -> Self { Self::new() }
}

/* ---------------- World ---------------- */
pub struct World {
    pub gravity: Vec3,
    ground: Option<Scalar>,

    bodies: Bodies,
    groups: Groups,
    joints: Joints,
    colliders: Vec<Collider>,

    entities: Vec<EntitySlot>,
    body_entity: Vec<Option<EntityId>>,
    visibility: BTreeMap<ViewerId, BTreeSet<EntityId>>,

    tick: u64,
    debug: DebugSettings,
}

impl World {
    pub fn with_capacity(bodies: usize, colliders: usize) -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            ground: Some(0.0),
            bodies: Bodies::with_capacity(bodies),
            groups: Groups::new(),
            joints: Joints::new(),
            colliders: Vec::with_capacity(colliders),
            entities: Vec::new(),
            body_entity: Vec::with_capacity(bodies),
            visibility: BTreeMap::new(),
            tick: 0,
            debug: DebugSettings::default(),
        }
    }

    // Read-only helpers for debuggers and benches.
    #[inline] pub fn num_bodies(&self) -> u32 { self.bodies.len() as u32 }
    #[inline] pub fn num_entities(&self) -> u32 { self.entities.len() as u32 }
    #[inline] pub fn tick_index(&self) -> u64 { self.tick }
    #[inline] pub fn ground_height(&self) -> Option<Scalar> { self.ground }
    pub fn bodies(&self) -> &Bodies { &self.bodies }
    pub fn colliders(&self) -> &[Collider] { &self.colliders }
    pub fn group_members(&self, g: GroupId) -> &[BodyId] { self.groups.members(g) }
    pub fn entity_name(&self, e: EntityId) -> Option<&str> {
        self.entities.get(e.0 as usize).map(|s| s.name.as_str())
    }
    pub fn entity_bodies(&self, e: EntityId) -> &[BodyId] {
        self.entities.get(e.0 as usize).map(|s| s.bodies.as_slice()).unwrap_or(&[])
    }
    pub fn entity_of(&self, b: BodyId) -> Option<EntityId> {
        self.body_entity.get(b.0 as usize).copied().flatten()
    }
    pub fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.entities.iter().position(|s| s.alive && s.name == name).map(|i| EntityId(i as u32))
    }
    pub fn visible_set(&self, viewer: ViewerId) -> Vec<EntityId> {
        self.visibility.get(&viewer).map(|s| s.iter().copied().collect()).unwrap_or_default()
    }

    pub fn set_debug(&mut self, cfg: DebugSettings) { self.debug = cfg; }

    /// Teleport a body. Call outside `step` to keep digests reproducible.
    pub fn set_body_pose(&mut self, id: BodyId, pose: Isometry) {
        if self.bodies.is_valid(id.0) { self.bodies.set_pose(id.0, pose); }
    }

    /* ---------- World composition ---------- */
    pub fn add_body(&mut self, desc: BodyDesc) -> BodyId {
        let id = self.bodies.add(desc);
        self.body_entity.push(None);
        BodyId(id)
    }

    pub fn add_collider(&mut self, body: BodyId, shape: Shape) -> usize {
        self.push_collider(body, shape, false)
    }
    pub fn add_hitbox(&mut self, body: BodyId, shape: Shape) -> usize {
        self.push_collider(body, shape, true)
    }
    fn push_collider(&mut self, body: BodyId, shape: Shape, hitbox: bool) -> usize {
        let entity = self.entity_of(body);
        self.colliders.push(Collider { body, entity, shape, hitbox });
        self.colliders.len() - 1
    }

    pub fn add_entity(&mut self, desc: EntityDesc) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(EntitySlot {
            name: desc.name,
            tags: desc.tags,
            is_world: desc.is_world,
            physics_enabled: desc.physics_enabled,
            collisions: true,
            alive: true,
            root: None,
            bodies: Vec::new(),
        });
        id
    }

    /// Parent a body to an entity. The first attached body becomes the root.
    pub fn attach_body(&mut self, e: EntityId, b: BodyId) {
        let (Some(slot), Some(be)) = (self.entities.get_mut(e.0 as usize), self.body_entity.get_mut(b.0 as usize)) else { return };
        *be = Some(e);
        if slot.root.is_none() { slot.root = Some(b); }
        if !slot.bodies.contains(&b) { slot.bodies.push(b); }
        for c in self.colliders.iter_mut().filter(|c| c.body == b) { c.entity = Some(e); }
    }

    pub fn add_group(&mut self, members: &[BodyId]) -> GroupId {
        self.groups.add(&mut self.bodies, members)
    }

    /// Group `members` and chain consecutive ones with distance joints.
    pub fn add_ragdoll_group(&mut self, members: &[BodyId], compliance: Scalar) -> GroupId {
        let g = self.add_group(members);
        self.joints.chain(&self.bodies, members, compliance);
        g
    }

    /// Invalidate an entity and all of its bodies. Stale ids stay detectable.
    pub fn remove_entity(&mut self, e: EntityId) {
        let Some(slot) = self.entities.get_mut(e.0 as usize) else { return };
        if !slot.alive { return; }
        slot.alive = false;
        for b in &slot.bodies { self.bodies.remove(b.0); }
        for set in self.visibility.values_mut() { set.remove(&e); }
        tracing::debug!(target: "riftgrab::world", entity = e.0, "entity removed");
    }

    pub fn set_physics_enabled(&mut self, e: EntityId, enabled: bool) {
        if let Some(slot) = self.entities.get_mut(e.0 as usize) { slot.physics_enabled = enabled; }
    }

    /* ---------- Spawn helpers ---------- */
    /// A single-body prop in its own one-member group.
    pub fn spawn_prop(&mut self, name: &str, pose: Isometry, shape: Shape, mass: Scalar) -> Spawned {
        let e = self.add_entity(EntityDesc::named(name));
        let b = self.add_body(BodyDesc { pose, mass: mass_for(&shape, mass), ..BodyDesc::default() });
        self.attach_body(e, b);
        self.add_collider(b, shape);
        let g = self.add_group(&[b]);
        Spawned { entity: e, root: b, group: Some(g) }
    }

    /// A multi-body entity: links chained by joints, grouped, the first link is the root.
    pub fn spawn_ragdoll(&mut self, name: &str, origin: Vec3, links: &[Link], compliance: Scalar) -> Option<Spawned> {
        if links.is_empty() { return None; }
        let e = self.add_entity(EntityDesc::named(name).with_tags(&[SOLID_TAG, "ragdoll"]));
        let mut members = Vec::with_capacity(links.len());
        for l in links {
            let pose = Isometry { pos: origin + l.offset, ..Isometry::default() };
            let b = self.add_body(BodyDesc { pose, mass: mass_for(&l.shape, l.mass), ..BodyDesc::default() });
            self.attach_body(e, b);
            self.add_collider(b, l.shape);
            members.push(b);
        }
        let g = self.add_ragdoll_group(&members, compliance);
        Some(Spawned { entity: e, root: members[0], group: Some(g) })
    }

    /// Immovable map geometry.
    pub fn spawn_static(&mut self, name: &str, pose: Isometry, shape: Shape) -> Spawned {
        let e = self.add_entity(EntityDesc::named(name).world());
        let b = self.add_body(BodyDesc { pose, mass: MassProps::infinite(), kind: BodyKind::Static, ..BodyDesc::default() });
        self.attach_body(e, b);
        self.add_collider(b, shape);
        Spawned { entity: e, root: b, group: None }
    }

    /// A body driven by player movement (the tool's operator, or another player).
    pub fn spawn_actor(&mut self, name: &str, pose: Isometry, shape: Shape, mass: Scalar) -> Spawned {
        let e = self.add_entity(EntityDesc::named(name).with_tags(&[SOLID_TAG, "player"]));
        let b = self.add_body(BodyDesc { pose, mass: mass_for(&shape, mass), actor_controlled: true, ..BodyDesc::default() });
        self.attach_body(e, b);
        self.add_collider(b, shape);
        self.bodies.set_auto_sleep(b.0, false);
        let g = self.add_group(&[b]);
        Spawned { entity: e, root: b, group: Some(g) }
    }

    /* ---------- Step ---------- */
    /// integrate -> joints -> ground contact -> sleep. Tools drive bodies from a pre-step hook
    /// (see `FixedStepper`), never from inside this call.
    pub fn step(&mut self, dt: Scalar) -> StepStats {
        let mut stats = StepStats::default();
        if dt <= 0.0 { return stats; }

        stats.bodies_integrated = self.bodies.integrate_all(self.gravity, dt);
        self.joints.solve(&mut self.bodies, dt, JOINT_ITERATIONS);
        stats.ground_contacts = self.resolve_ground();
        stats.sleeping = self.bodies.update_sleep(SLEEP_SPEED, SLEEP_TIME, dt);

        self.tick = self.tick.wrapping_add(1);
        if self.debug.due(self.tick) { self.print_debug_block(&stats); }
        stats
    }

    /// Push dynamic bodies out of the ground plane. Entities with collisions disabled fall through.
    fn resolve_ground(&mut self) -> u32 {
        let Some(h) = self.ground else { return 0 };
        let mut contacts = 0u32;
        for c in &self.colliders {
            if c.hitbox { continue; }
            let id = c.body.0;
            if !self.bodies.is_valid(id) || !self.bodies.is_dynamic(id) || self.bodies.is_sleeping(id) { continue; }
            if let Some(e) = c.entity {
                let slot = &self.entities[e.0 as usize];
                if !slot.collisions || !slot.physics_enabled { continue; }
            }
            let pose = self.bodies.pose(id);
            let depth = h - aabb_of(&c.shape, &pose).min.y;
            if depth <= 0.0 { continue; }

            self.bodies.apply_position_delta(id, Vec3::new(0.0, depth, 0.0));
            let v = self.bodies.vel(id);
            let lin = Vec3::new(v.lin.x * GROUND_FRICTION, v.lin.y.max(0.0), v.lin.z * GROUND_FRICTION);
            self.bodies.set_vel(id, Velocity { lin, ang: v.ang * GROUND_SPIN_DAMP });
            contacts += 1;
        }
        contacts
    }

    /// Digest of everything a tool can observe or change.
    pub fn state_hash(&self) -> [u8; 32] {
        let mut h = StepHasher::new();
        h.update_bytes(&self.tick.to_le_bytes());
        for id in self.bodies.indices() {
            let alive = self.bodies.is_valid(id);
            h.update_bool(alive);
            if !alive { continue; }
            let p = self.bodies.pose(id);
            let v = self.bodies.vel(id);
            hash_vec3(&mut h, &p.pos);
            hash_quat(&mut h, &p.rot);
            hash_vec3(&mut h, &v.lin);
            hash_vec3(&mut h, &v.ang);
            h.update_bool(self.bodies.is_sleeping(id));
            h.update_bool(self.bodies.auto_sleep(id));
            h.update_u32(self.bodies.owner_of(id).map_or(0, |c| c.0));
        }
        for s in &self.entities {
            h.update_bool(s.alive);
            h.update_bool(s.collisions);
            h.update_u32(s.tags.len() as u32);
            for t in s.tags.iter() { h.update_str(t); }
        }
        for (viewer, set) in &self.visibility {
            h.update_u32(viewer.0);
            for e in set { h.update_u32(e.0); }
        }
        h.finalize()
    }

    pub fn kinetic_energy(&self) -> Scalar {
        let mut e = 0.0;
        for id in self.bodies.indices() {
            if !self.bodies.is_valid(id) || !self.bodies.is_dynamic(id) { continue; }
            let v = self.bodies.vel(id);
            e += 0.5 * self.bodies.mass_of(id) * v.lin.length_squared();
        }
        e
    }

    /* ---------- Debug ---------- */
    fn print_debug_block(&self, stats: &StepStats) {
        tracing::info!(
            target: "riftgrab::world",
            tick = self.tick,
            integrated = stats.bodies_integrated,
            ground = stats.ground_contacts,
            sleeping = stats.sleeping,
            "step"
        );
        if self.debug.show_energy {
            tracing::info!(target: "riftgrab::world", tick = self.tick, ke = self.kinetic_energy(), "energy");
        }
        if !(self.debug.show_bodies || self.debug.show_owners) { return; }
        for id in self.bodies.indices().take(self.debug.max_lines) {
            if !self.bodies.is_valid(id) || !self.bodies.is_dynamic(id) { continue; }
            let p = self.bodies.pose(id).pos;
            let owner = self.bodies.owner_of(id).map_or(0, |c| c.0);
            if self.debug.show_bodies {
                tracing::info!(
                    target: "riftgrab::world",
                    body = id, x = p.x, y = p.y, z = p.z,
                    asleep = self.bodies.is_sleeping(id),
                    owner,
                    "body"
                );
            } else if owner != 0 {
                tracing::info!(target: "riftgrab::world", body = id, owner, "claimed");
            }
        }
    }
}

/// Shape-derived mass properties rescaled to `mass` kg.
pub fn mass_for(shape: &Shape, mass: Scalar) -> MassProps {
    let base = match *shape {
        Shape::Sphere { r } => MassProps::from_sphere(r, DEFAULT_DENSITY),
        Shape::Box { hx, hy, hz } => MassProps::from_box(Vec3::new(hx, hy, hz), DEFAULT_DENSITY),
        Shape::Capsule { r, hh } => MassProps::from_capsule(r, hh, DEFAULT_DENSITY),
    };
    base.with_mass(mass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftgrab_core::{vec3, iso, quat_identity};

    fn crate_box() -> Shape { Shape::Box { hx: 0.5, hy: 0.5, hz: 0.5 } }

    #[test] fn prop_falls_and_rests_on_ground() {
        let mut w = WorldBuilder::new().build();
        let p = w.spawn_prop("crate", iso(vec3(0.0, 3.0, 0.0), quat_identity()), crate_box(), 20.0);
        for _ in 0..240 { w.step(1.0 / 60.0); }
        let y = w.bodies().pose(p.root.0).pos.y;
        assert!((y - 0.5).abs() < 0.05, "y = {y}");
        assert!(w.bodies().is_sleeping(p.root.0));
    }

    #[test] fn disabled_collisions_fall_through_ground() {
        let mut w = WorldBuilder::new().build();
        let p = w.spawn_prop("crate", iso(vec3(0.0, 1.0, 0.0), quat_identity()), crate_box(), 20.0);
        w.entities[p.entity.0 as usize].collisions = false;
        for _ in 0..60 { w.step(1.0 / 60.0); }
        assert!(w.bodies().pose(p.root.0).pos.y < 0.0);
    }

    #[test] fn ragdoll_is_one_group_rooted_at_first_link() {
        let mut w = WorldBuilder::new().build();
        let links = [
            Link { offset: vec3(0.0, 1.0, 0.0), shape: Shape::Sphere { r: 0.2 }, mass: 10.0 },
            Link { offset: vec3(0.0, 0.5, 0.0), shape: Shape::Sphere { r: 0.2 }, mass: 10.0 },
            Link { offset: vec3(0.0, 0.0, 0.0), shape: Shape::Sphere { r: 0.2 }, mass: 10.0 },
        ];
        let r = w.spawn_ragdoll("doll", vec3(0.0, 1.0, 0.0), &links, 0.0).expect("links");
        let g = r.group.expect("group");
        assert_eq!(w.group_members(g).len(), 3);
        assert_eq!(w.entity_bodies(r.entity)[0], r.root);
        assert!(w.spawn_ragdoll("empty", Vec3::ZERO, &[], 0.0).is_none());
    }

    #[test] fn removing_entity_invalidates_bodies_and_visibility() {
        let mut w = WorldBuilder::new().build();
        let p = w.spawn_prop("crate", Isometry::default(), crate_box(), 5.0);
        w.visibility.entry(ViewerId(1)).or_default().insert(p.entity);
        w.remove_entity(p.entity);
        assert!(!w.bodies().is_valid(p.root.0));
        assert!(w.visible_set(ViewerId(1)).is_empty());
        assert_eq!(w.find_entity("crate"), None);
    }

    #[test] fn digest_is_reproducible() {
        let run = || {
            let mut w = WorldBuilder::new().build();
            w.spawn_prop("a", iso(vec3(0.0, 2.0, 0.0), quat_identity()), crate_box(), 5.0);
            w.spawn_prop("b", iso(vec3(1.5, 4.0, 0.0), quat_identity()), Shape::Sphere { r: 0.3 }, 2.0);
            for _ in 0..90 { w.step(1.0 / 60.0); }
            w.state_hash()
        };
        assert_eq!(run(), run());
    }

    #[test] fn non_positive_dt_is_a_no_op() {
        let mut w = WorldBuilder::new().build();
        w.spawn_prop("a", iso(vec3(0.0, 2.0, 0.0), quat_identity()), crate_box(), 5.0);
        let before = w.state_hash();
        w.step(0.0);
        w.step(-1.0);
        assert_eq!(before, w.state_hash());
    }
}
