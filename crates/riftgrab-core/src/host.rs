//! Capabilities a host simulation provides to tools that manipulate its bodies.
//!
//! The split mirrors what the host owns: rigid bodies (and their groups), the entities
//! wrapping them, and spatial queries. A world that implements all three is a `PhysicsHost`.

use crate::{BodyId, ControllerId, EntityId, GroupId, Isometry, Scalar, TraceQuery, TraceResult, Vec3, Velocity, ViewerId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum BodyKind {
    #[default]
    Dynamic,
    Kinematic,
    Static,
}

pub trait RigidBodies {
    fn body_valid(&self, b: BodyId) -> bool;
    fn body_kind(&self, b: BodyId) -> BodyKind;
    fn body_pose(&self, b: BodyId) -> Isometry;
    fn body_vel(&self, b: BodyId) -> Velocity;
    fn set_body_vel(&mut self, b: BodyId, v: Velocity);
    fn body_mass(&self, b: BodyId) -> Scalar;
    /// Center of mass in the body's local frame.
    fn body_local_com(&self, b: BodyId) -> Vec3;
    fn body_world_com(&self, b: BodyId) -> Vec3 {
        self.body_pose(b).transform_point(self.body_local_com(b))
    }

    fn is_sleeping(&self, b: BodyId) -> bool;
    fn set_sleeping(&mut self, b: BodyId, sleeping: bool);
    fn auto_sleep(&self, b: BodyId) -> bool;
    fn set_auto_sleep(&mut self, b: BodyId, enabled: bool);

    /// Closest point on the body's collision surface to `p` (world space).
    fn closest_point(&self, b: BodyId, p: Vec3) -> Vec3;

    fn apply_impulse(&mut self, b: BodyId, j: Vec3);
    fn apply_impulse_at(&mut self, b: BodyId, point: Vec3, j: Vec3);
    fn apply_angular_impulse(&mut self, b: BodyId, j: Vec3);

    fn body_group(&self, b: BodyId) -> Option<GroupId>;
    fn group_body_count(&self, g: GroupId) -> usize;
    /// `with_mass` scales `j` by each member's mass (a velocity change, not a raw impulse).
    fn apply_group_impulse(&mut self, g: GroupId, j: Vec3, with_mass: bool);
    fn apply_group_angular_impulse(&mut self, g: GroupId, j: Vec3, with_mass: bool);

    /// Body is driven by an actor (player movement); tools must not steer it.
    fn actor_controlled(&self, b: BodyId) -> bool;

    /// Atomically claim the body for `owner`. Succeeds if unowned or already owned by `owner`.
    fn try_claim(&self, b: BodyId, owner: ControllerId) -> bool;
    /// Release a claim held by `owner`. Returns false if `owner` did not hold it.
    fn release_claim(&self, b: BodyId, owner: ControllerId) -> bool;
    fn owner_of(&self, b: BodyId) -> Option<ControllerId>;
}

pub trait Entities {
    fn entity_valid(&self, e: EntityId) -> bool;
    /// Part of the static world (map geometry); never manipulable.
    fn entity_is_world(&self, e: EntityId) -> bool;
    fn entity_physics_enabled(&self, e: EntityId) -> bool;
    fn entity_group(&self, e: EntityId) -> Option<GroupId>;
    /// Root body of the entity.
    fn entity_body(&self, e: EntityId) -> Option<BodyId>;
    fn entity_position(&self, e: EntityId) -> Vec3;

    fn has_tag(&self, e: EntityId, tag: &str) -> bool;
    fn add_tag(&mut self, e: EntityId, tag: &str);
    fn remove_tag(&mut self, e: EntityId, tag: &str);

    fn collisions_enabled(&self, e: EntityId) -> bool;
    fn set_collisions_enabled(&mut self, e: EntityId, enabled: bool);

    fn visibility_add(&mut self, viewer: ViewerId, e: EntityId);
    fn visibility_remove(&mut self, viewer: ViewerId, e: EntityId);
    fn is_visible_to(&self, viewer: ViewerId, e: EntityId) -> bool;
}

pub trait RayQuery {
    /// Nearest hit along the query, or a miss.
    fn trace(&self, q: &TraceQuery) -> TraceResult;
    /// Every hit along the query, nearest first.
    fn trace_all(&self, q: &TraceQuery) -> Vec<TraceResult>;
}

pub trait PhysicsHost: RigidBodies + Entities + RayQuery {}
impl<T: RigidBodies + Entities + RayQuery> PhysicsHost for T {}
