pub mod scalar;
pub mod ids;
pub mod types;
pub mod hash;
pub mod time;
pub mod rng;
pub mod step_ctx;
pub mod tags;
pub mod trace;
pub mod host;

pub use scalar::Scalar;
pub use ids::{BodyId, EntityId, GroupId, ControllerId, ViewerId, JointId};
pub use types::{Vec3, Mat3, Isometry, Velocity, vec3, iso, quat_identity};
pub use hash::{StepHasher, hash_vec3, hash_quat};
pub use time::{StepStats, TimeSince};
pub use rng::XorShift64;
pub use step_ctx::StepCtx;
pub use tags::{TagSet, GRABBED_TAG, SOLID_TAG};
pub use trace::{TraceQuery, TraceResult};
pub use host::{BodyKind, RigidBodies, Entities, RayQuery, PhysicsHost};
pub use glam::Quat;
