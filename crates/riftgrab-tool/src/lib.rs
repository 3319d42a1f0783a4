//! Remote rigid-body manipulation: aim at a dynamic body, push it, tug it closer, grab it into a
//! held pose that follows the operator's view, then drop or throw it.
//!
//! The tool only talks to the simulation through [`riftgrab_core::PhysicsHost`]. Two clocks
//! drive it: [`GravityGun::simulate`] once per update tick and
//! [`GravityGun::on_pre_physics_step`] once per fixed physics step.

pub mod config;
pub mod input;
pub mod selector;
pub mod session;
pub mod integrator;
pub mod gun;

pub use config::GravityGunConfig;
pub use input::{ButtonLatch, ButtonState, Eye, InputFrame};
pub use selector::{can_be_manipulated, Target, TargetMemory, TargetSelector};
pub use session::{GrabReject, GrabSession, Held, ThrowParams, ThrowReport};
pub use integrator::{HoldIntegrator, HoldStep};
pub use gun::{push_scale, Action, GravityGun, Role};
