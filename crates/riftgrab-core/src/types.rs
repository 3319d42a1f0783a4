use glam::{Vec3A, Mat3A, Quat};
use crate::Scalar;

pub type Vec3 = Vec3A;
pub type Mat3 = Mat3A;

#[inline] pub fn vec3(x: Scalar, y: Scalar, z: Scalar) -> Vec3 { Vec3::new(x, y, z) }
#[inline] pub fn iso(pos: Vec3, rot: Quat) -> Isometry { Isometry { pos, rot } }
#[inline] pub fn quat_identity() -> Quat { Quat::IDENTITY }

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Isometry { pub pos: Vec3, pub rot: Quat }

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Velocity { pub lin: Vec3, pub ang: Vec3 }

impl Default for Isometry {
    fn default() -> Self { Self { pos: Vec3::ZERO, rot: Quat::IDENTITY } }
}

impl Isometry {
    /// Local-space point -> world space.
    #[inline] pub fn transform_point(&self, p: Vec3) -> Vec3 { self.pos + self.rot * p }
    /// World-space point -> local space.
    #[inline] pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 { self.rot.inverse() * (p - self.pos) }
    #[inline] pub fn transform_vector(&self, v: Vec3) -> Vec3 { self.rot * v }
}
