pub mod aabb;
pub mod shape;
pub mod mass;

pub use aabb::Aabb;
pub use shape::{Shape, aabb_of, closest_point_on_shape, closest_point_on_segment};
pub use mass::MassProps;
