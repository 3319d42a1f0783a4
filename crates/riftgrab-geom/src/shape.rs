use riftgrab_core::types::{Isometry, Vec3, Mat3};
use glam::Mat3A;
use crate::aabb::Aabb;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere { r: f32 },
    Box { hx: f32, hy: f32, hz: f32 },
    Capsule { r: f32, hh: f32 }, // half-height along local Y
}

#[inline]
pub fn aabb_of(shape: &Shape, xf: &Isometry) -> Aabb {
    match *shape {
        Shape::Sphere { r } => Aabb::from_center_half_extents(xf.pos, Vec3::splat(r)),
        Shape::Box { hx, hy, hz } => {
            let he = Vec3::new(hx, hy, hz);
            let rot = Mat3A::from_quat(xf.rot);
            let m = Mat3::from_cols(rot.x_axis.abs(), rot.y_axis.abs(), rot.z_axis.abs());
            Aabb::from_center_half_extents(xf.pos, m * he)
        }
        Shape::Capsule { r, hh } => {
            let axis_world = xf.rot * Vec3::Y * hh.abs();
            let he = axis_world.abs() + Vec3::splat(r);
            Aabb::from_center_half_extents(xf.pos, he)
        }
    }
}

#[inline]
pub fn closest_point_on_segment(a: Vec3, b: Vec3, p: Vec3) -> (Vec3, f32) {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= 1.0e-12 { return (a, 0.0); }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Closest point on the shape's surface to `p` (world space). Points inside
/// solid shapes are pushed out to the nearest face.
pub fn closest_point_on_shape(shape: &Shape, xf: &Isometry, p: Vec3) -> Vec3 {
    let local = xf.inverse_transform_point(p);
    let q = match *shape {
        Shape::Sphere { r } => sphere_surface(Vec3::ZERO, r, local),
        Shape::Box { hx, hy, hz } => {
            let he = Vec3::new(hx, hy, hz);
            let c = local.clamp(-he, he);
            if c != local { c } else {
                // inside: snap to the nearest face
                let d = he - local.abs();
                let mut out = local;
                if d.x <= d.y && d.x <= d.z { out.x = hx.copysign(local.x); }
                else if d.y <= d.z { out.y = hy.copysign(local.y); }
                else { out.z = hz.copysign(local.z); }
                out
            }
        }
        Shape::Capsule { r, hh } => {
            let (c, _) = closest_point_on_segment(Vec3::new(0.0, -hh, 0.0), Vec3::new(0.0, hh, 0.0), local);
            sphere_surface(c, r, local)
        }
    };
    xf.transform_point(q)
}

#[inline]
fn sphere_surface(center: Vec3, r: f32, p: Vec3) -> Vec3 {
    let d = p - center;
    let len = d.length();
    if len <= 1.0e-9 { center + Vec3::Y * r } else { center + d * (r / len) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftgrab_core::{iso, vec3, Quat};

    #[test] fn box_closest_point_from_outside() {
        let xf = iso(vec3(10.0, 0.0, 0.0), Quat::IDENTITY);
        let s = Shape::Box { hx: 1.0, hy: 1.0, hz: 1.0 };
        let q = closest_point_on_shape(&s, &xf, vec3(0.0, 0.0, 0.0));
        assert!((q - vec3(9.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test] fn rotated_box_closest_point() {
        let xf = iso(Vec3::ZERO, Quat::from_rotation_y(core::f32::consts::FRAC_PI_2));
        let s = Shape::Box { hx: 2.0, hy: 1.0, hz: 0.5 };
        // long local X axis now points along world -Z
        let q = closest_point_on_shape(&s, &xf, vec3(0.0, 0.0, 10.0));
        assert!((q.z - 2.0).abs() < 1e-4);
    }

    #[test] fn sphere_and_capsule_surfaces() {
        let xf = iso(vec3(0.0, 5.0, 0.0), Quat::IDENTITY);
        let q = closest_point_on_shape(&Shape::Sphere { r: 2.0 }, &xf, vec3(0.0, 0.0, 0.0));
        assert!((q - vec3(0.0, 3.0, 0.0)).length() < 1e-5);
        let q = closest_point_on_shape(&Shape::Capsule { r: 0.5, hh: 1.0 }, &xf, vec3(4.0, 5.5, 0.0));
        assert!((q - vec3(0.5, 5.5, 0.0)).length() < 1e-5);
    }

    #[test] fn inside_box_snaps_to_nearest_face() {
        let xf = Isometry::default();
        let q = closest_point_on_shape(&Shape::Box { hx: 1.0, hy: 2.0, hz: 2.0 }, &xf, vec3(0.8, 0.0, 0.0));
        assert!((q - vec3(1.0, 0.0, 0.0)).length() < 1e-5);
    }
}
