use riftgrab_core::types::{Isometry, Vec3};
use riftgrab_geom::{Aabb, Shape, closest_point_on_segment};

/* ---------- slab test (segment p0 -> p0 + dir, t in [0,1]) ---------- */
fn ray_aabb_slab(origin: Vec3, dir: Vec3, aabb: &Aabb) -> Option<(f32, Vec3)> {
    if aabb.contains(origin) {
        return Some((0.0, -dir.normalize_or_zero()));
    }
    let inv = Vec3::new(
        if dir.x.abs() > 1e-9 { 1.0 / dir.x } else { 1.0e9 },
        if dir.y.abs() > 1e-9 { 1.0 / dir.y } else { 1.0e9 },
        if dir.z.abs() > 1e-9 { 1.0 / dir.z } else { 1.0e9 },
    );
    let t1 = (aabb.min - origin) * inv;
    let t2 = (aabb.max - origin) * inv;
    let tmin = t1.min(t2);
    let tmax = t1.max(t2);
    let mut t_enter = tmin.x; let mut n = Vec3::new(if t1.x > t2.x { 1.0 } else { -1.0 },0.0,0.0);
    if tmin.y > t_enter { t_enter = tmin.y; n = Vec3::new(0.0, if t1.y > t2.y { 1.0 } else { -1.0 },0.0); }
    if tmin.z > t_enter { t_enter = tmin.z; n = Vec3::new(0.0,0.0, if t1.z > t2.z { 1.0 } else { -1.0 }); }
    let t_exit = tmax.x.min(tmax.y).min(tmax.z);
    if t_enter <= t_exit && t_exit >= 0.0 && (0.0..=1.0).contains(&t_enter) { Some((t_enter, n)) } else { None }
}

/* ---------- segment vs sphere ---------- */
fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, r: f32) -> Option<(f32, Vec3)> {
    let m = origin - center;
    let c = m.length_squared() - r * r;
    if c <= 0.0 { return Some((0.0, m.normalize_or_zero())); }
    let a = dir.length_squared();
    if a <= 1e-12 { return None; }
    let b = m.dot(dir);
    if b > 0.0 { return None; } // moving away
    let disc = b * b - a * c;
    if disc < 0.0 { return None; }
    let t = (-b - disc.sqrt()) / a;
    if !(0.0..=1.0).contains(&t) { return None; }
    let p = origin + dir * t;
    Some((t, (p - center).normalize_or_zero()))
}

/* ---------- segment vs capsule (spheres at both ends + finite cylinder) ---------- */
fn ray_capsule(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, r: f32) -> Option<(f32, Vec3)> {
    let (c, _) = closest_point_on_segment(a, b, origin);
    if (origin - c).length_squared() <= r * r {
        return Some((0.0, (origin - c).normalize_or_zero()));
    }
    let mut best: Option<(f32, Vec3)> = None;
    let mut take = |cand: Option<(f32, Vec3)>| {
        if let Some((t, n)) = cand {
            if best.map_or(true, |(bt, _)| t < bt) { best = Some((t, n)); }
        }
    };
    take(ray_sphere(origin, dir, a, r));
    take(ray_sphere(origin, dir, b, r));

    // side: project out the axis and solve the 2D circle intersection
    let axis = b - a;
    let len = axis.length();
    if len > 1e-9 {
        let u = axis / len;
        let m = origin - a;
        let d_perp = dir - u * dir.dot(u);
        let m_perp = m - u * m.dot(u);
        let qa = d_perp.length_squared();
        if qa > 1e-12 {
            let qb = m_perp.dot(d_perp);
            let qc = m_perp.length_squared() - r * r;
            let disc = qb * qb - qa * qc;
            if disc >= 0.0 {
                let t = (-qb - disc.sqrt()) / qa;
                if (0.0..=1.0).contains(&t) {
                    let p = origin + dir * t;
                    let s = (p - a).dot(u);
                    if (0.0..=len).contains(&s) {
                        take(Some((t, (p - (a + u * s)).normalize_or_zero())));
                    }
                }
            }
        }
    }
    best
}

/// Sweep a sphere of radius `radius` from `p0` to `p1` against `shape` posed at `xf`.
/// Returns (fraction in [0,1], world normal). Boxes are inflated as boxes (corners are not rounded).
pub fn sweep_sphere_vs_shape(p0: Vec3, p1: Vec3, radius: f32, shape: &Shape, xf: &Isometry) -> Option<(f32, Vec3)> {
    let o = xf.inverse_transform_point(p0);
    let d = xf.rot.inverse() * (p1 - p0);
    let hit = match *shape {
        Shape::Sphere { r } => ray_sphere(o, d, Vec3::ZERO, r + radius),
        Shape::Box { hx, hy, hz } => {
            let he = Vec3::new(hx, hy, hz);
            ray_aabb_slab(o, d, &Aabb::from_center_half_extents(Vec3::ZERO, he).expanded(radius))
        }
        Shape::Capsule { r, hh } => ray_capsule(o, d, Vec3::new(0.0, -hh, 0.0), Vec3::new(0.0, hh, 0.0), r + radius),
    }?;
    Some((hit.0, xf.rot * hit.1))
}

/* ---------- deterministic pick ---------- */
#[derive(Copy, Clone, Debug)]
pub struct SweepHit { pub toi: f32, pub normal: Vec3, pub target_index: usize }

/// Earliest time of impact wins; ties go to the lower target index.
pub fn pick_better(cur: Option<SweepHit>, cand: SweepHit) -> Option<SweepHit> {
    match cur {
        None => Some(cand),
        Some(b) => {
            if cand.toi < b.toi - 1e-9 { return Some(cand); }
            if (cand.toi - b.toi).abs() <= 1e-9 && cand.target_index < b.target_index { return Some(cand); }
            Some(b)
        }
    }
}

/// Stable nearest-first ordering for multi-hit queries.
pub fn sort_hits(hits: &mut [SweepHit]) {
    hits.sort_by(|a, b| a.toi.total_cmp(&b.toi).then(a.target_index.cmp(&b.target_index)));
}

/// Shortest distance from `p` to the segment `a`-`b`.
#[inline]
pub fn distance_to_segment(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    let (c, _) = closest_point_on_segment(a, b, p);
    (p - c).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftgrab_core::{iso, vec3, Quat};

    #[test] fn thin_ray_hits_box_face() {
        let xf = iso(vec3(10.0, 0.0, 0.0), Quat::IDENTITY);
        let s = Shape::Box { hx: 1.0, hy: 1.0, hz: 1.0 };
        let (t, n) = sweep_sphere_vs_shape(Vec3::ZERO, vec3(20.0, 0.0, 0.0), 0.0, &s, &xf).unwrap();
        assert!((t - 0.45).abs() < 1e-5);
        assert!((n - vec3(-1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test] fn fat_ray_grazes_what_thin_ray_misses() {
        let xf = iso(vec3(10.0, 3.0, 0.0), Quat::IDENTITY);
        let s = Shape::Sphere { r: 1.0 };
        assert!(sweep_sphere_vs_shape(Vec3::ZERO, vec3(20.0, 0.0, 0.0), 0.0, &s, &xf).is_none());
        assert!(sweep_sphere_vs_shape(Vec3::ZERO, vec3(20.0, 0.0, 0.0), 2.5, &s, &xf).is_some());
    }

    #[test] fn capsule_side_hit() {
        let xf = iso(vec3(5.0, 0.0, 0.0), Quat::IDENTITY);
        let s = Shape::Capsule { r: 0.5, hh: 2.0 };
        let (t, _) = sweep_sphere_vs_shape(vec3(0.0, 1.0, 0.0), vec3(10.0, 1.0, 0.0), 0.0, &s, &xf).unwrap();
        assert!((t - 0.45).abs() < 1e-5);
    }

    #[test] fn segment_too_short_misses() {
        let xf = iso(vec3(10.0, 0.0, 0.0), Quat::IDENTITY);
        let s = Shape::Box { hx: 1.0, hy: 1.0, hz: 1.0 };
        assert!(sweep_sphere_vs_shape(Vec3::ZERO, vec3(5.0, 0.0, 0.0), 0.0, &s, &xf).is_none());
    }

    #[test] fn ties_prefer_lower_index() {
        let a = SweepHit { toi: 0.5, normal: Vec3::X, target_index: 3 };
        let b = SweepHit { toi: 0.5, normal: Vec3::X, target_index: 1 };
        assert_eq!(pick_better(Some(a), b).unwrap().target_index, 1);
        assert_eq!(pick_better(Some(b), a).unwrap().target_index, 1);
    }

    #[test] fn perpendicular_distance_to_aim_segment() {
        let d = distance_to_segment(Vec3::ZERO, vec3(1000.0, 0.0, 0.0), vec3(100.0, 5.0, 0.0));
        assert!((d - 5.0).abs() < 1e-4);
        // beyond the end clamps to the endpoint
        let d = distance_to_segment(Vec3::ZERO, vec3(10.0, 0.0, 0.0), vec3(13.0, 4.0, 0.0));
        assert!((d - 5.0).abs() < 1e-4);
    }
}
