use riftgrab_core::types::Vec3;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Aabb { pub min: Vec3, pub max: Vec3 }

impl Aabb {
    #[inline] pub fn new(min: Vec3, max: Vec3) -> Self { Self { min, max } }
    #[inline] pub fn from_center_half_extents(c: Vec3, he: Vec3) -> Self {
        Self { min: c - he, max: c + he }
    }
    #[inline] pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x || self.min.x > other.max.x ||
            self.max.y < other.min.y || self.min.y > other.max.y ||
            self.max.z < other.min.z || self.min.z > other.max.z)
    }
    #[inline] pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
            p.y >= self.min.y && p.y <= self.max.y &&
            p.z >= self.min.z && p.z <= self.max.z
    }
    #[inline] pub fn expanded(&self, r: f32) -> Aabb {
        let e = Vec3::splat(r);
        Aabb { min: self.min - e, max: self.max + e }
    }
    #[inline] pub fn clamp_point(&self, p: Vec3) -> Vec3 { p.clamp(self.min, self.max) }
    #[inline] pub fn center(&self) -> Vec3 { (self.min + self.max) * 0.5 }
}
