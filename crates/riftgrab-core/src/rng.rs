use crate::types::Vec3;

#[derive(Copy, Clone, Debug)]
pub struct XorShift64 { state: u64 }

impl XorShift64 {
    pub fn new(seed: u64) -> Self { Self { state: seed | 1 } }
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x >> 12; x ^= x << 25; x ^= x >> 27;
        self.state = x;
        ((x.wrapping_mul(2685821657736338717)) >> 32) as u32
    }
    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 { (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0) }
    /// Uniform in [lo, hi).
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 { lo + (hi - lo) * self.next_f32() }
    /// Uniform point inside the unit ball (rejection sampled, bounded attempts).
    pub fn in_unit_sphere(&mut self) -> Vec3 {
        for _ in 0..16 {
            let v = Vec3::new(self.range_f32(-1.0, 1.0), self.range_f32(-1.0, 1.0), self.range_f32(-1.0, 1.0));
            if v.length_squared() <= 1.0 { return v; }
        }
        Vec3::ZERO
    }
    pub fn state(&self) -> u64 { self.state }
}
