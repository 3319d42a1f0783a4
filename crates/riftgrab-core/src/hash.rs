use blake3::Hasher;
use crate::types::Vec3;
use glam::Quat;

/// Digest of observable simulation state; equal digests mean equal state.
pub struct StepHasher(Hasher);

impl StepHasher {
    pub fn new() -> Self { StepHasher(Hasher::new()) }
    pub fn update_bytes(&mut self, bytes: &[u8]) { self.0.update(bytes); }
    pub fn update_u32(&mut self, v: u32) { self.0.update(&v.to_le_bytes()); }
    pub fn update_f32(&mut self, v: f32) { self.0.update(&v.to_le_bytes()); }
    pub fn update_bool(&mut self, v: bool) { self.0.update(&[v as u8]); }
    pub fn update_str(&mut self, s: &str) {
        self.0.update(&(s.len() as u64).to_le_bytes());
        self.0.update(s.as_bytes());
    }
    pub fn finalize(self) -> [u8; 32] { *self.0.finalize().as_bytes() }
}

impl Default for StepHasher {
    fn default() -> Self { Self::new() }
}

#[inline]
pub fn hash_vec3(h: &mut StepHasher, v: &Vec3) {
    for c in [v.x, v.y, v.z] { h.update_f32(c); }
}

#[inline]
pub fn hash_quat(h: &mut StepHasher, q: &Quat) {
    for c in [q.x, q.y, q.z, q.w] { h.update_f32(c); }
}
