use riftgrab_core::types::{Mat3, Vec3};

#[derive(Copy, Clone, Debug)]
pub struct MassProps {
    pub mass: f32,
    pub inv_mass: f32,
    pub inertia: Mat3,
    /// Center of mass in the body's local frame.
    pub local_com: Vec3,
}

impl MassProps {
    pub fn infinite() -> Self {
        Self { mass: f32::INFINITY, inv_mass: 0.0, inertia: Mat3::IDENTITY, local_com: Vec3::ZERO }
    }

    pub fn from_sphere(radius: f32, density: f32) -> Self {
        let vol = (4.0/3.0) * core::f32::consts::PI * radius*radius*radius;
        let m = density * vol;
        let ii = 0.4 * m * radius * radius;
        Self { mass: m, inv_mass: 1.0/m, inertia: Mat3::from_diagonal(glam::Vec3::splat(ii)), local_com: Vec3::ZERO }
    }

    pub fn from_box(half: Vec3, density: f32) -> Self {
        let dims = half * 2.0;
        let m = density * dims.x * dims.y * dims.z;
        let x2 = dims.x * dims.x;
        let y2 = dims.y * dims.y;
        let z2 = dims.z * dims.z;
        let ix = (1.0/12.0) * m * (y2 + z2);
        let iy = (1.0/12.0) * m * (x2 + z2);
        let iz = (1.0/12.0) * m * (x2 + y2);
        Self { mass: m, inv_mass: 1.0/m, inertia: Mat3::from_diagonal(glam::Vec3::new(ix, iy, iz)), local_com: Vec3::ZERO }
    }

    pub fn from_capsule(radius: f32, half_h: f32, density: f32) -> Self {
        let h = half_h * 2.0;
        let vol_cyl = core::f32::consts::PI * radius*radius * h;
        let vol_sph = (4.0/3.0) * core::f32::consts::PI * radius*radius*radius;
        let m = density * (vol_cyl + vol_sph);
        let ix = 0.25 * m * radius*radius + (1.0/12.0) * m * h*h;
        let iy = 0.5 * m * radius*radius;
        Self { mass: m, inv_mass: 1.0/m, inertia: Mat3::from_diagonal(glam::Vec3::new(ix, iy, ix)), local_com: Vec3::ZERO }
    }

    /// Same body rescaled to exactly `mass` (inertia scales with it).
    pub fn with_mass(self, mass: f32) -> Self {
        if !(mass > 0.0) || !self.mass.is_finite() || self.mass <= 0.0 { return self; }
        let k = mass / self.mass;
        Self { mass, inv_mass: 1.0 / mass, inertia: self.inertia * k, local_com: self.local_com }
    }

    /// Move the center of mass away from the body origin.
    pub fn with_local_com(mut self, com: Vec3) -> Self { self.local_com = com; self }

    #[inline] pub fn is_infinite(&self) -> bool { self.inv_mass == 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn with_mass_rescales_inverse() {
        let m = MassProps::from_box(Vec3::splat(0.5), 1000.0).with_mass(10.0);
        assert!((m.mass - 10.0).abs() < 1e-5);
        assert!((m.inv_mass - 0.1).abs() < 1e-6);
    }

    #[test] fn infinite_mass_ignores_rescale() {
        let m = MassProps::infinite().with_mass(5.0);
        assert!(m.is_infinite());
    }
}
