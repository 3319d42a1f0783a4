/// Simulation scalar. Everything in the workspace runs in single precision.
pub type Scalar = f32;
