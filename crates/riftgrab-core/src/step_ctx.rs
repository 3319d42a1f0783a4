/// Per-step context handed to fixed-step hooks.
#[derive(Copy, Clone, Debug)]
pub struct StepCtx {
    pub dt: f32,
    pub tick: u64,
}
