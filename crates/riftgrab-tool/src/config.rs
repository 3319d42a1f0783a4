use std::path::Path;

use anyhow::{anyhow, Context, Result};
use riftgrab_core::Scalar;
use serde::{Deserialize, Serialize};

/// Tuning for one gravity gun. Distances are in world units, forces are velocity changes
/// per unit mass (impulses are scaled by the body's mass when applied).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GravityGunConfig {
    pub max_pull_distance: Scalar,
    pub max_push_distance: Scalar,
    pub pull_force: Scalar,
    pub pull_radius: Scalar,
    pub push_force: Scalar,
    pub throw_force: Scalar,
    /// Base distance from the eye to the held body's surface.
    pub hold_distance: Scalar,
    pub attach_distance: Scalar,
    /// Seconds after a release before anything can be acquired again.
    pub drop_cooldown: Scalar,
    /// How long a pulled entity keeps priority over closer-to-aim candidates.
    pub target_priority_cutoff: Scalar,
    pub direct_trace_radius: Scalar,
    pub hold_smooth_time: Scalar,
    /// Linear throw strength for multi-body groups, relative to a single body.
    pub group_throw_scale: Scalar,
}

impl Default for GravityGunConfig {
    fn default() -> Self {
        Self {
            max_pull_distance: 1000.0,
            max_push_distance: 200.0,
            pull_force: 20.0,
            pull_radius: 80.0,
            push_force: 1000.0,
            throw_force: 2000.0,
            hold_distance: 50.0,
            attach_distance: 150.0,
            drop_cooldown: 0.5,
            target_priority_cutoff: 0.3,
            direct_trace_radius: 2.0,
            hold_smooth_time: 0.05,
            group_throw_scale: 0.5,
        }
    }
}

// ---------- tiny env helpers ----------
fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key).ok().and_then(|s| s.parse::<f32>().ok()).unwrap_or(default)
}

impl GravityGunConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s).context("parsing gravity gun config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_pull_distance", self.max_pull_distance),
            ("max_push_distance", self.max_push_distance),
            ("pull_radius", self.pull_radius),
            ("attach_distance", self.attach_distance),
            ("hold_smooth_time", self.hold_smooth_time),
            ("group_throw_scale", self.group_throw_scale),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) { return Err(anyhow!("{name} must be > 0 (got {v})")); }
        }
        let non_negative = [
            ("pull_force", self.pull_force),
            ("push_force", self.push_force),
            ("throw_force", self.throw_force),
            ("hold_distance", self.hold_distance),
            ("drop_cooldown", self.drop_cooldown),
            ("target_priority_cutoff", self.target_priority_cutoff),
            ("direct_trace_radius", self.direct_trace_radius),
        ];
        for (name, v) in non_negative {
            if !(v.is_finite() && v >= 0.0) { return Err(anyhow!("{name} must be >= 0 (got {v})")); }
        }
        if self.group_throw_scale > 1.0 {
            return Err(anyhow!("group_throw_scale must be <= 1 (got {})", self.group_throw_scale));
        }
        if self.max_push_distance > self.max_pull_distance {
            return Err(anyhow!("max_push_distance exceeds max_pull_distance"));
        }
        Ok(())
    }

    /// Apply `RIFTGRAB_<FIELD>` overrides (e.g. `RIFTGRAB_THROW_FORCE=1500`), then re-validate.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        self.max_pull_distance = env_f32("RIFTGRAB_MAX_PULL_DISTANCE", self.max_pull_distance);
        self.max_push_distance = env_f32("RIFTGRAB_MAX_PUSH_DISTANCE", self.max_push_distance);
        self.pull_force = env_f32("RIFTGRAB_PULL_FORCE", self.pull_force);
        self.pull_radius = env_f32("RIFTGRAB_PULL_RADIUS", self.pull_radius);
        self.push_force = env_f32("RIFTGRAB_PUSH_FORCE", self.push_force);
        self.throw_force = env_f32("RIFTGRAB_THROW_FORCE", self.throw_force);
        self.hold_distance = env_f32("RIFTGRAB_HOLD_DISTANCE", self.hold_distance);
        self.attach_distance = env_f32("RIFTGRAB_ATTACH_DISTANCE", self.attach_distance);
        self.drop_cooldown = env_f32("RIFTGRAB_DROP_COOLDOWN", self.drop_cooldown);
        self.target_priority_cutoff = env_f32("RIFTGRAB_TARGET_PRIORITY_CUTOFF", self.target_priority_cutoff);
        self.direct_trace_radius = env_f32("RIFTGRAB_DIRECT_TRACE_RADIUS", self.direct_trace_radius);
        self.hold_smooth_time = env_f32("RIFTGRAB_HOLD_SMOOTH_TIME", self.hold_smooth_time);
        self.group_throw_scale = env_f32("RIFTGRAB_GROUP_THROW_SCALE", self.group_throw_scale);
        self.validate().context("after RIFTGRAB_* overrides")?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn defaults_are_valid() {
        let c = GravityGunConfig::default();
        c.validate().unwrap();
        assert_eq!(c.max_pull_distance, 1000.0);
        assert_eq!(c.drop_cooldown, 0.5);
    }

    #[test] fn partial_json_keeps_defaults() {
        let c = GravityGunConfig::from_json_str(r#"{ "throw_force": 1500.0 }"#).unwrap();
        assert_eq!(c.throw_force, 1500.0);
        assert_eq!(c.pull_radius, 80.0);
    }

    #[test] fn rejects_bad_values_and_unknown_keys() {
        assert!(GravityGunConfig::from_json_str(r#"{ "pull_radius": 0.0 }"#).is_err());
        assert!(GravityGunConfig::from_json_str(r#"{ "drop_cooldown": -1.0 }"#).is_err());
        assert!(GravityGunConfig::from_json_str(r#"{ "group_throw_scale": 2.0 }"#).is_err());
        assert!(GravityGunConfig::from_json_str(r#"{ "throw_froce": 1.0 }"#).is_err());
    }

    #[test] fn missing_file_names_the_path() {
        let err = GravityGunConfig::load(Path::new("/nonexistent/riftgrab.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/riftgrab.json"));
    }
}
