use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use riftgrab_core::{iso, quat_identity, vec3, Scalar, Vec3};
use riftgrab_geom::Shape;
use riftgrab_world::{Link, Spawned, World, WorldBuilder};

use crate::script::{Buttons, ScriptStep};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeBlock {
    Sphere { r: f32 },
    Box { hx: f32, hy: f32, hz: f32 },
    Capsule { r: f32, hh: f32 },
}

impl From<ShapeBlock> for Shape {
    fn from(s: ShapeBlock) -> Shape {
        match s {
            ShapeBlock::Sphere { r } => Shape::Sphere { r },
            ShapeBlock::Box { hx, hy, hz } => Shape::Box { hx, hy, hz },
            ShapeBlock::Capsule { r, hh } => Shape::Capsule { r, hh },
        }
    }
}

impl ShapeBlock {
    fn validate(&self, owner: &str) -> Result<()> {
        let ok = |d: f32| d.is_finite() && d > 0.0;
        let valid = match *self {
            ShapeBlock::Sphere { r } => ok(r),
            ShapeBlock::Box { hx, hy, hz } => ok(hx) && ok(hy) && ok(hz),
            ShapeBlock::Capsule { r, hh } => ok(r) && ok(hh),
        };
        if valid { Ok(()) } else { Err(anyhow!("{owner}: shape dimensions must be > 0")) }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PropBlock {
    pub name: String,
    pub pos: [f32; 3],
    pub shape: ShapeBlock,
    pub mass: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StaticBlock {
    pub name: String,
    pub pos: [f32; 3],
    pub shape: ShapeBlock,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LinkBlock {
    pub offset: [f32; 3],
    pub shape: ShapeBlock,
    pub mass: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RagdollBlock {
    pub name: String,
    pub origin: [f32; 3],
    pub links: Vec<LinkBlock>,
    #[serde(default)]
    pub compliance: f32,
}

/// The operator's capsule; the eye sits `eye_height` above the capsule center.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OperatorBlock {
    pub pos: [f32; 3],
    pub radius: f32,
    pub half_height: f32,
    pub mass: f32,
    pub eye_height: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SceneDescriptor {
    pub dt: f32,
    pub gravity: [f32; 3],
    #[serde(default)]
    pub ground: Option<f32>,
    pub operator: OperatorBlock,
    #[serde(default)]
    pub props: Vec<PropBlock>,
    #[serde(default)]
    pub ragdolls: Vec<RagdollBlock>,
    #[serde(default)]
    pub statics: Vec<StaticBlock>,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

pub struct BuiltScene {
    pub world: World,
    pub operator: Spawned,
    pub eye_height: Scalar,
}

#[inline] fn v3(a: [f32; 3]) -> Vec3 { vec3(a[0], a[1], a[2]) }

fn positive(what: &str, v: f32) -> Result<()> {
    if v.is_finite() && v > 0.0 { Ok(()) } else { Err(anyhow!("{what} must be > 0 (got {v})")) }
}

impl SceneDescriptor {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let sd: Self = serde_json::from_str(s).context("parsing scene descriptor")?;
        sd.validate()?;
        Ok(sd)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("scene {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dt > 0.0 && self.dt <= 1.0) { return Err(anyhow!("dt out of range")); }
        if !self.gravity.iter().all(|g| g.is_finite()) { return Err(anyhow!("gravity must be finite")); }

        let op = &self.operator;
        positive("operator.radius", op.radius)?;
        positive("operator.half_height", op.half_height)?;
        positive("operator.mass", op.mass)?;

        let mut names = BTreeSet::new();
        let mut claim = |name: &str| -> Result<()> {
            if name.is_empty() { return Err(anyhow!("entity names must not be empty")); }
            if name == "operator" || !names.insert(name.to_string()) {
                return Err(anyhow!("duplicate entity name {name:?}"));
            }
            Ok(())
        };
        for p in &self.props {
            claim(&p.name)?;
            p.shape.validate(&p.name)?;
            positive(&format!("{}.mass", p.name), p.mass)?;
        }
        for s in &self.statics {
            claim(&s.name)?;
            s.shape.validate(&s.name)?;
        }
        for r in &self.ragdolls {
            claim(&r.name)?;
            if r.links.is_empty() { return Err(anyhow!("{}: ragdoll needs at least one link", r.name)); }
            if r.compliance < 0.0 { return Err(anyhow!("{}: compliance must be >= 0", r.name)); }
            for l in &r.links {
                l.shape.validate(&r.name)?;
                positive(&format!("{}.link.mass", r.name), l.mass)?;
            }
        }

        for (i, step) in self.script.iter().enumerate() {
            if let Some(aim) = &step.aim {
                if !names.contains(aim) { return Err(anyhow!("script[{i}]: unknown aim target {aim:?}")); }
            }
        }
        Ok(())
    }

    pub fn build(&self) -> Result<BuiltScene> {
        self.validate()?;
        let mut w = WorldBuilder::new()
            .with_capacity(64, 64)
            .gravity(v3(self.gravity))
            .ground(self.ground)
            .build();

        let op = &self.operator;
        let operator = w.spawn_actor(
            "operator",
            iso(v3(op.pos), quat_identity()),
            Shape::Capsule { r: op.radius, hh: op.half_height },
            op.mass,
        );
        for s in &self.statics {
            w.spawn_static(&s.name, iso(v3(s.pos), quat_identity()), s.shape.into());
        }
        for p in &self.props {
            w.spawn_prop(&p.name, iso(v3(p.pos), quat_identity()), p.shape.into(), p.mass);
        }
        for r in &self.ragdolls {
            let links: Vec<Link> = r.links.iter()
                .map(|l| Link { offset: v3(l.offset), shape: l.shape.into(), mass: l.mass })
                .collect();
            w.spawn_ragdoll(&r.name, v3(r.origin), &links, r.compliance)
                .ok_or_else(|| anyhow!("{}: ragdoll did not spawn", r.name))?;
        }
        Ok(BuiltScene { world: w, operator, eye_height: op.eye_height })
    }
}

/// Demo room at inch scale: a crate to grab and throw, a barrel to push, a distant crate to
/// tug in, and a three-link dummy.
pub fn default_scene() -> SceneDescriptor {
    let crate_box = ShapeBlock::Box { hx: 8.0, hy: 8.0, hz: 8.0 };
    let link = |y: f32| LinkBlock { offset: [0.0, y, 0.0], shape: ShapeBlock::Sphere { r: 6.0 }, mass: 10.0 };
    let step = |ticks: u32, aim: Option<&str>, buttons: Buttons| ScriptStep { ticks, aim: aim.map(str::to_string), buttons };

    SceneDescriptor {
        dt: 1.0 / 60.0,
        gravity: [0.0, -386.0, 0.0],
        ground: Some(0.0),
        operator: OperatorBlock { pos: [0.0, 36.0, 0.0], radius: 16.0, half_height: 20.0, mass: 80.0, eye_height: 28.0 },
        props: vec![
            PropBlock { name: "crate".into(), pos: [100.0, 8.0, 0.0], shape: crate_box, mass: 20.0 },
            PropBlock { name: "barrel".into(), pos: [160.0, 20.0, 40.0], shape: ShapeBlock::Capsule { r: 8.0, hh: 12.0 }, mass: 30.0 },
            PropBlock { name: "far_crate".into(), pos: [400.0, 8.0, 0.0], shape: crate_box, mass: 20.0 },
        ],
        ragdolls: vec![RagdollBlock {
            name: "dummy".into(),
            origin: [110.0, 40.0, -60.0],
            links: vec![link(0.0), link(-14.0), link(-28.0)],
            compliance: 0.0,
        }],
        statics: vec![StaticBlock { name: "wall".into(), pos: [600.0, 60.0, 0.0], shape: ShapeBlock::Box { hx: 8.0, hy: 60.0, hz: 200.0 } }],
        script: vec![
            step(30, Some("crate"), Buttons::Secondary),
            step(60, None, Buttons::None),
            step(1, None, Buttons::Primary),
            step(40, None, Buttons::None),
            step(1, Some("barrel"), Buttons::Primary),
            step(20, None, Buttons::None),
            step(30, Some("far_crate"), Buttons::Secondary),
            step(10, None, Buttons::None),
            step(40, Some("dummy"), Buttons::Secondary),
            step(30, None, Buttons::None),
            step(1, None, Buttons::Primary),
            step(60, None, Buttons::None),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn default_scene_is_valid_and_round_trips_through_json() {
        let sd = default_scene();
        sd.validate().unwrap();
        let text = serde_json::to_string(&sd).unwrap();
        let back = SceneDescriptor::from_json_str(&text).unwrap();
        assert_eq!(back.props.len(), 3);
        assert_eq!(back.script.len(), sd.script.len());
    }

    #[test] fn builds_every_entity() {
        let s = default_scene().build().unwrap();
        for name in ["operator", "crate", "barrel", "far_crate", "dummy", "wall"] {
            assert!(s.world.find_entity(name).is_some(), "{name}");
        }
        assert_eq!(s.world.find_entity("operator"), Some(s.operator.entity));
    }

    #[test] fn rejects_bad_descriptors() {
        let mut sd = default_scene();
        sd.dt = 0.0;
        assert!(sd.validate().is_err());

        let mut sd = default_scene();
        sd.props[1].name = "crate".into();
        assert!(sd.validate().is_err());

        let mut sd = default_scene();
        sd.ragdolls[0].links.clear();
        assert!(sd.validate().is_err());

        let mut sd = default_scene();
        sd.script[0].aim = Some("ghost".into());
        assert!(sd.validate().is_err());
    }

    #[test] fn shapes_parse_from_tagged_json() {
        let s: ShapeBlock = serde_json::from_str(r#"{ "kind": "capsule", "r": 2.0, "hh": 3.0 }"#).unwrap();
        assert_eq!(Shape::from(s), Shape::Capsule { r: 2.0, hh: 3.0 });
        assert!(serde_json::from_str::<ShapeBlock>(r#"{ "kind": "cone", "r": 1.0 }"#).is_err());
    }
}
