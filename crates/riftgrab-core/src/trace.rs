use crate::{BodyId, EntityId, Scalar, Vec3};

/// Ray or swept-sphere query description. Built fluently:
/// `TraceQuery::ray(a, b).radius(2.0).with_any_tags(&["solid"]).use_hitboxes()`.
#[derive(Clone, Debug)]
pub struct TraceQuery {
    pub from: Vec3,
    pub to: Vec3,
    pub radius: Scalar,
    pub any_tags: Vec<String>,   // empty = no filter
    pub ignore: Option<EntityId>,
    pub entities_only: bool,
    pub use_hitboxes: bool,
}

impl TraceQuery {
    pub fn ray(from: Vec3, to: Vec3) -> Self {
        Self { from, to, radius: 0.0, any_tags: Vec::new(), ignore: None, entities_only: false, use_hitboxes: false }
    }
    pub fn radius(mut self, r: Scalar) -> Self { self.radius = r.max(0.0); self }
    pub fn with_any_tags(mut self, tags: &[&str]) -> Self {
        self.any_tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
    pub fn ignore(mut self, e: Option<EntityId>) -> Self { self.ignore = e; self }
    pub fn entities_only(mut self) -> Self { self.entities_only = true; self }
    pub fn use_hitboxes(mut self) -> Self { self.use_hitboxes = true; self }

    #[inline] pub fn length(&self) -> Scalar { (self.to - self.from).length() }
    #[inline] pub fn direction(&self) -> Vec3 { (self.to - self.from).normalize_or_zero() }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TraceResult {
    pub hit: bool,
    /// Position along the segment in [0, 1].
    pub fraction: Scalar,
    /// Distance travelled from `from` to `end_position`.
    pub distance: Scalar,
    pub start_position: Vec3,
    pub end_position: Vec3,
    pub body: Option<BodyId>,
    pub entity: Option<EntityId>,
}

impl TraceResult {
    pub fn miss(q: &TraceQuery) -> Self {
        Self {
            hit: false, fraction: 1.0, distance: q.length(),
            start_position: q.from, end_position: q.to, body: None, entity: None,
        }
    }

    pub fn at_fraction(q: &TraceQuery, fraction: Scalar, body: BodyId, entity: Option<EntityId>) -> Self {
        let f = fraction.clamp(0.0, 1.0);
        Self {
            hit: true, fraction: f, distance: q.length() * f,
            start_position: q.from, end_position: q.from + (q.to - q.from) * f,
            body: Some(body), entity,
        }
    }
}
