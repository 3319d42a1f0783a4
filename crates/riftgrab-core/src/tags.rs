use std::collections::BTreeSet;

/// Marks an entity that some controller currently holds.
pub const GRABBED_TAG: &str = "grabbed";
/// Surfaces the tool's traces are allowed to hit.
pub const SOLID_TAG: &str = "solid";

/// Ordered tag set (ordered so hashing it is stable).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self { Self(BTreeSet::new()) }
    pub fn from_slice(tags: &[&str]) -> Self { Self(tags.iter().map(|t| t.to_string()).collect()) }
    #[inline] pub fn has(&self, tag: &str) -> bool { self.0.contains(tag) }
    /// Returns false if the tag was already present.
    pub fn add(&mut self, tag: &str) -> bool { self.0.insert(tag.to_string()) }
    /// Returns false if the tag was absent.
    pub fn remove(&mut self, tag: &str) -> bool { self.0.remove(tag) }
    pub fn has_any(&self, tags: &[String]) -> bool { tags.iter().any(|t| self.0.contains(t.as_str())) }
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ { self.0.iter().map(String::as_str) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}
