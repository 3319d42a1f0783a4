use core::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BodyId(pub u32);
impl fmt::Display for BodyId { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "BodyId({})", self.0) } }

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EntityId(pub u32);
impl fmt::Display for EntityId { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "EntityId({})", self.0) } }

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct GroupId(pub u32);
impl fmt::Display for GroupId { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "GroupId({})", self.0) } }

/// Identifies one tool instance. Zero is reserved as "no owner" in ownership tokens.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ControllerId(pub u32);
impl fmt::Display for ControllerId { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "ControllerId({})", self.0) } }

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ViewerId(pub u32);
impl fmt::Display for ViewerId { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "ViewerId({})", self.0) } }

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct JointId(pub u32);
impl fmt::Display for JointId { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "JointId({})", self.0) } }
