use std::fmt;

/// Unique identifier for an entity in the registry.
///
/// Identifiers come from a monotonically increasing counter and are never
/// reissued, so an id held after its entity was destroyed simply stops
/// resolving instead of aliasing a newer entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle the renderer uses to identify a drawable (mesh, instance slot...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderHandle(pub u32);
