use thiserror::Error;

use super::types::EntityId;

/// Composition errors raised by the component registry.
///
/// These indicate a bug in how entities were assembled, not a gameplay
/// condition. The fail-fast accessors (`get`, `add`, ...) panic with this
/// message; the `try_*` variants hand it back instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The entity was never created or has already been destroyed.
    #[error("entity {entity} does not exist")]
    NoSuchEntity { entity: EntityId },

    /// The entity exists but holds no component of the requested kind.
    #[error("component `{component}` not found for entity {entity}")]
    ComponentNotFound {
        entity: EntityId,
        component: &'static str,
    },

    /// The component is checked out while one of its own hooks runs.
    #[error("component `{component}` on entity {entity} is in use by one of its own hooks")]
    ComponentBusy {
        entity: EntityId,
        component: &'static str,
    },

    /// Resolving required components led back to a kind still being resolved.
    #[error("component `{component}` depends on itself through its required components")]
    DependencyCycle { component: &'static str },
}
