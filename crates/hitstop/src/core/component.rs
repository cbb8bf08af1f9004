//! Component trait, type-erased component kinds and the entity builder.
//!
//! A component kind is identified by its Rust type (`TypeId`). Kinds that
//! other components depend on must be `Default` so the registry can insert
//! them on demand; see [`ComponentKind::of`].

use std::any::{type_name, Any, TypeId};
use std::fmt;

use crate::api::game::EngineContext;
use crate::api::types::EntityId;

/// Upcast helper so a `dyn Component` can be downcast to its concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of data + behaviour attached to exactly one entity.
///
/// Every hook receives the whole [`EngineContext`]. While a hook runs, the
/// component itself is checked out of the registry: looking it up through
/// the registry from inside its own hook yields `ComponentBusy`.
pub trait Component: AsAny {
    /// Kinds that must exist on the entity before this one starts.
    fn requires() -> Vec<ComponentKind>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Fires once, after this component and all of its required components
    /// are attached and started.
    fn on_start(&mut self, _ctx: &mut EngineContext, _entity: EntityId) {}

    /// Fires once per simulation tick while attached.
    fn on_update(&mut self, _ctx: &mut EngineContext, _entity: EntityId, _dt: f32) {}

    /// Fires once per render pass while attached.
    fn on_render(&mut self, _ctx: &mut EngineContext, _entity: EntityId) {}

    /// Fires once when the component is removed or its entity destroyed.
    fn on_destroy(&mut self, _ctx: &mut EngineContext, _entity: EntityId) {}
}

fn construct_default<T: Component + Default>() -> Box<dyn Component> {
    Box::new(T::default())
}

/// Type-erased descriptor of a default-constructible component kind.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    id: TypeId,
    name: &'static str,
    construct: fn() -> Box<dyn Component>,
    requires: fn() -> Vec<ComponentKind>,
}

impl ComponentKind {
    pub fn of<T: Component + Default>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            construct: construct_default::<T>,
            requires: T::requires,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build a fresh default instance of this kind.
    pub fn construct(&self) -> Box<dyn Component> {
        (self.construct)()
    }

    /// The kinds this kind itself requires.
    pub fn requires(&self) -> Vec<ComponentKind> {
        (self.requires)()
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentKind {}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentKind").field(&self.name).finish()
    }
}

type Insert = Box<dyn FnOnce(&mut EngineContext, EntityId)>;

/// Collects component insertions and applies them, in order, on `spawn`.
///
/// ```ignore
/// let knife = EntityBuilder::new()
///     .with(Transform::at(Vec2::new(0.0, 5.0)))
///     .with(Physic::new(desc, ColliderMaterial::default()))
///     .spawn(ctx);
/// ```
#[derive(Default)]
pub struct EntityBuilder {
    inserts: Vec<Insert>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.inserts.push(Box::new(move |ctx, entity| {
            ctx.add(entity, component);
        }));
        self
    }

    /// Create the entity and attach every queued component.
    pub fn spawn(self, ctx: &mut EngineContext) -> EntityId {
        let entity = ctx.create_entity();
        for insert in self.inserts {
            insert(ctx, entity);
        }
        entity
    }
}
