//! Component registry: entity → (component kind → component).
//!
//! [`Registry`] is plain storage. Operations that fire lifecycle hooks
//! (`add`, `remove`, `destroy_entity`, the update/render passes) live on
//! [`EngineContext`] because hooks need the whole context.
//!
//! ## Check-out model
//!
//! To run a hook, the component is taken out of its slot and handed the
//! context mutably. The slot stays in place (so `has` still sees it) and is
//! refilled when the hook returns. If the slot was removed meanwhile (the
//! hook removed its own component, or destroyed its entity), the component
//! is not put back; its `on_destroy` runs instead.

use std::any::{type_name, TypeId};
use std::collections::BTreeMap;

use crate::api::error::EcsError;
use crate::api::game::EngineContext;
use crate::api::types::EntityId;
use super::component::Component;

struct ComponentSlot {
    kind: TypeId,
    /// Unique per inserted instance; lets check-in tell a re-added slot of
    /// the same kind apart from the one the component was taken from.
    generation: u64,
    /// `None` while checked out.
    component: Option<Box<dyn Component>>,
}

#[derive(Default)]
struct EntityRecord {
    /// Insertion order; required kinds precede their dependents.
    slots: Vec<ComponentSlot>,
    destroying: bool,
}

impl EntityRecord {
    fn slot(&self, kind: TypeId) -> Option<&ComponentSlot> {
        self.slots.iter().find(|s| s.kind == kind)
    }

    fn slot_mut(&mut self, kind: TypeId) -> Option<&mut ComponentSlot> {
        self.slots.iter_mut().find(|s| s.kind == kind)
    }
}

/// A component taken out of its slot while one of its hooks runs.
pub(crate) struct CheckedOut {
    pub(crate) entity: EntityId,
    pub(crate) generation: u64,
    pub(crate) component: Box<dyn Component>,
}

pub(crate) enum Checkout {
    Ready(CheckedOut),
    Busy,
    Absent,
}

/// Entity/component storage.
///
/// Entities are kept in id order, which is also creation order since ids are
/// never reused.
pub struct Registry {
    entities: BTreeMap<EntityId, EntityRecord>,
    next_id: u64,
    next_generation: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 0,
            next_generation: 0,
        }
    }

    /// Allocate a fresh, never-before-issued entity with no components.
    pub fn create(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, EntityRecord::default());
        log::debug!("created entity {id}");
        id
    }

    /// Whether the entity exists and is not being torn down.
    pub fn exists(&self, entity: EntityId) -> bool {
        self.entities.get(&entity).is_some_and(|r| !r.destroying)
    }

    /// Number of entities, including one mid-destroy.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All live entities in registry order.
    pub fn entities(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, r)| !r.destroying)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of components attached to an entity (0 if it does not exist).
    pub fn component_count(&self, entity: EntityId) -> usize {
        self.entities.get(&entity).map_or(0, |r| r.slots.len())
    }

    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        self.has_kind(entity, TypeId::of::<T>())
    }

    pub fn has_kind(&self, entity: EntityId, kind: TypeId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|r| r.slot(kind).is_some())
    }

    pub fn try_get<T: Component>(&self, entity: EntityId) -> Result<&T, EcsError> {
        let component = type_name::<T>();
        let record = self
            .entities
            .get(&entity)
            .ok_or(EcsError::NoSuchEntity { entity })?;
        let slot = record
            .slot(TypeId::of::<T>())
            .ok_or(EcsError::ComponentNotFound { entity, component })?;
        match slot.component.as_deref() {
            Some(c) => c
                .as_any()
                .downcast_ref::<T>()
                .ok_or(EcsError::ComponentNotFound { entity, component }),
            None => Err(EcsError::ComponentBusy { entity, component }),
        }
    }

    pub fn try_get_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T, EcsError> {
        let component = type_name::<T>();
        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(EcsError::NoSuchEntity { entity })?;
        let slot = record
            .slot_mut(TypeId::of::<T>())
            .ok_or(EcsError::ComponentNotFound { entity, component })?;
        match slot.component.as_deref_mut() {
            Some(c) => c
                .as_any_mut()
                .downcast_mut::<T>()
                .ok_or(EcsError::ComponentNotFound { entity, component }),
            None => Err(EcsError::ComponentBusy { entity, component }),
        }
    }

    /// Get a component that is required to exist.
    ///
    /// # Panics
    ///
    /// Panics if the entity or component is missing: call sites that use
    /// `get` assume the composition guarantees the component.
    #[track_caller]
    pub fn get<T: Component>(&self, entity: EntityId) -> &T {
        match self.try_get(entity) {
            Ok(component) => component,
            Err(err) => fail(err),
        }
    }

    /// Mutable counterpart of [`get`](Self::get).
    ///
    /// # Panics
    ///
    /// Panics if the entity or component is missing.
    #[track_caller]
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> &mut T {
        match self.try_get_mut(entity) {
            Ok(component) => component,
            Err(err) => fail(err),
        }
    }

    /// For genuinely optional relationships.
    pub fn get_optional<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.try_get(entity).ok()
    }

    pub fn get_optional_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.try_get_mut(entity).ok()
    }

    /// Every live entity whose component set is a superset of `kinds`.
    pub fn query(&self, kinds: &[TypeId]) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, r)| !r.destroying && kinds.iter().all(|k| r.slot(*k).is_some()))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Shorthand for a single-kind [`query`](Self::query).
    pub fn entities_with<T: Component>(&self) -> Vec<EntityId> {
        self.query(&[TypeId::of::<T>()])
    }

    // -- crate-internal slot management --

    pub(crate) fn insert_slot(
        &mut self,
        entity: EntityId,
        kind: TypeId,
        component: Box<dyn Component>,
    ) -> Result<(), EcsError> {
        let record = match self.entities.get_mut(&entity) {
            Some(r) if !r.destroying => r,
            _ => return Err(EcsError::NoSuchEntity { entity }),
        };
        let generation = self.next_generation;
        self.next_generation += 1;
        record.slots.push(ComponentSlot {
            kind,
            generation,
            component: Some(component),
        });
        Ok(())
    }

    pub(crate) fn check_out(&mut self, entity: EntityId, kind: TypeId) -> Checkout {
        let slot = self
            .entities
            .get_mut(&entity)
            .and_then(|r| r.slot_mut(kind));
        match slot {
            None => Checkout::Absent,
            Some(slot) => match slot.component.take() {
                Some(component) => Checkout::Ready(CheckedOut {
                    entity,
                    generation: slot.generation,
                    component,
                }),
                None => Checkout::Busy,
            },
        }
    }

    /// Put a checked-out component back. Hands it back as `Err` when its
    /// slot no longer exists.
    pub(crate) fn check_in(&mut self, checked: CheckedOut) -> Result<(), Box<dyn Component>> {
        let slot = self
            .entities
            .get_mut(&checked.entity)
            .and_then(|r| r.slots.iter_mut().find(|s| s.generation == checked.generation));
        match slot {
            Some(slot) if slot.component.is_none() => {
                slot.component = Some(checked.component);
                Ok(())
            }
            _ => Err(checked.component),
        }
    }

    pub(crate) fn drop_slot(&mut self, entity: EntityId, generation: u64) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.slots.retain(|s| s.generation != generation);
        }
    }

    pub(crate) fn drop_kind(&mut self, entity: EntityId, kind: TypeId) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.slots.retain(|s| s.kind != kind);
        }
    }

    /// Snapshot of every (entity, kind) pair of live entities, in order.
    pub(crate) fn live_slots(&self) -> Vec<(EntityId, TypeId)> {
        self.entities
            .iter()
            .filter(|(_, r)| !r.destroying)
            .flat_map(|(id, r)| r.slots.iter().map(move |s| (*id, s.kind)))
            .collect()
    }

    /// Mark an entity as being destroyed. `false` if absent or already
    /// being destroyed.
    pub(crate) fn begin_destroy(&mut self, entity: EntityId) -> bool {
        match self.entities.get_mut(&entity) {
            Some(r) if !r.destroying => {
                r.destroying = true;
                true
            }
            _ => false,
        }
    }

    /// Most recently inserted kind still attached to an entity.
    pub(crate) fn last_kind(&self, entity: EntityId) -> Option<TypeId> {
        self.entities.get(&entity)?.slots.last().map(|s| s.kind)
    }

    pub(crate) fn finish_destroy(&mut self, entity: EntityId) {
        self.entities.remove(&entity);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[track_caller]
fn fail(err: EcsError) -> ! {
    log::error!("{err}");
    panic!("{err}")
}

#[derive(Clone, Copy)]
enum Hook {
    Start,
    Update(f32),
    Render,
}

impl EngineContext {
    /// Create an empty entity.
    pub fn create_entity(&mut self) -> EntityId {
        self.registry.create()
    }

    /// Attach a component, resolving its required kinds first.
    ///
    /// If the entity already has this kind, logs a warning and returns the
    /// existing instance; `component` is dropped without starting.
    ///
    /// # Panics
    ///
    /// Panics on a composition error: a missing entity, a dependency cycle,
    /// the component vanishing during its own `on_start`, or re-adding a kind
    /// from one of that same instance's hooks (the existing instance is
    /// checked out, so [`try_add`](Self::try_add) reports `ComponentBusy`).
    #[track_caller]
    pub fn add<T: Component>(&mut self, entity: EntityId, component: T) -> &mut T {
        match self.try_add(entity, component) {
            Ok(component) => component,
            Err(err) => fail(err),
        }
    }

    /// [`add`](Self::add) with a default-constructed component.
    #[track_caller]
    pub fn add_default<T: Component + Default>(&mut self, entity: EntityId) -> &mut T {
        self.add(entity, T::default())
    }

    /// Fallible [`add`](Self::add). Re-adding a kind whose instance is running
    /// one of its hooks returns [`EcsError::ComponentBusy`] and leaves that
    /// instance in place.
    pub fn try_add<T: Component>(&mut self, entity: EntityId, component: T) -> Result<&mut T, EcsError> {
        let kind = TypeId::of::<T>();
        if !self.registry.exists(entity) {
            return Err(EcsError::NoSuchEntity { entity });
        }
        if self.registry.has_kind(entity, kind) {
            log::warn!(
                "entity {entity} already has `{}`; keeping the existing instance",
                type_name::<T>()
            );
            return self.registry.try_get_mut::<T>(entity);
        }

        let mut resolving = vec![kind];
        self.resolve_requirements(entity, T::requires(), &mut resolving)?;
        self.attach(entity, kind, Box::new(component))?;
        self.registry.try_get_mut::<T>(entity)
    }

    /// Depth-first: each missing requirement has its own requirements
    /// inserted and started before it is.
    fn resolve_requirements(
        &mut self,
        entity: EntityId,
        requires: Vec<super::component::ComponentKind>,
        resolving: &mut Vec<TypeId>,
    ) -> Result<(), EcsError> {
        for required in requires {
            if self.registry.has_kind(entity, required.id()) {
                continue;
            }
            if resolving.contains(&required.id()) {
                return Err(EcsError::DependencyCycle {
                    component: required.name(),
                });
            }
            resolving.push(required.id());
            self.resolve_requirements(entity, required.requires(), resolving)?;
            resolving.pop();
            self.attach(entity, required.id(), required.construct())?;
        }
        Ok(())
    }

    fn attach(
        &mut self,
        entity: EntityId,
        kind: TypeId,
        component: Box<dyn Component>,
    ) -> Result<(), EcsError> {
        self.registry.insert_slot(entity, kind, component)?;
        if let Checkout::Ready(checked) = self.registry.check_out(entity, kind) {
            self.run_hook(checked, Hook::Start);
        }
        Ok(())
    }

    fn run_hook(&mut self, mut checked: CheckedOut, hook: Hook) {
        let entity = checked.entity;
        let component = &mut checked.component;
        match hook {
            Hook::Start => component.on_start(self, entity),
            Hook::Update(dt) => component.on_update(self, entity, dt),
            Hook::Render => component.on_render(self, entity),
        }
        if let Err(mut orphan) = self.registry.check_in(checked) {
            // Detached while its hook ran.
            orphan.on_destroy(self, entity);
        }
    }

    /// Detach a component, running its `on_destroy`. Does not cascade to
    /// components that required it. Returns `false` if it was not attached.
    pub fn remove<T: Component>(&mut self, entity: EntityId) -> bool {
        self.remove_kind(entity, TypeId::of::<T>())
    }

    pub fn remove_kind(&mut self, entity: EntityId, kind: TypeId) -> bool {
        match self.registry.check_out(entity, kind) {
            Checkout::Ready(mut checked) => {
                checked.component.on_destroy(self, entity);
                self.registry.drop_slot(entity, checked.generation);
                true
            }
            Checkout::Busy => {
                // Its running hook finishes the teardown on check-in.
                self.registry.drop_kind(entity, kind);
                true
            }
            Checkout::Absent => false,
        }
    }

    /// Run `on_destroy` for every component (most recently added first),
    /// then remove the entity. No-op if it does not exist or is already
    /// being destroyed.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if !self.registry.begin_destroy(entity) {
            return false;
        }
        while let Some(kind) = self.registry.last_kind(entity) {
            if !self.remove_kind(entity, kind) {
                break;
            }
        }
        self.registry.finish_destroy(entity);
        log::debug!("destroyed entity {entity}");
        true
    }

    /// Registry update pass: `on_update(dt)` on every live component.
    pub fn update_components(&mut self, dt: f32) {
        for (entity, kind) in self.registry.live_slots() {
            if let Checkout::Ready(checked) = self.registry.check_out(entity, kind) {
                self.run_hook(checked, Hook::Update(dt));
            }
        }
    }

    /// Registry render pass: `on_render()` on every live component.
    pub fn render_components(&mut self) {
        for (entity, kind) in self.registry.live_slots() {
            if let Checkout::Ready(checked) = self.registry.check_out(entity, kind) {
                self.run_hook(checked, Hook::Render);
            }
        }
    }
}
