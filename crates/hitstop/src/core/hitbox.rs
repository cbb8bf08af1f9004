//! Hit resolution: gameplay hitboxes in a physics world of their own.
//!
//! The hit world holds only body-less sensor colliders and has no gravity, so
//! nothing here can push simulation bodies around. Every tick
//! [`EngineContext::resolve_hits`]:
//!
//! 1. clears each hitbox's resolved-set,
//! 2. copies followed transforms into colliders,
//! 3. steps the hit world (refreshing overlap queries),
//! 4. lets every active [`HitboxRole::Hitbox`] query its overlaps and, for
//!    each overlapping hitbox it targets and hasn't resolved this tick,
//!    bumps both sides' counters and dispatches one [`HitEvent`] to each
//!    side's listeners.
//!
//! The counter, not a flag, is reported: a listener that only wants the
//! first contact of a sustained overlap ignores `hit > 1`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use glam::Vec2;
use rapier2d::prelude::ColliderHandle;

use crate::api::game::EngineContext;
use crate::api::types::EntityId;
use crate::components::transform::Transform;
use super::physics::{ColliderDesc, PhysicsWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HitboxId(pub u64);

/// Opaque gameplay data carried by a hitbox and handed to whoever hits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitPayload {
    #[default]
    None,
    /// Usually the character the hitbox belongs to.
    Entity(EntityId),
    Tag(u32),
}

/// Weak reference to an entity whose [`Transform`] a hitbox tracks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Follow {
    pub entity: EntityId,
    /// Added to the followed position, in world axes.
    pub offset: Vec2,
}

impl Follow {
    pub fn entity(entity: EntityId) -> Self {
        Self {
            entity,
            offset: Vec2::ZERO,
        }
    }
}

/// Which hitboxes a hitbox may hit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Targets {
    /// Every other live hitbox, including ones created later.
    #[default]
    All,
    Only(BTreeSet<HitboxId>),
}

impl Targets {
    pub fn none() -> Self {
        Targets::Only(BTreeSet::new())
    }

    pub fn only(ids: impl IntoIterator<Item = HitboxId>) -> Self {
        Targets::Only(ids.into_iter().collect())
    }

    pub fn contains(&self, id: HitboxId) -> bool {
        match self {
            Targets::All => true,
            Targets::Only(set) => set.contains(&id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitboxRole {
    /// Queries its overlaps and initiates hits.
    Hitbox,
    /// Passive target: never queries, never initiates.
    Hurtbox,
}

/// Creation parameters for a hitbox.
#[derive(Debug, Clone, PartialEq)]
pub struct HitboxDesc {
    pub shape: ColliderDesc,
    /// Initial position; overwritten every tick while following.
    pub position: Vec2,
    pub follow: Option<Follow>,
    pub targets: Targets,
    pub payload: HitPayload,
}

impl HitboxDesc {
    pub fn new(shape: ColliderDesc) -> Self {
        Self {
            shape,
            position: Vec2::ZERO,
            follow: None,
            targets: Targets::All,
            payload: HitPayload::None,
        }
    }

    pub fn ball(radius: f32) -> Self {
        Self::new(ColliderDesc::Ball { radius })
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn following(mut self, entity: EntityId, offset: Vec2) -> Self {
        self.follow = Some(Follow { entity, offset });
        self
    }

    pub fn targets(mut self, targets: Targets) -> Self {
        self.targets = targets;
        self
    }

    pub fn payload(mut self, payload: HitPayload) -> Self {
        self.payload = payload;
        self
    }
}

/// One side of a resolved hit, as seen by that side's listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    /// The listener's own hitbox.
    pub by: HitboxId,
    /// The other party.
    pub target: HitboxId,
    /// How many times `by` has now registered `target`.
    pub hit: u32,
    /// The other party's payload.
    pub payload: HitPayload,
    /// Whether `by` ran the query that found this contact.
    pub initiated: bool,
}

pub type HitListener = Box<dyn FnMut(&mut EngineContext, &HitEvent)>;

pub struct Hitbox {
    role: HitboxRole,
    collider: ColliderHandle,
    active: bool,
    follow: Option<Follow>,
    targets: Targets,
    payload: HitPayload,
    hits: BTreeMap<HitboxId, u32>,
    resolved: BTreeSet<HitboxId>,
    listeners: Vec<HitListener>,
}

impl Hitbox {
    pub fn role(&self) -> HitboxRole {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn follow(&self) -> Option<Follow> {
        self.follow
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn payload(&self) -> HitPayload {
        self.payload
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    /// Hitboxes already resolved against this one during the current tick.
    pub fn resolved(&self) -> &BTreeSet<HitboxId> {
        &self.resolved
    }

    fn queries(&self) -> bool {
        self.role == HitboxRole::Hitbox && self.active
    }
}

/// Owner of every hitbox and of the physics world they live in.
pub struct HitWorld {
    world: PhysicsWorld,
    hitboxes: BTreeMap<HitboxId, Hitbox>,
    by_collider: HashMap<ColliderHandle, HitboxId>,
    next_id: u64,
}

impl HitWorld {
    /// A hit world with zero gravity, integrating with `dt`.
    pub fn new(dt: f32) -> Self {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_dt(dt);
        Self {
            world,
            hitboxes: BTreeMap::new(),
            by_collider: HashMap::new(),
            next_id: 0,
        }
    }

    fn insert(&mut self, desc: HitboxDesc, role: HitboxRole) -> HitboxId {
        let id = HitboxId(self.next_id);
        self.next_id += 1;
        let collider = self
            .world
            .create_collider(desc.shape, desc.position, id.0 as u128);
        self.by_collider.insert(collider, id);
        self.hitboxes.insert(
            id,
            Hitbox {
                role,
                collider,
                active: true,
                follow: desc.follow,
                targets: desc.targets,
                payload: desc.payload,
                hits: BTreeMap::new(),
                resolved: BTreeSet::new(),
                listeners: Vec::new(),
            },
        );
        log::debug!("spawned {role:?} {id:?}");
        id
    }

    pub fn spawn_hitbox(&mut self, desc: HitboxDesc) -> HitboxId {
        self.insert(desc, HitboxRole::Hitbox)
    }

    /// Spawn a passive target. `desc.targets` is ignored.
    pub fn spawn_hurtbox(&mut self, desc: HitboxDesc) -> HitboxId {
        self.insert(desc.targets(Targets::none()), HitboxRole::Hurtbox)
    }

    /// A box hitbox spanning two opposite corners. While following, the
    /// corners are relative to the followed entity.
    pub fn hitbox_from_points(
        &mut self,
        a: Vec2,
        b: Vec2,
        follow: Option<EntityId>,
        targets: Targets,
    ) -> HitboxId {
        let center = (a + b) * 0.5;
        let half = (b - a).abs() * 0.5;
        let mut desc = HitboxDesc::new(ColliderDesc::Cuboid {
            half_width: half.x,
            half_height: half.y,
        })
        .at(center)
        .targets(targets);
        if let Some(entity) = follow {
            desc = desc.following(entity, center);
        }
        self.spawn_hitbox(desc)
    }

    /// Remove a hitbox, its collider and every reference other hitboxes
    /// hold to it. Entities are untouched. `false` if already gone.
    pub fn destroy(&mut self, id: HitboxId) -> bool {
        let Some(hitbox) = self.hitboxes.remove(&id) else {
            return false;
        };
        self.world.remove_collider(hitbox.collider);
        self.by_collider.remove(&hitbox.collider);
        for other in self.hitboxes.values_mut() {
            if let Targets::Only(set) = &mut other.targets {
                set.remove(&id);
            }
            other.hits.remove(&id);
            other.resolved.remove(&id);
        }
        log::debug!("destroyed {:?} {id:?}", hitbox.role);
        true
    }

    pub fn get(&self, id: HitboxId) -> Option<&Hitbox> {
        self.hitboxes.get(&id)
    }

    pub fn contains(&self, id: HitboxId) -> bool {
        self.hitboxes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.hitboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hitboxes.is_empty()
    }

    pub fn ids(&self) -> Vec<HitboxId> {
        self.hitboxes.keys().copied().collect()
    }

    fn get_mut_or_warn(&mut self, id: HitboxId) -> Option<&mut Hitbox> {
        let hitbox = self.hitboxes.get_mut(&id);
        if hitbox.is_none() {
            log::warn!("{id:?} was destroyed");
        }
        hitbox
    }

    /// Enable or disable a hitbox. The collider follows suit, so an inactive
    /// hitbox is neither queried nor found by other queries.
    pub fn set_active(&mut self, id: HitboxId, active: bool) {
        if let Some(hitbox) = self.get_mut_or_warn(id) {
            hitbox.active = active;
            let collider = hitbox.collider;
            self.world.set_collider_enabled(collider, active);
        }
    }

    pub fn set_follow(&mut self, id: HitboxId, follow: Option<Follow>) {
        if let Some(hitbox) = self.get_mut_or_warn(id) {
            hitbox.follow = follow;
        }
    }

    pub fn set_payload(&mut self, id: HitboxId, payload: HitPayload) {
        if let Some(hitbox) = self.get_mut_or_warn(id) {
            hitbox.payload = payload;
        }
    }

    pub fn set_targets(&mut self, id: HitboxId, targets: Targets) {
        if let Some(hitbox) = self.get_mut_or_warn(id) {
            hitbox.targets = targets;
        }
    }

    /// No-op on a hitbox that already targets everything.
    pub fn add_target(&mut self, id: HitboxId, target: HitboxId) {
        if let Some(Hitbox { targets: Targets::Only(set), .. }) = self.get_mut_or_warn(id) {
            set.insert(target);
        }
    }

    /// On a hitbox targeting everything, narrows the set to every other
    /// current hitbox except `target`.
    pub fn remove_target(&mut self, id: HitboxId, target: HitboxId) {
        let everyone: BTreeSet<HitboxId> = self
            .hitboxes
            .keys()
            .copied()
            .filter(|other| *other != id && *other != target)
            .collect();
        if let Some(hitbox) = self.get_mut_or_warn(id) {
            match hitbox.targets {
                Targets::All => hitbox.targets = Targets::Only(everyone),
                Targets::Only(ref mut set) => {
                    set.remove(&target);
                }
            }
        }
    }

    /// Move a hitbox's collider. Following hitboxes are moved back on the
    /// next tick.
    pub fn set_position(&mut self, id: HitboxId, position: Vec2) {
        if let Some(hitbox) = self.get_mut_or_warn(id) {
            let collider = hitbox.collider;
            self.world.set_collider_translation(collider, position);
        }
    }

    pub fn position(&self, id: HitboxId) -> Option<Vec2> {
        let hitbox = self.hitboxes.get(&id)?;
        self.world.collider_position(hitbox.collider).map(|(pos, _)| pos)
    }

    /// How many times `by` has registered `target` (0 if never).
    pub fn hits_on(&self, by: HitboxId, target: HitboxId) -> u32 {
        self.hitboxes
            .get(&by)
            .and_then(|h| h.hits.get(&target))
            .copied()
            .unwrap_or(0)
    }

    /// The hit-resolution physics world, e.g. for visualization.
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    // -- resolution pass --

    /// Clear every resolved-set; returns the follow links to sync.
    fn begin_pass(&mut self) -> Vec<(HitboxId, Follow)> {
        let mut follows = Vec::new();
        for (id, hitbox) in &mut self.hitboxes {
            hitbox.resolved.clear();
            if let Some(follow) = hitbox.follow {
                follows.push((*id, follow));
            }
        }
        follows
    }

    fn querying(&self) -> Vec<HitboxId> {
        self.hitboxes
            .iter()
            .filter(|(_, h)| h.queries())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Live hitboxes overlapping `id`, if `id` still queries.
    fn overlaps(&self, id: HitboxId) -> Vec<HitboxId> {
        let Some(hitbox) = self.hitboxes.get(&id).filter(|h| h.queries()) else {
            return Vec::new();
        };
        self.world
            .intersections_with(hitbox.collider)
            .into_iter()
            .filter_map(|collider| self.by_collider.get(&collider).copied())
            .filter(|other| *other != id)
            .collect()
    }

    /// Record one contact between querier `a` and `b`, or `None` if `a` may
    /// not hit `b` right now.
    fn resolve_pair(&mut self, a: HitboxId, b: HitboxId) -> Option<(HitEvent, HitEvent)> {
        let (a_payload, b_payload) = {
            let ha = self.hitboxes.get(&a)?;
            let hb = self.hitboxes.get(&b)?;
            if !ha.queries() || !hb.active || !ha.targets.contains(b) || ha.resolved.contains(&b) {
                return None;
            }
            (ha.payload, hb.payload)
        };

        let ha = self.hitboxes.get_mut(&a)?;
        ha.resolved.insert(b);
        let a_count = ha.hits.entry(b).or_insert(0);
        *a_count += 1;
        let a_hit = *a_count;

        let hb = self.hitboxes.get_mut(&b)?;
        hb.resolved.insert(a);
        let b_count = hb.hits.entry(a).or_insert(0);
        *b_count += 1;
        let b_hit = *b_count;

        Some((
            HitEvent { by: a, target: b, hit: a_hit, payload: b_payload, initiated: true },
            HitEvent { by: b, target: a, hit: b_hit, payload: a_payload, initiated: false },
        ))
    }

    fn take_listeners(&mut self, id: HitboxId) -> Vec<HitListener> {
        self.hitboxes
            .get_mut(&id)
            .map(|h| std::mem::take(&mut h.listeners))
            .unwrap_or_default()
    }

    /// Put listeners back ahead of any registered while they ran. Dropped if
    /// the hitbox was destroyed meanwhile.
    fn restore_listeners(&mut self, id: HitboxId, mut listeners: Vec<HitListener>) {
        if let Some(hitbox) = self.hitboxes.get_mut(&id) {
            listeners.append(&mut hitbox.listeners);
            hitbox.listeners = listeners;
        }
    }
}

impl EngineContext {
    /// Register a listener for hits on `id`'s side. `false` if `id` is gone.
    pub fn on_hit(
        &mut self,
        id: HitboxId,
        listener: impl FnMut(&mut EngineContext, &HitEvent) + 'static,
    ) -> bool {
        match self.hits.hitboxes.get_mut(&id) {
            Some(hitbox) => {
                hitbox.listeners.push(Box::new(listener));
                true
            }
            None => {
                log::warn!("on_hit: {id:?} was destroyed");
                false
            }
        }
    }

    /// One hit-resolution pass. Runs in the scheduler update phase.
    pub fn resolve_hits(&mut self) {
        for (id, follow) in self.hits.begin_pass() {
            if let Some(transform) = self.registry.get_optional::<Transform>(follow.entity) {
                let position = transform.position + follow.offset;
                self.hits.set_position(id, position);
            }
        }
        self.hits.world.step();

        for id in self.hits.querying() {
            for other in self.hits.overlaps(id) {
                if let Some((initiator, target)) = self.hits.resolve_pair(id, other) {
                    self.dispatch_hit(initiator);
                    self.dispatch_hit(target);
                }
            }
        }
    }

    fn dispatch_hit(&mut self, event: HitEvent) {
        let mut listeners = self.hits.take_listeners(event.by);
        if listeners.is_empty() {
            return;
        }
        log::trace!(
            "hit {:?} -> {:?} (#{}, initiated: {})",
            event.by,
            event.target,
            event.hit,
            event.initiated
        );
        for listener in listeners.iter_mut() {
            listener(self, &event);
        }
        self.hits.restore_listeners(event.by, listeners);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::game::GameConfig;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Events = Rc<RefCell<Vec<HitEvent>>>;

    fn ctx() -> EngineContext {
        EngineContext::new(&GameConfig::default())
    }

    fn tick(ctx: &mut EngineContext, n: usize) {
        for _ in 0..n {
            ctx.clock.advance(1.0 / 60.0);
            ctx.run_update();
        }
    }

    fn record(ctx: &mut EngineContext, id: HitboxId) -> Events {
        let events: Events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        assert!(ctx.on_hit(id, move |_, e| sink.borrow_mut().push(*e)));
        events
    }

    #[test]
    fn sustained_overlap_counts_once_per_tick() {
        let mut ctx = ctx();
        let b = ctx.hits.spawn_hurtbox(HitboxDesc::ball(1.0).payload(HitPayload::Tag(7)));
        let a = ctx
            .hits
            .spawn_hitbox(HitboxDesc::ball(1.0).at(Vec2::new(0.5, 0.0)).targets(Targets::only([b])));
        let a_events = record(&mut ctx, a);
        let b_events = record(&mut ctx, b);

        tick(&mut ctx, 3);

        assert_eq!(ctx.hits.hits_on(a, b), 3);
        assert_eq!(ctx.hits.hits_on(b, a), 3);
        let a_events = a_events.borrow();
        assert_eq!(a_events.iter().map(|e| e.hit).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(a_events.iter().all(|e| e.initiated && e.target == b));
        assert!(a_events.iter().all(|e| e.payload == HitPayload::Tag(7)));
        let b_events = b_events.borrow();
        assert_eq!(b_events.len(), 3);
        assert!(b_events.iter().all(|e| !e.initiated && e.by == b && e.target == a));

        // Both sides keep the pair until the next pass clears it.
        assert!(ctx.hits.get(a).is_some_and(|h| h.resolved().contains(&b)));
        assert!(ctx.hits.get(b).is_some_and(|h| h.resolved().contains(&a)));
    }

    #[test]
    fn set_position_moves_live_hitboxes_only() {
        let mut ctx = ctx();
        let a = ctx.hits.spawn_hitbox(HitboxDesc::ball(1.0));
        ctx.hits.set_position(a, Vec2::new(3.0, -2.0));
        assert_eq!(ctx.hits.position(a), Some(Vec2::new(3.0, -2.0)));

        assert!(ctx.hits.destroy(a));
        ctx.hits.set_position(a, Vec2::ZERO);
        assert_eq!(ctx.hits.position(a), None);
        assert!(ctx.hits.is_empty());
    }

    #[test]
    fn excluded_target_is_never_hit() {
        let mut ctx = ctx();
        let b = ctx.hits.spawn_hurtbox(HitboxDesc::ball(1.0));
        let c = ctx.hits.spawn_hurtbox(HitboxDesc::ball(1.0).at(Vec2::new(50.0, 0.0)));
        let a = ctx
            .hits
            .spawn_hitbox(HitboxDesc::ball(1.0).targets(Targets::only([c])));
        let a_events = record(&mut ctx, a);

        tick(&mut ctx, 5);
        assert!(a_events.borrow().is_empty());
        assert_eq!(ctx.hits.hits_on(a, b), 0);
    }

    #[test]
    fn mutual_hitboxes_resolve_once_per_tick() {
        let mut ctx = ctx();
        let a = ctx.hits.spawn_hitbox(HitboxDesc::ball(1.0));
        let b = ctx.hits.spawn_hitbox(HitboxDesc::ball(1.0).at(Vec2::new(1.0, 0.0)));
        let a_events = record(&mut ctx, a);
        let b_events = record(&mut ctx, b);

        tick(&mut ctx, 2);

        assert_eq!(ctx.hits.hits_on(a, b), 2);
        assert_eq!(ctx.hits.hits_on(b, a), 2);
        assert_eq!(a_events.borrow().len(), 2);
        assert_eq!(b_events.borrow().len(), 2);
        assert!(a_events.borrow().iter().all(|e| e.initiated));
        assert!(b_events.borrow().iter().all(|e| !e.initiated));
    }

    #[test]
    fn inactive_hitboxes_neither_hit_nor_get_hit() {
        let mut ctx = ctx();
        let b = ctx.hits.spawn_hurtbox(HitboxDesc::ball(1.0));
        let a = ctx.hits.spawn_hitbox(HitboxDesc::ball(1.0));
        let a_events = record(&mut ctx, a);

        ctx.hits.set_active(a, false);
        tick(&mut ctx, 2);
        assert!(a_events.borrow().is_empty());

        ctx.hits.set_active(a, true);
        ctx.hits.set_active(b, false);
        assert!(!ctx.hits.world().is_collider_enabled(ctx.hits.get(b).map(Hitbox::collider).expect("live")));
        tick(&mut ctx, 2);
        assert!(a_events.borrow().is_empty());

        ctx.hits.set_active(b, true);
        tick(&mut ctx, 1);
        assert_eq!(a_events.borrow().len(), 1);
    }

    #[test]
    fn hitbox_follows_transform() {
        let mut ctx = ctx();
        let owner = ctx.create_entity();
        ctx.add(owner, Transform::at(Vec2::new(10.0, 0.0)));
        let target = ctx.hits.spawn_hurtbox(HitboxDesc::ball(0.5).at(Vec2::new(12.0, 0.0)));
        let blade = ctx.hits.spawn_hitbox(
            HitboxDesc::ball(0.5)
                .following(owner, Vec2::new(2.0, 0.0))
                .payload(HitPayload::Entity(owner)),
        );
        let target_events = record(&mut ctx, target);

        tick(&mut ctx, 1);
        let pos = ctx.hits.position(blade).expect("live");
        assert!((pos - Vec2::new(12.0, 0.0)).length() < 1e-4, "pos={:?}", pos);
        assert_eq!(target_events.borrow().len(), 1);
        assert_eq!(target_events.borrow()[0].payload, HitPayload::Entity(owner));

        // Followed entity gone: the hitbox stays where it was.
        ctx.destroy_entity(owner);
        tick(&mut ctx, 1);
        let pos = ctx.hits.position(blade).expect("live");
        assert!((pos - Vec2::new(12.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn listener_can_destroy_the_other_party() {
        let mut ctx = ctx();
        let b = ctx.hits.spawn_hurtbox(HitboxDesc::ball(1.0));
        let c = ctx.hits.spawn_hurtbox(HitboxDesc::ball(1.0));
        let a = ctx.hits.spawn_hitbox(HitboxDesc::ball(1.0).targets(Targets::only([b, c])));
        let a_events = record(&mut ctx, a);
        ctx.on_hit(a, move |ctx, e| {
            ctx.hits.destroy(e.target);
        });

        tick(&mut ctx, 1);
        assert!(!ctx.hits.contains(b));
        assert!(!ctx.hits.contains(c));
        assert_eq!(a_events.borrow().len(), 2);
        assert_eq!(ctx.hits.get(a).map(|h| h.targets().clone()), Some(Targets::none()));
        assert_eq!(ctx.hits.hits_on(a, b), 0, "counters for destroyed hitboxes are purged");

        tick(&mut ctx, 1);
        assert_eq!(a_events.borrow().len(), 2);
    }

    #[test]
    fn listener_can_destroy_its_own_hitbox() {
        let mut ctx = ctx();
        let b = ctx.hits.spawn_hurtbox(HitboxDesc::ball(1.0));
        let a = ctx.hits.spawn_hitbox(HitboxDesc::ball(1.0));
        let b_events = record(&mut ctx, b);
        ctx.on_hit(a, |ctx, e| {
            ctx.hits.destroy(e.by);
        });

        tick(&mut ctx, 2);
        assert!(!ctx.hits.contains(a));
        assert_eq!(b_events.borrow().len(), 1);
        assert!(!ctx.hits.destroy(a));
        assert_eq!(ctx.hits.world().collider_count(), 1);
    }

    #[test]
    fn hitboxes_spawned_mid_pass_wait_for_next_tick() {
        let mut ctx = ctx();
        let b = ctx.hits.spawn_hurtbox(HitboxDesc::ball(1.0));
        let a = ctx.hits.spawn_hitbox(HitboxDesc::ball(1.0).targets(Targets::only([b])));
        let b_events = record(&mut ctx, b);
        let mut spawned = false;
        ctx.on_hit(a, move |ctx, _| {
            if !spawned {
                spawned = true;
                ctx.hits.spawn_hitbox(HitboxDesc::ball(1.0));
            }
        });

        tick(&mut ctx, 1);
        assert_eq!(b_events.borrow().len(), 1);
        tick(&mut ctx, 1);
        // a again, plus the newcomer (targets everything).
        assert_eq!(b_events.borrow().len(), 3);
    }

    #[test]
    fn hitbox_from_points_spans_corners() {
        let mut ctx = ctx();
        let id = ctx
            .hits
            .hitbox_from_points(Vec2::new(-1.0, 0.0), Vec2::new(3.0, 2.0), None, Targets::All);
        let collider = ctx.hits.get(id).map(Hitbox::collider).expect("live");
        assert_eq!(
            ctx.hits.world().shape_of(collider),
            Some(ColliderDesc::Cuboid { half_width: 2.0, half_height: 1.0 })
        );
        let pos = ctx.hits.position(id).expect("live");
        assert!((pos - Vec2::new(1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn remove_target_narrows_all() {
        let mut ctx = ctx();
        let a = ctx.hits.spawn_hitbox(HitboxDesc::ball(1.0));
        let b = ctx.hits.spawn_hurtbox(HitboxDesc::ball(1.0));
        let c = ctx.hits.spawn_hurtbox(HitboxDesc::ball(1.0));
        ctx.hits.remove_target(a, b);
        assert_eq!(ctx.hits.get(a).map(|h| h.targets().clone()), Some(Targets::only([c])));
        ctx.hits.add_target(a, b);
        assert!(ctx.hits.get(a).is_some_and(|h| h.targets().contains(b)));
    }
}
