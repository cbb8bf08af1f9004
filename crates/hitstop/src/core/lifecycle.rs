//! Frame scheduler: update and render subscriber sets.
//!
//! Passes snapshot the subscription ids before running, so a callback may
//! subscribe or unsubscribe anything (itself included) mid-pass:
//! - callbacks subscribed during a pass first run on the next pass;
//! - callbacks unsubscribed during a pass are skipped if not yet reached.

use std::collections::BTreeMap;

use crate::api::game::EngineContext;

/// A scheduler callback. Receives the whole context.
pub type Callback = Box<dyn FnMut(&mut EngineContext)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Update,
    Render,
}

/// Handle returned by `on_update`/`on_render`; pass it to
/// [`Lifecycle::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    phase: Phase,
}

impl Subscription {
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Subscriber sets. An entry holding `None` is a callback currently running.
#[derive(Default)]
pub struct Lifecycle {
    update: BTreeMap<u64, Option<Callback>>,
    render: BTreeMap<u64, Option<Callback>>,
    next_id: u64,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, phase: Phase) -> &mut BTreeMap<u64, Option<Callback>> {
        match phase {
            Phase::Update => &mut self.update,
            Phase::Render => &mut self.render,
        }
    }

    fn subscribe(&mut self, phase: Phase, callback: Callback) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.set(phase).insert(id, Some(callback));
        Subscription { id, phase }
    }

    /// Run `callback` once per tick during the update phase.
    pub fn on_update(&mut self, callback: impl FnMut(&mut EngineContext) + 'static) -> Subscription {
        self.subscribe(Phase::Update, Box::new(callback))
    }

    /// Run `callback` once per tick during the render phase.
    pub fn on_render(&mut self, callback: impl FnMut(&mut EngineContext) + 'static) -> Subscription {
        self.subscribe(Phase::Render, Box::new(callback))
    }

    /// Returns `false` if the subscription was already removed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.set(subscription.phase).remove(&subscription.id).is_some()
    }

    /// Alias of [`unsubscribe`](Self::unsubscribe).
    pub fn remove(&mut self, subscription: Subscription) -> bool {
        self.unsubscribe(subscription)
    }

    pub fn is_subscribed(&self, subscription: Subscription) -> bool {
        match subscription.phase {
            Phase::Update => self.update.contains_key(&subscription.id),
            Phase::Render => self.render.contains_key(&subscription.id),
        }
    }

    /// Drop every subscriber of both phases.
    pub fn clear(&mut self) {
        self.update.clear();
        self.render.clear();
    }

    pub fn update_count(&self) -> usize {
        self.update.len()
    }

    pub fn render_count(&self) -> usize {
        self.render.len()
    }

    fn snapshot(&self, phase: Phase) -> Vec<u64> {
        match phase {
            Phase::Update => self.update.keys().copied().collect(),
            Phase::Render => self.render.keys().copied().collect(),
        }
    }

    fn take(&mut self, phase: Phase, id: u64) -> Option<Callback> {
        self.set(phase).get_mut(&id).and_then(Option::take)
    }

    /// Put a callback back after it ran, unless it unsubscribed meanwhile.
    fn restore(&mut self, phase: Phase, id: u64, callback: Callback) {
        if let Some(slot) = self.set(phase).get_mut(&id) {
            *slot = Some(callback);
        }
    }
}

impl EngineContext {
    fn run_phase(&mut self, phase: Phase) {
        for id in self.lifecycle.snapshot(phase) {
            let Some(mut callback) = self.lifecycle.take(phase, id) else {
                continue;
            };
            callback(self);
            self.lifecycle.restore(phase, id, callback);
        }
    }

    /// Scheduler update phase: subscribers (delays included), then skill
    /// regeneration, then hit resolution.
    pub fn run_update(&mut self) {
        self.run_phase(Phase::Update);
        let now = self.clock.now();
        self.skills.tick(now);
        self.resolve_hits();
    }

    /// Scheduler render phase.
    pub fn run_render(&mut self) {
        self.run_phase(Phase::Render);
    }
}
