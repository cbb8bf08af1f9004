use std::collections::BTreeMap;

use crate::api::game::EngineContext;
use crate::api::types::EntityId;

/// Stock/cooldown resource behind an ability.
///
/// `stock` regenerates one unit per `cooldown` seconds of clock time while
/// below `max`. Overflow past the cooldown carries into the next unit, so the
/// regeneration rate doesn't depend on the tick rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    cooldown: f64,
    max: u32,
    stock: u32,
    /// Clock timestamp regeneration is measured from.
    last: f64,
}

impl Skill {
    /// A full skill.
    pub fn new(cooldown: f64, max: u32) -> Self {
        Self {
            cooldown,
            max,
            stock: max,
            last: 0.0,
        }
    }

    /// Start with `stock` uses instead of a full bar.
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock.min(self.max);
        self
    }

    /// Regenerate against the clock's current time.
    pub fn update(&mut self, now: f64) {
        if self.stock >= self.max {
            self.last = now;
            return;
        }
        let elapsed = now - self.last;
        if elapsed >= self.cooldown {
            self.stock += 1;
            self.last = now - (elapsed - self.cooldown);
        }
    }

    /// Consume one use. `false` when out of stock.
    pub fn activate(&mut self) -> bool {
        if self.stock < 1 {
            return false;
        }
        self.stock -= 1;
        true
    }

    /// Give back up to `amount` uses, capped at `max`.
    pub fn restore(&mut self, amount: u32) {
        self.stock = self.stock.saturating_add(amount).min(self.max);
    }

    /// Refill completely.
    pub fn reset(&mut self) {
        self.stock = self.max;
        self.last = 0.0;
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }

    pub fn is_ready(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkillId(pub u32);

/// Every skill in the context, regenerated once per tick.
#[derive(Debug, Default)]
pub struct SkillBook {
    skills: BTreeMap<SkillId, Skill>,
    next_id: u32,
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, skill: Skill) -> SkillId {
        let id = SkillId(self.next_id);
        self.next_id += 1;
        self.skills.insert(id, skill);
        id
    }

    pub fn get(&self, id: SkillId) -> Option<&Skill> {
        self.skills.get(&id)
    }

    pub fn get_mut(&mut self, id: SkillId) -> Option<&mut Skill> {
        self.skills.get_mut(&id)
    }

    pub fn remove(&mut self, id: SkillId) -> Option<Skill> {
        self.skills.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn tick(&mut self, now: f64) {
        for skill in self.skills.values_mut() {
            skill.update(now);
        }
    }
}

impl EngineContext {
    /// Spend one use of `id` and run `usage` for `entity`.
    ///
    /// Returns `false` without running anything if the skill is out of stock
    /// or unknown. `usage` may refund through `ctx.skills`.
    pub fn use_skill(
        &mut self,
        id: SkillId,
        entity: EntityId,
        usage: impl FnOnce(&mut EngineContext, EntityId),
    ) -> bool {
        let activated = self.skills.get_mut(id).is_some_and(Skill::activate);
        if activated {
            usage(self, entity);
        }
        activated
    }
}
