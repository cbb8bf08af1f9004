use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;
use hitstop::*;

const FIGHTER_RADIUS: f32 = 0.6;
const START_GAP: f32 = 6.0;
const MAX_HEALTH: i32 = 30;
const SLASH_REACH: f32 = 1.2;
const SLASH_RADIUS: f32 = 1.0;
const SLASH_WINDUP: f32 = 0.1;
const SLASH_ACTIVE: f32 = 0.25;
const SLASH_COOLDOWN: f64 = 1.2;
const DASH_SPEED: f32 = 8.0;
const DASH_TIME: f32 = 0.25;
const DASH_COOLDOWN: f64 = 2.0;
const THINK_PERIOD: f32 = 0.5;
const OUTLINE_WIDTH: f32 = 0.05;

/// A duelist: health, a hurtbox riding on the body, and two skills.
pub struct Fighter {
    pub name: &'static str,
    pub health: i32,
    pub damage: u32,
    slash: SkillId,
    dash: SkillId,
    hurtbox: Option<HitboxId>,
    controller: Option<PhysicController>,
}

impl Fighter {
    fn new(ctx: &mut EngineContext, name: &'static str, damage: u32) -> Self {
        Self {
            name,
            health: MAX_HEALTH,
            damage,
            slash: ctx.skills.insert(Skill::new(SLASH_COOLDOWN, 1)),
            dash: ctx.skills.insert(Skill::new(DASH_COOLDOWN, 1)),
            hurtbox: None,
            controller: None,
        }
    }
}

impl Component for Fighter {
    fn requires() -> Vec<ComponentKind> {
        vec![ComponentKind::of::<Physic>()]
    }

    fn on_start(&mut self, ctx: &mut EngineContext, entity: EntityId) {
        let hurtbox = ctx.hits.spawn_hurtbox(
            HitboxDesc::ball(FIGHTER_RADIUS)
                .following(entity, Vec2::ZERO)
                .payload(HitPayload::Entity(entity)),
        );
        ctx.on_hit(hurtbox, move |ctx, hit| take_hit(ctx, entity, hit));
        self.hurtbox = Some(hurtbox);
        self.controller = ctx
            .registry
            .get_optional::<Physic>(entity)
            .and_then(Physic::body)
            .map(PhysicController::new);
    }

    fn on_destroy(&mut self, ctx: &mut EngineContext, entity: EntityId) {
        if let Some(hurtbox) = self.hurtbox.take() {
            ctx.hits.destroy(hurtbox);
        }
        if let Some(controller) = self.controller.take() {
            controller.stop(&mut ctx.lifecycle);
        }
        ctx.skills.remove(self.slash);
        ctx.skills.remove(self.dash);
        log::info!("{} ({}) is down", self.name, entity);
    }
}

/// A slash lands once per swing, however many ticks it keeps overlapping.
fn take_hit(ctx: &mut EngineContext, entity: EntityId, hit: &HitEvent) {
    if hit.hit != 1 {
        return;
    }
    let HitPayload::Tag(damage) = hit.payload else {
        return;
    };
    let Some(fighter) = ctx.registry.get_optional_mut::<Fighter>(entity) else {
        return;
    };
    fighter.health -= damage as i32;
    log::info!("{} takes {} ({} left)", fighter.name, damage, fighter.health);
    if fighter.health <= 0 {
        ctx.destroy_entity(entity);
    }
}

/// Wind up, open a hitbox in front of `me` aimed only at `target`, close it.
fn slash(ctx: &mut EngineContext, me: EntityId, target: HitboxId, facing: Vec2, damage: u32) -> SequenceHandle {
    let open = Rc::new(Cell::new(None));
    let close = Rc::clone(&open);
    Sequence::new()
        .wait(SLASH_WINDUP)
        .then(move |ctx| {
            let id = ctx.hits.spawn_hitbox(
                HitboxDesc::ball(SLASH_RADIUS)
                    .following(me, facing * SLASH_REACH)
                    .targets(Targets::only([target]))
                    .payload(HitPayload::Tag(damage)),
            );
            open.set(Some(id));
        })
        .wait(SLASH_ACTIVE)
        .then(move |ctx| {
            if let Some(id) = close.take() {
                ctx.hits.destroy(id);
            }
        })
        .play(ctx)
}

/// One decision: dash in when out of reach, slash when close. Returns
/// `false` once either side is gone.
fn think(ctx: &mut EngineContext, me: EntityId, foe: EntityId) -> bool {
    let (Some(mine), Some(theirs)) = (
        ctx.registry.get_optional::<Transform>(me).copied(),
        ctx.registry.get_optional::<Transform>(foe).copied(),
    ) else {
        return false;
    };
    let Some(target) = ctx.registry.get_optional::<Fighter>(foe).and_then(|f| f.hurtbox) else {
        return false;
    };
    let Some(fighter) = ctx.registry.get_optional::<Fighter>(me) else {
        return false;
    };
    let (slash_skill, dash_skill, damage) = (fighter.slash, fighter.dash, fighter.damage);
    let controller = fighter.controller.clone();

    let offset = theirs.position - mine.position;
    let facing = offset.normalize_or_zero();
    if offset.length() > SLASH_REACH + SLASH_RADIUS {
        ctx.use_skill(dash_skill, me, |ctx, _| {
            if let Some(controller) = &controller {
                controller.launch(ctx, facing, DASH_TIME, DASH_SPEED, false);
            }
        });
    } else {
        ctx.use_skill(slash_skill, me, |ctx, me| {
            slash(ctx, me, target, facing, damage);
        });
    }
    true
}

/// Re-arm a think delay after every decision until the duel is over.
fn start_thinking(ctx: &mut EngineContext, me: EntityId, foe: EntityId) -> Delay {
    let own: Rc<RefCell<Option<WeakDelay>>> = Rc::default();
    let weak = Rc::clone(&own);
    let delay = ctx.lifecycle.delay(THINK_PERIOD, move |ctx| {
        if !think(ctx, me, foe) {
            return;
        }
        if let Some(this) = weak.borrow().as_ref().and_then(WeakDelay::upgrade) {
            this.start(&mut ctx.lifecycle);
        }
    });
    *own.borrow_mut() = Some(delay.downgrade());
    delay
}

fn spawn_fighter(ctx: &mut EngineContext, name: &'static str, damage: u32, pos: Vec2, handle: u32) -> EntityId {
    let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: FIGHTER_RADIUS })
        .with_position(pos)
        .with_fixed_rotation(true)
        .with_linear_damping(4.0);
    let fighter = Fighter::new(ctx, name, damage);
    EntityBuilder::new()
        .with(Physic::new(desc, ColliderMaterial::default()))
        .with(fighter)
        .with(Renderable::new(RenderHandle(handle)).smoothed(0.5))
        .spawn(ctx)
}

/// Two fighters close in on each other and trade slashes until one drops.
pub struct Duel {
    fighters: Vec<EntityId>,
}

impl Duel {
    pub fn new() -> Self {
        Self { fighters: Vec::new() }
    }

    /// Name and health of every fighter still standing.
    pub fn standings(&self, ctx: &EngineContext) -> Vec<(&'static str, i32)> {
        self.fighters
            .iter()
            .filter_map(|&e| ctx.registry.get_optional::<Fighter>(e))
            .map(|f| (f.name, f.health))
            .collect()
    }

    pub fn is_decided(&self, ctx: &EngineContext) -> bool {
        self.standings(ctx).len() < 2
    }
}

impl Default for Duel {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for Duel {
    fn config(&self) -> GameConfig {
        GameConfig {
            gravity: Vec2::ZERO,
            ..GameConfig::default()
        }
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        let left = spawn_fighter(ctx, "Ayla", 8, Vec2::new(-START_GAP / 2.0, 0.0), 0);
        let right = spawn_fighter(ctx, "Brann", 6, Vec2::new(START_GAP / 2.0, 0.0), 1);
        start_thinking(ctx, left, right);
        start_thinking(ctx, right, left);
        self.fighters = vec![left, right];

        ctx.lifecycle
            .on_render(|ctx| debug_draw_hitboxes(&ctx.hits, &mut ctx.render, OUTLINE_WIDTH));
    }

    fn render(&mut self, ctx: &EngineContext) {
        log::trace!(
            "t={:.2}: {} instances, {} outlines",
            ctx.clock.now(),
            ctx.render.instance_count(),
            ctx.render.debug_lines.len()
        );
    }
}
