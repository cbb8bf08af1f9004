use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::hitbox::HitWorld;
use crate::core::lifecycle::Lifecycle;
use crate::core::physics::PhysicsWorld;
use crate::core::registry::Registry;
use crate::core::skill::SkillBook;
use crate::core::time::Clock;
use crate::renderer::instance::RenderBuffer;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Most ticks run for a single frame, however long it took (default: 10).
    pub max_steps_per_frame: u32,
    /// Gravity of the simulation world (Y up). The hit world never has any.
    pub gravity: Vec2,
    /// Integration step of the hit world; `None` uses `fixed_dt`.
    pub hit_integration_dt: Option<f32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_steps_per_frame: 10,
            gravity: Vec2::new(0.0, -90.0),
            hit_integration_dt: None,
        }
    }
}

impl GameConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The contract a game fulfills to be driven by [`Runtime`](crate::Runtime).
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Spawn entities, register skills and subscribers.
    fn init(&mut self, ctx: &mut EngineContext);

    /// Start of each tick, before any component or scheduler work: feed
    /// input and other outside state in here.
    fn update(&mut self, _ctx: &mut EngineContext) {}

    /// End of each tick, after both render passes: present `ctx.render`.
    fn render(&mut self, _ctx: &EngineContext) {}
}

/// All runtime state. Every hook, scheduler callback and hit listener
/// receives it mutably.
pub struct EngineContext {
    pub registry: Registry,
    pub lifecycle: Lifecycle,
    pub clock: Clock,
    /// Simulation world.
    pub physics: PhysicsWorld,
    /// Hit-resolution world.
    pub hits: HitWorld,
    pub skills: SkillBook,
    pub render: RenderBuffer,
}

impl EngineContext {
    pub fn new(config: &GameConfig) -> Self {
        let mut physics = PhysicsWorld::new(config.gravity);
        physics.set_dt(config.fixed_dt);
        Self {
            registry: Registry::new(),
            lifecycle: Lifecycle::new(),
            clock: Clock::new(),
            physics,
            hits: HitWorld::new(config.hit_integration_dt.unwrap_or(config.fixed_dt)),
            skills: SkillBook::new(),
            render: RenderBuffer::new(),
        }
    }

    /// Advance the clock and clear last tick's render output.
    pub fn begin_tick(&mut self, dt: f32) {
        self.render.clear();
        self.clock.advance(dt);
    }

    /// Registry update pass, scheduler update phase, then the simulation
    /// step.
    pub fn simulate(&mut self, dt: f32) {
        self.update_components(dt);
        self.run_update();
        self.step_physics();
    }

    /// Registry render pass, then scheduler render phase.
    pub fn present(&mut self) {
        self.render_components();
        self.run_render();
    }

    /// One full tick with no game glue around it.
    pub fn tick(&mut self, dt: f32) {
        self.begin_tick(dt);
        self.simulate(dt);
        self.present();
    }

    /// Step the simulation world once.
    pub fn step_physics(&mut self) {
        self.physics.step();
    }

    /// Destroy every entity (running their `on_destroy`) and drop every
    /// subscriber.
    pub fn shutdown(&mut self) {
        for entity in self.registry.entities() {
            self.destroy_entity(entity);
        }
        self.lifecycle.clear();
        log::debug!("engine context shut down");
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EntityId;
    use crate::core::component::Component;
    use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial, PhysicsBody};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn config_from_partial_json() {
        let config = GameConfig::from_json(r#"{ "fixed_dt": 0.02, "gravity": [0.0, -9.8] }"#)
            .expect("valid config");
        assert!((config.fixed_dt - 0.02).abs() < 1e-6);
        assert_eq!(config.gravity, Vec2::new(0.0, -9.8));
        assert_eq!(config.max_steps_per_frame, 10);
        assert_eq!(config.hit_integration_dt, None);
    }

    #[test]
    fn config_rejects_garbage() {
        assert!(GameConfig::from_json("{ fixed_dt: }").is_err());
    }

    #[test]
    fn hit_world_has_no_gravity() {
        let ctx = EngineContext::default();
        assert_eq!(ctx.hits.world().gravity(), Vec2::ZERO);
        assert_eq!(ctx.physics.gravity(), Vec2::new(0.0, -90.0));
    }

    type Log = Rc<RefCell<Vec<&'static str>>>;

    /// Whether the simulation has moved `body` off the origin yet.
    fn stepped(ctx: &EngineContext, body: PhysicsBody) -> bool {
        ctx.physics.body_position(&body).0 != Vec2::ZERO
    }

    struct PhaseLog {
        log: Log,
        body: PhysicsBody,
    }

    impl Component for PhaseLog {
        fn on_update(&mut self, ctx: &mut EngineContext, _entity: EntityId, _dt: f32) {
            let line = if stepped(ctx, self.body) { "component update, stepped" } else { "component update" };
            self.log.borrow_mut().push(line);
        }
        fn on_render(&mut self, ctx: &mut EngineContext, _entity: EntityId) {
            let line = if stepped(ctx, self.body) { "component render, stepped" } else { "component render" };
            self.log.borrow_mut().push(line);
        }
    }

    #[test]
    fn tick_runs_phases_in_order() {
        let mut ctx = EngineContext::default();
        let log: Log = Rc::new(RefCell::new(Vec::new()));

        let e = ctx.create_entity();
        let body = ctx.physics.create_body(
            e,
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.5 }).with_velocity(Vec2::new(60.0, 0.0)),
            ColliderMaterial::default(),
        );
        ctx.add(e, PhaseLog { log: log.clone(), body });
        let l = log.clone();
        ctx.lifecycle.on_update(move |ctx| {
            let line = if stepped(ctx, body) { "scheduler update, stepped" } else { "scheduler update" };
            l.borrow_mut().push(line);
        });
        let l = log.clone();
        ctx.lifecycle.on_render(move |_| l.borrow_mut().push("scheduler render"));

        ctx.tick(1.0 / 60.0);
        // The simulation step lands between the scheduler update and the
        // registry render pass.
        assert_eq!(
            *log.borrow(),
            vec![
                "component update",
                "scheduler update",
                "component render, stepped",
                "scheduler render"
            ]
        );
        assert_eq!(ctx.clock.ticks(), 1);
    }

    struct Noisy(Log);

    impl Component for Noisy {
        fn on_destroy(&mut self, _ctx: &mut EngineContext, _entity: EntityId) {
            self.0.borrow_mut().push("destroyed");
        }
    }

    #[test]
    fn shutdown_tears_everything_down() {
        let mut ctx = EngineContext::default();
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..3 {
            let e = ctx.create_entity();
            ctx.add(e, Noisy(log.clone()));
        }
        ctx.lifecycle.on_update(|_| {});

        ctx.shutdown();
        assert_eq!(log.borrow().len(), 3);
        assert!(ctx.registry.is_empty());
        assert_eq!(ctx.lifecycle.update_count(), 0);
    }
}
