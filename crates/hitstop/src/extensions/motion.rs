// extensions/motion.rs
//
// Scripted body motions driven by scheduler update subscribers.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use crate::api::game::EngineContext;
use crate::core::lifecycle::{Lifecycle, Subscription};
use crate::core::physics::PhysicsBody;
use super::easing::{ease_vec2, TimeFunction};

/// Moves one simulation body along scripted paths. At most one motion runs
/// at a time: starting a motion cancels the one in progress.
///
/// Every motion zeroes the body's velocity each tick so the simulation step
/// does not fight the script. Clones share the running motion.
#[derive(Debug, Clone)]
pub struct PhysicController {
    body: PhysicsBody,
    current: Rc<Cell<Option<Subscription>>>,
}

impl PhysicController {
    pub fn new(body: PhysicsBody) -> Self {
        Self {
            body,
            current: Rc::new(Cell::new(None)),
        }
    }

    pub fn body(&self) -> PhysicsBody {
        self.body
    }

    /// Whether a motion is still running.
    pub fn is_moving(&self) -> bool {
        self.current.get().is_some()
    }

    /// The body's position shifted by `offset`.
    pub fn offset(&self, ctx: &EngineContext, offset: Vec2) -> Vec2 {
        ctx.physics.body_position(&self.body).0 + offset
    }

    /// Cancel the running motion. Returns `false` if there was none.
    pub fn stop(&self, lifecycle: &mut Lifecycle) -> bool {
        match self.current.take() {
            Some(sub) => lifecycle.unsubscribe(sub),
            None => false,
        }
    }

    /// Move to `target`. With `easing`, travel there over its duration along
    /// the given curve; without, teleport at once.
    pub fn move_to(&self, ctx: &mut EngineContext, target: Vec2, easing: Option<(TimeFunction, f32)>) {
        self.stop(&mut ctx.lifecycle);
        let body = self.body;
        let Some((time, duration)) = easing.filter(|(_, d)| *d > 0.0) else {
            ctx.physics.set_position(&body, target);
            return;
        };

        let origin = ctx.physics.body_position(&body).0;
        let mut elapsed = 0.0_f32;
        self.run(ctx, move |ctx| {
            ctx.physics.set_velocity(&body, Vec2::ZERO);
            elapsed += ctx.clock.delta();
            let t = (elapsed / duration).min(1.0);
            ctx.physics.set_position(&body, ease_vec2(origin, target, t, time));
            t >= 1.0
        });
    }

    /// Dash along `dir * speed` per second for `duration` seconds. With
    /// `keep_velocity` the body leaves the dash still moving at that velocity.
    pub fn launch(&self, ctx: &mut EngineContext, dir: Vec2, duration: f32, speed: f32, keep_velocity: bool) {
        self.stop(&mut ctx.lifecycle);
        let body = self.body;
        let step = dir * speed;
        let mut elapsed = 0.0_f32;
        self.run(ctx, move |ctx| {
            let dt = ctx.clock.delta();
            ctx.physics.set_velocity(&body, Vec2::ZERO);
            let (pos, _) = ctx.physics.body_position(&body);
            ctx.physics.set_position(&body, pos + step * dt);
            elapsed += dt;
            if elapsed > duration {
                if keep_velocity {
                    ctx.physics.set_velocity(&body, step);
                }
                return true;
            }
            false
        });
    }

    /// Pin the body where it stands until `duration` seconds have passed.
    pub fn freeze(&self, ctx: &mut EngineContext, duration: f32) {
        self.stop(&mut ctx.lifecycle);
        let body = self.body;
        let origin = ctx.physics.body_position(&body).0;
        let mut elapsed = 0.0_f32;
        self.run(ctx, move |ctx| {
            ctx.physics.set_velocity(&body, Vec2::ZERO);
            ctx.physics.set_position(&body, origin);
            elapsed += ctx.clock.delta();
            elapsed > duration
        });
    }

    /// Subscribe `tick` as the current motion; it unsubscribes itself once it
    /// reports completion or the body is gone.
    fn run(&self, ctx: &mut EngineContext, mut tick: impl FnMut(&mut EngineContext) -> bool + 'static) {
        let body = self.body;
        let current = Rc::clone(&self.current);
        let own: Rc<Cell<Option<Subscription>>> = Rc::new(Cell::new(None));
        let own_in_cb = Rc::clone(&own);
        let sub = ctx.lifecycle.on_update(move |ctx| {
            let done = !ctx.physics.contains_body(&body) || tick(ctx);
            if !done {
                return;
            }
            if let Some(sub) = own_in_cb.get() {
                ctx.lifecycle.unsubscribe(sub);
                if current.get() == Some(sub) {
                    current.set(None);
                }
            }
        });
        own.set(Some(sub));
        self.current.set(Some(sub));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::game::GameConfig;
    use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial};
    use crate::api::types::EntityId;

    fn setup() -> (EngineContext, PhysicController) {
        let config = GameConfig {
            gravity: Vec2::ZERO,
            ..GameConfig::default()
        };
        let mut ctx = EngineContext::new(&config);
        let body = ctx.physics.create_body(
            EntityId(1),
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.5 }),
            ColliderMaterial::default(),
        );
        (ctx, PhysicController::new(body))
    }

    fn position(ctx: &EngineContext, c: &PhysicController) -> Vec2 {
        ctx.physics.body_position(&c.body()).0
    }

    #[test]
    fn move_to_without_easing_teleports() {
        let (mut ctx, c) = setup();
        c.move_to(&mut ctx, Vec2::new(3.0, 4.0), None);
        assert_eq!(position(&ctx, &c), Vec2::new(3.0, 4.0));
        assert!(!c.is_moving());
    }

    #[test]
    fn move_to_eases_over_duration() {
        let (mut ctx, c) = setup();
        c.move_to(&mut ctx, Vec2::new(4.0, 0.0), Some((TimeFunction::Linear, 1.0)));
        assert!(c.is_moving());

        ctx.tick(0.25);
        assert!((position(&ctx, &c).x - 1.0).abs() < 1e-4, "x={}", position(&ctx, &c).x);
        ctx.tick(0.25);
        assert!((position(&ctx, &c).x - 2.0).abs() < 1e-4);
        ctx.tick(0.25);
        ctx.tick(0.25);
        assert!((position(&ctx, &c).x - 4.0).abs() < 1e-4);
        assert!(!c.is_moving());
        assert_eq!(ctx.lifecycle.update_count(), 0);
    }

    #[test]
    fn launch_moves_at_constant_speed_and_keeps_velocity() {
        let (mut ctx, c) = setup();
        c.launch(&mut ctx, Vec2::X, 0.5, 2.0, true);
        ctx.tick(0.25);
        assert!((position(&ctx, &c).x - 0.5).abs() < 1e-4);
        ctx.tick(0.25);
        assert!(c.is_moving(), "elapsed must exceed the duration");
        ctx.tick(0.25);
        assert!(!c.is_moving());
        let vel = ctx.physics.velocity(&c.body());
        assert!((vel - Vec2::new(2.0, 0.0)).length() < 1e-4, "vel={:?}", vel);
    }

    #[test]
    fn launch_without_keep_velocity_stops_dead() {
        let (mut ctx, c) = setup();
        c.launch(&mut ctx, Vec2::Y, 0.25, 4.0, false);
        for _ in 0..3 {
            ctx.tick(0.25);
        }
        assert!(!c.is_moving());
        assert_eq!(ctx.physics.velocity(&c.body()), Vec2::ZERO);
    }

    #[test]
    fn freeze_pins_the_body() {
        let (mut ctx, c) = setup();
        ctx.physics.set_velocity(&c.body(), Vec2::new(10.0, 0.0));
        c.freeze(&mut ctx, 0.5);
        ctx.tick(0.25);
        ctx.tick(0.25);
        assert_eq!(position(&ctx, &c), Vec2::ZERO);
        ctx.tick(0.25);
        assert!(!c.is_moving());
    }

    #[test]
    fn new_motion_cancels_the_running_one() {
        let (mut ctx, c) = setup();
        c.move_to(&mut ctx, Vec2::new(100.0, 0.0), Some((TimeFunction::Linear, 1.0)));
        ctx.tick(0.25);
        c.freeze(&mut ctx, 1.0);
        assert_eq!(ctx.lifecycle.update_count(), 1);
        let pinned = position(&ctx, &c);
        ctx.tick(0.25);
        assert_eq!(position(&ctx, &c), pinned);

        assert!(c.stop(&mut ctx.lifecycle));
        assert!(!c.stop(&mut ctx.lifecycle));
        assert_eq!(ctx.lifecycle.update_count(), 0);
    }

    #[test]
    fn motion_ends_when_the_body_is_removed() {
        let (mut ctx, c) = setup();
        c.launch(&mut ctx, Vec2::X, 10.0, 1.0, false);
        ctx.physics.remove_body(&c.body());
        ctx.tick(0.25);
        assert!(!c.is_moving());
    }
}
