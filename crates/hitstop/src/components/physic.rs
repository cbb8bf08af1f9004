use glam::Vec2;

use crate::api::game::EngineContext;
use crate::api::types::EntityId;
use crate::core::component::{Component, ComponentKind};
use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial, PhysicsBody, PhysicsWorld};
use super::transform::Transform;

/// A rigid body in the simulation world driving the entity's [`Transform`].
///
/// The body is created on start and removed on destroy; every update copies
/// its position and rotation into the Transform.
#[derive(Debug, Clone)]
pub struct Physic {
    desc: BodyDesc,
    material: ColliderMaterial,
    body: Option<PhysicsBody>,
}

impl Physic {
    pub fn new(desc: BodyDesc, material: ColliderMaterial) -> Self {
        Self {
            desc,
            material,
            body: None,
        }
    }

    /// Handles of the live body; `None` before start or after destroy.
    pub fn body(&self) -> Option<PhysicsBody> {
        self.body
    }

    pub fn position(&self, physics: &PhysicsWorld) -> Vec2 {
        self.body.map_or(self.desc.position, |b| physics.body_position(&b).0)
    }

    pub fn set_position(&self, physics: &mut PhysicsWorld, pos: Vec2) {
        if let Some(body) = &self.body {
            physics.set_position(body, pos);
        }
    }

    pub fn add_position(&self, physics: &mut PhysicsWorld, offset: Vec2) {
        if let Some(body) = &self.body {
            let (pos, _) = physics.body_position(body);
            physics.set_position(body, pos + offset);
        }
    }

    pub fn velocity(&self, physics: &PhysicsWorld) -> Vec2 {
        self.body.map_or(Vec2::ZERO, |b| physics.velocity(&b))
    }

    pub fn set_velocity(&self, physics: &mut PhysicsWorld, vel: Vec2) {
        if let Some(body) = &self.body {
            physics.set_velocity(body, vel);
        }
    }

    pub fn add_velocity(&self, physics: &mut PhysicsWorld, delta: Vec2) {
        if let Some(body) = &self.body {
            let vel = physics.velocity(body);
            physics.set_velocity(body, vel + delta);
        }
    }

    pub fn add_impulse(&self, physics: &mut PhysicsWorld, impulse: Vec2) {
        if let Some(body) = &self.body {
            physics.apply_impulse(body, impulse);
        }
    }

    pub fn rotation(&self, physics: &PhysicsWorld) -> f32 {
        self.body.map_or(self.desc.rotation, |b| physics.body_position(&b).1)
    }

    pub fn set_rotation(&self, physics: &mut PhysicsWorld, rotation: f32) {
        if let Some(body) = &self.body {
            physics.set_rotation(body, rotation);
        }
    }

    pub fn set_linear_damping(&self, physics: &mut PhysicsWorld, damping: f32) {
        if let Some(body) = &self.body {
            physics.set_linear_damping(body, damping);
        }
    }

    pub fn set_gravity_scale(&self, physics: &mut PhysicsWorld, scale: f32) {
        if let Some(body) = &self.body {
            physics.set_gravity_scale(body, scale);
        }
    }

    /// A sensor body passes through others instead of colliding.
    pub fn set_sensor(&self, physics: &mut PhysicsWorld, sensor: bool) {
        if let Some(body) = &self.body {
            physics.set_sensor(body, sensor);
        }
    }

    pub fn is_sensor(&self, physics: &PhysicsWorld) -> bool {
        self.body.map_or(self.desc.sensor, |b| physics.is_sensor(&b))
    }

    /// Push the Transform's placement into the body (e.g. after editing the
    /// Transform directly).
    pub fn sync_to_physics(&self, physics: &mut PhysicsWorld, transform: &Transform) {
        if let Some(body) = &self.body {
            physics.set_position(body, transform.position);
            physics.set_rotation(body, transform.rotation);
        }
    }

    fn sync_from_physics(&self, ctx: &mut EngineContext, entity: EntityId) {
        if let Some(body) = &self.body {
            let (pos, rot) = ctx.physics.body_position(body);
            let transform = ctx.registry.get_mut::<Transform>(entity);
            transform.position = pos;
            transform.rotation = rot;
        }
    }
}

impl Default for Physic {
    fn default() -> Self {
        Self::new(
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.5 }),
            ColliderMaterial::default(),
        )
    }
}

impl Component for Physic {
    fn requires() -> Vec<ComponentKind> {
        vec![ComponentKind::of::<Transform>()]
    }

    fn on_start(&mut self, ctx: &mut EngineContext, entity: EntityId) {
        self.body = Some(ctx.physics.create_body(entity, &self.desc, self.material));
        self.sync_from_physics(ctx, entity);
    }

    fn on_update(&mut self, ctx: &mut EngineContext, entity: EntityId, _dt: f32) {
        self.sync_from_physics(ctx, entity);
    }

    fn on_destroy(&mut self, ctx: &mut EngineContext, _entity: EntityId) {
        if let Some(body) = self.body.take() {
            ctx.physics.remove_body(&body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::game::GameConfig;

    #[test]
    fn body_lives_as_long_as_the_component() {
        let mut ctx = EngineContext::new(&GameConfig::default());
        let e = ctx.create_entity();
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.5 })
            .with_position(Vec2::new(2.0, 3.0));
        ctx.add(e, Physic::new(desc, ColliderMaterial::default()));

        assert_eq!(ctx.physics.body_count(), 1);
        assert_eq!(ctx.registry.get::<Transform>(e).position, Vec2::new(2.0, 3.0));

        ctx.destroy_entity(e);
        assert_eq!(ctx.physics.body_count(), 0);
    }

    #[test]
    fn transform_follows_the_body() {
        let mut ctx = EngineContext::new(&GameConfig::default());
        let e = ctx.create_entity();
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.5 }).with_gravity_scale(0.0);
        ctx.add(e, Physic::new(desc, ColliderMaterial::default()));

        let body = ctx.registry.get::<Physic>(e).body().expect("started");
        ctx.physics.set_velocity(&body, Vec2::new(60.0, 0.0));
        for _ in 0..10 {
            ctx.physics.step();
        }
        ctx.update_components(1.0 / 60.0);

        let x = ctx.registry.get::<Transform>(e).position.x;
        assert!(x > 5.0, "transform should have moved with the body: x={}", x);
    }

    #[test]
    fn helpers_reach_the_live_body() {
        let mut ctx = EngineContext::new(&GameConfig::default());
        let e = ctx.create_entity();
        ctx.add(e, Physic::default());

        let physic = ctx.registry.get::<Physic>(e).clone();
        physic.set_position(&mut ctx.physics, Vec2::new(1.0, 2.0));
        physic.add_position(&mut ctx.physics, Vec2::new(1.0, 0.0));
        assert_eq!(physic.position(&ctx.physics), Vec2::new(2.0, 2.0));

        physic.set_velocity(&mut ctx.physics, Vec2::new(0.0, 4.0));
        physic.add_velocity(&mut ctx.physics, Vec2::new(1.0, 0.0));
        assert_eq!(physic.velocity(&ctx.physics), Vec2::new(1.0, 4.0));

        physic.set_rotation(&mut ctx.physics, 0.5);
        assert!((physic.rotation(&ctx.physics) - 0.5).abs() < 1e-5);

        assert!(!physic.is_sensor(&ctx.physics));
        physic.set_sensor(&mut ctx.physics, true);
        assert!(physic.is_sensor(&ctx.physics));
    }

    #[test]
    fn helpers_before_start_read_the_description() {
        let physic = Physic::new(
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 })
                .with_position(Vec2::new(4.0, 0.0))
                .with_sensor(true),
            ColliderMaterial::default(),
        );
        let physics = PhysicsWorld::new(Vec2::ZERO);
        assert_eq!(physic.position(&physics), Vec2::new(4.0, 0.0));
        assert!(physic.is_sensor(&physics));
        assert_eq!(physic.velocity(&physics), Vec2::ZERO);
    }
}
