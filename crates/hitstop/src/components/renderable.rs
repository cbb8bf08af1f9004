use glam::Vec2;

use crate::api::game::EngineContext;
use crate::api::types::{EntityId, RenderHandle};
use crate::core::component::{Component, ComponentKind};
use super::transform::Transform;

/// Feeds the entity's [`Transform`] to the renderer every render pass.
#[derive(Debug, Clone, Default)]
pub struct Renderable {
    pub handle: RenderHandle,
    /// Fraction of the remaining distance covered per pass; `None` snaps.
    pub smooth_sync_lerp: Option<f32>,
    shown_position: Vec2,
    shown_rotation: f32,
}

impl Renderable {
    pub fn new(handle: RenderHandle) -> Self {
        Self {
            handle,
            ..Self::default()
        }
    }

    pub fn smoothed(mut self, lerp: f32) -> Self {
        self.smooth_sync_lerp = Some(lerp.clamp(0.0, 1.0));
        self
    }

    /// Placement last sent to the renderer.
    pub fn shown(&self) -> (Vec2, f32) {
        (self.shown_position, self.shown_rotation)
    }
}

impl Component for Renderable {
    fn requires() -> Vec<ComponentKind> {
        vec![ComponentKind::of::<Transform>()]
    }

    fn on_start(&mut self, ctx: &mut EngineContext, entity: EntityId) {
        let transform = ctx.registry.get::<Transform>(entity);
        self.shown_position = transform.position;
        self.shown_rotation = transform.rotation;
    }

    fn on_render(&mut self, ctx: &mut EngineContext, entity: EntityId) {
        let target = *ctx.registry.get::<Transform>(entity);
        match self.smooth_sync_lerp {
            Some(t) => {
                self.shown_position = self.shown_position.lerp(target.position, t);
                self.shown_rotation += shortest_arc(self.shown_rotation, target.rotation) * t;
            }
            None => {
                self.shown_position = target.position;
                self.shown_rotation = target.rotation;
            }
        }
        ctx.render
            .set_transform(self.handle, self.shown_position, self.shown_rotation);
    }
}

/// Signed angle from `from` to `to` in (-PI, PI].
fn shortest_arc(from: f32, to: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let d = (to - from).rem_euclid(TAU);
    if d > PI {
        d - TAU
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::game::GameConfig;

    #[test]
    fn snaps_without_smoothing() {
        let mut ctx = EngineContext::new(&GameConfig::default());
        let e = ctx.create_entity();
        ctx.add(e, Renderable::new(RenderHandle(4)));
        ctx.registry.get_mut::<Transform>(e).position = Vec2::new(3.0, -1.0);

        ctx.render_components();
        let sent = ctx.render.transform_of(RenderHandle(4)).expect("pushed");
        assert_eq!(sent.position(), Vec2::new(3.0, -1.0));
    }

    #[test]
    fn smoothing_closes_part_of_the_gap() {
        let mut ctx = EngineContext::new(&GameConfig::default());
        let e = ctx.create_entity();
        ctx.add(e, Renderable::new(RenderHandle(1)).smoothed(0.5));
        ctx.registry.get_mut::<Transform>(e).position = Vec2::new(8.0, 0.0);

        ctx.render_components();
        ctx.render_components();
        let (shown, _) = ctx.registry.get::<Renderable>(e).shown();
        assert!((shown.x - 6.0).abs() < 1e-5, "shown={:?}", shown);
    }

    #[test]
    fn shortest_arc_wraps() {
        use std::f32::consts::PI;
        assert!((shortest_arc(0.1, -0.1) + 0.2).abs() < 1e-5);
        assert!((shortest_arc(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-4);
    }
}
