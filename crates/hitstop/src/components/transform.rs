use glam::Vec2;

use crate::core::component::Component;

/// World-space placement of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec2,
    /// Rotation in radians, counter-clockwise from +X.
    pub rotation: f32,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }

    pub fn set(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    /// Unit vector the entity faces.
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.rotation.cos(), self.rotation.sin())
    }

    /// Turn to face `target`. No-op if `target` is the current position.
    pub fn look_at(&mut self, target: Vec2) {
        let d = target - self.position;
        if d != Vec2::ZERO {
            self.rotation = d.y.atan2(d.x);
        }
    }
}

impl Component for Transform {}
