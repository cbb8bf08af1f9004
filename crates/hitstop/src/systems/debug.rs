//! Debug rendering: opt-in hitbox visualization.
//!
//! Call `debug_draw_hitboxes()` after the tick from `Game::render()` (or any
//! render subscriber) to see every active hit shape as an outline.

use crate::core::hitbox::HitWorld;
use crate::core::physics::ColliderDesc;
use crate::renderer::instance::RenderBuffer;

/// Add an outline for every enabled collider of the hit world.
///
/// The buffer's debug lines are cleared at the start of each step, so this
/// only appends.
pub fn debug_draw_hitboxes(hits: &HitWorld, render: &mut RenderBuffer, line_width: f32) {
    let world = hits.world();
    for handle in world.enabled_colliders() {
        let (Some(shape), Some((pos, rot))) = (world.shape_of(handle), world.collider_position(handle)) else {
            continue;
        };
        render.add_debug_line(collider_outline(pos.x, pos.y, rot, &shape), line_width);
    }
}

/// Generate outline points for a collider shape at a given position and rotation.
fn collider_outline(cx: f32, cy: f32, rot: f32, shape: &ColliderDesc) -> Vec<[f32; 2]> {
    let (cos_r, sin_r) = (rot.cos(), rot.sin());
    let rotate = |lx: f32, ly: f32| -> [f32; 2] {
        [cx + lx * cos_r - ly * sin_r, cy + lx * sin_r + ly * cos_r]
    };

    let mut points = match *shape {
        ColliderDesc::Ball { radius } => {
            let segments = 24;
            (0..segments)
                .map(|i| {
                    let angle = (i as f32 / segments as f32) * std::f32::consts::TAU;
                    rotate(angle.cos() * radius, angle.sin() * radius)
                })
                .collect::<Vec<_>>()
        }
        ColliderDesc::Cuboid {
            half_width,
            half_height,
        } => vec![
            rotate(-half_width, -half_height),
            rotate(half_width, -half_height),
            rotate(half_width, half_height),
            rotate(-half_width, half_height),
        ],
        ColliderDesc::CapsuleY {
            half_height,
            radius,
        } => {
            let semi_segments = 12;
            let mut points = Vec::with_capacity(semi_segments * 2 + 3);
            // Lower cap, then upper cap
            for i in 0..=semi_segments {
                let angle = std::f32::consts::PI + (i as f32 / semi_segments as f32) * std::f32::consts::PI;
                points.push(rotate(angle.cos() * radius, -half_height + angle.sin() * radius));
            }
            for i in 0..=semi_segments {
                let angle = (i as f32 / semi_segments as f32) * std::f32::consts::PI;
                points.push(rotate(angle.cos() * radius, half_height + angle.sin() * radius));
            }
            points
        }
    };

    // Close the loop
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}
