use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::api::types::RenderHandle;

/// One "set transform" call for the renderer: 16 bytes, no padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct TransformInstance {
    /// Renderer-side drawable this transform applies to.
    pub handle: u32,
    /// X position in world space.
    pub x: f32,
    /// Y position in world space.
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
}

impl TransformInstance {
    pub const STRIDE_BYTES: usize = std::mem::size_of::<Self>();

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Outline polyline for debug visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugLine {
    pub points: Vec<[f32; 2]>,
    pub width: f32,
}

/// Everything the render passes produced this tick.
///
/// Cleared at the start of every step; a renderer reads it after the step
/// and uploads `as_bytes()` as-is.
pub struct RenderBuffer {
    pub instances: Vec<TransformInstance>,
    pub debug_lines: Vec<DebugLine>,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(512),
            debug_lines: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.debug_lines.clear();
    }

    pub fn push(&mut self, instance: TransformInstance) {
        self.instances.push(instance);
    }

    pub fn set_transform(&mut self, handle: RenderHandle, position: Vec2, rotation: f32) {
        self.push(TransformInstance {
            handle: handle.0,
            x: position.x,
            y: position.y,
            rotation,
        });
    }

    /// Latest transform pushed for `handle` this tick.
    pub fn transform_of(&self, handle: RenderHandle) -> Option<&TransformInstance> {
        self.instances.iter().rev().find(|i| i.handle == handle.0)
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Instance data as raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn add_debug_line(&mut self, points: Vec<[f32; 2]>, width: f32) {
        self.debug_lines.push(DebugLine { points, width });
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_instance_is_16_bytes() {
        assert_eq!(TransformInstance::STRIDE_BYTES, 16);
    }

    #[test]
    fn render_buffer_push_and_count() {
        let mut buf = RenderBuffer::new();
        buf.set_transform(RenderHandle(3), Vec2::new(1.0, 2.0), 0.5);
        buf.set_transform(RenderHandle(3), Vec2::new(4.0, 2.0), 0.0);
        buf.set_transform(RenderHandle(9), Vec2::ZERO, 0.0);
        assert_eq!(buf.instance_count(), 3);
        assert_eq!(buf.as_bytes().len(), 48);

        let latest = buf.transform_of(RenderHandle(3)).expect("pushed");
        assert_eq!(latest.position(), Vec2::new(4.0, 2.0));
        assert!(buf.transform_of(RenderHandle(1)).is_none());
    }

    #[test]
    fn clear_empties_everything() {
        let mut buf = RenderBuffer::new();
        buf.push(TransformInstance::default());
        buf.add_debug_line(vec![[0.0, 0.0], [1.0, 1.0]], 0.05);
        buf.clear();
        assert_eq!(buf.instance_count(), 0);
        assert!(buf.debug_lines.is_empty());
    }
}
