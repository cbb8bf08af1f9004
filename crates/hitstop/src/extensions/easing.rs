// extensions/easing.rs
//
// Time curves for scheduler-driven motions. Pure math.

use glam::Vec2;

/// Maps normalized progress to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFunction {
    #[default]
    Linear,
    /// Slow start.
    EaseIn,
    /// Slow end.
    EaseOut,
    /// Slow start and end.
    EaseInOut,
    /// Runs past the end, then settles back.
    EaseOutOvershoot,
}

impl TimeFunction {
    /// Apply the curve to `t`, clamped to [0, 1]. `apply(0) == 0` and
    /// `apply(1) == 1` for every curve.
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            TimeFunction::Linear => t,
            TimeFunction::EaseIn => t * t,
            TimeFunction::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            TimeFunction::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            TimeFunction::EaseOutOvershoot => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
        }
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec2(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a + (b - a) * t
}

/// Interpolate `a` to `b` at progress `t` shaped by `time`.
#[inline]
pub fn ease_vec2(a: Vec2, b: Vec2, t: f32, time: TimeFunction) -> Vec2 {
    lerp_vec2(a, b, time.apply(t))
}
