// extensions/mod.rs
//
// Optional helpers layered on the core. Games opt in by constructing them.

pub mod easing;
pub mod motion;

pub use easing::{ease_vec2, lerp, lerp_vec2, TimeFunction};
pub use motion::PhysicController;
