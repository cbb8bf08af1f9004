pub mod component;
pub mod delay;
pub mod hitbox;
pub mod lifecycle;
pub mod physics;
pub mod registry;
pub mod skill;
pub mod time;
