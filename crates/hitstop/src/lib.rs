pub mod api;
pub mod core;
pub mod components;
pub mod extensions;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use crate::api::error::EcsError;
pub use crate::api::game::{EngineContext, Game, GameConfig};
pub use crate::api::runner::Runtime;
pub use crate::api::types::{EntityId, RenderHandle};
pub use crate::core::component::{Component, ComponentKind, EntityBuilder};
pub use crate::core::registry::Registry;
pub use crate::core::lifecycle::{Lifecycle, Phase, Subscription};
pub use crate::core::delay::{Delay, Sequence, SequenceHandle, WeakDelay};
pub use crate::core::skill::{Skill, SkillBook, SkillId};
pub use crate::core::time::{Clock, FixedTimestep};
pub use crate::core::physics::{BodyDesc, BodyType, ColliderDesc, ColliderMaterial, PhysicsBody, PhysicsWorld};
pub use crate::core::hitbox::{
    Follow, HitEvent, HitPayload, HitWorld, Hitbox, HitboxDesc, HitboxId, HitboxRole, Targets,
};
pub use crate::components::{Physic, Renderable, Transform};
pub use crate::renderer::instance::{DebugLine, RenderBuffer, TransformInstance};
pub use crate::systems::debug::debug_draw_hitboxes;

// Extensions: opt-in helpers on top of the core
pub use crate::extensions::{ease_vec2, lerp, lerp_vec2, PhysicController, TimeFunction};
