pub mod physic;
pub mod renderable;
pub mod transform;

pub use physic::Physic;
pub use renderable::Renderable;
pub use transform::Transform;
