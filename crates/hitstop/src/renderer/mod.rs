pub mod instance;

pub use instance::{DebugLine, RenderBuffer, TransformInstance};
