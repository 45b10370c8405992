//! Minimal stage the character is placed on: the scene model, the orbit
//! camera, the lights and shadow generators.
use std::time::Duration;

pub mod camera;
pub mod light;
pub mod scene;
pub mod shadow;

pub use camera::{CameraPose, StageCamera};
pub use light::StageLight;
pub use scene::{BoneTarget, MeshId, Scene, SceneHandle, WeakScene};
pub use shadow::ShadowCaster;

/// Per-frame input handed to components by the host loop.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Monotonic frame counter, starting at 1.
    pub index: u64,
    pub delta: Duration,
    pub camera: CameraPose,
}
