//! Renderer-agnostic layer of the lumi renderer.
//!
//! Scenes describe each frame as a [`FramePlan`]: ordered passes of draw
//! commands, each naming a shader program, a piece of geometry and the
//! uniform values to set before drawing. A backend executes the plan; the
//! [`DebugTextRenderer`] prints it.
//!
//! # Invariants
//! - Nothing in this crate touches a GPU or a window.
//! - Uniform values persist per program across draws, as in an immediate-mode
//!   API: a draw only lists the uniforms it changes.

mod camera;
mod light;
mod plan;
mod renderer;
mod scatter;
pub mod scene;
mod timing;
mod uniform;

pub use camera::Camera;
pub use light::{DirectionalShadow, PointLight};
pub use plan::{
    DrawCommand, FramePlan, Geometry, LoadedGeometry, ModelHandle, PassPlan, PassTarget,
    PrefabHandle, ProgramId, SkipReason,
};
pub use renderer::{DebugTextRenderer, Renderer};
pub use scatter::{ScatterRng, scatter_instances};
pub use scene::{FrameContext, Scene, SceneManifest, build_scene};
pub use timing::{FrameCounter, FrameTiming};
pub use uniform::{UniformBlock, UniformError, UniformKind, UniformLayout, UniformValue};

pub fn crate_info() -> &'static str {
    "lumi-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
