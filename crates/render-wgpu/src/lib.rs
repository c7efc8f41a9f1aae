//! wgpu render backend for lumi.
//!
//! Uploads the assets a scene's manifest names (models, prefabs, skybox,
//! shadow map) and executes its frame plans: uniforms are staged per draw,
//! written once per program, then each pass is recorded and submitted.
//!
//! # Invariants
//! - The renderer never decides what to draw; it only executes plans.
//! - Draws whose geometry failed to load are skipped, not fatal.
//! - Uniform values persist per program across draws and frames.

mod bindings;
mod gpu;
mod mesh;
mod model;
mod prefab;
mod quad;
mod shader;
pub mod shaders;
mod shadow;
mod skybox;
mod texture;

pub use bindings::{BindLayouts, MaterialDefaults};
pub use gpu::{FrameStats, GpuFrame, RendererConfig, WgpuRenderer};
pub use mesh::GpuMesh;
pub use model::GpuModel;
pub use prefab::Prefab;
pub use quad::ScreenQuad;
pub use shader::{PipelineTargets, ShaderProgram};
pub use shadow::ShadowMap;
pub use skybox::Skybox;
pub use texture::GpuTexture;

use lumi_assets::AssetError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("shader '{name}' failed to compile: {message}")]
    Shader { name: String, message: String },
    #[error("unsupported MSAA sample count {0} (use 1 or 4)")]
    SampleCount(u32),
}

pub fn crate_info() -> &'static str {
    "lumi-render-wgpu v0.1.0"
}
