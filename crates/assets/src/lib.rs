//! Asset loading for the lumi renderer.
//!
//! Everything in this crate produces plain CPU data (vertex arrays, RGBA8
//! pixels, shader text). Uploading it to the GPU is the backend's job, so the
//! whole crate can be exercised without a device.
//!
//! # Layout
//! Paths are taken as given; resolving them against an assets directory is the
//! caller's concern. Material textures are resolved relative to the model file.

mod cubemap;
mod mesh;
mod model;
mod shader;
mod texture;

pub use cubemap::{CUBEMAP_FACES, CubemapData};
pub use mesh::{MeshData, TextureKind, TextureRef, Vertex};
pub use model::{LoadedTexture, ModelData, ModelOptions};
pub use shader::ShaderSource;
pub use texture::ImageData;

use std::path::PathBuf;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model {path}: {message}")]
    Obj { path: PathBuf, message: String },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cubemap face '{face}' not found in {dir}")]
    MissingCubemapFace { dir: PathBuf, face: &'static str },
    #[error("cubemap face '{face}' is {actual:?}, expected {expected:?}")]
    CubemapFaceSize {
        face: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

pub fn crate_info() -> &'static str {
    "lumi-assets v0.1.0"
}
