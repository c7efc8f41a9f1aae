//! Shared types and configuration for the lumi renderer.
//!
//! Everything here is plain data: no GPU handles, no file handles kept open.

pub mod settings;
pub mod types;

pub use settings::{
    AssetPaths, CameraSettings, OverlaySettings, PrefabSettings, SceneKind, Settings,
    SettingsError, ShadowSettings, WindowSettings,
};
pub use types::{CameraMovement, Transform};

pub fn crate_info() -> &'static str {
    "lumi-common v0.1.0"
}
