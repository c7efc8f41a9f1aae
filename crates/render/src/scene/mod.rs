//! The demo scenes.
//!
//! A scene declares up front which assets it needs ([`SceneManifest`]) and
//! then, once per frame, turns the camera and overlay toggles into a
//! [`FramePlan`]. Handles in the plan index into the manifest's lists.

mod instancing;
mod pbr;
mod shadows;

pub use instancing::InstancingScene;
pub use pbr::PbrScene;
pub use shadows::ShadowsScene;

use crate::camera::Camera;
use crate::plan::{DrawCommand, FramePlan, Geometry, ProgramId};
use crate::uniform::UniformValue;
use glam::Mat4;
use lumi_common::{OverlaySettings, SceneKind, Settings};
use std::path::PathBuf;

/// Per-frame inputs to [`Scene::build_frame`].
#[derive(Debug, Clone)]
pub struct FrameContext<'a> {
    pub camera: &'a Camera,
    /// Surface width over height.
    pub aspect: f32,
    /// Seconds since start.
    pub time: f32,
    pub overlays: OverlaySettings,
    pub clear_color: [f64; 4],
}

impl FrameContext<'_> {
    pub fn projection(&self) -> Mat4 {
        self.camera.projection_matrix(self.aspect)
    }

    pub fn view(&self) -> Mat4 {
        self.camera.view_matrix()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub path: PathBuf,
    pub gamma_correction: bool,
    /// Load failure skips the model's draws instead of aborting.
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefabRequest {
    pub path: PathBuf,
    pub transforms: Vec<Mat4>,
}

/// Assets and one-time uniform values a scene needs before its first frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneManifest {
    pub models: Vec<ModelRequest>,
    pub prefabs: Vec<PrefabRequest>,
    pub skybox: Option<PathBuf>,
    pub shadow_map_resolution: Option<u32>,
    /// Set once at load and left in place, as a static uniform.
    pub initial_uniforms: Vec<(ProgramId, String, UniformValue)>,
}

impl SceneManifest {
    pub fn set(mut self, program: ProgramId, name: &str, value: impl Into<UniformValue>) -> Self {
        self.initial_uniforms
            .push((program, name.to_string(), value.into()));
        self
    }
}

pub trait Scene {
    fn kind(&self) -> SceneKind;

    fn manifest(&self) -> SceneManifest;

    fn build_frame(&self, ctx: &FrameContext<'_>) -> FramePlan;
}

/// Construct the scene selected in `settings`.
pub fn build_scene(settings: &Settings) -> Box<dyn Scene> {
    tracing::debug!("building scene '{}'", settings.scene);
    match settings.scene {
        SceneKind::Shadows => Box::new(ShadowsScene::new(settings)),
        SceneKind::Pbr => Box::new(PbrScene::new(settings)),
        SceneKind::Instancing => Box::new(InstancingScene::new(settings)),
    }
}

/// Skybox draw with the camera translation removed.
fn skybox_draw(ctx: &FrameContext<'_>) -> DrawCommand {
    DrawCommand::new(ProgramId::Skybox, Geometry::Skybox)
        .with("projection", ctx.projection())
        .with("view", ctx.camera.rotation_only_view())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_scene_follows_settings() {
        for kind in SceneKind::ALL {
            let settings = Settings {
                scene: kind,
                ..Settings::default()
            };
            assert_eq!(build_scene(&settings).kind(), kind);
        }
    }

    #[test]
    fn every_scene_plan_is_well_formed() {
        let camera = Camera::default();
        let overlays = OverlaySettings {
            skybox: true,
            light_cube: true,
            depth_debug: true,
            animate_lights: true,
            inspector: false,
        };
        for kind in SceneKind::ALL {
            let settings = Settings {
                scene: kind,
                ..Settings::default()
            };
            let scene = build_scene(&settings);
            let ctx = FrameContext {
                camera: &camera,
                aspect: settings.aspect_ratio(),
                time: 1.5,
                overlays,
                clear_color: settings.window.clear_color,
            };
            let plan = scene.build_frame(&ctx);
            for draw in plan.draws() {
                assert!(draw.program.accepts(&draw.geometry), "{kind}: {draw:?}");
                let mut block = crate::UniformBlock::new(draw.program.uniform_layout());
                for (name, value) in &draw.uniforms {
                    block
                        .set(name, *value)
                        .unwrap_or_else(|e| panic!("{kind}: {e}"));
                }
            }
            for (program, name, value) in scene.manifest().initial_uniforms {
                let mut block = crate::UniformBlock::new(program.uniform_layout());
                block.set(&name, value).unwrap();
            }
        }
    }
}
